use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tweedentity_types::{Address, RequestId};

use crate::error::FetchError;

/// What to fetch: the post `post_id` on the namespace's platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchQuery {
    pub namespace: String,
    pub post_id: String,
}

/// Round-trip funding offered to the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
    pub fee_rate: u128,
    pub fee_budget: u128,
}

impl FeeQuote {
    /// `fee_rate × fee_budget`, or `None` on overflow.
    pub fn total(&self) -> Option<u128> {
        self.fee_rate.checked_mul(self.fee_budget)
    }
}

/// A request as seen by whoever performs the fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub request_id: RequestId,
    pub query: FetchQuery,
    pub fee: FeeQuote,
}

/// A post as reported by the fetch provider.
///
/// `author_id` comes from the platform's metadata about who published the
/// post, never from the post text. It is the external id a successful
/// verification binds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPost {
    pub author_id: String,
    pub description: String,
}

impl FetchedPost {
    pub fn new(author_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            description: description.into(),
        }
    }
}

/// Off-chain content fetcher.
///
/// `request` only issues the fetch and hands back its id. The
/// [`FetchedPost`] arrives later through the claimer's callback, sent from
/// `callback_address`.
pub trait FetchProvider: Send {
    fn callback_address(&self) -> Address;

    fn request(&mut self, query: FetchQuery, fee: FeeQuote) -> Result<RequestId, FetchError>;
}

/// In-memory provider that queues requests for the caller to answer.
#[derive(Debug)]
pub struct QueuedFetchProvider {
    callback: Address,
    queue: VecDeque<FetchRequest>,
    issued: usize,
}

impl QueuedFetchProvider {
    pub fn new(callback: Address) -> Self {
        Self {
            callback,
            queue: VecDeque::new(),
            issued: 0,
        }
    }

    /// Oldest unanswered request.
    pub fn next_request(&mut self) -> Option<FetchRequest> {
        self.queue.pop_front()
    }

    /// Requests issued and not yet taken.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Requests issued since construction.
    pub fn issued(&self) -> usize {
        self.issued
    }
}

impl FetchProvider for QueuedFetchProvider {
    fn callback_address(&self) -> Address {
        self.callback
    }

    fn request(&mut self, query: FetchQuery, fee: FeeQuote) -> Result<RequestId, FetchError> {
        let request_id = RequestId::generate();
        debug!(request = %request_id, namespace = %query.namespace, post = %query.post_id, "Fetch queued");
        self.queue.push_back(FetchRequest {
            request_id: request_id.clone(),
            query,
            fee,
        });
        self.issued += 1;
        Ok(request_id)
    }
}
