//! Asynchronous fetch relay.
//!
//! [`ChannelFetchProvider`] hands requests to a [`FetchRelay`] task over a
//! tokio channel. The relay resolves each one through a [`PostSource`] and
//! emits a [`FetchResponse`] that the owner of the claimer feeds back into
//! `on_fetch_result`. A source reports the post's author alongside its
//! description.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tweedentity_types::{Address, RequestId};

use crate::error::FetchError;
use crate::provider::{FeeQuote, FetchProvider, FetchQuery, FetchRequest, FetchedPost};

/// Retrieves a post's author id and public description.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch(&self, query: &FetchQuery) -> Result<FetchedPost, FetchError>;
}

/// Content ready to be delivered to the claimer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    /// Address the callback must be sent from.
    pub callback: Address,
    pub request_id: RequestId,
    pub post: FetchedPost,
}

/// Provider that forwards requests into a channel read by a [`FetchRelay`].
#[derive(Clone, Debug)]
pub struct ChannelFetchProvider {
    callback: Address,
    sender: mpsc::UnboundedSender<FetchRequest>,
}

impl ChannelFetchProvider {
    /// A provider plus the receiving end to hand to [`FetchRelay::spawn`].
    pub fn channel(callback: Address) -> (Self, mpsc::UnboundedReceiver<FetchRequest>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { callback, sender }, receiver)
    }
}

impl FetchProvider for ChannelFetchProvider {
    fn callback_address(&self) -> Address {
        self.callback
    }

    fn request(&mut self, query: FetchQuery, fee: FeeQuote) -> Result<RequestId, FetchError> {
        let request_id = RequestId::generate();
        self.sender
            .send(FetchRequest {
                request_id: request_id.clone(),
                query,
                fee,
            })
            .map_err(|_| FetchError::ChannelClosed)?;
        Ok(request_id)
    }
}

/// Background task turning fetch requests into responses.
pub struct FetchRelay<S: PostSource> {
    source: Arc<S>,
    callback: Address,
}

impl<S: PostSource + 'static> FetchRelay<S> {
    pub fn new(source: Arc<S>, callback: Address) -> Self {
        Self { source, callback }
    }

    /// Run until the request channel closes.
    ///
    /// A failed fetch still produces a response with an empty post, so the
    /// pending verification is consumed and rejected instead of lingering.
    pub async fn run(
        self,
        mut requests: mpsc::UnboundedReceiver<FetchRequest>,
        responses: mpsc::UnboundedSender<FetchResponse>,
    ) {
        info!(callback = %self.callback, "Fetch relay started");
        while let Some(request) = requests.recv().await {
            let post = match self.source.fetch(&request.query).await {
                Ok(post) => {
                    debug!(
                        request = %request.request_id,
                        post = %request.query.post_id,
                        author = %post.author_id,
                        "Post fetched"
                    );
                    post
                }
                Err(err) => {
                    warn!(request = %request.request_id, error = %err, "Post fetch failed");
                    FetchedPost::default()
                }
            };
            let response = FetchResponse {
                callback: self.callback,
                request_id: request.request_id,
                post,
            };
            if responses.send(response).is_err() {
                warn!("Response receiver dropped, stopping fetch relay");
                break;
            }
        }
        info!("Fetch relay stopped");
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(
        self,
        requests: mpsc::UnboundedReceiver<FetchRequest>,
    ) -> (JoinHandle<()>, mpsc::UnboundedReceiver<FetchResponse>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(requests, sender));
        (handle, receiver)
    }
}
