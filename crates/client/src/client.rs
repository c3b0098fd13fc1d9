//! Feed service client.
//!
//! A [`Client`] holds the immutable configuration and the transport; feeds are
//! created from it and share it. Cloning is cheap.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use stream_feed_common::{ClientConfig, FeedError, FeedResult};
use tracing::debug;
use url::Url;

use crate::activity::Activity;
use crate::feed::{AggregatedFeed, FeedHandle, FlatFeed, NotificationFeed};
use crate::request::{ApiRequest, AuthScope};
use crate::response::{self, ApiResponse};
use crate::transport::{ReqwestTransport, Transport};

#[derive(Serialize)]
pub(crate) struct ActivitiesPayload<'a> {
    pub activities: &'a [Activity],
}

/// Feed service client.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    base_url: Url,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Create a client using the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> FeedResult<Self> {
        let transport = ReqwestTransport::new(config.timeout_secs.map(Duration::from_secs))?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client with a caller-supplied transport.
    ///
    /// Credentials are not checked here: whether a request can be
    /// authenticated is decided per request.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> FeedResult<Self> {
        if config.api_key.is_empty() {
            return Err(FeedError::Configuration("API key must not be empty".to_string()));
        }
        let base_url = config.resolve_base_url()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                base_url,
                transport,
            }),
        })
    }

    /// Create a client from `.env`, `config/stream.toml` and `STREAM_*` variables.
    pub fn from_env() -> FeedResult<Self> {
        Self::new(ClientConfig::load()?)
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Create a flat feed handle. Fails if `slug` or `user_id` is empty.
    pub fn flat_feed(&self, slug: &str, user_id: &str) -> FeedResult<FlatFeed> {
        FeedHandle::new(self.clone(), slug, user_id).map(FlatFeed::new)
    }

    /// Create an aggregated feed handle. Fails if `slug` or `user_id` is empty.
    pub fn aggregated_feed(&self, slug: &str, user_id: &str) -> FeedResult<AggregatedFeed> {
        FeedHandle::new(self.clone(), slug, user_id).map(AggregatedFeed::new)
    }

    /// Create a notification feed handle. Fails if `slug` or `user_id` is empty.
    pub fn notification_feed(&self, slug: &str, user_id: &str) -> FeedResult<NotificationFeed> {
        FeedHandle::new(self.clone(), slug, user_id).map(NotificationFeed::new)
    }

    /// Replace stored activities in one request.
    ///
    /// Each activity must be identifiable by the service, through `id` or
    /// through `foreign_id` plus `time`.
    pub async fn update_activities(&self, activities: &[Activity]) -> FeedResult<()> {
        if activities.is_empty() {
            return Err(FeedError::InvalidArgument(
                "No activities to update".to_string(),
            ));
        }

        let request = ApiRequest::post(
            "activities/",
            AuthScope::Application {
                resource: "activities",
            },
        )
        .json(&ActivitiesPayload { activities })?;

        self.send(request).await.map(drop)
    }

    /// Build, send and classify one request.
    pub(crate) async fn send(&self, request: ApiRequest<'_>) -> FeedResult<ApiResponse> {
        let request = request.build(&self.inner.config, &self.inner.base_url)?;
        let method = request.method.clone();
        let path = request.url.path().to_string();

        let response = self
            .inner
            .transport
            .send(request)
            .await
            .map_err(FeedError::Transport)?;

        debug!(%method, path = %path, status = response.status, "Feed response received");

        response::classify(response)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
