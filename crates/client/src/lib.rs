//! Client library for a hosted activity-feed service.
//!
//! - **Feeds**: flat, aggregated and notification feeds via [`Client`]
//! - **Activities**: the [`Activity`] entity and its JSON codec
//! - **Authentication**: per-request choice between feed signatures and a
//!   pre-issued bearer token, see [`AuthScheme::select`]
//! - **Transport**: any [`Transport`]; [`ReqwestTransport`] by default
//!
//! # Example
//!
//! ```no_run
//! use stream_feed::{Activity, Client, ClientConfig, Feed, FeedResult};
//!
//! async fn example() -> FeedResult<()> {
//!     let client = Client::new(ClientConfig::new("api-key").with_secret("api-secret"))?;
//!     let feed = client.notification_feed("notification", "bob")?;
//!
//!     let added = feed
//!         .add_activity(&Activity::new("flat:john", "post", "flat:eric").foreign_id("fid-1"))
//!         .await?;
//!     println!("stored as {}", added.id);
//!     Ok(())
//! }
//! ```

pub mod activity;
pub mod client;
pub mod feed;
pub mod request;
pub mod response;
pub mod transport;

pub use activity::{Activity, ActivityData, FeedId};
pub use client::Client;
pub use feed::{
    ActivityGroup, AggregatedFeed, AggregatedFeedOutput, DEFAULT_COPY_LIMIT, Feed, FeedHandle,
    FeedKind, FeedQuery, FlatFeed, FlatFeedOutput, FollowRelation, Marker, NotificationFeed,
    NotificationFeedOutput, NotificationGroup, NotificationQuery,
};
pub use request::{ApiRequest, AuthScheme, AuthScope, CLIENT_IDENTIFIER};
pub use response::ApiResponse;
pub use stream_feed_common::{ApiError, BoxError, ClientConfig, FeedError, FeedResult};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
