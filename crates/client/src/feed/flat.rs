//! Flat feeds: a plain reverse-chronological list of activities.

use async_trait::async_trait;
use serde::Deserialize;
use stream_feed_common::FeedResult;

use super::{Feed, FeedHandle, FeedKind, FeedQuery};
use crate::activity::Activity;

/// A flat feed.
#[derive(Debug, Clone)]
pub struct FlatFeed {
    handle: FeedHandle,
}

/// One page of a flat feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlatFeedOutput {
    pub duration: String,
    /// Relative URL of the next page, when there is one.
    pub next: Option<String>,
    pub results: Vec<Activity>,
}

impl FlatFeed {
    pub(crate) const fn new(handle: FeedHandle) -> Self {
        Self { handle }
    }

    /// Read one page of activities.
    pub async fn activities(&self, query: &FeedQuery) -> FeedResult<FlatFeedOutput> {
        self.handle.activities(query.params()).await
    }
}

#[async_trait]
impl Feed for FlatFeed {
    fn handle(&self) -> &FeedHandle {
        &self.handle
    }

    fn kind(&self) -> FeedKind {
        FeedKind::Flat
    }
}
