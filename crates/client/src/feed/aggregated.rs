//! Aggregated feeds: activities grouped by the feed's aggregation format.

use async_trait::async_trait;
use serde::Deserialize;
use stream_feed_common::FeedResult;

use super::{Feed, FeedHandle, FeedKind, FeedQuery};
use crate::activity::Activity;

/// An aggregated feed.
#[derive(Debug, Clone)]
pub struct AggregatedFeed {
    handle: FeedHandle,
}

/// A group of activities sharing an aggregation key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActivityGroup {
    pub id: String,
    pub group: String,
    pub verb: String,
    pub activities: Vec<Activity>,
    pub activity_count: u64,
    pub actor_count: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// One page of an aggregated feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AggregatedFeedOutput {
    pub duration: String,
    pub next: Option<String>,
    pub results: Vec<ActivityGroup>,
}

impl AggregatedFeed {
    pub(crate) const fn new(handle: FeedHandle) -> Self {
        Self { handle }
    }

    /// Read one page of activity groups.
    pub async fn activities(&self, query: &FeedQuery) -> FeedResult<AggregatedFeedOutput> {
        self.handle.activities(query.params()).await
    }
}

#[async_trait]
impl Feed for AggregatedFeed {
    fn handle(&self) -> &FeedHandle {
        &self.handle
    }

    fn kind(&self) -> FeedKind {
        FeedKind::Aggregated
    }
}
