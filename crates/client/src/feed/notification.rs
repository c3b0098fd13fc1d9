//! Notification feeds: aggregated groups plus seen/read tracking.

use async_trait::async_trait;
use serde::Deserialize;
use stream_feed_common::{FeedError, FeedResult};

use super::{Feed, FeedHandle, FeedKind, FeedQuery, Marker, NotificationQuery};
use crate::activity::Activity;

/// A notification feed.
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    handle: FeedHandle,
}

/// A notification group with its seen/read state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotificationGroup {
    pub id: String,
    pub group: String,
    pub verb: String,
    pub activities: Vec<Activity>,
    pub activity_count: u64,
    pub actor_count: u64,
    pub is_read: bool,
    pub is_seen: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// One page of a notification feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotificationFeedOutput {
    pub duration: String,
    pub next: Option<String>,
    pub results: Vec<NotificationGroup>,
    /// Groups not yet marked as read.
    pub unread: u64,
    /// Groups not yet marked as seen.
    pub unseen: u64,
}

impl NotificationFeed {
    pub(crate) const fn new(handle: FeedHandle) -> Self {
        Self { handle }
    }

    /// Read one page of notification groups.
    pub async fn activities(&self, query: &NotificationQuery) -> FeedResult<NotificationFeedOutput> {
        self.handle.activities(query.params()).await
    }

    /// Mark the latest `limit` groups as seen.
    pub async fn mark_activities_as_seen_with_limit(&self, limit: u32) -> FeedResult<()> {
        let query = NotificationQuery::new()
            .page(FeedQuery::new().limit(limit))
            .mark_seen(Marker::All);
        self.activities(&query).await.map(drop)
    }

    /// Mark the given activities as read.
    pub async fn mark_activities_as_read(&self, activities: &[Activity]) -> FeedResult<()> {
        if activities.is_empty() {
            return Err(FeedError::InvalidArgument(
                "No activities to mark as read".to_string(),
            ));
        }
        if activities.iter().any(|a| a.id.is_empty()) {
            return Err(FeedError::InvalidArgument(
                "Cannot mark an activity without id as read".to_string(),
            ));
        }

        let ids = activities.iter().map(|a| a.id.clone()).collect();
        let query = NotificationQuery::new().mark_read(Marker::Ids(ids));
        self.activities(&query).await.map(drop)
    }
}

#[async_trait]
impl Feed for NotificationFeed {
    fn handle(&self) -> &FeedHandle {
        &self.handle
    }

    fn kind(&self) -> FeedKind {
        FeedKind::Notification
    }
}
