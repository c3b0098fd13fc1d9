//! Follow relations.

use serde::{Deserialize, Serialize};

use crate::activity::FeedId;

/// Copy limit the service applies when a follow does not name one.
pub const DEFAULT_COPY_LIMIT: u32 = 300;

/// One edge of the follow graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FollowRelation {
    /// The following feed.
    pub feed_id: FeedId,
    /// The followed feed.
    pub target_id: FeedId,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Serialize)]
pub(super) struct FollowRequest<'a> {
    pub target: &'a FeedId,
    pub activity_copy_limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_token: Option<&'a str>,
}

#[derive(Deserialize)]
pub(super) struct FollowListEnvelope {
    #[serde(default)]
    pub results: Vec<FollowRelation>,
}
