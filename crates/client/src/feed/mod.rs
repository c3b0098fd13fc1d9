//! Feed variants and the operations they share.
//!
//! Every variant wraps a [`FeedHandle`], which knows the feed's identity and
//! signing token and implements the requests common to all feeds. The
//! [`Feed`] trait exposes those operations; reading a feed is variant-specific
//! because each variant returns a differently shaped page.

mod aggregated;
mod flat;
mod follow;
mod notification;
mod query;

pub use aggregated::{ActivityGroup, AggregatedFeed, AggregatedFeedOutput};
pub use flat::{FlatFeed, FlatFeedOutput};
pub use follow::{DEFAULT_COPY_LIMIT, FollowRelation};
pub use notification::{NotificationFeed, NotificationFeedOutput, NotificationGroup};
pub use query::{FeedQuery, Marker, NotificationQuery};

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::OnceLock;
use stream_feed_common::{FeedError, FeedResult, signing};

use crate::activity::{Activity, FeedId};
use crate::client::{ActivitiesPayload, Client};
use crate::request::{ApiRequest, AuthScope};
use follow::{FollowListEnvelope, FollowRequest};

/// The closed set of feed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Flat,
    Aggregated,
    Notification,
}

#[derive(Deserialize)]
struct ActivitiesEnvelope {
    #[serde(default)]
    activities: Vec<Activity>,
}

fn escape(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// `.` and `..` survive escaping and are collapsed when the URL is resolved.
fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

fn validate_segment(name: &str, value: &str) -> FeedResult<()> {
    if value.is_empty() {
        return Err(FeedError::InvalidFeed(format!("Feed {name} must not be empty")));
    }
    if is_dot_segment(value) {
        return Err(FeedError::InvalidFeed(format!(
            "Feed {name} must not be {value:?}"
        )));
    }
    Ok(())
}

fn validate_key(name: &str, value: &str) -> FeedResult<()> {
    if is_dot_segment(value) {
        return Err(FeedError::InvalidArgument(format!(
            "Activity {name} must not be {value:?}"
        )));
    }
    Ok(())
}

/// Identity and shared operations of one feed.
#[derive(Clone)]
pub struct FeedHandle {
    client: Client,
    slug: String,
    user_id: String,
    token: OnceLock<String>,
}

impl FeedHandle {
    pub(crate) fn new(client: Client, slug: &str, user_id: &str) -> FeedResult<Self> {
        validate_segment("slug", slug)?;
        validate_segment("user id", user_id)?;
        if slug.contains(':') {
            return Err(FeedError::InvalidFeed(format!(
                "Feed slug {slug:?} must not contain ':'"
            )));
        }

        Ok(Self {
            client,
            slug: slug.to_string(),
            user_id: user_id.to_string(),
            token: OnceLock::new(),
        })
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// `slug:user_id`.
    #[must_use]
    pub fn feed_id(&self) -> FeedId {
        FeedId::new(&self.slug, &self.user_id)
    }

    /// The feed token, derived from the client secret on first use.
    ///
    /// Empty when the client has no secret.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.get_or_init(|| {
            self.client
                .config()
                .secret()
                .map(|secret| signing::derive_token(secret, self.feed_id().as_str()))
                .unwrap_or_default()
        })
    }

    /// Value of the `Authorization` header under signature authentication.
    #[must_use]
    pub fn signature(&self) -> String {
        signing::build_signature(self.token(), self.feed_id().as_str())
    }

    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// `feed/<slug>/<user_id>/<tail...>/`, every segment escaped.
    fn path(&self, tail: &[&str]) -> String {
        let mut path = format!("feed/{}/{}/", escape(&self.slug), escape(&self.user_id));
        for segment in tail {
            path.push_str(segment);
            path.push('/');
        }
        path
    }

    /// Path segment naming another feed, `slug:user_id` with both parts escaped.
    fn target_segment(target: &Self) -> String {
        format!("{}:{}", escape(&target.slug), escape(&target.user_id))
    }

    const fn scope(&self) -> AuthScope<'_> {
        AuthScope::Feed(self)
    }

    pub(crate) async fn add_activity(&self, activity: &Activity) -> FeedResult<Activity> {
        let request = ApiRequest::post(self.path(&[]), self.scope()).json(activity)?;
        self.client.send(request).await?.decode()
    }

    pub(crate) async fn add_activities(&self, activities: &[Activity]) -> FeedResult<Vec<Activity>> {
        let request = ApiRequest::post(self.path(&[]), self.scope())
            .json(&ActivitiesPayload { activities })?;
        let envelope: ActivitiesEnvelope = self.client.send(request).await?.decode()?;
        Ok(envelope.activities)
    }

    pub(crate) async fn remove_activity(&self, activity: &Activity) -> FeedResult<()> {
        if activity.id.is_empty() {
            return Err(FeedError::InvalidArgument(
                "Activity has no id to remove by".to_string(),
            ));
        }
        validate_key("id", &activity.id)?;

        let request = ApiRequest::delete(self.path(&[escape(&activity.id).as_str()]), self.scope());
        self.client.send(request).await.map(drop)
    }

    pub(crate) async fn remove_activity_by_foreign_id(&self, activity: &Activity) -> FeedResult<()> {
        let foreign_id = activity
            .foreign_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                FeedError::InvalidArgument("Activity has no foreign id to remove by".to_string())
            })?;
        validate_key("foreign id", foreign_id)?;

        let request = ApiRequest::delete(self.path(&[escape(foreign_id).as_str()]), self.scope())
            .param("foreign_id", "1");
        self.client.send(request).await.map(drop)
    }

    /// Read one page of the feed, decoded into the variant's output type.
    pub(crate) async fn activities<T, P>(&self, params: P) -> FeedResult<T>
    where
        T: DeserializeOwned,
        P: IntoIterator<Item = (&'static str, String)> + Send,
    {
        let request = ApiRequest::get(self.path(&[]), self.scope()).params(params);
        self.client.send(request).await?.decode()
    }

    pub(crate) async fn follow(&self, target: &Self, copy_limit: u32) -> FeedResult<()> {
        let target_id = target.feed_id();
        let payload = FollowRequest {
            target: &target_id,
            activity_copy_limit: copy_limit,
            target_token: Some(target.token()).filter(|t| !t.is_empty()),
        };

        let request = ApiRequest::post(self.path(&["follows"]), self.scope()).json(&payload)?;
        self.client.send(request).await.map(drop)
    }

    pub(crate) async fn unfollow(&self, target: &Self, keep_history: bool) -> FeedResult<()> {
        let target_segment = Self::target_segment(target);
        let mut request =
            ApiRequest::delete(self.path(&["follows", target_segment.as_str()]), self.scope());
        if keep_history {
            request = request.param("keep_history", "1");
        }
        self.client.send(request).await.map(drop)
    }

    pub(crate) async fn follow_list(
        &self,
        relation: &str,
        limit: u32,
        skip: u32,
    ) -> FeedResult<Vec<FollowRelation>> {
        let request = ApiRequest::get(self.path(&[relation]), self.scope())
            .param("limit", limit.to_string())
            .param("offset", skip.to_string());
        let envelope: FollowListEnvelope = self.client.send(request).await?.decode()?;
        Ok(envelope.results)
    }
}

impl fmt::Debug for FeedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedHandle")
            .field("slug", &self.slug)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Operations every feed variant supports.
///
/// Each operation issues exactly one request. Nothing is retried.
#[async_trait]
pub trait Feed: Send + Sync {
    /// The shared identity and request plumbing behind this feed.
    fn handle(&self) -> &FeedHandle;

    fn kind(&self) -> FeedKind;

    fn slug(&self) -> &str {
        self.handle().slug()
    }

    fn user_id(&self) -> &str {
        self.handle().user_id()
    }

    fn feed_id(&self) -> FeedId {
        self.handle().feed_id()
    }

    fn token(&self) -> &str {
        self.handle().token()
    }

    fn signature(&self) -> String {
        self.handle().signature()
    }

    /// Add one activity; returns it as stored, including the server-assigned id.
    async fn add_activity(&self, activity: &Activity) -> FeedResult<Activity> {
        self.handle().add_activity(activity).await
    }

    /// Add several activities in a single request.
    async fn add_activities(&self, activities: &[Activity]) -> FeedResult<Vec<Activity>> {
        self.handle().add_activities(activities).await
    }

    /// Remove an activity by its server-assigned id.
    async fn remove_activity(&self, activity: &Activity) -> FeedResult<()> {
        self.handle().remove_activity(activity).await
    }

    /// Remove an activity by its foreign id.
    async fn remove_activity_by_foreign_id(&self, activity: &Activity) -> FeedResult<()> {
        self.handle().remove_activity_by_foreign_id(activity).await
    }

    /// Follow `target`, copying at most `copy_limit` of its existing activities.
    async fn follow_feed_with_copy_limit(&self, target: &dyn Feed, copy_limit: u32) -> FeedResult<()> {
        self.handle().follow(target.handle(), copy_limit).await
    }

    /// Follow `target` with the service's default copy limit.
    async fn follow_feed(&self, target: &dyn Feed) -> FeedResult<()> {
        self.handle().follow(target.handle(), DEFAULT_COPY_LIMIT).await
    }

    /// Stop following `target` and drop its activities from this feed.
    async fn unfollow(&self, target: &dyn Feed) -> FeedResult<()> {
        self.handle().unfollow(target.handle(), false).await
    }

    /// Stop following `target` but keep already copied activities.
    async fn unfollow_keeping_history(&self, target: &dyn Feed) -> FeedResult<()> {
        self.handle().unfollow(target.handle(), true).await
    }

    /// Feeds this feed follows.
    async fn following_with_limit_and_skip(&self, limit: u32, skip: u32) -> FeedResult<Vec<FollowRelation>> {
        self.handle().follow_list("follows", limit, skip).await
    }

    /// Feeds following this feed.
    async fn followers_with_limit_and_skip(&self, limit: u32, skip: u32) -> FeedResult<Vec<FollowRelation>> {
        self.handle().follow_list("followers", limit, skip).await
    }
}
