//! Shared test helpers: an in-memory feed service and a scripted transport.

#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use stream_feed::{BoxError, Client, ClientConfig, HttpRequest, HttpResponse, Transport};
use stream_feed_common::signing;

pub const API_KEY: &str = "test-key";
pub const API_SECRET: &str = "test-secret";
pub const BEARER_TOKEN: &str = "pre-issued-token";

/// Route logs through the test writer; set `RUST_LOG=stream_feed=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn signing_config() -> ClientConfig {
    ClientConfig::new(API_KEY).with_secret(API_SECRET)
}

pub fn query(request: &HttpRequest) -> BTreeMap<String, String> {
    request.url.query_pairs().into_owned().collect()
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

pub fn body_json(request: &HttpRequest) -> Value {
    serde_json::from_slice(request.body.as_deref().unwrap_or(b"null")).unwrap()
}

fn json_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse::new(status, serde_json::to_vec(body).unwrap())
}

fn error_response(status: u16, code: i64, exception: &str, detail: &str) -> HttpResponse {
    json_response(
        status,
        &json!({
            "code": code,
            "detail": detail,
            "exception": exception,
            "status_code": status,
            "duration": "0ms",
        }),
    )
}

/// Transport that replays canned responses and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn client(self: &Arc<Self>, config: ClientConfig) -> Client {
        Client::with_transport(config, self.clone()).unwrap()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(message.into()),
            None => Ok(HttpResponse::new(200, "{}")),
        }
    }
}

#[derive(Default)]
struct ServiceState {
    next_id: u64,
    /// Activities per feed id, oldest first.
    activities: BTreeMap<String, Vec<Value>>,
    /// (follower, target) pairs.
    follows: Vec<(String, String)>,
    seen: HashSet<String>,
    read: HashSet<String>,
}

/// In-memory stand-in for the feed service.
///
/// Checks signatures against its own secret, so requests signed with any
/// other secret are rejected with 401.
pub struct FakeFeedService {
    secret: String,
    state: Mutex<ServiceState>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeFeedService {
    pub fn new() -> Arc<Self> {
        Self::with_secret(API_SECRET)
    }

    pub fn with_secret(secret: &str) -> Arc<Self> {
        Arc::new(Self {
            secret: secret.to_string(),
            state: Mutex::new(ServiceState::default()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn client(self: &Arc<Self>, config: ClientConfig) -> Client {
        Client::with_transport(config, self.clone()).unwrap()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    pub fn stored(&self, feed_id: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .activities
            .get(feed_id)
            .cloned()
            .unwrap_or_default()
    }

    fn authorised(&self, request: &HttpRequest, feed_id: Option<&str>) -> bool {
        let authorization = header(request, "authorization").unwrap_or_default();
        if header(request, "stream-auth-type") == Some("jwt") {
            return authorization == BEARER_TOKEN || authorization.split('.').count() == 3;
        }
        feed_id.is_some_and(|feed_id| {
            let expected =
                signing::build_signature(&signing::derive_token(&self.secret, feed_id), feed_id);
            !expected.is_empty() && authorization == expected
        })
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        let segments: Vec<String> = request
            .url
            .path_segments()
            .unwrap()
            .filter(|s| !s.is_empty())
            .skip(2) // api/<version>
            .map(|s| urlencoding::decode(s).unwrap().into_owned())
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let params = query(request);

        if params.get("api_key").map(String::as_str) != Some(API_KEY) {
            return error_response(401, 401, "AuthenticationFailed", "missing api key");
        }

        match (request.method.clone(), segments.as_slice()) {
            (Method::POST, ["activities"]) => {
                if !self.authorised(request, None) {
                    return error_response(401, 401, "NotAllowedException", "invalid token");
                }
                self.update_activities(&body_json(request))
            }
            (method, ["feed", slug, user, rest @ ..]) => {
                let feed_id = format!("{slug}:{user}");
                if !self.authorised(request, Some(&feed_id)) {
                    return error_response(401, 401, "NotAllowedException", "invalid signature");
                }
                self.feed_route(&method, &feed_id, slug, rest, request, &params)
            }
            _ => error_response(404, 16, "DoesNotExistException", "unknown endpoint"),
        }
    }

    fn feed_route(
        &self,
        method: &Method,
        feed_id: &str,
        slug: &str,
        rest: &[&str],
        request: &HttpRequest,
        params: &BTreeMap<String, String>,
    ) -> HttpResponse {
        let mut state = self.state.lock().unwrap();
        let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(25);
        let offset: usize = params.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);

        match (method.clone(), rest) {
            (Method::POST, []) => {
                let body = body_json(request);
                if let Some(batch) = body.get("activities").and_then(Value::as_array) {
                    let stored: Vec<Value> = batch
                        .iter()
                        .map(|a| Self::store(&mut state, feed_id, a.clone()))
                        .collect();
                    json_response(201, &json!({"activities": stored, "duration": "1ms"}))
                } else {
                    let mut stored = Self::store(&mut state, feed_id, body);
                    stored["duration"] = json!("1ms");
                    json_response(201, &stored)
                }
            }
            (Method::GET, []) => {
                let newest_first: Vec<Value> = state
                    .activities
                    .get(feed_id)
                    .map(|list| list.iter().rev().cloned().collect())
                    .unwrap_or_default();
                let page: Vec<Value> =
                    newest_first.into_iter().skip(offset).take(limit).collect();

                if slug != "notification" {
                    return json_response(
                        200,
                        &json!({"duration": "1ms", "next": "", "results": page}),
                    );
                }

                let all_ids: Vec<String> = state
                    .activities
                    .get(feed_id)
                    .map(|list| list.iter().map(|a| a["id"].as_str().unwrap().to_string()).collect())
                    .unwrap_or_default();
                let unseen = all_ids.iter().filter(|id| !state.seen.contains(*id)).count();
                let unread = all_ids.iter().filter(|id| !state.read.contains(*id)).count();
                let groups: Vec<Value> = page
                    .iter()
                    .map(|activity| {
                        let id = activity["id"].as_str().unwrap();
                        json!({
                            "id": id,
                            "group": id,
                            "verb": activity["verb"],
                            "activity_count": 1,
                            "actor_count": 1,
                            "is_seen": state.seen.contains(id),
                            "is_read": state.read.contains(id),
                            "activities": [activity],
                        })
                    })
                    .collect();

                if params.get("mark_seen").map(String::as_str) == Some("true") {
                    for group in &groups {
                        state.seen.insert(group["id"].as_str().unwrap().to_string());
                    }
                }
                if let Some(ids) = params.get("mark_read") {
                    for id in ids.split(',') {
                        state.read.insert(id.to_string());
                    }
                }

                json_response(
                    200,
                    &json!({
                        "duration": "1ms",
                        "next": "",
                        "results": groups,
                        "unseen": unseen,
                        "unread": unread,
                    }),
                )
            }
            (Method::DELETE, ["follows", target]) => {
                let target = (*target).to_string();
                state
                    .follows
                    .retain(|(follower, followed)| !(follower == feed_id && *followed == target));
                json_response(200, &json!({"duration": "1ms"}))
            }
            (Method::DELETE, [key]) => {
                let field = if params.get("foreign_id").map(String::as_str) == Some("1") {
                    "foreign_id"
                } else {
                    "id"
                };
                let list = state.activities.entry(feed_id.to_string()).or_default();
                let before = list.len();
                list.retain(|a| a[field].as_str() != Some(*key));
                if list.len() == before {
                    return error_response(404, 16, "DoesNotExistException", "activity not found");
                }
                json_response(200, &json!({"removed": key, "duration": "1ms"}))
            }
            (Method::POST, ["follows"]) => {
                let body = body_json(request);
                let target = body["target"].as_str().unwrap_or_default().to_string();
                if body["activity_copy_limit"].as_u64().is_none() {
                    return error_response(400, 4, "InputException", "missing copy limit");
                }
                let pair = (feed_id.to_string(), target);
                if !state.follows.contains(&pair) {
                    state.follows.push(pair);
                }
                json_response(201, &json!({"duration": "1ms"}))
            }
            (Method::GET, [relation @ ("follows" | "followers")]) => {
                let results: Vec<Value> = state
                    .follows
                    .iter()
                    .filter(|(follower, followed)| {
                        if *relation == "follows" {
                            follower == feed_id
                        } else {
                            followed == feed_id
                        }
                    })
                    .skip(offset)
                    .take(limit)
                    .map(|(follower, followed)| {
                        json!({
                            "feed_id": follower,
                            "target_id": followed,
                            "created_at": "2017-01-01T00:00:00Z",
                            "updated_at": "2017-01-01T00:00:00Z",
                        })
                    })
                    .collect();
                json_response(200, &json!({"duration": "1ms", "results": results}))
            }
            _ => error_response(404, 16, "DoesNotExistException", "unknown endpoint"),
        }
    }

    fn store(state: &mut ServiceState, feed_id: &str, mut activity: Value) -> Value {
        state.next_id += 1;
        activity["id"] = json!(format!("act-{}", state.next_id));
        state
            .activities
            .entry(feed_id.to_string())
            .or_default()
            .push(activity.clone());
        activity
    }

    fn update_activities(&self, body: &Value) -> HttpResponse {
        let mut state = self.state.lock().unwrap();
        let Some(updates) = body.get("activities").and_then(Value::as_array) else {
            return error_response(400, 4, "InputException", "missing activities");
        };
        for update in updates {
            for list in state.activities.values_mut() {
                for stored in list.iter_mut() {
                    if stored["id"] == update["id"] {
                        *stored = update.clone();
                    }
                }
            }
        }
        json_response(201, &json!({"duration": "1ms"}))
    }
}

#[async_trait]
impl Transport for FakeFeedService {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        let response = self.route(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}
