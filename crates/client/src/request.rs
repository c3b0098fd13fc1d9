//! Request construction.
//!
//! Every call goes through the same steps: resolve the relative path against
//! the base URL, merge the standard parameters with the per-call ones, pick an
//! authentication scheme, then attach headers and body. Authentication is
//! chosen here, at send time, so a client holding both a secret and a bearer
//! token can use either depending on the feed.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use stream_feed_common::{ClientConfig, FeedError, FeedResult, signing};
use tracing::debug;
use url::Url;

use crate::feed::FeedHandle;
use crate::transport::HttpRequest;

/// Value of the `X-Stream-Client` header.
pub const CLIENT_IDENTIFIER: &str =
    concat!("stream-feed-rust-client-", env!("CARGO_PKG_VERSION"));

const CLIENT_HEADER: &str = "x-stream-client";
const AUTH_TYPE_HEADER: &str = "stream-auth-type";

/// What a request is authorised against.
#[derive(Debug, Clone, Copy)]
pub enum AuthScope<'a> {
    /// A feed-scoped endpoint, signed with the feed's token when possible.
    Feed(&'a FeedHandle),
    /// An application-level endpoint with no feed to sign.
    Application { resource: &'static str },
}

/// The authentication scheme applied to a request.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: <feed signature>`.
    Signature(String),
    /// `stream-auth-type: jwt` plus `Authorization: <token>`.
    Jwt(String),
}

impl AuthScheme {
    /// Select the scheme for a request.
    ///
    /// Priority:
    /// 1. the client has a secret and the feed has a non-empty token: signature;
    /// 2. a bearer token is configured: JWT;
    /// 3. otherwise [`FeedError::Configuration`].
    ///
    /// Application-level requests mint a scoped JWT from the secret in step 1.
    pub fn select(config: &ClientConfig, scope: AuthScope<'_>) -> FeedResult<Self> {
        match scope {
            AuthScope::Feed(feed) => {
                if config.secret().is_some() && !feed.token().is_empty() {
                    return Ok(Self::Signature(feed.signature()));
                }
            }
            AuthScope::Application { resource } => {
                if let Some(secret) = config.secret() {
                    return signing::scoped_token(secret, resource, "*", "*").map(Self::Jwt);
                }
            }
        }

        config
            .bearer_token()
            .map(|token| Self::Jwt(token.to_string()))
            .ok_or_else(|| {
                FeedError::Configuration("No API secret or bearer token configured".to_string())
            })
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Signature(_) => "signature",
            Self::Jwt(_) => "jwt",
        }
    }

    fn apply(&self, headers: &mut HeaderMap) -> FeedResult<()> {
        match self {
            Self::Signature(signature) => {
                headers.insert(AUTHORIZATION, credential_header(signature)?);
            }
            Self::Jwt(token) => {
                headers.insert(AUTH_TYPE_HEADER, HeaderValue::from_static("jwt"));
                headers.insert(AUTHORIZATION, credential_header(token)?);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthScheme::{}(<redacted>)", self.kind())
    }
}

fn credential_header(value: &str) -> FeedResult<HeaderValue> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        FeedError::Configuration("Credential contains characters not allowed in a header".to_string())
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// A request relative to the API base URL, before authentication.
pub struct ApiRequest<'a> {
    method: Method,
    path: String,
    scope: AuthScope<'a>,
    params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> ApiRequest<'a> {
    /// Create a request for `path`, relative to the base URL.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, scope: AuthScope<'a>) -> Self {
        Self {
            method,
            path: path.into(),
            scope,
            params: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>, scope: AuthScope<'a>) -> Self {
        Self::new(Method::GET, path, scope)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, scope: AuthScope<'a>) -> Self {
        Self::new(Method::POST, path, scope)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>, scope: AuthScope<'a>) -> Self {
        Self::new(Method::DELETE, path, scope)
    }

    /// Add a query parameter. Per-call parameters win over the standard ones.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> FeedResult<Self> {
        self.body = Some(serde_json::to_vec(body).map_err(FeedError::Encode)?);
        Ok(self)
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolve, parameterise and authenticate the request.
    ///
    /// Fails without side effects when no authentication scheme is usable.
    pub fn build(self, config: &ClientConfig, base_url: &Url) -> FeedResult<HttpRequest> {
        let mut url = base_url.join(&self.path)?;

        let mut query: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
        query.insert("api_key".to_string(), config.api_key.clone());
        query.insert(
            "location".to_string(),
            config.location_or_default().to_string(),
        );
        query.extend(self.params);
        url.query_pairs_mut().clear().extend_pairs(&query);

        let auth = AuthScheme::select(config, self.scope)?;

        let mut headers = HeaderMap::new();
        headers.insert(CLIENT_HEADER, HeaderValue::from_static(CLIENT_IDENTIFIER));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        auth.apply(&mut headers)?;

        debug!(
            method = %self.method,
            path = %url.path(),
            auth = auth.kind(),
            "Built feed request"
        );

        Ok(HttpRequest {
            method: self.method,
            url,
            headers,
            body: self.body,
        })
    }
}
