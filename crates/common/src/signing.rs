//! Feed token signing.
//!
//! The feed service authenticates feed-scoped requests with a signature of the
//! form `"<slug><user_id> <token>"`, where the token is an HMAC-SHA1 of the
//! compact feed identity keyed by the SHA1 digest of the API secret, encoded as
//! URL-safe base64 without padding.
//!
//! # Examples
//!
//! ```
//! use stream_feed_common::signing::{build_signature, derive_token};
//!
//! let token = derive_token("secret", "flat:bob");
//! assert_eq!(token, derive_token("secret", "flat:bob"));
//! assert_eq!(build_signature(&token, "flat:bob"), format!("flatbob {token}"));
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use jsonwebtoken::{EncodingKey, Header};
use serde::Serialize;
use sha1::{Digest, Sha1};

use crate::{FeedError, FeedResult};

type HmacSha1 = Hmac<Sha1>;

/// Strip the `:` separator from a feed identity (`flat:bob` -> `flatbob`).
#[must_use]
pub fn compact_identity(feed_identity: &str) -> String {
    feed_identity.replace(':', "")
}

/// Derive the signing token for a feed.
///
/// Returns an empty string when either input is empty; a feed with an empty
/// token cannot use signature authentication.
#[must_use]
pub fn derive_token(secret: &str, feed_identity: &str) -> String {
    let subject = compact_identity(feed_identity);
    if secret.is_empty() || subject.is_empty() {
        return String::new();
    }

    let key = Sha1::digest(secret.as_bytes());
    let Ok(mut mac) = HmacSha1::new_from_slice(&key) else {
        return String::new();
    };
    mac.update(subject.as_bytes());

    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Build the `Authorization` value for signature authentication.
#[must_use]
pub fn build_signature(token: &str, feed_identity: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    format!("{} {token}", compact_identity(feed_identity))
}

#[derive(Serialize)]
struct ScopeClaims<'a> {
    resource: &'a str,
    action: &'a str,
    feed_id: &'a str,
}

/// Mint an HS256 JWT scoped to a resource, action and feed (`*` for any).
///
/// Used for application-level endpoints that have no feed to sign.
pub fn scoped_token(
    secret: &str,
    resource: &str,
    action: &str,
    feed_id: &str,
) -> FeedResult<String> {
    if secret.is_empty() {
        return Err(FeedError::Configuration(
            "Cannot mint a scoped token without an API secret".to_string(),
        ));
    }

    let claims = ScopeClaims {
        resource,
        action,
        feed_id,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| FeedError::Configuration(format!("Failed to sign scoped token: {e}")))
}
