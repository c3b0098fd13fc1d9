//! Response classification and decoding.

use serde::de::DeserializeOwned;
use stream_feed_common::{ApiError, FeedError, FeedResult};

use crate::transport::HttpResponse;

/// A 2xx response body, kept verbatim until the caller decodes it.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Decode the body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> FeedResult<T> {
        serde_json::from_slice(&self.body).map_err(|source| FeedError::Decode {
            status: Some(self.status),
            source,
        })
    }
}

/// Split a raw response into success or a typed failure.
///
/// Any 2xx is success regardless of body. Anything else must carry an
/// [`ApiError`] payload; a body that does not decode as one is reported as
/// [`FeedError::Decode`], not as a protocol error.
pub fn classify(response: HttpResponse) -> FeedResult<ApiResponse> {
    let status = response.status;
    if response.is_success() {
        return Ok(ApiResponse {
            status,
            body: response.body,
        });
    }

    match serde_json::from_slice::<ApiError>(&response.body) {
        Ok(error) => Err(FeedError::Protocol { status, error }),
        Err(source) => Err(FeedError::Decode {
            status: Some(status),
            source,
        }),
    }
}
