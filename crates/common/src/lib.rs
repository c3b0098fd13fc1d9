//! Common types shared by the stream-feed crates.
//!
//! - **Configuration**: client settings via [`ClientConfig`]
//! - **Error handling**: the [`FeedError`] taxonomy and [`FeedResult`]
//! - **Signing**: feed token derivation and scoped JWTs in [`signing`]
//!
//! # Example
//!
//! ```no_run
//! use stream_feed_common::{ClientConfig, FeedResult};
//!
//! fn example() -> FeedResult<()> {
//!     let config = ClientConfig::load()?;
//!     println!("Talking to {}", config.resolve_base_url()?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod signing;

pub use config::{ClientConfig, DEFAULT_API_VERSION, DEFAULT_LOCATION};
pub use error::{ApiError, BoxError, FeedError, FeedResult};
pub use signing::{build_signature, derive_token, scoped_token};
