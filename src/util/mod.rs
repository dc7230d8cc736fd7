//! Utility functions shared across the relay.
//!
//! - **URL validation**: shape checks applied to registry entries at startup
//!
//! # Examples
//!
//! ```
//! use feedrelay::util::validate_feed_url;
//!
//! let url = validate_feed_url("https://example.com/feed.xml").unwrap();
//! assert_eq!(url.scheme(), "https");
//! ```

mod url_validator;

pub use url_validator::{validate_feed_url, UrlValidationError};
