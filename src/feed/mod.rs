//! Upstream feed retrieval and decoding.
//!
//! - **Fetching**: one bounded HTTP GET per request, no retries
//! - **Parsing**: RSS 2.0 or Atom XML into the unified [`Feed`] model
//!
//! # Architecture
//!
//! - [`model`] - Serializable feed representation returned to clients
//! - [`parser`] - Declarative `quick-xml` bindings for both schemas
//! - [`fetcher`] - `reqwest` client with size and deadline limits
//!
//! # Example
//!
//! ```ignore
//! use feedrelay::feed::{parse_feed, FeedFetcher, FetchOptions};
//! use feedrelay::registry::FeedFormat;
//!
//! let fetcher = FeedFetcher::new(FetchOptions::default())?;
//! let bytes = fetcher.fetch("https://g1.globo.com/dynamo/brasil/rss2.xml").await?;
//! let feed = parse_feed(&bytes, FeedFormat::Rss)?;
//! ```

mod fetcher;
pub mod model;
mod parser;

pub use fetcher::{FeedFetcher, FetchError, FetchOptions, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_FEED_SIZE};
pub use model::{AtomFeed, Category, Channel, Feed, FeedEntry, FeedItem, Link};
pub use parser::{parse_feed, ParseError};
