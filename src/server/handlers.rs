use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::feed::{parse_feed, Feed};
use crate::registry::FeedFormat;

use super::error::{RelayError, RelayResult};
use super::AppState;

/// Entry in the `GET /topics` listing.
#[derive(Debug, Serialize)]
pub struct PlatformSummary {
    pub format: FeedFormat,
    pub topics: Vec<String>,
}

/// `GET /topics/{platform}` body.
#[derive(Debug, Serialize)]
pub struct PlatformTopics {
    pub platform: String,
    pub format: FeedFormat,
    pub topics: Vec<String>,
}

/// `GET /topics/{platform}/{topic}`: resolve, fetch once, parse, re-serve.
pub async fn get_topic_feed(
    State(state): State<AppState>,
    Path((platform, topic)): Path<(String, String)>,
) -> RelayResult<Json<Feed>> {
    let resolved = state.registry.resolve(&platform, &topic)?;

    let bytes = state.fetcher.fetch(resolved.url).await.map_err(|e| {
        tracing::warn!(
            platform = %platform,
            topic = %topic,
            url = %resolved.url,
            error = %e,
            "Failed to fetch upstream feed"
        );
        RelayError::from(e)
    })?;

    let feed = parse_feed(&bytes, resolved.format).map_err(|e| {
        tracing::warn!(
            platform = %platform,
            topic = %topic,
            url = %resolved.url,
            error = %e,
            "Failed to parse upstream feed"
        );
        RelayError::from(e)
    })?;

    tracing::debug!(
        platform = %platform,
        topic = %topic,
        format = %feed.format(),
        items = feed.len(),
        "Relayed feed"
    );

    Ok(Json(feed))
}

/// `GET /topics`: every platform with its resolvable topics.
pub async fn list_platforms(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, PlatformSummary>> {
    let listing = state
        .registry
        .platforms()
        .map(|(name, platform)| {
            let topics = state
                .registry
                .topics(name)
                .unwrap_or_default()
                .into_iter()
                .map(str::to_owned)
                .collect();
            (
                name.to_owned(),
                PlatformSummary {
                    format: platform.format,
                    topics,
                },
            )
        })
        .collect();

    Json(listing)
}

/// `GET /topics/{platform}`
pub async fn list_topics(
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> RelayResult<Json<PlatformTopics>> {
    let format = state.registry.platform(&platform)?.format;
    let topics = state
        .registry
        .topics(&platform)?
        .into_iter()
        .map(str::to_owned)
        .collect();

    Ok(Json(PlatformTopics {
        platform,
        format,
        topics,
    }))
}

/// Fallback for unmatched paths.
pub async fn not_found() -> RelayError {
    RelayError::NotFound
}
