//! XML → [`Feed`] decoding.
//!
//! The wire shapes below are declarative serde bindings read by `quick-xml`'s
//! deserializer: element names map to fields, `@name` maps to attributes.
//! RSS elements are visited child by child because `<link>` and
//! `<atom:link>` interleave with other siblings in ordinary channels.
//! Unknown elements are skipped and missing ones default to empty values, so
//! the only hard failures are malformed XML, a truncated stream, or (for RSS)
//! a document with no `<channel>`.

use quick_xml::de::DeError;
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

use super::model::{AtomFeed, Category, Channel, Feed, FeedEntry, FeedItem, Link};
use crate::registry::FeedFormat;

/// Upstream body could not be decoded as the platform's feed format.
#[derive(Debug, Error)]
#[error("Failed to parse {format} feed: {source}")]
pub struct ParseError {
    pub format: FeedFormat,
    pub source: DeError,
}

// ============================================================================
// RSS 2.0 bindings
// ============================================================================

#[derive(Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

#[derive(Default)]
struct RssChannel {
    title: String,
    links: Vec<String>,
    description: String,
    items: Vec<RssItem>,
}

#[derive(Default)]
struct RssItem {
    title: String,
    links: Vec<String>,
    description: String,
    pub_date: String,
}

/// `<link>` text. The attribute-only `<atom:link rel="self"/>` shares its
/// local name and reads as an empty link.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RssLink {
    #[serde(rename = "$text")]
    text: String,
}

/// An RSS element read child by child, so that `<link>`, `<atom:link>`
/// and `<item>` may repeat anywhere among their siblings.
trait RssElement: Default {
    const NAME: &'static str;

    fn read_child<'de, A: MapAccess<'de>>(
        &mut self,
        key: &str,
        map: &mut A,
    ) -> Result<(), A::Error>;
}

struct RssVisitor<T>(PhantomData<T>);

impl<'de, T: RssElement> Visitor<'de> for RssVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an RSS <{}> element", T::NAME)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<T, A::Error> {
        let mut element = T::default();
        while let Some(key) = map.next_key::<String>()? {
            element.read_child(&key, &mut map)?;
        }
        Ok(element)
    }
}

// Namespaced siblings like <media:title> share a local name; first value wins.
fn keep_first(slot: &mut String, value: String) {
    if slot.is_empty() {
        *slot = value;
    }
}

impl RssElement for RssChannel {
    const NAME: &'static str = "channel";

    fn read_child<'de, A: MapAccess<'de>>(
        &mut self,
        key: &str,
        map: &mut A,
    ) -> Result<(), A::Error> {
        match key {
            "title" => keep_first(&mut self.title, map.next_value()?),
            "link" | "atom:link" => self.links.push(map.next_value::<RssLink>()?.text),
            "description" => keep_first(&mut self.description, map.next_value()?),
            "item" => self.items.push(map.next_value()?),
            _ => {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

impl RssElement for RssItem {
    const NAME: &'static str = "item";

    fn read_child<'de, A: MapAccess<'de>>(
        &mut self,
        key: &str,
        map: &mut A,
    ) -> Result<(), A::Error> {
        match key {
            "title" => keep_first(&mut self.title, map.next_value()?),
            "link" | "atom:link" => self.links.push(map.next_value::<RssLink>()?.text),
            "description" => keep_first(&mut self.description, map.next_value()?),
            "pubDate" => keep_first(&mut self.pub_date, map.next_value()?),
            _ => {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for RssChannel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RssVisitor(PhantomData))
    }
}

impl<'de> Deserialize<'de> for RssItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RssVisitor(PhantomData))
    }
}

// ============================================================================
// Atom bindings
// ============================================================================

#[derive(Deserialize, Default)]
#[serde(default)]
struct AtomDocument {
    id: String,
    title: String,
    updated: String,
    #[serde(rename = "entry")]
    entries: Vec<AtomEntry>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AtomEntry {
    id: String,
    title: String,
    summary: String,
    published: String,
    #[serde(rename = "link")]
    links: Vec<AtomLink>,
    #[serde(rename = "category")]
    categories: Vec<AtomCategory>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AtomLink {
    #[serde(rename = "@rel")]
    rel: String,
    #[serde(rename = "@href")]
    href: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: String,
}

// ============================================================================
// Conversion
// ============================================================================

fn first_non_empty(links: Vec<String>) -> String {
    links
        .into_iter()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default()
}

impl From<RssItem> for FeedItem {
    fn from(item: RssItem) -> Self {
        Self {
            title: item.title,
            link: first_non_empty(item.links),
            description: item.description,
            published_at: item.pub_date,
        }
    }
}

impl From<RssChannel> for Channel {
    fn from(channel: RssChannel) -> Self {
        Self {
            title: channel.title,
            link: first_non_empty(channel.links),
            description: channel.description,
            items: channel.items.into_iter().map(FeedItem::from).collect(),
        }
    }
}

/// Prefers the `alternate` link (explicit or implied by a missing `rel`),
/// falling back to the first link of any relation.
fn primary_link(links: Vec<AtomLink>) -> Link {
    let index = links
        .iter()
        .position(|l| l.rel.is_empty() || l.rel == "alternate")
        .unwrap_or(0);

    links
        .into_iter()
        .nth(index)
        .map(|l| Link {
            relation: l.rel,
            href: l.href,
        })
        .unwrap_or_default()
}

impl From<AtomEntry> for FeedEntry {
    fn from(entry: AtomEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title,
            summary: entry.summary,
            published_at: entry.published,
            link: primary_link(entry.links),
            categories: entry
                .categories
                .into_iter()
                .map(|c| Category { term: c.term })
                .collect(),
        }
    }
}

impl From<AtomDocument> for AtomFeed {
    fn from(doc: AtomDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            updated: doc.updated,
            entries: doc.entries.into_iter().map(FeedEntry::from).collect(),
        }
    }
}

/// Decodes a feed body according to the platform's declared format.
///
/// Text values pass through verbatim (entity-unescaped, CDATA unwrapped);
/// dates are not normalized.
///
/// # Errors
///
/// Returns [`ParseError`] on malformed XML, premature end of input, or an
/// RSS document without a `<channel>` element.
pub fn parse_feed(bytes: &[u8], format: FeedFormat) -> Result<Feed, ParseError> {
    let to_error = |source| ParseError { format, source };

    // quick-xml never expands <!ENTITY> declarations, so custom
    // entities fail with an unrecognized-entity error instead of resolving.
    match format {
        FeedFormat::Rss => {
            let doc: RssDocument = quick_xml::de::from_reader(bytes).map_err(to_error)?;
            Ok(Feed::Rss(doc.channel.into()))
        }
        FeedFormat::Atom => {
            let doc: AtomDocument = quick_xml::de::from_reader(bytes).map_err(to_error)?;
            Ok(Feed::Atom(doc.into()))
        }
    }
}
