use serde::{Deserialize, Serialize};

use crate::registry::FeedFormat;

/// A parsed upstream feed, tagged with the schema it was read as.
///
/// Serializes with a `format` discriminator next to the variant's fields:
///
/// ```json
/// {"format": "rss", "title": "...", "link": "...", "description": "...", "items": []}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum Feed {
    Rss(Channel),
    Atom(AtomFeed),
}

impl Feed {
    pub fn format(&self) -> FeedFormat {
        match self {
            Feed::Rss(_) => FeedFormat::Rss,
            Feed::Atom(_) => FeedFormat::Atom,
        }
    }

    /// Number of items (RSS) or entries (Atom).
    pub fn len(&self) -> usize {
        match self {
            Feed::Rss(channel) => channel.items.len(),
            Feed::Atom(feed) => feed.entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RSS `<channel>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<FeedItem>,
}

/// RSS `<item>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Verbatim `<pubDate>` text.
    pub published_at: String,
}

/// Atom `<feed>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomFeed {
    pub id: String,
    pub title: String,
    pub updated: String,
    pub entries: Vec<FeedEntry>,
}

/// Atom `<entry>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Verbatim `<published>` text.
    pub published_at: String,
    pub link: Link,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub relation: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub term: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_rss_serializes_with_format_tag() {
        let feed = Feed::Rss(Channel {
            title: "g1 > Brasil".into(),
            link: "https://g1.globo.com/brasil/".into(),
            description: String::new(),
            items: vec![FeedItem {
                title: "Manchete".into(),
                link: "https://g1.globo.com/a".into(),
                description: String::new(),
                published_at: "Tue, 01 Oct 2024 10:00:00 -0000".into(),
            }],
        });

        assert_eq!(
            serde_json::to_value(&feed).unwrap(),
            json!({
                "format": "rss",
                "title": "g1 > Brasil",
                "link": "https://g1.globo.com/brasil/",
                "description": "",
                "items": [{
                    "title": "Manchete",
                    "link": "https://g1.globo.com/a",
                    "description": "",
                    "publishedAt": "Tue, 01 Oct 2024 10:00:00 -0000"
                }]
            })
        );
    }

    #[test]
    fn test_atom_entry_field_names() {
        let entry = FeedEntry {
            id: "urn:1".into(),
            title: "T".into(),
            summary: "S".into(),
            published_at: "2024-10-01T10:00:00Z".into(),
            link: Link {
                relation: "alternate".into(),
                href: "https://www.bbc.com/x".into(),
            },
            categories: vec![Category { term: "brasil".into() }],
        };

        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "id": "urn:1",
                "title": "T",
                "summary": "S",
                "publishedAt": "2024-10-01T10:00:00Z",
                "link": {"relation": "alternate", "href": "https://www.bbc.com/x"},
                "categories": [{"term": "brasil"}]
            })
        );
    }

    #[test]
    fn test_len_and_format() {
        let atom = Feed::Atom(AtomFeed::default());
        assert!(atom.is_empty());
        assert_eq!(atom.format(), FeedFormat::Atom);
        assert_eq!(serde_json::to_value(&atom).unwrap()["format"], "atom");
    }
}
