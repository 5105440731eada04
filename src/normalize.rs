use chrono::{Datelike, DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::document::{FeedDocument, LinkNode, RawItem};

pub const UNTITLED: &str = "(untitled)";
pub const MISSING_LINK: &str = "#";

/// Offset-carrying formats tried after RFC 2822 and RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Formats without an offset; read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    #[serde(rename = "pubDate", serialize_with = "serialize_iso")]
    pub pub_date: DateTime<Utc>,
    pub source: String,
}

fn serialize_iso<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Ways of finding an item's link, tried in [`LinkStrategy::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// A single `<link>` carrying the URL as text.
    Text,
    /// A single `<link>` carrying an `href` attribute.
    Href,
    /// Several `<link>` elements, the first carrying `href`.
    FirstHref,
    /// The `<guid>`, unless marked `isPermaLink="false"`.
    Guid,
}

impl LinkStrategy {
    pub const ORDER: [LinkStrategy; 4] = [
        LinkStrategy::Text,
        LinkStrategy::Href,
        LinkStrategy::FirstHref,
        LinkStrategy::Guid,
    ];

    pub fn extract(self, item: &RawItem) -> Option<String> {
        match self {
            LinkStrategy::Text => match item.links.as_slice() {
                [LinkNode::Text(url)] => non_blank(url),
                _ => None,
            },
            LinkStrategy::Href => match item.links.as_slice() {
                [LinkNode::Href(href)] => non_blank(href),
                _ => None,
            },
            LinkStrategy::FirstHref => match item.links.as_slice() {
                [LinkNode::Href(href), _, ..] => non_blank(href),
                _ => None,
            },
            LinkStrategy::Guid => item
                .guid
                .as_ref()
                .filter(|guid| guid.is_permalink)
                .and_then(|guid| non_blank(&guid.value)),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn resolve_link(item: &RawItem) -> String {
    LinkStrategy::ORDER
        .iter()
        .find_map(|strategy| strategy.extract(item))
        .unwrap_or_else(|| MISSING_LINK.to_string())
}

pub fn resolve_title(item: &RawItem) -> String {
    item.title
        .as_deref()
        .and_then(non_blank)
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Publication time from `pubDate`, `updated` or `published`, whichever is
/// present first. Missing or unparseable dates become `fallback`.
pub fn resolve_pub_date(item: &RawItem, fallback: DateTime<Utc>) -> DateTime<Utc> {
    let raw = [&item.pub_date, &item.updated, &item.published]
        .into_iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty());

    let parsed = match raw {
        Some(raw) => {
            let parsed = parse_date(raw);
            if parsed.is_none() {
                debug!("Unparseable date '{}', using fetch time", raw);
            }
            parsed
        }
        None => None,
    };

    parsed.unwrap_or(fallback).trunc_subsecs(3)
}

/// Parse a feed date. Years outside `0..=9999` have no `YYYY-MM-DD` form
/// and are rejected.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    parse_any_date(raw.trim()).filter(|date| (0..=9999).contains(&date.year()))
}

fn parse_any_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(raw, format) {
            return Some(date.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(date.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

pub fn normalize_item(item: &RawItem, source: &str, fetched_at: DateTime<Utc>) -> NewsItem {
    NewsItem {
        title: resolve_title(item),
        link: resolve_link(item),
        pub_date: resolve_pub_date(item, fetched_at),
        source: source.to_string(),
    }
}

pub fn normalize_feed(document: &FeedDocument, fetched_at: DateTime<Utc>) -> Vec<NewsItem> {
    document
        .items
        .iter()
        .map(|item| normalize_item(item, &document.source_name, fetched_at))
        .collect()
}
