//! Typed view over a fetched RSS or Atom document.
//!
//! The XML is parsed into an attribute-preserving tree with `roxmltree` and
//! immediately reduced to owned [`RawItem`]s, so the tree never outlives a
//! single fetch.

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::ParseError;

pub const DEFAULT_SOURCE_NAME: &str = "News";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    /// `rss → channel → item*`
    Rss,
    /// `feed → entry*`
    Atom,
    Unknown,
}

/// One `<link>` child of an item or entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkNode {
    /// `<link>https://…</link>`
    Text(String),
    /// `<link href="https://…"/>`
    Href(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guid {
    pub value: String,
    pub is_permalink: bool,
}

/// Fields of one `item`/`entry` as they appear in the source, trimmed but
/// otherwise uninterpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: Option<String>,
    pub links: Vec<LinkNode>,
    pub guid: Option<Guid>,
    pub pub_date: Option<String>,
    pub updated: Option<String>,
    pub published: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub shape: FeedShape,
    pub source_name: String,
    pub items: Vec<RawItem>,
}

impl FeedDocument {
    /// Parse a feed body, keeping at most `limit` items.
    ///
    /// Only malformed XML is an error. A well-formed document that is neither
    /// RSS nor Atom yields no items.
    pub fn parse(xml: &str, limit: usize) -> Result<Self, ParseError> {
        let mut options = ParsingOptions::default();
        options.allow_dtd = true;
        let doc = Document::parse_with_options(xml, options)?;

        let root = doc.root_element();
        let ns = root.tag_name().namespace();

        let (shape, container, item_tag) = if root.has_tag_name("rss") {
            match child_elements(root, "channel", ns).next() {
                Some(channel) => (FeedShape::Rss, Some(channel), "item"),
                None => (FeedShape::Unknown, None, ""),
            }
        } else if root.has_tag_name("feed") {
            (FeedShape::Atom, Some(root), "entry")
        } else {
            (FeedShape::Unknown, None, "")
        };

        let Some(container) = container else {
            return Ok(Self {
                shape,
                source_name: DEFAULT_SOURCE_NAME.to_string(),
                items: Vec::new(),
            });
        };

        let source_name = child_text(container, "title", ns)
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string());

        let items = child_elements(container, item_tag, ns)
            .take(limit)
            .map(|node| raw_item(node, ns))
            .collect();

        Ok(Self {
            shape,
            source_name,
            items,
        })
    }
}

fn raw_item(node: Node<'_, '_>, ns: Option<&str>) -> RawItem {
    let links = child_elements(node, "link", ns)
        .map(|link| match link.attribute("href") {
            Some(href) => LinkNode::Href(href.trim().to_string()),
            None => LinkNode::Text(text_content(link)),
        })
        .collect();

    let guid = child_elements(node, "guid", ns).next().map(|guid| Guid {
        value: text_content(guid),
        is_permalink: guid
            .attribute("isPermaLink")
            .map_or(true, |value| !value.trim().eq_ignore_ascii_case("false")),
    });

    RawItem {
        title: child_text(node, "title", ns),
        links,
        guid,
        pub_date: child_text(node, "pubDate", ns),
        updated: child_text(node, "updated", ns),
        published: child_text(node, "published", ns),
    }
}

/// Element children with the given local name in the document's own
/// namespace. Extension elements such as `atom:link` or `media:title` are
/// skipped.
fn child_elements<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
    ns: Option<&'a str>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| {
        child.is_element() && child.tag_name().name() == name && child.tag_name().namespace() == ns
    })
}

fn child_text(node: Node<'_, '_>, name: &'static str, ns: Option<&str>) -> Option<String> {
    child_elements(node, name, ns).next().map(text_content)
}

/// All text below `node` (CDATA included), trimmed.
fn text_content(node: Node<'_, '_>) -> String {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    text.trim().to_string()
}
