//! Stable structural locators for live DOM elements.
//!
//! A [`Locator`] is a re-resolvable address for one element: either an
//! `id` shortcut (the common case, O(1) and maximally stable) or a
//! tag+sibling-index chain rooted at the document body. Locators are
//! computed inside the live page by [`BUILD_LOCATOR_JS`] and come back
//! as JSON matching the serde shape of this enum.
//!
//! A locator resolves to exactly the element it was built from at the
//! time of construction; it is not guaranteed stable across DOM
//! mutation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a root-to-element path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    /// Lower-case tag name
    pub tag: String,
    /// 1-based rank among same-tag siblings; omitted when the element
    /// is the only same-tag child under its parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl PathSegment {
    /// Create a segment without a sibling index
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            index: None,
        }
    }

    /// Create a segment with a 1-based sibling index
    #[must_use]
    pub fn indexed(tag: impl Into<String>, index: u32) -> Self {
        Self {
            tag: tag.into(),
            index: Some(index),
        }
    }
}

/// Structural address of one element within a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Locator {
    /// `id`-based shortcut
    ById(String),
    /// Path of segments from the document body down to the element
    Path(Vec<PathSegment>),
    /// Sentinel for a static node with no live counterpart at all
    Unresolved,
}

impl Locator {
    /// Whether this locator addresses a real element
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl fmt::Display for Locator {
    /// Renders the XPath-like form used in reports:
    /// `//*[@id="main"]` or `/html/body/div[2]/h1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "//*[@id=\"{id}\"]"),
            Self::Path(segments) => {
                write!(f, "/html/body")?;
                for seg in segments {
                    match seg.index {
                        Some(i) => write!(f, "/{}[{i}]", seg.tag)?,
                        None => write!(f, "/{}", seg.tag)?,
                    }
                }
                Ok(())
            }
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// JavaScript locator builder executed in page context.
///
/// Mirrors the enum's serde shape: returns `{byId: ...}` for elements
/// carrying an id, `{path: [{tag, index?}, ...]}` otherwise, and `null`
/// for an element with no path to the document body (detached node).
/// Callers must treat a `null` as a per-element skip, never a scan
/// abort.
pub const BUILD_LOCATOR_JS: &str = r"
function buildLocator(element) {
    if (element.id) return { byId: element.id };
    if (!document.body || !document.body.contains(element)) return null;
    const path = [];
    let node = element;
    while (node && node !== document.body) {
        const parent = node.parentElement;
        if (!parent) return null;
        const same = Array.from(parent.children).filter(
            (c) => c.tagName === node.tagName
        );
        const seg = { tag: node.tagName.toLowerCase() };
        if (same.length > 1) seg.index = same.indexOf(node) + 1;
        path.unshift(seg);
        node = parent;
    }
    return { path };
}
";
