//! Element descriptors: the canonical extracted representation of one
//! live element's identity and accessible text.
//!
//! The browser layer performs every DOM read in page context and ships
//! the raw values back as a [`RawElementRead`]. Turning a read into an
//! [`ElementDescriptor`] is pure: normalization plus a priority chain
//! of text fallbacks (visible text, `alt`, `aria-label`,
//! `aria-labelledby` target, label `for` target's placeholder,
//! descendant image `alt`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::locator::Locator;
use crate::normalize::normalize;
use crate::result::SkipReason;

/// Element kinds the audit covers: the six heading levels plus form
/// labels (WCAG 2.4.6 scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementTag {
    /// `<h1>`
    H1,
    /// `<h2>`
    H2,
    /// `<h3>`
    H3,
    /// `<h4>`
    H4,
    /// `<h5>`
    H5,
    /// `<h6>`
    H6,
    /// `<label>`
    Label,
}

impl ElementTag {
    /// All audited tags, heading levels first, in document-order
    /// scanning order.
    pub const ALL: [Self; 7] = [
        Self::H1,
        Self::H2,
        Self::H3,
        Self::H4,
        Self::H5,
        Self::H6,
        Self::Label,
    ];

    /// Parse a lower-case tag name
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            "h4" => Some(Self::H4),
            "h5" => Some(Self::H5),
            "h6" => Some(Self::H6),
            "label" => Some(Self::Label),
            _ => None,
        }
    }

    /// Lower-case tag name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::Label => "label",
        }
    }

    /// Whether this is a heading level
    #[must_use]
    pub const fn is_heading(self) -> bool {
        !matches!(self, Self::Label)
    }
}

impl fmt::Display for ElementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How deep the alternate-text fallback chain goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackDepth {
    /// Rendered text, `alt`, and `aria-label` only
    Minimal,
    /// The full chain, including `aria-labelledby` targets, label `for`
    /// placeholders, and descendant image `alt`
    #[default]
    Full,
}

/// Raw per-element reads collected in page context.
///
/// Field names follow the JavaScript snapshot routine, which emits one
/// of these records per audited element. A record with `error` set
/// means every attribute read failed for that element (stale node on a
/// reloading page); it degrades to a skip, never an abort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawElementRead {
    /// Lower-case tag name
    pub tag: String,
    /// `id` attribute, if non-empty
    pub id: Option<String>,
    /// Rendered text of a visible element (empty when hidden via CSS)
    pub visible_text: Option<String>,
    /// `innerText` property
    pub inner_text: Option<String>,
    /// `textContent` property
    pub text_content: Option<String>,
    /// `alt` attribute
    pub alt: Option<String>,
    /// `aria-label` attribute
    pub aria_label: Option<String>,
    /// `aria-labelledby` attribute (the referenced id, not its text)
    pub aria_labelledby: Option<String>,
    /// Text of the element `aria-labelledby` points at, when the id
    /// resolved in-document
    pub labelledby_text: Option<String>,
    /// `for` attribute (labels)
    pub for_attr: Option<String>,
    /// `placeholder` of the element `for` points at, when resolved
    pub for_placeholder: Option<String>,
    /// `alt` of the first descendant `<img>`, if any
    pub img_alt: Option<String>,
    /// Locator computed in page context; `None` for a detached element
    pub locator: Option<Locator>,
    /// Set when the per-element read loop itself failed
    pub error: Option<String>,
}

/// Which fallback step produced the descriptor's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextSource {
    /// Longest of the three rendered-text reads
    Rendered,
    /// `alt` attribute
    Alt,
    /// `aria-label` attribute
    AriaLabel,
    /// Text of the `aria-labelledby` target
    AriaLabelledby,
    /// `placeholder` of the label's `for` target
    ForPlaceholder,
    /// `alt` of the first descendant image
    DescendantImageAlt,
    /// Every step yielded empty text
    Empty,
}

/// The canonical extracted representation of one live element.
///
/// Created once per element during a page snapshot, immutable after
/// creation, owned by the correlation index that built it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Element kind
    pub tag: ElementTag,
    /// `id` attribute, if present
    pub id: Option<String>,
    /// Best-available accessible text, normalized; empty when every
    /// fallback step yielded nothing
    pub normalized_text: String,
    /// Which step produced `normalized_text`
    pub source: TextSource,
    /// Raw `alt` attribute as read
    pub raw_alt: Option<String>,
    /// Raw `aria-label` attribute as read
    pub raw_aria_label: Option<String>,
    /// Raw `aria-labelledby` attribute as read
    pub raw_aria_labelledby: Option<String>,
    /// Raw `for` attribute as read (labels)
    pub raw_for_target: Option<String>,
    /// Stable position locator
    pub locator: Locator,
}

impl ElementDescriptor {
    /// Report annotation naming the fallback that supplied (or, for an
    /// empty descriptor, was at least present for) this element's text.
    #[must_use]
    pub fn annotation(&self) -> Option<String> {
        match self.source {
            TextSource::Rendered => None,
            TextSource::Alt => Some("[from alt]".to_string()),
            TextSource::AriaLabel => Some("[from aria-label]".to_string()),
            TextSource::AriaLabelledby => self
                .raw_aria_labelledby
                .as_ref()
                .map(|id| format!("[aria-labelledby: {id}]")),
            TextSource::ForPlaceholder => self
                .raw_for_target
                .as_ref()
                .map(|id| format!("[for: {id}]")),
            TextSource::DescendantImageAlt => Some("[from descendant img alt]".to_string()),
            TextSource::Empty => self.present_fallback().map(|name| format!("[{name}]")),
        }
    }

    /// Which fallback attribute exists on an element whose chain still
    /// came up empty.
    fn present_fallback(&self) -> Option<&'static str> {
        if self.raw_alt.as_deref().is_some_and(|s| !s.is_empty()) {
            Some("alt present")
        } else if self
            .raw_aria_label
            .as_deref()
            .is_some_and(|s| !s.is_empty())
        {
            Some("aria-label present")
        } else if self
            .raw_aria_labelledby
            .as_deref()
            .is_some_and(|s| !s.is_empty())
        {
            Some("aria-labelledby present")
        } else if self
            .raw_for_target
            .as_deref()
            .is_some_and(|s| !s.is_empty())
        {
            Some("for present")
        } else {
            None
        }
    }
}

fn normalized_nonempty(value: Option<&str>) -> Option<String> {
    let text = normalize(value?);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Build a descriptor from one raw read.
///
/// Fails only when the read itself failed wholesale
/// ([`SkipReason::ExtractionFailed`]) or the element had no path to the
/// document body ([`SkipReason::LocatorUnreachable`]); callers skip the
/// element and continue the scan.
pub fn extract(read: &RawElementRead, depth: FallbackDepth) -> Result<ElementDescriptor, SkipReason> {
    if let Some(message) = &read.error {
        return Err(SkipReason::ExtractionFailed {
            message: message.clone(),
        });
    }
    let tag = ElementTag::parse(&read.tag).ok_or_else(|| SkipReason::ExtractionFailed {
        message: format!("unexpected tag {:?}", read.tag),
    })?;
    let locator = read
        .locator
        .clone()
        .ok_or(SkipReason::LocatorUnreachable)?;

    let (text, source) = resolve_text(read, tag, depth);

    Ok(ElementDescriptor {
        tag,
        id: read.id.clone().filter(|id| !id.is_empty()),
        normalized_text: text,
        source,
        raw_alt: read.alt.clone(),
        raw_aria_label: read.aria_label.clone(),
        raw_aria_labelledby: read.aria_labelledby.clone(),
        raw_for_target: read.for_attr.clone(),
        locator,
    })
}

/// Priority chain: first non-empty (after normalization) wins; each
/// step is attempted only when the prior steps yielded empty.
fn resolve_text(
    read: &RawElementRead,
    tag: ElementTag,
    depth: FallbackDepth,
) -> (String, TextSource) {
    // Taking the longest of the three reads defends against any one of
    // them returning empty for a CSS-hidden element while the others
    // still expose text.
    let rendered = [
        read.visible_text.as_deref(),
        read.inner_text.as_deref(),
        read.text_content.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(normalize)
    .max_by_key(String::len)
    .unwrap_or_default();
    if !rendered.is_empty() {
        return (rendered, TextSource::Rendered);
    }

    if let Some(text) = normalized_nonempty(read.alt.as_deref()) {
        return (text, TextSource::Alt);
    }
    if let Some(text) = normalized_nonempty(read.aria_label.as_deref()) {
        return (text, TextSource::AriaLabel);
    }

    if depth == FallbackDepth::Full {
        if let Some(text) = normalized_nonempty(read.labelledby_text.as_deref()) {
            return (text, TextSource::AriaLabelledby);
        }
        if tag == ElementTag::Label {
            if let Some(text) = normalized_nonempty(read.for_placeholder.as_deref()) {
                return (text, TextSource::ForPlaceholder);
            }
        }
        if let Some(text) = normalized_nonempty(read.img_alt.as_deref()) {
            return (text, TextSource::DescendantImageAlt);
        }
    }

    (String::new(), TextSource::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::PathSegment;

    fn read_with(tag: &str) -> RawElementRead {
        RawElementRead {
            tag: tag.to_string(),
            locator: Some(Locator::Path(vec![PathSegment::new(tag)])),
            ..RawElementRead::default()
        }
    }

    mod tag_tests {
        use super::*;

        #[test]
        fn test_parse_known_tags() {
            assert_eq!(ElementTag::parse("h1"), Some(ElementTag::H1));
            assert_eq!(ElementTag::parse("h6"), Some(ElementTag::H6));
            assert_eq!(ElementTag::parse("label"), Some(ElementTag::Label));
            assert_eq!(ElementTag::parse("div"), None);
        }

        #[test]
        fn test_heading_classification() {
            assert!(ElementTag::H3.is_heading());
            assert!(!ElementTag::Label.is_heading());
        }
    }

    mod priority_tests {
        use super::*;

        #[test]
        fn test_longest_rendered_read_wins() {
            let mut read = read_with("h1");
            read.visible_text = Some("Short".to_string());
            read.inner_text = Some("A longer render".to_string());
            read.text_content = Some("mid text".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.normalized_text, "A longer render");
            assert_eq!(desc.source, TextSource::Rendered);
        }

        #[test]
        fn test_hidden_element_still_yields_text() {
            // Visible read empty, textContent still exposes the text
            let mut read = read_with("h2");
            read.visible_text = Some(String::new());
            read.text_content = Some("Hidden section title".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.normalized_text, "Hidden section title");
        }

        #[test]
        fn test_alt_before_aria_label() {
            let mut read = read_with("h1");
            read.alt = Some("Alt text".to_string());
            read.aria_label = Some("Aria text".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.normalized_text, "Alt text");
            assert_eq!(desc.source, TextSource::Alt);
        }

        #[test]
        fn test_aria_label_fallback() {
            // Scenario B: empty label text resolves via aria-label
            let mut read = read_with("label");
            read.visible_text = Some(String::new());
            read.aria_label = Some("Email address".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.normalized_text, "Email address");
            assert_eq!(desc.source, TextSource::AriaLabel);
        }

        #[test]
        fn test_labelledby_target_text() {
            let mut read = read_with("h2");
            read.aria_labelledby = Some("section-title".to_string());
            read.labelledby_text = Some("Billing details".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.normalized_text, "Billing details");
            assert_eq!(desc.source, TextSource::AriaLabelledby);
        }

        #[test]
        fn test_unresolvable_labelledby_continues_chain() {
            let mut read = read_with("h2");
            read.aria_labelledby = Some("gone".to_string());
            read.labelledby_text = None;
            read.img_alt = Some("Diagram of checkout flow".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.source, TextSource::DescendantImageAlt);
        }

        #[test]
        fn test_for_placeholder_labels_only() {
            let mut label = read_with("label");
            label.for_attr = Some("email".to_string());
            label.for_placeholder = Some("you@example.com".to_string());
            let desc = extract(&label, FallbackDepth::Full).unwrap();
            assert_eq!(desc.source, TextSource::ForPlaceholder);

            let mut heading = read_with("h3");
            heading.for_attr = Some("email".to_string());
            heading.for_placeholder = Some("you@example.com".to_string());
            let desc = extract(&heading, FallbackDepth::Full).unwrap();
            assert_eq!(desc.source, TextSource::Empty);
        }

        #[test]
        fn test_minimal_depth_stops_after_aria_label() {
            let mut read = read_with("label");
            read.labelledby_text = Some("Deep fallback".to_string());
            let desc = extract(&read, FallbackDepth::Minimal).unwrap();
            assert_eq!(desc.source, TextSource::Empty);
            assert_eq!(desc.normalized_text, "");
        }

        #[test]
        fn test_whitespace_only_counts_as_empty() {
            let mut read = read_with("h1");
            read.visible_text = Some("   \n\t ".to_string());
            read.alt = Some("Actual".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.source, TextSource::Alt);
        }
    }

    mod skip_tests {
        use super::*;

        #[test]
        fn test_read_error_becomes_extraction_skip() {
            let mut read = read_with("h1");
            read.error = Some("stale element reference".to_string());
            let err = extract(&read, FallbackDepth::Full).unwrap_err();
            assert!(matches!(err, SkipReason::ExtractionFailed { .. }));
        }

        #[test]
        fn test_missing_locator_becomes_unreachable_skip() {
            let mut read = read_with("h1");
            read.locator = None;
            let err = extract(&read, FallbackDepth::Full).unwrap_err();
            assert_eq!(err, SkipReason::LocatorUnreachable);
        }

        #[test]
        fn test_unexpected_tag_is_skipped() {
            let read = read_with("marquee");
            assert!(extract(&read, FallbackDepth::Full).is_err());
        }
    }

    mod annotation_tests {
        use super::*;

        #[test]
        fn test_rendered_text_has_no_annotation() {
            let mut read = read_with("h1");
            read.visible_text = Some("Welcome".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.annotation(), None);
        }

        #[test]
        fn test_aria_label_annotation() {
            let mut read = read_with("label");
            read.aria_label = Some("Email address".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.annotation().unwrap(), "[from aria-label]");
        }

        #[test]
        fn test_empty_descriptor_records_present_fallback() {
            // aria-labelledby present but unresolvable: text stays
            // empty, the annotation says the attribute exists.
            let mut read = read_with("h2");
            read.aria_labelledby = Some("missing-id".to_string());
            let desc = extract(&read, FallbackDepth::Full).unwrap();
            assert_eq!(desc.normalized_text, "");
            assert_eq!(desc.annotation().unwrap(), "[aria-labelledby present]");
        }
    }

    #[test]
    fn test_raw_read_deserializes_from_page_json() {
        let json = r#"{
            "tag": "label",
            "id": "newsletter",
            "visibleText": "Subscribe",
            "ariaLabel": null,
            "forAttr": "newsletter-input",
            "locator": {"byId": "newsletter"}
        }"#;
        let read: RawElementRead = serde_json::from_str(json).unwrap();
        assert_eq!(read.tag, "label");
        assert_eq!(read.for_attr.as_deref(), Some("newsletter-input"));
        assert!(matches!(read.locator, Some(Locator::ById(_))));
    }
}
