//! Element correlation: pairing statically-parsed nodes with live
//! descriptors.
//!
//! The static parse and the live DOM are two different renderings of
//! the same page; they are not guaranteed to agree on whitespace,
//! hidden-element inclusion, or element ordering. Correlation is
//! therefore a deliberately best-effort layered match, not an exact
//! join: correctness degrades gracefully to "probably right" rather
//! than failing outright.

use tracing::{debug, warn};

use crate::descriptor::ElementDescriptor;
use crate::locator::Locator;
use crate::normalize::{normalize, normalize_compact};
use crate::static_dom::StaticElementNode;

/// Which matching tier produced a pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Same tag, compact-normalized text equality
    Exact,
    /// Same tag, one normalized text contains the other
    Containment,
    /// First live descriptor of the same tag, in encounter order.
    /// Can silently mis-pair when a page has multiple same-tag
    /// elements and both richer tiers miss; preserved as documented
    /// behavior.
    Positional,
    /// No live descriptor of the tag exists at all
    Unresolved,
}

/// Result of correlating one static node.
#[derive(Debug, Clone)]
pub struct Correlation<'a> {
    /// The paired live descriptor, when one exists
    pub descriptor: Option<&'a ElementDescriptor>,
    /// Locator attached to the static node (sentinel when unresolved)
    pub locator: Locator,
    /// Tier that produced the pairing
    pub tier: MatchTier,
}

/// Read-only mapping from live descriptors to locators, built once per
/// page snapshot before any judgment calls begin.
///
/// Iteration order is insertion order, which is the browser query
/// order, not guaranteed to equal document order; ties between
/// equally-good matches are broken by that order, deterministically.
#[derive(Debug, Default)]
pub struct CorrelationIndex {
    descriptors: Vec<ElementDescriptor>,
}

impl CorrelationIndex {
    /// Build the index from the live descriptors in encounter order
    #[must_use]
    pub fn new(descriptors: Vec<ElementDescriptor>) -> Self {
        Self { descriptors }
    }

    /// The live descriptors, in insertion order
    #[must_use]
    pub fn descriptors(&self) -> &[ElementDescriptor] {
        &self.descriptors
    }

    /// Number of indexed live elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the index holds no live elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Pair one static node with the live descriptor it most likely
    /// represents. Tried in order, first hit wins, independently per
    /// node.
    #[must_use]
    pub fn correlate(&self, node: &StaticElementNode) -> Correlation<'_> {
        let node_compact = normalize_compact(&node.text);
        let node_normal = normalize(&node.text);

        // Tier 1: exact, with internal spaces stripped (inline markup
        // introduces inconsistent intra-text spacing)
        if let Some(desc) = self.descriptors.iter().find(|d| {
            d.tag == node.tag && normalize_compact(&d.normalized_text) == node_compact
        }) {
            debug!(tag = %node.tag, text = %node.text, "correlated: exact match");
            return Correlation {
                descriptor: Some(desc),
                locator: desc.locator.clone(),
                tier: MatchTier::Exact,
            };
        }

        // Tier 2: containment either way (decorative characters one
        // side strips)
        if let Some(desc) = self.descriptors.iter().find(|d| {
            d.tag == node.tag
                && (d.normalized_text.contains(&node_normal)
                    || node_normal.contains(&d.normalized_text))
        }) {
            debug!(tag = %node.tag, text = %node.text, "correlated: containment match");
            return Correlation {
                descriptor: Some(desc),
                locator: desc.locator.clone(),
                tier: MatchTier::Containment,
            };
        }

        // Tier 3: positional fallback, first same-tag descriptor in
        // encounter order
        if let Some(desc) = self.descriptors.iter().find(|d| d.tag == node.tag) {
            debug!(tag = %node.tag, text = %node.text, "correlated: positional fallback");
            return Correlation {
                descriptor: Some(desc),
                locator: desc.locator.clone(),
                tier: MatchTier::Positional,
            };
        }

        // Tier 4: no live element of this tag at all; the sentinel
        // propagates to the report rather than aborting the run
        warn!(tag = %node.tag, text = %node.text, "no live element for static node");
        Correlation {
            descriptor: None,
            locator: Locator::Unresolved,
            tier: MatchTier::Unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ElementTag, TextSource};

    fn descriptor(tag: ElementTag, text: &str, locator_id: &str) -> ElementDescriptor {
        ElementDescriptor {
            tag,
            id: Some(locator_id.to_string()),
            normalized_text: normalize(text),
            source: TextSource::Rendered,
            raw_alt: None,
            raw_aria_label: None,
            raw_aria_labelledby: None,
            raw_for_target: None,
            locator: Locator::ById(locator_id.to_string()),
        }
    }

    fn node(tag: ElementTag, text: &str) -> StaticElementNode {
        StaticElementNode {
            tag,
            text: text.to_string(),
            markup: format!("<{tag}>{text}</{tag}>"),
            context: crate::static_dom::NodeContext::default(),
            control_id: None,
            control_tag: None,
        }
    }

    #[test]
    fn test_exact_match_ignores_internal_spacing() {
        let index = CorrelationIndex::new(vec![descriptor(ElementTag::H1, "Sign up now", "cta")]);
        let result = index.correlate(&node(ElementTag::H1, "Sign  up  now"));
        assert_eq!(result.tier, MatchTier::Exact);
        assert_eq!(result.locator, Locator::ById("cta".to_string()));
    }

    #[test]
    fn test_containment_match() {
        let index =
            CorrelationIndex::new(vec![descriptor(ElementTag::H2, "Pricing ▸ details", "p")]);
        let result = index.correlate(&node(ElementTag::H2, "Pricing"));
        assert_eq!(result.tier, MatchTier::Containment);
    }

    #[test]
    fn test_tag_must_agree() {
        let index = CorrelationIndex::new(vec![descriptor(ElementTag::H2, "Welcome", "w")]);
        let result = index.correlate(&node(ElementTag::H1, "Welcome"));
        assert_eq!(result.tier, MatchTier::Unresolved);
        assert_eq!(result.locator, Locator::Unresolved);
    }

    #[test]
    fn test_positional_fallback_first_of_tag() {
        let index = CorrelationIndex::new(vec![
            descriptor(ElementTag::H3, "Alpha", "a"),
            descriptor(ElementTag::H3, "Beta", "b"),
        ]);
        let result = index.correlate(&node(ElementTag::H3, "Gamma"));
        assert_eq!(result.tier, MatchTier::Positional);
        assert_eq!(result.locator, Locator::ById("a".to_string()));
    }

    #[test]
    fn test_containment_tie_break_is_insertion_order() {
        // Neither text equals the node text, both contain it; the
        // first inserted wins.
        let index = CorrelationIndex::new(vec![
            descriptor(ElementTag::Label, "Your name here", "first"),
            descriptor(ElementTag::Label, "full name", "second"),
        ]);
        let result = index.correlate(&node(ElementTag::Label, "name"));
        assert_eq!(result.tier, MatchTier::Containment);
        assert_eq!(result.locator, Locator::ById("first".to_string()));
    }

    #[test]
    fn test_unresolved_for_empty_index() {
        let index = CorrelationIndex::new(vec![]);
        let result = index.correlate(&node(ElementTag::H1, "Anything"));
        assert_eq!(result.tier, MatchTier::Unresolved);
        assert!(result.descriptor.is_none());
    }

    #[test]
    fn test_deterministic_across_runs() {
        let build = || {
            CorrelationIndex::new(vec![
                descriptor(ElementTag::H2, "Account", "x"),
                descriptor(ElementTag::H2, "Account settings", "y"),
                descriptor(ElementTag::Label, "Email", "z"),
            ])
        };
        let nodes = [
            node(ElementTag::H2, "Account settings"),
            node(ElementTag::H2, "Account"),
            node(ElementTag::Label, "Email"),
        ];
        let first: Vec<Locator> = {
            let index = build();
            nodes.iter().map(|n| index.correlate(n).locator).collect()
        };
        for _ in 0..10 {
            let index = build();
            let again: Vec<Locator> = nodes.iter().map(|n| index.correlate(n).locator).collect();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_scenario_a_single_heading() {
        // One <h1 id="main">Welcome</h1>, no labels
        let index = CorrelationIndex::new(vec![descriptor(ElementTag::H1, "Welcome", "main")]);
        let result = index.correlate(&node(ElementTag::H1, "Welcome"));
        assert_eq!(result.tier, MatchTier::Exact);
        assert_eq!(result.locator, Locator::ById("main".to_string()));
        assert_eq!(
            result.descriptor.unwrap().normalized_text,
            "Welcome".to_string()
        );
    }
}
