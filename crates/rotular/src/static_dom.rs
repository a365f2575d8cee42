//! Static parse of the page source.
//!
//! The live element list and this static parse are two
//! independently-derived views of the same DOM. The static side
//! contributes the markup and surrounding context the judgment
//! collaborator sees; the live side contributes locators and rendered
//! text. The correlation engine pairs the two.

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};

use crate::descriptor::ElementTag;

/// Surrounding context of a statically-parsed element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeContext {
    /// Parent element tag name
    pub parent_tag: Option<String>,
    /// Parent element classes
    pub parent_classes: Vec<String>,
    /// Nearest preceding sibling text, trimmed
    pub preceding_text: Option<String>,
    /// Nearest following sibling text, trimmed
    pub following_text: Option<String>,
}

/// One heading or label found in the static parse tree.
///
/// Paired 1:1 (best-effort) with a live descriptor by the correlation
/// index; the pairing is a lookup key resolved by matching, never a
/// structural reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticElementNode {
    /// Element kind
    pub tag: ElementTag,
    /// Concatenated text content, trimmed
    pub text: String,
    /// Outer HTML of the element
    pub markup: String,
    /// Surrounding context
    pub context: NodeContext,
    /// `for` attribute (labels)
    pub control_id: Option<String>,
    /// Tag of the form control the `for` attribute resolves to
    pub control_tag: Option<String>,
}

/// Extract every heading (h1-h6) and label from page source.
///
/// Nodes are returned grouped by tag in [`ElementTag::ALL`] order, each
/// group in document order, matching the live snapshot's scan order.
#[must_use]
pub fn parse_elements(html: &str) -> Vec<StaticElementNode> {
    let document = Html::parse_document(html);
    let mut nodes = Vec::new();

    for tag in ElementTag::ALL {
        let selector = Selector::parse(tag.as_str()).expect("valid selector");
        for element in document.select(&selector) {
            nodes.push(build_node(&document, tag, element));
        }
    }

    nodes
}

fn build_node(document: &Html, tag: ElementTag, element: ElementRef<'_>) -> StaticElementNode {
    let text: String = element.text().collect::<String>().trim().to_string();
    let control_id = element
        .value()
        .attr("for")
        .map(String::from)
        .filter(|id| !id.is_empty());
    let control_tag = control_id
        .as_deref()
        .and_then(|id| find_by_id(document, id))
        .map(|control| control.value().name().to_string());

    StaticElementNode {
        tag,
        text,
        markup: element.html(),
        context: element_context(element),
        control_id,
        control_tag,
    }
}

/// Same-document id lookup in the static tree.
fn find_by_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse("[id]").expect("valid selector");
    document
        .select(&selector)
        .find(|el| el.value().attr("id") == Some(id))
}

fn element_context(element: ElementRef<'_>) -> NodeContext {
    let parent = element.parent().and_then(ElementRef::wrap);
    NodeContext {
        parent_tag: parent.map(|p| p.value().name().to_string()),
        parent_classes: parent
            .map(|p| p.value().classes().map(String::from).collect())
            .unwrap_or_default(),
        preceding_text: sibling_text(element.prev_siblings()),
        following_text: sibling_text(element.next_siblings()),
    }
}

/// Nearest non-empty sibling text node in the given direction.
fn sibling_text<'a>(siblings: impl Iterator<Item = NodeRef<'a, Node>>) -> Option<String> {
    for node in siblings {
        if let Some(text) = node.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <main>
                Intro text
                <h1 id="main">Welcome</h1>
                trailing note
            </main>
            <section class="signup promo">
                <h2>Create an <em>account</em></h2>
                <form>
                    <label for="email">Email address</label>
                    <input id="email" type="email">
                    <label>Bare label</label>
                </form>
            </section>
        </body></html>
    "#;

    #[test]
    fn test_finds_headings_and_labels() {
        let nodes = parse_elements(PAGE);
        let tags: Vec<ElementTag> = nodes.iter().map(|n| n.tag).collect();
        assert_eq!(
            tags,
            vec![
                ElementTag::H1,
                ElementTag::H2,
                ElementTag::Label,
                ElementTag::Label,
            ]
        );
    }

    #[test]
    fn test_inline_markup_text_is_flattened() {
        let nodes = parse_elements(PAGE);
        let h2 = &nodes[1];
        assert_eq!(h2.text, "Create an account");
        assert!(h2.markup.contains("<em>"));
    }

    #[test]
    fn test_label_control_resolution() {
        let nodes = parse_elements(PAGE);
        let email = &nodes[2];
        assert_eq!(email.control_id.as_deref(), Some("email"));
        assert_eq!(email.control_tag.as_deref(), Some("input"));

        let bare = &nodes[3];
        assert_eq!(bare.control_id, None);
        assert_eq!(bare.control_tag, None);
    }

    #[test]
    fn test_dangling_for_reference() {
        let nodes = parse_elements(r#"<label for="ghost">Name</label>"#);
        assert_eq!(nodes[0].control_id.as_deref(), Some("ghost"));
        assert_eq!(nodes[0].control_tag, None);
    }

    #[test]
    fn test_context_extraction() {
        let nodes = parse_elements(PAGE);
        let h1 = &nodes[0];
        assert_eq!(h1.context.parent_tag.as_deref(), Some("main"));
        assert_eq!(h1.context.preceding_text.as_deref(), Some("Intro text"));
        assert_eq!(h1.context.following_text.as_deref(), Some("trailing note"));

        let h2 = &nodes[1];
        assert_eq!(h2.context.parent_tag.as_deref(), Some("section"));
        assert_eq!(h2.context.parent_classes.len(), 2);
        assert!(h2.context.parent_classes.contains(&"signup".to_string()));
        assert!(h2.context.parent_classes.contains(&"promo".to_string()));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_elements("<html><body><p>no targets</p></body></html>").is_empty());
    }
}
