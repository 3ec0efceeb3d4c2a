//! Semantic role classification
//!
//! Roles are computed from tag names and attributes alone, first match wins:
//! interactive tags, landmarks, lists, headings, images, live regions, form
//! fields inside a form, text, and finally generic.

use crate::element::{AttributeValue, Element, ElementId, ElementTree, Tag, TextContent, TextValue};
use std::fmt;

/// Kind of landmark region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandmarkKind {
    Navigation,
    Main,
    Banner,
    ContentInfo,
    Complementary,
    Region,
    Form,
}

/// Semantic role of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticRole {
    Interactive,
    Landmark(LandmarkKind),
    ListContainer,
    ListItem,
    Heading(u8),
    FormField,
    Image,
    LiveRegion,
    Text,
    Generic,
}

impl SemanticRole {
    pub fn is_interactive(self) -> bool {
        self == SemanticRole::Interactive
    }

    pub fn is_generic(self) -> bool {
        self == SemanticRole::Generic
    }

    pub fn heading_level(self) -> Option<u8> {
        match self {
            SemanticRole::Heading(level) => Some(level),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticRole::Interactive => write!(f, "interactive"),
            SemanticRole::Landmark(kind) => write!(f, "landmark({:?})", kind),
            SemanticRole::ListContainer => write!(f, "list-container"),
            SemanticRole::ListItem => write!(f, "list-item"),
            SemanticRole::Heading(level) => write!(f, "heading({})", level),
            SemanticRole::FormField => write!(f, "form-field"),
            SemanticRole::Image => write!(f, "image"),
            SemanticRole::LiveRegion => write!(f, "live-region"),
            SemanticRole::Text => write!(f, "text"),
            SemanticRole::Generic => write!(f, "generic"),
        }
    }
}

/// ARIA roles that make an element operable
pub const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "checkbox",
    "radio",
    "switch",
    "tab",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "textbox",
    "searchbox",
    "combobox",
    "slider",
    "spinbutton",
    "treeitem",
    "gridcell",
];

/// Role side table for one tree, indexed by [`ElementId`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    roles: Vec<SemanticRole>,
}

impl Classification {
    /// Classify every element of the tree
    pub fn classify(tree: &ElementTree) -> Self {
        let roles = tree.iter().map(|e| classify_element(tree, e.id)).collect();
        Self { roles }
    }

    pub fn role(&self, id: ElementId) -> SemanticRole {
        self.roles
            .get(id.0)
            .copied()
            .unwrap_or(SemanticRole::Generic)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Role of a single element
pub fn classify_element(tree: &ElementTree, id: ElementId) -> SemanticRole {
    let element = tree.get(id);
    let tag = match &element.tag {
        Tag::Native(name) => name.as_str(),
        Tag::Component(_) | Tag::Document => return live_region_or_generic(element),
    };

    match tag {
        "button" | "input" | "select" | "textarea" | "summary" => {
            return SemanticRole::Interactive
        }
        "a" if element.has_attr("href") => return SemanticRole::Interactive,
        _ => {}
    }

    let landmark = match tag {
        "nav" => Some(LandmarkKind::Navigation),
        "main" => Some(LandmarkKind::Main),
        "header" => Some(LandmarkKind::Banner),
        "footer" => Some(LandmarkKind::ContentInfo),
        "aside" => Some(LandmarkKind::Complementary),
        "section" if has_aria_name(element) => Some(LandmarkKind::Region),
        "form" => Some(LandmarkKind::Form),
        _ => None,
    };
    if let Some(kind) = landmark {
        return SemanticRole::Landmark(kind);
    }

    match tag {
        "ul" | "ol" => return SemanticRole::ListContainer,
        "li" => return SemanticRole::ListItem,
        "img" => return SemanticRole::Image,
        _ => {}
    }

    if let Some(level) = heading_level(tag) {
        return SemanticRole::Heading(level);
    }

    if is_live_region(element) {
        return SemanticRole::LiveRegion;
    }

    if tag == "label" && tree.ancestors(id).any(|a| a.tag.is("form")) {
        return SemanticRole::FormField;
    }

    SemanticRole::Generic
}

/// Role of a text child: literal text with readable characters is `Text`;
/// glyphs and interpolated values stay `Generic`
pub fn classify_text(text: &TextContent) -> SemanticRole {
    match &text.value {
        TextValue::Static(value) if value.chars().any(char::is_alphanumeric) => SemanticRole::Text,
        _ => SemanticRole::Generic,
    }
}

fn live_region_or_generic(element: &Element) -> SemanticRole {
    if is_live_region(element) {
        SemanticRole::LiveRegion
    } else {
        SemanticRole::Generic
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    let digit = tag.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) if digit.len() == 1 => Some(level),
        _ => None,
    }
}

fn is_live_region(element: &Element) -> bool {
    matches!(element.role().as_deref(), Some("status") | Some("alert") | Some("log"))
        || element.has_attr("aria-live")
}

/// Controls a `<label>` can name: `input` (except button-like and hidden
/// types), `select` and `textarea`
pub fn is_labelable_control(element: &Element) -> bool {
    match element.native_tag() {
        Some("select") | Some("textarea") => true,
        Some("input") => !matches!(
            element
                .static_attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .as_deref(),
            Some("hidden") | Some("submit") | Some("button") | Some("reset") | Some("image")
        ),
        _ => false,
    }
}

/// Element carries an explicit role from [`INTERACTIVE_ROLES`]; a dynamic
/// role is given the benefit of the doubt
pub fn has_interactive_role(element: &Element) -> bool {
    match element.attr("role") {
        AttributeValue::StaticString(role) => {
            let role = role.trim().to_ascii_lowercase();
            INTERACTIVE_ROLES.contains(&role.as_str())
        }
        AttributeValue::DynamicExpression => true,
        _ => false,
    }
}

/// Element is removed from the accessibility tree or marked decorative
pub fn is_presentational(element: &Element) -> bool {
    matches!(element.role().as_deref(), Some("presentation") | Some("none"))
        || element.attr("aria-hidden").is_static_true()
}

/// Element is named through `aria-label` or `aria-labelledby`
pub fn has_aria_name(element: &Element) -> bool {
    let named = |name: &str| match element.attr(name) {
        AttributeValue::StaticString(s) => !s.trim().is_empty(),
        AttributeValue::DynamicExpression => true,
        _ => false,
    };
    named("aria-label") || named("aria-labelledby")
}

/// Statically known accessible name: `aria-label`, `title`, or the text of
/// the subtree with `alt` text of descendant images
pub fn accessible_name(tree: &ElementTree, id: ElementId) -> Option<String> {
    let element = tree.get(id);
    for attr in ["aria-label", "title"] {
        if let Some(label) = element.static_attr(attr) {
            if !label.trim().is_empty() {
                return Some(label.trim().to_string());
            }
        }
    }

    let mut parts: Vec<String> = tree.text_content(id).into_iter().collect();
    parts.extend(
        tree.descendants(id)
            .into_iter()
            .filter_map(|d| tree.get(d).static_attr("alt"))
            .map(|alt| alt.trim().to_string()),
    );
    let name = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TreeBuilder;
    use crate::syntax::{Expr, Span, SyntaxNode, SyntaxTree};

    fn tree(root: SyntaxNode) -> ElementTree {
        TreeBuilder::build(&SyntaxTree::new("Page.jsx").with_root(root))
            .unwrap()
            .tree
    }

    fn role_of(tree: &ElementTree, tag: &str) -> SemanticRole {
        let el = tree
            .iter()
            .find(|e| e.tag.is(tag))
            .unwrap_or_else(|| panic!("no <{}> in tree", tag));
        classify_element(tree, el.id)
    }

    fn el(name: &str) -> SyntaxNode {
        SyntaxNode::element(name, Span::new(1, 1))
    }

    #[test]
    fn test_interactive_tags() {
        let t = tree(
            el("div")
                .child(el("button"))
                .child(el("a").attr("href", "/home"))
                .child(el("summary")),
        );
        assert_eq!(role_of(&t, "button"), SemanticRole::Interactive);
        assert_eq!(role_of(&t, "a"), SemanticRole::Interactive);
        assert_eq!(role_of(&t, "summary"), SemanticRole::Interactive);
        assert_eq!(role_of(&t, "div"), SemanticRole::Generic);
    }

    #[test]
    fn test_anchor_without_href_is_generic() {
        let t = tree(el("a"));
        assert_eq!(role_of(&t, "a"), SemanticRole::Generic);
    }

    #[test]
    fn test_landmarks() {
        let t = tree(
            el("main")
                .child(el("nav"))
                .child(el("header"))
                .child(el("section").attr("aria-label", "Orders"))
                .child(el("form")),
        );
        assert_eq!(
            role_of(&t, "main"),
            SemanticRole::Landmark(LandmarkKind::Main)
        );
        assert_eq!(
            role_of(&t, "nav"),
            SemanticRole::Landmark(LandmarkKind::Navigation)
        );
        assert_eq!(
            role_of(&t, "section"),
            SemanticRole::Landmark(LandmarkKind::Region)
        );
        assert_eq!(
            role_of(&t, "form"),
            SemanticRole::Landmark(LandmarkKind::Form)
        );

        let unnamed = tree(el("section"));
        assert_eq!(role_of(&unnamed, "section"), SemanticRole::Generic);
    }

    #[test]
    fn test_lists_headings_images() {
        let t = tree(
            el("div")
                .child(el("ul").child(el("li")))
                .child(el("h3"))
                .child(el("img")),
        );
        assert_eq!(role_of(&t, "ul"), SemanticRole::ListContainer);
        assert_eq!(role_of(&t, "li"), SemanticRole::ListItem);
        assert_eq!(role_of(&t, "h3"), SemanticRole::Heading(3));
        assert_eq!(role_of(&t, "img"), SemanticRole::Image);
        assert_eq!(heading_level("h7"), None);
        assert_eq!(heading_level("header"), None);
    }

    #[test]
    fn test_live_region() {
        let t = tree(
            el("div")
                .child(el("p").attr("role", "status"))
                .child(el("span").attr("aria-live", "polite")),
        );
        assert_eq!(role_of(&t, "p"), SemanticRole::LiveRegion);
        assert_eq!(role_of(&t, "span"), SemanticRole::LiveRegion);
    }

    #[test]
    fn test_label_inside_form_is_form_field() {
        let t = tree(el("form").child(el("label")).child(el("input")));
        assert_eq!(role_of(&t, "label"), SemanticRole::FormField);
        // Interactive wins by priority
        assert_eq!(role_of(&t, "input"), SemanticRole::Interactive);

        let outside = tree(el("div").child(el("label")));
        assert_eq!(role_of(&outside, "label"), SemanticRole::Generic);
    }

    #[test]
    fn test_reclassification_is_identical() {
        let t = tree(
            el("main")
                .child(el("ul").child(el("li")))
                .child(el("div").attr_expr("onClick", Expr::ident("go"))),
        );
        assert_eq!(Classification::classify(&t), Classification::classify(&t));
        assert_eq!(Classification::classify(&t).len(), t.len());
    }

    #[test]
    fn test_labelable_control() {
        let t = tree(
            el("form")
                .child(el("input").attr("type", "hidden"))
                .child(el("input").attr("type", "email"))
                .child(el("textarea")),
        );
        let labelable: Vec<bool> = t.iter().map(is_labelable_control).collect();
        assert_eq!(labelable, vec![false, false, true, true]);
    }

    #[test]
    fn test_presentational_and_roles() {
        let t = tree(
            el("div")
                .child(el("img").attr("role", "presentation"))
                .child(el("span").attr("aria-hidden", "true"))
                .child(el("p").attr("role", "Button")),
        );
        let img = t.iter().find(|e| e.tag.is("img")).unwrap();
        let span = t.iter().find(|e| e.tag.is("span")).unwrap();
        let p = t.iter().find(|e| e.tag.is("p")).unwrap();
        assert!(is_presentational(img));
        assert!(is_presentational(span));
        assert!(has_interactive_role(p));
        assert!(!has_interactive_role(img));
    }

    #[test]
    fn test_accessible_name() {
        let t = tree(
            el("button")
                .child(el("img").attr("alt", "Close"))
                .child(SyntaxNode::text("dialog", Span::new(1, 1))),
        );
        assert_eq!(
            accessible_name(&t, t.root_id()),
            Some("dialog Close".to_string())
        );

        let labelled = tree(el("button").attr("aria-label", "Menu"));
        assert_eq!(
            accessible_name(&labelled, labelled.root_id()),
            Some("Menu".to_string())
        );
    }

    #[test]
    fn test_classify_text() {
        let t = tree(
            el("button")
                .child(SyntaxNode::text("Save", Span::new(1, 1)))
                .child(SyntaxNode::text("\u{2715}", Span::new(1, 1)))
                .child(SyntaxNode::expression(Expr::ident("label"), Span::new(1, 1))),
        );
        let roles: Vec<SemanticRole> = t
            .root()
            .children
            .iter()
            .filter_map(|c| match c {
                crate::element::Child::Text(text) => Some(classify_text(text)),
                _ => None,
            })
            .collect();
        assert_eq!(
            roles,
            vec![
                SemanticRole::Text,
                SemanticRole::Generic,
                SemanticRole::Generic
            ]
        );
    }
}
