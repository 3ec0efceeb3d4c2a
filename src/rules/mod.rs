//! Built-in rule set
//!
//! Rules are registered in the order returned by [`builtin_rules`]; each one
//! is a plain function of the classified tree.

mod forms;
mod images;
mod interactive;
mod navigation;
mod structure;

pub use forms::{
    FAKE_FORM_CONTROL, FORM_FIELD_MISSING_LABEL, FORM_FIELD_MISSING_NAME, FORM_MISSING_SUBMIT,
    FORM_REQUIRED_UNMARKED, INPUT_MISSING_TYPE,
};
pub use images::IMG_MISSING_ALT;
pub use interactive::{CLICKABLE_NON_INTERACTIVE, ICON_ONLY_CONTROL_UNLABELED};
pub use navigation::{LINK_MISSING_HREF, LINK_TEXT_GENERIC, NAV_GROUP_MISSING, NAV_MISSING_LINKS};
pub use structure::{DYNAMIC_REGION_MISSING_LIVE, HEADING_HIERARCHY_SKIP, LIST_STRUCTURE_MISSING};

use crate::element::Element;
use crate::finding::{Finding, Severity};
use crate::rule::Rule;

/// Built-in rules in registration order
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        images::img_missing_alt(),
        interactive::clickable_non_interactive(),
        interactive::icon_only_control_unlabeled(),
        structure::list_structure_missing(),
        navigation::nav_group_missing(),
        structure::dynamic_region_missing_live(),
        forms::form_field_missing_label(),
        forms::fake_form_control(),
        structure::heading_hierarchy_skip(),
        navigation::link_missing_href(),
        navigation::link_text_generic(),
        forms::input_missing_type(),
        forms::form_field_missing_name(),
        forms::form_missing_submit(),
        forms::form_required_unmarked(),
        navigation::nav_missing_links(),
    ]
}

/// Ids of the built-in rules
pub fn builtin_ids() -> Vec<&'static str> {
    vec![
        IMG_MISSING_ALT,
        CLICKABLE_NON_INTERACTIVE,
        ICON_ONLY_CONTROL_UNLABELED,
        LIST_STRUCTURE_MISSING,
        NAV_GROUP_MISSING,
        DYNAMIC_REGION_MISSING_LIVE,
        FORM_FIELD_MISSING_LABEL,
        FAKE_FORM_CONTROL,
        HEADING_HIERARCHY_SKIP,
        LINK_MISSING_HREF,
        LINK_TEXT_GENERIC,
        INPUT_MISSING_TYPE,
        FORM_FIELD_MISSING_NAME,
        FORM_MISSING_SUBMIT,
        FORM_REQUIRED_UNMARKED,
        NAV_MISSING_LINKS,
    ]
}

/// Finding anchored at an element, carrying its conditional marker
fn finding_at(rule_id: &str, severity: Severity, element: &Element, message: &str) -> Finding {
    Finding::new(rule_id, severity, message, element.location.clone())
        .with_conditional(element.conditional)
}

/// `<tag>` for messages
fn describe(element: &Element) -> String {
    format!("<{}>", element.tag)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::classify::Classification;
    use crate::config::ScanConfig;
    use crate::element::TreeBuilder;
    use crate::finding::Finding;
    use crate::rule::{Rule, RuleContext};
    use crate::syntax::{Span, SyntaxNode, SyntaxTree};

    pub fn el(name: &str, line: usize) -> SyntaxNode {
        SyntaxNode::element(name, Span::new(line, 1))
    }

    pub fn text(value: &str, line: usize) -> SyntaxNode {
        SyntaxNode::text(value, Span::new(line, 1))
    }

    pub fn run_with(rule: &Rule, syntax: &SyntaxTree, config: &ScanConfig) -> Vec<Finding> {
        let tree = TreeBuilder::build(syntax).unwrap().tree;
        let roles = Classification::classify(&tree);
        let ctx = RuleContext {
            tree: &tree,
            roles: &roles,
            config,
        };
        rule.evaluate(&ctx).unwrap()
    }

    pub fn run(rule: &Rule, root: SyntaxNode) -> Vec<Finding> {
        run_with(
            rule,
            &SyntaxTree::new("Component.jsx").with_root(root),
            &ScanConfig::default(),
        )
    }
}
