use super::{describe, finding_at};
use crate::classify::{classify_text, has_aria_name, has_interactive_role, SemanticRole};
use crate::element::{AttributeValue, Child, Element, ElementId, Tag};
use crate::finding::{Finding, Severity, SuggestedFix};
use crate::rule::{Rule, RuleCategory, RuleContext, RuleError};

pub const CLICKABLE_NON_INTERACTIVE: &str = "clickable-non-interactive";
pub const ICON_ONLY_CONTROL_UNLABELED: &str = "icon-only-control-unlabeled";

const KEYBOARD_HANDLERS: &[&str] = &["onKeyDown", "onKeyPress"];

/// Tags whose content provides their name
const CONTENT_NAMED: &[&str] = &["button", "a", "summary"];

/// Graphic-only content
const GRAPHIC_TAGS: &[&str] = &["svg", "img", "i"];

pub fn clickable_non_interactive() -> Rule {
    Rule::new(
        CLICKABLE_NON_INTERACTIVE,
        RuleCategory::SemanticHtml,
        evaluate_clickable_non_interactive,
    )
    .with_name("Clickable non-interactive element")
    .with_severity(Severity::Warning)
    .with_description(
        "Elements with onClick must be native controls or carry an interactive role and a keyboard handler",
    )
    .with_tag("wcag-2.1.1")
    .with_tag("wcag-4.1.2")
    .with_rationale("A clicked <div> is invisible to keyboards, screen readers and automation agents")
    .with_example_bad(r#"<div onClick={reorder}>Reorder</div>"#)
    .with_example_good(r#"<button onClick={reorder}>Reorder</button>"#)
}

pub fn icon_only_control_unlabeled() -> Rule {
    Rule::new(
        ICON_ONLY_CONTROL_UNLABELED,
        RuleCategory::Aria,
        evaluate_icon_only_control_unlabeled,
    )
    .with_name("Icon-only control without a name")
    .with_severity(Severity::Error)
    .with_description("Controls whose only content is an icon need aria-label or aria-labelledby")
    .with_tag("wcag-4.1.2")
    .with_rationale("A control announced as \"button\" with no name cannot be told apart from its neighbours")
    .with_example_bad(r#"<button onClick={close}>×</button>"#)
    .with_example_good(r#"<button onClick={close} aria-label="Close">×</button>"#)
}

/// onClick on a native element that is neither a native control nor given an
/// interactive role plus keyboard support
pub(crate) fn is_clickable_non_interactive(ctx: &RuleContext<'_>, element: &Element) -> bool {
    if !element.has_handler("onClick") || !matches!(element.tag, Tag::Native(_)) {
        return false;
    }
    if ctx.roles.role(element.id).is_interactive() {
        return false;
    }
    if element.has_spread {
        return false;
    }
    let has_keyboard = KEYBOARD_HANDLERS.iter().any(|h| element.has_handler(h));
    !(has_interactive_role(element) || has_keyboard)
}

fn evaluate_clickable_non_interactive(
    ctx: &RuleContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for element in ctx.tree.iter() {
        if !is_clickable_non_interactive(ctx, element) {
            continue;
        }

        let navigates = element
            .handler("onClick")
            .map(|h| {
                let mut effects = h.body.effects().peekable();
                effects.peek().is_some()
                    && effects.all(|e| ctx.config.navigation_pattern.is_match(e))
            })
            .unwrap_or(false);
        let (replacement, hint) = if navigates {
            ("a", "Use <a href> for navigation")
        } else {
            ("button", "Use <button> so the action is focusable and keyboard operable")
        };

        let message = format!(
            "{} has an onClick handler but no interactive role or keyboard handler",
            describe(element)
        );
        findings.push(
            finding_at(
                CLICKABLE_NON_INTERACTIVE,
                Severity::Warning,
                element,
                &message,
            )
            .with_fix(SuggestedFix::replace_with(hint, replacement)),
        );
    }

    Ok(findings)
}

fn evaluate_icon_only_control_unlabeled(
    ctx: &RuleContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for element in ctx.tree.iter() {
        let candidate = match element.native_tag() {
            Some(tag) if CONTENT_NAMED.contains(&tag) => {
                ctx.roles.role(element.id) == SemanticRole::Interactive
                    || is_clickable_non_interactive(ctx, element)
            }
            _ => is_clickable_non_interactive(ctx, element),
        };
        if !candidate || element.has_spread || has_aria_name(element) {
            continue;
        }
        if element
            .static_attr("title")
            .is_some_and(|t| !t.trim().is_empty())
        {
            continue;
        }
        if !is_icon_only(ctx, element.id) || has_text_sibling(ctx, element) {
            continue;
        }

        let message = format!(
            "{} contains only an icon and has no accessible name",
            describe(element)
        );
        findings.push(
            finding_at(ICON_ONLY_CONTROL_UNLABELED, Severity::Error, element, &message).with_fix(
                SuggestedFix::add_attribute("Name the control with aria-label", "aria-label"),
            ),
        );
    }

    Ok(findings)
}

/// Content is glyph text and/or graphics with no alternative text
fn is_icon_only(ctx: &RuleContext<'_>, id: ElementId) -> bool {
    let tree = ctx.tree;
    let Some(text) = tree.text_content(id) else {
        return false;
    };
    let text = text.trim();

    let mut has_graphic = false;
    for descendant in tree.descendants(id) {
        let d = tree.get(descendant);
        if has_aria_name(d) {
            return false;
        }
        match &d.tag {
            Tag::Native(name) if name == "img" => match d.attr("alt") {
                AttributeValue::StaticString(alt) if !alt.trim().is_empty() => return false,
                AttributeValue::DynamicExpression => return false,
                _ => has_graphic = true,
            },
            Tag::Native(name) if GRAPHIC_TAGS.contains(&name.as_str()) => has_graphic = true,
            Tag::Component(name) if name.contains("Icon") => has_graphic = true,
            _ => {}
        }
    }

    if text.is_empty() {
        has_graphic
    } else {
        ctx.config.icon_glyph_pattern.is_match(text)
    }
}

/// A visible text label next to the control
fn has_text_sibling(ctx: &RuleContext<'_>, element: &Element) -> bool {
    let tree = ctx.tree;
    let Some(parent) = element.parent else {
        return false;
    };
    tree.children(parent).iter().any(|child| match child {
        Child::Text(text) => classify_text(text) == SemanticRole::Text,
        Child::Element(sibling) if *sibling != element.id => {
            let s = tree.get(*sibling);
            !ctx.roles.role(s.id).is_interactive()
                && s.event_handlers.is_empty()
                && tree
                    .text_content(s.id)
                    .is_some_and(|t| t.chars().any(char::is_alphanumeric))
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{el, run, text};
    use crate::syntax::Expr;

    fn click() -> Expr {
        Expr::ident("handleClick")
    }

    #[test]
    fn test_clickable_div() {
        let findings = run(
            &clickable_non_interactive(),
            el("div", 2)
                .attr_expr("onClick", click())
                .child(text("Reorder", 2)),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(
            findings[0]
                .suggested_fix
                .as_ref()
                .and_then(|f| f.replace_with.as_deref()),
            Some("button")
        );
    }

    #[test]
    fn test_button_is_not_flagged() {
        let findings = run(
            &clickable_non_interactive(),
            el("button", 2)
                .attr_expr("onClick", click())
                .child(text("Reorder", 2)),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_role_or_keyboard_handler_alone_is_enough() {
        let rule = clickable_non_interactive();
        assert!(run(
            &rule,
            el("div", 1).attr_expr("onClick", click()).attr("role", "button")
        )
        .is_empty());
        assert!(run(
            &rule,
            el("div", 1)
                .attr_expr("onClick", click())
                .attr_expr("onKeyDown", Expr::ident("handleKey"))
        )
        .is_empty());
    }

    #[test]
    fn test_components_are_skipped() {
        let findings = run(
            &clickable_non_interactive(),
            el("Card", 1).attr_expr("onClick", click()),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_navigation_handler_suggests_link() {
        let findings = run(
            &clickable_non_interactive(),
            el("span", 1).attr_expr(
                "onClick",
                Expr::arrow(
                    &[],
                    Expr::call(Expr::ident("navigate"), vec![Expr::string("/orders")]),
                ),
            ),
        );
        assert_eq!(
            findings[0]
                .suggested_fix
                .as_ref()
                .and_then(|f| f.replace_with.as_deref()),
            Some("a")
        );
    }

    #[test]
    fn test_conditional_marker_is_carried() {
        let findings = run(
            &clickable_non_interactive(),
            el("section", 1).child(crate::syntax::SyntaxNode::expression(
                Expr::and(
                    Expr::ident("editing"),
                    Expr::jsx(el("div", 2).attr_expr("onClick", click())),
                ),
                crate::syntax::Span::new(2, 1),
            )),
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].conditional);
    }

    #[test]
    fn test_icon_button_without_label() {
        let findings = run(
            &icon_only_control_unlabeled(),
            el("button", 4)
                .attr_expr("onClick", click())
                .child(text("×", 4)),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_icon_button_with_label() {
        let rule = icon_only_control_unlabeled();
        assert!(run(
            &rule,
            el("button", 1)
                .attr("aria-label", "Close")
                .child(text("×", 1))
        )
        .is_empty());
        assert!(run(
            &rule,
            el("button", 1)
                .attr("aria-labelledby", "close-label")
                .child(el("svg", 1))
        )
        .is_empty());
    }

    #[test]
    fn test_svg_only_button() {
        let findings = run(
            &icon_only_control_unlabeled(),
            el("button", 1).child(el("svg", 1).child(el("path", 1))),
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_image_with_alt_names_the_control() {
        let findings = run(
            &icon_only_control_unlabeled(),
            el("button", 1).child(el("img", 1).attr("alt", "Settings")),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_text_button_is_named() {
        let findings = run(
            &icon_only_control_unlabeled(),
            el("button", 1).child(text("Save", 1)),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_clickable_div_icon_gets_both_findings() {
        let root = el("div", 1).attr_expr("onClick", click()).child(text("☰", 1));
        assert_eq!(run(&icon_only_control_unlabeled(), root.clone()).len(), 1);
        assert_eq!(run(&clickable_non_interactive(), root).len(), 1);
    }

    #[test]
    fn test_visible_text_sibling() {
        let findings = run(
            &icon_only_control_unlabeled(),
            el("div", 1)
                .child(el("span", 1).child(text("Delete order", 1)))
                .child(el("button", 1).child(text("🗑", 1))),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_sibling_button_is_not_a_label() {
        let findings = run(
            &icon_only_control_unlabeled(),
            el("div", 1)
                .child(el("button", 1).child(text("Save", 1)))
                .child(el("button", 2).child(text("×", 2))),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 2);
    }
}
