use super::{describe, finding_at};
use crate::classify::{has_aria_name, LandmarkKind, SemanticRole};
use crate::element::{AttributeValue, Child, Element, ElementId, Tag};
use crate::finding::{Finding, Severity, SuggestedFix};
use crate::rule::{Rule, RuleCategory, RuleContext, RuleError};

pub const NAV_GROUP_MISSING: &str = "nav-group-missing";
pub const LINK_MISSING_HREF: &str = "link-missing-href";
pub const LINK_TEXT_GENERIC: &str = "link-text-generic";
pub const NAV_MISSING_LINKS: &str = "nav-missing-links";

const NONFUNCTIONAL_HREFS: &[&str] = &["#", "javascript:void(0)", "javascript:void(0);", "javascript:;"];

const GENERIC_LINK_TEXT: &[&str] = &[
    "click here",
    "here",
    "learn more",
    "read more",
    "more",
    "link",
    "this",
    "go",
];

/// Calls that never decide whether a handler navigates
const NEUTRAL_CALLS: &[&str] = &["preventDefault", "stopPropagation"];

pub fn nav_group_missing() -> Rule {
    Rule::new(
        NAV_GROUP_MISSING,
        RuleCategory::LinkNavigation,
        evaluate_nav_group_missing,
    )
    .with_name("Navigation items outside a nav landmark")
    .with_severity(Severity::Warning)
    .with_description("Groups of elements that navigate on click belong in a <nav> of links")
    .with_tag("wcag-1.3.1")
    .with_tag("wcag-2.4.1")
    .with_rationale("Without a navigation landmark, agents cannot find the site's main routes")
    .with_example_bad(
        r#"<div><div onClick={() => navigate("/orders")}>Orders</div><div onClick={() => navigate("/account")}>Account</div></div>"#,
    )
    .with_example_good(r#"<nav><a href="/orders">Orders</a><a href="/account">Account</a></nav>"#)
}

pub fn link_missing_href() -> Rule {
    Rule::new(
        LINK_MISSING_HREF,
        RuleCategory::LinkNavigation,
        evaluate_link_missing_href,
    )
    .with_name("Link without a destination")
    .with_severity(Severity::Warning)
    .with_description("Anchors need a real href; \"#\" and javascript: URLs are dead links")
    .with_tag("wcag-2.1.1")
    .with_rationale("Agents follow hrefs; an anchor driven only by script cannot be followed or opened in a new tab")
    .with_example_bad(r##"<a href="#" onClick={openOrders}>Orders</a>"##)
    .with_example_good(r#"<a href="/orders">Orders</a>"#)
}

pub fn link_text_generic() -> Rule {
    Rule::new(
        LINK_TEXT_GENERIC,
        RuleCategory::LinkNavigation,
        evaluate_link_text_generic,
    )
    .with_name("Generic link text")
    .with_severity(Severity::Warning)
    .with_description("Link text should describe the destination")
    .with_tag("wcag-2.4.4")
    .with_rationale("A list of links that all read \"click here\" tells an agent nothing about where they go")
    .with_example_bad(r#"<a href="/pricing">Learn more</a>"#)
    .with_example_good(r#"<a href="/pricing">Compare pricing plans</a>"#)
}

pub fn nav_missing_links() -> Rule {
    Rule::new(
        NAV_MISSING_LINKS,
        RuleCategory::LinkNavigation,
        evaluate_nav_missing_links,
    )
    .with_name("Navigation landmark without links")
    .with_severity(Severity::Warning)
    .with_description("A <nav> should be made of links")
    .with_tag("wcag-2.4.5")
    .with_rationale("Agents read a navigation landmark as a list of destinations; click handlers are not destinations")
    .with_example_bad(r#"<nav><span onClick={() => navigate("/orders")}>Orders</span></nav>"#)
    .with_example_good(r#"<nav><a href="/orders">Orders</a></nav>"#)
}

/// Click handler whose only effects are location changes
fn navigates_on_click(ctx: &RuleContext<'_>, element: &Element) -> bool {
    let Some(handler) = element.handler("onClick") else {
        return false;
    };
    let config = ctx.config;

    if handler.body.opaque {
        return element
            .static_attr("className")
            .or_else(|| element.static_attr("class"))
            .is_some_and(|class| config.navigation_class_pattern.is_match(class));
    }

    let mut effects = handler
        .body
        .effects()
        .filter(|e: &&str| {
            let tail = e.rsplit('.').next().unwrap_or(*e);
            !NEUTRAL_CALLS.contains(&tail)
        })
        .peekable();
    effects.peek().is_some() && effects.all(|e| config.navigation_pattern.is_match(e))
}

fn inside_navigation(ctx: &RuleContext<'_>, id: ElementId) -> bool {
    let is_nav = |e: &Element| {
        ctx.roles.role(e.id) == SemanticRole::Landmark(LandmarkKind::Navigation)
            || e.role().as_deref() == Some("navigation")
    };
    is_nav(ctx.tree.get(id)) || ctx.tree.ancestors(id).any(is_nav)
}

fn evaluate_nav_group_missing(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let tree = ctx.tree;
    let mut findings = Vec::new();

    for parent in tree.iter() {
        let mut first: Option<&Element> = None;
        let mut count = 0usize;
        let mut repeated = false;

        for child in tree.children(parent.id) {
            let (ids, from_iteration): (&[ElementId], bool) = match child {
                Child::Element(id) => (std::slice::from_ref(id), false),
                Child::Iteration(site) => (site.templates.as_slice(), true),
                Child::Text(_) => continue,
            };
            for id in ids {
                let element = tree.get(*id);
                let role = ctx.roles.role(*id);
                if !(role.is_generic() || role.is_interactive()) {
                    continue;
                }
                if !navigates_on_click(ctx, element) {
                    continue;
                }
                count += 1;
                repeated |= from_iteration;
                first.get_or_insert(element);
            }
        }

        let Some(first) = first else {
            continue;
        };
        if !(count >= 2 || repeated) || inside_navigation(ctx, parent.id) {
            continue;
        }

        let message = if repeated {
            "Repeated elements navigate on click but are not grouped in a <nav>".to_string()
        } else {
            format!(
                "{} sibling elements navigate on click but are not grouped in a <nav>",
                count
            )
        };
        findings.push(
            finding_at(NAV_GROUP_MISSING, Severity::Warning, first, &message).with_fix(
                SuggestedFix::replace_with(
                    "Wrap the items in <nav> and render each one as <a href>",
                    "nav",
                ),
            ),
        );
    }

    Ok(findings)
}

/// Anchor, `role="link"`, or a component that may render one
fn may_be_link(element: &Element) -> bool {
    match &element.tag {
        Tag::Component(_) => true,
        _ => element.tag.is("a") || element.role().as_deref() == Some("link"),
    }
}

fn evaluate_nav_missing_links(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let tree = ctx.tree;
    let mut findings = Vec::new();

    for nav in tree.iter() {
        let is_nav = ctx.roles.role(nav.id) == SemanticRole::Landmark(LandmarkKind::Navigation)
            || nav.role().as_deref() == Some("navigation");
        if !is_nav {
            continue;
        }
        if tree
            .descendants(nav.id)
            .into_iter()
            .any(|d| may_be_link(tree.get(d)))
        {
            continue;
        }

        let message = format!("{} contains no links", describe(nav));
        findings.push(
            finding_at(NAV_MISSING_LINKS, Severity::Warning, nav, &message).with_fix(
                SuggestedFix::hint("Render each navigation item as <a href>"),
            ),
        );
    }

    Ok(findings)
}

fn evaluate_link_missing_href(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for element in ctx.tree.iter().filter(|e| e.tag.is("a")) {
        let message = match element.attr("href") {
            AttributeValue::Absent if element.has_spread => continue,
            AttributeValue::Absent => "<a> has no href attribute".to_string(),
            AttributeValue::Boolean(_) => "<a> has an empty href attribute".to_string(),
            AttributeValue::StaticString(href) => {
                let normalized = href.trim().to_ascii_lowercase();
                if normalized.is_empty() || NONFUNCTIONAL_HREFS.contains(&normalized.as_str()) {
                    format!("<a> has a non-functional href=\"{}\"", href)
                } else {
                    continue;
                }
            }
            AttributeValue::DynamicExpression => continue,
        };

        findings.push(
            finding_at(LINK_MISSING_HREF, Severity::Warning, element, &message).with_fix(
                SuggestedFix::add_attribute("Point the link at a real URL", "href"),
            ),
        );
    }

    Ok(findings)
}

fn evaluate_link_text_generic(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for element in ctx.tree.iter().filter(|e| e.tag.is("a")) {
        if has_aria_name(element) {
            continue;
        }
        let Some(text) = ctx.tree.text_content(element.id) else {
            continue;
        };
        let phrase = text
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if !GENERIC_LINK_TEXT.contains(&phrase.as_str()) {
            continue;
        }

        let message = format!(
            "{} text \"{}\" does not describe its destination",
            describe(element),
            text.trim()
        );
        findings.push(
            finding_at(LINK_TEXT_GENERIC, Severity::Warning, element, &message).with_fix(
                SuggestedFix::hint("Use link text that names the destination"),
            ),
        );
    }

    Ok(findings)
}
