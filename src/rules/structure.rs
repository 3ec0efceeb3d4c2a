use super::{describe, finding_at};
use crate::classify::SemanticRole;
use crate::element::{Child, Element, TextValue};
use crate::finding::{Finding, Location, Severity, SuggestedFix};
use crate::rule::{Rule, RuleCategory, RuleContext, RuleError};
use std::collections::BTreeSet;

pub const LIST_STRUCTURE_MISSING: &str = "list-structure-missing";
pub const DYNAMIC_REGION_MISSING_LIVE: &str = "dynamic-region-missing-live";
pub const HEADING_HIERARCHY_SKIP: &str = "heading-hierarchy-skip";

/// Siblings needed before repeated markup reads as a list
const LIST_THRESHOLD: usize = 3;

pub fn list_structure_missing() -> Rule {
    Rule::new(
        LIST_STRUCTURE_MISSING,
        RuleCategory::SemanticHtml,
        evaluate_list_structure_missing,
    )
    .with_name("Repeated markup without list semantics")
    .with_severity(Severity::Warning)
    .with_description("Markup rendered once per item of a collection should be a <ul>/<ol> of <li>")
    .with_tag("wcag-1.3.1")
    .with_rationale("List semantics tell agents how many items there are and where each one starts")
    .with_example_bad(
        r#"<div>{orders.map(o => <div className="order-item-row">{o.id}</div>)}</div>"#,
    )
    .with_example_good(r#"<ul>{orders.map(o => <li key={o.id}>{o.id}</li>)}</ul>"#)
}

pub fn dynamic_region_missing_live() -> Rule {
    Rule::new(
        DYNAMIC_REGION_MISSING_LIVE,
        RuleCategory::Aria,
        evaluate_dynamic_region_missing_live,
    )
    .with_name("Dynamic region without a live region")
    .with_severity(Severity::Info)
    .with_description("Containers whose content changes with state should announce updates")
    .with_tag("wcag-4.1.3")
    .with_rationale("Without aria-live, content that appears after an action is never announced")
    .with_example_bad(r#"<div>{error && <p>{error}</p>}</div>"#)
    .with_example_good(r#"<div aria-live="polite">{error && <p>{error}</p>}</div>"#)
}

pub fn heading_hierarchy_skip() -> Rule {
    Rule::new(
        HEADING_HIERARCHY_SKIP,
        RuleCategory::SemanticHtml,
        evaluate_heading_hierarchy_skip,
    )
    .with_name("Skipped heading level")
    .with_severity(Severity::Warning)
    .with_description("Heading levels should increase one step at a time")
    .with_tag("wcag-1.3.1")
    .with_rationale("Agents build an outline from headings; a skipped level breaks the outline")
    .with_example_bad(r#"<h1>Orders</h1><h4>Open</h4>"#)
    .with_example_good(r#"<h1>Orders</h1><h2>Open</h2>"#)
}

/// Structurally homogeneous siblings
struct SiblingGroup<'a> {
    tag: String,
    keys: BTreeSet<&'a str>,
    members: usize,
    /// A template stands for an unknown number of siblings
    unbounded: bool,
    anchor: Location,
    anchored_at_site: bool,
    first: &'a Element,
    all_conditional: bool,
}

impl<'a> SiblingGroup<'a> {
    fn accepts(&self, element: &Element) -> bool {
        if element.tag.to_string() != self.tag {
            return false;
        }
        let keys: BTreeSet<&str> = element.attribute_keys().collect();
        (keys.is_empty() && self.keys.is_empty()) || !self.keys.is_disjoint(&keys)
    }
}

fn evaluate_list_structure_missing(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let tree = ctx.tree;
    let mut findings = Vec::new();

    for parent in tree.iter() {
        if ctx.roles.role(parent.id) == SemanticRole::ListContainer
            || matches!(parent.role().as_deref(), Some("list"))
        {
            continue;
        }

        let mut groups: Vec<SiblingGroup<'_>> = Vec::new();
        for child in tree.children(parent.id) {
            let (ids, site) = match child {
                Child::Element(id) => (std::slice::from_ref(id), None),
                Child::Iteration(site) => (site.templates.as_slice(), Some(site)),
                Child::Text(_) => continue,
            };
            for id in ids {
                let element = tree.get(*id);
                if !element.iteration_generated
                    || element.native_tag().is_none()
                    || !ctx.roles.role(*id).is_generic()
                {
                    continue;
                }
                let conditional = element.conditional || site.is_some_and(|s| s.conditional);

                match groups.iter_mut().find(|g| g.accepts(element)) {
                    Some(group) => {
                        group.members += 1;
                        group.all_conditional &= conditional;
                        group.keys.extend(element.attribute_keys());
                        if let Some(site) = site {
                            group.unbounded = true;
                            if !group.anchored_at_site {
                                group.anchor = site.location.clone();
                                group.anchored_at_site = true;
                            }
                        }
                    }
                    None => groups.push(SiblingGroup {
                        tag: element.tag.to_string(),
                        keys: element.attribute_keys().collect(),
                        members: 1,
                        unbounded: site.is_some(),
                        anchor: site
                            .map(|s| s.location.clone())
                            .unwrap_or_else(|| element.location.clone()),
                        anchored_at_site: site.is_some(),
                        first: element,
                        all_conditional: conditional,
                    }),
                }
            }
        }

        for group in groups {
            if !group.unbounded && group.members < LIST_THRESHOLD {
                continue;
            }
            let message = format!(
                "Repeated {} siblings are rendered without list semantics",
                describe(group.first)
            );
            findings.push(
                Finding::new(
                    LIST_STRUCTURE_MISSING,
                    Severity::Warning,
                    &message,
                    group.anchor,
                )
                .with_conditional(group.all_conditional)
                .with_fix(SuggestedFix::replace_with(
                    "Render the container as <ul> and each repeated item as <li>",
                    "ul",
                )),
            );
        }
    }

    Ok(findings)
}

/// Identifiers driving a child that re-renders, as seen from `container`
fn driving_identifiers(ctx: &RuleContext<'_>, container: &Element) -> Vec<String> {
    let tree = ctx.tree;
    let mut roots: Vec<String> = Vec::new();

    for child in tree.children(container.id) {
        match child {
            Child::Iteration(site) => roots.extend(site.collection.iter().cloned()),
            Child::Element(id) => {
                let element = tree.get(*id);
                if element.conditional {
                    roots.extend(
                        element
                            .condition_refs
                            .iter()
                            .filter(|r| !container.condition_refs.contains(r))
                            .cloned(),
                    );
                }
            }
            Child::Text(text) if text.conditional => {
                let own: Vec<&String> = text
                    .condition_refs
                    .iter()
                    .filter(|r| !container.condition_refs.contains(r))
                    .collect();
                if own.is_empty() {
                    continue;
                }
                roots.extend(own.into_iter().cloned());
                if let TextValue::Dynamic { roots: read } = &text.value {
                    roots.extend(read.iter().cloned());
                }
            }
            Child::Text(_) => {}
        }
    }

    let state = tree.state_bindings();
    roots.retain(|r| !container.iteration_params.contains(r));
    if !state.is_empty() {
        roots.retain(|r| state.contains(r));
    }
    roots.sort();
    roots.dedup();
    roots
}

fn evaluate_dynamic_region_missing_live(
    ctx: &RuleContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let tree = ctx.tree;
    let mut findings = Vec::new();

    for container in tree.iter() {
        if container.native_tag().is_none() || !ctx.roles.role(container.id).is_generic() {
            continue;
        }
        if tree
            .ancestors(container.id)
            .any(|a| ctx.roles.role(a.id) == SemanticRole::LiveRegion)
        {
            continue;
        }

        let driving = driving_identifiers(ctx, container);
        if driving.is_empty() {
            continue;
        }

        let message = format!(
            "{} re-renders content driven by {} but is not a live region",
            describe(container),
            driving.join(", ")
        );
        findings.push(
            finding_at(DYNAMIC_REGION_MISSING_LIVE, Severity::Info, container, &message).with_fix(
                SuggestedFix::add_attribute(
                    "Add aria-live=\"polite\" (or role=\"status\") so updates are announced",
                    "aria-live",
                ),
            ),
        );
    }

    Ok(findings)
}

fn evaluate_heading_hierarchy_skip(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();
    let mut previous: Option<u8> = None;

    for element in ctx.tree.iter() {
        let Some(level) = ctx.roles.role(element.id).heading_level() else {
            continue;
        };
        if let Some(prev) = previous {
            if level > prev + 1 {
                let message = format!("Heading level jumps from h{} to h{}", prev, level);
                findings.push(
                    finding_at(HEADING_HIERARCHY_SKIP, Severity::Warning, element, &message)
                        .with_fix(SuggestedFix::replace_with(
                            "Use the next heading level",
                            &format!("h{}", prev + 1),
                        )),
                );
            }
        }
        previous = Some(level);
    }

    Ok(findings)
}
