use super::finding_at;
use crate::classify::{is_presentational, SemanticRole};
use crate::element::AttributeValue;
use crate::finding::{Finding, Severity, SuggestedFix};
use crate::rule::{Rule, RuleCategory, RuleContext, RuleError};

pub const IMG_MISSING_ALT: &str = "img-missing-alt";

pub fn img_missing_alt() -> Rule {
    Rule::new(IMG_MISSING_ALT, RuleCategory::Aria, evaluate_img_missing_alt)
        .with_name("Image without alt text")
        .with_severity(Severity::Error)
        .with_description("Images must carry a non-empty alt attribute unless marked presentational")
        .with_tag("wcag-1.1.1")
        .with_rationale("Agents and screen readers cannot see pixels; alt text is the only description of the image")
        .with_example_bad(r#"<img src="chart.png" />"#)
        .with_example_good(r#"<img src="chart.png" alt="Revenue by month" />"#)
}

fn evaluate_img_missing_alt(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for element in ctx.tree.iter() {
        if ctx.roles.role(element.id) != SemanticRole::Image || is_presentational(element) {
            continue;
        }

        let message = match element.attr("alt") {
            AttributeValue::Absent if element.has_spread => continue,
            AttributeValue::Absent => "<img> has no alt attribute",
            AttributeValue::StaticString(s) if !s.trim().is_empty() => continue,
            AttributeValue::StaticString(_) | AttributeValue::Boolean(_) => {
                "<img> has an empty alt attribute"
            }
            AttributeValue::DynamicExpression => continue,
        };

        findings.push(
            finding_at(IMG_MISSING_ALT, Severity::Error, element, message).with_fix(
                SuggestedFix::add_attribute(
                    "Describe the image in an alt attribute, or mark it role=\"presentation\"",
                    "alt",
                ),
            ),
        );
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{el, run};
    use crate::syntax::Expr;

    #[test]
    fn test_missing_alt() {
        let findings = run(&img_missing_alt(), el("img", 3).attr("src", "x.png"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, IMG_MISSING_ALT);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].location.line, 3);
    }

    #[test]
    fn test_empty_alt() {
        let findings = run(&img_missing_alt(), el("img", 1).attr("alt", "  "));
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("empty"));

        let bare = run(&img_missing_alt(), el("img", 1).flag("alt"));
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn test_described_and_dynamic_alt() {
        let rule = img_missing_alt();
        assert!(run(&rule, el("img", 1).attr("alt", "Team photo")).is_empty());
        assert!(run(&rule, el("img", 1).attr_expr("alt", Expr::path("user.name"))).is_empty());
    }

    #[test]
    fn test_presentational_images_are_exempt() {
        let rule = img_missing_alt();
        assert!(run(&rule, el("img", 1).attr("role", "presentation")).is_empty());
        assert!(run(&rule, el("img", 1).attr("role", "none")).is_empty());
        assert!(run(&rule, el("img", 1).attr("aria-hidden", "true")).is_empty());
        assert!(run(&rule, el("img", 1).attr_expr("aria-hidden", Expr::boolean(true))).is_empty());
    }

    #[test]
    fn test_spread_may_supply_alt() {
        let rule = img_missing_alt();
        assert!(run(&rule, el("img", 1).spread(Expr::ident("props"))).is_empty());
        assert_eq!(
            run(&rule, el("img", 1).spread(Expr::ident("props")).attr("alt", "")).len(),
            1
        );
    }

    #[test]
    fn test_fires_once_per_image() {
        let findings = run(
            &img_missing_alt(),
            el("div", 1)
                .child(el("img", 2))
                .child(el("img", 3).attr("alt", "ok"))
                .child(el("img", 4)),
        );
        let lines: Vec<usize> = findings.iter().map(|f| f.location.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }
}
