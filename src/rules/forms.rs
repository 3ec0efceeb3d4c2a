use super::{describe, finding_at};
use crate::classify::{has_aria_name, is_labelable_control};
use crate::element::{AttributeValue, Element, ElementTree, Tag};
use crate::finding::{Finding, Severity, SuggestedFix};
use crate::rule::{Rule, RuleCategory, RuleContext, RuleError};

pub const FORM_FIELD_MISSING_LABEL: &str = "form-field-missing-label";
pub const FAKE_FORM_CONTROL: &str = "fake-form-control";
pub const INPUT_MISSING_TYPE: &str = "input-missing-type";
pub const FORM_FIELD_MISSING_NAME: &str = "form-field-missing-name";
pub const FORM_MISSING_SUBMIT: &str = "form-missing-submit";
pub const FORM_REQUIRED_UNMARKED: &str = "form-required-unmarked";

const LABEL_FOR: &[&str] = &["htmlFor", "for"];
const CONTENT_EDITABLE: &[&str] = &["contentEditable", "contenteditable"];

pub fn form_field_missing_label() -> Rule {
    Rule::new(
        FORM_FIELD_MISSING_LABEL,
        RuleCategory::FormAccessibility,
        evaluate_form_field_missing_label,
    )
    .with_name("Form field without a label")
    .with_severity(Severity::Error)
    .with_description("Inputs, selects and textareas need a <label> or aria-label")
    .with_tag("wcag-1.3.1")
    .with_tag("wcag-3.3.2")
    .with_rationale("Placeholder text disappears on input and is not a reliable name for the field")
    .with_example_bad(r#"<input id="email" placeholder="Email" />"#)
    .with_example_good(r#"<label htmlFor="email">Email</label><input id="email" />"#)
}

pub fn fake_form_control() -> Rule {
    Rule::new(
        FAKE_FORM_CONTROL,
        RuleCategory::FormAccessibility,
        evaluate_fake_form_control,
    )
    .with_name("Editable element instead of a form control")
    .with_severity(Severity::Warning)
    .with_description("contentEditable containers should be real input or textarea elements")
    .with_tag("wcag-4.1.2")
    .with_rationale("An editable <div> is not announced as a text field and is not submitted with the form")
    .with_example_bad(r#"<div contentEditable onInput={update} />"#)
    .with_example_good(r#"<textarea onChange={update} />"#)
}

pub fn input_missing_type() -> Rule {
    Rule::new(
        INPUT_MISSING_TYPE,
        RuleCategory::FormAccessibility,
        evaluate_input_missing_type,
    )
    .with_name("Input without a type")
    .with_severity(Severity::Info)
    .with_description("Inputs should declare their type instead of relying on the text default")
    .with_tag("wcag-1.3.5")
    .with_rationale("The type tells agents what value a field expects: email, number, date")
    .with_example_bad(r#"<input name="email" />"#)
    .with_example_good(r#"<input type="email" name="email" />"#)
}

pub fn form_field_missing_name() -> Rule {
    Rule::new(
        FORM_FIELD_MISSING_NAME,
        RuleCategory::FormAccessibility,
        evaluate_form_field_missing_name,
    )
    .with_name("Form field without a name")
    .with_severity(Severity::Warning)
    .with_description("Inputs, selects and textareas should carry a name attribute")
    .with_tag("wcag-4.1.2")
    .with_rationale("Agents identify fields by name when filling and submitting a form")
    .with_example_bad(r#"<input type="text" id="city" />"#)
    .with_example_good(r#"<input type="text" id="city" name="city" />"#)
}

pub fn form_missing_submit() -> Rule {
    Rule::new(
        FORM_MISSING_SUBMIT,
        RuleCategory::FormAccessibility,
        evaluate_form_missing_submit,
    )
    .with_name("Form without a submit control")
    .with_severity(Severity::Warning)
    .with_description("Forms need a submit button or a submit input")
    .with_tag("wcag-3.2.2")
    .with_rationale("Without a submit control an agent has no way to find out how to send the form")
    .with_example_bad(r#"<form onSubmit={save}><input name="q" /><div onClick={save}>Go</div></form>"#)
    .with_example_good(r#"<form onSubmit={save}><input name="q" /><button type="submit">Search</button></form>"#)
}

pub fn form_required_unmarked() -> Rule {
    Rule::new(
        FORM_REQUIRED_UNMARKED,
        RuleCategory::FormAccessibility,
        evaluate_form_required_unmarked,
    )
    .with_name("No field marked required")
    .with_severity(Severity::Info)
    .with_description("Mandatory fields should carry required or aria-required")
    .with_tag("wcag-3.3.2")
    .with_rationale("Agents cannot tell which fields must be filled before the form is accepted")
    .with_example_bad(r#"<form><input name="email" /><button>Join</button></form>"#)
    .with_example_good(r#"<form><input name="email" required /><button>Join</button></form>"#)
}

/// Static and dynamic `for` targets of every label in the tree
struct LabelTargets {
    ids: Vec<String>,
    has_dynamic: bool,
}

impl LabelTargets {
    fn collect(tree: &ElementTree) -> Self {
        let mut targets = LabelTargets {
            ids: Vec::new(),
            has_dynamic: false,
        };
        for label in tree.iter().filter(|e| e.tag.is("label")) {
            match label.attr_any(LABEL_FOR) {
                AttributeValue::StaticString(id) => targets.ids.push(id.trim().to_string()),
                AttributeValue::DynamicExpression => targets.has_dynamic = true,
                _ => {}
            }
        }
        targets
    }

    fn labels(&self, control: &Element) -> bool {
        match control.attr("id") {
            AttributeValue::StaticString(id) => self.ids.iter().any(|t| t == id.trim()),
            AttributeValue::DynamicExpression => self.has_dynamic,
            _ => false,
        }
    }
}

fn evaluate_form_field_missing_label(
    ctx: &RuleContext<'_>,
) -> Result<Vec<Finding>, RuleError> {
    let tree = ctx.tree;
    let targets = LabelTargets::collect(tree);
    let mut findings = Vec::new();

    for element in tree.iter() {
        if !is_labelable_control(element) || element.has_spread || has_aria_name(element) {
            continue;
        }
        if tree.ancestors(element.id).any(|a| a.tag.is("label")) {
            continue;
        }
        if targets.labels(element) {
            continue;
        }

        let id_hint = element
            .static_attr("id")
            .map(|id| format!("<label htmlFor=\"{}\">", id))
            .unwrap_or_else(|| "a <label> wrapping the field".to_string());
        let message = format!("{} has no associated label", describe(element));
        findings.push(
            finding_at(FORM_FIELD_MISSING_LABEL, Severity::Error, element, &message).with_fix(
                SuggestedFix::hint(&format!("Add {} or an aria-label", id_hint)),
            ),
        );
    }

    Ok(findings)
}

fn evaluate_fake_form_control(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for element in ctx.tree.iter() {
        let editable = match element.attr_any(CONTENT_EDITABLE) {
            AttributeValue::Absent => false,
            AttributeValue::Boolean(b) => *b,
            AttributeValue::StaticString(s) => !s.trim().eq_ignore_ascii_case("false"),
            AttributeValue::DynamicExpression => true,
        };
        if !editable {
            continue;
        }
        if matches!(
            element.native_tag(),
            Some("input") | Some("textarea") | Some("select")
        ) {
            continue;
        }
        if matches!(
            element.role().as_deref(),
            Some("textbox") | Some("searchbox")
        ) {
            continue;
        }

        let message = format!(
            "{} is made editable with contentEditable instead of using a form control",
            describe(element)
        );
        findings.push(
            finding_at(FAKE_FORM_CONTROL, Severity::Warning, element, &message).with_fix(
                SuggestedFix::replace_with("Use a native text field", "textarea"),
            ),
        );
    }

    Ok(findings)
}

fn evaluate_input_missing_type(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for element in ctx.tree.iter().filter(|e| e.tag.is("input")) {
        if element.has_spread || element.has_attr("type") {
            continue;
        }
        findings.push(
            finding_at(
                INPUT_MISSING_TYPE,
                Severity::Info,
                element,
                "<input> has no type attribute and defaults to text",
            )
            .with_fix(SuggestedFix::add_attribute(
                "Declare the kind of value the field takes",
                "type",
            )),
        );
    }

    Ok(findings)
}

fn evaluate_form_field_missing_name(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let mut findings = Vec::new();

    for element in ctx.tree.iter() {
        if !is_labelable_control(element) || element.has_spread || element.has_attr("name") {
            continue;
        }
        let message = format!("{} has no name attribute", describe(element));
        findings.push(
            finding_at(FORM_FIELD_MISSING_NAME, Severity::Warning, element, &message).with_fix(
                SuggestedFix::add_attribute("Name the field after the value it collects", "name"),
            ),
        );
    }

    Ok(findings)
}

/// Control that submits its form, or may do so
fn submits(element: &Element) -> bool {
    if element.has_spread {
        return true;
    }
    let submit_type = |types: &[&str], missing: bool| match element.attr("type") {
        AttributeValue::Absent => missing,
        AttributeValue::StaticString(t) => types.contains(&t.trim().to_ascii_lowercase().as_str()),
        AttributeValue::DynamicExpression => true,
        AttributeValue::Boolean(_) => false,
    };
    match &element.tag {
        // Rendered markup unknown
        Tag::Component(_) => true,
        Tag::Native(tag) if tag == "button" => submit_type(&["submit"], true),
        Tag::Native(tag) if tag == "input" => submit_type(&["submit", "image"], false),
        _ => false,
    }
}

fn evaluate_form_missing_submit(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let tree = ctx.tree;
    let mut findings = Vec::new();

    for form in tree.iter().filter(|e| e.tag.is("form")) {
        if tree
            .descendants(form.id)
            .into_iter()
            .any(|d| submits(tree.get(d)))
        {
            continue;
        }
        findings.push(
            finding_at(
                FORM_MISSING_SUBMIT,
                Severity::Warning,
                form,
                "<form> has no submit button",
            )
            .with_fix(SuggestedFix::hint("Add <button type=\"submit\"> to the form")),
        );
    }

    Ok(findings)
}

fn marks_required(element: &Element) -> bool {
    ["required", "aria-required"]
        .iter()
        .any(|name| match element.attr(name) {
            AttributeValue::Boolean(b) => *b,
            AttributeValue::StaticString(s) => !s.trim().eq_ignore_ascii_case("false"),
            AttributeValue::DynamicExpression => true,
            AttributeValue::Absent => false,
        })
}

fn evaluate_form_required_unmarked(ctx: &RuleContext<'_>) -> Result<Vec<Finding>, RuleError> {
    let tree = ctx.tree;
    let mut findings = Vec::new();

    for form in tree.iter().filter(|e| e.tag.is("form")) {
        let descendants: Vec<&Element> = tree
            .descendants(form.id)
            .into_iter()
            .map(|d| tree.get(d))
            .collect();
        if descendants
            .iter()
            .any(|d| d.has_spread || matches!(d.tag, Tag::Component(_)))
        {
            continue;
        }
        let fields: Vec<&&Element> = descendants
            .iter()
            .filter(|d| is_labelable_control(d))
            .collect();
        if fields.is_empty() || fields.iter().any(|f| marks_required(f)) {
            continue;
        }

        let message = format!(
            "<form> has {} field{} but none is marked required",
            fields.len(),
            if fields.len() == 1 { "" } else { "s" }
        );
        findings.push(
            finding_at(FORM_REQUIRED_UNMARKED, Severity::Info, form, &message).with_fix(
                SuggestedFix::add_attribute("Mark mandatory fields", "required"),
            ),
        );
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{el, run, text};
    use crate::syntax::{Expr, SyntaxNode};

    #[test]
    fn test_label_pairing() {
        let findings = run(
            &form_field_missing_label(),
            el("form", 1)
                .child(el("label", 2).attr("htmlFor", "email").child(text("Email", 2)))
                .child(el("input", 3).attr("id", "email")),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_missing_label() {
        let findings = run(
            &form_field_missing_label(),
            el("form", 1).child(el("input", 3).attr("id", "email")),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].location.line, 3);
        assert!(findings[0]
            .suggested_fix
            .as_ref()
            .is_some_and(|f| f.description.contains("htmlFor=\"email\"")));
    }

    #[test]
    fn test_mismatched_label_is_not_a_label() {
        let findings = run(
            &form_field_missing_label(),
            el("form", 1)
                .child(el("label", 2).attr("htmlFor", "name"))
                .child(el("input", 3).attr("id", "email")),
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_wrapping_label_and_aria() {
        let rule = form_field_missing_label();
        assert!(run(
            &rule,
            el("label", 1)
                .child(text("Name", 1))
                .child(el("input", 1))
        )
        .is_empty());
        assert!(run(&rule, el("select", 1).attr("aria-label", "Country")).is_empty());
        assert!(run(&rule, el("textarea", 1).attr("aria-labelledby", "notes-heading")).is_empty());
    }

    #[test]
    fn test_plain_for_attribute() {
        let findings = run(
            &form_field_missing_label(),
            el("div", 1)
                .child(el("label", 2).attr("for", "q"))
                .child(el("input", 3).attr("id", "q")),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_dynamic_ids() {
        let findings = run(
            &form_field_missing_label(),
            el("div", 1)
                .child(el("label", 2).attr_expr("htmlFor", Expr::path("field.id")))
                .child(el("input", 3).attr_expr("id", Expr::path("field.id"))),
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_button_like_inputs_are_skipped() {
        let rule = form_field_missing_label();
        assert!(run(&rule, el("input", 1).attr("type", "submit")).is_empty());
        assert!(run(&rule, el("input", 1).attr("type", "hidden")).is_empty());
        assert_eq!(run(&rule, el("input", 1).attr("type", "search")).len(), 1);
    }

    #[test]
    fn test_placeholder_is_not_a_label() {
        let findings = run(
            &form_field_missing_label(),
            el("input", 1).attr("placeholder", "Search orders"),
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_content_editable_div() {
        let findings = run(&fake_form_control(), el("div", 5).flag("contentEditable"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].location.line, 5);
    }

    #[test]
    fn test_content_editable_variants() {
        let rule = fake_form_control();
        assert_eq!(run(&rule, el("span", 1).attr("contenteditable", "true")).len(), 1);
        assert!(run(&rule, el("div", 1).attr("contentEditable", "false")).is_empty());
        assert!(run(
            &rule,
            el("div", 1)
                .attr_expr("contentEditable", Expr::boolean(true))
                .attr("role", "textbox")
        )
        .is_empty());
        assert!(run(&rule, el("div", 1)).is_empty());
    }

    #[test]
    fn test_input_missing_type() {
        let rule = input_missing_type();
        let findings = run(&rule, el("input", 4).attr("name", "q"));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert!(run(&rule, el("input", 1).attr("type", "search")).is_empty());
        assert!(run(&rule, el("input", 1).spread(Expr::ident("field"))).is_empty());
        assert!(run(&rule, el("textarea", 1)).is_empty());
    }

    #[test]
    fn test_form_field_missing_name() {
        let rule = form_field_missing_name();
        let findings = run(
            &rule,
            el("form", 1)
                .child(el("input", 2).attr("type", "email").attr("name", "email"))
                .child(el("select", 3))
                .child(el("input", 4).attr("type", "submit")),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.line, 3);
        assert_eq!(findings[0].message, "<select> has no name attribute");
        assert!(run(&rule, el("textarea", 1).attr_expr("name", Expr::path("field.key"))).is_empty());
    }

    #[test]
    fn test_form_missing_submit() {
        let rule = form_missing_submit();
        let findings = run(
            &rule,
            el("form", 1)
                .child(el("input", 2).attr("name", "q"))
                .child(el("button", 3).attr("type", "button")),
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].location.line, 1);

        // A button without a type submits
        assert!(run(&rule, el("form", 1).child(el("button", 2))).is_empty());
        assert!(run(&rule, el("form", 1).child(el("input", 2).attr("type", "submit"))).is_empty());
        assert!(run(&rule, el("form", 1).child(el("SubmitBar", 2))).is_empty());
        assert!(run(&rule, el("div", 1).child(el("input", 2))).is_empty());
    }

    #[test]
    fn test_form_required_unmarked() {
        let rule = form_required_unmarked();
        let form = |email: SyntaxNode| {
            el("form", 1)
                .child(email)
                .child(el("input", 3).attr("name", "nickname"))
                .child(el("button", 4))
        };

        let findings = run(&rule, form(el("input", 2).attr("name", "email")));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[0].message, "<form> has 2 fields but none is marked required");

        assert!(run(&rule, form(el("input", 2).flag("required"))).is_empty());
        assert!(run(&rule, form(el("input", 2).attr("aria-required", "true"))).is_empty());
        assert_eq!(
            run(&rule, form(el("input", 2).attr_expr("required", Expr::boolean(false)))).len(),
            1
        );
        assert!(run(&rule, el("form", 1).child(el("button", 2))).is_empty());
    }
}
