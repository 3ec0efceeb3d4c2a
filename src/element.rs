//! Normalized element tree built from a parsed syntax tree
//!
//! Fragments are flattened into their parent, mapping callbacks are entered
//! once and become a single iteration-generated template, and every branch of
//! a conditional render is kept as an alternative child flagged
//! `conditional`. Elements are stored in an arena in document order, so a
//! plain walk over [`ElementTree::iter`] visits them the way they appear in
//! the source.

use crate::finding::{Finding, Location, Severity};
use crate::syntax::{
    AttrValue, Expr, FunctionBody, JsxAttribute, LogicalOperator, Span, Statement, SyntaxNode,
    SyntaxTree,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rule id used for recoverable structural problems found while building
pub const PARSE_RECOVERY_RULE: &str = "parse-recovery";

/// Error that prevents building a tree for a source unit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("No usable root element in {file}: {reason}")]
    UnresolvedRoot { file: String, reason: String },
}

/// Index of an element in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub usize);

/// Element tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Native HTML tag, lower-cased
    Native(String),
    /// Custom component (`<OrderCard>`, `<Foo.Bar>`)
    Component(String),
    /// Synthetic root for units that render several top-level elements or
    /// alternative roots
    Document,
}

impl Tag {
    /// Classify a JSX element name
    pub fn from_name(name: &str) -> Self {
        let starts_lower = name.chars().next().is_some_and(|c| c.is_ascii_lowercase());
        if starts_lower && !name.contains('.') {
            Tag::Native(name.to_ascii_lowercase())
        } else {
            Tag::Component(name.to_string())
        }
    }

    /// Native tag name, if this is a native element
    pub fn native(&self) -> Option<&str> {
        match self {
            Tag::Native(name) => Some(name),
            _ => None,
        }
    }

    /// Check for a specific native tag
    pub fn is(&self, name: &str) -> bool {
        self.native() == Some(name)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tag::Native(name) | Tag::Component(name) => write!(f, "{}", name),
            Tag::Document => write!(f, "#document"),
        }
    }
}

/// Attribute value kinds; rules reason about kind and presence, never about
/// runtime values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    StaticString(String),
    /// Bound to a non-literal expression; present but unknown
    DynamicExpression,
    Boolean(bool),
    Absent,
}

static ABSENT: AttributeValue = AttributeValue::Absent;

impl AttributeValue {
    pub fn is_present(&self) -> bool {
        !matches!(self, AttributeValue::Absent)
    }

    pub fn as_static(&self) -> Option<&str> {
        match self {
            AttributeValue::StaticString(s) => Some(s),
            _ => None,
        }
    }

    /// Statically `true` (`attr`, `attr={true}`, `attr="true"`)
    pub fn is_static_true(&self) -> bool {
        match self {
            AttributeValue::Boolean(b) => *b,
            AttributeValue::StaticString(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Statically empty or bare (`alt=""`, `alt`)
    pub fn is_static_empty(&self) -> bool {
        match self {
            AttributeValue::StaticString(s) => s.trim().is_empty(),
            AttributeValue::Boolean(_) => true,
            _ => false,
        }
    }

    fn from_syntax(value: Option<&AttrValue>) -> Self {
        match value {
            None => AttributeValue::Boolean(true),
            Some(AttrValue::String { value }) => AttributeValue::StaticString(value.clone()),
            Some(AttrValue::Expression { expression }) => {
                if let Some(s) = expression.static_string() {
                    AttributeValue::StaticString(s)
                } else if let Some(b) = expression.static_bool() {
                    AttributeValue::Boolean(b)
                } else if matches!(expression, Expr::Null) {
                    AttributeValue::Absent
                } else {
                    AttributeValue::DynamicExpression
                }
            }
        }
    }
}

/// What an event handler does, as far as its syntax shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerBody {
    /// Dotted callee paths of calls made by the handler (`navigate`, `router.push`)
    pub calls: Vec<String>,
    /// Dotted targets of assignments (`window.location.href`)
    pub assignments: Vec<String>,
    /// Statements that are neither calls nor assignments
    pub other_effects: usize,
    /// Handler is a reference whose body is not visible here
    pub opaque: bool,
}

impl HandlerBody {
    fn from_expr(expr: &Expr) -> Self {
        let mut body = HandlerBody::default();
        match expr {
            Expr::Function {
                body: FunctionBody::Expression { expression },
                ..
            } => body.record(expression),
            Expr::Function {
                body: FunctionBody::Block { statements },
                ..
            } => body.record_statements(statements),
            Expr::Identifier { .. } | Expr::Member { .. } => body.opaque = true,
            other => body.record(other),
        }
        body
    }

    fn record_statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            match statement {
                Statement::Expression { expression } => self.record(expression),
                Statement::Return {
                    argument: Some(argument),
                } => self.record(argument),
                Statement::Return { argument: None } => {}
                Statement::If {
                    consequent,
                    alternate,
                    ..
                } => {
                    self.record_statements(consequent);
                    self.record_statements(alternate);
                }
                Statement::Other => self.other_effects += 1,
            }
        }
    }

    fn record(&mut self, expr: &Expr) {
        match expr {
            Expr::Call { callee, .. } => self
                .calls
                .push(callee.dotted_path().unwrap_or_else(|| "<dynamic>".to_string())),
            Expr::Assignment { target, .. } => self
                .assignments
                .push(target.dotted_path().unwrap_or_else(|| "<dynamic>".to_string())),
            Expr::Conditional {
                consequent,
                alternate,
                ..
            } => {
                self.record(consequent);
                self.record(alternate);
            }
            Expr::Logical { right, .. } => self.record(right),
            _ => self.other_effects += 1,
        }
    }

    /// Paths of every effect the handler performs
    pub fn effects(&self) -> impl Iterator<Item = &str> {
        self.calls
            .iter()
            .chain(self.assignments.iter())
            .map(String::as_str)
    }
}

/// An attached event handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHandler {
    pub name: String,
    pub body: HandlerBody,
}

/// Text child value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextValue {
    Static(String),
    /// `{expression}` rendered as text; holds the root identifiers it reads
    Dynamic { roots: Vec<String> },
}

/// Text child of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent {
    pub value: TextValue,
    pub location: Location,
    pub conditional: bool,
    /// Root identifiers read by the conditions guarding this text
    pub condition_refs: Vec<String>,
}

impl TextContent {
    pub fn static_text(&self) -> Option<&str> {
        match &self.value {
            TextValue::Static(s) => Some(s),
            TextValue::Dynamic { .. } => None,
        }
    }
}

/// A mapping construct whose callback returns markup; entered once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSite {
    pub location: Location,
    /// Root identifier of the iterated collection (`orders` in `orders.map`)
    pub collection: Option<String>,
    /// Callback parameters bound inside the template
    pub params: Vec<String>,
    /// Template root elements
    pub templates: Vec<ElementId>,
    pub conditional: bool,
}

/// Child of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Element(ElementId),
    Text(TextContent),
    Iteration(IterationSite),
}

/// A node of the normalized tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub id: ElementId,
    pub tag: Tag,
    pub attributes: BTreeMap<String, AttributeValue>,
    /// A `{...spread}` attribute makes the attribute set open-ended
    pub has_spread: bool,
    pub event_handlers: BTreeMap<String, EventHandler>,
    pub children: Vec<Child>,
    pub parent: Option<ElementId>,
    pub location: Location,
    /// Produced by the template of an iteration site (inherited by descendants)
    pub iteration_generated: bool,
    /// Inside a conditional render branch (inherited by descendants)
    pub conditional: bool,
    /// Root identifiers read by the conditions guarding this element
    pub condition_refs: Vec<String>,
    /// Iteration parameters in scope at this element
    pub iteration_params: Vec<String>,
}

impl Element {
    /// Attribute value, `Absent` when missing
    pub fn attr(&self, name: &str) -> &AttributeValue {
        self.attributes.get(name).unwrap_or(&ABSENT)
    }

    /// First present attribute among aliases (`htmlFor` / `for`)
    pub fn attr_any(&self, names: &[&str]) -> &AttributeValue {
        names
            .iter()
            .map(|n| self.attr(n))
            .find(|v| v.is_present())
            .unwrap_or(&ABSENT)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_present()
    }

    /// Static string value of an attribute
    pub fn static_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).as_static()
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.event_handlers.contains_key(name)
    }

    pub fn handler(&self, name: &str) -> Option<&EventHandler> {
        self.event_handlers.get(name)
    }

    /// Attribute names, used to compare sibling structure
    pub fn attribute_keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Native tag name, if any
    pub fn native_tag(&self) -> Option<&str> {
        self.tag.native()
    }

    /// Lower-cased static `role` attribute
    pub fn role(&self) -> Option<String> {
        self.static_attr("role").map(|r| r.trim().to_ascii_lowercase())
    }
}

/// Normalized element tree for one source unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTree {
    pub file: PathBuf,
    elements: Vec<Element>,
    root: ElementId,
    state_bindings: Vec<String>,
}

impl ElementTree {
    /// Root element
    pub fn root(&self) -> &Element {
        &self.elements[self.root.0]
    }

    pub fn root_id(&self) -> ElementId {
        self.root
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All elements in document order
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Identifiers the front end reported as component state
    pub fn state_bindings(&self) -> &[String] {
        &self.state_bindings
    }

    pub fn parent(&self, id: ElementId) -> Option<&Element> {
        self.get(id).parent.map(|p| self.get(p))
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = &Element> {
        std::iter::successors(self.parent(id), move |e| self.parent(e.id))
    }

    pub fn children(&self, id: ElementId) -> &[Child] {
        &self.get(id).children
    }

    /// Element children with iteration templates expanded in place
    pub fn child_elements(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        for child in &self.get(id).children {
            match child {
                Child::Element(c) => out.push(*c),
                Child::Iteration(site) => out.extend(site.templates.iter().copied()),
                Child::Text(_) => {}
            }
        }
        out
    }

    /// All descendants in document order
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.child_elements(id).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.child_elements(next).into_iter().rev());
        }
        out
    }

    /// Static text of the subtree; `None` when any part of it is dynamic
    pub fn text_content(&self, id: ElementId) -> Option<String> {
        let mut parts = Vec::new();
        self.collect_text(id, &mut parts)?;
        Some(parts.join(" "))
    }

    fn collect_text(&self, id: ElementId, parts: &mut Vec<String>) -> Option<()> {
        for child in &self.get(id).children {
            match child {
                Child::Text(text) => parts.push(text.static_text()?.to_string()),
                Child::Element(c) => self.collect_text(*c, parts)?,
                Child::Iteration(_) => return None,
            }
        }
        Some(())
    }
}

/// Result of building a tree: the tree plus recoverable-structure findings
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub tree: ElementTree,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Default)]
struct Scope {
    parent: Option<ElementId>,
    iteration: bool,
    conditional: bool,
    condition_refs: Vec<String>,
    params: Vec<String>,
}

impl Scope {
    fn branch(&self, test: &Expr) -> Self {
        let mut scope = self.clone();
        scope.conditional = true;
        for root in test.referenced_roots() {
            if !scope.condition_refs.contains(&root) {
                scope.condition_refs.push(root);
            }
        }
        scope
    }

    fn under(&self, parent: ElementId) -> Self {
        let mut scope = self.clone();
        scope.parent = Some(parent);
        scope
    }
}

/// Builds [`ElementTree`]s from syntax trees
pub struct TreeBuilder<'a> {
    file: &'a Path,
    elements: Vec<Element>,
    findings: Vec<Finding>,
}

impl<'a> TreeBuilder<'a> {
    /// Build the element tree for a source unit
    pub fn build(syntax: &SyntaxTree) -> Result<BuildOutput, BuildError> {
        let mut builder = TreeBuilder {
            file: &syntax.file,
            elements: Vec::new(),
            findings: Vec::new(),
        };

        let root = match count_top_level(&syntax.roots) {
            0 => {
                return Err(BuildError::UnresolvedRoot {
                    file: syntax.file.display().to_string(),
                    reason: if syntax.roots.is_empty() {
                        "the unit renders no markup".to_string()
                    } else {
                        "no element could be located in the rendered markup".to_string()
                    },
                })
            }
            1 => {
                let children = builder.lower_children(&syntax.roots, &Scope::default());
                let root = children.iter().find_map(|c| match c {
                    Child::Element(id) => Some(*id),
                    _ => None,
                });
                root.ok_or_else(|| BuildError::UnresolvedRoot {
                    file: syntax.file.display().to_string(),
                    reason: "no element could be located in the rendered markup".to_string(),
                })?
            }
            _ => builder.synthesize_root(&syntax.roots),
        };

        if builder.elements.is_empty() {
            return Err(BuildError::UnresolvedRoot {
                file: syntax.file.display().to_string(),
                reason: "no element could be located in the rendered markup".to_string(),
            });
        }

        log::debug!(
            "Built element tree for {}: {} elements, {} recovery findings",
            syntax.file.display(),
            builder.elements.len(),
            builder.findings.len()
        );

        Ok(BuildOutput {
            tree: ElementTree {
                file: syntax.file.clone(),
                elements: builder.elements,
                root,
                state_bindings: syntax.state_bindings.clone(),
            },
            findings: builder.findings,
        })
    }

    fn synthesize_root(&mut self, roots: &[SyntaxNode]) -> ElementId {
        let span = roots.first().map(SyntaxNode::span).unwrap_or_default();
        let location = span.location(self.file);
        let id = ElementId(self.elements.len());
        self.elements.push(Element {
            id,
            tag: Tag::Document,
            attributes: BTreeMap::new(),
            has_spread: false,
            event_handlers: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
            location: location.clone(),
            iteration_generated: false,
            conditional: false,
            condition_refs: Vec::new(),
            iteration_params: Vec::new(),
        });
        if simultaneous_roots(roots) > 1 {
            self.findings.push(Finding::new(
                PARSE_RECOVERY_RULE,
                Severity::Info,
                "Rendered markup has no single root element; siblings are scanned under a synthetic document root",
                location,
            ));
        }
        let children = self.lower_children(roots, &Scope::default().under(id));
        self.elements[id.0].children = children;
        id
    }

    fn lower_children(&mut self, nodes: &[SyntaxNode], scope: &Scope) -> Vec<Child> {
        let mut out = Vec::new();
        for node in nodes {
            match node {
                SyntaxNode::Element {
                    name,
                    attributes,
                    children,
                    span,
                } => {
                    let id = self.lower_element(name, attributes, children, *span, scope);
                    out.push(Child::Element(id));
                }
                SyntaxNode::Fragment { children, .. } => {
                    out.extend(self.lower_children(children, scope));
                }
                SyntaxNode::Text { value, span } => {
                    let text = normalize_text(value);
                    if !text.is_empty() {
                        out.push(self.text_child(TextValue::Static(text), *span, scope));
                    }
                }
                SyntaxNode::Expression { expression, span } => {
                    out.extend(self.lower_expression(expression, *span, scope));
                }
                SyntaxNode::Error { message, span } => {
                    self.findings.push(Finding::new(
                        PARSE_RECOVERY_RULE,
                        Severity::Info,
                        &format!("Skipped malformed markup: {}", message),
                        span.location(self.file),
                    ));
                }
            }
        }
        out
    }

    fn lower_expression(&mut self, expr: &Expr, span: Span, scope: &Scope) -> Vec<Child> {
        match expr {
            Expr::Jsx { node } => self.lower_children(std::slice::from_ref(node.as_ref()), scope),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let branch = scope.branch(test);
                let mut out = self.lower_expression(consequent, span, &branch);
                out.extend(self.lower_expression(alternate, span, &branch));
                out
            }
            Expr::Logical {
                operator: LogicalOperator::And,
                left,
                right,
            } => self.lower_expression(right, span, &scope.branch(left)),
            Expr::Logical { left, right, .. } => {
                let mut out = self.lower_expression(left, span, scope);
                out.extend(self.lower_expression(right, span, &scope.branch(left)));
                out
            }
            Expr::Call { .. } => match iteration_parts(expr) {
                Some((collection, params, returns)) => {
                    self.lower_iteration(expr, collection, params, returns, span, scope)
                }
                None => vec![self.dynamic_text(expr, span, scope)],
            },
            Expr::String { .. } | Expr::Template { .. } if expr.static_string().is_some() => {
                let text = normalize_text(&expr.static_string().unwrap_or_default());
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![self.text_child(TextValue::Static(text), span, scope)]
                }
            }
            Expr::Number { value } => {
                vec![self.text_child(TextValue::Static(value.to_string()), span, scope)]
            }
            // Renders nothing
            Expr::Boolean { .. } | Expr::Null => Vec::new(),
            _ => vec![self.dynamic_text(expr, span, scope)],
        }
    }

    fn lower_iteration(
        &mut self,
        call: &Expr,
        collection: Option<String>,
        params: Vec<String>,
        returns: Vec<&Expr>,
        span: Span,
        scope: &Scope,
    ) -> Vec<Child> {
        let mut template_scope = scope.clone();
        template_scope.iteration = true;
        template_scope.params.extend(params.iter().cloned());
        // Several return paths are alternatives of one template
        if returns.len() > 1 {
            template_scope.conditional = true;
        }

        let mut templates = Vec::new();
        for ret in returns {
            for child in self.lower_expression(ret, span, &template_scope) {
                match child {
                    Child::Element(id) => templates.push(id),
                    Child::Iteration(nested) => templates.extend(nested.templates),
                    Child::Text(_) => {}
                }
            }
        }

        if templates.is_empty() {
            return vec![self.dynamic_text(call, span, scope)];
        }

        vec![Child::Iteration(IterationSite {
            location: span.location(self.file),
            collection,
            params,
            templates,
            conditional: scope.conditional,
        })]
    }

    fn dynamic_text(&self, expr: &Expr, span: Span, scope: &Scope) -> Child {
        let value = TextValue::Dynamic {
            roots: expr.referenced_roots(),
        };
        self.text_child(value, span, scope)
    }

    fn text_child(&self, value: TextValue, span: Span, scope: &Scope) -> Child {
        Child::Text(TextContent {
            value,
            location: span.location(self.file),
            conditional: scope.conditional,
            condition_refs: scope.condition_refs.clone(),
        })
    }

    fn lower_element(
        &mut self,
        name: &str,
        attributes: &[JsxAttribute],
        children: &[SyntaxNode],
        span: Span,
        scope: &Scope,
    ) -> ElementId {
        let mut attrs = BTreeMap::new();
        let mut handlers = BTreeMap::new();
        let mut has_spread = false;

        for attribute in attributes {
            match attribute {
                JsxAttribute::Named { name, value, .. } => {
                    attrs.insert(name.clone(), AttributeValue::from_syntax(value.as_ref()));
                    if let Some(AttrValue::Expression { expression }) = value {
                        if is_handler_name(name) && expression.is_callable() {
                            handlers.insert(
                                name.clone(),
                                EventHandler {
                                    name: name.clone(),
                                    body: HandlerBody::from_expr(expression),
                                },
                            );
                        }
                    }
                }
                JsxAttribute::Spread { .. } => has_spread = true,
            }
        }

        let id = ElementId(self.elements.len());
        self.elements.push(Element {
            id,
            tag: Tag::from_name(name),
            attributes: attrs,
            has_spread,
            event_handlers: handlers,
            children: Vec::new(),
            parent: scope.parent,
            location: span.location(self.file),
            iteration_generated: scope.iteration,
            conditional: scope.conditional,
            condition_refs: scope.condition_refs.clone(),
            iteration_params: scope.params.clone(),
        });

        let lowered = self.lower_children(children, &scope.under(id));
        self.elements[id.0].children = lowered;
        id
    }
}

/// `onClick`, `onKeyDown`, ...
pub fn is_handler_name(name: &str) -> bool {
    name.strip_prefix("on")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Collapse JSX text whitespace the way it renders
fn normalize_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of top-level elements the roots render; 2 stands for "more than one"
fn count_top_level(nodes: &[SyntaxNode]) -> usize {
    let mut count = 0;
    for node in nodes {
        count += match node {
            SyntaxNode::Element { .. } => 1,
            SyntaxNode::Fragment { children, .. } => count_top_level(children),
            SyntaxNode::Expression { expression, .. } => match expression {
                Expr::Jsx { node } => count_top_level(std::slice::from_ref(node.as_ref())),
                other if contains_markup(other) => 2,
                _ => 0,
            },
            SyntaxNode::Text { .. } | SyntaxNode::Error { .. } => 0,
        };
        if count > 1 {
            return 2;
        }
    }
    count
}

/// Largest number of top-level elements rendered at once; conditional
/// branches are alternatives, an iteration renders any number
fn simultaneous_roots(nodes: &[SyntaxNode]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            SyntaxNode::Element { .. } => 1,
            SyntaxNode::Fragment { children, .. } => simultaneous_roots(children),
            SyntaxNode::Expression { expression, .. } => expression_roots(expression),
            SyntaxNode::Text { .. } | SyntaxNode::Error { .. } => 0,
        })
        .sum()
}

fn expression_roots(expr: &Expr) -> usize {
    match expr {
        Expr::Jsx { node } => simultaneous_roots(std::slice::from_ref(node.as_ref())),
        Expr::Conditional {
            consequent,
            alternate,
            ..
        } => expression_roots(consequent).max(expression_roots(alternate)),
        Expr::Logical {
            operator: LogicalOperator::And,
            right,
            ..
        } => expression_roots(right),
        Expr::Logical { left, right, .. } => expression_roots(left).max(expression_roots(right)),
        Expr::Call { .. } if contains_markup(expr) => 2,
        _ => 0,
    }
}

fn contains_markup(expr: &Expr) -> bool {
    match expr {
        Expr::Jsx { .. } => true,
        Expr::Conditional {
            consequent,
            alternate,
            ..
        } => contains_markup(consequent) || contains_markup(alternate),
        Expr::Logical { left, right, .. } => contains_markup(left) || contains_markup(right),
        Expr::Call { .. } => iteration_parts(expr)
            .is_some_and(|(_, _, returns)| returns.into_iter().any(contains_markup)),
        _ => false,
    }
}

/// Recognize `xs.map(cb)`, `xs.flatMap(cb)` and `Array.from(xs, cb)` with a
/// function callback; yields the collection root, the callback parameters and
/// the expressions the callback returns
fn iteration_parts(expr: &Expr) -> Option<(Option<String>, Vec<String>, Vec<&Expr>)> {
    let Expr::Call { callee, arguments } = expr else {
        return None;
    };

    let (collection, callback) = match callee.as_ref() {
        Expr::Member { object, property } if property == "map" || property == "flatMap" => {
            (collection_root(object), arguments.first()?)
        }
        other if other.dotted_path().as_deref() == Some("Array.from") => {
            (collection_root(arguments.first()?), arguments.get(1)?)
        }
        _ => return None,
    };

    let Expr::Function { params, body } = callback else {
        return None;
    };

    let mut returns = Vec::new();
    match body {
        FunctionBody::Expression { expression } => returns.push(expression.as_ref()),
        FunctionBody::Block { statements } => collect_returns(statements, &mut returns),
    }
    Some((collection, params.clone(), returns))
}

fn collect_returns<'e>(statements: &'e [Statement], out: &mut Vec<&'e Expr>) {
    for statement in statements {
        match statement {
            Statement::Return {
                argument: Some(argument),
            } => out.push(argument),
            Statement::If {
                consequent,
                alternate,
                ..
            } => {
                collect_returns(consequent, out);
                collect_returns(alternate, out);
            }
            _ => {}
        }
    }
}

/// Root identifier of an iterated collection, looking through
/// `Object.values(x)` / `Object.entries(x)` style wrappers
fn collection_root(expr: &Expr) -> Option<String> {
    if let Expr::Call { callee, arguments } = expr {
        if matches!(callee.root_identifier(), Some("Object") | Some("Array")) {
            return arguments.first().and_then(collection_root);
        }
    }
    expr.root_identifier().map(String::from)
}
