//! Parsed JSX/TSX syntax tree consumed by the scanner
//!
//! The parser front end is not part of this crate. It hands over one
//! [`SyntaxTree`] per source unit, either in-process or serialized as JSON:
//!
//! ```json
//! {
//!   "file": "src/Dashboard.jsx",
//!   "stateBindings": ["orders"],
//!   "roots": [
//!     { "type": "element", "name": "img", "span": { "line": 3, "column": 5 },
//!       "attributes": [
//!         { "type": "named", "name": "src", "value": { "kind": "string", "value": "x.png" } }
//!       ] }
//!   ]
//! }
//! ```
//!
//! Only the expression shapes the rule engine reasons about are modeled;
//! everything else arrives as [`Expr::Other`].

use crate::finding::Location;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error loading a syntax tree handed over by the front end
#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid syntax tree in {file}: {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source span, 1-based
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub line: usize,
    pub column: usize,
    #[serde(default)]
    pub end_line: usize,
    #[serde(default)]
    pub end_column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            end_line: line,
            end_column: column,
        }
    }

    /// Set the end of the span
    pub fn to(mut self, end_line: usize, end_column: usize) -> Self {
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }

    /// Resolve into a finding location for `file`
    pub fn location(&self, file: &Path) -> Location {
        // Front ends that only report a start position leave the end zeroed
        let (end_line, end_column) = if self.end_line == 0 {
            (self.line, self.column)
        } else {
            (self.end_line, self.end_column)
        };
        Location::new(file.to_path_buf(), self.line, self.column).with_end(end_line, end_column)
    }
}

/// Operator of a short-circuit expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "??")]
    Nullish,
}

/// Expression shapes relevant to markup analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expr {
    String {
        value: String,
    },
    Number {
        value: f64,
    },
    Boolean {
        value: bool,
    },
    Null,
    Template {
        #[serde(default)]
        quasis: Vec<String>,
        #[serde(default)]
        expressions: Vec<Expr>,
    },
    Identifier {
        name: String,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    Call {
        callee: Box<Expr>,
        #[serde(default)]
        arguments: Vec<Expr>,
    },
    Function {
        #[serde(default)]
        params: Vec<String>,
        body: FunctionBody,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Logical {
        operator: LogicalOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        operator: String,
        argument: Box<Expr>,
    },
    Binary {
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Jsx {
        node: Box<SyntaxNode>,
    },
    Other {
        #[serde(default)]
        text: Option<String>,
    },
}

/// Body of a function expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FunctionBody {
    Expression { expression: Box<Expr> },
    Block { statements: Vec<Statement> },
}

/// Statement inside a block body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Statement {
    Expression {
        expression: Expr,
    },
    Return {
        #[serde(default)]
        argument: Option<Expr>,
    },
    If {
        test: Expr,
        #[serde(default)]
        consequent: Vec<Statement>,
        #[serde(default)]
        alternate: Vec<Statement>,
    },
    Other,
}

impl Expr {
    pub fn ident(name: &str) -> Self {
        Expr::Identifier {
            name: name.to_string(),
        }
    }

    pub fn string(value: &str) -> Self {
        Expr::String {
            value: value.to_string(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expr::Boolean { value }
    }

    pub fn member(object: Expr, property: &str) -> Self {
        Expr::Member {
            object: Box::new(object),
            property: property.to_string(),
        }
    }

    /// Build an identifier/member chain from a dotted path (`router.push`)
    pub fn path(path: &str) -> Self {
        let mut parts = path.split('.');
        let first = parts.next().unwrap_or_default();
        parts.fold(Expr::ident(first), |object, property| {
            Expr::member(object, property)
        })
    }

    pub fn call(callee: Expr, arguments: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            arguments,
        }
    }

    /// Arrow function with an expression body
    pub fn arrow(params: &[&str], body: Expr) -> Self {
        Expr::Function {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: FunctionBody::Expression {
                expression: Box::new(body),
            },
        }
    }

    /// Arrow function with a block body
    pub fn arrow_block(params: &[&str], statements: Vec<Statement>) -> Self {
        Expr::Function {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: FunctionBody::Block { statements },
        }
    }

    pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Self {
        Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }
    }

    pub fn logical(operator: LogicalOperator, left: Expr, right: Expr) -> Self {
        Expr::Logical {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::logical(LogicalOperator::And, left, right)
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assignment {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn jsx(node: SyntaxNode) -> Self {
        Expr::Jsx {
            node: Box::new(node),
        }
    }

    /// `collection.map((param) => body)`
    pub fn map(collection: Expr, param: &str, body: Expr) -> Self {
        Expr::call(
            Expr::member(collection, "map"),
            vec![Expr::arrow(&[param], body)],
        )
    }

    /// Dotted path of an identifier/member chain
    pub fn dotted_path(&self) -> Option<String> {
        match self {
            Expr::Identifier { name } => Some(name.clone()),
            Expr::Member { object, property } => {
                let base = object.dotted_path()?;
                Some(format!("{}.{}", base, property))
            }
            _ => None,
        }
    }

    /// Leftmost identifier of a member/call chain (`order.items.map` -> `order`)
    pub fn root_identifier(&self) -> Option<&str> {
        match self {
            Expr::Identifier { name } => Some(name),
            Expr::Member { object, .. } => object.root_identifier(),
            Expr::Call { callee, .. } => callee.root_identifier(),
            _ => None,
        }
    }

    /// Root identifiers referenced anywhere in the expression, in order of appearance
    pub fn referenced_roots(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_roots(&mut out);
        out
    }

    fn collect_roots(&self, out: &mut Vec<String>) {
        match self {
            Expr::Identifier { name } => push_unique(out, name),
            Expr::Member { object, .. } => object.collect_roots(out),
            Expr::Call { callee, arguments } => {
                callee.collect_roots(out);
                for arg in arguments {
                    arg.collect_roots(out);
                }
            }
            Expr::Template { expressions, .. } => {
                for e in expressions {
                    e.collect_roots(out);
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.collect_roots(out);
                consequent.collect_roots(out);
                alternate.collect_roots(out);
            }
            Expr::Logical { left, right, .. } | Expr::Binary { left, right, .. } => {
                left.collect_roots(out);
                right.collect_roots(out);
            }
            Expr::Unary { argument, .. } => argument.collect_roots(out),
            Expr::Assignment { target, value } => {
                target.collect_roots(out);
                value.collect_roots(out);
            }
            _ => {}
        }
    }

    /// Statically known string value, if any
    pub fn static_string(&self) -> Option<String> {
        match self {
            Expr::String { value } => Some(value.clone()),
            Expr::Template {
                quasis,
                expressions,
            } if expressions.is_empty() => Some(quasis.concat()),
            _ => None,
        }
    }

    /// Statically known boolean value, if any
    pub fn static_bool(&self) -> Option<bool> {
        match self {
            Expr::Boolean { value } => Some(*value),
            _ => None,
        }
    }

    /// Whether the expression is something that can be called (function or reference)
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Expr::Function { .. }
                | Expr::Identifier { .. }
                | Expr::Member { .. }
                | Expr::Call { .. }
                | Expr::Conditional { .. }
                | Expr::Logical { .. }
                | Expr::Other { .. }
        )
    }
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|n| n == name) {
        out.push(name.to_string());
    }
}

/// Attribute value as written in markup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttrValue {
    String { value: String },
    Expression { expression: Expr },
}

/// Attribute of a markup element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JsxAttribute {
    Named {
        name: String,
        /// `None` for a bare attribute (`<input disabled />`)
        #[serde(default)]
        value: Option<AttrValue>,
        #[serde(default)]
        span: Span,
    },
    Spread {
        expression: Expr,
        #[serde(default)]
        span: Span,
    },
}

/// A node of the parsed markup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyntaxNode {
    Element {
        name: String,
        #[serde(default)]
        attributes: Vec<JsxAttribute>,
        #[serde(default)]
        children: Vec<SyntaxNode>,
        span: Span,
    },
    Fragment {
        #[serde(default)]
        children: Vec<SyntaxNode>,
        span: Span,
    },
    Text {
        value: String,
        span: Span,
    },
    Expression {
        expression: Expr,
        span: Span,
    },
    /// A subtree the front end located but could not parse
    Error {
        message: String,
        span: Span,
    },
}

impl SyntaxNode {
    pub fn element(name: &str, span: Span) -> Self {
        SyntaxNode::Element {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            span,
        }
    }

    pub fn fragment(span: Span) -> Self {
        SyntaxNode::Fragment {
            children: Vec::new(),
            span,
        }
    }

    pub fn text(value: &str, span: Span) -> Self {
        SyntaxNode::Text {
            value: value.to_string(),
            span,
        }
    }

    pub fn expression(expression: Expr, span: Span) -> Self {
        SyntaxNode::Expression { expression, span }
    }

    pub fn error(message: &str, span: Span) -> Self {
        SyntaxNode::Error {
            message: message.to_string(),
            span,
        }
    }

    /// Source span of the node
    pub fn span(&self) -> Span {
        match self {
            SyntaxNode::Element { span, .. }
            | SyntaxNode::Fragment { span, .. }
            | SyntaxNode::Text { span, .. }
            | SyntaxNode::Expression { span, .. }
            | SyntaxNode::Error { span, .. } => *span,
        }
    }

    fn push_attribute(mut self, attribute: JsxAttribute) -> Self {
        if let SyntaxNode::Element { attributes, .. } = &mut self {
            attributes.push(attribute);
        }
        self
    }

    /// Add a string attribute (`name="value"`)
    pub fn attr(self, name: &str, value: &str) -> Self {
        let span = self.span();
        self.push_attribute(JsxAttribute::Named {
            name: name.to_string(),
            value: Some(AttrValue::String {
                value: value.to_string(),
            }),
            span,
        })
    }

    /// Add an expression attribute (`name={expr}`)
    pub fn attr_expr(self, name: &str, expression: Expr) -> Self {
        let span = self.span();
        self.push_attribute(JsxAttribute::Named {
            name: name.to_string(),
            value: Some(AttrValue::Expression { expression }),
            span,
        })
    }

    /// Add a bare attribute (`<input required />`)
    pub fn flag(self, name: &str) -> Self {
        let span = self.span();
        self.push_attribute(JsxAttribute::Named {
            name: name.to_string(),
            value: None,
            span,
        })
    }

    /// Add a spread attribute (`{...props}`)
    pub fn spread(self, expression: Expr) -> Self {
        let span = self.span();
        self.push_attribute(JsxAttribute::Spread { expression, span })
    }

    /// Append a child node (elements and fragments only)
    pub fn child(mut self, node: SyntaxNode) -> Self {
        match &mut self {
            SyntaxNode::Element { children, .. } | SyntaxNode::Fragment { children, .. } => {
                children.push(node)
            }
            _ => {}
        }
        self
    }
}

/// The parsed syntax of one source unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntaxTree {
    /// Path of the source unit
    pub file: PathBuf,
    /// Markup expressions rendered by the unit
    #[serde(default)]
    pub roots: Vec<SyntaxNode>,
    /// Identifiers known to hold component state (empty = unknown)
    #[serde(default)]
    pub state_bindings: Vec<String>,
}

impl SyntaxTree {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            roots: Vec::new(),
            state_bindings: Vec::new(),
        }
    }

    pub fn with_root(mut self, root: SyntaxNode) -> Self {
        self.roots.push(root);
        self
    }

    pub fn with_state(mut self, bindings: &[&str]) -> Self {
        self.state_bindings
            .extend(bindings.iter().map(|b| b.to_string()));
        self
    }

    /// Parse a tree from its JSON form
    pub fn from_json(content: &str, origin: &Path) -> Result<Self, InputError> {
        serde_json::from_str(content).map_err(|source| InputError::Json {
            file: origin.display().to_string(),
            source,
        })
    }

    /// Load a tree from a JSON file written by the front end
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let content = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            file: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_path() {
        let expr = Expr::path("window.location.href");
        assert_eq!(expr.dotted_path(), Some("window.location.href".to_string()));
        assert_eq!(expr.root_identifier(), Some("window"));
    }

    #[test]
    fn test_root_identifier_through_calls() {
        let expr = Expr::call(
            Expr::member(Expr::path("order.items"), "filter"),
            vec![Expr::ident("isVisible")],
        );
        assert_eq!(expr.root_identifier(), Some("order"));
        assert_eq!(expr.dotted_path(), None);
    }

    #[test]
    fn test_referenced_roots() {
        let expr = Expr::and(
            Expr::Unary {
                operator: "!".to_string(),
                argument: Box::new(Expr::ident("loading")),
            },
            Expr::path("user.name"),
        );
        assert_eq!(expr.referenced_roots(), vec!["loading", "user"]);
    }

    #[test]
    fn test_static_string() {
        assert_eq!(Expr::string("x").static_string(), Some("x".to_string()));
        let template = Expr::Template {
            quasis: vec!["/orders".to_string()],
            expressions: vec![],
        };
        assert_eq!(template.static_string(), Some("/orders".to_string()));
        let dynamic = Expr::Template {
            quasis: vec!["/orders/".to_string(), "".to_string()],
            expressions: vec![Expr::ident("id")],
        };
        assert_eq!(dynamic.static_string(), None);
    }

    #[test]
    fn test_builder_ignores_attributes_on_text() {
        let node = SyntaxNode::text("hi", Span::new(1, 1)).attr("id", "x");
        assert_eq!(node, SyntaxNode::text("hi", Span::new(1, 1)));
    }

    #[test]
    fn test_span_location_without_end() {
        let loc = Span::new(4, 2).location(Path::new("a.jsx"));
        assert_eq!((loc.end_line, loc.end_column), (4, 2));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "file": "src/Photo.jsx",
            "stateBindings": ["photos"],
            "roots": [
                {
                    "type": "element",
                    "name": "img",
                    "span": { "line": 3, "column": 5, "endLine": 3, "endColumn": 28 },
                    "attributes": [
                        { "type": "named", "name": "src", "value": { "kind": "string", "value": "x.png" } },
                        { "type": "named", "name": "onClick", "value": { "kind": "expression", "expression": { "kind": "identifier", "name": "zoom" } } },
                        { "type": "spread", "expression": { "kind": "identifier", "name": "rest" } }
                    ]
                }
            ]
        }"#;
        let tree = SyntaxTree::from_json(json, Path::new("photo.ast.json")).unwrap();
        assert_eq!(tree.file, PathBuf::from("src/Photo.jsx"));
        assert_eq!(tree.state_bindings, vec!["photos"]);
        match &tree.roots[0] {
            SyntaxNode::Element {
                name, attributes, ..
            } => {
                assert_eq!(name, "img");
                assert_eq!(attributes.len(), 3);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_from_json_error() {
        let err = SyntaxTree::from_json("{ not json", Path::new("bad.ast.json")).unwrap_err();
        assert!(err.to_string().contains("bad.ast.json"));
    }
}
