//! Tree-sitter adapter: lowers a tree-sitter JavaScript parse into an [`Ast`].
//!
//! Parenthesized expressions are unwrapped, nested sequence expressions are
//! flattened, and anonymous default-exported classes and functions become
//! declarations. Any named node kind without a mapping is a hard error.

use super::*;
use crate::error::{Error, Result};
use tree_sitter::{Node as TsNode, Parser, Point};

/// Parse JavaScript (including JSX) source text.
pub fn parse(source: &str, file: &str) -> Result<Ast> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_javascript::LANGUAGE.into())?;
    let tree = parser.parse(source, None).ok_or_else(|| Error::Parse {
        file: file.to_string(),
        message: "parser produced no tree".into(),
    })?;
    let root = tree.root_node();
    if root.has_error() {
        let at = first_error(root).unwrap_or(root).start_position();
        return Err(Error::Parse {
            file: file.to_string(),
            message: format!("syntax error at line {}, column {}", at.row + 1, at.column + 1),
        });
    }

    let mut builder = Builder {
        src: source,
        nodes: Vec::new(),
    };
    let root_idx = builder.lower(root)?;
    let (comments, tokens) = scan_leaves(root, source);

    Ok(Ast {
        source: source.to_string(),
        nodes: builder.nodes,
        root: root_idx,
        comments,
        tokens,
    })
}

fn first_error(root: TsNode<'_>) -> Option<TsNode<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

/// Collect block comments and lexical tokens in source order.
/// Strings, templates and regexes count as single tokens.
fn scan_leaves(root: TsNode<'_>, src: &str) -> (Vec<Comment>, Vec<Token>) {
    let mut comments = Vec::new();
    let mut tokens = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let range = [node.start_byte(), node.end_byte()];
        match node.kind() {
            "comment" => {
                let raw = &src[range[0]..range[1]];
                if raw.starts_with("/*") {
                    comments.push(Comment {
                        raw: raw.to_string(),
                        range,
                        line: node.start_position().row + 1,
                    });
                }
                continue;
            }
            "html_comment" => continue,
            "string" | "template_string" | "regex" | "jsx_text" => {
                tokens.push(Token { range });
                continue;
            }
            _ => {}
        }
        if node.child_count() == 0 {
            if range[0] < range[1] {
                tokens.push(Token { range });
            }
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    (comments, tokens)
}

struct Builder<'s> {
    src: &'s str,
    nodes: Vec<Node>,
}

#[derive(Clone, Copy, PartialEq)]
enum FnShape {
    Declaration,
    Expression,
}

impl<'s> Builder<'s> {
    fn text(&self, n: TsNode<'_>) -> &'s str {
        let src: &'s str = self.src;
        &src[n.start_byte()..n.end_byte()]
    }

    fn alloc(&mut self, n: TsNode<'_>, kind: NodeKind) -> NodeIdx {
        self.alloc_span([n.start_byte(), n.end_byte()], n.start_position(), kind)
    }

    fn alloc_span(&mut self, range: Range, at: Point, kind: NodeKind) -> NodeIdx {
        let idx = NodeIdx(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            range,
            line: at.row + 1,
            column: at.column,
            node_id: None,
            parent: None,
            enclosing_scope: None,
            leading_comments: Vec::new(),
            trailing_comments: Vec::new(),
        });
        idx
    }

    fn range_of(&self, idx: NodeIdx) -> Range {
        self.nodes[idx.0 as usize].range
    }

    /// Named children, without comments.
    fn named<'t>(&self, n: TsNode<'t>) -> Vec<TsNode<'t>> {
        let mut cursor = n.walk();
        n.named_children(&mut cursor)
            .filter(|c| !matches!(c.kind(), "comment" | "html_comment" | "decorator"))
            .collect()
    }

    fn has_token(&self, n: TsNode<'_>, token: &str) -> bool {
        let mut cursor = n.walk();
        let found = n
            .children(&mut cursor)
            .any(|c| !c.is_named() && c.kind() == token);
        found
    }

    fn field<'t>(&self, n: TsNode<'t>, name: &str) -> Result<TsNode<'t>> {
        n.child_by_field_name(name)
            .ok_or_else(|| Error::UnknownNodeKind {
                kind: format!("{} without `{}`", n.kind(), name),
                line: n.start_position().row + 1,
            })
    }

    fn lower_field(&mut self, n: TsNode<'_>, name: &str) -> Result<NodeIdx> {
        let child = self.field(n, name)?;
        self.lower(child)
    }

    fn lower_opt(&mut self, n: Option<TsNode<'_>>) -> Result<Option<NodeIdx>> {
        n.map(|c| self.lower(c)).transpose()
    }

    fn lower_first(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        match self.named(n).first() {
            Some(&c) => self.lower(c),
            None => Err(Error::UnknownNodeKind {
                kind: format!("empty {}", n.kind()),
                line: n.start_position().row + 1,
            }),
        }
    }

    fn lower_all(&mut self, nodes: Vec<TsNode<'_>>) -> Result<Vec<NodeIdx>> {
        nodes.into_iter().map(|c| self.lower(c)).collect()
    }

    fn lower(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        let kind = match n.kind() {
            "program" => {
                let children: Vec<_> = self
                    .named(n)
                    .into_iter()
                    .filter(|c| c.kind() != "hash_bang_line")
                    .collect();
                let body = self.lower_all(children)?;
                // The program starts at its first statement.
                let start = body
                    .first()
                    .map(|&b| self.range_of(b)[0])
                    .unwrap_or(n.start_byte());
                let at = n.start_position();
                return Ok(self.alloc_span([start, n.end_byte()], at, NodeKind::Program { body }));
            }

            // -- Statements --
            "expression_statement" => NodeKind::ExpressionStatement {
                expression: self.lower_first(n)?,
            },
            "statement_block" => NodeKind::BlockStatement {
                body: self.lower_all(self.named(n))?,
            },
            "empty_statement" => NodeKind::EmptyStatement,
            "debugger_statement" => NodeKind::DebuggerStatement,
            "return_statement" => NodeKind::ReturnStatement {
                argument: self.lower_opt(self.named(n).first().copied())?,
            },
            "throw_statement" => NodeKind::ThrowStatement {
                argument: self.lower_first(n)?,
            },
            "break_statement" => NodeKind::BreakStatement {
                label: self.lower_opt(n.child_by_field_name("label"))?,
            },
            "continue_statement" => NodeKind::ContinueStatement {
                label: self.lower_opt(n.child_by_field_name("label"))?,
            },
            "labeled_statement" => NodeKind::LabeledStatement {
                label: self.lower_field(n, "label")?,
                body: self.lower_field(n, "body")?,
            },
            "if_statement" => {
                let alternate = match n.child_by_field_name("alternative") {
                    Some(else_clause) => Some(self.lower_first(else_clause)?),
                    None => None,
                };
                NodeKind::IfStatement {
                    test: self.lower_field(n, "condition")?,
                    consequent: self.lower_field(n, "consequence")?,
                    alternate,
                }
            }
            "switch_statement" => {
                let discriminant = self.lower_field(n, "value")?;
                let body = self.field(n, "body")?;
                NodeKind::SwitchStatement {
                    discriminant,
                    cases: self.lower_all(self.named(body))?,
                }
            }
            "switch_case" => {
                let value = n.child_by_field_name("value");
                let test = self.lower_opt(value)?;
                let rest: Vec<_> = self
                    .named(n)
                    .into_iter()
                    .filter(|c| Some(c.id()) != value.map(|v| v.id()))
                    .collect();
                NodeKind::SwitchCase {
                    test,
                    consequent: self.lower_all(rest)?,
                }
            }
            "switch_default" => NodeKind::SwitchCase {
                test: None,
                consequent: self.lower_all(self.named(n))?,
            },
            "while_statement" => NodeKind::WhileStatement {
                test: self.lower_field(n, "condition")?,
                body: self.lower_field(n, "body")?,
            },
            "do_statement" => NodeKind::DoWhileStatement {
                body: self.lower_field(n, "body")?,
                test: self.lower_field(n, "condition")?,
            },
            "for_statement" => NodeKind::ForStatement {
                init: self.lower_for_clause(n.child_by_field_name("initializer"))?,
                test: self.lower_for_clause(n.child_by_field_name("condition"))?,
                update: self.lower_for_clause(n.child_by_field_name("increment"))?,
                body: self.lower_field(n, "body")?,
            },
            "for_in_statement" => return self.lower_for_in(n),
            "try_statement" => {
                let block = self.lower_field(n, "body")?;
                let handler = self.lower_opt(n.child_by_field_name("handler"))?;
                let finalizer = match n.child_by_field_name("finalizer") {
                    Some(f) => Some(self.lower_field(f, "body")?),
                    None => None,
                };
                NodeKind::TryStatement {
                    block,
                    handler,
                    finalizer,
                }
            }
            "catch_clause" => NodeKind::CatchClause {
                param: self.lower_opt(n.child_by_field_name("parameter"))?,
                body: self.lower_field(n, "body")?,
            },
            "with_statement" => NodeKind::WithStatement {
                object: self.lower_field(n, "object")?,
                body: self.lower_field(n, "body")?,
            },

            // -- Declarations --
            "variable_declaration" | "lexical_declaration" => {
                let kind = match n.child_by_field_name("kind").map(|k| self.text(k)) {
                    Some("let") => VarKind::Let,
                    Some("const") => VarKind::Const,
                    _ => VarKind::Var,
                };
                let declarators: Vec<_> = self
                    .named(n)
                    .into_iter()
                    .filter(|c| c.kind() == "variable_declarator")
                    .collect();
                NodeKind::VariableDeclaration {
                    kind,
                    declarations: self.lower_all(declarators)?,
                }
            }
            "variable_declarator" => NodeKind::VariableDeclarator {
                id: self.lower_field(n, "name")?,
                init: self.lower_opt(n.child_by_field_name("value"))?,
            },
            "function_declaration" | "generator_function_declaration" => {
                return self.lower_function(n, FnShape::Declaration)
            }
            "function_expression" | "function" | "generator_function" => {
                return self.lower_function(n, FnShape::Expression)
            }
            "arrow_function" => {
                let params = match n.child_by_field_name("parameter") {
                    Some(p) => vec![self.lower(p)?],
                    None => self.lower_params(n.child_by_field_name("parameters"))?,
                };
                let body = self.field(n, "body")?;
                let expression = body.kind() != "statement_block";
                NodeKind::ArrowFunctionExpression {
                    params,
                    body: self.lower(body)?,
                    is_async: self.has_token(n, "async"),
                    expression,
                }
            }
            "class_declaration" => return self.lower_class(n, FnShape::Declaration),
            "class" => return self.lower_class(n, FnShape::Expression),
            "class_body" => NodeKind::ClassBody {
                body: self.lower_all(self.named(n))?,
            },
            "method_definition" => return self.lower_method(n),
            "field_definition" => {
                let key = self.field(n, "property")?;
                NodeKind::PropertyDefinition {
                    computed: key.kind() == "computed_property_name",
                    key: self.lower(key)?,
                    value: self.lower_opt(n.child_by_field_name("value"))?,
                    is_static: self.has_token(n, "static"),
                }
            }
            "class_static_block" => {
                let block = self.field(n, "body")?;
                NodeKind::StaticBlock {
                    body: self.lower_all(self.named(block))?,
                }
            }

            // -- Modules --
            "import_statement" => return self.lower_import(n),
            "export_statement" => return self.lower_export(n),

            // -- Expressions --
            "identifier"
            | "property_identifier"
            | "shorthand_property_identifier"
            | "shorthand_property_identifier_pattern"
            | "statement_identifier"
            | "undefined"
            | "import" => NodeKind::Identifier {
                name: self.text(n).to_string(),
            },
            "private_property_identifier" => NodeKind::PrivateIdentifier {
                name: self.text(n).trim_start_matches('#').to_string(),
            },
            "this" => NodeKind::ThisExpression,
            "super" => NodeKind::Super,
            "number" => NodeKind::Literal {
                value: LitValue::Number(parse_number(self.text(n))),
                raw: self.text(n).to_string(),
            },
            "string" => NodeKind::Literal {
                value: LitValue::String(unquote(self.text(n))),
                raw: self.text(n).to_string(),
            },
            "regex" => NodeKind::Literal {
                value: LitValue::RegExp(self.text(n).to_string()),
                raw: self.text(n).to_string(),
            },
            "true" | "false" => NodeKind::Literal {
                value: LitValue::Bool(n.kind() == "true"),
                raw: self.text(n).to_string(),
            },
            "null" => NodeKind::Literal {
                value: LitValue::Null,
                raw: "null".into(),
            },
            "template_string" => {
                let mut expressions = Vec::new();
                for sub in self.named(n) {
                    if sub.kind() == "template_substitution" {
                        expressions.push(self.lower_first(sub)?);
                    }
                }
                NodeKind::TemplateLiteral { expressions }
            }
            "object" => {
                let mut properties = Vec::new();
                for member in self.named(n) {
                    properties.push(self.lower_object_member(member)?);
                }
                NodeKind::ObjectExpression { properties }
            }
            "object_pattern" => {
                let mut properties = Vec::new();
                for member in self.named(n) {
                    properties.push(self.lower_pattern_member(member)?);
                }
                NodeKind::ObjectPattern { properties }
            }
            "array" => NodeKind::ArrayExpression {
                elements: self.lower_elements(n)?,
            },
            "array_pattern" => NodeKind::ArrayPattern {
                elements: self.lower_elements(n)?,
            },
            "assignment_pattern" => NodeKind::AssignmentPattern {
                left: self.lower_field(n, "left")?,
                right: self.lower_field(n, "right")?,
            },
            "rest_pattern" => NodeKind::RestElement {
                argument: self.lower_first(n)?,
            },
            "spread_element" => NodeKind::SpreadElement {
                argument: self.lower_first(n)?,
            },
            "call_expression" => {
                let callee = self.field(n, "function")?;
                let args = self.field(n, "arguments")?;
                if callee.kind() == "import" {
                    NodeKind::ImportExpression {
                        source: self.lower_first(args)?,
                    }
                } else if args.kind() == "template_string" {
                    NodeKind::TaggedTemplateExpression {
                        tag: self.lower(callee)?,
                        quasi: self.lower(args)?,
                    }
                } else {
                    NodeKind::CallExpression {
                        callee: self.lower(callee)?,
                        arguments: self.lower_all(self.named(args))?,
                        optional: n.child_by_field_name("optional_chain").is_some(),
                    }
                }
            }
            "new_expression" => {
                let arguments = match n.child_by_field_name("arguments") {
                    Some(args) => self.lower_all(self.named(args))?,
                    None => Vec::new(),
                };
                NodeKind::NewExpression {
                    callee: self.lower_field(n, "constructor")?,
                    arguments,
                }
            }
            "member_expression" => NodeKind::MemberExpression {
                object: self.lower_field(n, "object")?,
                property: self.lower_field(n, "property")?,
                computed: false,
                optional: n.child_by_field_name("optional_chain").is_some(),
            },
            "subscript_expression" => NodeKind::MemberExpression {
                object: self.lower_field(n, "object")?,
                property: self.lower_field(n, "index")?,
                computed: true,
                optional: n.child_by_field_name("optional_chain").is_some(),
            },
            "assignment_expression" => NodeKind::AssignmentExpression {
                operator: "=".into(),
                left: self.lower_field(n, "left")?,
                right: self.lower_field(n, "right")?,
            },
            "augmented_assignment_expression" => NodeKind::AssignmentExpression {
                operator: self.text(self.field(n, "operator")?).to_string(),
                left: self.lower_field(n, "left")?,
                right: self.lower_field(n, "right")?,
            },
            "binary_expression" => {
                let operator = self.text(self.field(n, "operator")?).to_string();
                let left = self.lower_field(n, "left")?;
                let right = self.lower_field(n, "right")?;
                if matches!(operator.as_str(), "&&" | "||" | "??") {
                    NodeKind::LogicalExpression {
                        operator,
                        left,
                        right,
                    }
                } else {
                    NodeKind::BinaryExpression {
                        operator,
                        left,
                        right,
                    }
                }
            }
            "unary_expression" => NodeKind::UnaryExpression {
                operator: self.text(self.field(n, "operator")?).to_string(),
                argument: self.lower_field(n, "argument")?,
            },
            "update_expression" => {
                let operator = self.field(n, "operator")?;
                let argument = self.field(n, "argument")?;
                NodeKind::UpdateExpression {
                    operator: self.text(operator).to_string(),
                    prefix: operator.start_byte() < argument.start_byte(),
                    argument: self.lower(argument)?,
                }
            }
            "ternary_expression" => NodeKind::ConditionalExpression {
                test: self.lower_field(n, "condition")?,
                consequent: self.lower_field(n, "consequence")?,
                alternate: self.lower_field(n, "alternative")?,
            },
            "sequence_expression" => {
                let mut flat = Vec::new();
                self.flatten_sequence(n, &mut flat);
                NodeKind::SequenceExpression {
                    expressions: self.lower_all(flat)?,
                }
            }
            "parenthesized_expression" | "computed_property_name" => return self.lower_first(n),
            "await_expression" => NodeKind::AwaitExpression {
                argument: self.lower_first(n)?,
            },
            "yield_expression" => NodeKind::YieldExpression {
                argument: self.lower_opt(self.named(n).first().copied())?,
                delegate: self.has_token(n, "*"),
            },
            "meta_property" => {
                let text = self.text(n);
                let (meta, property) = text.split_once('.').unwrap_or((text, ""));
                NodeKind::MetaProperty {
                    meta: meta.trim().to_string(),
                    property: property.trim().to_string(),
                }
            }

            // -- JSX --
            "jsx_element" => {
                let open = self.field(n, "open_tag")?;
                let close = n.child_by_field_name("close_tag");
                let inner: Vec<_> = self
                    .named(n)
                    .into_iter()
                    .filter(|c| c.id() != open.id() && Some(c.id()) != close.map(|c| c.id()))
                    .collect();
                if open.child_by_field_name("name").is_none() {
                    NodeKind::JSXFragment {
                        children: self.lower_all(inner)?,
                    }
                } else {
                    NodeKind::JSXElement {
                        opening: self.lower(open)?,
                        children: self.lower_all(inner)?,
                        closing: self.lower_opt(close)?,
                    }
                }
            }
            "jsx_self_closing_element" => {
                let (name, attributes) = self.lower_jsx_tag(n)?;
                let opening = self.alloc(
                    n,
                    NodeKind::JSXOpeningElement {
                        name,
                        attributes,
                        self_closing: true,
                    },
                );
                NodeKind::JSXElement {
                    opening,
                    children: Vec::new(),
                    closing: None,
                }
            }
            "jsx_opening_element" => {
                let (name, attributes) = self.lower_jsx_tag(n)?;
                NodeKind::JSXOpeningElement {
                    name,
                    attributes,
                    self_closing: false,
                }
            }
            "jsx_closing_element" => NodeKind::JSXClosingElement {
                name: self.lower_jsx_name(self.field(n, "name")?)?,
            },
            "jsx_attribute" => {
                let parts = self.named(n);
                let Some(&name) = parts.first() else {
                    return Err(Error::UnknownNodeKind {
                        kind: "empty jsx_attribute".into(),
                        line: n.start_position().row + 1,
                    });
                };
                NodeKind::JSXAttribute {
                    name: self.lower_jsx_name(name)?,
                    value: self.lower_opt(parts.get(1).copied())?,
                }
            }
            "jsx_expression" => match self.named(n).first().copied() {
                None => {
                    let empty = self.alloc(n, NodeKind::JSXEmptyExpression);
                    NodeKind::JSXExpressionContainer { expression: empty }
                }
                Some(spread) if spread.kind() == "spread_element" => NodeKind::JSXSpreadAttribute {
                    argument: self.lower_first(spread)?,
                },
                Some(expr) => NodeKind::JSXExpressionContainer {
                    expression: self.lower(expr)?,
                },
            },
            "jsx_text" | "html_character_reference" => NodeKind::JSXText {
                value: self.text(n).to_string(),
            },
            "jsx_namespace_name" | "nested_identifier" => return self.lower_jsx_name(n),

            other => {
                return Err(Error::UnknownNodeKind {
                    kind: other.to_string(),
                    line: n.start_position().row + 1,
                })
            }
        };
        Ok(self.alloc(n, kind))
    }

    fn lower_for_clause(&mut self, n: Option<TsNode<'_>>) -> Result<Option<NodeIdx>> {
        match n {
            None => Ok(None),
            Some(c) => match c.kind() {
                "empty_statement" | ";" => Ok(None),
                "expression_statement" => self.lower_first(c).map(Some),
                _ => self.lower(c).map(Some),
            },
        }
    }

    fn lower_for_in(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        let left_ts = self.field(n, "left")?;
        let mut left = self.lower(left_ts)?;
        if let Some(kind_ts) = n.child_by_field_name("kind") {
            let kind = match self.text(kind_ts) {
                "let" => VarKind::Let,
                "const" => VarKind::Const,
                _ => VarKind::Var,
            };
            let init = self.lower_opt(n.child_by_field_name("value"))?;
            let end = init.map_or(left_ts.end_byte(), |i| self.range_of(i)[1]);
            let declarator = self.alloc_span(
                [left_ts.start_byte(), end],
                left_ts.start_position(),
                NodeKind::VariableDeclarator { id: left, init },
            );
            left = self.alloc_span(
                [kind_ts.start_byte(), end],
                kind_ts.start_position(),
                NodeKind::VariableDeclaration {
                    kind,
                    declarations: vec![declarator],
                },
            );
        }
        let right = self.lower_field(n, "right")?;
        let body = self.lower_field(n, "body")?;
        let is_of = n
            .child_by_field_name("operator")
            .is_some_and(|op| self.text(op) == "of");
        let kind = if is_of {
            NodeKind::ForOfStatement { left, right, body }
        } else {
            NodeKind::ForInStatement { left, right, body }
        };
        Ok(self.alloc(n, kind))
    }

    fn lower_params(&mut self, n: Option<TsNode<'_>>) -> Result<Vec<NodeIdx>> {
        match n {
            Some(params) => self.lower_all(self.named(params)),
            None => Ok(Vec::new()),
        }
    }

    fn lower_function(&mut self, n: TsNode<'_>, shape: FnShape) -> Result<NodeIdx> {
        let id = self.lower_opt(n.child_by_field_name("name"))?;
        let params = self.lower_params(n.child_by_field_name("parameters"))?;
        let body = self.lower_field(n, "body")?;
        let generator = n.kind().starts_with("generator") || self.has_token(n, "*");
        let is_async = self.has_token(n, "async");
        let kind = match shape {
            FnShape::Declaration => NodeKind::FunctionDeclaration {
                id,
                params,
                body,
                generator,
                is_async,
            },
            FnShape::Expression => NodeKind::FunctionExpression {
                id,
                params,
                body,
                generator,
                is_async,
            },
        };
        Ok(self.alloc(n, kind))
    }

    fn lower_class(&mut self, n: TsNode<'_>, shape: FnShape) -> Result<NodeIdx> {
        let id = self.lower_opt(n.child_by_field_name("name"))?;
        let heritage = self
            .named(n)
            .into_iter()
            .find(|c| c.kind() == "class_heritage");
        let super_class = match heritage {
            Some(h) => Some(self.lower_first(h)?),
            None => None,
        };
        let body = self.lower_field(n, "body")?;
        let kind = match shape {
            FnShape::Declaration => NodeKind::ClassDeclaration {
                id,
                super_class,
                body,
            },
            FnShape::Expression => NodeKind::ClassExpression {
                id,
                super_class,
                body,
            },
        };
        Ok(self.alloc(n, kind))
    }

    /// The function value of a method: spans from the parameter list to the body.
    fn lower_method_value(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        let params_ts = self.field(n, "parameters")?;
        let params = self.lower_params(Some(params_ts))?;
        let body = self.lower_field(n, "body")?;
        let end = self.range_of(body)[1];
        Ok(self.alloc_span(
            [params_ts.start_byte(), end],
            params_ts.start_position(),
            NodeKind::FunctionExpression {
                id: None,
                params,
                body,
                generator: self.has_token(n, "*"),
                is_async: self.has_token(n, "async"),
            },
        ))
    }

    fn accessor_tokens(&self, n: TsNode<'_>) -> (bool, bool, bool) {
        let mut cursor = n.walk();
        let (mut is_static, mut get, mut set) = (false, false, false);
        for c in n.children(&mut cursor).filter(|c| !c.is_named()) {
            match c.kind() {
                "static" => is_static = true,
                "static get" => {
                    is_static = true;
                    get = true;
                }
                "get" => get = true,
                "set" => set = true,
                _ => {}
            }
        }
        (is_static, get, set)
    }

    fn lower_method(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        let key_ts = self.field(n, "name")?;
        let computed = key_ts.kind() == "computed_property_name";
        let (is_static, get, set) = self.accessor_tokens(n);
        let key_text = self.text(key_ts);
        let kind = if get {
            MethodKind::Get
        } else if set {
            MethodKind::Set
        } else if !is_static && !computed && key_text == "constructor" {
            MethodKind::Constructor
        } else {
            MethodKind::Method
        };
        let key = self.lower(key_ts)?;
        let value = self.lower_method_value(n)?;
        Ok(self.alloc(
            n,
            NodeKind::MethodDefinition {
                key,
                value,
                kind,
                computed,
                is_static,
            },
        ))
    }

    fn lower_object_member(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        let kind = match n.kind() {
            "pair" => {
                let key = self.field(n, "key")?;
                NodeKind::Property {
                    computed: key.kind() == "computed_property_name",
                    key: self.lower(key)?,
                    value: self.lower_field(n, "value")?,
                    kind: PropKind::Init,
                    shorthand: false,
                    method: false,
                }
            }
            "shorthand_property_identifier" => {
                let key = self.lower(n)?;
                let value = self.lower(n)?;
                NodeKind::Property {
                    key,
                    value,
                    kind: PropKind::Init,
                    computed: false,
                    shorthand: true,
                    method: false,
                }
            }
            "method_definition" => {
                let key_ts = self.field(n, "name")?;
                let (_, get, set) = self.accessor_tokens(n);
                let kind = if get {
                    PropKind::Get
                } else if set {
                    PropKind::Set
                } else {
                    PropKind::Init
                };
                NodeKind::Property {
                    computed: key_ts.kind() == "computed_property_name",
                    key: self.lower(key_ts)?,
                    value: self.lower_method_value(n)?,
                    kind,
                    shorthand: false,
                    method: kind == PropKind::Init,
                }
            }
            _ => return self.lower(n),
        };
        Ok(self.alloc(n, kind))
    }

    fn lower_pattern_member(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        let (key, value, shorthand, computed) = match n.kind() {
            "pair_pattern" => {
                let key_ts = self.field(n, "key")?;
                let computed = key_ts.kind() == "computed_property_name";
                let key = self.lower(key_ts)?;
                (key, self.lower_field(n, "value")?, false, computed)
            }
            "shorthand_property_identifier_pattern" => {
                (self.lower(n)?, self.lower(n)?, true, false)
            }
            "object_assignment_pattern" => {
                let left_ts = self.field(n, "left")?;
                let key = self.lower(left_ts)?;
                let left = self.lower(left_ts)?;
                let right = self.lower_field(n, "right")?;
                let value = self.alloc(n, NodeKind::AssignmentPattern { left, right });
                (key, value, true, false)
            }
            _ => return self.lower(n),
        };
        Ok(self.alloc(
            n,
            NodeKind::Property {
                key,
                value,
                kind: PropKind::Init,
                computed,
                shorthand,
                method: false,
            },
        ))
    }

    /// Array elements with holes. A trailing comma does not add a hole.
    fn lower_elements(&mut self, n: TsNode<'_>) -> Result<Vec<Option<NodeIdx>>> {
        let mut cursor = n.walk();
        let children: Vec<_> = n.children(&mut cursor).collect();
        let mut elements = Vec::new();
        let mut expecting = true;
        for c in children {
            match c.kind() {
                "[" | "]" | "comment" | "html_comment" => {}
                "," => {
                    if expecting {
                        elements.push(None);
                    }
                    expecting = true;
                }
                _ => {
                    elements.push(Some(self.lower(c)?));
                    expecting = false;
                }
            }
        }
        Ok(elements)
    }

    fn flatten_sequence<'t>(&self, n: TsNode<'t>, out: &mut Vec<TsNode<'t>>) {
        for c in self.named(n) {
            if c.kind() == "sequence_expression" {
                self.flatten_sequence(c, out);
            } else {
                out.push(c);
            }
        }
    }

    fn lower_import(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        let mut specifiers = Vec::new();
        let clause = self
            .named(n)
            .into_iter()
            .find(|c| c.kind() == "import_clause");
        if let Some(clause) = clause {
            for part in self.named(clause) {
                match part.kind() {
                    "identifier" => {
                        let local = self.lower(part)?;
                        let specifier = NodeKind::ImportDefaultSpecifier { local };
                        specifiers.push(self.alloc(part, specifier));
                    }
                    "namespace_import" => {
                        let local = self.lower_first(part)?;
                        let specifier = NodeKind::ImportNamespaceSpecifier { local };
                        specifiers.push(self.alloc(part, specifier));
                    }
                    "named_imports" => {
                        for spec in self.named(part) {
                            let imported = self.lower_field(spec, "name")?;
                            let local = match spec.child_by_field_name("alias") {
                                Some(alias) => self.lower(alias)?,
                                None => imported,
                            };
                            let specifier = NodeKind::ImportSpecifier { imported, local };
                            specifiers.push(self.alloc(spec, specifier));
                        }
                    }
                    _ => {}
                }
            }
        }
        let source = self.lower_field(n, "source")?;
        Ok(self.alloc(n, NodeKind::ImportDeclaration { specifiers, source }))
    }

    fn lower_export(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        let kind = if self.has_token(n, "default") {
            let target = match n.child_by_field_name("declaration") {
                Some(d) => d,
                None => self.field(n, "value")?,
            };
            let declaration = match target.kind() {
                "class" => self.lower_class(target, FnShape::Declaration)?,
                "function_expression" | "function" | "generator_function" => {
                    self.lower_function(target, FnShape::Declaration)?
                }
                _ => self.lower(target)?,
            };
            NodeKind::ExportDefaultDeclaration { declaration }
        } else if let Some(decl) = n.child_by_field_name("declaration") {
            NodeKind::ExportNamedDeclaration {
                declaration: Some(self.lower(decl)?),
                specifiers: Vec::new(),
                source: None,
            }
        } else {
            let named = self.named(n);
            let namespace = named.iter().find(|c| c.kind() == "namespace_export").copied();
            let clause = named.iter().find(|c| c.kind() == "export_clause").copied();
            match (namespace, clause) {
                (Some(ns), _) => NodeKind::ExportAllDeclaration {
                    exported: Some(self.lower_first(ns)?),
                    source: self.lower_field(n, "source")?,
                },
                (None, Some(clause)) => {
                    let mut specifiers = Vec::new();
                    for spec in self.named(clause) {
                        let local = self.lower_field(spec, "name")?;
                        let exported = match spec.child_by_field_name("alias") {
                            Some(alias) => self.lower(alias)?,
                            None => local,
                        };
                        let specifier = NodeKind::ExportSpecifier { local, exported };
                        specifiers.push(self.alloc(spec, specifier));
                    }
                    NodeKind::ExportNamedDeclaration {
                        declaration: None,
                        specifiers,
                        source: self.lower_opt(n.child_by_field_name("source"))?,
                    }
                }
                (None, None) => NodeKind::ExportAllDeclaration {
                    exported: None,
                    source: self.lower_field(n, "source")?,
                },
            }
        };
        Ok(self.alloc(n, kind))
    }

    fn lower_jsx_tag(&mut self, n: TsNode<'_>) -> Result<(NodeIdx, Vec<NodeIdx>)> {
        let name_ts = self.field(n, "name")?;
        let name = self.lower_jsx_name(name_ts)?;
        let attrs: Vec<_> = self
            .named(n)
            .into_iter()
            .filter(|c| c.id() != name_ts.id())
            .collect();
        Ok((name, self.lower_all(attrs)?))
    }

    fn lower_jsx_name(&mut self, n: TsNode<'_>) -> Result<NodeIdx> {
        let kind = match n.kind() {
            "identifier" | "property_identifier" | "jsx_identifier" => NodeKind::JSXIdentifier {
                name: self.text(n).to_string(),
            },
            "member_expression" | "nested_identifier" => {
                let parts = self.named(n);
                let (Some(&object), Some(&property)) = (parts.first(), parts.last()) else {
                    return self.lower(n);
                };
                NodeKind::JSXMemberExpression {
                    object: self.lower_jsx_name(object)?,
                    property: self.lower_jsx_name(property)?,
                }
            }
            "jsx_namespace_name" => {
                let parts = self.named(n);
                let (Some(&namespace), Some(&name)) = (parts.first(), parts.last()) else {
                    return self.lower(n);
                };
                NodeKind::JSXNamespacedName {
                    namespace: self.lower_jsx_name(namespace)?,
                    name: self.lower_jsx_name(name)?,
                }
            }
            _ => return self.lower(n),
        };
        Ok(self.alloc(n, kind))
    }
}

fn parse_number(text: &str) -> f64 {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let t = cleaned.trim_end_matches('n');
    let radix = |digits: &str, r: u32| {
        u64::from_str_radix(digits, r)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN)
    };
    match t.get(..2) {
        Some("0x" | "0X") => radix(&t[2..], 16),
        Some("0o" | "0O") => radix(&t[2..], 8),
        Some("0b" | "0B") => radix(&t[2..], 2),
        _ => t.parse().unwrap_or(f64::NAN),
    }
}

/// Decode a quoted string literal.
fn unquote(text: &str) -> String {
    let inner = if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        ""
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    out.push(ch);
                }
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|&c| c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    out.push(ch);
                }
            }
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('\n') => {}
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
