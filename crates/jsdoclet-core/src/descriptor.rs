//! Reading names, values and shapes off syntax nodes.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::ast::{Ast, LitValue, MethodKind, NodeIdx, NodeKind, VarKind};
use crate::doclet::Kind;
use crate::name::{PUNC_INSTANCE, PUNC_STATIC};
use crate::tag::value::cast;

static RE_SAFE_PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[$_a-zA-Z0-9]*$").unwrap());
static RE_BASENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([$a-z_][$a-z_0-9]*).*?$").unwrap());

/// What the code at a symbol looks like.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeInfo {
    /// The node the symbol's value lives in; the right side of an
    /// assignment, a property's value, a declarator's initializer.
    pub node: NodeIdx,
    pub name: String,
    pub node_type: Option<String>,
    pub value: Option<Value>,
    pub paramnames: Vec<String>,
    /// Kind forced by the declaration form, like `const`.
    pub kind: Option<Kind>,
}

/// JavaScript's string conversion of a value.
pub fn js_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

fn literal(value: &LitValue) -> Value {
    match value {
        LitValue::Null => Value::Null,
        LitValue::Bool(b) => Value::Bool(*b),
        LitValue::Number(n) => number(*n),
        LitValue::String(s) => Value::String(s.clone()),
        LitValue::RegExp(raw) => Value::String(raw.clone()),
    }
}

/// Value of a node as the documentation sees it: a name for identifiers
/// and member chains, the literal for literals, a JSON rendering for
/// array and object literals. `None` where nothing sensible exists.
pub fn node_to_value(ast: &Ast, idx: NodeIdx) -> Option<Value> {
    use NodeKind::*;

    let text = |s: String| Some(Value::String(s));
    match ast.kind(idx) {
        ArrayExpression { elements } => {
            let items = elements
                .iter()
                .map(|el| el.and_then(|el| node_to_value(ast, el)).unwrap_or(Value::Null))
                .collect();
            text(Value::Array(items).to_string())
        }
        AssignmentExpression { left, .. } | AssignmentPattern { left, .. } => {
            node_to_value(ast, *left)
        }
        ClassDeclaration { id, .. } => id.and_then(|id| node_to_value(ast, id)),
        ExportAllDeclaration { .. } | ExportDefaultDeclaration { .. } => {
            text("module.exports".into())
        }
        ExportNamedDeclaration { declaration, .. } => {
            let declaration = (*declaration)?;
            let first = match ast.kind(declaration) {
                VariableDeclaration { declarations, .. } => declarations.first().copied()?,
                _ => declaration,
            };
            text(format!("exports.{}", name_of(ast, first)))
        }
        ExportSpecifier { exported, .. } => text(format!("exports.{}", name_of(ast, *exported))),
        ArrowFunctionExpression { .. } => None,
        FunctionDeclaration { id, .. } | FunctionExpression { id, .. } => {
            let name = ast.identifier_name((*id)?)?;
            (!name.is_empty()).then(|| Value::String(name.to_string()))
        }
        Identifier { name } => text(name.clone()),
        Literal { value, .. } => Some(literal(value)),
        MemberExpression {
            object,
            property,
            computed,
            ..
        } => {
            let object = name_of(ast, *object);
            if *computed {
                text(format!("{object}[{}]", ast.text(*property)))
            } else {
                text(format!("{object}.{}", name_of(ast, *property)))
            }
        }
        MethodDefinition {
            key, kind, is_static, ..
        } => text(method_name(ast, idx, *key, *kind, *is_static)),
        ObjectExpression { properties } => {
            let mut object = Map::new();
            for &prop in properties {
                let Property { key, value, .. } = ast.kind(prop) else {
                    continue;
                };
                let key = match ast.kind(*key) {
                    Identifier { name } => name.clone(),
                    Literal { value, .. } => js_string(&literal(value)),
                    _ => "undefined".to_string(),
                };
                let value = match ast.kind(*value) {
                    Literal { value, .. } => literal(value),
                    _ => Value::String(String::new()),
                };
                object.insert(key, value);
            }
            text(Value::Object(object).to_string())
        }
        RestElement { argument } => node_to_value(ast, *argument),
        ThisExpression => text("this".into()),
        UnaryExpression { operator, argument } => {
            let operand = node_to_value(ast, *argument).map(|v| js_string(&v)).unwrap_or_default();
            cast(&format!("{operator}{operand}"))
        }
        VariableDeclarator { id, .. } => node_to_value(ast, *id),
        CallExpression { .. } => text("CallExpression".into()),
        _ => text(String::new()),
    }
}

/// Methods are named after their class: `Foo#bar`, `Foo.create`. A
/// constructor takes the class name itself.
fn method_name(
    ast: &Ast,
    method: NodeIdx,
    key: NodeIdx,
    kind: MethodKind,
    is_static: bool,
) -> String {
    let class = ast.parent(method).and_then(|body| ast.parent(body));
    let outer = class.and_then(|c| ast.parent(c));
    let under_default_export =
        outer.is_some_and(|o| matches!(ast.kind(o), NodeKind::ExportDefaultDeclaration { .. }));

    let mut name = match class.map(|c| ast.kind(c)) {
        Some(NodeKind::ClassExpression { .. }) => {
            outer.map(|o| name_of(ast, o)).unwrap_or_default()
        }
        _ if under_default_export && kind == MethodKind::Constructor => {
            "module.exports".to_string()
        }
        _ if under_default_export => String::new(),
        Some(NodeKind::ClassDeclaration { id: Some(id), .. }) => name_of(ast, *id),
        _ => String::new(),
    };
    if kind != MethodKind::Constructor {
        if !name.is_empty() {
            name.push(if is_static { PUNC_STATIC } else { PUNC_INSTANCE });
        }
        name.push_str(&name_of(ast, key));
    }
    name
}

/// [`node_to_value`] as a string; empty when the node has no value.
pub fn name_of(ast: &Ast, idx: NodeIdx) -> String {
    node_to_value(ast, idx).map(|v| js_string(&v)).unwrap_or_default()
}

/// Parameter names of a function-like node, in order. Destructured
/// parameters have empty names.
pub fn param_names(ast: &Ast, idx: NodeIdx) -> Vec<String> {
    ast.function_params(idx)
        .iter()
        .map(|&p| name_of(ast, p))
        .collect()
}

/// The leading identifier of a dotted name: `foo` for `foo.bar[0]`.
pub fn basename(name: &str) -> String {
    RE_BASENAME
        .captures(name)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| name.to_string())
}

fn is_function_node(ast: &Ast, idx: NodeIdx) -> bool {
    ast.kind(idx).is_function()
}

/// Describe the code at `idx`.
pub fn get_info(ast: &Ast, idx: NodeIdx) -> CodeInfo {
    use NodeKind::*;

    let type_of = |n: NodeIdx| Some(ast.kind(n).type_name().to_string());
    let mut info = CodeInfo {
        node: idx,
        name: String::new(),
        node_type: type_of(idx),
        value: None,
        paramnames: Vec::new(),
        kind: None,
    };

    match ast.kind(idx) {
        ArrowFunctionExpression { .. } | FunctionExpression { .. } => {
            info.paramnames = param_names(ast, idx);
        }
        AssignmentExpression { left, right, .. } => {
            info.node = *right;
            info.name = name_of(ast, *left);
            info.node_type = type_of(*right);
            info.value = node_to_value(ast, *right);
            info.paramnames = param_names(ast, *right);
        }
        AssignmentPattern { left, .. } => {
            info.name = name_of(ast, *left);
            info.value = node_to_value(ast, idx);
        }
        ClassDeclaration { id, body, .. } => {
            let default_export = ast
                .parent(idx)
                .is_some_and(|p| matches!(ast.kind(p), ExportDefaultDeclaration { .. }));
            info.name = if default_export {
                "module.exports".to_string()
            } else {
                id.map(|id| name_of(ast, id)).unwrap_or_default()
            };
            if let ClassBody { body } = ast.kind(*body) {
                let constructor = body.iter().find(|&&m| {
                    matches!(
                        ast.kind(m),
                        MethodDefinition {
                            kind: MethodKind::Constructor,
                            ..
                        }
                    )
                });
                if let Some(&constructor) = constructor {
                    info.paramnames = param_names(ast, constructor);
                }
            }
        }
        ExportAllDeclaration { .. } => info.name = name_of(ast, idx),
        ExportDefaultDeclaration { declaration } => {
            info.node = *declaration;
            info.name = name_of(ast, idx);
            info.node_type = type_of(*declaration);
            if is_function_node(ast, *declaration) {
                info.paramnames = param_names(ast, *declaration);
            }
        }
        ExportNamedDeclaration { declaration, .. } => {
            info.name = name_of(ast, idx);
            match declaration {
                Some(declaration) => {
                    info.node_type = type_of(*declaration);
                    if is_function_node(ast, *declaration) {
                        info.paramnames = param_names(ast, *declaration);
                    }
                    if let VariableDeclaration {
                        kind: VarKind::Const, ..
                    } = ast.kind(*declaration)
                    {
                        info.kind = Some(Kind::Constant);
                    }
                }
                None => info.node_type = Some("ObjectExpression".to_string()),
            }
        }
        ExportSpecifier { local, .. } => {
            info.name = name_of(ast, idx);
            info.node_type = type_of(*local);
            if is_function_node(ast, *local) {
                info.paramnames = param_names(ast, *local);
            }
        }
        FunctionDeclaration { id, .. } => {
            info.name = id.map(|id| name_of(ast, id)).unwrap_or_default();
            info.paramnames = param_names(ast, idx);
        }
        Identifier { .. } | MemberExpression { .. } => info.name = name_of(ast, idx),
        MethodDefinition { .. } => {
            info.name = name_of(ast, idx);
            info.paramnames = param_names(ast, idx);
        }
        Property { key, value, .. } | PropertyDefinition { key, value: Some(value), .. } => {
            info.node = *value;
            info.name = quote_property(name_of(ast, *key));
            info.value = node_to_value(ast, *value);
            if ast.kind(idx).is_accessor() {
                info.node_type = info.value.as_ref().map(js_string);
                info.paramnames = param_names(ast, *value);
            } else {
                info.node_type = type_of(*value);
            }
        }
        PropertyDefinition { key, value: None, .. } => {
            info.name = quote_property(name_of(ast, *key))
        }
        RestElement { argument } => info.name = name_of(ast, *argument),
        VariableDeclarator { id, init } => {
            info.node = init.unwrap_or(*id);
            info.name = ast.identifier_name(*id).unwrap_or("").to_string();
            info.node_type = None;
            if let Some(init) = init {
                info.node_type = type_of(*init);
                info.value = node_to_value(ast, *init);
            }
        }
        _ => {}
    }
    info
}

/// Property names that are not plain identifiers get quoted.
fn quote_property(name: String) -> String {
    if RE_SAFE_PROPERTY.is_match(&name) {
        name
    } else {
        format!("\"{}\"", name.replace('"', "\\\""))
    }
}

/// The kind a symbol has when no tag says otherwise.
pub fn code_to_kind(ast: &Ast, node_type: Option<&str>, node: Option<NodeIdx>) -> Kind {
    use NodeKind::*;

    let Some(node_type) = node_type else {
        return Kind::Member;
    };
    match node_type {
        "FunctionDeclaration" | "FunctionExpression" | "ArrowFunctionExpression" => {
            return Kind::Function
        }
        "MethodDefinition" => {
            return match node.map(|n| ast.kind(n)) {
                Some(MethodDefinition {
                    kind: MethodKind::Constructor,
                    ..
                }) => Kind::Class,
                Some(MethodDefinition {
                    kind: MethodKind::Get | MethodKind::Set,
                    ..
                }) => Kind::Member,
                _ => Kind::Function,
            };
        }
        "ClassDeclaration" | "ClassExpression" => return Kind::Class,
        _ => {}
    }

    let Some(node) = node else {
        return Kind::Member;
    };
    let inner = match (node_type, ast.kind(node)) {
        ("ExportAllDeclaration", ExportAllDeclaration { source, .. }) => Some(Some(*source)),
        ("ExportDefaultDeclaration", ExportDefaultDeclaration { declaration }) => {
            Some(Some(*declaration))
        }
        ("ExportNamedDeclaration", ExportNamedDeclaration { declaration, .. }) => {
            Some(*declaration)
        }
        ("ExportSpecifier", ExportSpecifier { local, .. }) => Some(Some(*local)),
        _ => None,
    };
    match inner {
        Some(inner) => {
            let inner_type = inner.map(|n| ast.kind(n).type_name());
            code_to_kind(ast, inner_type, inner)
        }
        None if ast.parent(node).is_some_and(|p| is_function_node(ast, p)) => Kind::Param,
        None => Kind::Member,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::parse;
    use crate::context::NodeIdSeq;
    use crate::walker;
    use serde_json::json;

    fn tree(src: &str) -> Ast {
        let mut ast = parse(src, "test.js").unwrap();
        walker::collect(&mut ast, &mut NodeIdSeq::default());
        ast
    }

    fn first(ast: &Ast, type_name: &str) -> NodeIdx {
        (0..ast.nodes.len() as u32)
            .map(NodeIdx)
            .find(|&n| ast.kind(n).type_name() == type_name)
            .unwrap()
    }

    #[test]
    fn member_chains_and_computed_access() {
        let ast = tree("a.b.c = 1; x['y'] = 2;");
        let assignments: Vec<_> = (0..ast.nodes.len() as u32)
            .map(NodeIdx)
            .filter(|&n| ast.kind(n).type_name() == "AssignmentExpression")
            .collect();
        assert_eq!(get_info(&ast, assignments[0]).name, "a.b.c");
        assert_eq!(get_info(&ast, assignments[1]).name, "x['y']");
    }

    #[test]
    fn literal_collections_render_as_json() {
        let ast = tree("var a = [1, 'two', null];");
        assert_eq!(
            node_to_value(&ast, first(&ast, "ArrayExpression")),
            Some(json!("[1,\"two\",null]"))
        );
        let ast = tree("var o = {b: 2, a: 'x', f: function() {}};");
        assert_eq!(
            node_to_value(&ast, first(&ast, "ObjectExpression")),
            Some(json!("{\"b\":2,\"a\":\"x\",\"f\":\"\"}"))
        );
    }

    #[test]
    fn negative_numbers_are_cast() {
        let ast = tree("var n = -1;");
        assert_eq!(node_to_value(&ast, first(&ast, "UnaryExpression")), Some(json!(-1)));
    }

    #[test]
    fn method_names_follow_class() {
        let ast = tree("class Foo { constructor(a) {} bar(b, c) {} static make() {} }");
        let methods: Vec<_> = (0..ast.nodes.len() as u32)
            .map(NodeIdx)
            .filter(|&n| ast.kind(n).type_name() == "MethodDefinition")
            .map(|n| name_of(&ast, n))
            .collect();
        assert_eq!(methods, vec!["Foo", "Foo#bar", "Foo.make"]);
    }

    #[test]
    fn default_export_class_methods() {
        let ast = tree("export default class { constructor() {} run() {} }");
        let methods: Vec<_> = (0..ast.nodes.len() as u32)
            .map(NodeIdx)
            .filter(|&n| ast.kind(n).type_name() == "MethodDefinition")
            .map(|n| name_of(&ast, n))
            .collect();
        assert_eq!(methods, vec!["module.exports", "run"]);
    }

    #[test]
    fn assignment_info_describes_right_side() {
        let ast = tree("exports.bar = function(a, b = 1, ...rest) {};");
        let info = get_info(&ast, first(&ast, "AssignmentExpression"));
        assert_eq!(info.name, "exports.bar");
        assert_eq!(info.node_type.as_deref(), Some("FunctionExpression"));
        assert_eq!(info.paramnames, vec!["a", "b", "rest"]);
        assert_eq!(code_to_kind(&ast, info.node_type.as_deref(), Some(info.node)), Kind::Function);
    }

    #[test]
    fn class_info_takes_constructor_params() {
        let ast = tree("class Foo { constructor(x, y) {} }");
        let info = get_info(&ast, first(&ast, "ClassDeclaration"));
        assert_eq!(info.name, "Foo");
        assert_eq!(info.paramnames, vec!["x", "y"]);
    }

    #[test]
    fn declarator_without_init_points_at_id() {
        let ast = tree("let count;");
        let declarator = first(&ast, "VariableDeclarator");
        let info = get_info(&ast, declarator);
        assert_eq!(info.name, "count");
        assert_eq!(info.node_type, None);
        assert_eq!(ast.kind(info.node).type_name(), "Identifier");
    }

    #[test]
    fn const_exports_are_constants() {
        let ast = tree("export const LIMIT = 10;");
        let info = get_info(&ast, first(&ast, "ExportNamedDeclaration"));
        assert_eq!(info.name, "exports.LIMIT");
        assert_eq!(info.kind, Some(Kind::Constant));
    }

    #[test]
    fn unsafe_property_names_are_quoted() {
        let ast = tree("var o = {'data-id': 1, plain: 2};");
        let props: Vec<_> = (0..ast.nodes.len() as u32)
            .map(NodeIdx)
            .filter(|&n| ast.kind(n).type_name() == "Property")
            .map(|n| get_info(&ast, n).name)
            .collect();
        assert_eq!(props, vec!["\"data-id\"", "plain"]);
    }

    #[test]
    fn params_are_params() {
        let ast = tree("function f(a) {}");
        let param = (0..ast.nodes.len() as u32)
            .map(NodeIdx)
            .find(|&n| ast.identifier_name(n) == Some("a"))
            .unwrap();
        assert_eq!(code_to_kind(&ast, Some("Identifier"), Some(param)), Kind::Param);
    }

    #[test]
    fn basename_takes_leading_identifier() {
        assert_eq!(basename("foo.bar[0]"), "foo");
        assert_eq!(basename("$el"), "$el");
        assert_eq!(basename("this.x"), "this");
        assert_eq!(basename("'quoted'"), "'quoted'");
    }
}
