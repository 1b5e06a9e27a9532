//! Pre-order traversal over the syntax tree.
//!
//! Traversal runs in two steps. The tree is first flattened into visit order,
//! annotating every node with its id, parent and enclosing scope and moving
//! comments where a construct documents a different node than the one the
//! attacher chose. Then the visitor sees each node in order and may stop early.

use crate::ast::{Ast, NodeIdx, NodeKind};
use crate::context::NodeIdSeq;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub trait Visitor {
    fn visit(&mut self, ast: &mut Ast, node: NodeIdx) -> Flow;
}

/// Walk the whole tree, feeding each node to `visitor` in pre-order.
pub fn walk<V: Visitor + ?Sized>(ast: &mut Ast, ids: &mut NodeIdSeq, visitor: &mut V) {
    for node in collect(ast, ids) {
        if visitor.visit(ast, node) == Flow::Stop {
            break;
        }
    }
}

/// Flatten the tree into pre-order, annotating nodes on the way down.
pub fn collect(ast: &mut Ast, ids: &mut NodeIdSeq) -> Vec<NodeIdx> {
    let mut order = Vec::with_capacity(ast.nodes.len());
    // (node, parent, innermost open scope)
    let mut stack: Vec<(NodeIdx, Option<NodeIdx>, Option<NodeIdx>)> = vec![(ast.root, None, None)];

    while let Some((idx, parent, scope)) = stack.pop() {
        let node = ast.node_mut(idx);
        if node.node_id.is_none() {
            node.node_id = Some(ids.next_id());
        }
        if node.parent.is_none() {
            node.parent = parent;
        }
        if node.enclosing_scope.is_none() {
            node.enclosing_scope = scope;
        }
        let child_scope = if node.kind.is_scope() { Some(idx) } else { scope };
        order.push(idx);

        let kids = children(ast, idx);
        for &child in kids.iter().rev() {
            stack.push((child, Some(idx), child_scope));
        }
    }
    order
}

/// Children to recurse into, in source order. Some constructs also move
/// their comments onto the node that actually carries the documentation.
pub fn children(ast: &mut Ast, idx: NodeIdx) -> Vec<NodeIdx> {
    use NodeKind::*;

    let opt = |o: &Option<NodeIdx>| o.iter().copied().collect::<Vec<_>>();

    match ast.kind(idx).clone() {
        Program { body }
        | BlockStatement { body }
        | ClassBody { body }
        | StaticBlock { body } => body,

        ExpressionStatement { expression } => vec![expression],
        EmptyStatement
        | DebuggerStatement
        | BreakStatement { .. }
        | ContinueStatement { .. } => Vec::new(),
        ReturnStatement { argument } => opt(&argument),
        ThrowStatement { argument } => vec![argument],
        LabeledStatement { body, .. } => vec![body],
        IfStatement {
            test,
            consequent,
            alternate,
        } => {
            let mut out = vec![test, consequent];
            out.extend(alternate);
            out
        }
        SwitchStatement { discriminant, cases } => {
            let mut out = vec![discriminant];
            out.extend(cases);
            out
        }
        SwitchCase { test, consequent } => {
            let mut out = opt(&test);
            out.extend(consequent);
            out
        }
        WhileStatement { test, body } | DoWhileStatement { body, test } => vec![test, body],
        ForStatement {
            init,
            test,
            update,
            body,
        } => {
            let mut out: Vec<NodeIdx> = [init, test, update].into_iter().flatten().collect();
            out.push(body);
            out
        }
        ForInStatement { left, right, body } | ForOfStatement { left, right, body } => {
            vec![left, right, body]
        }
        // The catch clause itself is never entered; only its body is.
        TryStatement {
            block,
            handler,
            finalizer,
        } => {
            let mut out = vec![block];
            if let Some(handler) = handler {
                if let CatchClause { body, .. } = ast.kind(handler) {
                    out.push(*body);
                }
            }
            out.extend(finalizer);
            out
        }
        CatchClause { .. } => Vec::new(),
        WithStatement { object, body } => vec![object, body],

        VariableDeclaration { declarations, .. } => {
            if let Some(&first) = declarations.first() {
                ast.move_comments(idx, first);
            }
            declarations
        }
        VariableDeclarator { id, init } => {
            let mut out = vec![id];
            out.extend(init);
            out
        }
        FunctionDeclaration { id, params, body, .. }
        | FunctionExpression { id, params, body, .. } => {
            let mut out = opt(&id);
            out.extend(params);
            out.push(body);
            out
        }
        ArrowFunctionExpression { params, body, .. } => {
            let mut out = params;
            out.push(body);
            out
        }
        ClassDeclaration {
            id,
            super_class,
            body,
        }
        | ClassExpression {
            id,
            super_class,
            body,
        } => {
            let mut out = opt(&id);
            out.extend(super_class);
            out.push(body);
            out
        }
        MethodDefinition { key, value, .. } => vec![key, value],
        PropertyDefinition { key, value, .. } => {
            let mut out = vec![key];
            out.extend(value);
            out
        }

        ImportDeclaration { specifiers, source } => {
            let mut out = specifiers;
            out.push(source);
            out
        }
        ImportSpecifier { local, .. }
        | ImportDefaultSpecifier { local }
        | ImportNamespaceSpecifier { local } => vec![local],
        ExportNamedDeclaration {
            declaration,
            specifiers,
            source,
        } => {
            let mut out = opt(&declaration);
            out.extend(specifiers);
            out.extend(source);
            out
        }
        ExportDefaultDeclaration { declaration } => {
            if matches!(ast.kind(declaration), ClassDeclaration { .. }) {
                ast.move_comments(idx, declaration);
            }
            vec![declaration]
        }
        ExportAllDeclaration { source, .. } => vec![source],
        ExportSpecifier { local, exported } => {
            if local == exported {
                vec![local]
            } else {
                vec![exported, local]
            }
        }

        Identifier { .. }
        | PrivateIdentifier { .. }
        | Literal { .. }
        | ThisExpression
        | Super
        | MetaProperty { .. } => Vec::new(),
        TemplateLiteral { expressions } => expressions,
        TaggedTemplateExpression { tag, quasi } => vec![tag, quasi],
        ArrayExpression { elements } => elements.into_iter().flatten().collect(),
        ObjectExpression { properties } | ObjectPattern { properties } => properties,
        // Only the value is walked; the key's comments belong to the property.
        Property { key, value, .. } => {
            ast.move_comments(key, idx);
            vec![value]
        }
        SpreadElement { argument }
        | RestElement { argument }
        | UnaryExpression { argument, .. }
        | UpdateExpression { argument, .. }
        | AwaitExpression { argument } => vec![argument],
        YieldExpression { argument, .. } => opt(&argument),
        BinaryExpression { left, right, .. }
        | LogicalExpression { left, right, .. }
        | AssignmentExpression { left, right, .. }
        | AssignmentPattern { left, right } => vec![left, right],
        ConditionalExpression {
            test,
            consequent,
            alternate,
        } => vec![test, consequent, alternate],
        CallExpression { callee, arguments, .. } | NewExpression { callee, arguments } => {
            let mut out = vec![callee];
            out.extend(arguments);
            out
        }
        ImportExpression { source } => vec![source],
        MemberExpression { object, property, .. } => vec![object, property],
        SequenceExpression { expressions } => expressions,
        // Plain identifiers in array patterns are not walked.
        ArrayPattern { elements } => elements
            .into_iter()
            .flatten()
            .filter(|&e| !matches!(ast.kind(e), Identifier { .. }))
            .collect(),

        JSXElement {
            opening,
            children,
            closing,
        } => {
            let mut out = vec![opening];
            out.extend(closing);
            out.extend(children);
            out
        }
        JSXOpeningElement { name, attributes, .. } => {
            let mut out = vec![name];
            out.extend(attributes);
            out
        }
        JSXClosingElement { name } => vec![name],
        JSXFragment { children } => children,
        JSXAttribute { name, value } => {
            let mut out = vec![name];
            out.extend(value);
            out
        }
        JSXSpreadAttribute { argument } => vec![argument],
        JSXExpressionContainer { expression } => vec![expression],
        JSXEmptyExpression | JSXText { .. } | JSXIdentifier { .. } => Vec::new(),
        JSXNamespacedName { namespace, name } => vec![namespace, name],
        JSXMemberExpression { object, property } => vec![object, property],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::parse;

    struct Recorder(Vec<&'static str>);

    impl Visitor for Recorder {
        fn visit(&mut self, ast: &mut Ast, node: NodeIdx) -> Flow {
            self.0.push(ast.kind(node).type_name());
            Flow::Continue
        }
    }

    struct StopAfter(usize);

    impl Visitor for StopAfter {
        fn visit(&mut self, _: &mut Ast, _: NodeIdx) -> Flow {
            if self.0 == 0 {
                return Flow::Stop;
            }
            self.0 -= 1;
            Flow::Continue
        }
    }

    #[test]
    fn visits_in_pre_order() {
        let mut ast = parse("var a = b;", "a.js").unwrap();
        let mut rec = Recorder(Vec::new());
        walk(&mut ast, &mut NodeIdSeq::default(), &mut rec);
        assert_eq!(
            rec.0,
            vec!["Program", "VariableDeclaration", "VariableDeclarator", "Identifier", "Identifier"]
        );
    }

    #[test]
    fn assigns_ids_once_and_sets_scopes() {
        let mut ast = parse("function f(a) { return a; }", "a.js").unwrap();
        let mut ids = NodeIdSeq::default();
        let first = collect(&mut ast, &mut ids);
        let id_of_root = ast.node(ast.root).node_id;
        collect(&mut ast, &mut ids);
        assert_eq!(ast.node(ast.root).node_id, id_of_root);

        let func = first
            .iter()
            .copied()
            .find(|&n| matches!(ast.kind(n), NodeKind::FunctionDeclaration { .. }))
            .unwrap();
        let ret = first
            .iter()
            .copied()
            .find(|&n| matches!(ast.kind(n), NodeKind::ReturnStatement { .. }))
            .unwrap();
        assert_eq!(ast.enclosing_scope(ret), Some(func));
        assert_eq!(ast.enclosing_scope(func), None);
        assert_eq!(ast.parent(ast.root), None);
    }

    #[test]
    fn ids_are_unique_across_files() {
        let mut ids = NodeIdSeq::default();
        let mut a = parse("var a;", "a.js").unwrap();
        let mut b = parse("var b;", "b.js").unwrap();
        collect(&mut a, &mut ids);
        collect(&mut b, &mut ids);
        let max_a = a.nodes.iter().filter_map(|n| n.node_id).max().unwrap();
        let min_b = b.nodes.iter().filter_map(|n| n.node_id).min().unwrap();
        assert!(min_b > max_a);
    }

    #[test]
    fn stop_ends_traversal() {
        let mut ast = parse("var a = 1; var b = 2;", "a.js").unwrap();
        let mut stop = StopAfter(2);
        walk(&mut ast, &mut NodeIdSeq::default(), &mut stop);
        assert_eq!(stop.0, 0);
    }

    #[test]
    fn try_statement_skips_catch_clause_node() {
        let mut ast = parse("try { a(); } catch (e) { b(); }", "a.js").unwrap();
        let mut rec = Recorder(Vec::new());
        walk(&mut ast, &mut NodeIdSeq::default(), &mut rec);
        assert!(!rec.0.contains(&"CatchClause"));
        assert_eq!(rec.0.iter().filter(|k| **k == "CallExpression").count(), 2);
    }
}
