//! ESTree-shaped syntax tree stored in an arena.
//!
//! Nodes are addressed by [`NodeIdx`] and carry the annotations the walker
//! and comment attacher add: a run-unique `node_id`, the `parent` link, the
//! `enclosing_scope`, and the doc comments attached before or after the node.

pub mod build;

use serde::Serialize;

/// Byte offsets `[start, end)` into the pretreated source.
pub type Range = [usize; 2];

/// Arena index of a node within one file's [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIdx(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LitValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    RegExp(String),
}

/// Every construct the tree can hold. The set is closed: the adapter
/// rejects anything it cannot map onto one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Program { body: Vec<NodeIdx> },

    // -- Statements --
    ExpressionStatement { expression: NodeIdx },
    BlockStatement { body: Vec<NodeIdx> },
    EmptyStatement,
    DebuggerStatement,
    ReturnStatement { argument: Option<NodeIdx> },
    ThrowStatement { argument: NodeIdx },
    BreakStatement { label: Option<NodeIdx> },
    ContinueStatement { label: Option<NodeIdx> },
    LabeledStatement { label: NodeIdx, body: NodeIdx },
    IfStatement { test: NodeIdx, consequent: NodeIdx, alternate: Option<NodeIdx> },
    SwitchStatement { discriminant: NodeIdx, cases: Vec<NodeIdx> },
    SwitchCase { test: Option<NodeIdx>, consequent: Vec<NodeIdx> },
    WhileStatement { test: NodeIdx, body: NodeIdx },
    DoWhileStatement { body: NodeIdx, test: NodeIdx },
    ForStatement {
        init: Option<NodeIdx>,
        test: Option<NodeIdx>,
        update: Option<NodeIdx>,
        body: NodeIdx,
    },
    ForInStatement { left: NodeIdx, right: NodeIdx, body: NodeIdx },
    ForOfStatement { left: NodeIdx, right: NodeIdx, body: NodeIdx },
    TryStatement {
        block: NodeIdx,
        handler: Option<NodeIdx>,
        finalizer: Option<NodeIdx>,
    },
    CatchClause { param: Option<NodeIdx>, body: NodeIdx },
    WithStatement { object: NodeIdx, body: NodeIdx },

    // -- Declarations --
    VariableDeclaration { kind: VarKind, declarations: Vec<NodeIdx> },
    VariableDeclarator { id: NodeIdx, init: Option<NodeIdx> },
    FunctionDeclaration {
        id: Option<NodeIdx>,
        params: Vec<NodeIdx>,
        body: NodeIdx,
        generator: bool,
        is_async: bool,
    },
    ClassDeclaration {
        id: Option<NodeIdx>,
        super_class: Option<NodeIdx>,
        body: NodeIdx,
    },
    ClassBody { body: Vec<NodeIdx> },
    MethodDefinition {
        key: NodeIdx,
        value: NodeIdx,
        kind: MethodKind,
        computed: bool,
        is_static: bool,
    },
    PropertyDefinition {
        key: NodeIdx,
        value: Option<NodeIdx>,
        computed: bool,
        is_static: bool,
    },
    StaticBlock { body: Vec<NodeIdx> },

    // -- Modules --
    ImportDeclaration { specifiers: Vec<NodeIdx>, source: NodeIdx },
    ImportSpecifier { imported: NodeIdx, local: NodeIdx },
    ImportDefaultSpecifier { local: NodeIdx },
    ImportNamespaceSpecifier { local: NodeIdx },
    ExportNamedDeclaration {
        declaration: Option<NodeIdx>,
        specifiers: Vec<NodeIdx>,
        source: Option<NodeIdx>,
    },
    ExportDefaultDeclaration { declaration: NodeIdx },
    ExportAllDeclaration { exported: Option<NodeIdx>, source: NodeIdx },
    ExportSpecifier { local: NodeIdx, exported: NodeIdx },

    // -- Expressions --
    Identifier { name: String },
    PrivateIdentifier { name: String },
    Literal { value: LitValue, raw: String },
    TemplateLiteral { expressions: Vec<NodeIdx> },
    TaggedTemplateExpression { tag: NodeIdx, quasi: NodeIdx },
    ThisExpression,
    Super,
    ArrayExpression { elements: Vec<Option<NodeIdx>> },
    ObjectExpression { properties: Vec<NodeIdx> },
    Property {
        key: NodeIdx,
        value: NodeIdx,
        kind: PropKind,
        computed: bool,
        shorthand: bool,
        method: bool,
    },
    SpreadElement { argument: NodeIdx },
    FunctionExpression {
        id: Option<NodeIdx>,
        params: Vec<NodeIdx>,
        body: NodeIdx,
        generator: bool,
        is_async: bool,
    },
    ArrowFunctionExpression {
        params: Vec<NodeIdx>,
        body: NodeIdx,
        is_async: bool,
        expression: bool,
    },
    ClassExpression {
        id: Option<NodeIdx>,
        super_class: Option<NodeIdx>,
        body: NodeIdx,
    },
    /// Always prefix; postfix unary operators do not exist in the grammar.
    UnaryExpression { operator: String, argument: NodeIdx },
    UpdateExpression { operator: String, argument: NodeIdx, prefix: bool },
    BinaryExpression { operator: String, left: NodeIdx, right: NodeIdx },
    LogicalExpression { operator: String, left: NodeIdx, right: NodeIdx },
    AssignmentExpression { operator: String, left: NodeIdx, right: NodeIdx },
    ConditionalExpression { test: NodeIdx, consequent: NodeIdx, alternate: NodeIdx },
    CallExpression { callee: NodeIdx, arguments: Vec<NodeIdx>, optional: bool },
    NewExpression { callee: NodeIdx, arguments: Vec<NodeIdx> },
    MemberExpression {
        object: NodeIdx,
        property: NodeIdx,
        computed: bool,
        optional: bool,
    },
    SequenceExpression { expressions: Vec<NodeIdx> },
    YieldExpression { argument: Option<NodeIdx>, delegate: bool },
    AwaitExpression { argument: NodeIdx },
    MetaProperty { meta: String, property: String },
    ImportExpression { source: NodeIdx },

    // -- Patterns --
    ObjectPattern { properties: Vec<NodeIdx> },
    ArrayPattern { elements: Vec<Option<NodeIdx>> },
    AssignmentPattern { left: NodeIdx, right: NodeIdx },
    RestElement { argument: NodeIdx },

    // -- JSX --
    JSXElement {
        opening: NodeIdx,
        children: Vec<NodeIdx>,
        closing: Option<NodeIdx>,
    },
    JSXOpeningElement { name: NodeIdx, attributes: Vec<NodeIdx>, self_closing: bool },
    JSXClosingElement { name: NodeIdx },
    JSXFragment { children: Vec<NodeIdx> },
    JSXAttribute { name: NodeIdx, value: Option<NodeIdx> },
    JSXSpreadAttribute { argument: NodeIdx },
    JSXExpressionContainer { expression: NodeIdx },
    JSXEmptyExpression,
    JSXText { value: String },
    JSXIdentifier { name: String },
    JSXNamespacedName { namespace: NodeIdx, name: NodeIdx },
    JSXMemberExpression { object: NodeIdx, property: NodeIdx },
}

impl NodeKind {
    /// The ESTree `type` string for this variant.
    pub fn type_name(&self) -> &'static str {
        use NodeKind::*;
        match self {
            Program { .. } => "Program",
            ExpressionStatement { .. } => "ExpressionStatement",
            BlockStatement { .. } => "BlockStatement",
            EmptyStatement => "EmptyStatement",
            DebuggerStatement => "DebuggerStatement",
            ReturnStatement { .. } => "ReturnStatement",
            ThrowStatement { .. } => "ThrowStatement",
            BreakStatement { .. } => "BreakStatement",
            ContinueStatement { .. } => "ContinueStatement",
            LabeledStatement { .. } => "LabeledStatement",
            IfStatement { .. } => "IfStatement",
            SwitchStatement { .. } => "SwitchStatement",
            SwitchCase { .. } => "SwitchCase",
            WhileStatement { .. } => "WhileStatement",
            DoWhileStatement { .. } => "DoWhileStatement",
            ForStatement { .. } => "ForStatement",
            ForInStatement { .. } => "ForInStatement",
            ForOfStatement { .. } => "ForOfStatement",
            TryStatement { .. } => "TryStatement",
            CatchClause { .. } => "CatchClause",
            WithStatement { .. } => "WithStatement",
            VariableDeclaration { .. } => "VariableDeclaration",
            VariableDeclarator { .. } => "VariableDeclarator",
            FunctionDeclaration { .. } => "FunctionDeclaration",
            ClassDeclaration { .. } => "ClassDeclaration",
            ClassBody { .. } => "ClassBody",
            MethodDefinition { .. } => "MethodDefinition",
            PropertyDefinition { .. } => "PropertyDefinition",
            StaticBlock { .. } => "StaticBlock",
            ImportDeclaration { .. } => "ImportDeclaration",
            ImportSpecifier { .. } => "ImportSpecifier",
            ImportDefaultSpecifier { .. } => "ImportDefaultSpecifier",
            ImportNamespaceSpecifier { .. } => "ImportNamespaceSpecifier",
            ExportNamedDeclaration { .. } => "ExportNamedDeclaration",
            ExportDefaultDeclaration { .. } => "ExportDefaultDeclaration",
            ExportAllDeclaration { .. } => "ExportAllDeclaration",
            ExportSpecifier { .. } => "ExportSpecifier",
            Identifier { .. } => "Identifier",
            PrivateIdentifier { .. } => "PrivateIdentifier",
            Literal { .. } => "Literal",
            TemplateLiteral { .. } => "TemplateLiteral",
            TaggedTemplateExpression { .. } => "TaggedTemplateExpression",
            ThisExpression => "ThisExpression",
            Super => "Super",
            ArrayExpression { .. } => "ArrayExpression",
            ObjectExpression { .. } => "ObjectExpression",
            Property { .. } => "Property",
            SpreadElement { .. } => "SpreadElement",
            FunctionExpression { .. } => "FunctionExpression",
            ArrowFunctionExpression { .. } => "ArrowFunctionExpression",
            ClassExpression { .. } => "ClassExpression",
            UnaryExpression { .. } => "UnaryExpression",
            UpdateExpression { .. } => "UpdateExpression",
            BinaryExpression { .. } => "BinaryExpression",
            LogicalExpression { .. } => "LogicalExpression",
            AssignmentExpression { .. } => "AssignmentExpression",
            ConditionalExpression { .. } => "ConditionalExpression",
            CallExpression { .. } => "CallExpression",
            NewExpression { .. } => "NewExpression",
            MemberExpression { .. } => "MemberExpression",
            SequenceExpression { .. } => "SequenceExpression",
            YieldExpression { .. } => "YieldExpression",
            AwaitExpression { .. } => "AwaitExpression",
            MetaProperty { .. } => "MetaProperty",
            ImportExpression { .. } => "ImportExpression",
            ObjectPattern { .. } => "ObjectPattern",
            ArrayPattern { .. } => "ArrayPattern",
            AssignmentPattern { .. } => "AssignmentPattern",
            RestElement { .. } => "RestElement",
            JSXElement { .. } => "JSXElement",
            JSXOpeningElement { .. } => "JSXOpeningElement",
            JSXClosingElement { .. } => "JSXClosingElement",
            JSXFragment { .. } => "JSXFragment",
            JSXAttribute { .. } => "JSXAttribute",
            JSXSpreadAttribute { .. } => "JSXSpreadAttribute",
            JSXExpressionContainer { .. } => "JSXExpressionContainer",
            JSXEmptyExpression => "JSXEmptyExpression",
            JSXText { .. } => "JSXText",
            JSXIdentifier { .. } => "JSXIdentifier",
            JSXNamespacedName { .. } => "JSXNamespacedName",
            JSXMemberExpression { .. } => "JSXMemberExpression",
        }
    }

    /// Function-like nodes. These open a new lexical scope.
    pub fn is_function(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDeclaration { .. }
                | NodeKind::FunctionExpression { .. }
                | NodeKind::MethodDefinition { .. }
                | NodeKind::ArrowFunctionExpression { .. }
        )
    }

    pub fn is_scope(&self) -> bool {
        self.is_function() || matches!(self, NodeKind::CatchClause { .. })
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            NodeKind::AssignmentExpression { .. } | NodeKind::VariableDeclarator { .. }
        )
    }

    pub fn is_accessor(&self) -> bool {
        matches!(
            self,
            NodeKind::Property {
                kind: PropKind::Get | PropKind::Set,
                ..
            } | NodeKind::MethodDefinition {
                kind: MethodKind::Get | MethodKind::Set,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub range: Range,
    /// 1-based line of the node's first character.
    pub line: usize,
    pub column: usize,
    pub node_id: Option<u64>,
    pub parent: Option<NodeIdx>,
    pub enclosing_scope: Option<NodeIdx>,
    /// Indexes into [`Ast::comments`].
    pub leading_comments: Vec<usize>,
    pub trailing_comments: Vec<usize>,
}

/// A block comment, including its `/*` and `*/` delimiters.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub raw: String,
    pub range: Range,
    pub line: usize,
}

impl Comment {
    /// Doc comments open with `/**`.
    pub fn is_doc(&self) -> bool {
        self.raw.starts_with("/**")
    }
}

/// A lexical token. Only positions matter to the comment attacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub range: Range,
}

/// One parsed file: the node arena plus the comment and token streams,
/// both ordered by position.
#[derive(Debug, Clone)]
pub struct Ast {
    pub source: String,
    pub nodes: Vec<Node>,
    pub root: NodeIdx,
    pub comments: Vec<Comment>,
    pub tokens: Vec<Token>,
}

impl Ast {
    pub fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.0 as usize]
    }

    pub fn node_mut(&mut self, idx: NodeIdx) -> &mut Node {
        &mut self.nodes[idx.0 as usize]
    }

    pub fn kind(&self, idx: NodeIdx) -> &NodeKind {
        &self.node(idx).kind
    }

    pub fn parent(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.node(idx).parent
    }

    pub fn enclosing_scope(&self, idx: NodeIdx) -> Option<NodeIdx> {
        self.node(idx).enclosing_scope
    }

    /// Source text covered by a node.
    pub fn text(&self, idx: NodeIdx) -> &str {
        let [start, end] = self.node(idx).range;
        self.source.get(start..end).unwrap_or("")
    }

    /// Raw text of the first leading comment, if any.
    pub fn leading_comment(&self, idx: NodeIdx) -> Option<&Comment> {
        self.node(idx)
            .leading_comments
            .first()
            .map(|&c| &self.comments[c])
    }

    /// Identifier name, when the node is a plain identifier.
    pub fn identifier_name(&self, idx: NodeIdx) -> Option<&str> {
        match self.kind(idx) {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Parameters of a function-like node, looking through a method's value.
    pub fn function_params(&self, idx: NodeIdx) -> &[NodeIdx] {
        match self.kind(idx) {
            NodeKind::FunctionDeclaration { params, .. }
            | NodeKind::FunctionExpression { params, .. }
            | NodeKind::ArrowFunctionExpression { params, .. } => params,
            NodeKind::MethodDefinition { value, .. } => self.function_params(*value),
            _ => &[],
        }
    }

    /// Move all comments attached to `source` onto `target`.
    pub fn move_comments(&mut self, source: NodeIdx, target: NodeIdx) {
        if source == target {
            return;
        }
        let leading = std::mem::take(&mut self.node_mut(source).leading_comments);
        let trailing = std::mem::take(&mut self.node_mut(source).trailing_comments);
        let target = self.node_mut(target);
        target.leading_comments.extend(leading);
        target.trailing_comments.extend(trailing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_definition_is_function_and_scope() {
        let kind = NodeKind::MethodDefinition {
            key: NodeIdx(0),
            value: NodeIdx(1),
            kind: MethodKind::Method,
            computed: false,
            is_static: false,
        };
        assert!(kind.is_function());
        assert!(kind.is_scope());
        assert!(!kind.is_accessor());
    }

    #[test]
    fn catch_clause_is_scope_but_not_function() {
        let kind = NodeKind::CatchClause {
            param: None,
            body: NodeIdx(0),
        };
        assert!(kind.is_scope());
        assert!(!kind.is_function());
    }

    #[test]
    fn getter_property_is_accessor() {
        let kind = NodeKind::Property {
            key: NodeIdx(0),
            value: NodeIdx(1),
            kind: PropKind::Get,
            computed: false,
            shorthand: false,
            method: false,
        };
        assert!(kind.is_accessor());
        assert_eq!(kind.type_name(), "Property");
    }
}
