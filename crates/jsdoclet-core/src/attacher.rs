//! Single-pass doc-comment attachment.
//!
//! Comments are not part of the tree, so each doc comment is assigned to the
//! node it most plausibly documents by comparing source positions of nodes,
//! comments and tokens as the walker goes by.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::ast::{Ast, NodeIdx, NodeKind, Range};
use crate::walker::{Flow, Visitor};

pub struct CommentAttacher {
    /// Unconsumed doc comments, as indexes into `Ast::comments`.
    comments: VecDeque<usize>,
    tokens: Vec<Range>,
    token_index: usize,
    previous_node: Option<NodeIdx>,
    ast_root: Option<NodeIdx>,
    pending: Vec<usize>,
    candidates: Vec<NodeIdx>,
}

/// Node kinds that may carry a leading doc comment.
fn accepts_leading_comments(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::ArrowFunctionExpression { .. }
            | NodeKind::AssignmentExpression { .. }
            | NodeKind::CallExpression { .. }
            | NodeKind::ClassDeclaration { .. }
            | NodeKind::ClassExpression { .. }
            | NodeKind::ExportAllDeclaration { .. }
            | NodeKind::ExportDefaultDeclaration { .. }
            | NodeKind::ExportNamedDeclaration { .. }
            | NodeKind::ExportSpecifier { .. }
            | NodeKind::FunctionDeclaration { .. }
            | NodeKind::FunctionExpression { .. }
            | NodeKind::MemberExpression { .. }
            | NodeKind::MethodDefinition { .. }
            | NodeKind::PropertyDefinition { .. }
            | NodeKind::Property { .. }
            | NodeKind::TryStatement { .. }
            | NodeKind::VariableDeclaration { .. }
            | NodeKind::VariableDeclarator { .. }
            | NodeKind::WithStatement { .. }
    )
}

/// Index of the last entry at or after `start` whose end is at or before
/// `position`. Returns `start` when none qualifies.
fn next_index_before(ends: impl Iterator<Item = usize>, start: usize, position: usize) -> usize {
    let mut new_index = start;
    for (i, end) in ends.enumerate().skip(start) {
        if end <= position {
            new_index = i;
        } else {
            break;
        }
    }
    new_index
}

#[derive(Clone, Copy, PartialEq)]
enum AtomKind {
    Node,
    Comment,
    Token,
}

#[derive(Clone, Copy)]
struct Atom {
    kind: AtomKind,
    range: Range,
}

fn is_before(a: Range, b: Range) -> bool {
    a[1] <= b[0]
}

fn is_within(inner: Range, outer: Range) -> bool {
    inner[0] >= outer[0] && inner[1] <= outer[1]
}

/// Ends-before sorts first, then the container, then the earlier start.
/// Otherwise differing ranges put `b` first.
fn atom_order(a: &Atom, b: &Atom) -> Ordering {
    if is_before(a.range, b.range) || is_within(b.range, a.range) || a.range[0] < b.range[0] {
        Ordering::Less
    } else if a.range != b.range {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl CommentAttacher {
    pub fn new(ast: &Ast) -> Self {
        let comments = ast
            .comments
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_doc())
            .map(|(i, _)| i)
            .collect();
        Self {
            comments,
            tokens: ast.tokens.iter().map(|t| t.range).collect(),
            token_index: 0,
            previous_node: None,
            ast_root: None,
            pending: Vec::new(),
            candidates: Vec::new(),
        }
    }

    fn advance_token_index(&mut self, position: usize) {
        let ends = self.tokens.iter().map(|t| t[1]);
        self.token_index = next_index_before(ends, self.token_index, position);
    }

    /// Move comments that can no longer attach to anything ahead into
    /// `pending`, leaving the last one for the eligibility check.
    fn fast_forward(&mut self, ast: &Ast, position: usize) {
        let ends: Vec<usize> = self.comments.iter().map(|&c| ast.comments[c].range[1]).collect();
        let comment_index = next_index_before(ends.into_iter(), 0, position);
        if comment_index > 0 {
            self.pending.extend(self.comments.drain(..comment_index));
        }
    }

    fn is_eligible(&self, ast: &Ast, node: NodeIdx) -> bool {
        let Some(&comment) = self.comments.front() else {
            return false;
        };
        let mut atoms = vec![
            Atom {
                kind: AtomKind::Node,
                range: ast.node(node).range,
            },
            Atom {
                kind: AtomKind::Comment,
                range: ast.comments[comment].range,
            },
        ];
        if let Some(&token) = self.tokens.get(self.token_index) {
            atoms.push(Atom {
                kind: AtomKind::Token,
                range: token,
            });
        }
        insertion_sort(&mut atoms);

        let position = |kind| atoms.iter().position(|a| a.kind == kind);
        match (position(AtomKind::Node), position(AtomKind::Comment)) {
            (Some(n), Some(c)) => n == c + 1,
            _ => false,
        }
    }

    fn attach_pending(&mut self, ast: &mut Ast, current: Option<NodeIdx>) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        if let Some(&target) = self.candidates.last() {
            ast.node_mut(target).leading_comments.extend(pending);
        } else if self.previous_node.is_none() {
            let root = self.ast_root.unwrap_or(ast.root);
            ast.node_mut(root).leading_comments.extend(pending);
        } else if let Some(target) = current.or(self.previous_node) {
            ast.node_mut(target).trailing_comments.extend(pending);
        }
        self.previous_node = current;
        self.candidates.clear();
    }

    /// Attach every comment still waiting. Call once the walk is over.
    pub fn finish(&mut self, ast: &mut Ast) {
        self.pending.extend(self.comments.drain(..));
        self.attach_pending(ast, None);
    }
}

/// Stable insertion sort; the ordering is not guaranteed to be total.
fn insertion_sort(atoms: &mut [Atom]) {
    for i in 1..atoms.len() {
        let mut j = i;
        while j > 0 && atom_order(&atoms[j - 1], &atoms[j]) == Ordering::Greater {
            atoms.swap(j - 1, j);
            j -= 1;
        }
    }
}

impl Visitor for CommentAttacher {
    fn visit(&mut self, ast: &mut Ast, node: NodeIdx) -> Flow {
        if self.comments.is_empty() {
            return Flow::Stop;
        }
        if self.ast_root.is_none() {
            self.ast_root = Some(node);
        }

        let start = ast.node(node).range[0];
        self.advance_token_index(start);
        self.fast_forward(ast, start);
        let eligible = self.is_eligible(ast, node);

        self.attach_pending(ast, Some(node));

        if eligible && accepts_leading_comments(ast.kind(node)) {
            self.candidates.push(node);
            if let Some(comment) = self.comments.pop_front() {
                self.pending.push(comment);
            }
        }
        Flow::Continue
    }
}

/// Run the attach pass over a freshly built tree.
pub fn attach_comments(ast: &mut Ast, ids: &mut crate::context::NodeIdSeq) {
    let mut attacher = CommentAttacher::new(ast);
    crate::walker::walk(ast, ids, &mut attacher);
    attacher.finish(ast);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::parse;
    use crate::context::NodeIdSeq;

    fn attached(src: &str) -> Ast {
        let mut ast = parse(src, "a.js").unwrap();
        attach_comments(&mut ast, &mut NodeIdSeq::default());
        ast
    }

    fn total_attached(ast: &Ast) -> usize {
        ast.nodes
            .iter()
            .map(|n| n.leading_comments.len() + n.trailing_comments.len())
            .sum()
    }

    fn holder_of(ast: &Ast, comment: usize) -> &'static str {
        ast.nodes
            .iter()
            .find(|n| n.leading_comments.contains(&comment))
            .map(|n| n.kind.type_name())
            .unwrap_or("none")
    }

    #[test]
    fn leading_comment_on_function() {
        let ast = attached("/** Does things. */\nfunction foo() {}");
        assert_eq!(holder_of(&ast, 0), "FunctionDeclaration");
    }

    #[test]
    fn leading_comment_on_assignment() {
        let ast = attached("/** Bar. */\nexports.bar = function () {};");
        assert_eq!(holder_of(&ast, 0), "AssignmentExpression");
    }

    #[test]
    fn plain_block_comments_are_ignored() {
        let ast = attached("/* not doc */\nfunction foo() {}");
        assert_eq!(total_attached(&ast), 0);
    }

    #[test]
    fn every_doc_comment_attached_once() {
        let src = concat!(
            "/** a */\nvar a = 1;\n",
            "/** b */\nfunction b() {\n  /** inner */\n  var c;\n}\n",
            "/** dangling */\n",
        );
        let ast = attached(src);
        let docs = ast.comments.iter().filter(|c| c.is_doc()).count();
        assert_eq!(docs, 4);
        assert_eq!(total_attached(&ast), docs);
    }

    #[test]
    fn comment_only_file_goes_to_root() {
        let ast = attached("/** @module foo */\n");
        assert_eq!(ast.node(ast.root).leading_comments, vec![0]);
    }

    #[test]
    fn method_comment_attaches_to_method() {
        let ast = attached("class A {\n  /** Run it. */\n  run() {}\n}");
        assert_eq!(holder_of(&ast, 0), "MethodDefinition");
    }

    #[test]
    fn next_index_before_stops_at_first_later_end() {
        assert_eq!(next_index_before([3, 5, 9].into_iter(), 0, 6), 1);
        assert_eq!(next_index_before([8, 9].into_iter(), 0, 6), 0);
    }
}
