//! Closure/JSDoc type expressions: a permissive recursive-descent parser,
//! a stringifier, and the flattening used for doclet `type` lists.

use std::fmt::Write as _;

/// A parsed type expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub kind: TypeKind,
    /// `T=`
    pub optional: Option<bool>,
    /// `?T` is nullable, `!T` is not.
    pub nullable: Option<bool>,
    /// `...T`
    pub repeatable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// `*`
    All,
    /// A bare `?`
    Unknown,
    Null,
    Undefined,
    Name(String),
    Union(Vec<TypeNode>),
    Application { base: Box<TypeNode>, args: Vec<TypeNode> },
    Record(Vec<(String, Option<TypeNode>)>),
    Function {
        params: Vec<TypeNode>,
        result: Option<Box<TypeNode>>,
        this: Option<Box<TypeNode>>,
        new: Option<Box<TypeNode>>,
    },
}

impl TypeNode {
    fn new(kind: TypeKind) -> Self {
        TypeNode {
            kind,
            optional: None,
            nullable: None,
            repeatable: None,
        }
    }

    fn name(name: &str) -> Self {
        TypeNode::new(TypeKind::Name(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {position}")]
pub struct TypeError {
    pub message: String,
    pub position: usize,
}

/// The type-grammar collaborator.
pub trait TypeGrammar {
    fn parse(&self, expression: &str) -> Result<TypeNode, TypeError>;
    fn stringify(&self, node: &TypeNode) -> String;
}

/// Accepts Closure Compiler syntax plus the looser forms JSDoc allows:
/// unparenthesised unions, `Array<T>` without the dot, `T[]`, and
/// postfix `?`/`!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Permissive;

impl TypeGrammar for Permissive {
    fn parse(&self, expression: &str) -> Result<TypeNode, TypeError> {
        let mut p = Parser {
            chars: expression.chars().collect(),
            pos: 0,
        };
        let node = p.parse_top()?;
        p.skip_ws();
        if p.pos < p.chars.len() {
            return Err(p.error(format!("unexpected `{}`", p.chars[p.pos])));
        }
        Ok(node)
    }

    fn stringify(&self, node: &TypeNode) -> String {
        let mut out = String::new();
        write_node(&mut out, node);
        out
    }
}

/// Flatten a parsed type into the canonical list of type names.
pub fn flatten(grammar: &dyn TypeGrammar, node: &TypeNode) -> Vec<String> {
    type_strings(grammar, node, true)
}

fn type_strings(grammar: &dyn TypeGrammar, node: &TypeNode, outermost: bool) -> Vec<String> {
    match &node.kind {
        TypeKind::All => vec!["*".into()],
        TypeKind::Unknown => vec!["?".into()],
        TypeKind::Null => vec!["null".into()],
        TypeKind::Undefined => vec!["undefined".into()],
        TypeKind::Name(name) => vec![name.clone()],
        TypeKind::Record(_) => vec!["Object".into()],
        TypeKind::Function { .. } => vec!["function".into()],
        TypeKind::Union(members) => members
            .iter()
            .flat_map(|m| type_strings(grammar, m, false))
            .collect(),
        TypeKind::Application { base, args } => {
            if outermost {
                let args: Vec<String> = args.iter().map(|a| grammar.stringify(a)).collect();
                let base = type_strings(grammar, base, false).join(",");
                vec![format!("{base}.<{}>", args.join(", "))]
            } else {
                vec![grammar.stringify(&without_modifiers(node))]
            }
        }
    }
}

fn without_modifiers(node: &TypeNode) -> TypeNode {
    TypeNode::new(node.kind.clone())
}

// -- Stringify ----------------------------------------------------------------

fn write_node(out: &mut String, node: &TypeNode) {
    if node.repeatable == Some(true) {
        out.push_str("...");
    }
    match node.nullable {
        Some(true) if node.kind != TypeKind::Unknown => out.push('?'),
        Some(false) => out.push('!'),
        _ => {}
    }
    match &node.kind {
        TypeKind::All => out.push('*'),
        TypeKind::Unknown => out.push('?'),
        TypeKind::Null => out.push_str("null"),
        TypeKind::Undefined => out.push_str("undefined"),
        TypeKind::Name(name) => out.push_str(name),
        TypeKind::Union(members) => {
            out.push('(');
            for (i, m) in members.iter().enumerate() {
                if i > 0 {
                    out.push('|');
                }
                write_node(out, m);
            }
            out.push(')');
        }
        TypeKind::Application { base, args } => {
            write_node(out, base);
            out.push_str(".<");
            write_list(out, args);
            out.push('>');
        }
        TypeKind::Record(fields) => {
            out.push('{');
            for (i, (key, value)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                if let Some(value) = value {
                    out.push_str(": ");
                    write_node(out, value);
                }
            }
            out.push('}');
        }
        TypeKind::Function {
            params,
            result,
            this,
            new,
        } => {
            out.push_str("function(");
            let mut first = true;
            for (label, t) in [("new", new), ("this", this)] {
                if let Some(t) = t {
                    if !first {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{label}:");
                    write_node(out, t);
                    first = false;
                }
            }
            if !params.is_empty() && !first {
                out.push_str(", ");
            }
            write_list(out, params);
            out.push(')');
            if let Some(result) = result {
                out.push_str(": ");
                write_node(out, result);
            }
        }
    }
    if node.optional == Some(true) {
        out.push('=');
    }
}

fn write_list(out: &mut String, nodes: &[TypeNode]) {
    for (i, n) in nodes.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_node(out, n);
    }
}

// -- Parser -------------------------------------------------------------------

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(c, '_' | '$' | '.' | ':' | '/' | '~' | '#' | '@' | '-' | '\'' | '"')
}

impl Parser {
    fn error(&self, message: impl Into<String>) -> TypeError {
        TypeError {
            message: message.into(),
            position: self.pos,
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_ws(&mut self) -> Option<char> {
        self.skip_ws();
        self.peek()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek_ws() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        self.skip_ws();
        let len = s.chars().count();
        let matches = self.chars.len() >= self.pos + len
            && self.chars[self.pos..self.pos + len].iter().copied().eq(s.chars());
        if matches {
            self.pos += len;
        }
        matches
    }

    fn expect(&mut self, c: char) -> Result<(), TypeError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{c}`")))
        }
    }

    /// A whole expression: optional `...`, then an unparenthesised union.
    fn parse_top(&mut self) -> Result<TypeNode, TypeError> {
        let repeatable = self.eat_str("...");
        let mut node = self.parse_union()?;
        if repeatable {
            node.repeatable = Some(true);
        }
        Ok(node)
    }

    fn parse_union(&mut self) -> Result<TypeNode, TypeError> {
        let first = self.parse_unary()?;
        if self.peek_ws() != Some('|') {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat('|') {
            members.push(self.parse_unary()?);
        }
        let mut union = TypeNode::new(TypeKind::Union(members));
        // `a|b=` marks the whole union optional.
        if let Some(last) = union_members_mut(&mut union).and_then(|m| m.last_mut()) {
            if last.optional == Some(true) {
                last.optional = None;
                union.optional = Some(true);
            }
        }
        Ok(union)
    }

    fn parse_unary(&mut self) -> Result<TypeNode, TypeError> {
        self.skip_ws();
        let mut nullable = None;
        match self.peek() {
            Some('?') => {
                self.pos += 1;
                if self.at_type_end() {
                    return self.parse_postfix(TypeNode::new(TypeKind::Unknown));
                }
                nullable = Some(true);
            }
            Some('!') => {
                self.pos += 1;
                nullable = Some(false);
            }
            _ => {}
        }
        let primary = self.parse_primary()?;
        let mut node = self.parse_postfix(primary)?;
        if nullable.is_some() {
            node.nullable = nullable;
        }
        Ok(node)
    }

    fn at_type_end(&mut self) -> bool {
        matches!(self.peek_ws(), None | Some(',' | ')' | '>' | '|' | '=' | '}'))
    }

    fn parse_postfix(&mut self, mut node: TypeNode) -> Result<TypeNode, TypeError> {
        loop {
            if self.eat_str("[]") {
                node = TypeNode::new(TypeKind::Application {
                    base: Box::new(TypeNode::name("Array")),
                    args: vec![node],
                });
            } else if self.eat('=') {
                node.optional = Some(true);
            } else if self.eat('?') {
                node.nullable = Some(true);
            } else if self.eat('!') {
                node.nullable = Some(false);
            } else {
                return Ok(node);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<TypeNode, TypeError> {
        match self.peek_ws() {
            None => Err(self.error("unexpected end of expression")),
            Some('(') => {
                self.pos += 1;
                let inner = self.parse_top()?;
                self.expect(')')?;
                Ok(inner)
            }
            Some('*') => {
                self.pos += 1;
                Ok(TypeNode::new(TypeKind::All))
            }
            Some('{') => {
                self.pos += 1;
                self.parse_record()
            }
            Some(c) if is_name_char(c) => {
                let name = self.parse_name()?;
                match name.as_str() {
                    "null" => Ok(TypeNode::new(TypeKind::Null)),
                    "undefined" => Ok(TypeNode::new(TypeKind::Undefined)),
                    "function" if self.peek_ws() == Some('(') => self.parse_function(),
                    _ => self.parse_application(TypeNode::name(&name)),
                }
            }
            Some(c) => Err(self.error(format!("unexpected `{c}`"))),
        }
    }

    /// Dotted names, `module:` paths and quoted segments. A trailing `.`
    /// directly before `<` belongs to the application syntax.
    fn parse_name(&mut self) -> Result<String, TypeError> {
        self.parse_name_until(None)
    }

    fn parse_name_until(&mut self, stop: Option<char>) -> Result<String, TypeError> {
        let start = self.pos;
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '"' || c == '\'' {
                name.push(c);
                self.pos += 1;
                loop {
                    match self.peek() {
                        None => return Err(self.error("unterminated string in name")),
                        Some('\\') => {
                            name.push('\\');
                            self.pos += 1;
                            if let Some(next) = self.peek() {
                                name.push(next);
                                self.pos += 1;
                            }
                        }
                        Some(q) if q == c => {
                            name.push(q);
                            self.pos += 1;
                            break;
                        }
                        Some(other) => {
                            name.push(other);
                            self.pos += 1;
                        }
                    }
                }
                continue;
            }
            if c == '.' && self.chars.get(self.pos + 1) == Some(&'<') {
                break;
            }
            if !is_name_char(c) || Some(c) == stop {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        if name.is_empty() {
            self.pos = start;
            return Err(self.error("expected a type name"));
        }
        Ok(name)
    }

    fn parse_application(&mut self, base: TypeNode) -> Result<TypeNode, TypeError> {
        let dotted = self.peek() == Some('.') && self.chars.get(self.pos + 1) == Some(&'<');
        if dotted {
            self.pos += 1;
        } else if self.peek() != Some('<') {
            return Ok(base);
        }
        self.pos += 1;
        let mut args = vec![self.parse_top()?];
        while self.eat(',') {
            args.push(self.parse_top()?);
        }
        self.expect('>')?;
        Ok(TypeNode::new(TypeKind::Application {
            base: Box::new(base),
            args,
        }))
    }

    fn parse_record(&mut self) -> Result<TypeNode, TypeError> {
        let mut fields = Vec::new();
        if self.eat('}') {
            return Ok(TypeNode::new(TypeKind::Record(fields)));
        }
        loop {
            self.skip_ws();
            let key = self.parse_name_until(Some(':'))?;
            let value = if self.eat(':') { Some(self.parse_top()?) } else { None };
            fields.push((key, value));
            if self.eat('}') {
                return Ok(TypeNode::new(TypeKind::Record(fields)));
            }
            self.expect(',')?;
        }
    }

    fn parse_function(&mut self) -> Result<TypeNode, TypeError> {
        self.expect('(')?;
        let (mut params, mut this, mut new) = (Vec::new(), None, None);
        if !self.eat(')') {
            loop {
                if self.eat_str("this:") {
                    this = Some(Box::new(self.parse_top()?));
                } else if self.eat_str("new:") {
                    new = Some(Box::new(self.parse_top()?));
                } else {
                    params.push(self.parse_top()?);
                }
                if self.eat(')') {
                    break;
                }
                self.expect(',')?;
            }
        }
        let result = if self.eat(':') {
            Some(Box::new(self.parse_unary()?))
        } else {
            None
        };
        Ok(TypeNode::new(TypeKind::Function {
            params,
            result,
            this,
            new,
        }))
    }
}

fn union_members_mut(node: &mut TypeNode) -> Option<&mut Vec<TypeNode>> {
    match &mut node.kind {
        TypeKind::Union(members) => Some(members),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(expr: &str) -> Vec<String> {
        let node = Permissive.parse(expr).unwrap();
        flatten(&Permissive, &node)
    }

    #[test]
    fn outermost_application_keeps_arguments() {
        assert_eq!(names("Array.<string>"), vec!["Array.<string>"]);
        assert_eq!(names("Object<string, number>"), vec!["Object.<string, number>"]);
    }

    #[test]
    fn unions_flatten_to_members() {
        assert_eq!(names("string|number"), vec!["string", "number"]);
        assert_eq!(names("(null|undefined|*)"), vec!["null", "undefined", "*"]);
    }

    #[test]
    fn application_inside_union_is_stringified() {
        assert_eq!(names("Array.<string>|Object<K, V>"), vec!["Array.<string>", "Object.<K, V>"]);
    }

    #[test]
    fn optional_suffix_sets_flag() {
        let node = Permissive.parse("string=").unwrap();
        assert_eq!(node.optional, Some(true));
        assert_eq!(node.nullable, None);
        assert_eq!(flatten(&Permissive, &node), vec!["string"]);
    }

    #[test]
    fn modifiers() {
        let node = Permissive.parse("...number").unwrap();
        assert_eq!(node.repeatable, Some(true));
        assert_eq!(Permissive.parse("?Foo").unwrap().nullable, Some(true));
        assert_eq!(Permissive.parse("!Foo").unwrap().nullable, Some(false));
        assert_eq!(Permissive.parse("Foo?").unwrap().nullable, Some(true));
        assert_eq!(Permissive.parse("?").unwrap().kind, TypeKind::Unknown);
    }

    #[test]
    fn record_and_function_types() {
        assert_eq!(names("{a: number, b}"), vec!["Object"]);
        assert_eq!(names("function(string, number): boolean"), vec!["function"]);
        let f = Permissive.parse("function(new:Foo, ...*)").unwrap();
        assert_eq!(Permissive.stringify(&f), "function(new:Foo, ...*)");
    }

    #[test]
    fn array_shorthand() {
        assert_eq!(names("string[]"), vec!["Array.<string>"]);
    }

    #[test]
    fn module_paths_are_names() {
        assert_eq!(names("module:foo/bar.Baz"), vec!["module:foo/bar.Baz"]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Permissive.parse("Array.<string").is_err());
        assert!(Permissive.parse("a||").is_err());
        assert!(Permissive.parse("").is_err());
    }

    #[test]
    fn stringify_union_and_application() {
        let node = Permissive.parse("Array.<(string|number)>").unwrap();
        assert_eq!(Permissive.stringify(&node), "Array.<(string|number)>");
    }
}
