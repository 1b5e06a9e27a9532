//! Per-file doclet extraction.
//!
//! [`parse_js`] pretreats the source, builds the tree, attaches comments and
//! walks the tree with a [`FileParser`]. For every node the parser first
//! turns attached doc comments into "virtual" doclets (comments that name
//! their own symbol), then, for documentable constructs, builds a doclet
//! from the code and resolves which symbol owns it.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error};

use crate::ast::{Ast, LitValue, MethodKind, NodeIdx, NodeKind, VarKind};
use crate::attacher;
use crate::context::{NodeIdSeq, UnknownTags};
use crate::descriptor::{self, basename};
use crate::doclet::{Code, Doclet, Kind, Meta, Param, Scope};
use crate::error::Result;
use crate::name::{self, ANONYMOUS, GLOBAL, PUNC_INNER, PUNC_INSTANCE, PUNC_STATIC};
use crate::plugin::{CommentFound, Outcome, Plugins, SymbolFound};
use crate::walker::{self, Flow, Visitor};

static RE_HASHBANG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#![\S \t]+\r?\n)").unwrap());
static RE_BANG_DOC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/\*!\*").unwrap());
static RE_ADJACENT_DOCS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*//\*\*+").unwrap());
static RE_ALSO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@also\b").unwrap());
static RE_MODULE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?:module\.)?exports|this)(\.|\[|$)").unwrap());
static RE_THIS_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)(\.prototype|#)$").unwrap());

/// Rewrite the source before parsing: comment out a hashbang, read `/*!*`
/// as `/**`, and fold directly adjacent doc comments into one with an
/// `@also` marker.
pub fn pretreat(source: &str) -> String {
    let source = RE_HASHBANG.replace(source, "// ${1}");
    let source = RE_BANG_DOC.replace_all(&source, "/**");
    RE_ADJACENT_DOCS.replace_all(&source, "@also").into_owned()
}

/// The comment chunks separated by `@also`.
pub fn split_also(comment: &str) -> Vec<&str> {
    RE_ALSO.split(comment).collect()
}

/// `/***` comments are decorative banners, not documentation.
pub fn is_valid_doc(comment: &str) -> bool {
    !comment.is_empty() && !comment.starts_with("/***")
}

/// Extract the doclets of one JavaScript file.
pub fn parse_js(
    source: &str,
    filename: &str,
    ids: &mut NodeIdSeq,
    unknown_tags: &UnknownTags,
    plugins: &mut Plugins,
) -> Result<Vec<Doclet>> {
    let source = pretreat(source);
    let mut ast = crate::ast::build::parse(&source, filename)?;
    attacher::attach_comments(&mut ast, ids);

    let mut parser = FileParser::new(filename, unknown_tags, plugins);
    walker::walk(&mut ast, ids, &mut parser);
    Ok(parser.finish())
}

// -- Lookup tables ------------------------------------------------------------

/// Index into [`FileParser::store`].
type DocletId = usize;

/// Doclets registered under a key; lookups see the most recent one.
struct DocletCache<K> {
    entries: HashMap<K, Vec<DocletId>>,
}

impl<K> Default for DocletCache<K> {
    fn default() -> Self {
        DocletCache { entries: HashMap::new() }
    }
}

impl<K: Hash + Eq> DocletCache<K> {
    fn put(&mut self, key: K, id: DocletId) {
        self.entries.entry(key).or_default().push(id);
    }

    fn get<Q>(&self, key: &Q) -> Option<DocletId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).and_then(|ids| ids.last().copied())
    }
}

/// The module object in scope: its longname and the identifier the code
/// used for it.
#[derive(Debug, Clone)]
struct CurrentModule {
    longname: String,
    original_name: String,
}

/// Work deferred until a symbol's doclet exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finisher {
    /// Record the symbol's longname in the vars table of this scope doclet.
    Vars(DocletId),
    InlineParam,
    RestParam,
    DefaultParams,
    Constructor,
    Enum,
}

struct Event {
    found: SymbolFound,
    finishers: Vec<Finisher>,
    doclet: Option<DocletId>,
}

// -- File parser --------------------------------------------------------------

pub struct FileParser<'a> {
    filename: String,
    unknown_tags: &'a UnknownTags,
    plugins: &'a mut Plugins,
    /// Every doclet built for this file, including placeholders and the
    /// global scope seed at index 0.
    store: Vec<Doclet>,
    by_node: DocletCache<NodeIdx>,
    by_longname: DocletCache<String>,
    results: Vec<DocletId>,
    /// Constructor doclets merged into their class.
    folded: HashSet<DocletId>,
    current_module: Option<CurrentModule>,
}

impl<'a> FileParser<'a> {
    pub fn new(filename: &str, unknown_tags: &'a UnknownTags, plugins: &'a mut Plugins) -> Self {
        let mut parser = FileParser {
            filename: filename.to_string(),
            unknown_tags,
            plugins,
            store: Vec::new(),
            by_node: DocletCache::default(),
            by_longname: DocletCache::default(),
            results: Vec::new(),
            folded: HashSet::new(),
            current_module: None,
        };
        let global = Doclet {
            longname: Some(GLOBAL.to_string()),
            ..Default::default()
        };
        parser.store.push(global);
        parser.by_longname.put(GLOBAL.to_string(), 0);
        parser
    }

    /// The doclets this file produced, in encounter order.
    pub fn finish(mut self) -> Vec<Doclet> {
        for &id in &self.results {
            let doclet = &mut self.store[id];
            if doclet.kind == Some(Kind::Class) && doclet.description.is_none() {
                doclet.description = doclet.classdesc.clone();
            }
        }
        self.current_module = None;

        let results = std::mem::take(&mut self.results);
        let doclets: Vec<Doclet> = results
            .into_iter()
            .filter(|id| !self.folded.contains(id))
            .map(|id| std::mem::take(&mut self.store[id]))
            .collect();
        debug!(file = %self.filename, doclets = doclets.len(), "file walked");
        doclets
    }

    fn doclet_by_node(&self, node: NodeIdx) -> Option<&Doclet> {
        self.by_node.get(&node).map(|id| &self.store[id])
    }

    fn doclet_by_longname(&self, longname: &str) -> Option<&Doclet> {
        self.by_longname.get(longname).map(|id| &self.store[id])
    }

    fn tag(&self, doclet: &mut Doclet, title: &str, text: Option<&str>) {
        if let Err(err) = doclet.add_tag_with(title, text, self.unknown_tags) {
            error!(file = %self.filename, "{err}");
        }
    }

    fn create_doclet(&self, comment: &str, meta: Meta) -> Doclet {
        match Doclet::new(comment, meta.clone(), self.unknown_tags) {
            Ok(doclet) => doclet,
            Err(err) => {
                error!(
                    "cannot create a doclet for the comment \"{}\": {err}",
                    comment.replace(['\r', '\n'], "")
                );
                Doclet {
                    meta,
                    ..Default::default()
                }
            }
        }
    }

    fn add_doclet(&mut self, mut doclet: Doclet) -> DocletId {
        if doclet.kind == Some(Kind::Module) {
            self.current_module = Some(CurrentModule {
                longname: doclet.longname().to_string(),
                original_name: doclet.meta.code.name.clone().unwrap_or_default(),
            });
        }
        let outcome = self.plugins.new_doclet.emit(&mut doclet);
        // Prototype objects cannot be documented.
        let keep = outcome == Outcome::Continue && !doclet.longname().ends_with(PUNC_INSTANCE);

        let id = self.store.len();
        self.store.push(doclet);
        if keep {
            self.results.push(id);
        }
        id
    }

    // -- Comments ---------------------------------------------------------------

    fn visit_node_comments(&mut self, ast: &mut Ast, idx: NodeIdx) {
        let node = ast.node(idx);
        let attached: Vec<usize> = node
            .leading_comments
            .iter()
            .chain(&node.trailing_comments)
            .copied()
            .collect();

        for index in attached {
            let comment = &ast.comments[index];
            if !is_valid_doc(&comment.raw) {
                continue;
            }
            let mut found = CommentFound {
                comment: comment.raw.clone(),
                lineno: comment.line,
                filename: self.filename.clone(),
                range: comment.range,
            };
            let outcome = self.plugins.comment_found.emit(&mut found);
            if found.comment != ast.comments[index].raw {
                ast.comments[index].raw = found.comment.clone();
            }
            if outcome == Outcome::SuppressDefault {
                continue;
            }
            for chunk in split_also(&found.comment) {
                self.new_virtual_doclet(ast, chunk, &found);
            }
        }
    }

    /// A comment that names its own symbol becomes a doclet on its own.
    fn new_virtual_doclet(&mut self, ast: &Ast, chunk: &str, found: &CommentFound) {
        let meta = Meta::new(&found.filename, found.lineno, 0, Some(found.range), Code::default());
        let mut doclet = self.create_doclet(chunk, meta);
        if doclet.name().is_empty() {
            return;
        }
        self.set_module_scope_memberof(ast, &mut doclet);
        doclet.post_process();
        if doclet.scope.is_none() && doclet.kind != Some(Kind::Module) {
            doclet.scope = Some(Scope::Global);
        }
        self.add_doclet(doclet);
    }

    // -- Symbols ----------------------------------------------------------------

    fn visit_node(&mut self, ast: &Ast, idx: NodeIdx) {
        let Some(mut event) = self.make_event(ast, idx) else {
            return;
        };
        let outcome = self.plugins.symbol_found.emit(&mut event.found);
        if outcome == Outcome::Continue && is_valid_doc(&event.found.comment) {
            let comment = event.found.comment.clone();
            for chunk in split_also(&comment) {
                if let Some(id) = self.new_symbol_doclet(ast, chunk, &event.found) {
                    event.doclet = Some(id);
                }
            }
        }
        self.add_doclet_ref(ast, &event);
        for finisher in event.finishers.clone() {
            self.run_finisher(ast, &event, finisher);
        }
    }

    fn make_event(&mut self, ast: &Ast, idx: NodeIdx) -> Option<Event> {
        use NodeKind::*;

        let node = ast.node(idx);
        let mut finishers = Vec::new();
        let mut track = false;
        let mut funcscope = false;
        let has_comment = !node.leading_comments.is_empty();
        let parent_is_function = node.parent.is_some_and(|p| ast.kind(p).is_function());

        match &node.kind {
            AssignmentExpression { .. } => {
                track = true;
                funcscope = true;
            }
            AssignmentPattern { .. } | Identifier { .. } | RestElement { .. } => {
                if !(has_comment && parent_is_function) {
                    return None;
                }
                finishers.push(Finisher::InlineParam);
                track = true;
            }
            ClassDeclaration { .. } | ClassExpression { .. } => track = true,
            ExportAllDeclaration { .. } | ObjectExpression { .. } | PropertyDefinition { .. } => {}
            ExportDefaultDeclaration { .. }
            | ExportNamedDeclaration { .. }
            | ExportSpecifier { .. } => track = true,
            FunctionDeclaration { .. }
            | FunctionExpression { .. }
            | ArrowFunctionExpression { .. } => {
                finishers.extend([Finisher::DefaultParams, Finisher::RestParam]);
                track = true;
                funcscope = true;
            }
            MethodDefinition { kind, .. } => {
                finishers.extend([Finisher::DefaultParams, Finisher::RestParam]);
                if *kind == MethodKind::Constructor {
                    finishers.push(Finisher::Constructor);
                }
            }
            Property { .. } => {
                if !node.kind.is_accessor() {
                    finishers.push(Finisher::Enum);
                }
            }
            VariableDeclarator { .. } => track = true,
            _ => return None,
        }

        let info = descriptor::get_info(ast, idx);
        let mut code_kind = info.kind;
        if matches!(&node.kind, VariableDeclarator { .. }) {
            let in_const = node.parent.is_some_and(|p| {
                matches!(
                    ast.kind(p),
                    VariableDeclaration {
                        kind: VarKind::Const,
                        ..
                    }
                )
            });
            if in_const {
                code_kind = Some(Kind::Constant);
            }
        }
        let inferred_kind =
            descriptor::code_to_kind(ast, info.node_type.as_deref(), Some(info.node));
        let code = Code {
            id: Some(format!("astnode{}", node.node_id.unwrap_or_default())),
            name: Some(info.name.clone()).filter(|n| !n.is_empty()),
            node_type: info.node_type,
            value: info.value,
            paramnames: info.paramnames,
            funcscope: None,
            node: Some(info.node),
            inferred_kind: Some(inferred_kind),
        };
        let mut event = Event {
            found: SymbolFound {
                id: code.id.clone().unwrap_or_default(),
                comment: ast
                    .leading_comment(idx)
                    .map(|c| c.raw.clone())
                    .unwrap_or_else(|| "@undocumented".to_string()),
                lineno: node.line,
                columnno: node.column,
                range: node.range,
                filename: self.filename.clone(),
                node: idx,
                code,
                code_kind,
            },
            finishers,
            doclet: None,
        };

        if track {
            self.track_vars(ast, idx, &mut event);
        }
        if funcscope {
            let base = basename(&info.name);
            let is_function = matches!(
                &node.kind,
                FunctionDeclaration { .. }
                    | FunctionExpression { .. }
                    | ArrowFunctionExpression { .. }
            );
            if is_function || base != "this" {
                let scope = self.resolve_var(ast, idx, &base);
                event.found.code.funcscope = Some(scope).filter(|s| !s.is_empty());
            }
        }
        Some(event)
    }

    /// Register the symbol in the vars table of its scope, and resolve it
    /// there once its doclet exists.
    fn track_vars(&mut self, ast: &Ast, idx: NodeIdx, event: &mut Event) {
        let scope_doclet = match ast.enclosing_scope(idx) {
            Some(scope) => self.by_node.get(&scope),
            None => self.by_longname.get(GLOBAL),
        };
        let Some(scope_doclet) = scope_doclet else {
            return;
        };
        if let Some(name) = &event.found.code.name {
            self.store[scope_doclet]
                .meta
                .vars
                .get_or_insert_with(BTreeMap::new)
                .insert(name.clone(), None);
        }
        event.finishers.push(Finisher::Vars(scope_doclet));
    }

    fn new_symbol_doclet(
        &mut self,
        ast: &Ast,
        chunk: &str,
        found: &SymbolFound,
    ) -> Option<DocletId> {
        let meta = || {
            Meta::new(
                &found.filename,
                found.lineno,
                found.columnno,
                Some(found.range),
                found.code.clone(),
            )
        };
        let mut doclet = self.create_doclet(chunk, meta());
        if !doclet.name().is_empty() {
            // The comment documents a symbol of its own.
            doclet = self.create_doclet("@undocumented", meta());
        }

        if doclet.alias.is_some() {
            self.process_alias(ast, &mut doclet, found.node);
            if doclet.name().is_empty() {
                debug!(line = found.lineno, "alias resolved to nothing; skipping doclet");
                return None;
            }
        } else if let Some(code_name) = &found.code.name {
            self.tag(&mut doclet, "name", Some(code_name.as_str()));
            if doclet.memberof.is_none() {
                self.add_symbol_memberof(ast, &mut doclet, found.node);
            }
            doclet.post_process();
        } else {
            return None;
        }

        let exports_itself = self
            .current_module
            .as_ref()
            .is_some_and(|m| m.longname == doclet.name());
        if doclet.memberof.is_none() && doclet.kind != Some(Kind::Module) && !exports_itself {
            doclet.scope = Some(Scope::Global);
        }
        if let Some(kind) = found.code_kind {
            if doclet.kind == Some(Kind::Member) {
                doclet.kind = Some(kind);
            }
        }
        Some(self.add_doclet(doclet))
    }

    fn add_doclet_ref(&mut self, ast: &Ast, event: &Event) {
        let Some(node) = event.found.code.node else {
            return;
        };
        match event.doclet {
            Some(id) => {
                self.by_node.put(node, id);
                if let Some(longname) = self.store[id].longname.clone() {
                    self.by_longname.put(longname, id);
                }
            }
            None => {
                let is_function = matches!(
                    ast.kind(node),
                    NodeKind::FunctionDeclaration { .. }
                        | NodeKind::FunctionExpression { .. }
                        | NodeKind::ArrowFunctionExpression { .. }
                );
                if is_function && self.by_node.get(&node).is_none() {
                    // Undocumented functions still own scoped vars.
                    let placeholder = Doclet {
                        longname: Some(ANONYMOUS.to_string()),
                        meta: Meta {
                            code: event.found.code.clone(),
                            ..Default::default()
                        },
                        ..Default::default()
                    };
                    let id = self.store.len();
                    self.store.push(placeholder);
                    self.by_node.put(node, id);
                    self.by_longname.put(ANONYMOUS.to_string(), id);
                }
            }
        }
    }

    // -- Resolution ---------------------------------------------------------------

    /// Longname of the scope that declares `base`, walking outwards from
    /// `node`. Empty means global.
    fn resolve_var(&self, ast: &Ast, node: NodeIdx, base: &str) -> String {
        if matches!(ast.kind(node), NodeKind::FunctionDeclaration { .. }) {
            return String::new();
        }
        let Some(scope) = ast.enclosing_scope(node) else {
            return String::new();
        };
        match self.doclet_by_node(scope) {
            Some(doclet) if doclet.meta.defines_var(base) => doclet.longname().to_string(),
            _ => self.resolve_var(ast, scope, base),
        }
    }

    /// Longname `this` refers to at `node`.
    fn resolve_this(&self, ast: &Ast, node: NodeIdx) -> String {
        let is_property = matches!(ast.kind(node), NodeKind::Property { .. });
        match ast.enclosing_scope(node).filter(|_| !is_property) {
            Some(scope) => {
                let Some(doclet) = self.doclet_by_node(scope) else {
                    return ANONYMOUS.to_string();
                };
                if let Some(this) = &doclet.this_binding {
                    this.clone()
                } else if doclet.kind == Some(Kind::Function) && doclet.memberof.is_some() {
                    let in_class = self.parent_class(ast, node).is_some();
                    if in_class || doclet.longname().ends_with(".constructor") {
                        doclet.memberof.clone().unwrap_or_default()
                    } else {
                        doclet.longname().to_string()
                    }
                } else if doclet.kind == Some(Kind::Member) && ast.kind(node).is_assignment() {
                    doclet.longname().to_string()
                } else if matches!(doclet.kind, Some(Kind::Class | Kind::Module)) {
                    doclet.longname().to_string()
                } else {
                    self.resolve_this(ast, scope)
                }
            }
            None => ast
                .parent(node)
                .and_then(|p| self.doclet_by_node(p))
                .map(|d| d.longname().to_string())
                .unwrap_or_default(),
        }
    }

    /// The class whose member `node` sits in, if any.
    fn parent_class(&self, ast: &Ast, node: NodeIdx) -> Option<&Doclet> {
        let is_class = |d: &Doclet| d.kind == Some(Kind::Class);
        let mut scope = ast.enclosing_scope(node);
        while let Some(current) = scope {
            if let Some(doclet) = self.doclet_by_node(current) {
                if is_class(doclet) {
                    return Some(doclet);
                }
                let parts = name::shorten(doclet.longname(), None);
                if parts.scope.starts_with(PUNC_INSTANCE) {
                    let owner = self.doclet_by_longname(&parts.memberof);
                    if let Some(owner) = owner.filter(|d| is_class(*d)) {
                        return Some(owner);
                    }
                }
            }
            scope = ast.enclosing_scope(current);
        }
        None
    }

    /// Owner of the symbol at `node` as `(memberof, basename)`. A found
    /// basename whose owner is still unresolved gives `(None, Some(_))`.
    fn astnode_to_memberof(&self, ast: &Ast, node: NodeIdx) -> (Option<String>, Option<String>) {
        use NodeKind::*;

        let declares_local = matches!(
            ast.kind(node),
            FunctionDeclaration { .. }
                | FunctionExpression { .. }
                | ArrowFunctionExpression { .. }
                | VariableDeclarator { .. }
        );
        if let Some(scope) = ast.enclosing_scope(node).filter(|_| declares_local) {
            let owner = self
                .doclet_by_node(scope)
                .map(|d| d.longname().to_string())
                .unwrap_or_else(|| ANONYMOUS.to_string());
            return (Some(format!("{owner}{PUNC_INNER}")), None);
        }

        let base = basename(&descriptor::name_of(ast, node));
        let var_of = |d: &Doclet| {
            d.meta
                .vars
                .as_ref()
                .and_then(|v| v.get(&base).cloned().flatten())
        };
        let mut memberof = None;
        let mut found_base = None;

        let mut current = node;
        while let Some(scope) = ast.enclosing_scope(current) {
            if let Some(doclet) = self.doclet_by_node(scope).filter(|d| d.meta.defines_var(&base)) {
                memberof = var_of(doclet);
                found_base = Some(base.clone());
                break;
            }
            current = scope;
        }

        match self.doclet_by_longname(GLOBAL).filter(|d| d.meta.defines_var(&base)) {
            Some(global) => {
                memberof = var_of(global);
                found_base = Some(base.clone());
            }
            None => {
                if let Some(parent) = ast.parent(node).and_then(|p| self.doclet_by_node(p)) {
                    memberof = parent.longname.clone().or_else(|| parent.name.clone());
                }
            }
        }
        (memberof, found_base)
    }

    fn add_symbol_memberof(&self, ast: &Ast, doclet: &mut Doclet, node: NodeIdx) {
        let unresolved = self.module_reference(doclet.name());
        let (memberof, base) = match unresolved {
            Some((starts, punc)) => {
                let (memberof, scope_punc) =
                    self.find_symbol_memberof(ast, doclet, node, &starts, &punc);
                // An empty owner is global: the stripped name stands alone.
                if let Some(owner) = memberof.as_ref().filter(|m| !m.is_empty()) {
                    let name = doclet.name();
                    doclet.name = Some(if name.is_empty() {
                        owner.clone()
                    } else {
                        format!("{owner}{scope_punc}{name}")
                    });
                }
                (memberof, None)
            }
            None => self.astnode_to_memberof(ast, node),
        };

        match memberof.filter(|m| !m.is_empty()) {
            Some(owner) => {
                self.tag(doclet, "memberof", Some(owner.as_str()));
                if let Some(base) = base.filter(|b| !b.is_empty()) {
                    if let Ok(prefix) = Regex::new(&format!("^{}.", regex::escape(&base))) {
                        let name = prefix.replace(doclet.name(), "").into_owned();
                        doclet.name = Some(name);
                    }
                }
            }
            None => self.set_module_scope_memberof(ast, doclet),
        }
    }

    /// Whether `name` starts with a reference to the module object or to
    /// `this`; gives the reference and the punctuation after it.
    fn module_reference(&self, name: &str) -> Option<(String, String)> {
        let alias = self
            .current_module
            .as_ref()
            .map(|m| m.original_name.as_str())
            .filter(|n| !n.is_empty());
        let dynamic;
        let re = match alias {
            Some(alias) => {
                let pattern = format!(
                    r"^((?:module\.)?exports|this|{})(\.|\[|$)",
                    regex::escape(alias)
                );
                dynamic = Regex::new(&pattern).ok()?;
                &dynamic
            }
            None => &*RE_MODULE_REF,
        };
        let caps = re.captures(name)?;
        Some((caps[1].to_string(), caps[2].to_string()))
    }

    fn find_symbol_memberof(
        &self,
        ast: &Ast,
        doclet: &mut Doclet,
        node: NodeIdx,
        starts_with: &str,
        trailing: &str,
    ) -> (Option<String>, String) {
        let Some(module) = self.current_module.as_ref() else {
            if starts_with != "this" {
                // No module to attach to: keep the name as written.
                return (None, String::new());
            }
            return self.this_memberof(ast, doclet, node, starts_with, trailing);
        };

        let is_module_object = doclet.name() == "module.exports";
        if starts_with != "this" && !is_module_object {
            strip_reference(doclet, starts_with, trailing);
            (Some(module.longname.clone()), PUNC_STATIC.to_string())
        } else if is_module_object {
            let longname = module.longname.clone();
            self.tag(doclet, "name", Some(longname.as_str()));
            doclet.post_process();
            (None, String::new())
        } else {
            self.this_memberof(ast, doclet, node, starts_with, trailing)
        }
    }

    fn this_memberof(
        &self,
        ast: &Ast,
        doclet: &mut Doclet,
        node: NodeIdx,
        starts_with: &str,
        trailing: &str,
    ) -> (Option<String>, String) {
        strip_reference(doclet, starts_with, trailing);
        let memberof = self.resolve_this(ast, node);
        match &self.current_module {
            Some(module) if starts_with == "this" && memberof.is_empty() => {
                (Some(module.longname.clone()), PUNC_STATIC.to_string())
            }
            _ => (Some(memberof), PUNC_INSTANCE.to_string()),
        }
    }

    /// Default scope and owner for symbols inside a module that are not the
    /// module object itself.
    fn set_module_scope_memberof(&self, ast: &Ast, doclet: &mut Doclet) {
        let Some(module) = &self.current_module else {
            return;
        };
        if module.longname == doclet.name() {
            return;
        }
        if doclet.scope.is_none() {
            let title = match doclet.meta.code.node.map(|n| ast.kind(n)) {
                Some(NodeKind::MethodDefinition { is_static: true, .. }) => "static",
                Some(NodeKind::MethodDefinition { .. }) => "instance",
                _ => "inner",
            };
            self.tag(doclet, title, None);
        }
        if doclet.memberof.is_none() && doclet.scope != Some(Scope::Global) {
            self.tag(doclet, "memberof", Some(module.longname.as_str()));
        }
    }

    fn process_alias(&self, ast: &Ast, doclet: &mut Doclet, node: NodeIdx) {
        if doclet.alias.as_deref() == Some("{@thisClass}") {
            let mut owner = self.resolve_this(ast, node);
            // The class owns the prototype, not the other way around.
            if let Some(caps) = RE_THIS_CLASS.captures(&owner) {
                owner = caps[1].to_string();
            }
            doclet.alias = Some(owner);
        }
        let alias = doclet.alias.clone().unwrap_or_default();
        self.tag(doclet, "name", Some(alias.as_str()));
        doclet.post_process();
    }

    /// Doclets of the objects a property belongs to, following chained
    /// assignments like `var a = exports.A = {...}`.
    fn resolve_property_parents(&self, ast: &Ast, node: NodeIdx) -> Vec<DocletId> {
        let mut found = Vec::new();
        let mut current = ast.parent(node);
        let mut next = current.and_then(|c| ast.parent(c));
        while let Some(ancestor) = current {
            if let Some(id) = self.by_node.get(&ancestor) {
                found.push(id);
            }
            match next.filter(|&n| matches!(ast.kind(n), NodeKind::AssignmentExpression { .. })) {
                Some(assignment) => {
                    next = ast.parent(assignment);
                    current = ast.parent(ancestor);
                }
                None => current = None,
            }
        }
        found
    }

    // -- Finishers ----------------------------------------------------------------

    fn run_finisher(&mut self, ast: &Ast, event: &Event, finisher: Finisher) {
        match finisher {
            Finisher::Vars(scope) => self.finish_vars(event, scope),
            Finisher::InlineParam => self.finish_inline_param(ast, event),
            Finisher::RestParam => self.finish_rest_param(ast, event),
            Finisher::DefaultParams => self.finish_default_params(ast, event),
            Finisher::Constructor => self.finish_constructor(ast, event),
            Finisher::Enum => self.finish_enum(ast, event),
        }
    }

    fn finish_vars(&mut self, event: &Event, scope: DocletId) {
        let (Some(id), Some(name)) = (event.doclet, &event.found.code.name) else {
            return;
        };
        let doclet = &self.store[id];
        if doclet.alias.is_none() && doclet.memberof.is_none() {
            return;
        }
        let longname = doclet.longname.clone();
        self.store[scope]
            .meta
            .vars
            .get_or_insert_with(BTreeMap::new)
            .insert(name.clone(), longname);
    }

    /// An inline-documented parameter joins its function's params, unless
    /// the function documents it already.
    fn finish_inline_param(&mut self, ast: &Ast, event: &Event) {
        let Some(id) = event.doclet else {
            return;
        };
        let Some(parent) = self.store[id]
            .meta
            .code
            .node
            .and_then(|n| ast.parent(n))
            .and_then(|p| self.by_node.get(&p))
        else {
            return;
        };
        if self.store[id].kind != Some(Kind::Param) {
            return;
        }

        let name = self.store[id].name.clone();
        let ty = self.store[id].ty.clone();
        let position = self.store[parent]
            .meta
            .code
            .paramnames
            .iter()
            .position(|p| Some(p) == name.as_ref());
        let params = &mut self.store[parent].params;
        let mut i = 0;
        loop {
            match params.get(i) {
                Some(param) if param.name == name => break,
                Some(_) if Some(i) != position => i += 1,
                _ => {
                    params.insert(
                        i,
                        Param {
                            name: name.clone(),
                            ty: ty.clone(),
                            description: Some(String::new()),
                            ..Default::default()
                        },
                    );
                    break;
                }
            }
        }
        self.store[id].undocumented = true;
    }

    fn finish_rest_param(&mut self, ast: &Ast, event: &Event) {
        let (Some(id), Some(node)) = (event.doclet, event.found.code.node) else {
            return;
        };
        let rest_name = ast.function_params(node).iter().find_map(|&p| match ast.kind(p) {
            NodeKind::RestElement { argument } => ast.identifier_name(*argument),
            _ => None,
        });
        let Some(rest_name) = rest_name else {
            return;
        };
        if let Some(param) = self.store[id]
            .params
            .iter_mut()
            .rev()
            .find(|p| p.name.as_deref() == Some(rest_name))
        {
            param.variable = Some(true);
        }
    }

    /// Literal default values in the code fill documented params that have
    /// none. Params are matched in order by name.
    fn finish_default_params(&mut self, ast: &Ast, event: &Event) {
        let (Some(id), Some(node)) = (event.doclet, event.found.code.node) else {
            return;
        };
        let documented = &mut self.store[id].params;
        let mut j = 0;
        for &param in ast.function_params(node) {
            let Some(doc) = documented.get_mut(j) else {
                break;
            };
            let (name, default) = match ast.kind(param) {
                NodeKind::AssignmentPattern { left, right } => {
                    (ast.identifier_name(*left), Some(*right))
                }
                _ => (ast.identifier_name(param), None),
            };
            if name != doc.name.as_deref() {
                continue;
            }
            if let Some(right) = default {
                let usable = match ast.kind(right) {
                    NodeKind::Literal { value, .. } => {
                        !matches!(value, LitValue::String(s) if s.is_empty())
                    }
                    _ => false,
                };
                if usable && doc.defaultvalue.is_none() {
                    doc.defaultvalue = descriptor::node_to_value(ast, right);
                }
            }
            j += 1;
        }
    }

    /// A documented class absorbs its constructor's description and params.
    fn finish_constructor(&mut self, ast: &Ast, event: &Event) {
        let (Some(id), Some(node)) = (event.doclet, event.found.code.node) else {
            return;
        };
        let Some(class) = ast
            .parent(node)
            .and_then(|body| ast.parent(body))
            .and_then(|class| self.by_node.get(&class))
        else {
            return;
        };
        if class == id || self.store[class].undocumented {
            return;
        }

        let description = self.store[id].description.clone();
        let params = self.store[id].params.clone();
        let target = &mut self.store[class];
        if target.description.is_none() && description.is_some() {
            target.description = description;
        }
        if target.params.is_empty() && !params.is_empty() {
            target.params = params;
        }
        self.store[id].undocumented = true;
        self.folded.insert(id);
    }

    /// Members of an `@enum` object become its properties and share its
    /// type.
    fn finish_enum(&mut self, ast: &Ast, event: &Event) {
        let (Some(id), Some(node)) = (event.doclet, event.found.code.node) else {
            return;
        };
        let Some(property) = ast.parent(node) else {
            return;
        };
        for owner in self.resolve_property_parents(ast, property) {
            if !self.store[owner].is_enum {
                continue;
            }
            let owner_type = self.store[owner].ty.clone();
            let member = &mut self.store[id];
            if member.ty.is_none() {
                member.ty = owner_type;
            }
            member.undocumented = false;
            member.defaultvalue = member.meta.code.value.clone();
            let entry = Param {
                name: member.name.clone(),
                ty: member.ty.clone(),
                description: member.description.clone(),
                defaultvalue: member.defaultvalue.clone(),
                ..Default::default()
            };
            self.store[owner].properties.push(entry);
        }
    }
}

/// Drop the module or `this` reference from the front of the name, leaving
/// the name `module.exports` alone.
fn strip_reference(doclet: &mut Doclet, starts_with: &str, trailing: &str) {
    let trailing = if trailing == "[" { "" } else { trailing };
    let prefix = format!("{starts_with}{trailing}");
    if doclet.name() != "module.exports" {
        let name = doclet.name().replacen(&prefix, "", 1);
        doclet.name = Some(name);
    }
}

impl Visitor for FileParser<'_> {
    fn visit(&mut self, ast: &mut Ast, node: NodeIdx) -> Flow {
        self.visit_node_comments(ast, node);
        self.visit_node(ast, node);
        Flow::Continue
    }
}
