//! The doclet record and its construction from a raw doc comment.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::ast::{NodeIdx, Range};
use crate::context::UnknownTags;
use crate::error::{Error, Result};
use crate::name;
use crate::tag::{dictionary, Tag, TagValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Module,
    Namespace,
    Class,
    Mixin,
    Interface,
    Function,
    Member,
    Constant,
    Typedef,
    Event,
    Param,
    Component,
    External,
    File,
    Unresolved,
}

impl Kind {
    pub fn parse(s: &str) -> Option<Kind> {
        Some(match s {
            "module" => Kind::Module,
            "namespace" => Kind::Namespace,
            "class" => Kind::Class,
            "mixin" => Kind::Mixin,
            "interface" => Kind::Interface,
            "function" => Kind::Function,
            "member" => Kind::Member,
            "constant" => Kind::Constant,
            "typedef" => Kind::Typedef,
            "event" => Kind::Event,
            "param" => Kind::Param,
            "component" => Kind::Component,
            "external" => Kind::External,
            "file" => Kind::File,
            "unresolved" => Kind::Unresolved,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Module => "module",
            Kind::Namespace => "namespace",
            Kind::Class => "class",
            Kind::Mixin => "mixin",
            Kind::Interface => "interface",
            Kind::Function => "function",
            Kind::Member => "member",
            Kind::Constant => "constant",
            Kind::Typedef => "typedef",
            Kind::Event => "event",
            Kind::Param => "param",
            Kind::Component => "component",
            Kind::External => "external",
            Kind::File => "file",
            Kind::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Inner,
    Instance,
    Static,
}

impl Scope {
    pub const NAMES: [&'static str; 4] = ["global", "inner", "instance", "static"];

    pub fn parse(s: &str) -> Option<Scope> {
        match s {
            "global" => Some(Scope::Global),
            "inner" => Some(Scope::Inner),
            "instance" => Some(Scope::Instance),
            "static" => Some(Scope::Static),
            _ => None,
        }
    }
}

/// A parsed `@param`-style value. Returns, exceptions and properties share
/// the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Param {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaultvalue: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Borrow {
    pub from: String,
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// A React component prop gathered from `propTypes` and `defaultProps`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComponentProp {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

/// What the code next to a comment looks like.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Code {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paramnames: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funcscope: Option<String>,
    #[serde(skip)]
    pub node: Option<NodeIdx>,
    /// Kind implied by the code shape, used when no tag sets one.
    #[serde(skip)]
    pub inferred_kind: Option<Kind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Meta {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub lineno: usize,
    pub columnno: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    pub code: Code,
    /// Local identifiers of a scope-creating node, mapped to their
    /// longname once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vars: Option<BTreeMap<String, Option<String>>>,
}

impl Meta {
    pub fn new(
        file: &str,
        lineno: usize,
        columnno: usize,
        range: Option<Range>,
        code: Code,
    ) -> Self {
        let path = Path::new(file);
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.to_string());
        let dir = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|p| !p.is_empty() && p != ".");
        Meta {
            filename,
            path: dir,
            lineno,
            columnno,
            range,
            code,
            vars: None,
        }
    }

    /// `path/filename`, or just the filename.
    pub fn filepath(&self) -> String {
        match &self.path {
            Some(dir) => format!("{dir}/{}", self.filename),
            None => self.filename.clone(),
        }
    }

    pub fn defines_var(&self, basename: &str) -> bool {
        !basename.is_empty() && self.vars.as_ref().is_some_and(|v| v.contains_key(basename))
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Doclet {
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memberof: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classdesc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(rename = "this", skip_serializing_if = "Option::is_none")]
    pub this_binding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaultvalue: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherits: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Param>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub returns: Vec<Param>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<Param>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub borrowed: Vec<Borrow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mixes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub augments: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fires: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub listens: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub see: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub todo: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub author: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<ComponentProp>,
    /// Tags without a dictionary entry, kept verbatim.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    #[serde(rename = "virtual", skip_serializing_if = "is_false")]
    pub is_virtual: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub readonly: bool,
    #[serde(rename = "isEnum", skip_serializing_if = "is_false")]
    pub is_enum: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub ignore: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub undocumented: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub inherited: bool,

    #[serde(skip)]
    pub force_memberof: bool,
    #[serde(skip)]
    pub preserve_name: bool,

    pub meta: Meta,

    /// Fields without a dedicated slot, such as markdown page headers.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

// -- Comment text -------------------------------------------------------------

static RE_OPENING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/\*\*+").unwrap());
static RE_CLOSING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\**\*/$").unwrap());
static RE_MARGIN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*(\* ?|\\Z)").unwrap());
static RE_END_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\\Z$").unwrap());
static RE_TAG_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(\s*)@(\S)").unwrap());
static RE_TAG_PARTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)(?:\s+(\S[\s\S]*))?").unwrap());
static RE_DOT_PROTOTYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.prototype").unwrap());

/// Strip the comment delimiters and the `* ` left margin. Trailing
/// whitespace inside lines is kept for examples.
pub fn unwrap(comment: &str) -> String {
    if comment.is_empty() {
        return String::new();
    }
    let s = RE_OPENING.replace(comment, "");
    let s = RE_CLOSING.replace(&s, "\\Z");
    let s = RE_MARGIN.replace_all(&s, "");
    RE_END_MARKER.replace(&s, "").into_owned()
}

/// Untagged leading text becomes a description, or a class description
/// when the comment sits on a class.
fn fix_description(src: &str, code: &Code) -> String {
    let starts_with_tag = src.trim_start().starts_with('@');
    if starts_with_tag || src.chars().all(char::is_whitespace) {
        return src.to_string();
    }
    let is_class = matches!(
        code.node_type.as_deref(),
        Some("ClassDeclaration" | "ClassExpression")
    );
    let title = if is_class { "@classdesc" } else { "@description" };
    format!("{title} {src}")
}

/// Split unwrapped comment text into `(title, text)` pairs. Tags start
/// with `@` at the beginning of a line.
pub fn to_tags(src: &str) -> Vec<(String, Option<String>)> {
    let marked = RE_TAG_START.replace_all(src, "${1}\\@${2}");
    marked
        .split("\\@")
        .filter(|chunk| !chunk.is_empty())
        .filter_map(|chunk| {
            let caps = RE_TAG_PARTS.captures(chunk)?;
            let title = caps.get(1)?.as_str().to_string();
            let text = caps.get(2).map(|m| m.as_str().to_string());
            Some((title, text))
        })
        .collect()
}

impl Doclet {
    /// Build a doclet from a raw comment and the code it documents.
    pub fn new(comment: &str, meta: Meta, unknown_tags: &UnknownTags) -> Result<Doclet> {
        let mut doclet = Doclet {
            comment: comment.to_string(),
            meta,
            ..Default::default()
        };
        let src = fix_description(&unwrap(comment), &doclet.meta.code);
        for (title, text) in to_tags(&src) {
            doclet.add_tag_with(&title, text.as_deref(), unknown_tags)?;
        }
        doclet.post_process();
        Ok(doclet)
    }

    /// Settle names and kind once every tag is in.
    pub fn post_process(&mut self) {
        if !self.preserve_name {
            name::resolve(self);
        }
        if let Some(name) = self.name.clone().filter(|n| !n.is_empty()) {
            if self.longname.is_none() {
                self.set_longname(&name);
            }
        }
        if self.memberof.as_deref() == Some("") {
            self.memberof = None;
        }
        if self.kind.is_none() {
            self.kind = Some(self.meta.code.inferred_kind.unwrap_or(Kind::Member));
        }
        if let (Some(variation), Some(longname)) = (&self.variation, &mut self.longname) {
            if !longname.ends_with(')') {
                longname.push_str(&format!("({variation})"));
            }
        }
        let paramnames = &self.meta.code.paramnames;
        for (i, param) in self.params.iter_mut().enumerate() {
            if param.name.as_deref().unwrap_or("").is_empty() {
                param.name = Some(paramnames.get(i).cloned().unwrap_or_default());
            }
        }
    }

    /// Apply a tag with unknown tags tolerated.
    pub fn add_tag(&mut self, title: &str, text: Option<&str>) -> Result<()> {
        self.add_tag_with(title, text, &UnknownTags::Flag(true))
    }

    pub fn add_tag_with(
        &mut self,
        title: &str,
        text: Option<&str>,
        unknown_tags: &UnknownTags,
    ) -> Result<()> {
        let tag = Tag::new(title, text, &self.meta, unknown_tags);
        match dictionary::lookup(&tag.title) {
            Some(def) => {
                if let Some(on_tagged) = def.on_tagged {
                    on_tagged(self, &tag)?;
                }
            }
            None => self.tags.push(tag.clone()),
        }
        self.apply_tag(&tag);
        Ok(())
    }

    fn apply_tag(&mut self, tag: &Tag) {
        let Some(TagValue::Text(text)) = &tag.value else {
            return;
        };
        match tag.title.as_str() {
            "name" => self.name = Some(text.clone()),
            "kind" => match Kind::parse(text) {
                Some(kind) => self.kind = Some(kind),
                None => tracing::warn!(
                    kind = %text,
                    file = %self.meta.filepath(),
                    "unknown doclet kind"
                ),
            },
            "description" => self.description = Some(text.clone()),
            _ => {}
        }
    }

    pub fn set_memberof(&mut self, sid: &str) {
        let owner = name::remove_global(sid);
        self.memberof = Some(RE_DOT_PROTOTYPE.replace_all(&owner, "#").into_owned());
    }

    pub fn set_longname(&mut self, name: &str) {
        let mut longname = name::remove_global(name);
        if let Some(kind) = self.kind.filter(|k| dictionary::is_namespace(*k)) {
            longname = name::apply_namespace(&longname, kind.as_str());
        }
        self.longname = Some(longname);
    }

    pub fn set_scope(&mut self, scope: &str) -> Result<()> {
        match Scope::parse(scope) {
            Some(scope) => {
                self.scope = Some(scope);
                Ok(())
            }
            None => Err(Error::InvalidScope {
                scope: scope.to_string(),
                allowed: Scope::NAMES.join(", "),
                file: self.meta.filepath(),
            }),
        }
    }

    pub fn borrow(&mut self, from: &str, alias: Option<&str>) {
        self.borrowed.push(Borrow {
            from: from.to_string(),
            alias: alias.map(str::to_string),
        });
    }

    pub fn mix(&mut self, source: &str) {
        self.mixes.push(source.to_string());
    }

    pub fn augment(&mut self, base: &str) {
        self.augments.push(base.to_string());
    }

    pub fn longname(&self) -> &str {
        self.longname.as_deref().unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Copy every field `later` sets over this one. Lists are replaced,
    /// not concatenated, and flags only ever switch on.
    pub fn merge_from(&mut self, later: Doclet) {
        macro_rules! take_opt {
            ($($field:ident),*) => {$(
                if later.$field.is_some() {
                    self.$field = later.$field;
                }
            )*};
        }
        macro_rules! take_vec {
            ($($field:ident),*) => {$(
                if !later.$field.is_empty() {
                    self.$field = later.$field;
                }
            )*};
        }
        macro_rules! take_flag {
            ($($field:ident),*) => {$(
                if later.$field {
                    self.$field = true;
                }
            )*};
        }

        if !later.comment.is_empty() {
            self.comment = later.comment;
        }
        take_opt!(
            name, longname, kind, scope, memberof, description, classdesc, summary, alias, access,
            this_binding, variation, since, version, license, deprecated, defaultvalue, inherits,
            ty, markdown
        );
        take_vec!(
            params, properties, returns, exceptions, borrowed, mixes, augments, fires, listens,
            requires, see, examples, todo, author, props, tags
        );
        take_flag!(
            is_virtual, readonly, is_enum, ignore, undocumented, inherited, force_memberof,
            preserve_name
        );
        if !later.meta.filename.is_empty() {
            self.meta = later.meta;
        }
        self.extra.extend(later.extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doclet(comment: &str) -> Doclet {
        let meta = Meta::new("src/a.js", 1, 0, None, Code::default());
        Doclet::new(comment, meta, &UnknownTags::Flag(true)).unwrap()
    }

    #[test]
    fn unwrap_strips_delimiters_and_margin() {
        assert_eq!(unwrap("/**\n * Hello.\n * @param x\n */"), "Hello.\n@param x\n");
        assert_eq!(unwrap("/** One line. */"), " One line.");
    }

    #[test]
    fn to_tags_splits_on_line_leading_at() {
        let tags = to_tags("@description Hi there\n@param {string} x - the x\n@ignore");
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0], ("description".into(), Some("Hi there\n".into())));
        assert_eq!(tags[2], ("ignore".into(), None));
    }

    #[test]
    fn email_in_text_is_not_a_tag() {
        let tags = to_tags("@author Jane jane@example.com");
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn leading_text_becomes_description() {
        let d = doclet("/** Does things.\n * @name foo */");
        assert_eq!(d.description.as_deref(), Some("Does things."));
        assert_eq!(d.name.as_deref(), Some("foo"));
        assert_eq!(d.longname.as_deref(), Some("foo"));
        assert_eq!(d.kind, Some(Kind::Member));
    }

    #[test]
    fn class_code_gets_classdesc() {
        let code = Code {
            node_type: Some("ClassDeclaration".into()),
            inferred_kind: Some(Kind::Class),
            name: Some("Foo".into()),
            ..Default::default()
        };
        let meta = Meta::new("a.js", 1, 0, None, code);
        let d = Doclet::new("/** Widget. */", meta, &UnknownTags::Flag(true)).unwrap();
        assert_eq!(d.classdesc.as_deref(), Some("Widget."));
        assert_eq!(d.description, None);
        assert_eq!(d.kind, Some(Kind::Class));
    }

    #[test]
    fn unknown_tags_are_kept() {
        let d = doclet("/** @name foo\n * @frobnicate hard */");
        assert_eq!(d.tags.len(), 1);
        assert_eq!(d.tags[0].title, "frobnicate");
        assert_eq!(d.tags[0].text, "hard");
    }

    #[test]
    fn param_names_backfilled_from_code() {
        let code = Code {
            paramnames: vec!["a".into(), "b".into()],
            inferred_kind: Some(Kind::Function),
            ..Default::default()
        };
        let meta = Meta::new("a.js", 1, 0, None, code);
        let comment = "/** @param {number}\n @param {string} b */";
        let d = Doclet::new(comment, meta, &UnknownTags::Flag(true)).unwrap();
        assert_eq!(d.params[0].name.as_deref(), Some("a"));
        assert_eq!(d.params[1].name.as_deref(), Some("b"));
        assert_eq!(d.kind, Some(Kind::Function));
    }

    #[test]
    fn invalid_scope_is_an_error() {
        let mut d = doclet("/** @name foo */");
        let err = d.set_scope("outer").unwrap_err();
        assert!(matches!(err, Error::InvalidScope { .. }));
        assert!(d.set_scope("inner").is_ok());
        assert_eq!(d.scope, Some(Scope::Inner));
    }

    #[test]
    fn memberof_prototype_becomes_instance() {
        let mut d = doclet("/** @name foo */");
        d.set_memberof("<global>.Foo.prototype");
        assert_eq!(d.memberof.as_deref(), Some("Foo#"));
    }

    #[test]
    fn variation_appended_to_longname() {
        let d = doclet("/** @function foo\n * @variation 2 */");
        assert_eq!(d.longname.as_deref(), Some("foo(2)"));
    }

    #[test]
    fn meta_splits_path() {
        let meta = Meta::new("lib/util/a.js", 3, 4, Some([1, 2]), Code::default());
        assert_eq!(meta.filename, "a.js");
        assert_eq!(meta.path.as_deref(), Some("lib/util"));
        assert_eq!(meta.filepath(), "lib/util/a.js");
        assert_eq!(Meta::new("a.js", 1, 0, None, Code::default()).path, None);
    }

    #[test]
    fn merge_overwrites_present_fields_only() {
        let mut first = doclet("/** First.\n * @name foo\n * @param a */");
        let second = Doclet {
            description: Some("Second.".into()),
            ..Default::default()
        };
        first.merge_from(second);
        assert_eq!(first.description.as_deref(), Some("Second."));
        assert_eq!(first.params.len(), 1);
        assert_eq!(first.meta.filename, "a.js");
    }
}
