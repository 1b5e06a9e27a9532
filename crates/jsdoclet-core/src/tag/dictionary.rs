//! Recognised tags, their synonyms and what each does to a doclet.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::doclet::{Doclet, Kind, Param};
use crate::error::Result;
use crate::name;
use crate::tag::{value, Tag};

pub type OnTagged = fn(&mut Doclet, &Tag) -> Result<()>;

#[derive(Debug, Clone, Copy)]
pub struct TagDef {
    pub title: &'static str,
    pub synonyms: &'static [&'static str],
    pub can_have_type: bool,
    pub can_have_name: bool,
    pub must_have_value: bool,
    pub must_not_have_value: bool,
    pub must_not_have_description: bool,
    pub keeps_whitespace: bool,
    pub removes_indent: bool,
    pub is_namespace: bool,
    /// Rewrites the raw text before it is parsed.
    pub on_tag_text: Option<fn(&str) -> String>,
    pub on_tagged: Option<OnTagged>,
}

const BASE: TagDef = TagDef {
    title: "",
    synonyms: &[],
    can_have_type: false,
    can_have_name: false,
    must_have_value: false,
    must_not_have_value: false,
    must_not_have_description: false,
    keeps_whitespace: false,
    removes_indent: false,
    is_namespace: false,
    on_tag_text: None,
    on_tagged: None,
};

static DEFINITIONS: LazyLock<HashMap<&'static str, TagDef>> =
    LazyLock::new(|| definitions().into_iter().map(|d| (d.title, d)).collect());

static SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map: HashMap<&'static str, &'static str> = DEFINITIONS
        .values()
        .flat_map(|d| d.synonyms.iter().map(move |s| (*s, d.title)))
        .collect();
    map.insert("memberof!", "memberof");
    map
});

pub fn lookup(title: &str) -> Option<&'static TagDef> {
    DEFINITIONS.get(title)
}

/// The canonical title for `title`, which may be a synonym.
pub fn normalise(title: &str) -> String {
    let lower = title.to_lowercase();
    match SYNONYMS.get(lower.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => lower,
    }
}

/// Kinds whose longnames carry a `kind:` prefix.
pub fn is_namespace(kind: Kind) -> bool {
    DEFINITIONS.get(kind.as_str()).is_some_and(|d| d.is_namespace)
}

// -- Helpers ------------------------------------------------------------------

fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}

fn text_of(tag: &Tag) -> &str {
    tag.value_text().unwrap_or(&tag.text)
}

fn set_kind_to_title(doclet: &mut Doclet, tag: &Tag) {
    if let Some(kind) = Kind::parse(&tag.title) {
        doclet.kind = Some(kind);
    }
}

/// Long tags name the symbol in their description, short ones in the text.
fn set_name_to_value(doclet: &mut Doclet, tag: &Tag) {
    let described = tag.parsed().and_then(|p| p.description.clone());
    match described {
        Some(name) => doclet.name = Some(name),
        None if tag.value_text().is_some() => doclet.name = Some(tag.text.clone()),
        None => {}
    }
}

fn set_name_to_value_name(doclet: &mut Doclet, tag: &Tag) {
    if let Some(name) = tag.parsed().and_then(|p| p.name.clone()) {
        doclet.name = Some(name);
    }
}

fn set_type_to_value_type(doclet: &mut Doclet, tag: &Tag) {
    if let Some(ty) = tag.parsed().and_then(|p| p.ty.clone()) {
        doclet.ty = Some(ty);
    }
}

fn set_name_to_file_stem(doclet: &mut Doclet) {
    let stem = doclet
        .meta
        .filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(&doclet.meta.filename)
        .to_string();
    if !stem.is_empty() {
        doclet.name = Some(stem);
    }
}

fn param_value(tag: &Tag) -> Param {
    tag.parsed().cloned().unwrap_or_default()
}

fn push_extra(doclet: &mut Doclet, key: &str, value: Value) {
    match doclet.extra.entry(key.to_string()).or_insert_with(|| Value::Array(Vec::new())) {
        Value::Array(items) => items.push(value),
        other => *other = value,
    }
}

fn type_or_text(text: &str) -> String {
    let (expression, _) = value::extract_type_expression(text);
    if expression.is_empty() {
        text.to_string()
    } else {
        expression
    }
}

// -- Hooks --------------------------------------------------------------------

fn on_virtual(doclet: &mut Doclet, _: &Tag) -> Result<()> {
    doclet.is_virtual = true;
    Ok(())
}

fn on_access(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    let level = if tag.title == "access" { text_of(tag) } else { tag.title.as_str() };
    let known = matches!(level, "private" | "protected" | "public" | "package");
    doclet.access = known.then(|| level.to_string());
    Ok(())
}

fn on_alias(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.alias = Some(tag.text.clone());
    Ok(())
}

fn on_augments(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.augment(first_word(text_of(tag)));
    Ok(())
}

fn on_author(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.author.push(tag.text.clone());
    Ok(())
}

fn on_borrows(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    let text = tag.text.as_str();
    match text.split_once(" as ") {
        Some((from, alias)) => doclet.borrow(from.trim(), Some(alias.trim())),
        None => doclet.borrow(text.trim(), None),
    }
    Ok(())
}

fn on_class(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.kind = Some(Kind::Class);
    if tag.original_title == "class" {
        // `@class` followed by prose is a class description, unless one
        // was given explicitly.
        let several_words = tag.text.split_whitespace().nth(1).is_some();
        let lower = doclet.comment.to_lowercase();
        let has_constructor = lower.contains("@constructor") || lower.contains("@constructs");
        if (several_words || has_constructor) && !lower.contains("@classdesc") {
            if !tag.text.is_empty() {
                doclet.classdesc = Some(tag.text.clone());
            }
            return Ok(());
        }
    }
    set_name_to_value(doclet, tag);
    Ok(())
}

fn on_classdesc(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.classdesc = Some(tag.text.clone());
    Ok(())
}

fn on_kind_and_name(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    set_kind_to_title(doclet, tag);
    set_name_to_value(doclet, tag);
    Ok(())
}

fn on_typed_member(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    set_kind_to_title(doclet, tag);
    set_name_to_value_name(doclet, tag);
    set_type_to_value_type(doclet, tag);
    Ok(())
}

fn on_namespace(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    set_kind_to_title(doclet, tag);
    set_name_to_value(doclet, tag);
    set_type_to_value_type(doclet, tag);
    Ok(())
}

fn on_constructs(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    let owner = first_word(&tag.text);
    doclet.alias = Some(if owner.is_empty() { "{@thisClass}" } else { owner }.to_string());
    doclet.kind = Some(Kind::Class);
    Ok(())
}

fn on_default(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    if !tag.text.is_empty() {
        doclet.defaultvalue = value::cast(&tag.text);
        return Ok(());
    }
    let code = &doclet.meta.code;
    let Some(code_value) = code.value.clone() else {
        return Ok(());
    };
    match code.node_type.as_deref() {
        Some("Literal") => doclet.defaultvalue = Some(code_value),
        Some("ArrayExpression") => {
            doclet.defaultvalue = Some(code_value);
            doclet.extra.insert("defaultvaluetype".into(), Value::from("array"));
        }
        Some("ObjectExpression") => {
            doclet.defaultvalue = Some(code_value);
            doclet.extra.insert("defaultvaluetype".into(), Value::from("object"));
        }
        _ => {}
    }
    Ok(())
}

fn on_deprecated(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.deprecated = Some(if tag.text.is_empty() {
        Value::Bool(true)
    } else {
        Value::String(tag.text.clone())
    });
    Ok(())
}

fn on_enum(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.kind.get_or_insert(Kind::Member);
    doclet.is_enum = true;
    set_type_to_value_type(doclet, tag);
    Ok(())
}

fn on_example(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.examples.push(tag.text.clone());
    Ok(())
}

fn on_exports(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    let module = first_word(&tag.text);
    let module = module.strip_prefix(name::MODULE_NAMESPACE).unwrap_or(module);
    doclet.alias = Some(module.to_string());
    doclet.kind = Some(Kind::Module);
    Ok(())
}

fn on_external(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    set_kind_to_title(doclet, tag);
    let first_type = tag.parsed().and_then(|p| p.ty.as_ref()).and_then(|t| t.first()).cloned();
    match first_type {
        Some(ty) => {
            set_type_to_value_type(doclet, tag);
            doclet.name = Some(ty);
        }
        None => set_name_to_value(doclet, tag),
    }
    Ok(())
}

fn on_file(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.name = Some(doclet.meta.filepath());
    doclet.kind = Some(Kind::File);
    if !tag.text.is_empty() {
        doclet.description = Some(tag.text.clone());
    }
    doclet.preserve_name = true;
    Ok(())
}

fn on_fires(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.fires.push(name::apply_namespace(&tag.text, "event"));
    Ok(())
}

fn on_listens(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.listens.push(name::apply_namespace(&tag.text, "event"));
    Ok(())
}

fn on_global(doclet: &mut Doclet, _: &Tag) -> Result<()> {
    doclet.scope = Some(crate::doclet::Scope::Global);
    doclet.memberof = None;
    Ok(())
}

fn on_flag(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.extra.insert(tag.title.clone(), Value::Bool(true));
    Ok(())
}

fn on_ignore(doclet: &mut Doclet, _: &Tag) -> Result<()> {
    doclet.ignore = true;
    Ok(())
}

fn on_implements(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    push_extra(doclet, "implements", Value::from(first_word(&tag.text)));
    Ok(())
}

fn on_scope(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.set_scope(&tag.title)
}

fn on_lends(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    let target = if tag.text.is_empty() { name::GLOBAL } else { tag.text.as_str() };
    doclet.alias = Some(target.to_string());
    doclet.undocumented = true;
    Ok(())
}

fn on_license(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.license = Some(tag.text.clone());
    Ok(())
}

fn on_memberof(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    if tag.original_title == "memberof!" {
        doclet.force_memberof = true;
        if tag.text == name::GLOBAL {
            doclet.scope = Some(crate::doclet::Scope::Global);
            doclet.memberof = None;
        }
    }
    doclet.set_memberof(&tag.text);
    Ok(())
}

fn on_mixes(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.mix(&tag.text);
    Ok(())
}

fn on_module(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    set_kind_to_title(doclet, tag);
    set_name_to_file_stem(doclet);
    set_name_to_value(doclet, tag);
    set_type_to_value_type(doclet, tag);
    Ok(())
}

fn on_param(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.params.push(param_value(tag));
    Ok(())
}

fn on_property(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.properties.push(param_value(tag));
    Ok(())
}

fn on_readonly(doclet: &mut Doclet, _: &Tag) -> Result<()> {
    doclet.readonly = true;
    Ok(())
}

fn on_requires(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    let module = first_word(&tag.text);
    let module = if module.starts_with(name::MODULE_NAMESPACE) {
        module.to_string()
    } else {
        format!("{}{module}", name::MODULE_NAMESPACE)
    };
    doclet.requires.push(module);
    Ok(())
}

fn on_returns(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.returns.push(param_value(tag));
    Ok(())
}

fn on_see(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.see.push(tag.text.clone());
    Ok(())
}

fn on_since(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.since = Some(tag.text.clone());
    Ok(())
}

fn on_summary(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.summary = Some(tag.text.clone());
    Ok(())
}

fn on_this(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.this_binding = Some(first_word(&tag.text).to_string());
    Ok(())
}

fn on_throws(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.exceptions.push(param_value(tag));
    Ok(())
}

fn on_todo(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.todo.push(tag.text.clone());
    Ok(())
}

fn on_type(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    set_type_to_value_type(doclet, tag);
    Ok(())
}

fn on_typedef(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.kind = Some(Kind::Typedef);
    if tag.value.is_some() {
        set_name_to_value_name(doclet, tag);
        set_type_to_value_type(doclet, tag);
    }
    Ok(())
}

fn on_callback(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.kind = Some(Kind::Typedef);
    if !tag.text.is_empty() {
        doclet.name = Some(first_word(&tag.text).to_string());
        doclet.ty = Some(vec!["function".to_string()]);
    }
    Ok(())
}

fn on_undocumented(doclet: &mut Doclet, _: &Tag) -> Result<()> {
    doclet.undocumented = true;
    doclet.comment.clear();
    Ok(())
}

fn on_variation(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    let text = tag.text.as_str();
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .filter(|t| !t.is_empty())
        .unwrap_or(text);
    doclet.variation = Some(inner.to_string());
    Ok(())
}

fn on_version(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.version = Some(tag.text.clone());
    Ok(())
}

fn on_copyright(doclet: &mut Doclet, tag: &Tag) -> Result<()> {
    doclet.extra.insert("copyright".into(), Value::from(tag.text.clone()));
    Ok(())
}

// -- Text rewrites ------------------------------------------------------------

/// `@type` text is always a type expression; bare names get braces.
fn type_tag_text(text: &str) -> String {
    let text: String = text.chars().filter(|c| !matches!(c, '\n' | '\r' | '\u{c}')).collect();
    if text.contains('{') {
        text
    } else {
        format!("{{{text}}}")
    }
}

// -- Table --------------------------------------------------------------------

#[rustfmt::skip]
fn definitions() -> Vec<TagDef> {
    vec![
        TagDef { title: "abstract", synonyms: &["virtual"], must_not_have_value: true, on_tagged: Some(on_virtual), ..BASE },
        TagDef { title: "access", must_have_value: true, on_tagged: Some(on_access), ..BASE },
        TagDef { title: "alias", must_have_value: true, on_tagged: Some(on_alias), ..BASE },
        TagDef {
            title: "augments",
            synonyms: &["extends"],
            must_have_value: true,
            on_tag_text: Some(type_or_text),
            on_tagged: Some(on_augments),
            ..BASE
        },
        TagDef { title: "author", must_have_value: true, on_tagged: Some(on_author), ..BASE },
        TagDef { title: "borrows", must_have_value: true, on_tagged: Some(on_borrows), ..BASE },
        TagDef { title: "class", synonyms: &["constructor"], on_tagged: Some(on_class), ..BASE },
        TagDef { title: "classdesc", on_tagged: Some(on_classdesc), ..BASE },
        TagDef { title: "component", on_tagged: Some(on_kind_and_name), ..BASE },
        TagDef {
            title: "constant",
            synonyms: &["const"],
            can_have_type: true,
            can_have_name: true,
            on_tagged: Some(on_typed_member),
            ..BASE
        },
        TagDef { title: "constructs", on_tagged: Some(on_constructs), ..BASE },
        TagDef { title: "copyright", must_have_value: true, on_tagged: Some(on_copyright), ..BASE },
        TagDef { title: "default", synonyms: &["defaultvalue"], on_tagged: Some(on_default), ..BASE },
        TagDef { title: "deprecated", on_tagged: Some(on_deprecated), ..BASE },
        TagDef { title: "description", synonyms: &["desc"], must_have_value: true, ..BASE },
        TagDef { title: "enum", can_have_type: true, on_tagged: Some(on_enum), ..BASE },
        TagDef { title: "event", is_namespace: true, on_tagged: Some(on_kind_and_name), ..BASE },
        TagDef {
            title: "example",
            keeps_whitespace: true,
            removes_indent: true,
            must_have_value: true,
            on_tagged: Some(on_example),
            ..BASE
        },
        TagDef { title: "exports", must_have_value: true, on_tagged: Some(on_exports), ..BASE },
        TagDef {
            title: "external",
            synonyms: &["host"],
            can_have_type: true,
            is_namespace: true,
            on_tagged: Some(on_external),
            ..BASE
        },
        TagDef { title: "file", synonyms: &["fileoverview", "overview"], on_tagged: Some(on_file), ..BASE },
        TagDef { title: "fires", synonyms: &["emits"], must_have_value: true, on_tagged: Some(on_fires), ..BASE },
        TagDef { title: "function", synonyms: &["func", "method"], on_tagged: Some(on_kind_and_name), ..BASE },
        TagDef { title: "global", must_not_have_value: true, on_tagged: Some(on_global), ..BASE },
        TagDef { title: "hideconstructor", must_not_have_value: true, on_tagged: Some(on_flag), ..BASE },
        TagDef { title: "ignore", must_not_have_value: true, on_tagged: Some(on_ignore), ..BASE },
        TagDef {
            title: "implements",
            must_have_value: true,
            on_tag_text: Some(type_or_text),
            on_tagged: Some(on_implements),
            ..BASE
        },
        TagDef { title: "inner", must_not_have_value: true, on_tagged: Some(on_scope), ..BASE },
        TagDef { title: "instance", must_not_have_value: true, on_tagged: Some(on_scope), ..BASE },
        TagDef { title: "interface", on_tagged: Some(on_kind_and_name), ..BASE },
        TagDef { title: "kind", must_have_value: true, ..BASE },
        TagDef { title: "lends", on_tagged: Some(on_lends), ..BASE },
        TagDef { title: "license", must_have_value: true, on_tagged: Some(on_license), ..BASE },
        TagDef { title: "listens", must_have_value: true, on_tagged: Some(on_listens), ..BASE },
        TagDef {
            title: "member",
            synonyms: &["var"],
            can_have_type: true,
            can_have_name: true,
            on_tagged: Some(on_typed_member),
            ..BASE
        },
        TagDef { title: "memberof", must_have_value: true, on_tagged: Some(on_memberof), ..BASE },
        TagDef { title: "mixes", must_have_value: true, on_tagged: Some(on_mixes), ..BASE },
        TagDef { title: "mixin", on_tagged: Some(on_kind_and_name), ..BASE },
        TagDef { title: "module", can_have_type: true, is_namespace: true, on_tagged: Some(on_module), ..BASE },
        TagDef { title: "name", must_have_value: true, ..BASE },
        TagDef { title: "namespace", can_have_type: true, on_tagged: Some(on_namespace), ..BASE },
        TagDef { title: "override", must_not_have_value: true, on_tagged: Some(on_flag), ..BASE },
        TagDef { title: "package", on_tagged: Some(on_access), ..BASE },
        TagDef {
            title: "param",
            synonyms: &["arg", "argument"],
            can_have_type: true,
            can_have_name: true,
            on_tagged: Some(on_param),
            ..BASE
        },
        TagDef { title: "private", on_tagged: Some(on_access), ..BASE },
        TagDef {
            title: "property",
            synonyms: &["prop"],
            can_have_type: true,
            can_have_name: true,
            on_tagged: Some(on_property),
            ..BASE
        },
        TagDef { title: "protected", on_tagged: Some(on_access), ..BASE },
        TagDef { title: "public", must_not_have_value: true, on_tagged: Some(on_access), ..BASE },
        TagDef { title: "readonly", must_not_have_value: true, on_tagged: Some(on_readonly), ..BASE },
        TagDef { title: "requires", must_have_value: true, on_tagged: Some(on_requires), ..BASE },
        TagDef { title: "returns", synonyms: &["return"], can_have_type: true, on_tagged: Some(on_returns), ..BASE },
        TagDef { title: "see", must_have_value: true, on_tagged: Some(on_see), ..BASE },
        TagDef { title: "since", must_have_value: true, on_tagged: Some(on_since), ..BASE },
        TagDef { title: "static", must_not_have_value: true, on_tagged: Some(on_scope), ..BASE },
        TagDef { title: "summary", must_have_value: true, on_tagged: Some(on_summary), ..BASE },
        TagDef { title: "this", must_have_value: true, on_tagged: Some(on_this), ..BASE },
        TagDef {
            title: "throws",
            synonyms: &["exception"],
            can_have_type: true,
            on_tagged: Some(on_throws),
            ..BASE
        },
        TagDef { title: "todo", must_have_value: true, on_tagged: Some(on_todo), ..BASE },
        TagDef {
            title: "type",
            can_have_type: true,
            must_not_have_description: true,
            on_tag_text: Some(type_tag_text),
            on_tagged: Some(on_type),
            ..BASE
        },
        TagDef {
            title: "typedef",
            can_have_type: true,
            can_have_name: true,
            on_tagged: Some(on_typedef),
            ..BASE
        },
        TagDef { title: "callback", must_have_value: true, on_tagged: Some(on_callback), ..BASE },
        TagDef { title: "undocumented", must_not_have_value: true, on_tagged: Some(on_undocumented), ..BASE },
        TagDef { title: "variation", must_have_value: true, on_tagged: Some(on_variation), ..BASE },
        TagDef { title: "version", must_have_value: true, on_tagged: Some(on_version), ..BASE },
    ]
}
