//! GitHub-flavored markdown renderer.
//!
//! One page: an index per category, then a section for every categorized
//! doclet followed by the doclets it owns.

use anyhow::Result;
use jsdoclet_core::doclet::{ComponentProp, Param};
use jsdoclet_core::{Doclet, DocletIndex, Kind, Members, Processed, Scope};
use serde_json::Value;

use crate::render::Renderer;
use crate::toc;

pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, processed: &Processed) -> Result<String> {
        let members = processed.members();
        let groups = categories(&members);
        let mut output = String::new();

        let listed: usize = groups.iter().map(|(_, group)| group.len()).sum();
        if listed > 0 {
            output.push_str("## Index\n\n");
            for &(title, group) in &groups {
                if group.is_empty() {
                    continue;
                }
                output.push_str(&format!("### {}\n\n", title));
                for doclet in group {
                    output.push_str(&toc::render_toc_item(doclet.longname()));
                    output.push('\n');
                }
                output.push('\n');
            }
        }

        for &(title, group) in &groups {
            if group.is_empty() {
                continue;
            }
            output.push_str(&format!("## {}\n\n", title));
            for doclet in group {
                output.push_str(&render_doclet(doclet, "###", &processed.index));
                output.push('\n');
                for member in owned_by(processed, doclet.longname()) {
                    output.push_str(&render_doclet(member, "####", &processed.index));
                    output.push('\n');
                }
            }
        }

        Ok(output)
    }

    fn file_extension(&self) -> &str {
        "md"
    }
}

fn categories<'a>(members: &'a Members<'a>) -> [(&'static str, &'a [&'a Doclet]); 8] {
    [
        ("Modules", members.modules.as_slice()),
        ("Namespaces", members.namespaces.as_slice()),
        ("Classes", members.classes.as_slice()),
        ("Components", members.components.as_slice()),
        ("Mixins", members.mixins.as_slice()),
        ("Interfaces", members.interfaces.as_slice()),
        ("Events", members.events.as_slice()),
        ("Globals", members.globals.as_slice()),
    ]
}

fn owned_by<'a>(processed: &'a Processed, owner: &'a str) -> impl Iterator<Item = &'a Doclet> {
    processed
        .doclets
        .iter()
        .filter(move |d| d.memberof.as_deref() == Some(owner))
}

/// Render one doclet's section.
fn render_doclet(doclet: &Doclet, level: &str, index: &DocletIndex) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("{} {}\n", level, toc::escape(doclet.longname())));

    let badges = render_badges(doclet);
    if !badges.is_empty() {
        lines.push(badges);
        lines.push(String::new());
    }

    if let Some(signature) = signature(doclet) {
        lines.push(format!("```js\n{}\n```\n", signature));
    }

    if let Some(desc) = doclet.classdesc.as_ref().filter(|_| doclet.kind == Some(Kind::Class)) {
        if doclet.description.as_ref() != Some(desc) {
            lines.push(desc.clone());
            lines.push(String::new());
        }
    }
    if let Some(ref desc) = doclet.description {
        lines.push(desc.clone());
        lines.push(String::new());
    }

    if let Some(ref ty) = doclet.ty {
        lines.push(format!("**Type:** `{}`\n", ty.join(" | ")));
    }

    if let Some(ref deprecated) = doclet.deprecated {
        match deprecated {
            Value::String(reason) => lines.push(format!("> **Deprecated:** {}\n", reason)),
            _ => lines.push("> **Deprecated**\n".to_string()),
        }
    }

    if !doclet.params.is_empty() {
        lines.push("#### Parameters\n".to_string());
        lines.extend(render_param_table(&doclet.params));
        lines.push(String::new());
    }

    if !doclet.properties.is_empty() {
        lines.push("#### Properties\n".to_string());
        lines.extend(render_param_table(&doclet.properties));
        lines.push(String::new());
    }

    if !doclet.props.is_empty() {
        lines.push("#### Props\n".to_string());
        lines.extend(render_prop_table(&doclet.props));
        lines.push(String::new());
    }

    if !doclet.returns.is_empty() {
        lines.push("#### Returns\n".to_string());
        for ret in &doclet.returns {
            lines.push(format!("* {}", render_typed(ret)));
        }
        lines.push(String::new());
    }

    if !doclet.exceptions.is_empty() {
        lines.push("#### Throws\n".to_string());
        for err in &doclet.exceptions {
            lines.push(format!("* {}", render_typed(err)));
        }
        lines.push(String::new());
    }

    for example in &doclet.examples {
        lines.push("#### Example\n".to_string());
        lines.push("```js".to_string());
        lines.push(example.trim_end().to_string());
        lines.push("```".to_string());
        lines.push(String::new());
    }

    if !doclet.see.is_empty() {
        lines.push("#### See also\n".to_string());
        for see in &doclet.see {
            let known = !index.documented(see).is_empty();
            lines.push(format!("* {}", toc::render_see_link(see, known)));
        }
        lines.push(String::new());
    }

    if let Some(ref page) = doclet.markdown {
        lines.push(page.trim_end().to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// `name(a, b)` for callables. Nested param entries (`opts.x`) are left out.
fn signature(doclet: &Doclet) -> Option<String> {
    if !matches!(doclet.kind, Some(Kind::Function | Kind::Class | Kind::Event)) {
        return None;
    }
    let names: Vec<String> = if doclet.params.is_empty() {
        doclet.meta.code.paramnames.clone()
    } else {
        doclet
            .params
            .iter()
            .filter_map(|p| p.name.as_deref())
            .filter(|n| !n.contains('.'))
            .map(str::to_string)
            .collect()
    };
    let prefix = if doclet.kind == Some(Kind::Class) { "new " } else { "" };
    Some(format!("{}{}({})", prefix, doclet.name(), names.join(", ")))
}

fn render_badges(doclet: &Doclet) -> String {
    let mut badges: Vec<String> = Vec::new();
    if let Some(kind) = doclet.kind {
        badges.push(format!("`{}`", kind));
    }
    if let Some(scope) = doclet.scope {
        let scope = match scope {
            Scope::Global => "global",
            Scope::Inner => "inner",
            Scope::Instance => "instance",
            Scope::Static => "static",
        };
        badges.push(format!("`{}`", scope));
    }
    if let Some(ref access) = doclet.access {
        badges.push(format!("*`{}`*", access));
    }
    if doclet.readonly {
        badges.push("*`readonly`*".to_string());
    }
    if let Some(ref since) = doclet.since {
        badges.push(format!("since `{}`", since));
    }
    if let Some(ref inherits) = doclet.inherits {
        badges.push(format!("inherited from {}", toc::render_toc_link(inherits)));
    }
    if badges.is_empty() {
        return String::new();
    }
    format!("> {}", badges.join(" "))
}

fn type_cell(ty: &Option<Vec<String>>) -> String {
    match ty {
        Some(names) if !names.is_empty() => format!("`{}`", names.join(" \\| ")),
        _ => String::new(),
    }
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn default_cell(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => format!("`\"{}\"`", s),
        Some(other) => format!("`{}`", other),
        None => String::new(),
    }
}

fn render_param_table(params: &[Param]) -> Vec<String> {
    let mut rows = vec![
        "| Name | Type | Default | Description |".to_string(),
        "| ---- | ---- | ------- | ----------- |".to_string(),
    ];
    for param in params {
        let mut name = format!("`{}`", param.name.as_deref().unwrap_or(""));
        if param.variable == Some(true) {
            name = format!("...{}", name);
        }
        if param.optional == Some(true) {
            name.push_str(" *(optional)*");
        }
        if param.nullable == Some(true) {
            name.push_str(" *(nullable)*");
        }
        rows.push(format!(
            "| {} | {} | {} | {} |",
            name,
            type_cell(&param.ty),
            default_cell(&param.defaultvalue),
            cell(param.description.as_deref().unwrap_or("")),
        ));
    }
    rows
}

fn render_prop_table(props: &[ComponentProp]) -> Vec<String> {
    let mut rows = vec![
        "| Prop | Type | Required | Default | Description |".to_string(),
        "| ---- | ---- | -------- | ------- | ----------- |".to_string(),
    ];
    for prop in props {
        rows.push(format!(
            "| `{}` | {} | {} | {} | {} |",
            prop.name,
            prop.ty.as_deref().map(|t| format!("`{}`", cell(t))).unwrap_or_default(),
            if prop.required { "yes" } else { "" },
            default_cell(&prop.default_value),
            cell(prop.description.as_deref().unwrap_or("")),
        ));
    }
    rows
}

/// `` `Type`: description `` for returns and throws entries.
fn render_typed(entry: &Param) -> String {
    let ty = type_cell(&entry.ty).replace("\\|", "|");
    match (ty.is_empty(), entry.description.as_deref()) {
        (false, Some(desc)) => format!("{}: {}", ty, desc),
        (false, None) => ty,
        (true, Some(desc)) => desc.to_string(),
        (true, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsdoclet_core::RunContext;

    fn render(source: &str) -> String {
        let mut run = RunContext::default();
        let doclets = run.parse_source(source, "lib.js").unwrap();
        let processed = jsdoclet_core::pipeline::process(doclets, &mut run.plugins);
        MarkdownRenderer.render(&processed).unwrap()
    }

    #[test]
    fn global_function_with_params() {
        let out = render(
            "/**\n * Adds two numbers.\n * @param {number} a - First.\n * @param {number} [b=1] - Second.\n * @returns {number} The sum.\n */\nfunction add(a, b) {}\n",
        );
        assert!(out.contains("## Index"));
        assert!(out.contains("* [add](#add)"));
        assert!(out.contains("## Globals"));
        assert!(out.contains("### add\n"));
        assert!(out.contains("add(a, b)"));
        assert!(out.contains("Adds two numbers."));
        assert!(out.contains("| `a` | `number` |  | First. |"));
        assert!(out.contains("`b` *(optional)*"));
        assert!(out.contains("#### Returns"));
        assert!(out.contains("* `number`: The sum."));
    }

    #[test]
    fn class_lists_its_members() {
        let out = render("/** A widget. */\nclass Widget {\n  /** Draws it. */\n  draw() {}\n}\n");
        assert!(out.contains("## Classes"));
        assert!(out.contains("### Widget"));
        assert!(out.contains("new Widget()"));
        assert!(out.contains("#### Widget#draw"));
        assert!(out.contains("Draws it."));
    }

    #[test]
    fn see_links_only_point_at_documented_sections() {
        let out = render(
            "/**\n * Adds.\n * @see sub\n * @see gone\n */\nfunction add() {}\n/** Subtracts. */\nfunction sub() {}\n",
        );
        // Once in the index, once under "See also".
        assert_eq!(out.matches("* [sub](#sub)").count(), 2);
        assert!(out.contains("* `gone`"));
    }

    #[test]
    fn empty_collection_renders_nothing() {
        assert_eq!(render("var x = 1;\n"), "");
    }

    #[test]
    fn typed_entries() {
        let entry = Param {
            ty: Some(vec!["string".into(), "null".into()]),
            description: Some("Maybe.".into()),
            ..Default::default()
        };
        assert_eq!(render_typed(&entry), "`string | null`: Maybe.");
        assert_eq!(render_typed(&Param::default()), "");
    }
}
