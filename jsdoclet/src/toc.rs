//! Markdown anchors and index entries.

/// Index link for a doclet heading.
pub fn render_toc_link(text: &str) -> String {
    format!("[{}](#{})", escape(text), github_slug(text))
}

/// Index list item.
pub fn render_toc_item(title: &str) -> String {
    format!("* {}", render_toc_link(title))
}

/// Link text for a `@see` entry: URLs and existing markdown links are kept,
/// a longname documented on the page (`known`) links to its section, and
/// anything else is shown as code.
pub fn render_see_link(text: &str, known: bool) -> String {
    if text.contains("](") {
        return text.to_string();
    }
    if ["http://", "https://", "ftp://"].iter().any(|p| text.starts_with(p)) {
        return format!("<{text}>");
    }
    if known {
        render_toc_link(text)
    } else {
        format!("`{text}`")
    }
}

/// GitHub heading anchor: lowercase, keep alphanumerics, spaces and
/// hyphens, then turn spaces into hyphens.
pub fn github_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' {
            slug.push(c);
        }
    }
    slug.replace(' ', "-")
}

/// Escape markdown emphasis and HTML brackets in longnames such as
/// `module:a~b` or `<anonymous>`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '<' | '>' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_drops_punctuation() {
        assert_eq!(github_slug("Foo#run"), "foorun");
        assert_eq!(github_slug("module:widget~make"), "modulewidgetmake");
        assert_eq!(github_slug("Hello World"), "hello-world");
        assert_eq!(github_slug("drop-index"), "drop-index");
    }

    #[test]
    fn toc_item() {
        assert_eq!(render_toc_item("Foo.create"), "* [Foo.create](#foocreate)");
        assert_eq!(render_toc_item("my_fn"), "* [my\\_fn](#myfn)");
    }

    #[test]
    fn see_links() {
        assert_eq!(render_see_link("https://example.com/x", false), "<https://example.com/x>");
        assert_eq!(render_see_link("[docs](./docs.md)", false), "[docs](./docs.md)");
        assert_eq!(render_see_link("Foo#run", true), "[Foo#run](#foorun)");
        assert_eq!(render_see_link("Foo#gone", false), "`Foo#gone`");
    }
}
