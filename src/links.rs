//! Discovery and rewriting of local image links.

use std::sync::OnceLock;

use regex::Regex;

fn image_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Alt text and path may each hold one level of nested brackets.
        Regex::new(concat!(
            r"!\[(?:[^\[\]\n]|\[[^\[\]\n]*\])*?\]",
            r"\(((?:[^()\n]|\([^()\n]*\))*?(?:jpg|jpeg))",
            r#"(?:\s+"[^"]*")?\)"#,
        ))
        .expect("image link pattern")
    })
}

/// Paths of `![alt](path)` images ending in `jpg`/`jpeg`, in document
/// order. Paths containing `http` are treated as remote and left out.
pub fn find_local_image_links(content: &str) -> Vec<String> {
    image_regex()
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|path| !path.contains("http"))
        .map(str::to_string)
        .collect()
}

/// Replace every literal occurrence of `old_link` with `new_ref`.
pub fn rewrite(content: &str, old_link: &str, new_ref: &str) -> String {
    if old_link.is_empty() {
        return content.to_string();
    }
    content.replace(old_link, new_ref)
}
