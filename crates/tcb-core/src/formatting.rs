//! Formatting utilities (template Markdown → Telegram HTML, previews).

use std::sync::OnceLock;

use regex::Regex;

static LINK_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the Markdown subset used by menu pages and broadcast templates.
///
/// Supported: `**bold**`, `` `code` ``, `[text](url)`. Single `*`/`_` are left
/// alone because template URLs routinely contain underscores.
pub fn markdown_to_html(input: &str) -> String {
    let (text, inline_codes) = extract_inline_codes(input);
    let mut text = escape_html(&text);

    // Bold never spans lines.
    text = text
        .split('\n')
        .map(|line| replace_delimited(line, "**", "<b>", "</b>"))
        .collect::<Vec<_>>()
        .join("\n");

    let link_re = LINK_RE.get_or_init(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").ok());
    if let Some(re) = link_re {
        text = re.replace_all(&text, r#"<a href="$2">$1</a>"#).to_string();
    }

    for (i, code) in inline_codes.iter().enumerate() {
        text = text.replace(
            &format!("\0INLINECODE{i}\0"),
            &format!("<code>{}</code>", escape_html(code)),
        );
    }

    text
}

/// Cut to `max_chars` characters, appending `...` when something was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    format!("{}...", text.chars().take(max_chars).collect::<String>())
}

fn extract_inline_codes(input: &str) -> (String, Vec<String>) {
    let mut codes = Vec::new();
    let mut out = String::new();

    let mut i = 0usize;
    while let Some(rel) = input[i..].find('`') {
        let start = i + rel;
        out.push_str(&input[i..start]);

        let content_start = start + 1;
        if let Some(end_rel) = input[content_start..].find('`') {
            let end = content_start + end_rel;
            codes.push(input[content_start..end].to_string());
            out.push_str(&format!("\0INLINECODE{}\0", codes.len() - 1));
            i = end + 1;
            continue;
        }

        // Unclosed: keep the rest verbatim.
        out.push_str(&input[start..]);
        return (out, codes);
    }

    out.push_str(&input[i..]);
    (out, codes)
}

fn replace_delimited(text: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::new();
    let mut i = 0usize;
    while let Some(rel) = text[i..].find(delim) {
        let start = i + rel;
        out.push_str(&text[i..start]);
        let content_start = start + delim.len();
        if let Some(end_rel) = text[content_start..].find(delim) {
            let end = content_start + end_rel;
            out.push_str(open);
            out.push_str(&text[content_start..end]);
            out.push_str(close);
            i = end + delim.len();
            continue;
        }
        out.push_str(&text[start..]);
        return out;
    }
    out.push_str(&text[i..]);
    out
}
