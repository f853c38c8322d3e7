//! Formatting utilities (model Markdown → Telegram HTML).

use std::sync::OnceLock;

use regex::Regex;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

struct MarkdownRules {
    code: Regex,
    bold: Regex,
    italic: Regex,
    link: Regex,
}

fn rules() -> &'static MarkdownRules {
    static RULES: OnceLock<MarkdownRules> = OnceLock::new();
    RULES.get_or_init(|| MarkdownRules {
        code: Regex::new(r"`([^`\n]+)`").expect("valid regex"),
        bold: Regex::new(r"\*\*([^*\n]+)\*\*|__([^_\n]+)__").expect("valid regex"),
        italic: Regex::new(r"(^|[^*\w])\*([^*\s][^*\n]*?)\*|(^|[^_\w])_([^_\s][^_\n]*?)_")
            .expect("valid regex"),
        link: Regex::new(r"\[([^\]\n]+)\]\((https?://[^)\s]+)\)").expect("valid regex"),
    })
}

/// Convert the Markdown subset that model summaries use to Telegram HTML.
///
/// Telegram HTML supports only `<b>`, `<i>`, `<code>`, `<pre>` and `<a href>`;
/// everything else is escaped. Headers become bold lines and list markers
/// become bullets.
pub fn convert_markdown_to_html(input: &str) -> String {
    let r = rules();

    let lines: Vec<String> = escape_html(input)
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                return format!("• {rest}");
            }
            let hashes = trimmed.chars().take_while(|c| *c == '#').count();
            if (1..=6).contains(&hashes) {
                if let Some(rest) = trimmed[hashes..].strip_prefix(' ') {
                    return format!("**{rest}**");
                }
            }
            line.to_string()
        })
        .collect();
    let text = lines.join("\n");

    let text = r.code.replace_all(&text, "<code>$1</code>");
    let text = r.bold.replace_all(&text, "<b>$1$2</b>");
    let text = r.italic.replace_all(&text, "$1$3<i>$2$4</i>");
    let text = r.link.replace_all(&text, r#"<a href="$2">$1</a>"#);
    text.into_owned()
}
