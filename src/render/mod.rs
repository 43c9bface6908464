//! Markdown rendering with enforced escaping
//!
//! Message text is untrusted. Every transformation in this module operates
//! on [`EscapedLine`] values that can only be produced by the escaping
//! function, so no rule can be added downstream that sees raw input and
//! reintroduces injection. The final [`SafeHtml`] output is safe to inject
//! as markup.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Markup that went through the escape-then-transform pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// One line of input with all HTML-significant characters escaped. Private
/// constructor; [`escape`] is the only way in.
struct EscapedLine(String);

fn escape(line: &str) -> EscapedLine {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    EscapedLine(out)
}

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static ORDERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());

/// Inline transforms: bold, italic, inline code. Bold runs before italic so
/// `**` pairs are not consumed as two italics.
fn inline(line: EscapedLine) -> String {
    let text = BOLD.replace_all(&line.0, "<strong>$1</strong>");
    let text = ITALIC.replace_all(&text, "<em>$1</em>");
    let text = INLINE_CODE.replace_all(&text, "<code>$1</code>");
    text.into_owned()
}

#[derive(PartialEq)]
enum ListKind {
    None,
    Unordered,
    Ordered,
}

/// Render untrusted message text to markup.
///
/// Supports bold, italic, inline code, `#`/`##`/`###` headings, bullet and
/// numbered lists, and fenced code blocks. Code block content is escaped
/// but exempt from inline transforms.
pub fn render_markdown(content: &str) -> SafeHtml {
    let mut out = String::new();
    let mut in_code_block = false;
    let mut code_lines: Vec<String> = Vec::new();
    let mut list = ListKind::None;

    fn close_list(out: &mut String, list: &mut ListKind) {
        match list {
            ListKind::Unordered => out.push_str("</ul>"),
            ListKind::Ordered => out.push_str("</ol>"),
            ListKind::None => {}
        }
        *list = ListKind::None;
    }

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            if in_code_block {
                in_code_block = false;
                out.push_str("<pre><code>");
                out.push_str(&code_lines.join("\n"));
                out.push_str("</code></pre>");
                code_lines.clear();
            } else {
                close_list(&mut out, &mut list);
                in_code_block = true;
            }
            continue;
        }

        if in_code_block {
            code_lines.push(escape(line).0);
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("### ") {
            close_list(&mut out, &mut list);
            out.push_str(&format!("<h3>{}</h3>", inline(escape(rest))));
        } else if let Some(rest) = trimmed.strip_prefix("## ") {
            close_list(&mut out, &mut list);
            out.push_str(&format!("<h2>{}</h2>", inline(escape(rest))));
        } else if let Some(rest) = trimmed.strip_prefix("# ") {
            close_list(&mut out, &mut list);
            out.push_str(&format!("<h1>{}</h1>", inline(escape(rest))));
        } else if let Some(rest) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("• "))
        {
            if list != ListKind::Unordered {
                close_list(&mut out, &mut list);
                out.push_str("<ul>");
                list = ListKind::Unordered;
            }
            out.push_str(&format!("<li>{}</li>", inline(escape(rest))));
        } else if ORDERED_ITEM.is_match(trimmed) {
            let rest = ORDERED_ITEM.replace(trimmed, "");
            if list != ListKind::Ordered {
                close_list(&mut out, &mut list);
                out.push_str("<ol>");
                list = ListKind::Ordered;
            }
            out.push_str(&format!("<li>{}</li>", inline(escape(&rest))));
        } else if trimmed.is_empty() {
            close_list(&mut out, &mut list);
        } else {
            close_list(&mut out, &mut list);
            out.push_str(&format!("<p>{}</p>", inline(escape(line))));
        }
    }

    // An unterminated fence still renders as a code block.
    if in_code_block {
        out.push_str("<pre><code>");
        out.push_str(&code_lines.join("\n"));
        out.push_str("</code></pre>");
    }
    close_list(&mut out, &mut list);

    SafeHtml(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_is_escaped_before_any_transform() {
        let html = render_markdown("<script>alert('x')</script>");
        assert!(!html.as_str().contains("<script>"));
        assert!(html
            .as_str()
            .contains("&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt;"));
    }

    #[test]
    fn bold_italic_and_inline_code() {
        let html = render_markdown("**bold** and *slanted* and `let x = 1;`");
        assert!(html.as_str().contains("<strong>bold</strong>"));
        assert!(html.as_str().contains("<em>slanted</em>"));
        assert!(html.as_str().contains("<code>let x = 1;</code>"));
    }

    #[test]
    fn markup_inside_inline_spans_is_escaped() {
        let html = render_markdown("**<b>not raw</b>**");
        assert_eq!(
            html.as_str(),
            "<p><strong>&lt;b&gt;not raw&lt;/b&gt;</strong></p>"
        );
    }

    #[test]
    fn headings() {
        let html = render_markdown("# Title\n## Section\n### Sub");
        assert_eq!(
            html.as_str(),
            "<h1>Title</h1><h2>Section</h2><h3>Sub</h3>"
        );
    }

    #[test]
    fn consecutive_bullets_form_one_list() {
        let html = render_markdown("- one\n- two\n\nafter");
        assert_eq!(
            html.as_str(),
            "<ul><li>one</li><li>two</li></ul><p>after</p>"
        );
    }

    #[test]
    fn numbered_list() {
        let html = render_markdown("1. first\n2. second");
        assert_eq!(html.as_str(), "<ol><li>first</li><li>second</li></ol>");
    }

    #[test]
    fn fenced_code_blocks_are_escaped_but_not_transformed() {
        let html = render_markdown("```\nlet s = \"**raw**\";\n<tag>\n```");
        assert!(html
            .as_str()
            .contains("let s = &quot;**raw**&quot;;\n&lt;tag&gt;"));
        assert!(!html.as_str().contains("<strong>"));
        assert!(html.as_str().starts_with("<pre><code>"));
    }

    #[test]
    fn unterminated_fence_still_renders() {
        let html = render_markdown("```\ntrailing code");
        assert_eq!(html.as_str(), "<pre><code>trailing code</code></pre>");
    }

    #[test]
    fn plain_paragraphs() {
        let html = render_markdown("hello world");
        assert_eq!(html.as_str(), "<p>hello world</p>");
    }

    #[test]
    fn safe_html_serializes_transparently() {
        let html = render_markdown("hi");
        assert_eq!(serde_json::to_string(&html).unwrap(), "\"<p>hi</p>\"");
    }
}
