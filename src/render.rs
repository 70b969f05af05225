// src/render.rs
//! Markdown renderer for the constrained dialect the briefs use.
//!
//! Supported: a leading front-matter block (stripped), `#`..`###` headings, fenced code
//! blocks, `- ` bullet lists, blank-line separated paragraphs, and inline `**bold**`,
//! `*emphasis*` and `` `code` ``. Everything else is HTML-escaped and passed through as
//! paragraph text; some of those constructs are reported as [`RenderWarning`]s.
//!
//! Bold and emphasis are plain non-greedy substitutions applied bold-first, not a nesting
//! parser, so unbalanced or interleaved markers can pair up unexpectedly.
//! Pure function: the same input always yields the same HTML.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RenderWarning, RenderWarningKind};

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold regex"));
static EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").expect("emphasis regex"));
static CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").expect("code span regex"));
static ORDERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s").expect("ordered item regex"));
static HEADER_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*:(\s|$)").expect("header key regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub warnings: Vec<RenderWarning>,
}

/// Render to an HTML fragment. Warnings are logged at debug level and dropped.
pub fn render(markdown: &str) -> String {
    let out = render_with_warnings(markdown);
    for w in &out.warnings {
        tracing::debug!(warning = %w, "markdown construct not supported");
    }
    out.html
}

pub fn render_with_warnings(markdown: &str) -> Rendered {
    let body = strip_front_matter(markdown);
    let lines: Vec<&str> = body.lines().collect();

    let mut blocks: Vec<String> = Vec::new();
    let mut para: Vec<&str> = Vec::new();
    let mut warnings = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim_end();

        if line.starts_with("```") {
            if let Some(close) = (i + 1..lines.len()).find(|&j| lines[j].trim() == "```") {
                flush_paragraph(&mut para, &mut blocks);
                let code = lines[i + 1..close].join("\n");
                blocks.push(format!(
                    "<pre><code>{}</code></pre>",
                    html_escape::encode_text(&code)
                ));
                i = close + 1;
                continue;
            }
            warnings.push(RenderWarning {
                line: i + 1,
                kind: RenderWarningKind::UnclosedFence,
            });
            para.push(line);
            i += 1;
            continue;
        }

        if line.trim().is_empty() {
            flush_paragraph(&mut para, &mut blocks);
            i += 1;
            continue;
        }

        if let Some((level, text)) = heading(line) {
            flush_paragraph(&mut para, &mut blocks);
            blocks.push(format!("<h{level}>{}</h{level}>", inline(text)));
            i += 1;
            continue;
        }

        if line.starts_with("- ") {
            flush_paragraph(&mut para, &mut blocks);
            let mut items = Vec::new();
            while i < lines.len() {
                let Some(item) = lines[i].trim_end().strip_prefix("- ") else {
                    break;
                };
                items.push(format!("<li>{}</li>", inline(item)));
                i += 1;
            }
            blocks.push(format!("<ul>\n{}\n</ul>", items.join("\n")));
            continue;
        }

        if let Some(kind) = unsupported(line) {
            warnings.push(RenderWarning { line: i + 1, kind });
        }
        para.push(line);
        i += 1;
    }
    flush_paragraph(&mut para, &mut blocks);

    Rendered {
        html: blocks.join("\n"),
        warnings,
    }
}

/// Drop a leading `---` / key-value lines / `---` block. Text without one is returned as is.
pub fn strip_front_matter(text: &str) -> &str {
    match split_front_matter(text) {
        Some((_, rest)) => rest,
        None => text,
    }
}

/// Split `---\n<header>\n---\n<rest>`. Returns `None` when the text has no front-matter,
/// including when the fenced block is not made of `key: value` lines (a leading
/// horizontal rule, for instance).
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let after_open = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;
    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let header = &after_open[..offset];
            if !is_key_value_block(header) {
                return None;
            }
            let rest = &after_open[offset + line.len()..];
            return Some((header, rest));
        }
        offset += line.len();
    }
    None
}

/// Every non-blank line is `key: value`, or an indented / `- ` continuation of a key.
fn is_key_value_block(header: &str) -> bool {
    let mut seen_key = false;
    for line in header.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if HEADER_KEY.is_match(line) {
            seen_key = true;
        } else if line.starts_with([' ', '\t']) || line.starts_with("- ") {
            if !seen_key {
                return false;
            }
        } else {
            return false;
        }
    }
    seen_key
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let text = line[hashes..].strip_prefix(' ')?.trim();
    if text.is_empty() {
        None
    } else {
        Some((hashes, text))
    }
}

fn unsupported(line: &str) -> Option<RenderWarningKind> {
    if line.starts_with("####") {
        Some(RenderWarningKind::DeepHeading)
    } else if line.starts_with('|') {
        Some(RenderWarningKind::Table)
    } else if line.starts_with('>') {
        Some(RenderWarningKind::Blockquote)
    } else if ORDERED_ITEM.is_match(line) {
        Some(RenderWarningKind::OrderedList)
    } else {
        None
    }
}

fn flush_paragraph(para: &mut Vec<&str>, blocks: &mut Vec<String>) {
    if para.is_empty() {
        return;
    }
    blocks.push(format!("<p>{}</p>", inline(&para.join("\n"))));
    para.clear();
}

/// Escape, then code spans; bold/emphasis only apply outside code spans.
fn inline(text: &str) -> String {
    let escaped = html_escape::encode_text(text);
    let mut out = String::with_capacity(escaped.len() + 16);
    let mut last = 0;
    for caps in CODE_SPAN.captures_iter(&escaped) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&emphasis(&escaped[last..whole.start()]));
        out.push_str("<code>");
        out.push_str(code.as_str());
        out.push_str("</code>");
        last = whole.end();
    }
    out.push_str(&emphasis(&escaped[last..]));
    out
}

fn emphasis(text: &str) -> String {
    let bold = BOLD.replace_all(text, "<strong>$1</strong>");
    EMPHASIS.replace_all(&bold, "<em>$1</em>").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn title_bold_and_list() {
        let html = render("# Title\n\nSome **bold** text.\n\n- item1\n- item2");
        assert_eq!(
            html,
            "<h1>Title</h1>\n<p>Some <strong>bold</strong> text.</p>\n<ul>\n<li>item1</li>\n<li>item2</li>\n</ul>"
        );
    }

    #[test]
    fn same_input_same_output() {
        let md = "---\ndate: 2026-01-02\n---\n## A\n\n*x* and `y`\n\n```rust\nlet a = 1;\n```";
        assert_eq!(render(md), render(md));
    }

    #[test]
    fn front_matter_is_stripped() {
        let html = render("---\ntitle: Brief\ndate: 2026-01-02\n---\n\n# Body");
        assert_eq!(html, "<h1>Body</h1>");
    }

    #[test]
    fn front_matter_split() {
        let (header, rest) = split_front_matter("---\na: 1\n---\nbody").unwrap();
        assert_eq!(header, "a: 1\n");
        assert_eq!(rest, "body");
        assert!(split_front_matter("# no front matter").is_none());
        assert!(split_front_matter("---\nnever closed\n").is_none());
    }

    #[test]
    fn leading_rule_is_not_front_matter() {
        assert_eq!(
            render("---\n\n# Title\n\n---\n\nrest"),
            "<p>---</p>\n<h1>Title</h1>\n<p>---</p>\n<p>rest</p>"
        );
        assert!(split_front_matter("---\n---\nbody").is_none());
        assert!(split_front_matter("---\n  indented: first\n---\nbody").is_none());
    }

    #[test]
    fn front_matter_with_nested_list() {
        let md = "---\ndate: 2026-01-02\ndata_sources:\n  - market_data: 12 stocks\n- polymarket: 3\n---\n# Body";
        assert_eq!(render(md), "<h1>Body</h1>");
    }

    #[test]
    fn heading_levels() {
        assert_eq!(render("## Two"), "<h2>Two</h2>");
        assert_eq!(render("### Three"), "<h3>Three</h3>");
        let out = render_with_warnings("#### Four");
        assert_eq!(out.html, "<p>#### Four</p>");
        assert_eq!(out.warnings[0].kind, RenderWarningKind::DeepHeading);
        // no space after the markers: literal
        assert_eq!(render("#tag"), "<p>#tag</p>");
    }

    #[test]
    fn fenced_code_ignores_language_and_escapes() {
        let html = render("```python\nif a < b:\n    print(\"**not bold**\")\n```");
        assert_eq!(
            html,
            "<pre><code>if a &lt; b:\n    print(\"**not bold**\")</code></pre>"
        );
    }

    #[test]
    fn unclosed_fence_passes_through() {
        let out = render_with_warnings("```\ncode forever");
        assert_eq!(out.html, "<p>```\ncode forever</p>");
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].kind, RenderWarningKind::UnclosedFence);
    }

    #[test]
    fn inline_code_and_emphasis() {
        assert_eq!(
            render("Use `a*b*c` and *soft* or **hard**."),
            "<p>Use <code>a*b*c</code> and <em>soft</em> or <strong>hard</strong>.</p>"
        );
    }

    #[test]
    fn emphasis_inside_bold() {
        assert_eq!(
            render("**a *b* c**"),
            "<p><strong>a <em>b</em> c</strong></p>"
        );
    }

    #[test]
    fn interleaved_markers_overlap() {
        // not a nesting parser: the pairs overlap instead of nesting
        assert_eq!(
            render("*a **b* c**"),
            "<p><em>a <strong>b</em> c</strong></p>"
        );
    }

    #[test]
    fn list_breaks_paragraph_without_blank_line() {
        assert_eq!(
            render("Intro line\n- a\n- b\nOutro"),
            "<p>Intro line</p>\n<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n<p>Outro</p>"
        );
    }

    #[test]
    fn unsupported_constructs_are_literal_text() {
        let out = render_with_warnings("| a | b |\n\n> quoted\n\n1. first\n\n<script>x</script>");
        assert_eq!(
            out.html,
            "<p>| a | b |</p>\n<p>&gt; quoted</p>\n<p>1. first</p>\n<p>&lt;script&gt;x&lt;/script&gt;</p>"
        );
        let kinds: Vec<_> = out.warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RenderWarningKind::Table,
                RenderWarningKind::Blockquote,
                RenderWarningKind::OrderedList
            ]
        );
    }

    #[test]
    fn empty_input_renders_empty() {
        assert_eq!(render(""), "");
        assert_eq!(render("\n\n"), "");
    }
}
