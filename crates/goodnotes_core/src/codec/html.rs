//! Editor HTML → markdown normalization.
//!
//! # Responsibility
//! - Detect whether note content carries HTML markup.
//! - Convert common editor markup to markdown (ATX headings, `-` bullets).
//!
//! # Invariants
//! - Content without markup outside code spans is returned unchanged.
//! - Converted output contains no markup, so a second pass is a no-op.
//! - Script-like elements are dropped together with their contents.
//! - `<`/`>` in text stay escaped outside code so literal tags never reappear.
//! - Code text is emitted verbatim inside code spans and fenced blocks.
//!
//! Lists are handled one level deep; nested lists are flattened.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html};

const CODE_PLACEHOLDER: char = '\u{1A}';

const DROPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "iframe", "template", "head"];
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "header", "footer", "main", "nav", "aside", "figure",
    "figcaption", "table", "thead", "tbody", "tfoot", "tr", "html", "body",
];

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|span|br|hr|h[1-6]|ul|ol|li|strong|b|em|i|u|s|del|strike|a|img|code|pre|blockquote|script|style|noscript|iframe|template|table|thead|tbody|tr|td|th|section|article)\b[^>]*>",
    )
    .expect("valid html tag regex")
});
static FENCED_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```.*?```").expect("valid fenced code regex"));
static INLINE_CODE_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`[^`\n]*`").expect("valid code span regex"));
static BLANK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank run regex"));
static INLINE_WS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\r\n\u{a0}]+").expect("valid whitespace regex"));

/// Returns whether `content` contains HTML markup outside markdown code.
pub fn looks_like_html(content: &str) -> bool {
    let without_fences = FENCED_CODE_RE.replace_all(content, "");
    let without_code = INLINE_CODE_SPAN_RE.replace_all(&without_fences, "");
    HTML_TAG_RE.is_match(&without_code)
}

/// Returns markdown content: HTML is converted, markdown passes through untouched.
pub fn normalize_content(content: &str) -> String {
    if looks_like_html(content) {
        html_to_markdown(content)
    } else {
        content.to_string()
    }
}

/// Converts editor HTML into markdown.
pub fn html_to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut renderer = BlockRenderer::default();
    let mut text = String::new();
    renderer.children(fragment.root_element(), &mut text);

    // Fenced blocks go in after tidying so their blank lines survive.
    let mut markdown = tidy(&text);
    for (index, block) in renderer.code_blocks.iter().enumerate() {
        let placeholder = format!("{CODE_PLACEHOLDER}{index}{CODE_PLACEHOLDER}");
        markdown = markdown.replacen(&placeholder, block, 1);
    }
    markdown
}

#[derive(Default)]
struct BlockRenderer {
    code_blocks: Vec<String>,
}

impl BlockRenderer {
    fn children(&mut self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&escape_text(&collapse_whitespace(text))),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, element: ElementRef<'_>, out: &mut String) {
        let name = element.value().name();
        match name {
            _ if DROPPED_ELEMENTS.contains(&name) => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                out.push_str(&format!(
                    "\n\n{} {}\n\n",
                    "#".repeat(level),
                    flat_text(element)
                ));
            }
            "ul" => out.push_str(&render_list(element, false)),
            "ol" => out.push_str(&render_list(element, true)),
            "li" => out.push_str(&format!("\n- {}\n", flat_text(element))),
            "blockquote" => {
                let mut inner = String::new();
                self.children(element, &mut inner);
                let quoted = tidy(&inner)
                    .lines()
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {line}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                out.push_str(&format!("\n\n{quoted}\n\n"));
            }
            "pre" => {
                let code: String = element.text().collect();
                self.code_blocks
                    .push(format!("```\n{}\n```", code.trim_matches('\n')));
                out.push_str(&format!(
                    "\n\n{CODE_PLACEHOLDER}{}{CODE_PLACEHOLDER}\n\n",
                    self.code_blocks.len() - 1
                ));
            }
            "br" => out.push('\n'),
            "hr" => out.push_str("\n\n---\n\n"),
            "td" | "th" => {
                out.push(' ');
                self.children(element, out);
                out.push(' ');
            }
            _ if BLOCK_ELEMENTS.contains(&name) => {
                out.push_str("\n\n");
                self.children(element, out);
                out.push_str("\n\n");
            }
            _ => out.push_str(&render_inline(element, false)),
        }
    }
}

/// Inline markdown for one element; `flatten` turns line breaks into spaces.
fn render_inline(element: ElementRef<'_>, flatten: bool) -> String {
    let name = element.value().name();
    match name {
        _ if DROPPED_ELEMENTS.contains(&name) => String::new(),
        "br" if flatten => " ".to_string(),
        "br" => "\n".to_string(),
        "strong" | "b" => emphasize("**", &inline_children(element, flatten)),
        "em" | "i" => emphasize("*", &inline_children(element, flatten)),
        "s" | "del" | "strike" => emphasize("~~", &inline_children(element, flatten)),
        "code" | "pre" => code_span(&element.text().collect::<String>()),
        "a" => {
            let label = flat_text(element);
            match element.value().attr("href").map(str::trim) {
                Some(href) if !href.is_empty() && label.is_empty() => format!("<{href}>"),
                Some(href) if !href.is_empty() => format!("[{label}]({href})"),
                _ => label,
            }
        }
        "img" => match element.value().attr("src") {
            Some(src) if !src.is_empty() => {
                format!("![{}]({src})", element.value().attr("alt").unwrap_or_default())
            }
            _ => String::new(),
        },
        "p" | "div" | "li" | "ul" | "ol" | "blockquote" | "h1" | "h2" | "h3" | "h4" | "h5"
        | "h6" | "td" | "th" | "tr" => format!(" {} ", inline_children(element, flatten)),
        _ => inline_children(element, flatten),
    }
}

fn inline_children(element: ElementRef<'_>, flatten: bool) -> String {
    let mut out = String::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_text(&collapse_whitespace(text))),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    out.push_str(&render_inline(child, flatten));
                }
            }
            _ => {}
        }
    }
    out
}

/// Flattens an element to one trimmed line of inline markdown.
fn flat_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&inline_children(element, true))
        .trim()
        .to_string()
}

fn render_list(element: ElementRef<'_>, ordered: bool) -> String {
    let mut lines = Vec::new();
    for item in element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
    {
        let marker = if ordered {
            format!("{}.", lines.len() + 1)
        } else {
            match item.value().attr("data-checked") {
                Some(checked) if checked.eq_ignore_ascii_case("true") => "- [x]".to_string(),
                Some(_) => "- [ ]".to_string(),
                None => "-".to_string(),
            }
        };
        lines.push(format!("{marker} {}", flat_text(item)));
    }
    format!("\n\n{}\n\n", lines.join("\n"))
}

/// Wraps `inner` in `marker`, keeping surrounding spaces outside the marks.
fn emphasize(marker: &str, inner: &str) -> String {
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return inner.to_string();
    }
    let lead = if inner.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if inner.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{marker}{trimmed}{marker}{trail}")
}

fn code_span(code: &str) -> String {
    let code = code.replace(['\r', '\n'], " ");
    if code.contains('`') {
        format!("`` {code} ``")
    } else {
        format!("`{code}`")
    }
}

fn collapse_whitespace(text: &str) -> String {
    INLINE_WS_RE.replace_all(text, " ").into_owned()
}

fn escape_text(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

fn tidy(text: &str) -> String {
    let trimmed_lines = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    BLANK_RUN_RE
        .replace_all(&trimmed_lines, "\n\n")
        .trim_matches('\n')
        .to_string()
}
