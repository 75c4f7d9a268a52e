//! HTML content extraction — strips boilerplate and returns readable text.
//!
//! Parses raw HTML, removes non-content elements (scripts, styles,
//! navigation), picks the main content area and returns clean text
//! alongside the best available title.

use scraper::{Html, Selector};

/// Title and main text pulled out of an HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub title: Option<String>,
    /// Whitespace-normalised text; empty when nothing readable was found.
    pub text: String,
}

/// Extract the readable title and main text from raw HTML.
///
/// Never fails: a page with no readable text yields an empty `text`.
pub fn extract_readable(html: &str) -> ExtractedText {
    let cleaned_html = strip_boilerplate_tags(html);
    let document = Html::parse_document(&cleaned_html);

    ExtractedText {
        title: extract_title(&document),
        text: normalise_whitespace(&extract_main_text(&document)),
    }
}

/// `true` when a Content-Type header value denotes an HTML document.
pub fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml+xml")
}

/// Clip `text` to at most `max_chars` characters.
///
/// Returns the clipped text and whether anything was cut.
pub fn clip_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_end, _)) => (text[..byte_end].to_owned(), true),
        None => (text.to_owned(), false),
    }
}

/// Collapse every whitespace run (newlines included) into one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title from `<title>`, then `og:title`, then the first `<h1>`.
fn extract_title(document: &Html) -> Option<String> {
    let candidates = [
        ("title", None),
        (r#"meta[property="og:title"]"#, Some("content")),
        ("h1", None),
    ];

    for (selector_str, attr) in candidates {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        let Some(element) = document.select(&selector).next() else {
            continue;
        };
        let raw = match attr {
            Some(name) => element.value().attr(name).unwrap_or_default().to_owned(),
            None => element.text().collect::<String>(),
        };
        let title = collapse_whitespace(&raw);
        if !title.is_empty() {
            return Some(title);
        }
    }
    None
}

/// Extract text from the main content area of the document.
///
/// Tries content-specific selectors in priority order, falling back to
/// `<body>` and finally the whole document.
fn extract_main_text(document: &Html) -> String {
    let content_selectors = ["article", "main", "[role=\"main\"]", "body"];

    for selector_str in &content_selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_owned();
            }
        }
    }

    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_owned()
}

/// Remove boilerplate HTML tags and their content before parsing.
///
/// Strips `<script>`, `<style>`, `<nav>`, `<footer>`, `<header>`, `<aside>`,
/// `<noscript>`, `<svg>`, `<iframe>` and `<template>` elements including
/// all their content.
fn strip_boilerplate_tags(html: &str) -> String {
    let tags = [
        "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe",
        "template",
    ];

    let mut result = html.to_owned();
    for tag in &tags {
        result = strip_tag(&result, tag);
    }
    result
}

/// Remove all instances of a specific HTML tag and its content.
fn strip_tag(html: &str, tag: &str) -> String {
    let mut result = String::with_capacity(html.len());
    // ASCII-only lowering keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let open_tag = format!("<{tag}");
    let close_tag = format!("</{tag}>");

    let mut pos = 0;
    loop {
        let start = match lower[pos..].find(&open_tag) {
            Some(offset) => pos + offset,
            None => {
                result.push_str(&html[pos..]);
                break;
            }
        };

        // Reject prefixes of longer tag names (e.g. <navigate> for <nav>).
        let after_tag = start + open_tag.len();
        if after_tag < lower.len() {
            let next_byte = lower.as_bytes()[after_tag];
            if !matches!(next_byte, b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t') {
                result.push_str(&html[pos..after_tag]);
                pos = after_tag;
                continue;
            }
        }

        result.push_str(&html[pos..start]);

        let end = match lower[start..].find(&close_tag) {
            Some(offset) => start + offset + close_tag.len(),
            None => match lower[start..].find('>') {
                Some(offset) => start + offset + 1,
                None => html.len(),
            },
        };

        pos = end;
    }

    result
}

/// Collapse excess whitespace: multiple spaces become one, 3+ newlines become 2.
fn normalise_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = false;
    let mut newline_count: u32 = 0;

    for ch in text.chars() {
        if ch == '\n' || ch == '\r' {
            newline_count += 1;
            prev_was_space = false;
            if newline_count <= 2 {
                result.push('\n');
            }
        } else if ch.is_whitespace() {
            newline_count = 0;
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            newline_count = 0;
            prev_was_space = false;
            result.push(ch);
        }
    }

    result
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const FIXTURE_ARTICLE: &str = include_str!("../test-data/article.html");

    #[test]
    fn extract_title_from_html() {
        let html = "<html><head><title>My Page Title</title></head><body>Content</body></html>";
        let page = extract_readable(html);
        assert_eq!(page.title.as_deref(), Some("My Page Title"));
    }

    #[test]
    fn title_falls_back_to_h1() {
        let html = "<html><body><h1> Heading  Title </h1><p>Body</p></body></html>";
        assert_eq!(extract_readable(html).title.as_deref(), Some("Heading Title"));
    }

    #[test]
    fn title_absent_when_missing() {
        let html = "<html><body>Content here</body></html>";
        assert!(extract_readable(html).title.is_none());
    }

    #[test]
    fn extract_content_from_article() {
        let html = r#"<html><body>
            <nav>Navigation stuff</nav>
            <article>Article content here</article>
            <footer>Footer stuff</footer>
        </body></html>"#;
        let page = extract_readable(html);
        assert!(page.text.contains("Article content"));
        assert!(!page.text.contains("Navigation"));
        assert!(!page.text.contains("Footer"));
    }

    #[test]
    fn fallback_to_body() {
        let page = extract_readable("<html><body>Body content only</body></html>");
        assert_eq!(page.text, "Body content only");
    }

    #[test]
    fn strip_script_and_style_tags() {
        let html = r#"<html><body>
            <p>Real content</p>
            <script>var x = 1; alert('hi');</script>
            <style>.foo { color: red; }</style>
        </body></html>"#;
        let page = extract_readable(html);
        assert!(page.text.contains("Real content"));
        assert!(!page.text.contains("alert"));
        assert!(!page.text.contains("color: red"));
    }

    #[test]
    fn nav_tag_not_confused_with_similar_tags() {
        let html = "<html><body><nav>Skip this</nav><p>Keep this navigate text</p></body></html>";
        let page = extract_readable(html);
        assert!(!page.text.contains("Skip this"));
        assert!(page.text.contains("navigate text"));
    }

    #[test]
    fn non_ascii_content_survives_tag_stripping() {
        let html = "<html><body><p>Ärger über Café</p><SCRIPT>x()</SCRIPT><p>日本語の本文</p></body></html>";
        let page = extract_readable(html);
        assert!(page.text.contains("Ärger über Café"));
        assert!(page.text.contains("日本語の本文"));
        assert!(!page.text.contains("x()"));
    }

    #[test]
    fn whitespace_normalisation() {
        let html = "<html><body>Word1    Word2\n\n\n\n\nWord3</body></html>";
        let page = extract_readable(html);
        assert!(!page.text.contains("  "));
        assert!(!page.text.contains("\n\n"));
        assert!(page.text.contains("Word3"));
    }

    #[test]
    fn only_scripts_and_styles_yield_empty_text() {
        let html = r#"<html>
            <head><style>body{color:red}</style></head>
            <body>
                <script>console.log('hello');</script>
            </body>
        </html>"#;
        assert!(extract_readable(html).text.is_empty());
        assert!(extract_readable("").text.is_empty());
    }

    #[test]
    fn fixture_article_extracts_title() {
        let page = extract_readable(FIXTURE_ARTICLE);
        assert_eq!(page.title.as_deref(), Some("Using the Fetch API - Web APIs"));
    }

    #[test]
    fn fixture_article_extracts_main_content() {
        let page = extract_readable(FIXTURE_ARTICLE);
        assert!(page.text.contains("The Fetch API provides a JavaScript interface"));
        assert!(page.text.contains("Checking response status"));
        assert!(
            page.text.chars().count() > 400,
            "article should be long enough to avoid escalation"
        );
    }

    #[test]
    fn fixture_article_strips_boilerplate() {
        let page = extract_readable(FIXTURE_ARTICLE);
        assert!(!page.text.contains("analytics.track"));
        assert!(!page.text.contains("Privacy Policy"));
        assert!(!page.text.contains("Advertisement content"));
        assert!(!page.text.contains("enable JavaScript"));
    }

    #[test]
    fn html_content_type_detection() {
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("Application/XHTML+XML"));
        assert!(!is_html_content_type("text/plain"));
        assert!(!is_html_content_type("application/json"));
    }

    #[test]
    fn clip_counts_characters_not_bytes() {
        let text = "é".repeat(200);
        let (clipped, truncated) = clip_chars(&text, 50);
        assert!(truncated);
        assert_eq!(clipped.chars().count(), 50);

        let (same, truncated) = clip_chars("short", 50);
        assert!(!truncated);
        assert_eq!(same, "short");

        let (exact, truncated) = clip_chars("abcde", 5);
        assert!(!truncated);
        assert_eq!(exact, "abcde");
    }

    #[test]
    fn collapse_whitespace_joins_lines() {
        assert_eq!(collapse_whitespace("  a \n\n b\tc  "), "a b c");
    }
}
