//! Markdown to HTML rendering.
//!
//! This module provides the default [`Converter`] with support for:
//! - GitHub Flavored Markdown (tables, strikethrough, task lists, footnotes)
//! - Heading IDs for anchor links
//! - Emoji shortcodes and smileys

mod emoji;
mod traits;

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use emoji::shortcode;
pub use traits::{Converter, RenderError};

/// Syntax extensions enabled on top of CommonMark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Extensions {
    /// Enable GitHub Flavored Markdown tables
    pub tables: bool,
    /// Enable strikethrough syntax (~~text~~)
    pub strikethrough: bool,
    /// Enable task list items ([x] and [ ])
    pub tasklists: bool,
    /// Enable footnotes ([^1])
    pub footnotes: bool,
    /// Enable heading attributes ({#id .class})
    pub heading_attributes: bool,
    /// Turn straight quotes and dashes into typographic ones
    pub smart_punctuation: bool,
    /// Give every heading an id derived from its text
    pub heading_ids: bool,
    /// Replace emoji shortcodes (:tada:) and smileys (:-))
    pub emoji: bool,
}

impl Default for Extensions {
    fn default() -> Self {
        Self::all()
    }
}

impl Extensions {
    /// Every extension enabled.
    pub fn all() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            tasklists: true,
            footnotes: true,
            heading_attributes: true,
            smart_punctuation: true,
            heading_ids: true,
            emoji: true,
        }
    }

    /// Plain CommonMark.
    pub fn none() -> Self {
        Self {
            tables: false,
            strikethrough: false,
            tasklists: false,
            footnotes: false,
            heading_attributes: false,
            smart_punctuation: false,
            heading_ids: false,
            emoji: false,
        }
    }

    fn to_pulldown_options(&self) -> Options {
        let mut options = Options::empty();
        if self.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.heading_attributes {
            options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        if self.smart_punctuation {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        options
    }
}

/// The default converter, backed by pulldown-cmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownConverter;

impl Converter for MarkdownConverter {
    fn to_html(&self, source: &str, extensions: &Extensions) -> Result<String, RenderError> {
        Ok(to_html(source, extensions))
    }
}

/// Render markdown content to an HTML fragment.
///
/// # Example
///
/// ```
/// use margin_core::render::{to_html, Extensions};
///
/// let html = to_html("# Hello :wave:\n\nWorld", &Extensions::default());
/// assert!(html.contains(r#"<h1 id="hello-wave">"#));
/// ```
pub fn to_html(markdown_content: &str, extensions: &Extensions) -> String {
    let parser = Parser::new_ext(markdown_content, extensions.to_pulldown_options());
    let events: Vec<Event> = TextMergeStream::new(parser).collect();

    let mut processed_events = Vec::with_capacity(events.len());
    let mut slugs = SlugRegistry::default();
    let mut code_block_depth = 0usize;

    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) if extensions.heading_ids => {
                let id = match id {
                    Some(id) => slugs.reserve(id.to_string()),
                    None => slugs.reserve(slugify(&heading_text(&events[i + 1..]))),
                };
                processed_events.push(Event::Start(Tag::Heading {
                    level: *level,
                    id: Some(CowStr::from(id)),
                    classes: classes.clone(),
                    attrs: attrs.clone(),
                }));
            }
            Event::Start(Tag::CodeBlock(_)) => {
                code_block_depth += 1;
                processed_events.push(event.clone());
            }
            Event::End(TagEnd::CodeBlock) => {
                code_block_depth = code_block_depth.saturating_sub(1);
                processed_events.push(event.clone());
            }
            Event::Text(text) if extensions.emoji && code_block_depth == 0 => {
                let replaced = emoji::replace(text).into_owned();
                processed_events.push(Event::Text(CowStr::from(replaced)));
            }
            _ => processed_events.push(event.clone()),
        }
    }

    let mut html_output = String::with_capacity(markdown_content.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html_output, processed_events.into_iter());
    html_output
}

/// Text of the heading whose start event precedes `events`.
fn heading_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::End(TagEnd::Heading(_)) => break,
            _ => {}
        }
    }
    text
}

/// Convert heading text to a URL-friendly slug.
///
/// Lowercases, turns spaces into hyphens, drops punctuation and collapses
/// repeated hyphens. Text without any slug character becomes `section`.
///
/// # Examples
///
/// ```
/// use margin_core::render::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("What's new?"), "whats-new");
/// assert_eq!(slugify("!!!"), "section");
/// ```
pub fn slugify(text: &str) -> String {
    let slug = text
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() || c == '_' {
                Some(c)
            } else if c == ' ' || c == '-' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Hands out unique heading ids within one document.
#[derive(Debug, Default)]
struct SlugRegistry {
    seen: HashMap<String, usize>,
}

impl SlugRegistry {
    fn reserve(&mut self, slug: String) -> String {
        let count = self.seen.entry(slug.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            slug
        } else {
            let unique = format!("{slug}-{}", *count - 1);
            self.seen.insert(unique.clone(), 1);
            unique
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_rendering() {
        let html = to_html("# Hello\n\nWorld", &Extensions::default());
        assert!(html.contains("<h1"));
        assert!(html.contains("Hello"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn test_heading_ids() {
        let html = to_html("# Test Heading", &Extensions::default());
        assert!(html.contains(r#"<h1 id="test-heading">"#));
    }

    #[test]
    fn test_duplicate_heading_ids_are_unique() {
        let html = to_html("# Intro\n\n## Intro\n\n### Intro", &Extensions::default());
        assert!(html.contains(r#"id="intro""#));
        assert!(html.contains(r#"id="intro-1""#));
        assert!(html.contains(r#"id="intro-2""#));
    }

    #[test]
    fn test_explicit_heading_id_is_kept() {
        let html = to_html("# Title {#custom}", &Extensions::default());
        assert!(html.contains(r#"id="custom""#));
    }

    #[test]
    fn test_heading_ids_disabled() {
        let mut extensions = Extensions::default();
        extensions.heading_ids = false;
        let html = to_html("# Title", &extensions);
        assert!(html.contains("<h1>Title</h1>"));
    }

    #[test]
    fn test_gfm_extensions() {
        let md = "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done";
        let html = to_html(md, &Extensions::default());
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains(r#"type="checkbox""#));

        let plain = to_html(md, &Extensions::none());
        assert!(!plain.contains("<table>"));
        assert!(!plain.contains("<del>"));
    }

    #[test]
    fn test_emoji_outside_code_only() {
        let md = "Launch :rocket: :)\n\n```\n:rocket: :)\n```\n\n`:rocket:`";
        let html = to_html(md, &Extensions::default());
        assert!(html.contains("<p>Launch 🚀 😃</p>"));
        assert!(html.contains("<code>:rocket: :)\n</code>"));
        assert!(html.contains("<code>:rocket:</code>"));

        let plain = to_html("Launch :rocket:", &Extensions::none());
        assert!(plain.contains(":rocket:"));
    }

    #[test]
    fn test_converter_trait() {
        let html = MarkdownConverter
            .to_html("*hi*", &Extensions::default())
            .unwrap();
        assert_eq!(html, "<p><em>hi</em></p>\n");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Leading  and  trailing  "), "leading-and-trailing");
        assert_eq!(slugify("snake_case-and--dashes"), "snake_case-and-dashes");
        assert_eq!(slugify(""), "section");
    }

    #[test]
    fn test_extensions_deserialize_with_defaults() {
        let extensions: Extensions = toml::from_str("emoji = false").unwrap();
        assert!(!extensions.emoji);
        assert!(extensions.tables);

        let json = serde_json::to_string(&Extensions::none()).unwrap();
        assert!(json.contains(r#""smart-punctuation":false"#));
    }
}
