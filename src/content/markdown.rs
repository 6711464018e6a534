//! Markdown rendering with syntax highlighting

use std::borrow::Cow;

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::config::HighlightConfig;
use crate::helpers::escape_html;

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(&HighlightConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(config: &HighlightConfig) -> Self {
        let mut theme_set = ThemeSet::load_defaults();
        let theme = match theme_set.themes.remove(&config.theme) {
            Some(theme) => theme,
            None => {
                tracing::warn!(
                    "Unknown highlight theme {:?}, using base16-ocean.dark",
                    config.theme
                );
                theme_set
                    .themes
                    .remove("base16-ocean.dark")
                    .unwrap_or_default()
            }
        };

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            line_numbers: config.line_numbers,
        }
    }

    /// Render markdown to HTML
    ///
    /// Rendering never fails: constructs the parser cannot make sense of
    /// come out as literal text.
    pub fn render(&self, markdown: &str) -> String {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;
        let parser = Parser::new_ext(markdown, options);

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<Option<String>> = None;
        let mut code = String::new();

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => fence_language(&info),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some(lang);
                    code.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let lang = code_block.take().flatten();
                    events.push(Event::Html(CowStr::from(
                        self.highlight_code(&code, lang.as_deref()),
                    )));
                }
                Event::Text(text) if code_block.is_some() => code.push_str(&text),
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let Some(lang) = lang else {
            return plain_code_block(code, None);
        };

        let Some(syntax) = self.find_syntax(lang) else {
            tracing::warn!("No syntax highlighting for language {:?}, rendering as text", lang);
            return plain_code_block(code, Some(lang));
        };

        match highlighted_html_for_string(code, &self.syntax_set, syntax, &self.theme) {
            Ok(highlighted) if self.line_numbers => add_line_numbers(&highlighted, code, lang),
            Ok(highlighted) => format!(
                r#"<figure class="highlight"><div class="language-{}">{}</div></figure>"#,
                escape_html(lang),
                highlighted
            ),
            Err(e) => {
                tracing::warn!("Highlighting {} failed, rendering as text: {}", lang, e);
                plain_code_block(code, Some(lang))
            }
        }
    }

    fn find_syntax(&self, lang: &str) -> Option<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
    }

    /// Split Markdown at the first excerpt separator
    ///
    /// Returns the excerpt, or the whole body when the separator is absent.
    /// CRLF line endings are matched as `\n`.
    pub fn split_excerpt<'a>(body: &'a str, separator: &str) -> Cow<'a, str> {
        let body = body.trim_start();
        if separator.is_empty() {
            return Cow::Borrowed(body);
        }
        if body.contains("\r\n") {
            let mut normalized = body.replace("\r\n", "\n");
            if let Some(pos) = normalized.find(separator) {
                normalized.truncate(pos);
            }
            return Cow::Owned(normalized);
        }
        match body.find(separator) {
            Some(pos) => Cow::Borrowed(&body[..pos]),
            None => Cow::Borrowed(body),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// First word of a fence info string (` ```rust,ignore ` -> `rust`)
fn fence_language(info: &str) -> Option<String> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

fn plain_code_block(code: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!(
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            escape_html(lang),
            escape_html(code)
        ),
        None => format!("<pre><code>{}</code></pre>", escape_html(code)),
    }
}

/// Add line numbers to highlighted code
fn add_line_numbers(highlighted: &str, code: &str, lang: &str) -> String {
    let gutter = (1..=code.lines().count())
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
        escape_html(lang),
        gutter,
        highlighted
    )
}
