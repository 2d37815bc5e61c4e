//! Markdown rendering capability.
//!
//! Bot text is commonmark. Renderers turn it into a [`Fragment`]: a list of
//! styled lines that any front end can draw without re-parsing. Raw HTML in the
//! source is kept as literal text, never interpreted.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub strikethrough: bool,
    pub link: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

impl StyledSpan {
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Paragraph,
    Heading(u8),
    ListItem,
    Code,
    Rule,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub kind: LineKind,
    /// Nesting depth, for list items and their continuation lines
    pub indent: usize,
    /// Bullet or number drawn before the first span ("• ", "2. ")
    pub prefix: String,
    pub quote_depth: usize,
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    fn new(kind: LineKind, indent: usize, quote_depth: usize) -> Self {
        Self {
            kind,
            indent,
            prefix: String::new(),
            quote_depth,
            spans: Vec::new(),
        }
    }

    fn blank() -> Self {
        Self::new(LineKind::Blank, 0, 0)
    }

    /// Concatenated span text, without prefix or indent
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Rendered form of one message body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub lines: Vec<StyledLine>,
}

impl Fragment {
    /// A single uninterpreted paragraph
    pub fn plain(text: &str) -> Self {
        let mut line = StyledLine::new(LineKind::Paragraph, 0, 0);
        line.spans.push(StyledSpan::raw(text));
        Self { lines: vec![line] }
    }

    /// Flatten to plain text, keeping bullets, indentation and quote markers
    pub fn to_plain_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| match line.kind {
                LineKind::Rule => "---".to_string(),
                LineKind::Blank => String::new(),
                _ => format!(
                    "{}{}{}{}",
                    "> ".repeat(line.quote_depth),
                    "  ".repeat(line.indent),
                    line.prefix,
                    line.text()
                ),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Anything that can turn markdown source into a [`Fragment`]
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, text: &str) -> Fragment;
}

/// Commonmark renderer backed by `pulldown-cmark`
#[derive(Debug, Clone)]
pub struct CommonMark {
    options: Options,
}

impl Default for CommonMark {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }
}

impl MarkdownRenderer for CommonMark {
    fn render(&self, text: &str) -> Fragment {
        let mut builder = FragmentBuilder::default();
        for event in Parser::new_ext(text, self.options) {
            builder.push_event(event);
        }
        builder.finish()
    }
}

#[derive(Default)]
struct FragmentBuilder {
    lines: Vec<StyledLine>,
    current: Option<StyledLine>,
    style: SpanStyle,
    bold: usize,
    italic: usize,
    strike: usize,
    // Next ordinal per open list; None for bullet lists
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
}

impl FragmentBuilder {
    fn push_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Html(text) => {
                for line in text.lines() {
                    self.flush();
                    self.push_text(line, SpanStyle::default());
                }
                self.flush();
            }
            Event::Text(text) | Event::InlineHtml(text) => {
                if self.in_code_block {
                    for line in text.lines() {
                        let mut code = StyledLine::new(LineKind::Code, self.lists.len(), self.quote_depth);
                        code.spans.push(StyledSpan {
                            text: line.to_string(),
                            style: SpanStyle {
                                code: true,
                                ..SpanStyle::default()
                            },
                        });
                        self.lines.push(code);
                    }
                } else {
                    self.push_text(&text, self.style);
                }
            }
            Event::Code(text) => {
                let style = SpanStyle {
                    code: true,
                    ..self.style
                };
                self.push_text(&text, style);
            }
            Event::SoftBreak => self.push_text(" ", self.style),
            Event::HardBreak => {
                let kind = self.current.as_ref().map(|l| l.kind).unwrap_or(LineKind::Paragraph);
                self.flush();
                self.current = Some(StyledLine::new(kind, self.lists.len(), self.quote_depth));
            }
            Event::Rule => {
                self.flush();
                self.lines.push(StyledLine::new(LineKind::Rule, 0, self.quote_depth));
                self.separate();
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_text(marker, SpanStyle::default());
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // A list item's first paragraph continues the bulleted line
                let continues_item = self
                    .current
                    .as_ref()
                    .map(|l| l.kind == LineKind::ListItem && l.spans.is_empty())
                    .unwrap_or(false);
                if !continues_item {
                    self.flush();
                    let kind = if self.lists.is_empty() {
                        LineKind::Paragraph
                    } else {
                        LineKind::ListItem
                    };
                    self.current = Some(StyledLine::new(kind, self.lists.len(), self.quote_depth));
                }
            }
            Tag::Heading { level, .. } => {
                self.flush();
                self.current = Some(StyledLine::new(
                    LineKind::Heading(heading_depth(level)),
                    0,
                    self.quote_depth,
                ));
                self.bold += 1;
                self.restyle();
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len();
                let prefix = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let prefix = format!("{}. ", n);
                        *n += 1;
                        prefix
                    }
                    _ => "• ".to_string(),
                };
                let mut line = StyledLine::new(LineKind::ListItem, depth.saturating_sub(1), self.quote_depth);
                line.prefix = prefix;
                self.current = Some(line);
            }
            Tag::Emphasis => {
                self.italic += 1;
                self.restyle();
            }
            Tag::Strong => {
                self.bold += 1;
                self.restyle();
            }
            Tag::Strikethrough => {
                self.strike += 1;
                self.restyle();
            }
            Tag::Link { .. } => {
                self.style.link = true;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.separate();
                }
            }
            TagEnd::Heading(_) => {
                self.bold = self.bold.saturating_sub(1);
                self.restyle();
                self.flush();
                self.separate();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.separate();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.separate();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis => {
                self.italic = self.italic.saturating_sub(1);
                self.restyle();
            }
            TagEnd::Strong => {
                self.bold = self.bold.saturating_sub(1);
                self.restyle();
            }
            TagEnd::Strikethrough => {
                self.strike = self.strike.saturating_sub(1);
                self.restyle();
            }
            TagEnd::Link => {
                self.style.link = false;
            }
            _ => {}
        }
    }

    fn restyle(&mut self) {
        self.style.bold = self.bold > 0;
        self.style.italic = self.italic > 0;
        self.style.strikethrough = self.strike > 0;
    }

    fn push_text(&mut self, text: &str, style: SpanStyle) {
        let depth = self.lists.len();
        let quote_depth = self.quote_depth;
        let line = self
            .current
            .get_or_insert_with(|| StyledLine::new(LineKind::Paragraph, depth, quote_depth));
        match line.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => line.spans.push(StyledSpan {
                text: text.to_string(),
                style,
            }),
        }
    }

    fn flush(&mut self) {
        if let Some(line) = self.current.take() {
            if !line.spans.is_empty() || !line.prefix.is_empty() {
                self.lines.push(line);
            }
        }
    }

    /// Blank line between top-level blocks, never doubled
    fn separate(&mut self) {
        if !matches!(self.lines.last(), Some(l) if l.kind == LineKind::Blank) && !self.lines.is_empty() {
            self.lines.push(StyledLine::blank());
        }
    }

    fn finish(mut self) -> Fragment {
        self.flush();
        while matches!(self.lines.last(), Some(l) if l.kind == LineKind::Blank) {
            self.lines.pop();
        }
        Fragment { lines: self.lines }
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> Fragment {
        CommonMark::default().render(text)
    }

    #[test]
    fn test_plain_paragraph() {
        let fragment = render("Hello there");
        assert_eq!(fragment.lines.len(), 1);
        assert_eq!(fragment.lines[0].kind, LineKind::Paragraph);
        assert_eq!(fragment.lines[0].text(), "Hello there");
    }

    #[test]
    fn test_bold_and_italic_spans() {
        let fragment = render("I hear **you** and *that* matters");
        let spans = &fragment.lines[0].spans;
        assert_eq!(spans.len(), 5);
        assert_eq!(spans[1].text, "you");
        assert!(spans[1].style.bold);
        assert_eq!(spans[3].text, "that");
        assert!(spans[3].style.italic);
        assert!(!spans[4].style.italic);
    }

    #[test]
    fn test_lists() {
        let fragment = render("Try:\n\n- walking\n- journaling\n\n1. breathe\n2. rest");
        let items: Vec<_> = fragment
            .lines
            .iter()
            .filter(|l| l.kind == LineKind::ListItem)
            .map(|l| (l.prefix.clone(), l.text()))
            .collect();
        assert_eq!(
            items,
            vec![
                ("• ".to_string(), "walking".to_string()),
                ("• ".to_string(), "journaling".to_string()),
                ("1. ".to_string(), "breathe".to_string()),
                ("2. ".to_string(), "rest".to_string()),
            ]
        );
    }

    #[test]
    fn test_heading_and_separation() {
        let fragment = render("# Coping\n\nOne step at a time.");
        assert_eq!(fragment.lines[0].kind, LineKind::Heading(1));
        assert!(fragment.lines[0].spans[0].style.bold);
        assert_eq!(fragment.lines[1].kind, LineKind::Blank);
        assert_eq!(fragment.lines[2].text(), "One step at a time.");
    }

    #[test]
    fn test_html_is_literal() {
        let fragment = render("<script>alert(1)</script>");
        assert!(fragment.to_plain_text().contains("<script>"));
    }

    #[test]
    fn test_plain_fragment_is_not_parsed() {
        let fragment = Fragment::plain("**not bold**");
        assert_eq!(fragment.lines.len(), 1);
        assert_eq!(fragment.lines[0].spans[0].text, "**not bold**");
        assert!(!fragment.lines[0].spans[0].style.bold);
    }

    #[test]
    fn test_code_block_lines() {
        let fragment = render("```\ninhale 4\nhold 7\n```");
        let code: Vec<_> = fragment
            .lines
            .iter()
            .filter(|l| l.kind == LineKind::Code)
            .map(|l| l.text())
            .collect();
        assert_eq!(code, vec!["inhale 4", "hold 7"]);
    }
}
