use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use companion_core::markdown::{LineKind, SpanStyle, StyledLine};
use companion_core::panels::{BreathPhase, BreathingGuide, ExercisePanel, ResourcesPanel, BREATHE_IN, BREATHE_OUT};
use companion_core::{ChatRole, ConcernLevel, Fragment, Mood, Reaction, UiState};

use crate::app::{Action, App, FocusPane};

/// Colors for one theme. Dark is the default; light is toggled with Ctrl+T.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub user_accent: Color,
    pub bot_accent: Color,
    pub link: Color,
    pub code: Color,
    pub border: Color,
    pub border_active: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub danger: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            background: Color::Reset,
            text: Color::Gray,
            muted: Color::DarkGray,
            user_accent: Color::Cyan,
            bot_accent: Color::Yellow,
            link: Color::LightBlue,
            code: Color::LightGreen,
            border: Color::DarkGray,
            border_active: Color::Cyan,
            highlight_bg: Color::Magenta,
            highlight_fg: Color::White,
            danger: Color::Red,
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::White,
            text: Color::Black,
            muted: Color::Gray,
            user_accent: Color::Blue,
            bot_accent: Color::Magenta,
            link: Color::Blue,
            code: Color::Green,
            border: Color::Gray,
            border_active: Color::Blue,
            highlight_bg: Color::Blue,
            highlight_fg: Color::White,
            danger: Color::Red,
        }
    }

    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }
}

fn span_style(style: SpanStyle, theme: &Theme) -> Style {
    let mut out = Style::default();
    if style.bold {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.italic {
        out = out.add_modifier(Modifier::ITALIC);
    }
    if style.strikethrough {
        out = out.add_modifier(Modifier::CROSSED_OUT);
    }
    if style.code {
        out = out.fg(theme.code);
    }
    if style.link {
        out = out.fg(theme.link).add_modifier(Modifier::UNDERLINED);
    }
    out
}

/// Convert one rendered markdown line into a styled terminal line
fn styled_line(line: &StyledLine, theme: &Theme) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();

    if line.quote_depth > 0 {
        spans.push(Span::styled("│ ".repeat(line.quote_depth), Style::default().fg(theme.muted)));
    }
    if line.indent > 0 {
        spans.push(Span::raw("  ".repeat(line.indent)));
    }

    match line.kind {
        LineKind::Rule => {
            spans.push(Span::styled("─".repeat(24), Style::default().fg(theme.muted)));
            return Line::from(spans);
        }
        LineKind::Blank => return Line::default(),
        _ => {}
    }

    if !line.prefix.is_empty() {
        spans.push(Span::styled(line.prefix.clone(), Style::default().fg(theme.bot_accent)));
    }

    let heading = matches!(line.kind, LineKind::Heading(_));
    for span in &line.spans {
        let mut style = span_style(span.style, theme);
        if heading {
            style = style.fg(theme.bot_accent);
        }
        spans.push(Span::styled(span.text.clone(), style));
    }

    Line::from(spans)
}

fn fragment_lines(fragment: &Fragment, theme: &Theme) -> Vec<Line<'static>> {
    fragment.lines.iter().map(|l| styled_line(l, theme)).collect()
}

/// A run of same-kind text (word or whitespace) that may cross span boundaries
struct Chunk {
    pieces: Vec<Span<'static>>,
    width: usize,
    is_space: bool,
}

fn chunks(line: &Line<'static>) -> Vec<Chunk> {
    let mut out: Vec<Chunk> = Vec::new();
    for span in &line.spans {
        let mut buf = String::new();
        let mut buf_space = None;
        for c in span.content.chars() {
            let is_space = c.is_whitespace();
            if buf_space.is_some_and(|s| s != is_space) {
                push_piece(&mut out, std::mem::take(&mut buf), span.style, !is_space);
            }
            buf_space = Some(is_space);
            buf.push(c);
        }
        if let Some(is_space) = buf_space {
            push_piece(&mut out, buf, span.style, is_space);
        }
    }
    out
}

fn push_piece(out: &mut Vec<Chunk>, text: String, style: Style, is_space: bool) {
    let piece = Span::styled(text, style);
    let width = piece.width();
    match out.last_mut() {
        Some(last) if last.is_space == is_space => {
            last.pieces.push(piece);
            last.width += width;
        }
        _ => out.push(Chunk { pieces: vec![piece], width, is_space }),
    }
}

/// Wrap one styled line at word boundaries into rows no wider than `width`.
///
/// The timeline is drawn without ratatui's own wrapping so that the number of
/// rows here is exactly what ends up on screen. Leading whitespace survives
/// on the first row only; words wider than a row are split by character.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    if line.width() <= width {
        return vec![line];
    }

    let mut rows: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    let mut row_width = 0;
    let mut pending_space: Option<Chunk> = None;

    for chunk in chunks(&line) {
        if chunk.is_space {
            if rows.len() == 1 && row_width == 0 {
                // Indentation and bullets on the first row
                row_width += chunk.width.min(width);
                rows[0].extend(chunk.pieces);
            } else if row_width > 0 {
                pending_space = Some(chunk);
            }
            continue;
        }

        let space_width = pending_space.as_ref().map_or(0, |s| s.width);
        if row_width > 0 && row_width + space_width + chunk.width > width {
            rows.push(Vec::new());
            row_width = 0;
            pending_space = None;
        }
        if let Some(space) = pending_space.take() {
            row_width += space.width;
            if let Some(row) = rows.last_mut() {
                row.extend(space.pieces);
            }
        }

        if chunk.width <= width - row_width.min(width) {
            row_width += chunk.width;
            if let Some(row) = rows.last_mut() {
                row.extend(chunk.pieces);
            }
            continue;
        }

        // Word longer than a whole row
        for piece in chunk.pieces {
            let style = piece.style;
            for c in piece.content.chars() {
                let cell = Span::styled(c.to_string(), style);
                let cell_width = cell.width();
                if row_width > 0 && row_width + cell_width > width {
                    rows.push(Vec::new());
                    row_width = 0;
                }
                row_width += cell_width;
                if let Some(row) = rows.last_mut() {
                    row.push(cell);
                }
            }
        }
    }

    rows.into_iter().map(Line::from).collect()
}

fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    lines.into_iter().flat_map(|l| wrap_line(l, width)).collect()
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let theme = Theme::for_mode(app.dark_mode);
    let area = frame.area();

    frame.render_widget(Block::default().style(Style::default().bg(theme.background)), area);

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, &theme, frame, header_area);

    // Panels take the right side only while something is shown
    let panels_visible = app.controller.ui().panels.any_visible();
    let [chat_column, panel_column] = if panels_visible {
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(body_area)
    } else {
        Layout::horizontal([Constraint::Percentage(100), Constraint::Length(0)]).areas(body_area)
    };

    render_chat_column(app, &theme, frame, chat_column);

    if panels_visible {
        app.panel_area = Some(panel_column);
        render_panels(app, &theme, frame, panel_column);
    } else {
        app.panel_area = None;
        app.panel_scroll = 0;
    }

    render_footer(app, &theme, frame, footer_area);
}

fn render_header(app: &App, theme: &Theme, frame: &mut Frame, area: Rect) {
    let ui = app.controller.ui();

    let mut spans = vec![
        Span::styled(" Mind Companion ", Style::default().fg(theme.user_accent).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(theme.muted),
        ),
        Span::styled(format!("{} ", app.client.base_url()), Style::default().fg(theme.muted)),
    ];

    if let Some(level) = ui.concern_level {
        let color = match level {
            ConcernLevel::Low => theme.muted,
            ConcernLevel::Moderate => theme.bot_accent,
            ConcernLevel::High | ConcernLevel::Critical => theme.danger,
        };
        spans.push(Span::styled(
            format!("[concern: {}] ", level.as_str()),
            Style::default().fg(color),
        ));
    }

    if let Some(notice) = &ui.notice {
        spans.push(Span::styled(
            notice.clone(),
            Style::default().fg(theme.bot_accent).add_modifier(Modifier::ITALIC),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.border));
    frame.render_widget(header, area);
}

fn render_chat_column(app: &mut App, theme: &Theme, frame: &mut Frame, area: Rect) {
    let mood_height = if app.controller.ui().mood.visible { 3 } else { 0 };
    let input_lines = app.controller.input().split('\n').count().clamp(1, 4) as u16;

    let [chat_area, mood_area, actions_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(mood_height),
        Constraint::Length(3),
        Constraint::Length(input_lines + 2),
    ])
    .areas(area);

    render_timeline(app, theme, frame, chat_area);
    if mood_height > 0 {
        render_mood_selector(app, theme, frame, mood_area);
    }
    render_actions(app, theme, frame, actions_area);
    render_input(app, theme, frame, input_area);
}

fn render_timeline(app: &mut App, theme: &Theme, frame: &mut Frame, area: Rect) {
    // Store area and inner size for mouse hit-testing and scroll calculations
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    let inner_width = area.width.saturating_sub(2) as usize;

    let ui = app.controller.ui();
    let lines = wrap_lines(timeline_lines(ui, theme, app.animation_frame), inner_width);

    // Long sessions can exceed what a u16 scroll offset can address
    let max_scroll = lines.len().saturating_sub(app.chat_height as usize);
    let max_scroll = u16::try_from(max_scroll).unwrap_or(u16::MAX);

    if app.controller.ui_mut().take_scroll_request() {
        app.follow_latest = true;
    }
    if app.follow_latest || app.chat_scroll >= max_scroll {
        app.chat_scroll = max_scroll;
        app.follow_latest = true;
    }

    let border_color = if app.focus == FocusPane::Input {
        theme.border_active
    } else {
        theme.border
    };
    let title = if app.follow_latest {
        " Conversation ".to_string()
    } else {
        " Conversation (Ctrl+End for latest) ".to_string()
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let chat = Paragraph::new(Text::from(lines))
        .style(Style::default().fg(theme.text))
        .block(chat_block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn timeline_lines(ui: &UiState, theme: &Theme, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for entry in ui.timeline.entries() {
        let rendered = &entry.rendered;
        match rendered.message.role {
            ChatRole::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(theme.user_accent).add_modifier(Modifier::BOLD),
                )));
                for text_line in rendered.message.text.lines() {
                    lines.push(Line::from(text_line.to_string()));
                }
            }
            ChatRole::Bot => {
                lines.push(Line::from(Span::styled(
                    "Companion:",
                    Style::default().fg(theme.bot_accent).add_modifier(Modifier::BOLD),
                )));
                lines.extend(fragment_lines(&rendered.body, theme));

                // Acknowledged reactions stay visible on their message
                let acknowledged: Vec<Span<'static>> = rendered
                    .reactions
                    .iter()
                    .filter(|r| ui.is_acknowledged(entry.id, **r))
                    .map(|r| Span::styled(format!("{} ", r.icon()), Style::default().fg(theme.bot_accent)))
                    .collect();
                if !acknowledged.is_empty() {
                    lines.push(Line::from(acknowledged));
                }
            }
        }
        lines.push(Line::default());
    }

    if ui.timeline.typing_visible() {
        lines.push(Line::from(Span::styled(
            "Companion:",
            Style::default().fg(theme.bot_accent).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("typing{}", dots),
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_mood_selector(app: &App, theme: &Theme, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Moods;
    let border_color = if focused { theme.border_active } else { theme.border };

    let mut spans: Vec<Span> = Vec::new();
    for (i, mood) in Mood::ALL.iter().enumerate() {
        let label = format!(" {} {} {} ", i + 1, mood.emoji(), mood.as_str());
        let style = if focused && i == app.mood_idx {
            Style::default().bg(theme.highlight_bg).fg(theme.highlight_fg).bold()
        } else {
            Style::default().fg(theme.text)
        };
        spans.push(Span::styled(label, style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" How are you feeling today? ");

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_actions(app: &App, theme: &Theme, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Actions;
    let border_color = if focused { theme.border_active } else { theme.border };
    let ui = app.controller.ui();

    let mut spans: Vec<Span> = Vec::new();
    for (i, action) in app.actions().into_iter().enumerate() {
        let selected = focused && i == app.action_idx;
        let (label, base) = match action {
            Action::Suggestion(text) => (format!(" {} ", text), Style::default().fg(theme.link)),
            Action::Reaction(id, reaction) => {
                let style = if ui.is_acknowledged(id, reaction) {
                    Style::default().fg(theme.bot_accent).bold()
                } else {
                    Style::default().fg(theme.muted)
                };
                let label = match reaction {
                    Reaction::TryAnother => format!(" {} {} ", reaction.icon(), reaction.label()),
                    _ => format!(" {} ", reaction.icon()),
                };
                (label, style)
            }
        };
        let style = if selected {
            Style::default().bg(theme.highlight_bg).fg(theme.highlight_fg).bold()
        } else {
            base
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Suggestions (Tab to focus, Enter to send) ");

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_input(app: &App, theme: &Theme, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Input;
    let border_color = if focused { theme.bot_accent } else { theme.border };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message (Enter to send, Shift+Enter for newline) ");

    // Calculate visible portion of the current input line with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let input = app.controller.input();
    let before_cursor: String = input.chars().take(app.input_cursor).collect();
    let cursor_row = before_cursor.matches('\n').count();
    let cursor_col = before_cursor.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0);

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_col >= inner_width {
        cursor_col - inner_width + 1
    } else {
        0
    };

    let visible_rows = area.height.saturating_sub(2) as usize;
    let row_offset = (cursor_row + 1).saturating_sub(visible_rows.max(1));

    let visible: Vec<Line> = input
        .split('\n')
        .skip(row_offset)
        .take(visible_rows.max(1))
        .map(|l| Line::from(l.chars().skip(scroll_offset).take(inner_width).collect::<String>()))
        .collect();

    let paragraph = Paragraph::new(Text::from(visible))
        .style(Style::default().fg(theme.user_accent))
        .block(input_block);

    frame.render_widget(paragraph, area);

    if focused {
        let cursor_x = (cursor_col - scroll_offset) as u16;
        let cursor_y = (cursor_row - row_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + cursor_y + 1));
    }
}

fn render_panels(app: &App, theme: &Theme, frame: &mut Frame, area: Rect) {
    let panels = &app.controller.ui().panels;

    let constraints = match (panels.resources().is_some(), panels.exercise().is_some()) {
        (true, true) => [Constraint::Percentage(55), Constraint::Percentage(45)],
        (true, false) => [Constraint::Percentage(100), Constraint::Length(0)],
        _ => [Constraint::Length(0), Constraint::Percentage(100)],
    };
    let [resources_area, exercise_area] = Layout::vertical(constraints).areas(area);

    if let Some(resources) = panels.resources() {
        render_resources(resources, app.panel_scroll, theme, frame, resources_area);
    }
    if let Some(exercise) = panels.exercise() {
        render_exercise(exercise, app.tick, theme, frame, exercise_area);
    }
}

fn render_resources(panel: &ResourcesPanel, scroll: u16, theme: &Theme, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = vec![Line::from(panel.summary.clone()), Line::default()];

    for item in &panel.items {
        lines.push(Line::from(Span::styled(
            item.name.clone(),
            Style::default().fg(theme.bot_accent).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(item.description.clone()));
        for detail in &item.details {
            match detail.url() {
                Some(url) => lines.push(Line::from(vec![
                    Span::styled(
                        detail.label(),
                        Style::default().fg(theme.link).add_modifier(Modifier::UNDERLINED),
                    ),
                    Span::styled(format!(" {}", url), Style::default().fg(theme.muted)),
                ])),
                None => lines.push(Line::from(detail.label())),
            }
        }
        lines.push(Line::default());
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.bot_accent))
        .title(" Resources (Ctrl+O to close) ");

    let paragraph = Paragraph::new(Text::from(lines))
        .style(Style::default().fg(theme.text))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_exercise(panel: &ExercisePanel, tick: u64, theme: &Theme, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            panel.name.clone(),
            Style::default().fg(theme.bot_accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(panel.description.clone()),
        Line::from(Span::styled(
            panel.benefits_line(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];

    if let Some(guide) = &panel.breathing_guide {
        lines.push(Line::default());
        lines.extend(breathing_lines(guide, tick, theme));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.code))
        .title(" Try this exercise (Ctrl+E to close) ");

    let paragraph = Paragraph::new(Text::from(lines))
        .style(Style::default().fg(theme.text))
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn breathing_lines(guide: &BreathingGuide, tick: u64, theme: &Theme) -> Vec<Line<'static>> {
    let size = guide.size(tick) as usize;
    let phase = guide.phase(tick);

    let circle = format!("({})", "●".repeat(size.max(1)));
    let active = Style::default().fg(theme.code).add_modifier(Modifier::BOLD);
    let idle = Style::default().fg(theme.muted);

    let (in_style, out_style) = match phase {
        BreathPhase::Expand => (active, idle),
        BreathPhase::Contract => (idle, active),
    };

    vec![
        Line::from(Span::styled(circle, Style::default().fg(theme.code))).alignment(Alignment::Center),
        Line::from(Span::styled(BREATHE_IN, in_style)).alignment(Alignment::Center),
        Line::from(Span::styled(BREATHE_OUT, out_style)).alignment(Alignment::Center),
    ]
}

fn render_footer(app: &App, theme: &Theme, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(theme.text);

    let mode_text = match app.focus {
        FocusPane::Input => " CHAT ",
        FocusPane::Actions => " SUGGEST ",
        FocusPane::Moods => " MOOD ",
    };

    let mut hints: Vec<(&str, &str)> = vec![("Tab", "focus"), ("PgUp/PgDn", "scroll")];
    match app.focus {
        FocusPane::Input => hints.push(("Enter", "send")),
        FocusPane::Actions => hints.push(("←/→", "select")),
        FocusPane::Moods => hints.push(("1-6", "mood")),
    }
    hints.extend([
        ("Ctrl+R", "reset"),
        ("Ctrl+T", if app.dark_mode { "light" } else { "dark" }),
        ("Esc", "close panels"),
        ("Ctrl+C", "quit"),
    ]);

    let mut spans = vec![
        Span::styled(mode_text, Style::default().bg(theme.border_active).fg(Color::Black).bold()),
        Span::raw(" "),
    ];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use companion_core::markdown::{CommonMark, MarkdownRenderer};
    use companion_core::{CompanionClient, ReplyPayload};
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_styled_line_bullets_and_bold() {
        let theme = Theme::dark();
        let fragment = CommonMark::default().render("- **Rest** well");
        let line = styled_line(&fragment.lines[0], &theme);
        assert_eq!(line.spans[0].content, "• ");
        assert_eq!(line.spans[1].content, "Rest");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    fn row_texts(rows: &[Line]) -> Vec<String> {
        rows.iter()
            .map(|r| r.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_wrap_line_breaks_at_words() {
        assert_eq!(row_texts(&wrap_line(Line::from(""), 10)), vec![""]);
        assert_eq!(row_texts(&wrap_line(Line::from("abcdefghij"), 10)), vec!["abcdefghij"]);
        assert_eq!(
            row_texts(&wrap_line(Line::from("one two three four"), 9)),
            vec!["one two", "three", "four"]
        );
        // Too long for any row
        assert_eq!(
            row_texts(&wrap_line(Line::from("abcdefghijk"), 5)),
            vec!["abcde", "fghij", "k"]
        );
    }

    #[test]
    fn test_wrap_line_keeps_styles_and_indent() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::raw("  • "),
            Span::styled("restful", bold),
            Span::raw(" sleep every night"),
        ]);
        let rows = wrap_line(line, 16);
        assert_eq!(row_texts(&rows), vec!["  • restful", "sleep every", "night"]);
        let restful = rows[0].spans.iter().find(|s| s.content == "restful").unwrap();
        assert!(restful.style.add_modifier.contains(Modifier::BOLD));
        assert!(rows.iter().all(|r| r.width() <= 16));
    }

    #[test]
    fn test_long_reply_tail_is_visible() {
        let mut app = App::new(CompanionClient::new("http://127.0.0.1:9"), true, false);
        let mut reply: String = (0..60).map(|i| format!("wordy{:02} abcdefg ", i)).collect();
        reply.push_str("FINALTOKEN");

        let pending = app.controller.begin_send("tell me everything").unwrap();
        app.controller.complete_send(pending, Ok(ReplyPayload::text(&reply)));

        let mut terminal = Terminal::new(TestBackend::new(40, 30)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(buffer_text(&terminal).contains("FINALTOKEN"));

        // Scrolling away and back down reaches the same tail
        app.scroll_up(10);
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(!buffer_text(&terminal).contains("FINALTOKEN"));

        app.scroll_down(500);
        terminal.draw(|f| render(&mut app, f)).unwrap();
        assert!(buffer_text(&terminal).contains("FINALTOKEN"));
        assert!(app.follow_latest);
    }

    #[test]
    fn test_render_shows_greeting_and_panels() {
        let mut app = App::new(CompanionClient::new("http://127.0.0.1:9"), true, false);
        let pending = app.controller.begin_send("I feel anxious").unwrap();
        app.controller.complete_send(
            pending,
            Ok(ReplyPayload {
                exercise: Some(companion_core::ExerciseBlock {
                    name: "Box Breathing".to_string(),
                    description: "Inhale for 4".to_string(),
                    benefits: "Calms".to_string(),
                }),
                ..ReplyPayload::text("Let's breathe together.")
            }),
        );

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render(&mut app, f)).unwrap();
        let screen = buffer_text(&terminal);

        assert!(screen.contains("Mind Companion"));
        assert!(screen.contains("Box Breathing"));
        assert!(screen.contains(BREATHE_IN));
        assert!(screen.contains("Let's breathe together."));
        assert!(app.panel_area.is_some());
    }

    #[test]
    fn test_typing_indicator_line() {
        let mut app = App::new(CompanionClient::new("http://127.0.0.1:9"), true, false);
        let _pending = app.controller.begin_send("hello").unwrap();
        let lines = timeline_lines(app.controller.ui(), &Theme::dark(), 2);
        let last = lines.last().unwrap();
        assert_eq!(last.spans[0].content, "typing...");
    }
}
