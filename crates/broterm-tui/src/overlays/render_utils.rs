use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use unicode_width::UnicodeWidthChar;

/// Centers a `width` x `height` box inside `area`, shrinking it to fit.
pub fn calculate_overlay_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));

    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

/// Clears `area` and draws a titled border around it.
pub fn render_overlay_container(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    border_color: Color,
    background: Color,
) {
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(background))
        .title(format!(" {title} "))
        .title_style(
            Style::default()
                .fg(border_color)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(block, area);
}

pub struct OverlayConfig<'a> {
    pub title: &'a str,
    pub border_color: Color,
    pub background: Color,
    pub muted: Color,
    pub width: u16,
    pub height: u16,
    pub hints: &'a [InputHint<'a>],
}

pub struct OverlayLayout {
    pub popup: Rect,
    pub body: Rect,
    pub footer: Rect,
}

/// Draws a centered overlay with its hint footer and returns its layout.
pub fn render_overlay(frame: &mut Frame, area: Rect, config: &OverlayConfig<'_>) -> OverlayLayout {
    let popup = calculate_overlay_area(area, config.width, config.height);
    render_overlay_container(
        frame,
        popup,
        config.title,
        config.border_color,
        config.background,
    );

    let inner = Rect::new(
        popup.x + 1,
        popup.y + 1,
        popup.width.saturating_sub(2),
        popup.height.saturating_sub(2),
    );
    let footer_height = u16::from(!config.hints.is_empty());
    let [body, footer] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(footer_height)]).areas(inner);

    if !config.hints.is_empty() {
        render_hints(frame, footer, config.hints, config.border_color, config.muted);
    }

    OverlayLayout {
        popup,
        body,
        footer,
    }
}

pub struct InputHint<'a> {
    pub key: &'a str,
    pub action: &'a str,
}

impl<'a> InputHint<'a> {
    pub fn new(key: &'a str, action: &'a str) -> Self {
        Self { key, action }
    }
}

/// Renders `key action • key action` centered on the last line of `area`.
pub fn render_hints(
    frame: &mut Frame,
    area: Rect,
    hints: &[InputHint],
    highlight_color: Color,
    muted_color: Color,
) {
    let hints_y = area.y + area.height.saturating_sub(1);
    let hints_area = Rect::new(area.x, hints_y, area.width, 1);

    let mut spans = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" • ", Style::default().fg(muted_color)));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(highlight_color)));
        spans.push(Span::styled(
            format!(" {}", hint.action),
            Style::default().fg(muted_color),
        ));
    }

    let para = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(para, hints_area);
}

pub struct InputLine<'a> {
    pub value: &'a str,
    pub placeholder: Option<&'a str>,
    pub prompt: &'a str,
    pub prompt_color: Color,
    pub text_color: Color,
    pub placeholder_color: Color,
    pub cursor_color: Color,
}

/// Renders a prompt-style input line: `<prompt><text>█`.
pub fn render_input_line(frame: &mut Frame, area: Rect, input: &InputLine<'_>) {
    let max_width = area.width.saturating_sub(input.prompt.len() as u16 + 1) as usize;
    let cursor = Span::styled("█", Style::default().fg(input.cursor_color));
    let mut spans = vec![Span::styled(
        input.prompt,
        Style::default().fg(input.prompt_color),
    )];

    match input.placeholder {
        Some(placeholder) if input.value.is_empty() => {
            spans.push(cursor);
            spans.push(Span::styled(
                tail_within(placeholder, max_width),
                Style::default().fg(input.placeholder_color),
            ));
        }
        _ => {
            spans.push(Span::styled(
                tail_within(input.value, max_width),
                Style::default().fg(input.text_color),
            ));
            spans.push(cursor);
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Longest suffix of `text` that fits in `max_width` columns.
fn tail_within(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut start = text.len();
    for (idx, ch) in text.char_indices().rev() {
        width += ch.width().unwrap_or(0);
        if width > max_width {
            break;
        }
        start = idx;
    }
    text[start..].to_string()
}

/// Returns a centered rectangle of the given percentage size within `r`.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(r);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
