//! Pure view functions.
//!
//! Render reads `&AppState` and draws: the current page, then every layer
//! above it in stack order, then the status line. It never mutates state.

use broterm_core::nav::Layer;
use broterm_core::{ScreenId, Theme};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::overlays::dialog;
use crate::overlays::render_utils::centered_rect;
use crate::pages::Palette;
use crate::state::AppState;

const STATUS_HEIGHT: u16 = 1;

/// Size of a non-full-screen page, in percent of the body.
const WINDOW_PERCENT: (u16, u16) = (60, 60);

pub fn render(app: &AppState, frame: &mut Frame) {
    let theme = app.services.themes.current();
    let palette = Palette::from_theme(&theme);
    let area = frame.area();
    frame.render_widget(Block::default().style(palette.text()), area);

    let [body, status] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(STATUS_HEIGHT)]).areas(area);

    if let Some(id) = app.nav.current() {
        render_page(app, frame, body, id, &palette);
    }
    for layer in app.nav.layers() {
        match layer {
            Layer::Screen(id) => render_page(app, frame, body, id, &palette),
            Layer::Dialog(d) => dialog::render(frame, body, d, &theme),
        }
    }

    render_status(app, frame, status, &theme, &palette);
}

fn render_page(app: &AppState, frame: &mut Frame, body: Rect, id: &ScreenId, palette: &Palette) {
    let Some(page) = app.nav.screen(id) else {
        return;
    };
    let area = if app.nav.is_full_screen(id) {
        body
    } else {
        let window = centered_rect(WINDOW_PERCENT.0, WINDOW_PERCENT.1, body);
        frame.render_widget(Clear, window);
        window
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(Span::styled(
            format!(" {} ", page.title()),
            Style::default()
                .fg(palette.title)
                .add_modifier(Modifier::BOLD),
        ))
        .style(palette.text());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let hints = page.hints();
    let hint_height = u16::from(!hints.is_empty());
    let [content, footer] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(hint_height)]).areas(inner);
    let content = Rect {
        x: content.x + 1,
        width: content.width.saturating_sub(2),
        ..content
    };

    page.render(frame, content);
    if !hints.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::styled(hints, palette.muted())).centered(),
            footer,
        );
    }
}

fn render_status(app: &AppState, frame: &mut Frame, area: Rect, theme: &Theme, palette: &Palette) {
    let user = app
        .services
        .session
        .session()
        .filter(|_| app.services.session.is_valid())
        .map_or_else(|| "signed out".to_string(), |s| s.username);
    let screen = app.nav.current().map_or("-", ScreenId::as_str);

    let line = Line::from(vec![
        Span::styled(" broterm ", palette.selected()),
        Span::styled(format!(" {user} "), palette.header()),
        Span::styled(format!("| {screen} | theme: {} ", theme.code), palette.muted()),
    ]);
    frame.render_widget(Paragraph::new(line).style(palette.text()), area);
}
