//! Confirmation, alert and fatal dialogs.

use broterm_core::Theme;
use broterm_core::nav::{Dialog, DialogChoice, DialogKind};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use super::render_utils::{InputHint, OverlayConfig, render_overlay};
use crate::pages::Palette;

const MIN_WIDTH: u16 = 32;
const MAX_WIDTH: u16 = 72;
/// Border, blank line and hint footer.
const CHROME_HEIGHT: u16 = 4;

/// Maps a key press to a dialog response. `None` leaves the dialog open.
pub fn choice_for<C>(dialog: &Dialog<C>, key: KeyEvent) -> Option<DialogChoice> {
    match (&dialog.kind, key.code) {
        (DialogKind::Confirm { .. }, KeyCode::Enter | KeyCode::Char('y' | 'Y')) => {
            Some(DialogChoice::Accept)
        }
        (DialogKind::Confirm { .. }, KeyCode::Esc | KeyCode::Char('n' | 'N')) => {
            Some(DialogChoice::Decline)
        }
        (DialogKind::Confirm { .. }, _) => None,
        (_, KeyCode::Enter | KeyCode::Esc) => Some(DialogChoice::Accept),
        _ => None,
    }
}

pub fn render<C>(frame: &mut Frame, area: Rect, dialog: &Dialog<C>, theme: &Theme) {
    let palette = Palette::from_theme(theme);
    let confirm_hints = [InputHint::new("y", "yes"), InputHint::new("n", "no")];
    let dismiss_hints = [InputHint::new("enter", "ok")];
    let (title, border, hints) = match dialog.kind {
        DialogKind::Confirm { .. } => ("Confirm", palette.highlight, &confirm_hints[..]),
        DialogKind::Alert { .. } => ("Notice", palette.title, &dismiss_hints[..]),
        DialogKind::Fatal => ("Error", Color::Red, &dismiss_hints[..]),
    };

    let text_width = dialog.message.width() as u16;
    let width = (text_width + 6).clamp(MIN_WIDTH, MAX_WIDTH);
    let wrap_width = width.saturating_sub(4).max(1);
    let lines = text_width.div_ceil(wrap_width).max(1);

    let layout = render_overlay(
        frame,
        area,
        &OverlayConfig {
            title,
            border_color: border,
            background: palette.background,
            muted: palette.info,
            width,
            height: lines + CHROME_HEIGHT,
            hints,
        },
    );

    let body = Rect {
        x: layout.body.x + 1,
        width: layout.body.width.saturating_sub(2),
        ..layout.body
    };
    let message = Paragraph::new(dialog.message.as_str())
        .style(Style::default().fg(palette.foreground))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(message, body);
}
