use std::any::Any;

use broterm_core::{NavParams, Screen, ScreenCx};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use super::{Page, PageAction, Palette};
use crate::state::Services;

const KEYS: &[(&str, &str)] = &[
    ("tab / shift+tab", "Move selection"),
    ("enter", "Select"),
    ("esc", "Back"),
    ("p", "Pending requests (Bros)"),
    ("t", "Switch theme (Home)"),
    ("ctrl+c", "Quit"),
];

/// Key reference shown as a modal layer over the current page.
#[derive(Debug, Default)]
pub struct HelpPage {
    palette: Palette,
}

impl Screen<Services> for HelpPage {
    fn on_show(&mut self, cx: &mut ScreenCx<'_, Services>, _params: Option<NavParams>) {
        self.palette.sync(&cx.services().themes);
    }

    fn on_hide(&mut self, _cx: &mut ScreenCx<'_, Services>) {}

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Page for HelpPage {
    fn title(&self) -> &'static str {
        "Keys"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = KEYS
            .iter()
            .map(|(key, action)| {
                Line::from(vec![
                    Span::styled(format!("{key:>16}  "), self.palette.header()),
                    Span::styled(*action, self.palette.text()),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).style(self.palette.text()), area);
    }

    fn handle_key(&mut self, _cx: &mut ScreenCx<'_, Services>, key: KeyEvent) -> PageAction {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?' | 'q') => PageAction::Dismiss,
            _ => PageAction::None,
        }
    }

    fn hints(&self) -> String {
        "(esc) Close".to_string()
    }
}
