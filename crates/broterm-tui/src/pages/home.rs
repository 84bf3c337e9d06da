use std::any::Any;

use broterm_core::backend::Failure;
use broterm_core::{NavParams, ScopeToken, Screen, ScreenCx};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tracing::{debug, warn};

use super::{FRIENDS_LIST, HELP, HOME, LOGIN, Page, PageAction, Palette, ROOM_FINDER, spawn_load};
use crate::state::Services;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Bros,
    Chat,
    Logout,
}

impl MenuItem {
    const ALL: [MenuItem; 3] = [MenuItem::Bros, MenuItem::Chat, MenuItem::Logout];

    fn label(self) -> &'static str {
        match self {
            MenuItem::Bros => "Bros",
            MenuItem::Chat => "Chat",
            MenuItem::Logout => "Logout",
        }
    }
}

#[derive(Debug, Default)]
pub struct HomePage {
    selected: usize,
    username: String,
    scope: Option<ScopeToken>,
    palette: Palette,
}

impl HomePage {
    fn item(&self) -> MenuItem {
        MenuItem::ALL[self.selected % MenuItem::ALL.len()]
    }

    fn step(&mut self, forward: bool) {
        let len = MenuItem::ALL.len();
        self.selected = if forward {
            (self.selected + 1) % len
        } else {
            (self.selected + len - 1) % len
        };
    }

    fn activate(&mut self, cx: &mut ScreenCx<'_, Services>) {
        match self.item() {
            MenuItem::Bros => cx.navigate_to(FRIENDS_LIST, None),
            MenuItem::Chat => cx.navigate_to(ROOM_FINDER, None),
            MenuItem::Logout => self.logout(cx),
        }
    }

    fn logout(&mut self, cx: &mut ScreenCx<'_, Services>) {
        let Some(scope) = self.scope.as_ref() else {
            return;
        };
        spawn_load::<Self, (), _, _>(
            cx.services(),
            scope,
            HOME,
            |creds| async move {
                let token = creds.token()?;
                creds.backend.logout(&token).await.into_result()
            },
            Self::logged_out,
        );
    }

    fn logged_out(&mut self, cx: &mut ScreenCx<'_, Services>, outcome: Result<(), Failure>) {
        if let Err(failure) = outcome {
            warn!(?failure, "logout failed; ending local session anyway");
        }
        cx.services().session.end();
        cx.navigate_to(LOGIN, None);
    }
}

impl Screen<Services> for HomePage {
    fn on_show(&mut self, cx: &mut ScreenCx<'_, Services>, _params: Option<NavParams>) {
        let services = cx.services();
        if !services.session.is_valid() {
            debug!("home shown without a valid session");
            cx.session_expired();
            return;
        }
        self.username = services
            .session
            .session()
            .map(|s| s.username)
            .unwrap_or_default();
        self.scope = Some(services.session.derive_scope());
        self.palette.sync(&services.themes);
    }

    fn on_hide(&mut self, _cx: &mut ScreenCx<'_, Services>) {
        if let Some(scope) = self.scope.take() {
            scope.cancel();
        }
    }

    fn on_refresh(&mut self, cx: &mut ScreenCx<'_, Services>, _params: Option<NavParams>) {
        self.palette.sync(&cx.services().themes);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Page for HomePage {
    fn title(&self) -> &'static str {
        "Home"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [_, greeting, _, menu, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);

        let welcome = Line::from(vec![
            Span::styled("Sup, ", self.palette.text()),
            Span::styled(self.username.as_str(), self.palette.header()),
        ]);
        frame.render_widget(
            Paragraph::new(welcome).alignment(Alignment::Center),
            greeting,
        );

        let mut spans = Vec::new();
        for (i, item) in MenuItem::ALL.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("   ", self.palette.text()));
            }
            let style = if *item == self.item() {
                self.palette.selected()
            } else {
                self.palette.text()
            };
            spans.push(Span::styled(format!(" {} ", item.label()), style));
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
            menu,
        );
    }

    fn handle_key(&mut self, cx: &mut ScreenCx<'_, Services>, key: KeyEvent) -> PageAction {
        match key.code {
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => self.step(true),
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => self.step(false),
            KeyCode::Enter => self.activate(cx),
            KeyCode::Char('t') => {
                cx.services().themes.cycle();
                self.palette.sync(&cx.services().themes);
            }
            KeyCode::Char('?') => cx.navigate_to(HELP, None),
            KeyCode::Char('q') => return PageAction::Quit,
            _ => {}
        }
        PageAction::None
    }

    fn hints(&self) -> String {
        "(tab) Next - (enter) Select - (t) Theme - (?) Help - (q) Quit".to_string()
    }
}
