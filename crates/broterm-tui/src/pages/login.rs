use std::any::Any;

use broterm_core::backend::Failure;
use broterm_core::{NavParams, ScopeToken, Screen, ScreenCx, ScreenId, Session};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tracing::debug;

use super::{HOME, LOGIN, Page, PageAction, Palette, spawn_load};
use crate::overlays::render_utils::{InputLine, render_input_line};
use crate::state::Services;

const ALERT: ScreenId = ScreenId::from_static("login:alert");
const MAX_USERNAME: usize = 32;

const BANNER: &[&str] = &[
    r" _               _                     ",
    r"| |__  _ __ ___ | |_ ___ _ __ _ __ ___  ",
    r"| '_ \| '__/ _ \| __/ _ \ '__| '_ ` _ \ ",
    r"| |_) | | | (_) | ||  __/ |  | | | | | |",
    r"|_.__/|_|  \___/ \__\___|_|  |_| |_| |_|",
];

#[derive(Debug, Default)]
pub struct LoginPage {
    username: String,
    pending: bool,
    scope: Option<ScopeToken>,
    palette: Palette,
}

impl LoginPage {
    fn submit(&mut self, cx: &mut ScreenCx<'_, Services>) {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            cx.alert(ALERT, "Enter a username to sign in.");
            return;
        }
        let Some(scope) = self.scope.as_ref() else {
            return;
        };
        debug!(%username, "signing in");
        self.pending = true;
        spawn_load::<Self, Session, _, _>(
            cx.services(),
            scope,
            LOGIN,
            move |creds| async move { creds.backend.sign_in(&username).await.into_result() },
            Self::signed_in,
        );
    }

    fn signed_in(&mut self, cx: &mut ScreenCx<'_, Services>, outcome: Result<Session, Failure>) {
        self.pending = false;
        match outcome {
            Ok(session) => {
                cx.services().session.begin(session);
                cx.navigate_to(HOME, None);
            }
            Err(failure) => cx.report(ALERT, failure),
        }
    }
}

impl Screen<Services> for LoginPage {
    fn on_show(&mut self, cx: &mut ScreenCx<'_, Services>, _params: Option<NavParams>) {
        // Sign-in runs before any session exists, so it cannot use a session scope.
        self.scope = Some(ScopeToken::detached());
        self.username.clear();
        self.pending = false;
        self.palette.sync(&cx.services().themes);
    }

    fn on_hide(&mut self, _cx: &mut ScreenCx<'_, Services>) {
        if let Some(scope) = self.scope.take() {
            scope.cancel();
        }
        self.pending = false;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Page for LoginPage {
    fn title(&self) -> &'static str {
        "Sign in"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let banner_height = u16::try_from(BANNER.len()).unwrap_or(u16::MAX);
        let [_, banner, _, prompt, status, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(banner_height),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);

        let lines: Vec<Line> = BANNER
            .iter()
            .map(|l| Line::styled(*l, self.palette.header()))
            .collect();
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), banner);

        let [_, input, _] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(40),
            Constraint::Fill(1),
        ])
        .areas(prompt);
        render_input_line(
            frame,
            input,
            &InputLine {
                value: &self.username,
                placeholder: Some("username"),
                prompt: "Username: ",
                prompt_color: self.palette.title,
                text_color: self.palette.foreground,
                placeholder_color: self.palette.info,
                cursor_color: self.palette.highlight,
            },
        );

        if self.pending {
            frame.render_widget(
                Paragraph::new(Line::styled("Signing in...", self.palette.muted()))
                    .alignment(Alignment::Center),
                status,
            );
        }
    }

    fn handle_key(&mut self, cx: &mut ScreenCx<'_, Services>, key: KeyEvent) -> PageAction {
        if self.pending {
            return match key.code {
                KeyCode::Esc => PageAction::Quit,
                _ => PageAction::None,
            };
        }
        match key.code {
            KeyCode::Enter => self.submit(cx),
            KeyCode::Esc => return PageAction::Quit,
            KeyCode::Backspace => {
                self.username.pop();
            }
            KeyCode::Char(c) if !c.is_control() && self.username.chars().count() < MAX_USERNAME => {
                self.username.push(c);
            }
            _ => {}
        }
        PageAction::None
    }

    fn hints(&self) -> String {
        "(enter) Sign in - (esc) Quit".to_string()
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use crate::state::testing::Harness;

    #[tokio::test]
    async fn test_empty_username_shows_alert() {
        let mut harness = Harness::new();
        harness.state.start().unwrap();
        harness.press(KeyCode::Enter);
        assert_eq!(
            harness.top_dialog_message().as_deref(),
            Some("Enter a username to sign in.")
        );
        assert_eq!(harness.current(), Some("login"));
    }

    #[tokio::test]
    async fn test_sign_in_starts_session_and_goes_home() {
        let mut harness = Harness::new();
        harness.state.start().unwrap();
        harness.type_text("chad");
        harness.press(KeyCode::Enter);
        assert!(!harness.state.services.session.is_valid());

        harness.settle().await;

        assert_eq!(harness.current(), Some("home"));
        let session = harness.state.services.session.session().unwrap();
        assert_eq!(session.username, "chad");
    }

    #[tokio::test]
    async fn test_backspace_edits_username() {
        let mut harness = Harness::new();
        harness.state.start().unwrap();
        harness.type_text("broo");
        harness.press(KeyCode::Backspace);
        let name = harness
            .state
            .nav
            .with_screen::<super::LoginPage, _>(&super::LOGIN, |p| p.username.clone());
        assert_eq!(name.as_deref(), Some("bro"));
    }

    #[tokio::test]
    async fn test_esc_quits() {
        let mut harness = Harness::new();
        harness.state.start().unwrap();
        harness.press(KeyCode::Esc);
        assert!(harness.state.should_quit);
    }

    #[tokio::test]
    async fn test_result_after_leaving_page_is_dropped() {
        let mut harness = Harness::new();
        harness.state.start().unwrap();
        harness.type_text("bro");
        harness.press(KeyCode::Enter);
        // Re-showing login gives it a fresh scope; the old sign-in is stale.
        harness.state.services.session.end();
        harness.state.navigate(super::HOME).unwrap();
        harness.settle().await;

        assert_eq!(harness.current(), Some("login"));
        assert!(!harness.state.services.session.is_valid());
    }
}
