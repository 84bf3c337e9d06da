use std::any::Any;

use broterm_core::backend::{Failure, Room};
use broterm_core::{Activation, NavParams, ScopeToken, Screen, ScreenCx, ScreenId};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use tracing::debug;

use super::table::TableView;
use super::{HOME, Page, PageAction, Palette, ROOM_FINDER, spawn_load};
use crate::state::Services;

const ALERT: ScreenId = ScreenId::from_static("room_finder:alert");
const CONFIRM: ScreenId = ScreenId::from_static("room_finder:confirm");

#[derive(Debug, Default)]
pub struct RoomsPage {
    activation: Option<Activation<String>>,
    table: TableView<Room>,
    palette: Palette,
}

impl RoomsPage {
    fn populate(&mut self, cx: &mut ScreenCx<'_, Services>, outcome: Result<Vec<Room>, Failure>) {
        match outcome {
            Ok(rooms) => {
                self.palette.sync(&cx.services().themes);
                self.table.populate(rooms);
            }
            Err(failure) => cx.report(ALERT, failure),
        }
    }

    fn confirm_selected(&self, cx: &mut ScreenCx<'_, Services>) {
        let (Some((_, room)), Some(activation)) = (self.table.selected(), &self.activation) else {
            return;
        };
        let room = room.clone();
        let scope = activation.scope().clone();
        cx.confirm(CONFIRM, format!("Join {}?", room.name), move |cx| {
            Self::join(cx, &scope, room);
        });
    }

    fn join(cx: &mut ScreenCx<'_, Services>, scope: &ScopeToken, room: Room) {
        debug!(room = %room.name, "joining room");
        spawn_load::<Self, String, _, _>(
            cx.services(),
            scope,
            ROOM_FINDER,
            move |creds| async move {
                let token = creds.token()?;
                creds
                    .backend
                    .join_room(&token, &room.id)
                    .await
                    .into_result()
                    .map(|()| room.name)
            },
            Self::joined,
        );
    }

    fn joined(&mut self, cx: &mut ScreenCx<'_, Services>, outcome: Result<String, Failure>) {
        match outcome {
            Ok(name) => cx.alert_with_done(
                ALERT,
                format!("You have successfully joined the room '{name}'."),
                |cx| cx.navigate_to(HOME, None),
            ),
            Err(failure) => cx.report(ALERT, failure),
        }
    }
}

impl Screen<Services> for RoomsPage {
    fn on_show(&mut self, cx: &mut ScreenCx<'_, Services>, _params: Option<NavParams>) {
        let services = cx.services();
        self.palette.sync(&services.themes);
        let activation = Activation::begin(&services.session, &services.feed);
        if !activation.is_live() {
            debug!("no valid session; redirecting to login");
            cx.session_expired();
            return;
        }
        spawn_load::<Self, Vec<Room>, _, _>(
            services,
            activation.scope(),
            ROOM_FINDER,
            |creds| async move {
                let token = creds.token()?;
                creds.backend.get_rooms(&token).await.into_result()
            },
            Self::populate,
        );
        self.activation = Some(activation);
    }

    fn on_hide(&mut self, _cx: &mut ScreenCx<'_, Services>) {
        if let Some(mut activation) = self.activation.take() {
            activation.end();
        }
        self.table.clear();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Page for RoomsPage {
    fn title(&self) -> &'static str {
        "Find a Room"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.table.render(
            frame,
            area,
            [
                ("Room", Constraint::Fill(2)),
                ("Owner", Constraint::Fill(1)),
                ("Members", Constraint::Length(8)),
            ],
            |room| {
                [
                    room.name.clone(),
                    room.owner.clone(),
                    room.members.to_string(),
                ]
            },
            &self.palette,
            "No public rooms.",
        );
    }

    fn handle_key(&mut self, cx: &mut ScreenCx<'_, Services>, key: KeyEvent) -> PageAction {
        if self.table.handle_key(key) {
            return PageAction::None;
        }
        match key.code {
            KeyCode::Enter => self.confirm_selected(cx),
            KeyCode::Esc => cx.navigate_to(HOME, None),
            _ => {}
        }
        PageAction::None
    }

    fn hints(&self) -> String {
        "(tab) Next - (enter) Join room - (esc) Back".to_string()
    }
}

#[cfg(test)]
mod tests {
    use broterm_core::backend::FORBIDDEN_MESSAGE;
    use crossterm::event::KeyCode;

    use super::*;
    use crate::state::testing::Harness;

    async fn on_rooms() -> Harness {
        let mut harness = Harness::signed_in().await;
        harness.state.navigate(ROOM_FINDER).unwrap();
        harness.settle().await;
        harness
    }

    #[tokio::test]
    async fn test_lists_rooms() {
        let mut harness = on_rooms().await;
        let count = harness
            .state
            .nav
            .with_screen::<RoomsPage, _>(&ROOM_FINDER, |p| p.table.len());
        assert_eq!(count, Some(4));
    }

    #[tokio::test]
    async fn test_join_then_alert_navigates_home() {
        let mut harness = on_rooms().await;
        harness.press(KeyCode::Enter);
        assert_eq!(
            harness.top_dialog_message().as_deref(),
            Some("Join Leg Day?")
        );
        harness.press(KeyCode::Enter);
        harness.settle().await;

        assert_eq!(
            harness.top_dialog_message().as_deref(),
            Some("You have successfully joined the room 'Leg Day'.")
        );
        assert_eq!(harness.current(), Some("room_finder"));

        harness.press(KeyCode::Enter);
        assert_eq!(harness.current(), Some("home"));
        assert_eq!(harness.state.nav.modal_depth(), 0);
    }

    #[tokio::test]
    async fn test_forbidden_join_shows_generic_message() {
        let mut harness = on_rooms().await;
        harness.press(KeyCode::BackTab);
        harness.press(KeyCode::Enter);
        assert_eq!(
            harness.top_dialog_message().as_deref(),
            Some("Join VIP Lounge?")
        );
        harness.press(KeyCode::Enter);
        harness.settle().await;

        let top = harness.state.nav.top_dialog().unwrap();
        assert_eq!(top.message, FORBIDDEN_MESSAGE);
        assert!(!top.is_fatal());
        assert_eq!(harness.current(), Some("room_finder"));
    }

    #[tokio::test]
    async fn test_leaving_before_join_completes_drops_result() {
        let mut harness = on_rooms().await;
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Esc);
        harness.settle().await;

        assert_eq!(harness.current(), Some("home"));
        assert!(harness.top_dialog_message().is_none());
    }
}
