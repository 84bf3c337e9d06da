use std::any::Any;

use broterm_core::backend::{Failure, Relationship, User};
use broterm_core::feed::{PROFILE_UPDATES, profile};
use broterm_core::{
    Activation, ListenerStep, NavParams, ScopeToken, Screen, ScreenCx, ScreenId,
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use tracing::debug;

use super::friends::last_active;
use super::table::TableView;
use super::{
    ACCEPT_FRIEND_REQUEST, Credentials, FRIENDS_LIST, Page, PageAction, Palette, load_into,
    spawn_load,
};
use crate::state::Services;

const ALERT: ScreenId = ScreenId::from_static("accept_friend_request:alert");
const CONFIRM: ScreenId = ScreenId::from_static("accept_friend_request:confirm");

#[derive(Debug, Default)]
pub struct PendingPage {
    activation: Option<Activation<String>>,
    table: TableView<Relationship>,
    palette: Palette,
}

impl PendingPage {
    fn populate(&mut self, cx: &mut ScreenCx<'_, Services>, outcome: Result<User, Failure>) {
        match outcome {
            Ok(user) => {
                self.palette.sync(&cx.services().themes);
                self.table.populate(user.pending_requests().cloned());
            }
            Err(failure) => cx.report(ALERT, failure),
        }
    }

    fn confirm_selected(&self, cx: &mut ScreenCx<'_, Services>) {
        let (Some((row, rel)), Some(activation)) = (self.table.selected(), &self.activation) else {
            return;
        };
        let rel = rel.clone();
        let scope = activation.scope().clone();
        cx.confirm(
            CONFIRM,
            format!("Accept Friend Request from {}?", rel.username),
            move |cx| Self::accept(cx, &scope, row, rel),
        );
    }

    fn accept(cx: &mut ScreenCx<'_, Services>, scope: &ScopeToken, row: usize, rel: Relationship) {
        debug!(user = %rel.username, row, "accepting friend request");
        spawn_load::<Self, (usize, Relationship), _, _>(
            cx.services(),
            scope,
            ACCEPT_FRIEND_REQUEST,
            move |creds| async move {
                let token = creds.token()?;
                creds
                    .backend
                    .accept_friend_request(&token, &rel.user_id)
                    .await
                    .into_result()
                    .map(|()| (row, rel))
            },
            Self::accepted,
        );
    }

    fn accepted(
        &mut self,
        cx: &mut ScreenCx<'_, Services>,
        outcome: Result<(usize, Relationship), Failure>,
    ) {
        match outcome {
            Ok((row, rel)) => {
                // A refetch may already have renumbered the rows.
                self.table.remove_if(row, |r| r.user_id == rel.user_id);
                cx.alert(ALERT, format!("Accepted Friend Request from {}", rel.username));
            }
            Err(failure) => cx.report(ALERT, failure),
        }
    }
}

impl Screen<Services> for PendingPage {
    fn on_show(&mut self, cx: &mut ScreenCx<'_, Services>, _params: Option<NavParams>) {
        let services = cx.services();
        self.palette.sync(&services.themes);

        let mut activation = Activation::begin(&services.session, &services.feed);
        if !activation.is_live() {
            debug!("no valid session; redirecting to login");
            cx.session_expired();
            return;
        }
        spawn_load::<Self, User, _, _>(
            services,
            activation.scope(),
            ACCEPT_FRIEND_REQUEST,
            Credentials::user,
            Self::populate,
        );

        let creds = Credentials::from(services);
        let dispatcher = services.dispatcher.clone();
        activation.listen(PROFILE_UPDATES, move |code, scope| {
            let load = (code == profile::RELATIONSHIP_CHANGED).then(|| creds.clone().user());
            let dispatcher = dispatcher.clone();
            async move {
                if let Some(load) = load {
                    load_into::<PendingPage, User, _>(
                        dispatcher,
                        scope,
                        ACCEPT_FRIEND_REQUEST,
                        load,
                        PendingPage::populate,
                    )
                    .await;
                }
                ListenerStep::Continue
            }
        });
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

impl Page for PendingPage {
    fn title(&self) -> &'static str {
        "Pending Requests"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.table.render(
            frame,
            area,
            [
                ("Username", Constraint::Fill(2)),
                ("Last Active", Constraint::Length(14)),
            ],
            |rel| [rel.username.clone(), last_active(rel)],
            &self.palette,
            "No pending requests.",
        );
    }

    fn handle_key(&mut self, cx: &mut ScreenCx<'_, Services>, key: KeyEvent) -> PageAction {
        if self.table.handle_key(key) {
            return PageAction::None;
        }
        match key.code {
            KeyCode::Enter => self.confirm_selected(cx),
            KeyCode::Esc => cx.navigate_to(FRIENDS_LIST, None),
            _ => {}
        }
        PageAction::None
    }

    fn hints(&self) -> String {
        "(tab) Next - (enter) Accept - (esc) Back".to_string()
    }
}
