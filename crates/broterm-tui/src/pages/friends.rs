use std::any::Any;

use broterm_core::backend::{Failure, Relationship, User};
use broterm_core::feed::PROFILE_UPDATES;
use broterm_core::{Activation, ListenerStep, NavParams, Screen, ScreenCx, ScreenId};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tracing::debug;

use super::table::TableView;
use super::{
    ACCEPT_FRIEND_REQUEST, Credentials, FRIENDS_LIST, HOME, Page, PageAction, Palette, load_into,
    spawn_load,
};
use crate::state::Services;

const ALERT: ScreenId = ScreenId::from_static("friends_list:alert");

/// `Jan 2, 2006`
pub(crate) const DATE_FORMAT: &str = "%b %-d, %Y";

pub(crate) fn last_active(rel: &Relationship) -> String {
    if rel.is_online {
        "Now".to_string()
    } else {
        rel.last_online.format(DATE_FORMAT).to_string()
    }
}

#[derive(Debug, Default)]
pub struct FriendsPage {
    activation: Option<Activation<String>>,
    table: TableView<Relationship>,
    pending: usize,
    palette: Palette,
}

impl FriendsPage {
    fn populate(&mut self, cx: &mut ScreenCx<'_, Services>, outcome: Result<User, Failure>) {
        match outcome {
            Ok(user) => {
                self.palette.sync(&cx.services().themes);
                self.table.populate(user.friends().cloned());
                self.pending = user.pending_requests().count();
                debug!(
                    friends = self.table.len(),
                    pending = self.pending,
                    "friends list populated"
                );
            }
            Err(failure) => cx.report(ALERT, failure),
        }
    }
}

impl Screen<Services> for FriendsPage {
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
            FRIENDS_LIST,
            Credentials::user,
            Self::populate,
        );

        let creds = Credentials::from(services);
        let dispatcher = services.dispatcher.clone();
        activation.listen(PROFILE_UPDATES, move |code, scope| {
            debug!(%code, "refreshing friends list");
            let load = creds.clone().user();
            let dispatcher = dispatcher.clone();
            async move {
                load_into::<FriendsPage, User, _>(
                    dispatcher,
                    scope,
                    FRIENDS_LIST,
                    load,
                    FriendsPage::populate,
                )
                .await;
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
        self.pending = 0;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Page for FriendsPage {
    fn title(&self) -> &'static str {
        "Bros"
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [summary, _, body] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(area);

        let online = self.table.items().filter(|r| r.is_online).count();
        let text = format!(
            "{} bros, {online} online, {} pending",
            self.table.len(),
            self.pending
        );
        frame.render_widget(
            Paragraph::new(Line::styled(text, self.palette.muted())),
            summary,
        );

        self.table.render(
            frame,
            body,
            [
                ("Username", Constraint::Fill(2)),
                ("Status", Constraint::Length(8)),
                ("Last Active", Constraint::Length(14)),
            ],
            |rel| {
                let status = if rel.is_online { "Online" } else { "Offline" };
                [rel.username.clone(), status.to_string(), last_active(rel)]
            },
            &self.palette,
            "No bros yet.",
        );
    }

    fn handle_key(&mut self, cx: &mut ScreenCx<'_, Services>, key: KeyEvent) -> PageAction {
        if self.table.handle_key(key) {
            return PageAction::None;
        }
        match key.code {
            KeyCode::Enter => {
                if let Some((_, rel)) = self.table.selected() {
                    cx.alert(ALERT, format!("Selected user: {}", rel.username));
                }
            }
            KeyCode::Char('p') => cx.navigate_to(ACCEPT_FRIEND_REQUEST, None),
            KeyCode::Esc => cx.navigate_to(HOME, None),
            _ => {}
        }
        PageAction::None
    }

    fn hints(&self) -> String {
        format!(
            "(tab) Next - (enter) Info - (p) View Pending [{}] - (esc) Back",
            self.pending
        )
    }
}
