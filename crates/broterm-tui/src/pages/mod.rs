//! Pages registered with the navigator.
//!
//! Live pages follow one protocol: begin an [`Activation`] in `on_show`, load
//! through a spawned task, listen to `PROFILE_UPDATES`, and end the activation
//! in `on_hide`. Results come back through the dispatcher and are applied with
//! [`AppState::with_page`], so a result for a hidden page is dropped.
//!
//! [`Activation`]: broterm_core::Activation

mod friends;
mod help;
mod home;
mod login;
mod pending;
mod rooms;
mod style;
mod table;

use std::future::Future;
use std::sync::Arc;

use broterm_core::backend::{ChatBackend, Failure, User};
use broterm_core::{Dispatcher, Navigator, ScopeToken, Screen, ScreenCx, ScreenId, SessionScope};
use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::Rect;

pub use friends::FriendsPage;
pub use help::HelpPage;
pub use home::HomePage;
pub use login::LoginPage;
pub use pending::PendingPage;
pub use rooms::RoomsPage;
pub use style::Palette;

use crate::state::{AppState, Services};

pub const LOGIN: ScreenId = ScreenId::from_static("login");
pub const HOME: ScreenId = ScreenId::from_static("home");
pub const FRIENDS_LIST: ScreenId = ScreenId::from_static("friends_list");
pub const ACCEPT_FRIEND_REQUEST: ScreenId = ScreenId::from_static("accept_friend_request");
pub const ROOM_FINDER: ScreenId = ScreenId::from_static("room_finder");
pub const HELP: ScreenId = ScreenId::from_static("help");

/// What the runtime does after a page handled a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    None,
    /// Close this page's layer. Only meaningful for modal pages.
    Dismiss,
    Quit,
}

/// A screen that can draw itself and react to keys.
pub trait Page: Screen<Services> {
    fn title(&self) -> &'static str;

    /// Draws the page body. The frame title and hint line are drawn by the
    /// caller.
    fn render(&self, frame: &mut Frame, area: Rect);

    fn handle_key(&mut self, cx: &mut ScreenCx<'_, Services>, key: KeyEvent) -> PageAction;

    /// Instruction line shown under the page.
    fn hints(&self) -> String {
        String::new()
    }
}

pub fn register_all(nav: &mut Navigator<Services, dyn Page>) -> broterm_core::Result<()> {
    nav.register(LOGIN, Box::new(LoginPage::default()), true, false)?;
    nav.register(HOME, Box::new(HomePage::default()), true, false)?;
    nav.register(FRIENDS_LIST, Box::new(FriendsPage::default()), true, false)?;
    nav.register(
        ACCEPT_FRIEND_REQUEST,
        Box::new(PendingPage::default()),
        true,
        false,
    )?;
    nav.register(ROOM_FINDER, Box::new(RoomsPage::default()), true, false)?;
    nav.register(HELP, Box::new(HelpPage::default()), false, true)?;
    Ok(())
}

/// Applies a backend outcome to page `P` on the UI thread.
pub(crate) type Apply<P, T> = fn(&mut P, &mut ScreenCx<'_, Services>, Result<T, Failure>);

/// Awaits `load` and queues its outcome for page `id` under `scope`.
pub(crate) async fn load_into<P, T, Fut>(
    dispatcher: Dispatcher<AppState>,
    scope: ScopeToken,
    id: ScreenId,
    load: Fut,
    apply: Apply<P, T>,
) where
    P: Page + 'static,
    T: Send + 'static,
    Fut: Future<Output = Result<T, Failure>>,
{
    let outcome = load.await;
    dispatcher.dispatch_scoped(&scope, move |state: &mut AppState| {
        state.with_page::<P, _>(&id, |page, cx| apply(page, cx, outcome))?;
        Ok(())
    });
}

/// Spawns [`load_into`] on the runtime.
pub(crate) fn spawn_load<P, T, F, Fut>(
    services: &Services,
    scope: &ScopeToken,
    id: ScreenId,
    load: F,
    apply: Apply<P, T>,
) where
    P: Page + 'static,
    T: Send + 'static,
    F: FnOnce(Credentials) -> Fut,
    Fut: Future<Output = Result<T, Failure>> + Send + 'static,
{
    let load = load(Credentials::from(services));
    tokio::spawn(load_into(
        services.dispatcher.clone(),
        scope.clone(),
        id,
        load,
        apply,
    ));
}

/// Backend handle and session, cloned out of [`Services`] for a task.
#[derive(Clone)]
pub(crate) struct Credentials {
    pub backend: Arc<dyn ChatBackend>,
    pub session: SessionScope,
}

impl From<&Services> for Credentials {
    fn from(services: &Services) -> Self {
        Self {
            backend: Arc::clone(&services.backend),
            session: services.session.clone(),
        }
    }
}

impl Credentials {
    /// Current access token, or `SessionInvalid` when there is none.
    pub fn token(&self) -> Result<String, Failure> {
        self.session.access_token().ok_or(Failure::SessionInvalid)
    }

    pub async fn user(self) -> Result<User, Failure> {
        let token = self.token()?;
        self.backend.get_user(&token).await.into_result()
    }
}
