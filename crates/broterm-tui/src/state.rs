//! Application state owned by the UI thread.
//!
//! `AppState` is the target of every dispatched mutation: background tasks
//! hold a [`Dispatcher<AppState>`] and never touch it any other way.

use std::sync::Arc;

use broterm_core::backend::ChatBackend;
use broterm_core::config::Config;
use broterm_core::dispatch::{self, DispatchQueue, Dispatcher};
use broterm_core::{
    FeedHub, Navigator, ScreenCx, ScreenId, SessionScope, SessionStore, Theme, ThemeProvider,
};
use tracing::warn;

use crate::pages::{self, Page};

/// Collaborators every page can reach through its `ScreenCx`.
pub struct Services {
    pub session: SessionScope,
    pub feed: FeedHub<String>,
    pub dispatcher: Dispatcher<AppState>,
    pub backend: Arc<dyn ChatBackend>,
    pub themes: ThemeProvider,
}

pub struct AppState {
    pub nav: Navigator<Services, dyn Page>,
    pub services: Services,
    pub should_quit: bool,
}

impl AppState {
    /// Builds the state with every page registered. Nothing is shown until
    /// [`AppState::start`].
    pub fn new(
        config: &Config,
        backend: Arc<dyn ChatBackend>,
        feed: FeedHub<String>,
    ) -> broterm_core::Result<(Self, DispatchQueue<Self>)> {
        let theme = Theme::by_code(&config.theme).unwrap_or_else(|| {
            warn!(code = %config.theme, "unknown theme; using default");
            Theme::default()
        });
        let session = SessionScope::new(SessionStore::default());
        let (dispatcher, queue) = dispatch::channel();

        let mut nav = Navigator::new(pages::LOGIN, session.clone());
        pages::register_all(&mut nav)?;

        let state = Self {
            nav,
            services: Services {
                session,
                feed,
                dispatcher,
                backend,
                themes: ThemeProvider::new(theme),
            },
            should_quit: false,
        };
        Ok((state, queue))
    }

    pub fn start(&mut self) -> broterm_core::Result<()> {
        self.navigate(pages::LOGIN)
    }

    pub fn navigate(&mut self, id: ScreenId) -> broterm_core::Result<()> {
        self.nav.navigate_to(&self.services, id, None)
    }

    /// Typed access to one page, with the ability to request navigation.
    ///
    /// Returns `Ok(None)` if `id` is not a `P`.
    pub fn with_page<P: Page + 'static, R>(
        &mut self,
        id: &ScreenId,
        f: impl FnOnce(&mut P, &mut ScreenCx<'_, Services>) -> R,
    ) -> broterm_core::Result<Option<R>> {
        self.nav.with_screen_cx(&self.services, id, f)
    }
}
