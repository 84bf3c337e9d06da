//! Screen registry and transition engine.
//!
//! The navigator owns every registered screen and the navigation state:
//! one current (non-modal) screen plus a stack of layers above it. Layers are
//! either registered modal screens or confirmation/alert dialogs; pushing a
//! layer suspends the screen beneath without hiding it.
//!
//! ## Transitions
//!
//! Screens never call back into the navigator. Their callbacks receive a
//! [`ScreenCx`] and record navigation requests on it; the navigator applies
//! them in order once the running transition has finished. This is what keeps
//! "outgoing `on_hide` completes before incoming `on_show` starts" true even
//! when a screen redirects from inside `on_show`.
//!
//! All methods must be called from the UI thread.

mod dialog;

use std::any::Any;
use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};
use std::fmt;

pub use dialog::{Dialog, DialogCallback, DialogChoice, DialogKind};
use tracing::{debug, warn};

use crate::backend::Failure;
use crate::error::{Error, Result};
use crate::session::SessionScope;

/// Stable identifier of a screen or dialog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenId(Cow<'static, str>);

impl ScreenId {
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque parameters handed to `on_show`.
pub struct NavParams(Box<dyn Any + Send>);

impl NavParams {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    pub fn into_inner<T: Any>(self) -> Option<T> {
        self.0.downcast().ok().map(|b| *b)
    }
}

impl fmt::Debug for NavParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NavParams(..)")
    }
}

/// Show/hide capability every screen implements.
///
/// `C` is the service bundle the application hands to screens (session,
/// feed, dispatcher, backend...).
pub trait Screen<C> {
    /// Called once each time the screen becomes current.
    fn on_show(&mut self, cx: &mut ScreenCx<'_, C>, params: Option<NavParams>);

    /// Called once when the screen stops being current. Must cancel the scope
    /// derived in `on_show` and release its subscriptions.
    fn on_hide(&mut self, cx: &mut ScreenCx<'_, C>);

    /// Called instead of hide+show when navigating to the current screen.
    fn on_refresh(&mut self, _cx: &mut ScreenCx<'_, C>, _params: Option<NavParams>) {}

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

enum NavCommand<C> {
    NavigateTo {
        id: ScreenId,
        params: Option<NavParams>,
    },
    Push(Dialog<C>),
    SessionExpired,
}

/// Handle given to screen callbacks: services plus a navigation request queue.
pub struct ScreenCx<'a, C> {
    services: &'a C,
    commands: &'a mut Vec<NavCommand<C>>,
}

impl<'a, C: 'static> ScreenCx<'a, C> {
    fn new(services: &'a C, commands: &'a mut Vec<NavCommand<C>>) -> Self {
        Self { services, commands }
    }

    pub fn services(&self) -> &'a C {
        self.services
    }

    /// Requests a transition once the current callback returns.
    pub fn navigate_to(&mut self, id: ScreenId, params: Option<NavParams>) {
        self.commands.push(NavCommand::NavigateTo { id, params });
    }

    pub fn confirm<F>(&mut self, id: ScreenId, message: impl Into<String>, on_accept: F)
    where
        F: FnOnce(&mut ScreenCx<'_, C>) + 'static,
    {
        self.commands.push(NavCommand::Push(Dialog::confirm(
            id,
            message.into(),
            Box::new(on_accept),
        )));
    }

    pub fn confirm_or<F, G>(
        &mut self,
        id: ScreenId,
        message: impl Into<String>,
        on_accept: F,
        on_decline: G,
    ) where
        F: FnOnce(&mut ScreenCx<'_, C>) + 'static,
        G: FnOnce(&mut ScreenCx<'_, C>) + 'static,
    {
        self.commands.push(NavCommand::Push(Dialog {
            id,
            message: message.into(),
            kind: DialogKind::Confirm {
                on_accept: Box::new(on_accept),
                on_decline: Some(Box::new(on_decline)),
            },
        }));
    }

    pub fn alert(&mut self, id: ScreenId, message: impl Into<String>) {
        self.commands
            .push(NavCommand::Push(Dialog::alert(id, message.into(), None)));
    }

    pub fn alert_with_done<F>(&mut self, id: ScreenId, message: impl Into<String>, on_dismiss: F)
    where
        F: FnOnce(&mut ScreenCx<'_, C>) + 'static,
    {
        self.commands.push(NavCommand::Push(Dialog::alert(
            id,
            message.into(),
            Some(Box::new(on_dismiss)),
        )));
    }

    pub fn alert_fatal(&mut self, id: ScreenId, message: impl Into<String>) {
        self.commands
            .push(NavCommand::Push(Dialog::fatal(id, message.into())));
    }

    /// Ends the session and redirects to the login screen.
    pub fn session_expired(&mut self) {
        self.commands.push(NavCommand::SessionExpired);
    }

    /// Routes a backend failure: redirect, dismissible alert, or fatal alert.
    pub fn report(&mut self, alert_id: ScreenId, failure: Failure) {
        match failure {
            Failure::SessionInvalid => self.session_expired(),
            Failure::Rejected(message) => self.alert(alert_id, message),
            Failure::Unclassified(message) => {
                warn!(%alert_id, %message, "unclassified failure");
                self.alert_fatal(alert_id, message);
            }
        }
    }
}

/// Registered screen plus its presentation flags.
struct Entry<V: ?Sized> {
    content: Box<V>,
    full_screen: bool,
    modal: bool,
}

/// One entry of the stack above the current screen.
pub enum Layer<C> {
    Screen(ScreenId),
    Dialog(Dialog<C>),
}

/// What receives keyboard input.
pub enum Focus<'a, C> {
    None,
    Screen(&'a ScreenId),
    Dialog(&'a Dialog<C>),
}

/// Screen registry and navigation state.
pub struct Navigator<C, V: ?Sized = dyn Screen<C>> {
    screens: HashMap<ScreenId, Entry<V>>,
    current: Option<ScreenId>,
    layers: Vec<Layer<C>>,
    login: ScreenId,
    session: SessionScope,
}

impl<C: 'static, V: ?Sized + Screen<C>> Navigator<C, V> {
    /// Creates an empty navigator. `login` is where session loss redirects.
    pub fn new(login: ScreenId, session: SessionScope) -> Self {
        Self {
            screens: HashMap::new(),
            current: None,
            layers: Vec::new(),
            login,
            session,
        }
    }

    /// Stores a screen definition. Registering an id twice is an error.
    pub fn register(
        &mut self,
        id: ScreenId,
        content: Box<V>,
        full_screen: bool,
        modal: bool,
    ) -> Result<()> {
        if self.screens.contains_key(&id) {
            return Err(Error::DuplicateScreen(id));
        }
        debug!(%id, full_screen, modal, "register screen");
        self.screens.insert(
            id,
            Entry {
                content,
                full_screen,
                modal,
            },
        );
        Ok(())
    }

    pub fn is_registered(&self, id: &ScreenId) -> bool {
        self.screens.contains_key(id)
    }

    pub fn current(&self) -> Option<&ScreenId> {
        self.current.as_ref()
    }

    pub fn layers(&self) -> &[Layer<C>] {
        &self.layers
    }

    pub fn modal_depth(&self) -> usize {
        self.layers.len()
    }

    pub fn screen(&self, id: &ScreenId) -> Option<&V> {
        self.screens.get(id).map(|e| e.content.as_ref())
    }

    pub fn is_full_screen(&self, id: &ScreenId) -> bool {
        self.screens.get(id).is_some_and(|e| e.full_screen)
    }

    pub fn top_dialog(&self) -> Option<&Dialog<C>> {
        match self.layers.last() {
            Some(Layer::Dialog(d)) => Some(d),
            _ => None,
        }
    }

    pub fn focus(&self) -> Focus<'_, C> {
        match self.layers.last() {
            Some(Layer::Dialog(d)) => Focus::Dialog(d),
            Some(Layer::Screen(id)) => Focus::Screen(id),
            None => self.current.as_ref().map_or(Focus::None, Focus::Screen),
        }
    }

    /// Hides the current screen (closing any layers) and shows `id`.
    pub fn navigate_to(
        &mut self,
        services: &C,
        id: ScreenId,
        params: Option<NavParams>,
    ) -> Result<()> {
        self.run(services, vec![NavCommand::NavigateTo { id, params }])
    }

    pub fn confirm<F>(&mut self, id: ScreenId, message: impl Into<String>, on_accept: F)
    where
        F: FnOnce(&mut ScreenCx<'_, C>) + 'static,
    {
        self.push_dialog(Dialog::confirm(id, message.into(), Box::new(on_accept)));
    }

    pub fn alert(&mut self, id: ScreenId, message: impl Into<String>) {
        self.push_dialog(Dialog::alert(id, message.into(), None));
    }

    /// Alert whose dismissal runs `on_dismiss`, which may itself navigate.
    pub fn alert_with_done<F>(&mut self, id: ScreenId, message: impl Into<String>, on_dismiss: F)
    where
        F: FnOnce(&mut ScreenCx<'_, C>) + 'static,
    {
        self.push_dialog(Dialog::alert(
            id,
            message.into(),
            Some(Box::new(on_dismiss)),
        ));
    }

    pub fn alert_fatal(&mut self, id: ScreenId, message: impl Into<String>) {
        self.push_dialog(Dialog::fatal(id, message.into()));
    }

    fn push_dialog(&mut self, dialog: Dialog<C>) {
        debug!(id = %dialog.id, message = %dialog.message, "push dialog");
        self.layers.push(Layer::Dialog(dialog));
    }

    /// Resolves the top dialog with `choice`, firing exactly one callback.
    ///
    /// Returns false when the top layer is not a dialog.
    pub fn resolve_dialog(&mut self, services: &C, choice: DialogChoice) -> Result<bool> {
        if !matches!(self.layers.last(), Some(Layer::Dialog(_))) {
            return Ok(false);
        }
        let Some(Layer::Dialog(dialog)) = self.layers.pop() else {
            return Ok(false);
        };
        debug!(id = %dialog.id, ?choice, "resolve dialog");
        let mut produced = Vec::new();
        if let Some(callback) = dialog.into_callback(choice) {
            callback(&mut ScreenCx::new(services, &mut produced));
        }
        self.run(services, produced)?;
        Ok(true)
    }

    /// Removes the top layer. Dialogs are declined; modal screens are hidden.
    pub fn dismiss_top(&mut self, services: &C) -> Result<bool> {
        match self.layers.last() {
            None => Ok(false),
            Some(Layer::Dialog(_)) => self.resolve_dialog(services, DialogChoice::Decline),
            Some(Layer::Screen(_)) => {
                let Some(Layer::Screen(id)) = self.layers.pop() else {
                    return Ok(false);
                };
                debug!(%id, "dismiss modal screen");
                let mut produced = Vec::new();
                self.call(services, &id, &mut produced, |s, cx| s.on_hide(cx));
                self.run(services, produced)?;
                Ok(true)
            }
        }
    }

    /// Runs `f` against the focused screen and applies the requests it makes.
    ///
    /// Returns `Ok(None)` when a dialog has focus or nothing is shown.
    pub fn with_focused<R>(
        &mut self,
        services: &C,
        f: impl FnOnce(&mut V, &mut ScreenCx<'_, C>) -> R,
    ) -> Result<Option<R>> {
        let id = match self.focus() {
            Focus::Screen(id) => id.clone(),
            Focus::Dialog(_) | Focus::None => return Ok(None),
        };
        let mut produced = Vec::new();
        let result = self.screens.get_mut(&id).map(|entry| {
            let mut cx = ScreenCx::new(services, &mut produced);
            f(entry.content.as_mut(), &mut cx)
        });
        self.run(services, produced)?;
        Ok(result)
    }

    /// Typed access to one screen's state.
    pub fn with_screen<T: Any, R>(
        &mut self,
        id: &ScreenId,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let entry = self.screens.get_mut(id)?;
        entry.content.as_any_mut().downcast_mut::<T>().map(f)
    }

    /// Typed access to one screen with the ability to request navigation.
    pub fn with_screen_cx<T: Any, R>(
        &mut self,
        services: &C,
        id: &ScreenId,
        f: impl FnOnce(&mut T, &mut ScreenCx<'_, C>) -> R,
    ) -> Result<Option<R>> {
        let mut produced = Vec::new();
        let result = self.screens.get_mut(id).and_then(|entry| {
            let screen = entry.content.as_any_mut().downcast_mut::<T>()?;
            let mut cx = ScreenCx::new(services, &mut produced);
            Some(f(screen, &mut cx))
        });
        self.run(services, produced)?;
        Ok(result)
    }

    fn run(&mut self, services: &C, initial: Vec<NavCommand<C>>) -> Result<()> {
        let mut queue: VecDeque<_> = initial.into();
        while let Some(command) = queue.pop_front() {
            let mut produced = Vec::new();
            match command {
                NavCommand::NavigateTo { id, params } => {
                    self.transition(services, id, params, &mut produced)?;
                }
                NavCommand::Push(dialog) => self.push_dialog(dialog),
                NavCommand::SessionExpired => {
                    self.session.end();
                    let login = self.login.clone();
                    self.transition(services, login, None, &mut produced)?;
                }
            }
            queue.extend(produced);
        }
        Ok(())
    }

    fn transition(
        &mut self,
        services: &C,
        id: ScreenId,
        params: Option<NavParams>,
        out: &mut Vec<NavCommand<C>>,
    ) -> Result<()> {
        let modal = self
            .screens
            .get(&id)
            .map(|e| e.modal)
            .ok_or_else(|| Error::UnknownScreen(id.clone()))?;

        let layered = self
            .layers
            .iter()
            .any(|l| matches!(l, Layer::Screen(s) if *s == id));
        let is_current = self.current.as_ref() == Some(&id) && self.layers.is_empty();
        if (modal && layered) || (!modal && is_current) {
            debug!(%id, "refresh current screen");
            self.call(services, &id, out, |s, cx| s.on_refresh(cx, params));
            return Ok(());
        }

        if modal {
            if self.current.is_none() {
                return Err(Error::ModalWithoutScreen(id));
            }
            debug!(%id, "show modal screen");
            self.call(services, &id, out, |s, cx| s.on_show(cx, params));
            self.layers.push(Layer::Screen(id));
            return Ok(());
        }

        self.close_layers(services);

        if let Some(previous) = self.current.take() {
            if previous == id {
                self.current = Some(previous);
                self.call(services, &id, out, |s, cx| s.on_refresh(cx, params));
                return Ok(());
            }
            debug!(%previous, "hide screen");
            self.call(services, &previous, out, |s, cx| s.on_hide(cx));
        }

        debug!(%id, "show screen");
        self.current = Some(id.clone());
        self.call(services, &id, out, |s, cx| s.on_show(cx, params));
        Ok(())
    }

    /// Pops every layer. Dialogs are declined, modal screens hidden; any
    /// navigation they request is superseded by the running transition.
    fn close_layers(&mut self, services: &C) {
        while let Some(layer) = self.layers.pop() {
            let mut discarded = Vec::new();
            match layer {
                Layer::Dialog(dialog) => {
                    debug!(id = %dialog.id, "closing dialog for navigation");
                    if let Some(callback) = dialog.into_callback(DialogChoice::Decline) {
                        callback(&mut ScreenCx::new(services, &mut discarded));
                    }
                }
                Layer::Screen(id) => {
                    debug!(%id, "hide modal screen for navigation");
                    self.call(services, &id, &mut discarded, |s, cx| s.on_hide(cx));
                }
            }
            if !discarded.is_empty() {
                debug!(
                    count = discarded.len(),
                    "discarding requests made while closing layers"
                );
            }
        }
    }

    fn call(
        &mut self,
        services: &C,
        id: &ScreenId,
        out: &mut Vec<NavCommand<C>>,
        f: impl FnOnce(&mut V, &mut ScreenCx<'_, C>),
    ) {
        if let Some(entry) = self.screens.get_mut(id) {
            f(entry.content.as_mut(), &mut ScreenCx::new(services, out));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use parking_lot::Mutex;

    use super::*;
    use crate::session::{Session, SessionStore};

    type Log = Arc<Mutex<Vec<String>>>;

    const HOME: ScreenId = ScreenId::from_static("home");
    const ROOMS: ScreenId = ScreenId::from_static("rooms");
    const LOGIN: ScreenId = ScreenId::from_static("login");
    const HELP: ScreenId = ScreenId::from_static("help");
    const DLG: ScreenId = ScreenId::from_static("dlg");

    struct Probe {
        name: &'static str,
        log: Log,
        redirect: Option<ScreenId>,
        last_params: Option<u32>,
    }

    impl Probe {
        fn boxed(name: &'static str, log: &Log) -> Box<dyn Screen<()>> {
            Box::new(Self {
                name,
                log: Arc::clone(log),
                redirect: None,
                last_params: None,
            })
        }
    }

    impl Screen<()> for Probe {
        fn on_show(&mut self, cx: &mut ScreenCx<'_, ()>, params: Option<NavParams>) {
            self.last_params = params.and_then(NavParams::into_inner::<u32>);
            self.log.lock().push(format!("show:{}", self.name));
            if let Some(target) = self.redirect.clone() {
                cx.navigate_to(target, None);
            }
        }

        fn on_hide(&mut self, _cx: &mut ScreenCx<'_, ()>) {
            self.log.lock().push(format!("hide:{}", self.name));
        }

        fn on_refresh(&mut self, _cx: &mut ScreenCx<'_, ()>, _params: Option<NavParams>) {
            self.log.lock().push(format!("refresh:{}", self.name));
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn session_scope() -> SessionScope {
        let scope = SessionScope::new(SessionStore::default());
        scope.begin(Session {
            access_token: "t".into(),
            user_id: "u".into(),
            username: "bro".into(),
            expires_at: Utc::now() + Duration::minutes(5),
        });
        scope
    }

    fn navigator(log: &Log) -> Navigator<()> {
        let mut nav = Navigator::new(LOGIN, session_scope());
        for (id, name) in [(HOME, "home"), (ROOMS, "rooms"), (LOGIN, "login")] {
            nav.register(id, Probe::boxed(name, log), true, false).unwrap();
        }
        nav.register(HELP, Probe::boxed("help", log), false, true)
            .unwrap();
        nav
    }

    fn entries(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.lock())
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let log = Log::default();
        let mut nav = navigator(&log);
        let err = nav
            .register(HOME, Probe::boxed("again", &log), true, false)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateScreen(id) if id == HOME));
    }

    #[test]
    fn test_navigate_to_unregistered_fails() {
        let log = Log::default();
        let mut nav = navigator(&log);
        let err = nav
            .navigate_to(&(), ScreenId::new("missing"), None)
            .unwrap_err();
        assert!(err.is_misconfiguration());
        assert!(nav.current().is_none());
    }

    #[test]
    fn test_modal_without_current_screen_fails() {
        let log = Log::default();
        let mut nav = navigator(&log);
        let err = nav.navigate_to(&(), HELP, None).unwrap_err();
        assert!(matches!(err, Error::ModalWithoutScreen(ref id) if *id == HELP));
        assert!(err.is_misconfiguration());
        assert!(nav.current().is_none());
        assert_eq!(nav.modal_depth(), 0);
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn test_navigator_alert_with_done_runs_callback_on_dismiss() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), ROOMS, None).unwrap();
        entries(&log);

        nav.alert_with_done(DLG, "Joined.", |cx| cx.navigate_to(HOME, None));
        assert_eq!(nav.modal_depth(), 1);
        assert!(entries(&log).is_empty());

        assert!(nav.resolve_dialog(&(), DialogChoice::Accept).unwrap());
        assert_eq!(entries(&log), vec!["hide:rooms", "show:home"]);
        assert_eq!(nav.current(), Some(&HOME));
        assert_eq!(nav.modal_depth(), 0);
    }

    #[test]
    fn test_first_navigation_shows_once() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), ROOMS, None).unwrap();
        assert_eq!(entries(&log), vec!["show:rooms"]);
        assert_eq!(nav.current(), Some(&ROOMS));
        let params = nav.with_screen::<Probe, _>(&ROOMS, |p| p.last_params);
        assert_eq!(params, Some(None));
    }

    #[test]
    fn test_params_reach_on_show() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, Some(NavParams::new(42_u32)))
            .unwrap();
        let params = nav.with_screen::<Probe, _>(&HOME, |p| p.last_params);
        assert_eq!(params, Some(Some(42)));
    }

    #[test]
    fn test_hide_runs_before_show() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        nav.navigate_to(&(), ROOMS, None).unwrap();
        nav.navigate_to(&(), HOME, None).unwrap();
        assert_eq!(
            entries(&log),
            vec![
                "show:home",
                "hide:home",
                "show:rooms",
                "hide:rooms",
                "show:home"
            ]
        );
    }

    #[test]
    fn test_navigate_to_current_refreshes() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        nav.navigate_to(&(), HOME, None).unwrap();
        assert_eq!(entries(&log), vec!["show:home", "refresh:home"]);
    }

    #[test]
    fn test_redirect_from_on_show_runs_after_show_completes() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.with_screen::<Probe, _>(&HOME, |p| p.redirect = Some(LOGIN));
        nav.navigate_to(&(), HOME, None).unwrap();
        assert_eq!(
            entries(&log),
            vec!["show:home", "hide:home", "show:login"]
        );
        assert_eq!(nav.current(), Some(&LOGIN));
    }

    #[test]
    fn test_confirm_suspends_without_hiding() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        entries(&log);

        let accepted = Log::default();
        let sink = Arc::clone(&accepted);
        nav.confirm(DLG, "Proceed?", move |_cx| sink.lock().push("accept".into()));

        assert_eq!(nav.modal_depth(), 1);
        assert!(matches!(nav.focus(), Focus::Dialog(d) if d.message == "Proceed?"));
        assert!(nav.resolve_dialog(&(), DialogChoice::Accept).unwrap());

        assert_eq!(entries(&accepted), vec!["accept"]);
        assert!(entries(&log).is_empty());
        assert_eq!(nav.current(), Some(&HOME));
        assert_eq!(nav.modal_depth(), 0);
        assert!(matches!(nav.focus(), Focus::Screen(id) if *id == HOME));
    }

    #[test]
    fn test_decline_fires_only_decline() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        let fired = Log::default();
        let a = Arc::clone(&fired);
        let d = Arc::clone(&fired);
        nav.with_focused(&(), |_, cx| {
            cx.confirm_or(
                DLG,
                "Proceed?",
                move |_| a.lock().push("accept".into()),
                move |_| d.lock().push("decline".into()),
            );
        })
        .unwrap();
        assert!(nav.resolve_dialog(&(), DialogChoice::Decline).unwrap());
        assert!(!nav.resolve_dialog(&(), DialogChoice::Decline).unwrap());
        assert_eq!(entries(&fired), vec!["decline"]);
    }

    #[test]
    fn test_alert_done_callback_can_navigate() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        nav.with_focused(&(), |_, cx| {
            cx.alert_with_done(DLG, "Joined", |cx| cx.navigate_to(ROOMS, None));
        })
        .unwrap();
        assert_eq!(nav.current(), Some(&HOME));
        nav.resolve_dialog(&(), DialogChoice::Accept).unwrap();
        assert_eq!(nav.current(), Some(&ROOMS));
        assert_eq!(entries(&log), vec!["show:home", "hide:home", "show:rooms"]);
    }

    #[test]
    fn test_fatal_alert_dismisses_without_callback() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        nav.alert_fatal(DLG, "boom");
        assert!(nav.top_dialog().is_some_and(Dialog::is_fatal));
        assert!(nav.dismiss_top(&()).unwrap());
        assert_eq!(nav.current(), Some(&HOME));
        assert_eq!(nav.modal_depth(), 0);
    }

    #[test]
    fn test_modal_screen_layers_over_current() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        nav.navigate_to(&(), HELP, None).unwrap();
        assert_eq!(nav.current(), Some(&HOME));
        assert!(matches!(nav.focus(), Focus::Screen(id) if *id == HELP));

        assert!(nav.dismiss_top(&()).unwrap());
        assert!(!nav.dismiss_top(&()).unwrap());
        assert_eq!(entries(&log), vec!["show:home", "show:help", "hide:help"]);
        assert!(matches!(nav.focus(), Focus::Screen(id) if *id == HOME));
    }

    #[test]
    fn test_navigation_closes_open_layers_once() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        nav.navigate_to(&(), HELP, None).unwrap();
        let fired = Log::default();
        let sink = Arc::clone(&fired);
        nav.with_focused(&(), |_, cx| {
            cx.alert_with_done(DLG, "note", move |cx| {
                sink.lock().push("dismiss".into());
                cx.navigate_to(LOGIN, None);
            });
        })
        .unwrap();

        nav.navigate_to(&(), ROOMS, None).unwrap();

        assert_eq!(entries(&fired), vec!["dismiss"]);
        assert_eq!(nav.current(), Some(&ROOMS));
        assert_eq!(nav.modal_depth(), 0);
        assert_eq!(
            entries(&log),
            vec![
                "show:home",
                "show:help",
                "hide:help",
                "hide:home",
                "show:rooms"
            ]
        );
    }

    #[test]
    fn test_session_expired_ends_session_and_redirects() {
        let log = Log::default();
        let mut nav = navigator(&log);
        let session = nav.session.clone();
        let scope = session.derive_scope();
        nav.navigate_to(&(), HOME, None).unwrap();
        nav.with_focused(&(), |_, cx| cx.report(DLG, Failure::SessionInvalid))
            .unwrap();
        assert!(scope.is_cancelled());
        assert!(!session.is_valid());
        assert_eq!(nav.current(), Some(&LOGIN));
        assert_eq!(nav.modal_depth(), 0);
    }

    #[test]
    fn test_report_rejected_and_unclassified() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        nav.with_focused(&(), |_, cx| {
            cx.report(DLG, Failure::Rejected("already friends".into()));
        })
        .unwrap();
        let top = nav.top_dialog().unwrap();
        assert!(!top.is_fatal());
        assert_eq!(top.message, "already friends");

        nav.dismiss_top(&()).unwrap();
        nav.with_focused(&(), |_, cx| {
            cx.report(DLG, Failure::Unclassified("io".into()));
        })
        .unwrap();
        assert!(nav.top_dialog().unwrap().is_fatal());
        assert_eq!(nav.current(), Some(&HOME));
    }

    #[test]
    fn test_focused_input_blocked_by_dialog() {
        let log = Log::default();
        let mut nav = navigator(&log);
        nav.navigate_to(&(), HOME, None).unwrap();
        nav.alert(DLG, "hi");
        assert_eq!(nav.with_focused(&(), |_, _| 1).unwrap(), None);
        nav.dismiss_top(&()).unwrap();
        assert_eq!(nav.with_focused(&(), |_, _| 1).unwrap(), Some(1));
    }
}
