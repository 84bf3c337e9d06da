//! End-to-end listener flows: navigation, feed, dispatch and session expiry.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use broterm_core::backend::{ChatBackend, InMemoryBackend};
use broterm_core::dispatch::{self, DispatchQueue, Dispatcher};
use broterm_core::feed::{PROFILE_UPDATES, profile};
use broterm_core::{
    Activation, FeedHub, ListenerStep, NavParams, Navigator, Screen, ScreenCx, ScreenId,
    SessionScope, SessionStore,
};

const LOGIN: ScreenId = ScreenId::from_static("login");
const FRIENDS: ScreenId = ScreenId::from_static("friends_list");
const ROOMS: ScreenId = ScreenId::from_static("room_finder");
const ALERT: ScreenId = ScreenId::from_static("friends:alert");

struct Services {
    session: SessionScope,
    feed: FeedHub<String>,
    backend: Arc<InMemoryBackend>,
    dispatcher: Dispatcher<App>,
}

struct App {
    nav: Navigator<Services>,
    services: Services,
}

#[derive(Default)]
struct Friends {
    activation: Option<Activation<String>>,
    repaints: Arc<AtomicUsize>,
    names: Vec<String>,
}

impl Screen<Services> for Friends {
    fn on_show(&mut self, cx: &mut ScreenCx<'_, Services>, _params: Option<NavParams>) {
        let services = cx.services();
        let mut activation = Activation::begin(&services.session, &services.feed);
        for topic in [PROFILE_UPDATES, "presence"] {
            let session = services.session.clone();
            let backend = Arc::clone(&services.backend);
            let dispatcher = services.dispatcher.clone();
            let repaints = Arc::clone(&self.repaints);
            activation.listen(topic, move |_code, scope| {
                let session = session.clone();
                let backend = Arc::clone(&backend);
                let dispatcher = dispatcher.clone();
                let repaints = Arc::clone(&repaints);
                async move {
                    let token = session.store().get().map(|s| s.access_token);
                    let result = match token {
                        Some(token) => backend.get_user(&token).await.into_result(),
                        None => Err(broterm_core::backend::Failure::SessionInvalid),
                    };
                    dispatcher.dispatch_scoped(&scope, move |app: &mut App| {
                        let App { nav, services } = app;
                        nav.with_screen_cx::<Friends, _>(services, &FRIENDS, |page, cx| {
                            match result {
                                Ok(user) => {
                                    repaints.fetch_add(1, Ordering::SeqCst);
                                    page.names =
                                        user.friends().map(|r| r.username.clone()).collect();
                                }
                                Err(failure) => cx.report(ALERT, failure),
                            }
                        })?;
                        Ok(())
                    });
                    ListenerStep::Continue
                }
            });
        }
        self.activation = Some(activation);
    }

    fn on_hide(&mut self, _cx: &mut ScreenCx<'_, Services>) {
        if let Some(mut activation) = self.activation.take() {
            activation.end();
        }
        self.names.clear();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Plain;

impl Screen<Services> for Plain {
    fn on_show(&mut self, _cx: &mut ScreenCx<'_, Services>, _params: Option<NavParams>) {}
    fn on_hide(&mut self, _cx: &mut ScreenCx<'_, Services>) {}
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

async fn app() -> (App, DispatchQueue<App>, Arc<AtomicUsize>) {
    let feed = FeedHub::new(8);
    let backend = Arc::new(InMemoryBackend::new(
        feed.clone(),
        chrono::Duration::minutes(5),
    ));
    let session = SessionScope::new(SessionStore::default());
    let issued = backend.sign_in("bro").await.into_result().unwrap();
    session.begin(issued);
    let (dispatcher, queue) = dispatch::channel();

    let friends = Friends::default();
    let repaints = Arc::clone(&friends.repaints);

    let mut nav: Navigator<Services> = Navigator::new(LOGIN, session.clone());
    nav.register(LOGIN, Box::new(Plain), true, false).unwrap();
    nav.register(ROOMS, Box::new(Plain), true, false).unwrap();
    nav.register(FRIENDS, Box::new(friends), true, false).unwrap();

    let app = App {
        nav,
        services: Services {
            session,
            feed,
            backend,
            dispatcher,
        },
    };
    (app, queue, repaints)
}

async fn settle(app: &mut App, queue: &mut DispatchQueue<App>) {
    tokio::time::sleep(Duration::from_millis(30)).await;
    queue.drain(app).unwrap();
}

fn navigate(app: &mut App, id: ScreenId) {
    let App { nav, services } = app;
    nav.navigate_to(services, id, None).unwrap();
}

#[tokio::test]
async fn test_relationship_change_repaints_visible_screen() {
    let (mut app, mut queue, repaints) = app().await;
    navigate(&mut app, FRIENDS);
    assert_eq!(app.services.feed.subscriber_count(PROFILE_UPDATES), 1);

    let token = app.services.session.access_token().unwrap();
    app.services
        .backend
        .accept_friend_request(&token, "user-vlad")
        .await;
    settle(&mut app, &mut queue).await;

    assert_eq!(repaints.load(Ordering::SeqCst), 1);
    let names = app
        .nav
        .with_screen::<Friends, _>(&FRIENDS, |p| p.names.clone())
        .unwrap();
    assert!(names.contains(&"vlad".to_string()));
}

#[tokio::test]
async fn test_hidden_screen_subscriptions_are_inert() {
    let (mut app, mut queue, repaints) = app().await;
    navigate(&mut app, FRIENDS);
    assert_eq!(app.services.feed.subscriber_count("presence"), 1);

    navigate(&mut app, ROOMS);

    assert_eq!(app.services.feed.subscriber_count(PROFILE_UPDATES), 0);
    assert_eq!(app.services.feed.subscriber_count("presence"), 0);
    app.services
        .feed
        .publish(PROFILE_UPDATES, profile::RELATIONSHIP_CHANGED.into());
    app.services.feed.publish("presence", "x".into());
    settle(&mut app, &mut queue).await;

    assert_eq!(repaints.load(Ordering::SeqCst), 0);
    assert_eq!(app.nav.current(), Some(&ROOMS));
}

#[tokio::test]
async fn test_expired_session_in_refetch_redirects_to_login() {
    let (mut app, mut queue, repaints) = app().await;
    navigate(&mut app, FRIENDS);
    let scope = app
        .nav
        .with_screen::<Friends, _>(&FRIENDS, |p| {
            p.activation.as_ref().map(|a| a.scope().clone())
        })
        .flatten()
        .unwrap();

    app.services.backend.revoke_all();
    app.services.backend.toggle_presence();
    settle(&mut app, &mut queue).await;

    assert_eq!(app.nav.current(), Some(&LOGIN));
    assert_eq!(app.nav.modal_depth(), 0);
    assert!(scope.is_cancelled());
    assert!(!app.services.session.is_valid());

    app.services
        .feed
        .publish(PROFILE_UPDATES, profile::PRESENCE_CHANGED.into());
    settle(&mut app, &mut queue).await;
    assert_eq!(repaints.load(Ordering::SeqCst), 0);
    assert!(queue.is_empty());
}
