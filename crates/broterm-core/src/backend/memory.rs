//! In-process demo backend and push-feed simulator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{ApiResult, ChatBackend, Relationship, RelationshipKind, ResponseCode, Room, User};
use crate::feed::{FeedHub, PROFILE_UPDATES, profile};
use crate::session::{ScopeToken, Session};

struct DemoState {
    user: User,
    rooms: Vec<Room>,
    restricted: HashSet<String>,
    joined: HashSet<String>,
    tokens: HashMap<String, DateTime<Utc>>,
    next_token: u64,
    presence_cursor: usize,
}

/// Seeded backend that mutates its own state and publishes profile updates
/// on the feed hub the way the real push connection would.
pub struct InMemoryBackend {
    state: Mutex<DemoState>,
    feed: FeedHub<String>,
    session_lifetime: chrono::Duration,
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("session_lifetime", &self.session_lifetime)
            .finish_non_exhaustive()
    }
}

impl InMemoryBackend {
    pub fn new(feed: FeedHub<String>, session_lifetime: chrono::Duration) -> Self {
        let now = Utc::now();
        let rel = |name: &str, kind, is_online, days_ago| Relationship {
            user_id: format!("user-{name}"),
            username: name.to_string(),
            kind,
            is_online,
            last_online: now - chrono::Duration::days(days_ago),
        };
        let room = |id: &str, name: &str, owner: &str, members| Room {
            id: id.to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
            members,
        };

        let user = User {
            id: "user-me".into(),
            username: "bro".into(),
            relationships: vec![
                rel("chad", RelationshipKind::Friend, true, 0),
                rel("brad", RelationshipKind::Friend, false, 3),
                rel("thad", RelationshipKind::Friend, false, 12),
                rel("vlad", RelationshipKind::RequestReceived, false, 1),
                rel("tad", RelationshipKind::RequestReceived, true, 0),
                rel("gus", RelationshipKind::RequestSent, false, 40),
            ],
        };

        Self {
            state: Mutex::new(DemoState {
                user,
                rooms: vec![
                    room("room-lift", "Leg Day", "chad", 14),
                    room("room-grill", "Grill Masters", "brad", 8),
                    room("room-crypto", "Diamond Hands", "thad", 31),
                    room("room-vip", "VIP Lounge", "vlad", 3),
                ],
                restricted: HashSet::from(["room-vip".to_string()]),
                joined: HashSet::new(),
                tokens: HashMap::new(),
                next_token: 1,
                presence_cursor: 0,
            }),
            feed,
            session_lifetime,
        }
    }

    /// Invalidates every issued credential.
    pub fn revoke_all(&self) {
        self.state.lock().tokens.clear();
        info!("demo backend revoked all sessions");
    }

    /// Flips the presence of the next friend and publishes the change.
    pub fn toggle_presence(&self) -> Option<String> {
        let username = {
            let mut state = self.state.lock();
            let friends: Vec<usize> = state
                .user
                .relationships
                .iter()
                .enumerate()
                .filter(|(_, r)| r.kind == RelationshipKind::Friend)
                .map(|(i, _)| i)
                .collect();
            if friends.is_empty() {
                return None;
            }
            let idx = friends[state.presence_cursor % friends.len()];
            state.presence_cursor = state.presence_cursor.wrapping_add(1);
            let rel = &mut state.user.relationships[idx];
            rel.is_online = !rel.is_online;
            if !rel.is_online {
                rel.last_online = Utc::now();
            }
            debug!(user = %rel.username, online = rel.is_online, "presence changed");
            rel.username.clone()
        };
        self.feed
            .publish(PROFILE_UPDATES, profile::PRESENCE_CHANGED.to_string());
        Some(username)
    }

    fn authorize(&self, access_token: &str) -> bool {
        self.state
            .lock()
            .tokens
            .get(access_token)
            .is_some_and(|expires_at| *expires_at > Utc::now())
    }
}

fn unauthorized<T>() -> ApiResult<T> {
    ApiResult::failed(ResponseCode::Unauthorized, Vec::new())
}

#[async_trait]
impl ChatBackend for InMemoryBackend {
    async fn sign_in(&self, username: &str) -> ApiResult<Session> {
        let username = username.trim();
        if username.is_empty() {
            return ApiResult::failed(
                ResponseCode::BadRequest,
                vec!["A username is required.".into()],
            );
        }
        let mut state = self.state.lock();
        let access_token = format!("demo-{}", state.next_token);
        state.next_token += 1;
        let expires_at = Utc::now() + self.session_lifetime;
        state.tokens.insert(access_token.clone(), expires_at);
        state.user.username = username.to_string();
        ApiResult::ok(Session {
            access_token,
            user_id: state.user.id.clone(),
            username: username.to_string(),
            expires_at,
        })
    }

    async fn get_user(&self, access_token: &str) -> ApiResult<User> {
        if !self.authorize(access_token) {
            return unauthorized();
        }
        ApiResult::ok(self.state.lock().user.clone())
    }

    async fn get_rooms(&self, access_token: &str) -> ApiResult<Vec<Room>> {
        if !self.authorize(access_token) {
            return unauthorized();
        }
        let state = self.state.lock();
        let rooms = state
            .rooms
            .iter()
            .filter(|r| !state.joined.contains(&r.id))
            .cloned()
            .collect();
        ApiResult::ok(rooms)
    }

    async fn join_room(&self, access_token: &str, room_id: &str) -> ApiResult<()> {
        if !self.authorize(access_token) {
            return unauthorized();
        }
        let mut state = self.state.lock();
        let Some(room) = state.rooms.iter().find(|r| r.id == room_id) else {
            return ApiResult::failed(ResponseCode::NotFound, vec!["Room not found.".into()]);
        };
        let name = room.name.clone();
        if state.restricted.contains(room_id) {
            return ApiResult::failed(ResponseCode::Forbidden, Vec::new());
        }
        if !state.joined.insert(room_id.to_string()) {
            return ApiResult::failed(
                ResponseCode::Conflict,
                vec![format!("You are already a member of '{name}'.")],
            );
        }
        if let Some(room) = state.rooms.iter_mut().find(|r| r.id == room_id) {
            room.members += 1;
        }
        debug!(room = %name, "joined room");
        ApiResult::ok(())
    }

    async fn accept_friend_request(&self, access_token: &str, user_id: &str) -> ApiResult<()> {
        if !self.authorize(access_token) {
            return unauthorized();
        }
        {
            let mut state = self.state.lock();
            let Some(rel) = state
                .user
                .relationships
                .iter_mut()
                .find(|r| r.user_id == user_id && r.kind == RelationshipKind::RequestReceived)
            else {
                return ApiResult::failed(
                    ResponseCode::NotFound,
                    vec!["There is no pending request from that user.".into()],
                );
            };
            rel.kind = RelationshipKind::Friend;
            debug!(user = %rel.username, "accepted friend request");
        }
        self.feed
            .publish(PROFILE_UPDATES, profile::RELATIONSHIP_CHANGED.to_string());
        ApiResult::ok(())
    }

    async fn logout(&self, access_token: &str) -> ApiResult<()> {
        self.state.lock().tokens.remove(access_token);
        ApiResult::ok(())
    }
}

/// Stand-in for the server push connection: toggles a friend's presence on a
/// fixed cadence until its scope is cancelled.
#[derive(Debug)]
pub struct FeedSimulator {
    backend: Arc<InMemoryBackend>,
    interval: Duration,
}

impl FeedSimulator {
    pub fn new(backend: Arc<InMemoryBackend>, interval: Duration) -> Self {
        Self {
            backend,
            interval: interval.max(Duration::from_millis(10)),
        }
    }

    pub fn spawn(self, scope: ScopeToken) -> JoinHandle<()> {
        tokio::spawn(self.run(scope))
    }

    async fn run(self, scope: ScopeToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        debug!(interval = ?self.interval, "feed simulator started");
        loop {
            tokio::select! {
                biased;
                () = scope.cancelled() => break,
                _ = ticker.tick() => {
                    self.backend.toggle_presence();
                }
            }
        }
        debug!("feed simulator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (FeedHub<String>, InMemoryBackend) {
        let feed = FeedHub::new(8);
        let backend = InMemoryBackend::new(feed.clone(), chrono::Duration::minutes(10));
        (feed, backend)
    }

    async fn token(backend: &InMemoryBackend) -> String {
        backend.sign_in("bro").await.content.unwrap().access_token
    }

    #[tokio::test]
    async fn test_sign_in_requires_username() {
        let (_, backend) = backend();
        let result = backend.sign_in("  ").await;
        assert_eq!(result.code, ResponseCode::BadRequest);
        assert_eq!(result.error_details.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let (_, backend) = backend();
        assert_eq!(backend.get_user("nope").await.code, ResponseCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_revoke_all_invalidates_tokens() {
        let (_, backend) = backend();
        let token = token(&backend).await;
        assert!(backend.get_user(&token).await.is_success());
        backend.revoke_all();
        assert_eq!(backend.get_user(&token).await.code, ResponseCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_accept_publishes_relationship_change() {
        let (feed, backend) = backend();
        let token = token(&backend).await;
        let mut sub = feed.subscribe(PROFILE_UPDATES);

        assert!(backend.accept_friend_request(&token, "user-vlad").await.is_success());

        assert_eq!(sub.try_recv().as_deref(), Some(profile::RELATIONSHIP_CHANGED));
        let user = backend.get_user(&token).await.content.unwrap();
        assert!(user.friends().any(|r| r.username == "vlad"));
        assert_eq!(user.pending_requests().count(), 1);

        let again = backend.accept_friend_request(&token, "user-vlad").await;
        assert_eq!(again.code, ResponseCode::NotFound);
        assert!(!again.error_details.is_empty());
    }

    #[tokio::test]
    async fn test_join_room_outcomes() {
        let (_, backend) = backend();
        let token = token(&backend).await;

        assert!(backend.join_room(&token, "room-lift").await.is_success());
        let again = backend.join_room(&token, "room-lift").await;
        assert_eq!(again.code, ResponseCode::Conflict);

        let vip = backend.join_room(&token, "room-vip").await;
        assert_eq!(vip.code, ResponseCode::Forbidden);
        assert!(vip.error_details.is_empty());

        let rooms = backend.get_rooms(&token).await.content.unwrap();
        assert!(rooms.iter().all(|r| r.id != "room-lift"));
    }

    #[tokio::test]
    async fn test_toggle_presence_publishes() {
        let (feed, backend) = backend();
        let mut sub = feed.subscribe(PROFILE_UPDATES);
        assert_eq!(backend.toggle_presence().as_deref(), Some("chad"));
        assert_eq!(sub.try_recv().as_deref(), Some(profile::PRESENCE_CHANGED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulator_ticks_until_cancelled() {
        let feed = FeedHub::new(16);
        let backend = Arc::new(InMemoryBackend::new(
            feed.clone(),
            chrono::Duration::minutes(10),
        ));
        let mut sub = feed.subscribe(PROFILE_UPDATES);
        let scope = ScopeToken::detached();
        let handle = FeedSimulator::new(backend, Duration::from_secs(5)).spawn(scope.clone());

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(sub.try_recv().as_deref(), Some(profile::PRESENCE_CHANGED));

        scope.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(sub.try_recv().is_none());
    }
}
