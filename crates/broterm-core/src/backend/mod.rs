//! Backend contract consumed by pages.
//!
//! Operations return an [`ApiResult`] carrying a response code and optional
//! human-readable error details. Pages never inspect payload semantics for
//! error handling; they turn a failed result into a [`Failure`] and hand it to
//! [`ScreenCx::report`](crate::nav::ScreenCx::report).

mod memory;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::{FeedSimulator, InMemoryBackend};

use crate::session::Session;

/// Shown when the backend refuses an operation without further detail.
pub const FORBIDDEN_MESSAGE: &str = "You are not allowed to perform this operation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    Success,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    ServerError,
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseCode::Success => "success",
            ResponseCode::BadRequest => "bad request",
            ResponseCode::Unauthorized => "unauthorized",
            ResponseCode::Forbidden => "forbidden",
            ResponseCode::NotFound => "not found",
            ResponseCode::Conflict => "conflict",
            ResponseCode::ServerError => "server error",
        };
        f.write_str(s)
    }
}

/// Outcome of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResult<T> {
    pub content: Option<T>,
    pub code: ResponseCode,
    pub error_details: Vec<String>,
}

impl<T> ApiResult<T> {
    pub fn ok(content: T) -> Self {
        Self {
            content: Some(content),
            code: ResponseCode::Success,
            error_details: Vec::new(),
        }
    }

    pub fn failed(code: ResponseCode, error_details: Vec<String>) -> Self {
        Self {
            content: None,
            code,
            error_details,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == ResponseCode::Success
    }

    /// Splits into content or a classified failure.
    pub fn into_result(self) -> Result<T, Failure> {
        match self.content {
            Some(content) if self.is_success() => Ok(content),
            _ => Err(Failure::classify(self.code, &self.error_details)),
        }
    }
}

/// How a failed backend call must be surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Credential missing or expired: end the session and go to login.
    SessionInvalid,
    /// Expected refusal: dismissible alert, the screen stays live.
    Rejected(String),
    /// Anything else: fatal alert, no automated recovery.
    Unclassified(String),
}

impl Failure {
    /// `Unauthorized` always means the session is gone. Otherwise the first
    /// error detail wins over the response code, and an unexplained
    /// `Forbidden` gets a generic message.
    pub fn classify(code: ResponseCode, error_details: &[String]) -> Self {
        if code == ResponseCode::Unauthorized {
            return Failure::SessionInvalid;
        }
        if let Some(detail) = error_details.first() {
            return Failure::Rejected(detail.clone());
        }
        match code {
            ResponseCode::Forbidden => Failure::Rejected(FORBIDDEN_MESSAGE.to_string()),
            code => Failure::Unclassified(format!("request failed: {code}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipKind {
    Friend,
    RequestReceived,
    RequestSent,
}

/// Another user as seen from the signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub user_id: String,
    pub username: String,
    pub kind: RelationshipKind,
    pub is_online: bool,
    pub last_online: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub relationships: Vec<Relationship>,
}

impl User {
    pub fn friends(&self) -> impl Iterator<Item = &Relationship> {
        self.with_kind(RelationshipKind::Friend)
    }

    pub fn pending_requests(&self) -> impl Iterator<Item = &Relationship> {
        self.with_kind(RelationshipKind::RequestReceived)
    }

    fn with_kind(&self, kind: RelationshipKind) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(move |r| r.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub members: usize,
}

/// Chat and identity operations the pages depend on.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Issues a session for `username`.
    async fn sign_in(&self, username: &str) -> ApiResult<Session>;

    /// Fetches the signed-in user with its relationships.
    async fn get_user(&self, access_token: &str) -> ApiResult<User>;

    /// Lists public rooms the user has not joined.
    async fn get_rooms(&self, access_token: &str) -> ApiResult<Vec<Room>>;

    async fn join_room(&self, access_token: &str, room_id: &str) -> ApiResult<()>;

    async fn accept_friend_request(&self, access_token: &str, user_id: &str) -> ApiResult<()>;

    async fn logout(&self, access_token: &str) -> ApiResult<()>;
}
