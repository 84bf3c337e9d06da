//! Navigation and live-update core for the broterm terminal client.
//!
//! The pieces, leaves first:
//! - [`session`]: session-bound cancellation scopes for screen activations
//! - [`feed`]: process-wide publish/subscribe hub for server-pushed events
//! - [`dispatch`]: single-threaded mutation queue drained by the UI loop
//! - [`nav`]: screen registry, show/hide transitions and modal dialogs
//! - [`listener`]: the background listener loop every live screen runs
//!
//! Everything else ([`backend`], [`theme`], [`config`], [`logging`]) is the
//! collaborator surface the core plugs into.

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod listener;
pub mod logging;
pub mod nav;
pub mod rows;
pub mod session;
pub mod theme;

pub use dispatch::{DispatchQueue, Dispatcher, Mutation};
pub use error::{Error, Result};
pub use feed::{FeedHub, Subscription, SubscriptionId};
pub use listener::{Activation, Listener, ListenerStep};
pub use nav::{NavParams, Navigator, Screen, ScreenCx, ScreenId};
pub use rows::RowIndex;
pub use session::{ScopeToken, Session, SessionScope, SessionStore};
pub use theme::{Theme, ThemeProvider};
