//! Modal confirmation and alert dialogs.

use std::fmt;

use super::{ScreenCx, ScreenId};

/// Callback fired when a dialog resolves. Runs on the UI thread.
pub type DialogCallback<C> = Box<dyn FnOnce(&mut ScreenCx<'_, C>)>;

/// User response to the top dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogChoice {
    Accept,
    Decline,
}

pub enum DialogKind<C> {
    Confirm {
        on_accept: DialogCallback<C>,
        on_decline: Option<DialogCallback<C>>,
    },
    Alert {
        on_dismiss: Option<DialogCallback<C>>,
    },
    /// Rendered only; dismissal performs no recovery.
    Fatal,
}

/// A dialog layered over the current screen.
pub struct Dialog<C> {
    pub id: ScreenId,
    pub message: String,
    pub kind: DialogKind<C>,
}

impl<C> Dialog<C> {
    pub fn confirm(id: ScreenId, message: String, on_accept: DialogCallback<C>) -> Self {
        Self {
            id,
            message,
            kind: DialogKind::Confirm {
                on_accept,
                on_decline: None,
            },
        }
    }

    pub fn alert(id: ScreenId, message: String, on_dismiss: Option<DialogCallback<C>>) -> Self {
        Self {
            id,
            message,
            kind: DialogKind::Alert { on_dismiss },
        }
    }

    pub fn fatal(id: ScreenId, message: String) -> Self {
        Self {
            id,
            message,
            kind: DialogKind::Fatal,
        }
    }

    pub fn is_confirm(&self) -> bool {
        matches!(self.kind, DialogKind::Confirm { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, DialogKind::Fatal)
    }

    /// Consumes the dialog and returns the single callback `choice` selects.
    pub(crate) fn into_callback(self, choice: DialogChoice) -> Option<DialogCallback<C>> {
        match (self.kind, choice) {
            (DialogKind::Confirm { on_accept, .. }, DialogChoice::Accept) => Some(on_accept),
            (DialogKind::Confirm { on_decline, .. }, DialogChoice::Decline) => on_decline,
            (DialogKind::Alert { on_dismiss }, _) => on_dismiss,
            (DialogKind::Fatal, _) => None,
        }
    }
}

impl<C> fmt::Debug for Dialog<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DialogKind::Confirm { .. } => "confirm",
            DialogKind::Alert { .. } => "alert",
            DialogKind::Fatal => "fatal",
        };
        f.debug_struct("Dialog")
            .field("id", &self.id)
            .field("kind", &kind)
            .field("message", &self.message)
            .finish()
    }
}
