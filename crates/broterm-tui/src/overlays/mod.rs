//! Modal UI drawn above the current page.
//!
//! - `dialog.rs`: confirmation, alert and fatal dialogs from the navigator
//! - `render_utils.rs`: shared overlay layout and drawing helpers

pub mod dialog;
pub mod render_utils;
