//! Routes key presses to the top layer.

use anyhow::{Context, Result};
use broterm_core::nav::{DialogChoice, Focus};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

use crate::overlays::dialog;
use crate::pages::PageAction;
use crate::state::AppState;

enum Route {
    Dialog(Option<DialogChoice>),
    Page,
    Nothing,
}

pub fn handle_key(state: &mut AppState, key: KeyEvent) -> Result<()> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return Ok(());
    }

    let AppState {
        nav,
        services,
        should_quit,
    } = state;

    let route = match nav.focus() {
        Focus::Dialog(d) => Route::Dialog(dialog::choice_for(d, key)),
        Focus::Screen(_) => Route::Page,
        Focus::None => Route::Nothing,
    };

    match route {
        Route::Dialog(Some(choice)) => {
            nav.resolve_dialog(services, choice)
                .context("Failed to resolve dialog")?;
        }
        Route::Dialog(None) | Route::Nothing => trace!(?key, "key ignored"),
        Route::Page => {
            let action = nav
                .with_focused(services, |page, cx| page.handle_key(cx, key))
                .context("Failed to handle key")?;
            match action {
                Some(PageAction::Quit) => *should_quit = true,
                Some(PageAction::Dismiss) => {
                    nav.dismiss_top(services)
                        .context("Failed to close layer")?;
                }
                Some(PageAction::None) | None => {}
            }
        }
    }
    Ok(())
}
