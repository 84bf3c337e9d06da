//! TUI runtime: terminal ownership and the single-threaded event loop.
//!
//! Each iteration drains the dispatch queue, renders if anything changed,
//! then waits up to one tick for terminal input. Every state mutation,
//! whether from a key or from a background task, therefore runs on this
//! thread and in arrival order.

pub mod keys;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use broterm_core::backend::{ChatBackend, FeedSimulator, InMemoryBackend};
use broterm_core::config::Config;
use broterm_core::{DispatchQueue, FeedHub, ScopeToken};
use crossterm::event::{self, Event, KeyEventKind};
use tracing::{debug, info};

use crate::render;
use crate::state::AppState;
use crate::terminal::{self, Tty};

pub struct TuiRuntime {
    terminal: Tty,
    pub state: AppState,
    queue: DispatchQueue<AppState>,
    tick: Duration,
    /// Scope for work that outlives sessions (the feed simulator).
    background: ScopeToken,
}

impl TuiRuntime {
    /// Builds the state, shows the login page and takes over the terminal.
    pub fn new(
        config: &Config,
        backend: Arc<InMemoryBackend>,
        feed: FeedHub<String>,
    ) -> Result<Self> {
        let chat: Arc<dyn ChatBackend> = Arc::clone(&backend) as Arc<dyn ChatBackend>;
        let (mut state, queue) =
            AppState::new(config, chat, feed).context("Failed to build application state")?;
        state.start().context("Failed to show the login page")?;

        let background = ScopeToken::detached();
        FeedSimulator::new(backend, config.feed_interval()).spawn(background.clone());

        terminal::install_panic_hook();
        let terminal = match terminal::setup_terminal() {
            Ok(terminal) => terminal,
            Err(err) => {
                background.cancel();
                let _ = terminal::restore_terminal();
                return Err(err);
            }
        };

        Ok(Self {
            terminal,
            state,
            queue,
            tick: config.tick(),
            background,
        })
    }

    /// Runs until a page asks to quit or a misconfiguration error surfaces.
    pub fn run(&mut self) -> Result<()> {
        info!("tui started");
        let result = self.event_loop();
        info!(ok = result.is_ok(), "tui stopped");
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let applied = self
                .queue
                .drain(&mut self.state)
                .context("Dispatched update failed")?;
            if applied > 0 {
                debug!(applied, "applied dispatched updates");
                dirty = true;
            }

            if dirty {
                self.terminal
                    .draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }

            if !event::poll(self.tick)? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    keys::handle_key(&mut self.state, key)?;
                    dirty = true;
                }
                Event::Resize(..) => dirty = true,
                _ => {}
            }
        }

        Ok(())
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        self.background.cancel();
        self.state.services.session.end();
        let _ = terminal::restore_terminal();
    }
}
