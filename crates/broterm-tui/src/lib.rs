//! Full-screen terminal client for broterm.

pub mod overlays;
pub mod pages;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;

use std::io::{IsTerminal, Write, stderr};
use std::sync::Arc;

use anyhow::Result;
use broterm_core::FeedHub;
use broterm_core::backend::InMemoryBackend;
use broterm_core::config::Config;
pub use runtime::TuiRuntime;

/// Runs the client against the in-memory demo backend until the user quits.
pub async fn run(config: &Config) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!("broterm requires a terminal.");
    }

    let mut err = stderr();
    writeln!(err, "broterm")?;
    writeln!(err, "Theme: {}", config.theme)?;
    err.flush()?;

    let feed = FeedHub::new(config.feed_capacity);
    let backend = Arc::new(InMemoryBackend::new(
        feed.clone(),
        config.session_lifetime(),
    ));

    let mut runtime = TuiRuntime::new(config, backend, feed)?;
    let result = runtime.run();
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    result
}
