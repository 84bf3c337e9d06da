//! Color themes and the shared theme provider.
//!
//! Pages never cache colors beyond one repaint: they read
//! [`ThemeProvider::current`] on show and on every listener-driven redraw and
//! compare [`Theme::code`] to skip restyling when nothing changed.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

/// Colors are `0xRRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub code: String,
    pub background: u32,
    pub foreground: u32,
    pub highlight: u32,
    pub title: u32,
    pub info: u32,
    pub border: u32,
    pub accent: u32,
}

impl Theme {
    pub fn default_dark() -> Self {
        Self {
            code: "default".into(),
            background: 0x11_11_11,
            foreground: 0xFF_FF_FF,
            highlight: 0xFF_C3_00,
            title: 0xFF_C3_00,
            info: 0xCC_CC_CC,
            border: 0x44_44_44,
            accent: 0x22_22_22,
        }
    }

    pub fn light() -> Self {
        Self {
            code: "light".into(),
            background: 0xF5_F5_F0,
            foreground: 0x1E_1E_1E,
            highlight: 0x1F_6F_EB,
            title: 0x0B_3D_91,
            info: 0x55_55_55,
            border: 0xBB_BB_BB,
            accent: 0xE0_E0_E0,
        }
    }

    pub fn builtin() -> Vec<Theme> {
        vec![Self::default_dark(), Self::light()]
    }

    pub fn by_code(code: &str) -> Option<Theme> {
        Self::builtin().into_iter().find(|t| t.code == code)
    }

    /// Splits a `0xRRGGBB` value into components.
    pub fn rgb(color: u32) -> (u8, u8, u8) {
        let [_, r, g, b] = color.to_be_bytes();
        (r, g, b)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_dark()
    }
}

/// Shared, swappable current theme.
#[derive(Debug, Clone, Default)]
pub struct ThemeProvider {
    current: Arc<RwLock<Theme>>,
}

impl ThemeProvider {
    pub fn new(theme: Theme) -> Self {
        Self {
            current: Arc::new(RwLock::new(theme)),
        }
    }

    pub fn current(&self) -> Theme {
        self.current.read().clone()
    }

    pub fn set(&self, theme: Theme) {
        info!(code = %theme.code, "theme changed");
        *self.current.write() = theme;
    }

    /// Switches to the built-in theme after the current one.
    pub fn cycle(&self) -> Theme {
        let themes = Theme::builtin();
        let code = self.current.read().code.clone();
        let next = themes
            .iter()
            .position(|t| t.code == code)
            .map_or(0, |i| (i + 1) % themes.len());
        let theme = themes[next].clone();
        self.set(theme.clone());
        theme
    }
}
