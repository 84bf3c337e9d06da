use broterm_core::{Theme, ThemeProvider};
use ratatui::style::{Color, Modifier, Style};

pub fn color(value: u32) -> Color {
    let (r, g, b) = Theme::rgb(value);
    Color::Rgb(r, g, b)
}

/// A page's snapshot of the current theme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    code: String,
    pub background: Color,
    pub foreground: Color,
    pub highlight: Color,
    pub title: Color,
    pub info: Color,
    pub border: Color,
    pub accent: Color,
}

impl Palette {
    pub fn from_theme(theme: &Theme) -> Self {
        Self {
            code: theme.code.clone(),
            background: color(theme.background),
            foreground: color(theme.foreground),
            highlight: color(theme.highlight),
            title: color(theme.title),
            info: color(theme.info),
            border: color(theme.border),
            accent: color(theme.accent),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Restyles from `themes` when the theme code changed. Returns whether it
    /// did.
    pub fn sync(&mut self, themes: &ThemeProvider) -> bool {
        let theme = themes.current();
        if theme.code == self.code {
            return false;
        }
        *self = Self::from_theme(&theme);
        true
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.foreground).bg(self.background)
    }

    pub fn header(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .fg(self.background)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.info)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_theme(&Theme::default())
    }
}
