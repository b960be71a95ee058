//! Neon-on-charcoal theme tokens for the PledgeBoard TUI
//!
//! # Color Palette
//! - **Accent**: Electric cyan (focus, highlighted bundle)
//! - **Positive**: Neon green (gains, funded goals)
//! - **Negative**: Hot pink (losses, drawdowns, errors)
//! - **Warning**: Neon orange (alerts, cancelled loads)
//! - **Neutral**: Cool purple (benchmark, secondary info)
//! - **Muted**: Steel blue (hints, missing values)

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub warning: Color,
    pub neutral: Color,
    pub muted: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::neon()
    }
}

impl Theme {
    pub fn neon() -> Self {
        Self {
            background: Color::Rgb(18, 18, 20),
            accent: Color::Rgb(0, 255, 255),
            positive: Color::Rgb(0, 255, 128),
            negative: Color::Rgb(255, 20, 147),
            warning: Color::Rgb(255, 140, 0),
            neutral: Color::Rgb(147, 112, 219),
            muted: Color::Rgb(100, 149, 237),
            text_primary: Color::White,
            text_secondary: Color::Rgb(170, 170, 170),
        }
    }

    /// Gains green, losses pink.
    pub fn return_color(&self, value: f64) -> Color {
        if value >= 0.0 {
            self.positive
        } else {
            self.negative
        }
    }

    /// Color for pledge progress toward a goal, in percent.
    pub fn progress_color(&self, percent: f64) -> Color {
        match percent {
            p if p >= 100.0 => self.positive,
            p if p >= 50.0 => self.accent,
            p if p > 0.0 => self.neutral,
            _ => self.muted,
        }
    }

    pub fn sharpe_color(&self, sharpe: f64) -> Color {
        match sharpe {
            s if s >= 1.0 => self.positive,
            s if s >= 0.5 => self.accent,
            s if s >= 0.0 => self.muted,
            _ => self.negative,
        }
    }
}

fn theme() -> Theme {
    Theme::default()
}

pub fn accent() -> Style {
    Style::default().fg(theme().accent)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(theme().muted)
}

pub fn neutral() -> Style {
    Style::default().fg(theme().neutral)
}

pub fn warning() -> Style {
    Style::default().fg(theme().warning)
}

pub fn negative() -> Style {
    Style::default().fg(theme().negative)
}

pub fn text() -> Style {
    Style::default().fg(theme().text_primary)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        Style::default().fg(theme().text_secondary)
    }
}

/// Highlighted table row.
pub fn selected_row() -> Style {
    Style::default()
        .fg(theme().background)
        .bg(theme().accent)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_creation() {
        let theme = Theme::default();
        assert_eq!(theme.background, Color::Rgb(18, 18, 20));
        assert_eq!(theme.accent, Color::Rgb(0, 255, 255));
    }

    #[test]
    fn test_return_color() {
        let theme = Theme::default();
        assert_eq!(theme.return_color(0.12), theme.positive);
        assert_eq!(theme.return_color(-0.03), theme.negative);
        assert_eq!(theme.return_color(0.0), theme.positive);
    }

    #[test]
    fn test_progress_color() {
        let theme = Theme::default();
        assert_eq!(theme.progress_color(120.0), theme.positive);
        assert_eq!(theme.progress_color(50.0), theme.accent);
        assert_eq!(theme.progress_color(25.0), theme.neutral);
        assert_eq!(theme.progress_color(0.0), theme.muted);
    }

    #[test]
    fn test_sharpe_color() {
        let theme = Theme::default();
        assert_eq!(theme.sharpe_color(1.5), theme.positive);
        assert_eq!(theme.sharpe_color(0.7), theme.accent);
        assert_eq!(theme.sharpe_color(0.2), theme.muted);
        assert_eq!(theme.sharpe_color(-0.5), theme.negative);
    }

    #[test]
    fn panel_styles_follow_focus() {
        assert_eq!(panel_border(true), accent());
        assert_eq!(panel_border(false), muted());
    }
}
