//! Row styling for the structure table and schedule bars.
//!
//! Maps a [`Severity`] to a colour set and a [`DescendantSignal`] to a badge.
//! Colours are plain RGBA so any renderer can consume them.

use crate::severity::{DescendantSignal, Severity};
use prodtree_core::ExecutorKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn darken(&self, factor: f32) -> Self {
        Self {
            r: ((self.r as f32) * (1.0 - factor)) as u8,
            g: ((self.g as f32) * (1.0 - factor)) as u8,
            b: ((self.b as f32) * (1.0 - factor)) as u8,
            a: self.a,
        }
    }

    pub fn lighten(&self, factor: f32) -> Self {
        Self {
            r: ((self.r as f32) + (255.0 - self.r as f32) * factor) as u8,
            g: ((self.g as f32) + (255.0 - self.g as f32) * factor) as u8,
            b: ((self.b as f32) + (255.0 - self.b as f32) * factor) as u8,
            a: self.a,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowColors {
    pub background: Color,
    pub text: Color,
    /// Planned bar fill; the actual bar uses a darker shade.
    pub bar: Color,
    /// Label colour drawn on top of `bar`.
    pub bar_text: Color,
}

impl RowColors {
    pub fn actual_bar(&self) -> Color {
        self.bar.darken(0.25)
    }
}

// Severity palette
pub const COLOR_DONE: Color = Color::rgb(76, 175, 80);
pub const COLOR_PAUSED: Color = Color::rgb(158, 158, 158);
pub const COLOR_OVERDUE: Color = Color::rgb(229, 57, 53);
pub const COLOR_AT_RISK: Color = Color::rgb(251, 140, 0);
pub const COLOR_NOT_STARTED: Color = Color::rgb(144, 164, 174);
pub const COLOR_DEVIATION: Color = Color::rgb(253, 216, 53);
pub const COLOR_IN_PROGRESS: Color = Color::rgb(30, 136, 229);
pub const COLOR_WAITING: Color = Color::rgb(189, 189, 189);

pub const COLOR_TEXT_DARK: Color = Color::rgb(33, 33, 33);
pub const COLOR_TEXT_LIGHT: Color = Color::rgb(255, 255, 255);

pub const COLOR_TODAY_MARKER: Color = Color::rgb(211, 47, 47);

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Done => COLOR_DONE,
        Severity::Paused => COLOR_PAUSED,
        Severity::Overdue => COLOR_OVERDUE,
        Severity::AtRisk => COLOR_AT_RISK,
        Severity::NotStarted => COLOR_NOT_STARTED,
        Severity::Deviation => COLOR_DEVIATION,
        Severity::InProgress => COLOR_IN_PROGRESS,
        Severity::Waiting => COLOR_WAITING,
    }
}

pub fn row_colors(severity: Severity) -> RowColors {
    let base = severity_color(severity);
    let bar_text = match severity {
        Severity::Overdue | Severity::InProgress | Severity::Done => COLOR_TEXT_LIGHT,
        _ => COLOR_TEXT_DARK,
    };
    RowColors {
        background: base.lighten(0.8),
        text: COLOR_TEXT_DARK,
        bar: base,
        bar_text,
    }
}

pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Done => "Done",
        Severity::Paused => "Paused",
        Severity::Overdue => "Overdue",
        Severity::AtRisk => "At risk",
        Severity::NotStarted => "Not started",
        Severity::Deviation => "Deviation",
        Severity::InProgress => "In progress",
        Severity::Waiting => "Waiting",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub glyph: &'static str,
    pub color: Color,
    pub tooltip: &'static str,
}

/// `None` for [`DescendantSignal::Clean`].
pub fn descendant_badge(signal: DescendantSignal) -> Option<Badge> {
    match signal {
        DescendantSignal::OverdueDescendant => Some(Badge {
            glyph: "!",
            color: COLOR_OVERDUE,
            tooltip: "A descendant is overdue",
        }),
        DescendantSignal::RiskOrDeviationDescendant => Some(Badge {
            glyph: "?",
            color: COLOR_AT_RISK,
            tooltip: "A descendant is at risk or has a deviation",
        }),
        DescendantSignal::Clean => None,
    }
}

pub fn executor_glyph(kind: ExecutorKind) -> &'static str {
    match kind {
        ExecutorKind::Internal => "⚙",
        ExecutorKind::Contractor => "⇄",
        ExecutorKind::Supplier => "🛒",
    }
}

pub fn expander_glyph(has_children: bool, expanded: bool) -> &'static str {
    match (has_children, expanded) {
        (false, _) => " ",
        (true, true) => "▾",
        (true, false) => "▸",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_severity_has_distinct_color() {
        let mut seen = Vec::new();
        for severity in Severity::ALL {
            let color = severity_color(*severity);
            assert!(!seen.contains(&color), "{severity:?} reuses a colour");
            seen.push(color);
        }
    }

    #[test]
    fn test_hex_formatting() {
        assert_eq!(Color::rgb(255, 0, 16).to_hex(), "#ff0010");
        assert_eq!(Color::rgba(0, 0, 0, 128).to_hex(), "#00000080");
    }

    #[test]
    fn test_row_background_is_lighter_than_bar() {
        let colors = row_colors(Severity::Overdue);
        assert!(colors.background.g > colors.bar.g);
        assert_eq!(colors.actual_bar(), COLOR_OVERDUE.darken(0.25));
    }

    #[test]
    fn test_clean_signal_has_no_badge() {
        assert!(descendant_badge(DescendantSignal::Clean).is_none());
        assert_eq!(
            descendant_badge(DescendantSignal::OverdueDescendant).map(|b| b.glyph),
            Some("!")
        );
    }
}
