//! Configuration module.
//!
//! [`LayoutSettings`] is the read-only settings snapshot every layout model
//! is built with. [`loader`] resolves it from defaults, a TOML file,
//! environment variables and CLI flags.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path,
    load_config_file, load_config_with_precedence, merge_config, ConfigError, ConfigFile,
    LayoutSection, ResolvedConfig,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::geometry::{non_negative, EdgeInsets, Size};

/// Which visible edge stays visually stationary while content above it
/// changes size or structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationAnchor {
    /// Never compensate; content below a change moves with it.
    #[default]
    Disabled,
    /// Keep content at the top edge of the visible area stationary.
    Top,
    /// Keep content at the bottom edge of the visible area stationary
    /// (chat transcripts).
    Bottom,
}

/// Error returned when parsing a [`CompensationAnchor`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown compensation anchor {0:?} (expected disabled, top or bottom)")]
pub struct InvalidAnchor(pub String);

impl FromStr for CompensationAnchor {
    type Err = InvalidAnchor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            _ => Err(InvalidAnchor(s.to_string())),
        }
    }
}

impl fmt::Display for CompensationAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disabled => "disabled",
            Self::Top => "top",
            Self::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// Layout-wide settings.
///
/// Cloned into each layout model at creation; never mutated through a
/// shared reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutSettings {
    /// Size used for elements the host reports as `ItemSize::Auto`.
    pub estimated_item_size: Size,
    /// Vertical gap between consecutive cells of a section.
    pub inter_item_spacing: f64,
    /// Vertical gap between consecutive sections.
    pub inter_section_spacing: f64,
    /// Extra insets around the content, inside the viewport insets.
    pub additional_insets: EdgeInsets,
    /// Which edge is kept stable across batch updates and remeasurement.
    pub compensation_anchor: CompensationAnchor,
    /// Pin short content to the bottom of the visible area.
    pub keep_content_at_bottom_of_visible_area: bool,
    /// Minimum number of elements before size resets run in parallel.
    pub parallel_reset_threshold: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            estimated_item_size: Size::new(320.0, 40.0),
            inter_item_spacing: 0.0,
            inter_section_spacing: 0.0,
            additional_insets: EdgeInsets::ZERO,
            compensation_anchor: CompensationAnchor::Disabled,
            keep_content_at_bottom_of_visible_area: false,
            parallel_reset_threshold: 4096,
        }
    }
}

impl LayoutSettings {
    /// Clamp degenerate values: negative spacing and sizes become zero.
    #[must_use]
    pub fn sanitized(self) -> Self {
        Self {
            estimated_item_size: self.estimated_item_size.clamped(),
            inter_item_spacing: non_negative(self.inter_item_spacing),
            inter_section_spacing: non_negative(self.inter_section_spacing),
            additional_insets: EdgeInsets::new(
                non_negative(self.additional_insets.top),
                non_negative(self.additional_insets.left),
                non_negative(self.additional_insets.bottom),
                non_negative(self.additional_insets.right),
            ),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_disable_compensation() {
        let settings = LayoutSettings::default();
        assert_eq!(settings.compensation_anchor, CompensationAnchor::Disabled);
        assert!(!settings.keep_content_at_bottom_of_visible_area);
    }

    #[test]
    fn sanitized_clamps_negative_spacing() {
        let settings = LayoutSettings {
            inter_item_spacing: -3.0,
            inter_section_spacing: -1.0,
            additional_insets: EdgeInsets::new(-1.0, 2.0, -3.0, 4.0),
            ..LayoutSettings::default()
        }
        .sanitized();

        assert_eq!(settings.inter_item_spacing, 0.0);
        assert_eq!(settings.inter_section_spacing, 0.0);
        assert_eq!(settings.additional_insets, EdgeInsets::new(0.0, 2.0, 0.0, 4.0));
    }

    #[test]
    fn anchor_parses_case_insensitively() {
        assert_eq!("Bottom".parse::<CompensationAnchor>(), Ok(CompensationAnchor::Bottom));
        assert_eq!("top".parse::<CompensationAnchor>(), Ok(CompensationAnchor::Top));
        assert_eq!("off".parse::<CompensationAnchor>(), Ok(CompensationAnchor::Disabled));
    }

    #[test]
    fn anchor_rejects_unknown_names() {
        assert_eq!(
            "middle".parse::<CompensationAnchor>(),
            Err(InvalidAnchor("middle".to_string()))
        );
    }

    #[test]
    fn anchor_display_round_trips_through_from_str() {
        for anchor in [CompensationAnchor::Disabled, CompensationAnchor::Top, CompensationAnchor::Bottom] {
            assert_eq!(anchor.to_string().parse::<CompensationAnchor>(), Ok(anchor));
        }
    }

    #[test]
    fn settings_deserialize_from_partial_toml() {
        let settings: LayoutSettings = toml::from_str(
            r#"
inter_item_spacing = 7.0
compensation_anchor = "bottom"
"#,
        )
        .expect("valid settings");
        assert_eq!(settings.inter_item_spacing, 7.0);
        assert_eq!(settings.compensation_anchor, CompensationAnchor::Bottom);
        assert_eq!(settings.inter_section_spacing, 0.0);
    }
}
