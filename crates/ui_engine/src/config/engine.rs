//! Top-level engine settings

use serde::{Deserialize, Serialize};

use super::Config;
use crate::ui::text_box::TextBoxConfig;

/// Settings for the UI engine and its default widget style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial window width in pixels
    pub window_width: u32,
    /// Initial window height in pixels
    pub window_height: u32,
    /// Font used by built-in widgets such as the debug monitor
    pub default_font_path: String,
    /// Pixel size for `default_font_path`
    pub default_font_size: f32,
    /// Framebuffer clear color (RGBA)
    pub clear_color: [f32; 4],
    /// Whether the engine attaches the debug monitor overlay
    pub show_debug_monitor: bool,
    /// Default text box styling
    pub text_box: TextBoxConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_width: 800,
            window_height: 600,
            default_font_path: "assets/fonts/DejaVuSansMono.ttf".to_string(),
            default_font_size: 16.0,
            clear_color: [0.05, 0.05, 0.08, 1.0],
            show_debug_monitor: true,
            text_box: TextBoxConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the window size
    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set the default font
    #[must_use]
    pub fn with_default_font(mut self, path: impl Into<String>, size: f32) -> Self {
        self.default_font_path = path.into();
        self.default_font_size = size;
        self
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ui_engine_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_toml_round_trip_preserves_fields() {
        let path = temp_path("engine.toml");
        let config = EngineConfig::default()
            .with_window_size(1280, 720)
            .with_default_font("fonts/mono.ttf", 20.0);

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_ron_uses_defaults_for_missing_fields() {
        let path = temp_path("partial.ron");
        std::fs::write(&path, "(window_width: 1024, text_box: (corner_radius: 4.0))").unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.window_width, 1024);
        assert_eq!(loaded.window_height, 600);
        assert_eq!(loaded.text_box.corner_radius, 4.0);
        assert_eq!(loaded.text_box.padding_left, 15.0);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineConfig::default().save_to_file(temp_path("engine.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let loaded = EngineConfig::load_or_default(temp_path("does_not_exist.toml")).unwrap();
        assert_eq!(loaded, EngineConfig::default());
    }
}
