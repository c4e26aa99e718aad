use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
/// Persisted UI/application settings for Galleria.
pub struct AppConfig {
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    /// Base directory the portfolio image paths resolve against.
    pub gallery_dir: Option<PathBuf>,
    /// Category selected at startup, the equivalent of a `category=<tag>`
    /// page parameter.
    pub start_category: Option<String>,
    /// Force the device class: "constrained", "unconstrained", or unset for
    /// width-based detection.
    pub device_class: Option<String>,
}

impl AppConfig {
    /// Returns the user config file path, if a config directory is available.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("galleria").join("config.toml"))
    }

    /// Loads config from disk, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_default()
    }

    /// Writes config to disk, ignoring filesystem/serialization errors.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(s) = toml::to_string_pretty(self) {
            let _ = std::fs::write(&path, s);
        }
    }

    /// Image base directory, defaulting to `Pictures/Portfolio`.
    pub fn resolve_gallery_dir(&self) -> PathBuf {
        self.gallery_dir.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Portfolio")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_everything_unset() {
        let cfg = AppConfig::default();
        assert!(cfg.gallery_dir.is_none());
        assert!(cfg.start_category.is_none());
        assert!(cfg.device_class.is_none());
    }

    #[test]
    fn explicit_gallery_dir_wins() {
        let cfg = AppConfig {
            gallery_dir: Some(PathBuf::from("/srv/photos")),
            ..Default::default()
        };
        assert_eq!(cfg.resolve_gallery_dir(), PathBuf::from("/srv/photos"));
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let cfg: AppConfig = toml::from_str("start_category = 3").unwrap_or_default();
        assert!(cfg.start_category.is_none());
    }
}
