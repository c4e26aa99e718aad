mod app;
mod config;
mod device;
mod gallery;
mod item;
mod lightbox;
mod loader;
mod observer;
mod records;

use app::GalleriaApp;
use config::AppConfig;
use device::DeviceClass;

fn parse_device_class(value: &str) -> Option<DeviceClass> {
    match value.trim().to_ascii_lowercase().as_str() {
        "constrained" | "narrow" | "mobile" => Some(DeviceClass::Constrained),
        "unconstrained" | "wide" | "desktop" => Some(DeviceClass::Unconstrained),
        _ => None,
    }
}

/// Env wins over config; unset/unknown means width-based detection.
fn resolve_device_override(config: &AppConfig) -> Option<DeviceClass> {
    if let Ok(raw) = std::env::var("GALLERIA_DEVICE") {
        return parse_device_class(&raw);
    }
    config.device_class.as_deref().and_then(parse_device_class)
}

/// Startup category, the stand-in for a `category=<tag>` page parameter.
fn resolve_start_category(config: &AppConfig) -> Option<String> {
    if let Ok(raw) = std::env::var("GALLERIA_CATEGORY") {
        let tag = raw.trim().to_ascii_lowercase();
        if !tag.is_empty() {
            return Some(tag);
        }
    }
    config.start_category.clone()
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let device_override = resolve_device_override(&config);
    let start_category = resolve_start_category(&config);

    let width = config.window_width.unwrap_or(1200.0);
    let height = config.window_height.unwrap_or(800.0);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Galleria")
            .with_app_id("galleria")
            .with_inner_size([width, height]),
        ..Default::default()
    };

    eframe::run_native(
        "galleria",
        native_options,
        Box::new(|cc| {
            Ok(Box::new(GalleriaApp::new(
                cc,
                config,
                start_category,
                device_override,
            )))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::{parse_device_class, resolve_start_category};
    use crate::config::AppConfig;
    use crate::device::DeviceClass;

    #[test]
    fn parse_device_class_handles_supported_values() {
        assert_eq!(parse_device_class("constrained"), Some(DeviceClass::Constrained));
        assert_eq!(parse_device_class("  Mobile "), Some(DeviceClass::Constrained));
        assert_eq!(parse_device_class("desktop"), Some(DeviceClass::Unconstrained));
        assert_eq!(parse_device_class("wide"), Some(DeviceClass::Unconstrained));
    }

    #[test]
    fn parse_device_class_rejects_unknown_values() {
        assert_eq!(parse_device_class("tablet"), None);
        assert_eq!(parse_device_class(""), None);
    }

    #[test]
    fn start_category_falls_back_to_config() {
        let cfg = AppConfig {
            start_category: Some("fall".to_string()),
            ..Default::default()
        };
        // Env is unset under test; config value applies.
        if std::env::var("GALLERIA_CATEGORY").is_err() {
            assert_eq!(resolve_start_category(&cfg), Some("fall".to_string()));
        }
    }
}
