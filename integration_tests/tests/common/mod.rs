use std::path::PathBuf;
use std::sync::{Arc, Once};

use vision_core::{load_settings_from_env, VisibilityService, VisionSettings};

static INIT: Once = Once::new();

/// Point the settings loader at the test fixture (once per process) and
/// load through the same env-override path production uses.
pub fn test_settings() -> Arc<VisionSettings> {
    INIT.call_once(|| {
        let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join("test_vision_settings.json");

        debug_assert!(
            config_path.exists(),
            "missing test vision settings at {}",
            config_path.display()
        );

        std::env::set_var("VISION_CONFIG_PATH", &config_path);
    });

    let (settings, _metadata) = load_settings_from_env();
    settings
}

/// An initialized service over the fixture's 10x10 world.
pub fn initialized_service() -> anyhow::Result<VisibilityService> {
    let mut service = VisibilityService::new(test_settings());
    service.initialize()?;
    Ok(service)
}
