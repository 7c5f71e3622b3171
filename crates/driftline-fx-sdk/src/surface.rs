//! Interface boundary to the presentation shell.
//!
//! The shell owns windows, docking, tear-out and pointer handling; this
//! module only defines what it may ask of a hosted panel and how per-user
//! placement state is persisted. Nothing here touches audio.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Capabilities a hosted panel exposes to the shell.
///
/// The shell queries the panel instead of inspecting its concrete type: a
/// panel that can be torn out and repositioned answers `is_repositionable`
/// and names the settings key its placement is remembered under.
pub trait PanelSurface {
    fn is_repositionable(&self) -> bool {
        false
    }

    /// Settings key used to remember this panel's placement between
    /// sessions. `None` means placement is not persisted.
    fn anchor_key(&self) -> Option<&str> {
        None
    }
}

/// Injected key-value store for per-user presentation state.
///
/// Components receive a store instead of reaching for process-global
/// defaults; hosts decide whether it is backed by a file, the host's own
/// preference system, or memory.
pub trait SettingsStore: Send + Sync {
    fn get_or(&self, key: &str, default: &str) -> String;

    fn set(&self, key: &str, value: &str);
}

/// In-process [`SettingsStore`] used by tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get_or(&self, key: &str, default: &str) -> String {
        self.values
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    fn set(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }
}
