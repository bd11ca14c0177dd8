//! Launcher settings persistence
//!
//! Gesture bindings, list position, and font size are small independent
//! records in their own namespace, each falling back to its default when
//! missing or unreadable. Saves report success to the settings screen;
//! loads never fail.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::data::{FontSize, GestureConfig, LayoutConfig};
use crate::store::KvStore;

const KEY_GESTURE_CONFIG: &str = "gesture_config";
const KEY_LAYOUT_CONFIG: &str = "layout_config";
const KEY_FONT_SIZE: &str = "font_size";

/// Store for the launcher's settings records
pub struct SettingsStore {
    store: Arc<dyn KvStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn load_gesture_config(&self) -> GestureConfig {
        self.load_record(KEY_GESTURE_CONFIG)
    }

    pub fn save_gesture_config(&self, config: &GestureConfig) -> bool {
        self.save_record(KEY_GESTURE_CONFIG, config)
    }

    pub fn load_layout_config(&self) -> LayoutConfig {
        self.load_record(KEY_LAYOUT_CONFIG)
    }

    pub fn save_layout_config(&self, config: &LayoutConfig) -> bool {
        self.save_record(KEY_LAYOUT_CONFIG, config)
    }

    pub fn load_font_size(&self) -> FontSize {
        self.load_record(KEY_FONT_SIZE)
    }

    pub fn save_font_size(&self, font_size: FontSize) -> bool {
        self.save_record(KEY_FONT_SIZE, &font_size)
    }

    fn load_record<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let stored = match self.store.get_string(key) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(key, "Failed to read setting: {e:#}");
                return T::default();
            }
        };
        let Some(stored) = stored.filter(|s| !s.trim().is_empty()) else {
            return T::default();
        };
        match serde_json::from_str(&stored) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, "Unreadable setting, using default: {e}");
                T::default()
            }
        }
    }

    fn save_record<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(key, "Failed to encode setting: {e}");
                return false;
            }
        };
        match self.store.put_string(key, &encoded) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(key, "Failed to save setting: {e:#}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HorizontalPosition, VerticalPosition};
    use crate::store::MemoryStore;

    fn settings() -> SettingsStore {
        SettingsStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn gesture_config_round_trips() {
        let store = settings();
        let config = GestureConfig {
            left_swipe_package: Some("org.gnome.Camera".into()),
            left_swipe_name: Some("Camera".into()),
            right_swipe_package: None,
            right_swipe_name: None,
        };

        assert!(store.save_gesture_config(&config));
        assert_eq!(store.load_gesture_config(), config);
    }

    #[test]
    fn missing_records_load_as_defaults() {
        let store = settings();
        assert_eq!(store.load_gesture_config(), GestureConfig::default());
        assert_eq!(store.load_layout_config(), LayoutConfig::default());
        assert_eq!(store.load_font_size(), FontSize::Medium);
    }

    #[test]
    fn layout_config_round_trips() {
        let store = settings();
        let config = LayoutConfig {
            horizontal_position: HorizontalPosition::Left,
            vertical_position: VerticalPosition::Bottom,
        };

        assert!(store.save_layout_config(&config));
        assert_eq!(store.load_layout_config(), config);
    }

    #[test]
    fn font_size_round_trips() {
        let store = settings();
        assert!(store.save_font_size(FontSize::ExtraLarge));
        assert_eq!(store.load_font_size(), FontSize::ExtraLarge);
    }

    #[test]
    fn corrupt_records_load_as_defaults() {
        let backing = Arc::new(MemoryStore::new());
        backing.put_string(KEY_LAYOUT_CONFIG, "}{ nope").unwrap();
        backing.put_string(KEY_FONT_SIZE, "\"Gigantic\"").unwrap();

        let store = SettingsStore::new(backing);
        assert_eq!(store.load_layout_config(), LayoutConfig::default());
        assert_eq!(store.load_font_size(), FontSize::default());
    }
}
