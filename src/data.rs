//! Core value types shared across the launcher
//!
//! Favorites are what the home screen renders; installed apps are what
//! the catalog reports; the settings records mirror what the settings
//! screen edits.

use serde::{Deserialize, Serialize};

/// Fewest favorites a valid home screen can hold
pub const MIN_FAVORITES: usize = 1;
/// Most favorites a valid home screen can hold
pub const MAX_FAVORITES: usize = 7;

/// A user-selected app shown on the home screen, with an explicit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteApp {
    /// Desktop ID of the app (e.g. "org.gnome.Calls")
    pub package_name: String,
    /// Label rendered on the home screen
    pub display_name: String,
    /// Position in the list, 0-based
    pub order: u32,
}

lazy_static::lazy_static! {
    /// Seed favorites used when no configuration exists yet
    pub static ref DEFAULT_FAVORITES: Vec<FavoriteApp> = vec![
        FavoriteApp::new("org.gnome.Calls", "Phone", 0),
        FavoriteApp::new("sm.puri.Chatty", "Messages", 1),
        FavoriteApp::new("org.gnome.Epiphany", "Web", 2),
    ];
}

impl FavoriteApp {
    pub fn new(package_name: &str, display_name: &str, order: u32) -> Self {
        Self {
            package_name: package_name.to_string(),
            display_name: display_name.to_string(),
            order,
        }
    }

    /// Last-resort entry when none of the seed favorites is installed
    pub fn fallback() -> Self {
        Self::new("org.gnome.Settings", "Settings", 0)
    }

    /// Check that this entry is properly configured on its own
    pub fn is_valid(&self) -> bool {
        !self.package_name.trim().is_empty() && !self.display_name.trim().is_empty()
    }
}

/// An installed app as reported by the catalog collaborator
///
/// A read-only snapshot value; the catalog refreshes it periodically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledApp {
    /// Desktop ID, unique within a snapshot
    pub package_name: String,
    /// Human-readable name
    pub display_name: String,
    /// Icon name or path, when the desktop entry declares one
    pub icon: Option<String>,
    /// Whether the app can actually be launched
    pub is_launchable: bool,
    /// Whether the app ships with the system image
    pub is_system_app: bool,
}

impl InstalledApp {
    /// Check whether this app may be offered for favorite selection
    pub fn can_be_added_as_favorite(&self) -> bool {
        self.is_launchable
            && !self.package_name.trim().is_empty()
            && !self.display_name.trim().is_empty()
    }

    /// Convert to a favorite at the given position
    pub fn to_favorite(&self, order: u32) -> FavoriteApp {
        FavoriteApp {
            package_name: self.package_name.clone(),
            display_name: self.display_name.clone(),
            order,
        }
    }
}

/// Apps bound to the left/right edge swipes on the home screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default)]
    pub left_swipe_package: Option<String>,
    #[serde(default)]
    pub left_swipe_name: Option<String>,
    #[serde(default)]
    pub right_swipe_package: Option<String>,
    #[serde(default)]
    pub right_swipe_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalPosition {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Where the favorites list sits on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub horizontal_position: HorizontalPosition,
    #[serde(default)]
    pub vertical_position: VerticalPosition,
}

/// Font size for home-screen labels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl FontSize {
    /// Label size in points
    pub fn points(&self) -> f32 {
        match self {
            FontSize::Small => 14.0,
            FontSize::Medium => 18.0,
            FontSize::Large => 22.0,
            FontSize::ExtraLarge => 26.0,
        }
    }

    /// Name shown in the settings screen
    pub fn label(&self) -> &'static str {
        match self {
            FontSize::Small => "Small",
            FontSize::Medium => "Medium",
            FontSize::Large => "Large",
            FontSize::ExtraLarge => "Extra Large",
        }
    }
}
