//! Wisp - a minimal, text-only launcher core for mobile Linux phones
//!
//! The home screen shows a short, user-ordered list of favorite apps over
//! the wallpaper; a swipe opens fuzzy search over everything installed.
//! This crate is the algorithmic core behind that surface:
//!
//! - Favorites: validation, normalization, persistence, and cleanup of
//!   the 1-7 favorite apps shown on the home screen
//! - Search: tiered fuzzy ranking of the installed-app snapshot, with a
//!   bounded result cache and a debounced search-as-you-type worker
//! - Contrast: wallpaper luminance sampling to pick a legible text color
//!
//! Rendering, input, and window management belong to the embedding shell.
//! The core consumes plain collaborators (an app catalog, a key-value
//! store, a wallpaper source) and hands back plain data (ranked results,
//! validated lists, a color).

pub mod catalog;
pub mod contrast;
pub mod data;
pub mod debounce;
pub mod favorites;
pub mod notice;
pub mod search;
pub mod settings;
pub mod store;

pub use catalog::{AppCatalog, DesktopCatalog};
pub use contrast::{ContrastSampler, FileWallpaper, WallpaperSource};
pub use data::{
    FavoriteApp, FontSize, GestureConfig, HorizontalPosition, InstalledApp, LayoutConfig,
    VerticalPosition, MAX_FAVORITES, MIN_FAVORITES,
};
pub use debounce::SearchRunner;
pub use favorites::{FavoritesStore, ValidationResult};
pub use notice::{LogNotifier, Notifier, UserNotice};
pub use search::{MatchType, SearchEngine, SearchError, SearchResult};
pub use settings::SettingsStore;
pub use store::{FileStore, KvStore, MemoryStore};
