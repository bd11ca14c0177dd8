//! Favorites storage, validation, and change notification
//!
//! The single source of truth for which apps appear on the home screen
//! and in what order. Lists are validated before every save, normalized
//! to a contiguous 0..n order, and reconciled against uninstalls on
//! load. Anything unrecoverable resolves to the default set; nothing in
//! here is allowed to crash the shell.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::catalog::AppCatalog;
use crate::data::{FavoriteApp, DEFAULT_FAVORITES, MAX_FAVORITES};
use crate::notice::{LogNotifier, Notifier, UserNotice};
use crate::store::KvStore;

const KEY_FAVORITE_APPS: &str = "favorite_apps_json";
const KEY_FAVORITES_COUNT: &str = "favorites_count";
const KEY_LAST_UPDATE: &str = "last_update_timestamp";

/// Outcome of validating a favorites list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Success,
    /// Usable, but order must be normalized before persisting
    Warning(String),
    /// Unusable; the mutating operation must be rejected
    Error(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        !matches!(self, ValidationResult::Error(_))
    }
}

/// Validate a favorites list without touching storage
pub fn validate_favorites(favorites: &[FavoriteApp]) -> ValidationResult {
    if favorites.is_empty() {
        return ValidationResult::Error("At least one favorite app must be selected".into());
    }

    if favorites.len() > MAX_FAVORITES {
        return ValidationResult::Error(format!(
            "Maximum {} favorite apps allowed",
            MAX_FAVORITES
        ));
    }

    let mut seen = HashSet::new();
    for favorite in favorites {
        if !seen.insert(favorite.package_name.as_str()) {
            return ValidationResult::Error(
                "Duplicate apps are not allowed in favorites".into(),
            );
        }
    }

    for favorite in favorites {
        if !favorite.is_valid() {
            return ValidationResult::Error(format!(
                "Invalid favorite app: {}",
                favorite.display_name
            ));
        }
    }

    let mut orders: Vec<u32> = favorites.iter().map(|f| f.order).collect();
    orders.sort_unstable();
    if orders
        .iter()
        .enumerate()
        .any(|(index, order)| *order != index as u32)
    {
        return ValidationResult::Warning("Favorite app order will be normalized".into());
    }

    ValidationResult::Success
}

/// Stable-sort by order and reassign 0..n by position
///
/// Idempotent: an already-normalized list comes back equal.
pub fn normalize_favorite_orders(favorites: &[FavoriteApp]) -> Vec<FavoriteApp> {
    let mut sorted: Vec<FavoriteApp> = favorites.to_vec();
    sorted.sort_by_key(|f| f.order);
    for (index, favorite) in sorted.iter_mut().enumerate() {
        favorite.order = index as u32;
    }
    sorted
}

/// Handle for a registered change listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type ChangeListener = Box<dyn Fn() + Send + Sync>;

/// Persistent store for the home screen's favorite apps
pub struct FavoritesStore {
    store: Arc<dyn KvStore>,
    catalog: Arc<dyn AppCatalog>,
    notifier: Arc<dyn Notifier>,
    listeners: Mutex<Vec<(u64, ChangeListener)>>,
    next_listener_id: AtomicU64,
}

impl FavoritesStore {
    pub fn new(store: Arc<dyn KvStore>, catalog: Arc<dyn AppCatalog>) -> Self {
        Self::with_notifier(store, catalog, Arc::new(LogNotifier))
    }

    pub fn with_notifier(
        store: Arc<dyn KvStore>,
        catalog: Arc<dyn AppCatalog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            catalog,
            notifier,
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// Load favorites, cleaning out uninstalled apps along the way
    ///
    /// Always yields a usable list: missing, unparseable, or corrupt
    /// state resolves to the default set.
    pub fn load(&self) -> Vec<FavoriteApp> {
        let raw = match self.store.get_string(KEY_FAVORITE_APPS) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Failed to read favorites: {e:#}");
                return self.default_favorites();
            }
        };

        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            tracing::debug!("No favorites stored, returning defaults");
            return self.default_favorites();
        };

        let favorites: Vec<FavoriteApp> = match serde_json::from_str(&raw) {
            Ok(favorites) => favorites,
            Err(e) => {
                tracing::error!("Stored favorites are unparseable, returning defaults: {e}");
                return self.default_favorites();
            }
        };

        let cleaned: Vec<FavoriteApp> = favorites
            .iter()
            .filter(|f| self.catalog.is_installed(&f.package_name))
            .cloned()
            .collect();

        if cleaned.len() != favorites.len() {
            let removed: Vec<&FavoriteApp> = favorites
                .iter()
                .filter(|f| !cleaned.iter().any(|c| c.package_name == f.package_name))
                .collect();
            tracing::info!(removed = removed.len(), "Dropped uninstalled apps from favorites");

            // Persist the cleaned list; an empty remainder is caught below
            self.save(&cleaned);

            for app in removed {
                self.notifier.notify(UserNotice::AppUninstalled {
                    display_name: app.display_name.clone(),
                });
            }
        }

        match validate_favorites(&cleaned) {
            ValidationResult::Error(message) => {
                tracing::warn!("Invalid favorites found ({message}), resetting to defaults");
                self.notifier.notify(UserNotice::DataReset);
                self.default_favorites()
            }
            ValidationResult::Warning(message) => {
                tracing::debug!("{message}");
                normalize_favorite_orders(&cleaned)
            }
            ValidationResult::Success => normalize_favorite_orders(&cleaned),
        }
    }

    /// Validate, normalize, and persist a favorites list
    ///
    /// Returns false without touching stored state when validation
    /// rejects the list or persistence fails. On success the whole list
    /// is written in one commit along with a count and a timestamp, and
    /// change listeners fire synchronously.
    pub fn save(&self, favorites: &[FavoriteApp]) -> bool {
        match validate_favorites(favorites) {
            ValidationResult::Error(message) => {
                tracing::error!("Cannot save invalid favorites: {message}");
                return false;
            }
            ValidationResult::Warning(message) => tracing::debug!("{message}"),
            ValidationResult::Success => {}
        }

        let normalized = normalize_favorite_orders(favorites);
        let json = match serde_json::to_string(&normalized) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize favorites: {e}");
                return false;
            }
        };

        let batch = [
            (KEY_FAVORITE_APPS, json),
            (KEY_FAVORITES_COUNT, normalized.len().to_string()),
            (KEY_LAST_UPDATE, Utc::now().timestamp_millis().to_string()),
        ];
        if let Err(e) = self.store.put_strings(&batch) {
            tracing::error!("Failed to persist favorites: {e:#}");
            return false;
        }

        tracing::debug!(count = normalized.len(), "Saved favorites");
        self.notify_changed();
        true
    }

    /// Seed favorites filtered to what is actually installed
    pub fn default_favorites(&self) -> Vec<FavoriteApp> {
        let installed: Vec<FavoriteApp> = DEFAULT_FAVORITES
            .iter()
            .filter(|f| self.catalog.is_installed(&f.package_name))
            .cloned()
            .collect();

        if installed.is_empty() {
            vec![FavoriteApp::fallback()]
        } else {
            normalize_favorite_orders(&installed)
        }
    }

    /// Append an app to the favorites, if there is room and it is new
    pub fn add_favorite(&self, package_name: &str, display_name: &str) -> bool {
        let mut favorites = self.load();

        if favorites.iter().any(|f| f.package_name == package_name) {
            tracing::warn!(package = package_name, "App is already in favorites");
            return false;
        }

        if favorites.len() >= MAX_FAVORITES {
            tracing::warn!("Cannot add favorite, maximum limit reached");
            self.notifier.notify(UserNotice::FavoritesLimitReached);
            return false;
        }

        let order = favorites.len() as u32;
        favorites.push(FavoriteApp::new(package_name, display_name, order));
        self.save(&favorites)
    }

    /// Remove an app from the favorites
    ///
    /// The persisted list never goes empty: removing the last favorite
    /// substitutes the default set.
    pub fn remove_favorite(&self, package_name: &str) -> bool {
        let mut favorites = self.load();
        let before = favorites.len();
        favorites.retain(|f| f.package_name != package_name);

        if favorites.len() == before {
            return false;
        }

        if favorites.is_empty() {
            return self.save(&self.default_favorites());
        }
        self.save(&favorites)
    }

    /// Re-sequence order by list position and persist
    pub fn reorder_favorites(&self, favorites: &[FavoriteApp]) -> bool {
        let reordered: Vec<FavoriteApp> = favorites
            .iter()
            .enumerate()
            .map(|(index, favorite)| {
                let mut favorite = favorite.clone();
                favorite.order = index as u32;
                favorite
            })
            .collect();
        self.save(&reordered)
    }

    pub fn is_favorite(&self, package_name: &str) -> bool {
        self.load().iter().any(|f| f.package_name == package_name)
    }

    /// Redundant persisted count, kept alongside the list for diagnostics
    pub fn favorites_count(&self) -> usize {
        self.store
            .get_string(KEY_FAVORITES_COUNT)
            .ok()
            .flatten()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    pub fn reset_to_defaults(&self) -> bool {
        self.save(&self.default_favorites())
    }

    /// Register a callback fired after every successful save
    pub fn add_change_listener(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap()
            .push((id, Box::new(listener)));
        ListenerId(id)
    }

    /// Unregister a change listener; returns false for unknown handles
    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id.0);
        listeners.len() != before
    }

    /// Fire all listeners synchronously, isolating per-listener panics
    ///
    /// Listeners must not register or unregister from inside the
    /// callback; dispatch holds the registry lock.
    fn notify_changed(&self) {
        let listeners = self.listeners.lock().unwrap();
        for (id, listener) in listeners.iter() {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                tracing::error!(listener = *id, "Favorites change listener panicked");
            }
        }
    }
}
