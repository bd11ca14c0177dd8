//! Installed-app discovery via freedesktop desktop entries
//!
//! Scans the standard system and user application directories for
//! `.desktop` files and exposes them as a snapshot the favorites store
//! and the search engine consume. The snapshot is cached for a short
//! window so keystroke-driven callers never touch the disk.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::data::InstalledApp;

/// How long a scanned snapshot stays fresh
const CACHE_LIFETIME: Duration = Duration::from_secs(30);

/// Source of installed-application records
pub trait AppCatalog: Send + Sync {
    /// Current snapshot of launchable apps, sorted by display name
    fn installed_apps(&self) -> Result<Vec<InstalledApp>>;

    /// Whether a package is present in the current snapshot
    fn is_installed(&self, package_name: &str) -> bool;

    /// Drop any cached snapshot so the next query rescans
    fn invalidate(&self) {}
}

/// A parsed `.desktop` file
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    /// Desktop ID, taken from the file stem
    pub id: String,
    /// Application name
    pub name: String,
    /// Exec command with field codes stripped
    pub exec: String,
    /// Icon name, when declared
    pub icon: Option<String>,
    /// Entry asks to be hidden from launchers
    pub no_display: bool,
}

impl DesktopEntry {
    /// Parse a `.desktop` file, returning None for anything malformed
    pub fn parse(path: &PathBuf) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        let id = path.file_stem()?.to_string_lossy().to_string();
        let mut name = None;
        let mut exec = None;
        let mut icon = None;
        let mut no_display = false;
        let mut in_desktop_entry = false;

        for line in content.lines() {
            let line = line.trim();

            if line.starts_with('[') {
                in_desktop_entry = line == "[Desktop Entry]";
                continue;
            }

            if !in_desktop_entry {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key {
                    "Name" => name = Some(value.to_string()),
                    "Exec" => {
                        // Remove field codes like %u, %f, %U, %F
                        let clean_exec = value
                            .replace("%u", "")
                            .replace("%U", "")
                            .replace("%f", "")
                            .replace("%F", "")
                            .replace("%%", "%")
                            .trim()
                            .to_string();
                        exec = Some(clean_exec);
                    }
                    "Icon" => icon = Some(value.to_string()),
                    "NoDisplay" | "Hidden" => {
                        no_display = no_display || value.eq_ignore_ascii_case("true");
                    }
                    _ => {}
                }
            }
        }

        Some(Self {
            id,
            name: name?,
            exec: exec?,
            icon,
            no_display,
        })
    }

    fn to_installed_app(&self, system: bool) -> InstalledApp {
        InstalledApp {
            package_name: self.id.clone(),
            display_name: self.name.clone(),
            icon: self.icon.clone(),
            is_launchable: !self.exec.is_empty(),
            is_system_app: system,
        }
    }
}

struct Snapshot {
    apps: Vec<InstalledApp>,
    taken_at: Instant,
}

/// Catalog backed by `.desktop` entries on disk
pub struct DesktopCatalog {
    /// (directory, counts as system dir) pairs scanned in order
    search_dirs: Vec<(PathBuf, bool)>,
    snapshot: Mutex<Option<Snapshot>>,
}

impl DesktopCatalog {
    /// Catalog over the standard application directories
    pub fn new() -> Self {
        let mut dirs = vec![
            (PathBuf::from("/usr/share/applications"), true),
            (PathBuf::from("/usr/local/share/applications"), true),
        ];
        if let Ok(home) = std::env::var("HOME") {
            dirs.push((PathBuf::from(home).join(".local/share/applications"), false));
        }
        Self::with_dirs(dirs)
    }

    /// Catalog over explicit directories
    pub fn with_dirs(search_dirs: Vec<(PathBuf, bool)>) -> Self {
        Self {
            search_dirs,
            snapshot: Mutex::new(None),
        }
    }

    /// Walk the search directories and build a fresh snapshot
    fn scan(&self) -> Vec<InstalledApp> {
        let mut apps = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for (dir, system) in &self.search_dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if !path.extension().map(|e| e == "desktop").unwrap_or(false) {
                    continue;
                }
                let Some(desktop) = DesktopEntry::parse(&path) else {
                    continue;
                };
                if desktop.no_display || desktop.exec.is_empty() {
                    continue;
                }

                // First entry wins; later duplicates by id or name are dropped
                let name_key = desktop.name.to_lowercase();
                if seen_ids.contains(&desktop.id) || seen_names.contains(&name_key) {
                    continue;
                }
                seen_ids.insert(desktop.id.clone());
                seen_names.insert(name_key);

                apps.push(desktop.to_installed_app(*system));
            }
        }

        apps.retain(|app| app.can_be_added_as_favorite());
        apps.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
        });

        tracing::debug!(count = apps.len(), "Scanned desktop entries");
        apps
    }
}

impl Default for DesktopCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl AppCatalog for DesktopCatalog {
    fn installed_apps(&self) -> Result<Vec<InstalledApp>> {
        let mut snapshot = self
            .snapshot
            .lock()
            .map_err(|_| anyhow::anyhow!("catalog lock poisoned"))?;

        if let Some(cached) = snapshot.as_ref() {
            if cached.taken_at.elapsed() < CACHE_LIFETIME {
                return Ok(cached.apps.clone());
            }
        }

        let apps = self.scan();
        *snapshot = Some(Snapshot {
            apps: apps.clone(),
            taken_at: Instant::now(),
        });
        Ok(apps)
    }

    fn is_installed(&self, package_name: &str) -> bool {
        self.installed_apps()
            .map(|apps| apps.iter().any(|a| a.package_name == package_name))
            .unwrap_or(false)
    }

    fn invalidate(&self) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = None;
        }
    }
}
