//! Fuzzy app search over the installed-app snapshot
//!
//! Ranks the catalog snapshot against a query with tiered match rules:
//! exact name, prefix, substring, acronym ("gm" finds "Google Maps"),
//! then Levenshtein similarity as the last resort. Results are capped,
//! exact-prefix matches always lead, and recent queries are served from
//! a bounded cache so search-as-you-type stays cheap.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::AppCatalog;
use crate::data::InstalledApp;

/// Result cap used by the search UI
pub const DEFAULT_MAX_RESULTS: usize = 15;

const CACHE_SIZE_LIMIT: usize = 100;
const CACHE_EVICTION_BATCH: usize = 10;

/// Search subsystem failure, distinct from an empty result
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("app catalog unavailable: {0}")]
    Catalog(anyhow::Error),
    #[error("search worker has shut down")]
    WorkerGone,
}

/// How a result matched the query; declaration order is the tie-break rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchType {
    /// Query matches the start of the app name (or the whole name)
    ExactStart,
    /// Query is contained in the app name
    ExactContains,
    /// Query matches the initials of a multi-word app name
    AcronymMatch,
    /// Edit-distance similarity only
    FuzzyMatch,
}

/// One ranked search hit; recomputed per query, never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub app: InstalledApp,
    /// Relevance in [0, 1]
    pub relevance_score: f64,
    pub match_type: MatchType,
}

type CacheKey = (String, usize);

/// Synchronous search core over a catalog snapshot
///
/// `initialize` must run before searches are meaningful; against an
/// unloaded snapshot every query yields an empty result.
pub struct SearchEngine {
    catalog: Arc<dyn AppCatalog>,
    apps: Vec<InstalledApp>,
    cache: HashMap<CacheKey, Vec<SearchResult>>,
    cache_order: VecDeque<CacheKey>,
}

impl SearchEngine {
    pub fn new(catalog: Arc<dyn AppCatalog>) -> Self {
        Self {
            catalog,
            apps: Vec::new(),
            cache: HashMap::new(),
            cache_order: VecDeque::new(),
        }
    }

    /// Load the installed-app snapshot from the catalog
    pub fn initialize(&mut self) -> Result<(), SearchError> {
        self.apps = self
            .catalog
            .installed_apps()
            .map_err(SearchError::Catalog)?;
        tracing::debug!(count = self.apps.len(), "Search snapshot loaded");
        Ok(())
    }

    /// Re-fetch the snapshot and drop cached results
    ///
    /// Must be called when the installed-app set changes.
    pub fn refresh(&mut self) -> Result<(), SearchError> {
        self.initialize()?;
        self.clear_cache();
        Ok(())
    }

    /// Number of apps in the current snapshot
    pub fn app_count(&self) -> usize {
        self.apps.len()
    }

    /// The whole snapshot sorted case-insensitively, neutrally scored
    pub fn all_apps_results(&self, limit: usize) -> Vec<SearchResult> {
        let mut apps = self.apps.clone();
        apps.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
        });
        apps.into_iter()
            .take(limit)
            .map(|app| SearchResult {
                app,
                relevance_score: 0.0,
                match_type: MatchType::ExactContains,
            })
            .collect()
    }

    /// Rank the snapshot against a query, capped to `limit`
    pub fn search(&mut self, query: &str, limit: usize) -> Vec<SearchResult> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Vec::new();
        }

        let key = (normalized, limit);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(query = %key.0, hits = cached.len(), "Search cache hit");
            return cached.clone();
        }

        let results = self.rank(&key.0, limit);
        tracing::debug!(query = %key.0, hits = results.len(), "Search completed");
        self.cache_insert(key, results.clone());
        results
    }

    /// Drop all cached query results
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.cache_order.clear();
    }

    /// Score every app, exact-prefix partition first, then the rest
    fn rank(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let mut exact_matches = Vec::new();
        let mut partial_matches = Vec::new();

        for app in &self.apps {
            let name = app.display_name.to_lowercase();
            let Some((score, match_type)) = score_match(query, &name) else {
                continue;
            };
            let result = SearchResult {
                app: app.clone(),
                relevance_score: score,
                match_type,
            };
            match match_type {
                MatchType::ExactStart => exact_matches.push(result),
                _ => partial_matches.push(result),
            }
        }

        exact_matches.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        partial_matches.sort_by(|a, b| {
            b.relevance_score
                .total_cmp(&a.relevance_score)
                .then_with(|| a.match_type.cmp(&b.match_type))
                .then_with(|| a.app.display_name.cmp(&b.app.display_name))
        });

        let mut results = exact_matches;
        results.extend(partial_matches);
        results.truncate(limit);
        results
    }

    fn cache_insert(&mut self, key: CacheKey, results: Vec<SearchResult>) {
        // Evict the oldest batch once the cache is full; insertion order,
        // not strict LRU
        if self.cache.len() >= CACHE_SIZE_LIMIT {
            for _ in 0..CACHE_EVICTION_BATCH {
                let Some(oldest) = self.cache_order.pop_front() else {
                    break;
                };
                self.cache.remove(&oldest);
            }
        }
        if self.cache.insert(key.clone(), results).is_none() {
            self.cache_order.push_back(key);
        }
    }
}

/// Score one lowercased app name against a normalized query
///
/// Returns None when the app should be excluded from results.
fn score_match(query: &str, name: &str) -> Option<(f64, MatchType)> {
    if name == query {
        return Some((1.0, MatchType::ExactStart));
    }
    if name.starts_with(query) {
        return Some((0.9, MatchType::ExactStart));
    }
    if name.contains(query) {
        return Some((0.7, MatchType::ExactContains));
    }

    let acronym = acronym_score(query, name);
    if acronym > 0.0 {
        return Some((0.6 + acronym * 0.1, MatchType::AcronymMatch));
    }

    let fuzzy = fuzzy_score(query, name);
    if fuzzy > 0.5 {
        return Some((fuzzy * 0.5, MatchType::FuzzyMatch));
    }

    None
}

/// Match the query against the initials of a multi-word name
///
/// Tiers: exact 1.0, prefix 0.8, contains 0.6, otherwise no match.
fn acronym_score(query: &str, name: &str) -> f64 {
    let words: Vec<&str> = name
        .split([' ', '-', '_', '.'])
        .filter(|w| !w.is_empty())
        .collect();
    if words.len() < 2 {
        return 0.0;
    }

    let acronym: String = words.iter().filter_map(|w| w.chars().next()).collect();
    if acronym == query {
        1.0
    } else if acronym.starts_with(query) {
        0.8
    } else if acronym.contains(query) {
        0.6
    } else {
        0.0
    }
}

/// Normalized edit-distance similarity in [0, 1]
fn fuzzy_score(query: &str, name: &str) -> f64 {
    let max_len = query.chars().count().max(name.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(query, name) as f64 / max_len as f64
}

/// Classic edit distance (insert/delete/substitute, cost 1 each)
///
/// Two-row dynamic programming over full strings.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev_row: Vec<usize> = (0..=b_len).collect();
    let mut curr_row: Vec<usize> = vec![0; b_len + 1];

    for i in 1..=a_len {
        curr_row[0] = i;
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr_row[j] = std::cmp::min(
                std::cmp::min(
                    prev_row[j] + 1,     // deletion
                    curr_row[j - 1] + 1, // insertion
                ),
                prev_row[j - 1] + cost, // substitution
            );
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::Mutex;

    struct FakeCatalog {
        apps: Mutex<Vec<InstalledApp>>,
        fail: bool,
    }

    impl FakeCatalog {
        fn with_names(names: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                apps: Mutex::new(names.iter().map(|n| app(n)).collect()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                apps: Mutex::new(Vec::new()),
                fail: true,
            })
        }
    }

    impl AppCatalog for FakeCatalog {
        fn installed_apps(&self) -> Result<Vec<InstalledApp>> {
            if self.fail {
                anyhow::bail!("package registry offline");
            }
            Ok(self.apps.lock().unwrap().clone())
        }

        fn is_installed(&self, package_name: &str) -> bool {
            self.apps
                .lock()
                .unwrap()
                .iter()
                .any(|a| a.package_name == package_name)
        }
    }

    fn app(name: &str) -> InstalledApp {
        InstalledApp {
            package_name: format!("org.example.{}", name.replace(' ', "")),
            display_name: name.to_string(),
            icon: None,
            is_launchable: true,
            is_system_app: false,
        }
    }

    fn engine_with(names: &[&str]) -> SearchEngine {
        let mut engine = SearchEngine::new(FakeCatalog::with_names(names));
        engine.initialize().unwrap();
        engine
    }

    #[test]
    fn levenshtein_is_zero_iff_equal() {
        assert_eq!(levenshtein_distance("gmail", "gmail"), 0);
        assert_ne!(levenshtein_distance("gmail", "gmai"), 0);
        assert_eq!(levenshtein_distance("", ""), 0);
    }

    #[test]
    fn levenshtein_is_symmetric() {
        for (a, b) in [("kitten", "sitting"), ("maps", "gaps"), ("", "abc")] {
            assert_eq!(levenshtein_distance(a, b), levenshtein_distance(b, a));
        }
    }

    #[test]
    fn levenshtein_known_distances() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("maps", "gaps"), 1);
    }

    #[test]
    fn scoring_is_monotonic_across_tiers() {
        let name = "gmail";
        let (exact, _) = score_match("gmail", name).unwrap();
        let (prefix, _) = score_match("gma", name).unwrap();
        let (contains, _) = score_match("mai", name).unwrap();
        let (fuzzy, fuzzy_type) = score_match("gmial", name).unwrap();

        assert!(exact >= prefix);
        assert!(prefix >= contains);
        assert!(contains >= fuzzy);
        assert_eq!(fuzzy_type, MatchType::FuzzyMatch);
    }

    #[test]
    fn acronym_matches_initials() {
        assert_eq!(acronym_score("gm", "google maps"), 1.0);
        assert_eq!(acronym_score("g", "google maps"), 0.8);
        assert_eq!(acronym_score("m", "google maps"), 0.6);
        assert_eq!(acronym_score("x", "google maps"), 0.0);
        // Single-word names have no acronym
        assert_eq!(acronym_score("g", "gmail"), 0.0);
    }

    #[test]
    fn acronym_splits_on_all_separators() {
        assert_eq!(acronym_score("ndf", "nex-dash_field.pro"), 0.8);
    }

    #[test]
    fn search_gm_ranks_gmail_and_google_maps() {
        let mut engine = engine_with(&["Gmail", "Google Maps", "Calculator", "Terminal"]);
        let results = engine.search("gm", 15);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].app.display_name, "Gmail");
        assert_eq!(results[0].match_type, MatchType::ExactStart);
        assert_eq!(results[1].app.display_name, "Google Maps");
        assert_eq!(results[1].match_type, MatchType::AcronymMatch);
    }

    #[test]
    fn exact_prefix_partition_always_leads() {
        let mut engine = engine_with(&["Alab", "Blab", "Labx"]);
        let results = engine.search("lab", 15);

        assert_eq!(results[0].app.display_name, "Labx");
        // Equal-score substring matches fall back to name order
        assert_eq!(results[1].app.display_name, "Alab");
        assert_eq!(results[2].app.display_name, "Blab");
    }

    #[test]
    fn result_count_never_exceeds_limit() {
        let mut engine = engine_with(&["Mail", "Maps", "Music", "Messages", "Monitor"]);
        for limit in [0, 1, 2, 15] {
            assert!(engine.search("m", limit).len() <= limit);
        }
    }

    #[test]
    fn empty_and_whitespace_queries_return_nothing() {
        let mut engine = engine_with(&["Gmail"]);
        assert!(engine.search("", 15).is_empty());
        assert!(engine.search("   ", 15).is_empty());
        assert!(engine.cache.is_empty());
    }

    #[test]
    fn search_against_unloaded_snapshot_is_empty() {
        let mut engine = SearchEngine::new(FakeCatalog::with_names(&["Gmail"]));
        assert!(engine.search("gmail", 15).is_empty());
    }

    #[test]
    fn all_apps_results_are_sorted_case_insensitively() {
        let engine = engine_with(&["zephyr", "Alpha", "beta"]);
        let results = engine.all_apps_results(15);

        let names: Vec<_> = results.iter().map(|r| r.app.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "zephyr"]);
        assert!(results.iter().all(|r| r.relevance_score == 0.0));
    }

    #[test]
    fn all_apps_results_respect_the_limit() {
        let engine = engine_with(&["A", "B", "C"]);
        assert_eq!(engine.all_apps_results(2).len(), 2);
    }

    #[test]
    fn cache_serves_repeat_queries_unchanged() {
        let mut engine = engine_with(&["Gmail"]);
        let first = engine.search("gmail", 15);

        // Snapshot mutation is invisible until the cache is cleared
        engine.apps.clear();
        assert_eq!(engine.search("gmail", 15), first);

        engine.clear_cache();
        assert!(engine.search("gmail", 15).is_empty());
    }

    #[test]
    fn cache_keys_include_the_limit() {
        let mut engine = engine_with(&["Mail", "Maps"]);
        assert_eq!(engine.search("ma", 1).len(), 1);
        assert_eq!(engine.search("ma", 2).len(), 2);
    }

    #[test]
    fn cache_evicts_the_oldest_batch_when_full() {
        let mut engine = engine_with(&["Gmail"]);
        for i in 0..CACHE_SIZE_LIMIT {
            engine.search(&format!("query{i}"), 15);
        }
        assert_eq!(engine.cache.len(), CACHE_SIZE_LIMIT);

        engine.search("one more", 15);
        assert_eq!(
            engine.cache.len(),
            CACHE_SIZE_LIMIT - CACHE_EVICTION_BATCH + 1
        );
        // The very first query was in the evicted batch
        assert!(!engine.cache.contains_key(&("query0".to_string(), 15)));
    }

    #[test]
    fn initialize_propagates_catalog_failure() {
        let mut engine = SearchEngine::new(FakeCatalog::failing());
        assert!(matches!(
            engine.initialize(),
            Err(SearchError::Catalog(_))
        ));
    }

    #[test]
    fn refresh_picks_up_new_apps_and_drops_cache() {
        let catalog = FakeCatalog::with_names(&["Gmail"]);
        let mut engine = SearchEngine::new(catalog.clone());
        engine.initialize().unwrap();
        assert_eq!(engine.search("ma", 15).len(), 1);

        catalog.apps.lock().unwrap().push(app("Maps"));
        engine.refresh().unwrap();
        assert_eq!(engine.search("ma", 15).len(), 2);
    }
}
