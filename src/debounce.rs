//! Debounced search-as-you-type worker
//!
//! Each keystroke submits a query; the worker waits out a short window
//! and only ranks the latest one. A newer submission replaces (cancels)
//! the pending task, and a generation token suppresses stale results
//! that finish ranking after the input has already moved on. Ranking
//! runs on the worker thread, never the caller's.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::search::{SearchEngine, SearchError, SearchResult};

/// How long input must pause before a search actually runs
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(150);

enum Command {
    Search {
        query: String,
        limit: usize,
        generation: u64,
    },
    Refresh,
    ClearCache,
    Shutdown,
}

/// Owner of the search engine and its worker thread
///
/// Results arrive through the callback handed to the constructor, as
/// `Ok(results)` or `Err(..)` when the subsystem itself failed - the
/// caller can distinguish "no matches" from "search broke".
pub struct SearchRunner {
    tx: Sender<Command>,
    generation: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl SearchRunner {
    pub fn new(
        engine: SearchEngine,
        on_results: impl Fn(Result<Vec<SearchResult>, SearchError>) + Send + 'static,
    ) -> Self {
        Self::with_debounce(engine, on_results, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(
        mut engine: SearchEngine,
        on_results: impl Fn(Result<Vec<SearchResult>, SearchError>) + Send + 'static,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<Command>();
        let generation = Arc::new(AtomicU64::new(0));
        let current = generation.clone();

        let worker = std::thread::spawn(move || {
            // Single-slot pending task: at most one query waits out the
            // debounce window at a time
            let mut pending: Option<(String, usize, u64)> = None;

            loop {
                let command = if pending.is_some() {
                    match rx.recv_timeout(debounce) {
                        Ok(command) => Some(command),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                } else {
                    match rx.recv() {
                        Ok(command) => Some(command),
                        Err(_) => break,
                    }
                };

                match command {
                    Some(Command::Search {
                        query,
                        limit,
                        generation,
                    }) => {
                        if query.trim().is_empty() {
                            // An emptied input shows the full app list
                            // right away; nothing to debounce
                            pending = None;
                            if generation == current.load(Ordering::SeqCst) {
                                on_results(Ok(engine.all_apps_results(limit)));
                            }
                        } else {
                            pending = Some((query, limit, generation));
                        }
                    }
                    Some(Command::Refresh) => {
                        if let Err(e) = engine.refresh() {
                            tracing::warn!("Search snapshot refresh failed: {e}");
                            on_results(Err(e));
                        }
                    }
                    Some(Command::ClearCache) => engine.clear_cache(),
                    Some(Command::Shutdown) => break,
                    None => {
                        // Window elapsed with no newer input; run the search
                        let Some((query, limit, generation)) = pending.take() else {
                            continue;
                        };
                        if generation != current.load(Ordering::SeqCst) {
                            continue;
                        }
                        let results = engine.search(&query, limit);
                        // Re-check: a newer query may have landed while
                        // ranking ran
                        if generation == current.load(Ordering::SeqCst) {
                            on_results(Ok(results));
                        }
                    }
                }
            }
            tracing::debug!("Search worker stopped");
        });

        Self {
            tx,
            generation,
            worker: Some(worker),
        }
    }

    /// Queue a query, replacing any still-pending one
    pub fn submit(&self, query: &str, limit: usize) -> Result<(), SearchError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx
            .send(Command::Search {
                query: query.to_string(),
                limit,
                generation,
            })
            .map_err(|_| SearchError::WorkerGone)
    }

    /// Re-fetch the installed-app snapshot on the worker
    pub fn refresh(&self) -> Result<(), SearchError> {
        self.tx
            .send(Command::Refresh)
            .map_err(|_| SearchError::WorkerGone)
    }

    /// Drop cached query results on the worker
    pub fn clear_cache(&self) -> Result<(), SearchError> {
        self.tx
            .send(Command::ClearCache)
            .map_err(|_| SearchError::WorkerGone)
    }

    /// Cancel pending work and stop the worker thread
    pub fn shutdown(&mut self) {
        // Invalidate anything still pending before the worker sees Shutdown
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for SearchRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AppCatalog;
    use crate::data::InstalledApp;
    use anyhow::Result;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;

    struct FakeCatalog {
        apps: Mutex<Vec<InstalledApp>>,
        fail: AtomicBool,
    }

    impl FakeCatalog {
        fn with_names(names: &[&str]) -> Arc<Self> {
            let apps = names
                .iter()
                .map(|n| InstalledApp {
                    package_name: format!("org.example.{n}"),
                    display_name: n.to_string(),
                    icon: None,
                    is_launchable: true,
                    is_system_app: false,
                })
                .collect();
            Arc::new(Self {
                apps: Mutex::new(apps),
                fail: AtomicBool::new(false),
            })
        }
    }

    impl AppCatalog for FakeCatalog {
        fn installed_apps(&self) -> Result<Vec<InstalledApp>> {
            if self.fail.load(Ordering::SeqCst) {
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

    fn runner_with(
        names: &[&str],
        debounce: Duration,
    ) -> (
        SearchRunner,
        mpsc::Receiver<Result<Vec<SearchResult>, SearchError>>,
        Arc<FakeCatalog>,
    ) {
        let catalog = FakeCatalog::with_names(names);
        let mut engine = SearchEngine::new(catalog.clone());
        engine.initialize().unwrap();

        let (tx, rx) = mpsc::channel();
        let runner = SearchRunner::with_debounce(
            engine,
            move |outcome| {
                let _ = tx.send(outcome);
            },
            debounce,
        );
        (runner, rx, catalog)
    }

    #[test]
    fn only_the_latest_submission_is_searched() {
        let (runner, rx, _) = runner_with(&["alpha", "alphabet", "beta"], Duration::from_millis(100));

        runner.submit("a", 15).unwrap();
        runner.submit("al", 15).unwrap();
        runner.submit("alpha", 15).unwrap();

        let outcome = rx.recv_timeout(Duration::from_secs(2)).unwrap().unwrap();
        assert_eq!(outcome[0].app.display_name, "alpha");
        assert_eq!(outcome[0].relevance_score, 1.0);

        // The replaced submissions never produce a delivery
        assert!(rx.recv_timeout(Duration::from_millis(250)).is_err());
    }

    #[test]
    fn empty_query_delivers_the_full_app_list() {
        let (runner, rx, _) = runner_with(&["beta", "alpha"], Duration::from_millis(100));

        runner.submit("", 15).unwrap();
        let outcome = rx.recv_timeout(Duration::from_secs(2)).unwrap().unwrap();

        let names: Vec<_> = outcome.iter().map(|r| r.app.display_name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn empty_query_cancels_a_pending_search() {
        let (runner, rx, _) = runner_with(&["alpha"], Duration::from_millis(200));

        runner.submit("alpha", 15).unwrap();
        runner.submit("", 15).unwrap();

        // Only the all-apps delivery arrives; the pending search was replaced
        let outcome = rx.recv_timeout(Duration::from_secs(2)).unwrap().unwrap();
        assert_eq!(outcome.len(), 1);
        assert!(rx.recv_timeout(Duration::from_millis(350)).is_err());
    }

    #[test]
    fn refresh_failure_is_reported_as_an_error() {
        let (runner, rx, catalog) = runner_with(&["alpha"], Duration::from_millis(20));

        catalog.fail.store(true, Ordering::SeqCst);
        runner.refresh().unwrap();

        let outcome = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(outcome, Err(SearchError::Catalog(_))));
    }

    #[test]
    fn refresh_sees_catalog_changes() {
        let (runner, rx, catalog) = runner_with(&["alpha"], Duration::from_millis(20));

        catalog.apps.lock().unwrap().push(InstalledApp {
            package_name: "org.example.alpine".into(),
            display_name: "alpine".into(),
            icon: None,
            is_launchable: true,
            is_system_app: false,
        });
        runner.refresh().unwrap();
        runner.submit("alp", 15).unwrap();

        let outcome = rx.recv_timeout(Duration::from_secs(2)).unwrap().unwrap();
        assert_eq!(outcome.len(), 2);
    }

    #[test]
    fn submit_after_shutdown_reports_worker_gone() {
        let (mut runner, _rx, _) = runner_with(&["alpha"], Duration::from_millis(20));
        runner.shutdown();
        assert!(matches!(
            runner.submit("alpha", 15),
            Err(SearchError::WorkerGone)
        ));
    }

    #[test]
    fn drop_joins_the_worker_without_hanging() {
        let (runner, _rx, _) = runner_with(&["alpha"], Duration::from_millis(20));
        runner.submit("alpha", 15).unwrap();
        drop(runner);
    }
}
