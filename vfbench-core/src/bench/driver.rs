//! Orchestration loop of a benchmark sweep.
//!
//! A sweep visits label schemes in their configured order, then query sizes,
//! then query files by ascending index. For every query the driver decides,
//! before anything is spawned:
//!
//! 1. an outcome already recorded for the key is kept and the query skipped;
//! 2. with cascading enabled, a `Timeout` recorded for the same query under
//!    the previous label scheme is copied forward without running;
//! 3. otherwise the matcher runs and its outcome is recorded.
//!
//! Matcher failures never abort the sweep. Only store I/O and missing
//! dataset directories do.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::discovery::DatasetLayout;
use super::matcher::{MatchRequest, Matcher};
use super::store::{ResultStore, RunKey};
use super::{BenchError, Outcome};

/// Default wall-clock bound for one matcher run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// What to sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub dataset: String,
    pub database_folder: PathBuf,
    /// Ordered label schemes. Empty means every scheme directory on disk.
    pub label_schemes: Vec<String>,
    /// Query sizes. Empty means every size directory on disk.
    pub query_sizes: Vec<u32>,
    pub query_suffix: String,
    /// Copy a predecessor scheme's timeout forward instead of running.
    pub cascade_timeouts: bool,
    pub timeout: Duration,
}

impl SweepConfig {
    pub fn new(dataset: impl Into<String>, database_folder: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            database_folder: database_folder.into(),
            label_schemes: Vec::new(),
            query_sizes: Vec::new(),
            query_suffix: ".graph".to_string(),
            cascade_timeouts: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A single query scheduled by [`Driver::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRun {
    pub key: RunKey,
    pub query: PathBuf,
    pub target: PathBuf,
    /// Label scheme preceding this one when cascading is enabled.
    pub predecessor: Option<String>,
}

/// Progress notifications emitted while sweeping.
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    AlreadyRecorded {
        key: &'a RunKey,
    },
    CascadeSkipped {
        key: &'a RunKey,
        predecessor: &'a str,
    },
    Started {
        key: &'a RunKey,
        query: &'a Path,
    },
    Finished {
        key: &'a RunKey,
        outcome: &'a Outcome,
    },
}

/// Counters for a finished sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Matcher invocations.
    pub executed: usize,
    pub succeeded: usize,
    /// Invoked runs that failed for a reason other than the timeout.
    pub failed: usize,
    pub timed_out: usize,
    pub skipped_done: usize,
    pub cascaded: usize,
}

impl SweepSummary {
    pub fn total(&self) -> usize {
        self.executed + self.skipped_done + self.cascaded
    }
}

pub struct Driver {
    config: SweepConfig,
    layout: DatasetLayout,
}

impl Driver {
    pub fn new(config: SweepConfig) -> Self {
        let layout = DatasetLayout::new(
            &config.database_folder,
            &config.dataset,
            &config.query_suffix,
        );
        Self { config, layout }
    }

    /// Label schemes in sweep order.
    pub fn label_schemes(&self) -> Result<Vec<String>, BenchError> {
        if !self.layout.root().is_dir() {
            return Err(BenchError::MissingDirectory(self.layout.root().to_path_buf()));
        }
        if self.config.label_schemes.is_empty() {
            self.layout.discover_label_schemes()
        } else {
            Ok(self.config.label_schemes.clone())
        }
    }

    /// Every query the sweep will visit, in order.
    ///
    /// Missing scheme or size directories are logged and skipped.
    pub fn plan(&self) -> Result<Vec<PlannedRun>, BenchError> {
        let schemes = self.label_schemes()?;
        let mut plan = Vec::new();

        for (pos, scheme) in schemes.iter().enumerate() {
            if !self.layout.scheme_dir(scheme).is_dir() {
                tracing::warn!(
                    "Label scheme {} not found under {}, skipping",
                    scheme,
                    self.layout.root().display()
                );
                continue;
            }
            let predecessor = if self.config.cascade_timeouts && pos > 0 {
                Some(schemes[pos - 1].clone())
            } else {
                None
            };
            let target = self.layout.target_file(scheme);
            if !target.is_file() {
                tracing::warn!("Target graph {} does not exist", target.display());
            }

            let sizes = if self.config.query_sizes.is_empty() {
                match self.layout.discover_query_sizes(scheme) {
                    Ok(sizes) => sizes,
                    Err(BenchError::MissingDirectory(dir)) => {
                        tracing::warn!("No query directory {}, skipping", dir.display());
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            } else {
                self.config.query_sizes.clone()
            };

            for size in sizes {
                let queries = match self.layout.discover_queries(scheme, size) {
                    Ok(queries) => queries,
                    Err(BenchError::MissingDirectory(dir)) => {
                        tracing::warn!("No query directory {}, skipping", dir.display());
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                for query in queries {
                    plan.push(PlannedRun {
                        key: RunKey::new(size, query.index, scheme.as_str()),
                        query: query.path,
                        target: target.clone(),
                        predecessor: predecessor.clone(),
                    });
                }
            }
        }

        tracing::debug!("Planned {} queries for {}", plan.len(), self.config.dataset);
        Ok(plan)
    }

    /// Plan and execute a full sweep.
    pub fn sweep(
        &self,
        store: &mut ResultStore,
        matcher: &mut dyn Matcher,
        on_event: impl FnMut(&RunEvent<'_>),
    ) -> Result<SweepSummary, BenchError> {
        let plan = self.plan()?;
        self.execute(&plan, store, matcher, on_event)
    }

    /// Execute a previously computed plan.
    pub fn execute(
        &self,
        plan: &[PlannedRun],
        store: &mut ResultStore,
        matcher: &mut dyn Matcher,
        mut on_event: impl FnMut(&RunEvent<'_>),
    ) -> Result<SweepSummary, BenchError> {
        let mut summary = SweepSummary::default();

        for run in plan {
            let key = &run.key;

            if store.contains(key) {
                tracing::debug!("Already recorded: {}", key);
                summary.skipped_done += 1;
                on_event(&RunEvent::AlreadyRecorded { key });
                continue;
            }

            if let Some(predecessor) = run.predecessor.as_deref() {
                let previous = RunKey::new(key.query_size, key.query_index, predecessor);
                if store.get(&previous).is_some_and(Outcome::is_timeout) {
                    tracing::info!("{}: {} timed out, skipping", key, predecessor);
                    store.record(key.clone(), Outcome::timeout())?;
                    summary.cascaded += 1;
                    on_event(&RunEvent::CascadeSkipped { key, predecessor });
                    continue;
                }
            }

            on_event(&RunEvent::Started {
                key,
                query: &run.query,
            });
            let request = MatchRequest {
                query: &run.query,
                target: &run.target,
                timeout: self.config.timeout,
            };
            let outcome = matcher.run(&request);
            summary.executed += 1;

            match &outcome {
                Outcome::Success {
                    num_sol,
                    running_time,
                    ..
                } => {
                    summary.succeeded += 1;
                    tracing::info!("{}: {} solutions in {:.3}s", key, num_sol, running_time);
                }
                failure if failure.is_timeout() => {
                    summary.timed_out += 1;
                    tracing::info!("{}: timeout", key);
                }
                Outcome::Failure { error_info } => {
                    summary.failed += 1;
                    tracing::info!("{}: failed: {}", key, error_info.trim());
                }
            }

            store.record(key.clone(), outcome.clone())?;
            on_event(&RunEvent::Finished {
                key,
                outcome: &outcome,
            });
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    /// Matcher that answers from a table keyed by (scheme dir, file name).
    #[derive(Default)]
    struct FakeMatcher {
        answers: HashMap<(String, String), Outcome>,
        calls: Vec<PathBuf>,
    }

    impl FakeMatcher {
        fn answer(mut self, scheme: &str, file: &str, outcome: Outcome) -> Self {
            self.answers
                .insert((scheme.to_string(), file.to_string()), outcome);
            self
        }
    }

    impl Matcher for FakeMatcher {
        fn run(&mut self, request: &MatchRequest<'_>) -> Outcome {
            self.calls.push(request.query.to_path_buf());
            let file = request.query.file_name().unwrap().to_string_lossy().to_string();
            // <db>/<dataset>/<scheme>/query_graph/<size>/<file>
            let scheme = request
                .query
                .ancestors()
                .nth(3)
                .and_then(|p| p.file_name())
                .unwrap()
                .to_string_lossy()
                .to_string();
            self.answers
                .get(&(scheme, file))
                .cloned()
                .unwrap_or(Outcome::Success {
                    num_sol: 1,
                    first_solution_time: 0.1,
                    running_time: 0.2,
                })
        }
    }

    fn create_test_database(schemes: &[&str], sizes: &[u32], queries: usize) -> TempDir {
        let dir = TempDir::new().unwrap();
        let layout = DatasetLayout::new(dir.path(), "toy", ".graph");
        for scheme in schemes {
            let target = layout.target_file(scheme);
            fs::create_dir_all(target.parent().unwrap()).unwrap();
            fs::write(&target, "1\n0 a\n0\n").unwrap();
            for &size in sizes {
                let qdir = layout.query_dir(scheme, size);
                fs::create_dir_all(&qdir).unwrap();
                for i in 0..queries {
                    fs::write(qdir.join(format!("q_{}.graph", i)), "1\n0 a\n0\n").unwrap();
                }
            }
        }
        dir
    }

    fn config(db: &TempDir, schemes: &[&str], cascade: bool) -> SweepConfig {
        SweepConfig {
            label_schemes: schemes.iter().map(|s| s.to_string()).collect(),
            query_sizes: vec![8],
            cascade_timeouts: cascade,
            ..SweepConfig::new("toy", db.path())
        }
    }

    #[test]
    fn test_plan_order() {
        let db = create_test_database(&["label_4", "label_2"], &[8, 16], 11);
        let driver = Driver::new(SweepConfig {
            query_sizes: Vec::new(),
            ..config(&db, &["label_4", "label_2"], false)
        });

        let plan = driver.plan().unwrap();
        assert_eq!(plan.len(), 44);
        assert_eq!(plan[0].key, RunKey::new(8, 0, "label_4"));
        assert_eq!(plan[2].key, RunKey::new(8, 2, "label_4"));
        assert_eq!(plan[10].key, RunKey::new(8, 10, "label_4"));
        assert_eq!(plan[11].key, RunKey::new(16, 0, "label_4"));
        assert_eq!(plan[22].key, RunKey::new(8, 0, "label_2"));
        assert!(plan.iter().all(|run| run.predecessor.is_none()));
        assert!(plan[0].target.ends_with("toy/label_4/data_graph/toy.graph"));
    }

    #[test]
    fn test_plan_discovers_schemes() {
        let db = create_test_database(&["label_16", "label_4"], &[8], 1);
        let driver = Driver::new(SweepConfig::new("toy", db.path()));
        let schemes: Vec<String> = driver
            .plan()
            .unwrap()
            .into_iter()
            .map(|run| run.key.label_scheme)
            .collect();
        assert_eq!(schemes, vec!["label_4", "label_16"]);
    }

    #[test]
    fn test_missing_dataset_is_error() {
        let db = TempDir::new().unwrap();
        let driver = Driver::new(SweepConfig::new("absent", db.path()));
        assert!(matches!(driver.plan(), Err(BenchError::MissingDirectory(_))));
    }

    #[test]
    fn test_missing_scheme_and_size_are_skipped() {
        let db = create_test_database(&["a"], &[8], 2);
        let driver = Driver::new(SweepConfig {
            query_sizes: vec![8, 32],
            ..config(&db, &["a", "b"], false)
        });
        assert_eq!(driver.plan().unwrap().len(), 2);
    }

    #[test]
    fn test_resume_is_idempotent() {
        let db = create_test_database(&["a", "b"], &[8], 3);
        let ckpt = db.path().join("results/toy.json");
        let driver = Driver::new(config(&db, &["a", "b"], false));

        let mut matcher = FakeMatcher::default().answer("a", "q_1.graph", Outcome::failure("boom"));
        let mut store = ResultStore::new(&ckpt);
        let first = driver.sweep(&mut store, &mut matcher, |_| {}).unwrap();
        assert_eq!(first.executed, 6);
        assert_eq!(first.failed, 1);
        let before = fs::read_to_string(&ckpt).unwrap();

        let mut again = FakeMatcher::default();
        let mut resumed = ResultStore::load(&ckpt).unwrap();
        let mut events = 0;
        let second = driver
            .sweep(&mut resumed, &mut again, |event| {
                assert!(matches!(event, RunEvent::AlreadyRecorded { .. }));
                events += 1;
            })
            .unwrap();

        assert!(again.calls.is_empty());
        assert_eq!(second.skipped_done, 6);
        assert_eq!(second.executed, 0);
        assert_eq!(events, 6);
        assert_eq!(fs::read_to_string(&ckpt).unwrap(), before);
    }

    #[test]
    fn test_cascade_skips_after_timeout() {
        let db = create_test_database(&["fine", "coarse", "coarsest"], &[8], 2);
        let driver = Driver::new(config(&db, &["fine", "coarse", "coarsest"], true));

        let mut matcher = FakeMatcher::default().answer("fine", "q_1.graph", Outcome::timeout());
        let mut store = ResultStore::new(db.path().join("ckpt.json"));
        let summary = driver.sweep(&mut store, &mut matcher, |_| {}).unwrap();

        assert_eq!(summary.timed_out, 1);
        assert_eq!(summary.cascaded, 2);
        assert_eq!(summary.executed, 4);
        assert!(store.get(&RunKey::new(8, 1, "coarse")).unwrap().is_timeout());
        assert!(store.get(&RunKey::new(8, 1, "coarsest")).unwrap().is_timeout());
        assert!(store.get(&RunKey::new(8, 0, "coarse")).unwrap().is_success());
        assert!(!matcher
            .calls
            .iter()
            .any(|q| q.ends_with("coarse/query_graph/8/q_1.graph")));
    }

    #[test]
    fn test_cascade_uses_recorded_predecessor() {
        let db = create_test_database(&["fine", "coarse"], &[8], 1);
        let ckpt = db.path().join("ckpt.json");
        let mut store = ResultStore::new(&ckpt);
        store
            .record(RunKey::new(8, 0, "fine"), Outcome::timeout())
            .unwrap();

        let driver = Driver::new(config(&db, &["fine", "coarse"], true));
        let mut matcher = FakeMatcher::default();
        let mut events = Vec::new();
        driver
            .sweep(&mut store, &mut matcher, |event| {
                if let RunEvent::CascadeSkipped { predecessor, .. } = event {
                    events.push(predecessor.to_string());
                }
            })
            .unwrap();

        assert!(matcher.calls.is_empty());
        assert_eq!(events, vec!["fine"]);
        assert!(store.get(&RunKey::new(8, 0, "coarse")).unwrap().is_timeout());
    }

    #[test]
    fn test_cascade_disabled_runs_everything() {
        let db = create_test_database(&["fine", "coarse"], &[8], 1);
        let driver = Driver::new(config(&db, &["fine", "coarse"], false));
        let mut matcher = FakeMatcher::default().answer("fine", "q_0.graph", Outcome::timeout());
        let mut store = ResultStore::new(db.path().join("ckpt.json"));
        let summary = driver.sweep(&mut store, &mut matcher, |_| {}).unwrap();

        assert_eq!(summary.cascaded, 0);
        assert_eq!(matcher.calls.len(), 2);
        assert!(store.get(&RunKey::new(8, 0, "coarse")).unwrap().is_success());
    }

    #[test]
    fn test_other_failures_do_not_cascade() {
        let db = create_test_database(&["fine", "coarse"], &[8], 1);
        let driver = Driver::new(config(&db, &["fine", "coarse"], true));
        let mut matcher = FakeMatcher::default().answer(
            "fine",
            "q_0.graph",
            Outcome::driver_error("permission denied"),
        );
        let mut store = ResultStore::new(db.path().join("ckpt.json"));
        let summary = driver.sweep(&mut store, &mut matcher, |_| {}).unwrap();

        assert_eq!(summary.cascaded, 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 1);
    }
}
