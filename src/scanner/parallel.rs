//! Scan scheduler: sequential tree walk feeding a bounded pool of workers,
//! with all findings funneled through a single aggregation loop.

use anyhow::{Context, Result};
use crossbeam::channel::{bounded, Receiver, Sender};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;

use super::core::Scanner;
use super::types::{Finding, ScanReport, Statistics};

impl Scanner {
    /// Walk the tree under `root`, fan eligible files out to a worker pool,
    /// and fan findings back in through one aggregation task.
    ///
    /// Returns only after the walk has completed, every dispatched file has
    /// been parsed, and the result queue has been fully drained. Statistics
    /// are computed from the final state, never incrementally.
    pub fn scan(&self, root: &Path) -> Result<ScanReport> {
        let files = self.collect_files(root)?;
        let files_found = files.len();

        let workers = num_cpus::get().min(files_found.max(1));
        let (work_tx, work_rx): (Sender<PathBuf>, Receiver<PathBuf>) = bounded(workers * 2);
        let (result_tx, result_rx): (Sender<Vec<Finding>>, Receiver<Vec<Finding>>) =
            bounded(workers * 4);

        let scanned_counter = AtomicUsize::new(0);
        let scanned = &scanned_counter;

        let findings = crossbeam::thread::scope(|s| {
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                s.spawn(move |_| {
                    while let Ok(path) = work_rx.recv() {
                        if let Some(found) = self.parse_file(&path) {
                            scanned.fetch_add(1, Ordering::Relaxed);
                            if !found.is_empty() && result_tx.send(found).is_err() {
                                break;
                            }
                        }
                    }
                });
            }

            // producer: feed the pool; backpressure comes from the bounded
            // channel
            s.spawn(move |_| {
                for path in files {
                    if work_tx.send(path).is_err() {
                        break;
                    }
                }
            });

            // the workers hold the only remaining senders; the drain below
            // ends once they all finish
            drop(result_tx);
            drop(work_rx);

            let mut all = Vec::new();
            for batch in result_rx {
                all.extend(batch);
            }
            all
        })
        .map_err(|_| anyhow::anyhow!("scan worker panicked"))?;

        let statistics = Statistics {
            files_found,
            files_scanned: scanned_counter.load(Ordering::Relaxed),
            results_found: findings.len(),
        };

        Ok(ScanReport {
            findings,
            statistics,
        })
    }

    /// Sequential walk collecting the regular files to scan. Ignore-listed
    /// names are skipped with their whole subtree, as are test directories
    /// when tests are excluded.
    fn collect_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        std::fs::metadata(root)
            .with_context(|| format!("Cannot scan {}", root.display()))?;

        let exclude_tests = self.config.exclude_tests;
        let config = self.config.clone();
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                let name = entry.file_name().to_string_lossy();
                if config.is_ignored(&name) {
                    return false;
                }
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(exclude_tests && is_dir && config.is_test_directory(&name))
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|t| t.is_file()) {
                        files.push(entry.into_path());
                    }
                }
                Err(err) => warn!("walk error under {}: {err}", root.display()),
            }
        }

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::scanner::types::FindingKind;
    use std::fs;
    use tempfile::TempDir;

    fn scanner_with(f: impl FnOnce(&mut Config)) -> Scanner {
        let mut config = Config::load(None).unwrap();
        f(&mut config);
        Scanner::new(&config).unwrap()
    }

    fn populate(dir: &TempDir) {
        fs::write(
            dir.path().join("main.go"),
            "package main\n\nvar internalSecret = \"asdfasdfasdf\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "password: supersecret123\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "nothing to see\n").unwrap();
        fs::write(dir.path().join("image.bin"), [0u8, 159, 146, 150]).unwrap();

        fs::create_dir(dir.path().join("testdata")).unwrap();
        fs::write(
            dir.path().join("testdata").join("fixture.yaml"),
            "password: supersecret123\n",
        )
        .unwrap();

        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join(".git").join("leak.yaml"),
            "password: supersecret123\n",
        )
        .unwrap();
    }

    #[test]
    fn scan_counts_and_findings() {
        let dir = TempDir::new().unwrap();
        populate(&dir);

        let scanner = scanner_with(|_| {});
        let report = scanner.scan(dir.path()).unwrap();

        // .git is ignored entirely; image.bin matches no parser
        assert_eq!(report.statistics.files_found, 5);
        assert_eq!(report.statistics.files_scanned, 4);
        assert_eq!(report.statistics.results_found, report.findings.len());

        let kinds: Vec<_> = {
            let mut k: Vec<_> = report.findings.iter().map(|f| f.kind).collect();
            k.sort_by_key(|k| k.label());
            k
        };
        assert_eq!(
            kinds,
            vec![FindingKind::GoVariable, FindingKind::YamlVariable, FindingKind::YamlVariable]
        );
    }

    #[test]
    fn test_directories_skipped_when_excluded() {
        let dir = TempDir::new().unwrap();
        populate(&dir);

        let scanner = scanner_with(|c| c.exclude_tests = true);
        let report = scanner.scan(dir.path()).unwrap();

        assert_eq!(report.statistics.files_found, 4);
        assert!(!report
            .findings
            .iter()
            .any(|f| f.file.contains("testdata")));
    }

    #[test]
    fn scan_is_idempotent() {
        let dir = TempDir::new().unwrap();
        populate(&dir);

        let scanner = scanner_with(|_| {});
        let mut first = scanner.scan(dir.path()).unwrap();
        let mut second = scanner.scan(dir.path()).unwrap();

        let key = |f: &Finding| (f.file.clone(), f.line, f.name.clone(), f.value.clone());
        first.findings.sort_by_key(key);
        second.findings.sort_by_key(key);

        assert_eq!(first.findings.len(), second.findings.len());
        for (a, b) in first.findings.iter().zip(second.findings.iter()) {
            assert_eq!(key(a), key(b));
            assert_eq!(a.kind, b.kind);
        }
    }

    #[test]
    fn missing_root_fails() {
        let scanner = scanner_with(|_| {});
        assert!(scanner.scan(Path::new("/nonexistent/surely")).is_err());
    }

    #[test]
    fn empty_tree_scans_cleanly() {
        let dir = TempDir::new().unwrap();
        let scanner = scanner_with(|_| {});
        let report = scanner.scan(dir.path()).unwrap();
        assert_eq!(report.statistics.files_found, 0);
        assert_eq!(report.statistics.results_found, 0);
    }
}
