//! Pipeline orchestration over a resolved catalog.
//!
//! Kernels are independent units of work: a bounded pool of worker
//! threads pulls them off a shared queue, and outcomes flow back over a
//! channel. Any recoverable failure is caught at this boundary, logged
//! with the kernel identifier, and only skips that kernel. Extracted
//! members ride in self-deleting temp files, so cleanup holds on every
//! path out of an iteration, including cancellation.

pub mod report;

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock};

use log::{error, info, warn};

use crate::archive;
use crate::catalog::{Catalog, PackagePair};
use crate::distro::Distro;
use crate::error::Result;
use crate::fetch;
use crate::generator::{self, GeneratorBinary};
use crate::store::SymbolStore;
use self::report::{FailedKernel, RunReport};

/// Process-wide cancellation flag, checked between pipeline steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

static SIGINT_TOKEN: OnceLock<CancelToken> = OnceLock::new();

extern "C" fn handle_sigint(_signal: libc::c_int) {
    if let Some(token) = SIGINT_TOKEN.get() {
        token.cancel();
    }
}

/// Route SIGINT into a cancellation token. Only the first installation
/// takes effect.
pub fn cancel_on_sigint(token: &CancelToken) {
    if SIGINT_TOKEN.set(token.clone()).is_ok() {
        unsafe {
            libc::signal(libc::SIGINT, handle_sigint as libc::sighandler_t);
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory the `symbol_files/` store is rooted in.
    pub base_dir: PathBuf,
    /// Worker pool size; 1 reproduces strictly sequential processing.
    pub jobs: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            jobs: 1,
        }
    }
}

/// What happened to one kernel.
#[derive(Debug)]
enum KernelOutcome {
    Built { banner: Option<String> },
    SkippedExisting,
    Invalid,
    MissingMember { pattern: String },
    Cancelled,
}

/// Process every kernel in the catalog and write a run report.
pub fn run(
    distro: Distro,
    catalog: &Catalog,
    options: &PipelineOptions,
    cancel: &CancelToken,
) -> Result<RunReport> {
    let os = distro.os_name();
    let store = SymbolStore::open(&options.base_dir);
    // A missing generator would fail every kernel; surface it before any
    // network work as a configuration problem.
    let dwarf2json = generator::find_dwarf2json()?;

    let mut report = RunReport::new(os);
    let queue: Mutex<VecDeque<PackagePair>> =
        Mutex::new(catalog.iter().map(|(_, pair)| pair.clone()).collect());
    let jobs = options.jobs.max(1).min(catalog.len().max(1));

    let (tx, rx) = mpsc::channel();
    std::thread::scope(|scope| {
        for _ in 0..jobs {
            let tx = tx.clone();
            let queue = &queue;
            let store = &store;
            let dwarf2json = &dwarf2json;
            scope.spawn(move || loop {
                let Some(pair) = queue.lock().ok().and_then(|mut q| q.pop_front()) else {
                    break;
                };
                if cancel.is_cancelled() {
                    let _ = tx.send((pair.kernel.clone(), Ok(KernelOutcome::Cancelled)));
                    continue;
                }
                let outcome = process_kernel(distro, &pair, store, dwarf2json, cancel);
                if tx.send((pair.kernel.clone(), outcome)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        for (kernel, outcome) in rx {
            match outcome {
                Ok(KernelOutcome::Built { banner }) => {
                    info!("finished {kernel}");
                    if banner.is_none() {
                        warn!("{kernel}: no banner recovered");
                    }
                    report.built.push(kernel);
                }
                Ok(KernelOutcome::SkippedExisting) => {
                    warn!("ISF already exists for {kernel}");
                    report.skipped_existing.push(kernel);
                }
                Ok(KernelOutcome::Invalid) => {
                    report.invalid.push(kernel);
                }
                Ok(KernelOutcome::MissingMember { pattern }) => {
                    warn!("{kernel}: no member matching '{pattern}'");
                    report.missing_member.push(kernel);
                }
                Ok(KernelOutcome::Cancelled) => {
                    report.cancelled = true;
                }
                Err(e) => {
                    error!("could not process {kernel}: {e}");
                    report.failed.push(FailedKernel {
                        kernel,
                        reason: e.to_string(),
                    });
                }
            }
        }
    });

    if cancel.is_cancelled() {
        report.cancelled = true;
    }
    report.finished_at_utc = report::now_utc_compact();
    report::write_report(&store.os_dir(os), &report)?;
    Ok(report)
}

/// Run the full pipeline for one kernel.
///
/// Temp files for the extracted members are dropped (and deleted) when
/// this returns, whatever the outcome.
fn process_kernel(
    distro: Distro,
    pair: &PackagePair,
    store: &SymbolStore,
    dwarf2json: &GeneratorBinary,
    cancel: &CancelToken,
) -> Result<KernelOutcome> {
    let os = distro.os_name();
    let kernel = &pair.kernel;

    // Idempotent skip: an already-published kernel costs no network calls.
    if store.is_complete(os, kernel) {
        return Ok(KernelOutcome::SkippedExisting);
    }
    std::fs::create_dir_all(store.kernel_dir(os, kernel))?;

    if !fetch::validate_links(pair)? {
        return Ok(KernelOutcome::Invalid);
    }
    if cancel.is_cancelled() {
        return Ok(KernelOutcome::Cancelled);
    }

    info!("processing files for {kernel}");
    let map_pattern = distro.map_pattern(kernel);
    let Some(system_map) = archive::extract_member(&pair.kernel_url, &map_pattern)? else {
        return Ok(KernelOutcome::MissingMember {
            pattern: map_pattern,
        });
    };
    if cancel.is_cancelled() {
        return Ok(KernelOutcome::Cancelled);
    }

    let image_pattern = distro.image_pattern(kernel);
    let Some(vmlinux) = archive::extract_member(&pair.debug_url, &image_pattern)? else {
        return Ok(KernelOutcome::MissingMember {
            pattern: image_pattern,
        });
    };
    if cancel.is_cancelled() {
        return Ok(KernelOutcome::Cancelled);
    }

    let isf = dwarf2json.run(&system_map.path, &vmlinux.path)?;

    // Banner recovery is best-effort and never invalidates the document.
    let banner = generator::extract_banner(&isf);
    match &banner {
        Some(text) => {
            if let Err(e) = store.write_banner(os, kernel, text) {
                warn!("could not write banner for {kernel}: {e}");
            }
        }
        None => warn!("could not recover banner for {kernel}"),
    }

    store.publish_isf(os, kernel, &isf)?;
    Ok(KernelOutcome::Built { banner })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PackagePair;
    use std::fs;
    use tempfile::TempDir;

    fn unreachable_pair(kernel: &str) -> PackagePair {
        // A reserved port on localhost; any contact attempt errors out
        // immediately, proving the skip happened before network work.
        PackagePair::new(
            kernel,
            "http://127.0.0.1:9/kernel.deb".into(),
            "http://127.0.0.1:9/debug.deb".into(),
        )
    }

    #[test]
    fn existing_artifact_skips_without_network() {
        let temp = TempDir::new().unwrap();
        let store = SymbolStore::open(temp.path());
        store.publish_isf("ubuntu", "5.15.0-91-generic", b"{}").unwrap();

        let catalog: Catalog = [unreachable_pair("5.15.0-91-generic")].into_iter().collect();
        let options = PipelineOptions {
            base_dir: temp.path().to_path_buf(),
            jobs: 1,
        };

        // Point the generator at something that exists; it must not run.
        std::env::set_var("DWARF2JSON_BIN", "/bin/sh");
        let report = run(Distro::Ubuntu, &catalog, &options, &CancelToken::new()).unwrap();

        assert_eq!(report.skipped_existing, vec!["5.15.0-91-generic"]);
        assert!(report.built.is_empty());
        assert!(report.failed.is_empty());
    }

    #[test]
    fn cancelled_token_processes_nothing() {
        let temp = TempDir::new().unwrap();
        let catalog: Catalog = [unreachable_pair("6.1.0-13-amd64")].into_iter().collect();
        let options = PipelineOptions {
            base_dir: temp.path().to_path_buf(),
            jobs: 2,
        };
        let cancel = CancelToken::new();
        cancel.cancel();

        std::env::set_var("DWARF2JSON_BIN", "/bin/sh");
        let report = run(Distro::Debian, &catalog, &options, &cancel).unwrap();
        assert!(report.cancelled);
        assert!(report.built.is_empty());
        assert!(!SymbolStore::open(temp.path()).is_complete("debian", "6.1.0-13-amd64"));
    }

    #[test]
    fn unreachable_mirror_is_isolated_per_kernel() {
        let temp = TempDir::new().unwrap();
        let store = SymbolStore::open(temp.path());
        // One kernel already done, one that will fail validation I/O.
        store.publish_isf("ubuntu", "5.15.0-91-generic", b"{}").unwrap();
        let catalog: Catalog = [
            unreachable_pair("5.15.0-91-generic"),
            unreachable_pair("5.15.0-92-generic"),
        ]
        .into_iter()
        .collect();
        let options = PipelineOptions {
            base_dir: temp.path().to_path_buf(),
            jobs: 1,
        };

        std::env::set_var("DWARF2JSON_BIN", "/bin/sh");
        let report = run(Distro::Ubuntu, &catalog, &options, &CancelToken::new()).unwrap();

        // The unreachable kernel fails; the published one still skips.
        assert_eq!(report.skipped_existing, vec!["5.15.0-91-generic"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].kernel, "5.15.0-92-generic");

        // The failed kernel's directory exists but holds no artifact.
        assert!(!store.is_complete("ubuntu", "5.15.0-92-generic"));
        let report_path = store.os_dir("ubuntu").join("run-report.json");
        assert!(fs::metadata(report_path).is_ok());
    }
}
