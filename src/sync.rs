//! Sync Engine - Orchestrates sequential repository synchronization
//!
//! For every selected repository the engine prints a progress line, decides
//! whether to clone it or update the existing checkout, and hands the
//! resulting command to a [`CommandRunner`]. Repositories are processed one
//! at a time; the first fatal command error aborts the run.

use path_clean::PathClean;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{MirrorError, Result};
use crate::report::Reporter;
use crate::repository::Repository;
use crate::runner::{CommandOutcome, CommandRunner};

/// Command used to update an existing checkout
pub const REBASE_PULL_COMMAND: &str = "git pull --rebase";

/// Per-run switches taken from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub stop_on_error: bool,
    pub dont_rebase: bool,
}

/// What to do with one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    /// No local checkout yet
    Clone { ssh_url: String },
    /// Existing checkout, replay local commits on top of upstream
    RebasePull,
    /// Existing checkout left untouched
    Skip,
}

/// A decision bound to the directory its command runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub target: PathBuf,
    pub working_dir: PathBuf,
    pub decision: SyncDecision,
}

impl SyncPlan {
    /// Shell command for this plan, if any
    pub fn command(&self) -> Option<String> {
        match &self.decision {
            SyncDecision::Clone { ssh_url } => Some(format!("git clone {}", ssh_url)),
            SyncDecision::RebasePull => Some(REBASE_PULL_COMMAND.to_string()),
            SyncDecision::Skip => None,
        }
    }
}

/// Position of a repository within the run, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub index: usize,
    pub total: usize,
}

impl Progress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.index as f64 / self.total as f64 * 100.0
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:.2}%)", self.index, self.total, self.percentage())
    }
}

/// Results from a complete sync operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSummary {
    pub total: usize,
    pub cloned: usize,
    pub updated: usize,
    pub skipped: usize,
    pub tolerated: usize,
    pub dry_run: bool,
    pub duration: Duration,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.dry_run { "Dry run: " } else { "" };
        write!(
            f,
            "{}{} repos in {:.2}s: {} cloned, {} updated, {} skipped, {} tolerated errors",
            prefix,
            self.total,
            self.duration.as_secs_f64(),
            self.cloned,
            self.updated,
            self.skipped,
            self.tolerated
        )
    }
}

/// Drives the per-repository clone/update sequence
pub struct SyncEngine<R> {
    runner: R,
    base_dir: PathBuf,
    options: SyncOptions,
    reporter: Reporter,
}

impl<R: CommandRunner> SyncEngine<R> {
    /// Create an engine that syncs into the current working directory
    pub fn new(runner: R, options: SyncOptions, reporter: Reporter) -> Result<Self> {
        let base_dir = std::env::current_dir().map_err(|e| MirrorError::io(".", e))?;
        Ok(Self::with_base_dir(runner, base_dir, options, reporter))
    }

    pub fn with_base_dir(
        runner: R,
        base_dir: impl Into<PathBuf>,
        options: SyncOptions,
        reporter: Reporter,
    ) -> Self {
        Self {
            runner,
            base_dir: base_dir.into().clean(),
            options,
            reporter,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Decide what to do with `repository` given the current filesystem
    pub fn plan(&self, repository: &Repository) -> SyncPlan {
        let target = self.base_dir.join(&repository.name).clean();

        if target.is_dir() {
            let decision = if self.options.dont_rebase {
                SyncDecision::Skip
            } else {
                SyncDecision::RebasePull
            };
            SyncPlan {
                working_dir: target.clone(),
                target,
                decision,
            }
        } else {
            SyncPlan {
                target,
                working_dir: self.base_dir.clone(),
                decision: SyncDecision::Clone {
                    ssh_url: repository.ssh_url.clone(),
                },
            }
        }
    }

    /// Sync every repository in order
    pub async fn run(&self, repositories: &[Repository]) -> Result<SyncSummary> {
        let start_time = Instant::now();
        let mut summary = SyncSummary {
            total: repositories.len(),
            dry_run: self.options.dry_run,
            ..SyncSummary::default()
        };

        info!(
            "Syncing {} repositories into {}",
            repositories.len(),
            self.base_dir.display()
        );

        for (i, repository) in repositories.iter().enumerate() {
            let progress = Progress {
                index: i + 1,
                total: repositories.len(),
            };
            self.reporter
                .progress(format!("{}: {}", progress, repository.name));

            let plan = self.plan(repository);
            debug!("{}: {:?} in {}", repository.name, plan.decision, plan.working_dir.display());

            let Some(command) = plan.command() else {
                summary.skipped += 1;
                continue;
            };

            if self.options.dry_run {
                self.reporter.command(&format!("[dry run] {}", command));
            } else {
                let outcome = self
                    .runner
                    .run(&command, &plan.working_dir, self.options.stop_on_error)
                    .await?;
                if let CommandOutcome::Tolerated(_) = outcome {
                    summary.tolerated += 1;
                }
            }

            match plan.decision {
                SyncDecision::Clone { .. } => summary.cloned += 1,
                SyncDecision::RebasePull => summary.updated += 1,
                SyncDecision::Skip => {}
            }
        }

        summary.duration = start_time.elapsed();
        info!("Sync completed: {}", summary);
        Ok(summary)
    }
}
