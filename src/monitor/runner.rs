use super::evaluate::evaluate;
use super::types::{Mailer, MonitoredTarget, ScanBudget, SizeResult, Verdict};
use crate::report::{compose, Report};
use crate::scanner::measure;
use crate::units::format_size;
use chrono::Local;
use rayon::prelude::*;
use std::fmt;
use std::time::{Duration, Instant};

pub const EXIT_CONFIG_FAILED: u8 = 1;
pub const EXIT_SEND_FAILED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    LoadingConfig,
    Scanning,
    Evaluating,
    NoAlert,
    ComposingReport,
    Sending,
    Sent,
    SendFailed,
    Done,
}

impl RunPhase {
    pub fn can_advance_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Idle, LoadingConfig)
                | (LoadingConfig, Scanning)
                | (LoadingConfig, Done)
                | (Scanning, Evaluating)
                | (Evaluating, NoAlert)
                | (Evaluating, ComposingReport)
                | (ComposingReport, Sending)
                | (ComposingReport, Done)
                | (Sending, Sent)
                | (Sending, SendFailed)
                | (NoAlert, Done)
                | (Sent, Done)
                | (SendFailed, Done)
        )
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks one run's progress. Every run starts from `Idle`.
#[derive(Debug, Clone)]
pub struct RunState {
    history: Vec<RunPhase>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            history: vec![RunPhase::Idle],
        }
    }

    pub fn phase(&self) -> RunPhase {
        *self.history.last().unwrap_or(&RunPhase::Idle)
    }

    pub fn advance(&mut self, next: RunPhase) {
        let current = self.phase();
        if current.can_advance_to(next) {
            tracing::debug!(from = %current, to = %next, "Run phase");
        } else {
            tracing::warn!(from = %current, to = %next, "Unexpected run phase transition");
        }
        self.history.push(next);
    }

    pub fn history(&self) -> &[RunPhase] {
        &self.history
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    NotDue,
    Sent,
    DryRun,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub parallel: bool,
    pub threads: usize,
    pub budget: ScanBudget,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub verdicts: Vec<Verdict>,
    pub report: Option<Report>,
    pub delivery: Delivery,
    pub duration: Duration,
}

impl RunOutcome {
    pub fn exit_status(&self) -> u8 {
        match self.delivery {
            Delivery::Failed(_) => EXIT_SEND_FAILED,
            _ => 0,
        }
    }
}

pub struct Monitor<'a> {
    targets: &'a [MonitoredTarget],
    recipients: &'a [String],
    mailer: &'a dyn Mailer,
    hostname: String,
    options: RunOptions,
}

impl<'a> Monitor<'a> {
    pub fn new(
        targets: &'a [MonitoredTarget],
        recipients: &'a [String],
        mailer: &'a dyn Mailer,
        options: RunOptions,
    ) -> Self {
        Self {
            targets,
            recipients,
            mailer,
            hostname: local_hostname(),
            options,
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Scans, evaluates, and mails at most one report. `state` must have
    /// finished loading configuration.
    pub fn run(&self, state: &mut RunState) -> RunOutcome {
        let start = Instant::now();

        state.advance(RunPhase::Scanning);
        let results = self.scan_all();

        state.advance(RunPhase::Evaluating);
        let verdicts: Vec<Verdict> = results.iter().map(|r| self.judge(r)).collect();

        let report = compose(&verdicts, Local::now(), &self.hostname);
        let delivery = match &report {
            None => {
                state.advance(RunPhase::NoAlert);
                tracing::info!(
                    targets = verdicts.len(),
                    "No thresholds exceeded; no report sent"
                );
                Delivery::NotDue
            }
            Some(report) => {
                state.advance(RunPhase::ComposingReport);
                let message = report.to_message();
                if self.options.dry_run {
                    tracing::info!(
                        exceeded = report.lines.len(),
                        "Dry run; report composed but not sent"
                    );
                    Delivery::DryRun
                } else {
                    state.advance(RunPhase::Sending);
                    match self.mailer.send(&message, self.recipients) {
                        Ok(()) => {
                            state.advance(RunPhase::Sent);
                            tracing::info!(
                                exceeded = report.lines.len(),
                                recipients = ?self.recipients,
                                "Report sent"
                            );
                            Delivery::Sent
                        }
                        Err(e) => {
                            state.advance(RunPhase::SendFailed);
                            tracing::error!(
                                error = %e,
                                exceeded = report.lines.len(),
                                "Failed to send report"
                            );
                            Delivery::Failed(e.to_string())
                        }
                    }
                }
            }
        };

        state.advance(RunPhase::Done);

        RunOutcome {
            verdicts,
            report,
            delivery,
            duration: start.elapsed(),
        }
    }

    /// One result slot per target, in configuration order.
    fn scan_all(&self) -> Vec<SizeResult> {
        let budget = &self.options.budget;
        let scan_parallel = || -> Vec<SizeResult> {
            self.targets
                .par_iter()
                .map(|target| measure(target, budget))
                .collect()
        };

        if !self.options.parallel || self.targets.len() < 2 {
            return self
                .targets
                .iter()
                .map(|target| measure(target, budget))
                .collect();
        }

        if self.options.threads == 0 {
            return scan_parallel();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads)
            .build()
        {
            Ok(pool) => pool.install(scan_parallel),
            Err(e) => {
                tracing::warn!(error = %e, "Could not build scan thread pool; using the global pool");
                scan_parallel()
            }
        }
    }

    fn judge(&self, result: &SizeResult) -> Verdict {
        for entry in &result.unreadable_entries {
            tracing::warn!(
                target_name = %result.target.name,
                path = %entry.path.display(),
                kind = %entry.kind,
                detail = %entry.detail,
                "Could not read entry"
            );
        }

        let verdict = evaluate(result);
        tracing::info!(
            target_name = %verdict.target.name,
            path = %verdict.target.path.display(),
            actual = %format_size(verdict.actual_bytes),
            threshold = %verdict.target.threshold_label,
            exceeded = verdict.exceeded,
            partial = verdict.is_partial(),
            "Checked directory"
        );
        verdict
    }
}

pub fn local_hostname() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_string())
}
