use crate::error::MailSendError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One configured directory, validated and immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredTarget {
    pub name: String,
    pub path: PathBuf,
    pub threshold_bytes: u64,
    /// Threshold exactly as written in the configuration, e.g. `"1GB"`.
    pub threshold_label: String,
}

impl MonitoredTarget {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, threshold_bytes: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            threshold_bytes,
            threshold_label: threshold_bytes.to_string(),
        }
    }

    pub fn with_threshold_label(mut self, label: impl Into<String>) -> Self {
        self.threshold_label = label.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessErrorKind {
    PermissionDenied,
    NotFound,
    Other,
}

impl From<io::ErrorKind> for AccessErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::PermissionDenied => AccessErrorKind::PermissionDenied,
            io::ErrorKind::NotFound => AccessErrorKind::NotFound,
            _ => AccessErrorKind::Other,
        }
    }
}

impl fmt::Display for AccessErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessErrorKind::PermissionDenied => write!(f, "permission denied"),
            AccessErrorKind::NotFound => write!(f, "not found"),
            AccessErrorKind::Other => write!(f, "other"),
        }
    }
}

/// A filesystem entry the sizer could not account for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnreadableEntry {
    pub path: PathBuf,
    pub kind: AccessErrorKind,
    pub detail: String,
}

impl UnreadableEntry {
    pub fn new(path: impl Into<PathBuf>, kind: AccessErrorKind, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            detail: detail.into(),
        }
    }

    pub fn from_io(path: &Path, err: &io::Error) -> Self {
        Self::new(path, err.kind().into(), err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SizeResult {
    pub target: MonitoredTarget,
    pub actual_bytes: u64,
    pub unreadable_entries: Vec<UnreadableEntry>,
    /// False when the walk was cut short by the scan budget.
    pub complete: bool,
    /// The root itself could not be walked, so nothing below it was counted.
    pub root_unreadable: bool,
}

impl SizeResult {
    pub fn unreadable_root(target: MonitoredTarget, entry: UnreadableEntry) -> Self {
        Self {
            target,
            actual_bytes: 0,
            unreadable_entries: vec![entry],
            complete: true,
            root_unreadable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub target: MonitoredTarget,
    pub actual_bytes: u64,
    pub exceeded: bool,
    pub unreadable_count: usize,
    pub root_unreadable: bool,
    pub complete: bool,
}

impl Verdict {
    pub fn excess_bytes(&self) -> u64 {
        self.actual_bytes.saturating_sub(self.target.threshold_bytes)
    }

    /// Whether `actual_bytes` may understate the real tree size.
    pub fn is_partial(&self) -> bool {
        self.unreadable_count > 0 || !self.complete
    }
}

/// Bounds a run's filesystem work. Clones share the cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct ScanBudget {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl ScanBudget {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_exhausted(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

/// Outbound mail collaborator. Called at most once per run.
pub trait Mailer: Send + Sync {
    fn send(&self, message: &AlertMessage, recipients: &[String]) -> Result<(), MailSendError>;
}
