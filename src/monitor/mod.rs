mod evaluate;
mod runner;
mod types;

pub use evaluate::evaluate;
pub use runner::{
    local_hostname, Delivery, Monitor, RunOptions, RunOutcome, RunPhase, RunState,
    EXIT_CONFIG_FAILED, EXIT_SEND_FAILED,
};
pub use types::{
    AccessErrorKind, AlertMessage, Mailer, MonitoredTarget, ScanBudget, SizeResult,
    UnreadableEntry, Verdict,
};
