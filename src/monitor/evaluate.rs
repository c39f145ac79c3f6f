use super::types::{SizeResult, Verdict};

/// A target is over its threshold only when strictly larger than it.
pub fn evaluate(result: &SizeResult) -> Verdict {
    Verdict {
        target: result.target.clone(),
        actual_bytes: result.actual_bytes,
        exceeded: result.actual_bytes > result.target.threshold_bytes,
        unreadable_count: result.unreadable_entries.len(),
        root_unreadable: result.root_unreadable,
        complete: result.complete,
    }
}
