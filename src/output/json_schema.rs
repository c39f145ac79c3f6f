use crate::monitor::{Delivery, RunOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub targets: Vec<TargetSummary>,
    pub exceeded_count: usize,
    pub delivery: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSummary {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub threshold_bytes: u64,
    pub threshold: String,
    pub exceeded: bool,
    pub unreadable_entries: usize,
    pub complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    NotDue,
    Sent,
    DryRun,
    Failed,
}

impl RunSummary {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let targets: Vec<TargetSummary> = outcome
            .verdicts
            .iter()
            .map(|v| TargetSummary {
                name: v.target.name.clone(),
                path: v.target.path.clone(),
                size_bytes: v.actual_bytes,
                threshold_bytes: v.target.threshold_bytes,
                threshold: v.target.threshold_label.clone(),
                exceeded: v.exceeded,
                unreadable_entries: v.unreadable_count,
                complete: v.complete,
            })
            .collect();

        let (delivery, delivery_error) = match &outcome.delivery {
            Delivery::NotDue => (DeliveryStatus::NotDue, None),
            Delivery::Sent => (DeliveryStatus::Sent, None),
            Delivery::DryRun => (DeliveryStatus::DryRun, None),
            Delivery::Failed(e) => (DeliveryStatus::Failed, Some(e.clone())),
        };

        Self {
            version: "1.0".to_string(),
            timestamp: Utc::now(),
            exceeded_count: targets.iter().filter(|t| t.exceeded).count(),
            targets,
            delivery,
            delivery_error,
            duration_ms: outcome.duration.as_millis() as u64,
        }
    }
}
