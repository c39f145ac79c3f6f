use crate::monitor::{AlertMessage, Verdict};
use crate::units::format_size;
use chrono::{DateTime, Local};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub name: String,
    pub path: PathBuf,
    pub actual_bytes: u64,
    pub threshold_bytes: u64,
    pub threshold_label: String,
    pub excess_bytes: u64,
}

/// A target whose size is a lower bound because part of it was unreadable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanNote {
    pub name: String,
    pub path: PathBuf,
    pub unreadable_count: usize,
    pub root_unreadable: bool,
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub hostname: String,
    pub lines: Vec<ReportLine>,
    pub scan_notes: Vec<ScanNote>,
}

/// Builds the alert for a run, or `None` when nothing exceeded its threshold.
///
/// Lines keep the order of `verdicts`, which is the configuration order.
pub fn compose(verdicts: &[Verdict], generated_at: DateTime<Local>, hostname: &str) -> Option<Report> {
    let lines: Vec<ReportLine> = verdicts
        .iter()
        .filter(|v| v.exceeded)
        .map(|v| ReportLine {
            name: v.target.name.clone(),
            path: v.target.path.clone(),
            actual_bytes: v.actual_bytes,
            threshold_bytes: v.target.threshold_bytes,
            threshold_label: v.target.threshold_label.clone(),
            excess_bytes: v.excess_bytes(),
        })
        .collect();

    if lines.is_empty() {
        return None;
    }

    let scan_notes = verdicts
        .iter()
        .filter(|v| v.is_partial() || v.root_unreadable)
        .map(|v| ScanNote {
            name: v.target.name.clone(),
            path: v.target.path.clone(),
            unreadable_count: v.unreadable_count,
            root_unreadable: v.root_unreadable,
            complete: v.complete,
        })
        .collect();

    Some(Report {
        generated_at,
        hostname: hostname.to_string(),
        lines,
        scan_notes,
    })
}

impl Report {
    pub fn subject(&self) -> String {
        format!(
            "Directory Size Alert on {} - {}",
            self.hostname,
            self.generated_at.format("%Y-%m-%d %H:%M")
        )
    }

    pub fn render(&self) -> String {
        let mut txt = String::new();
        txt.push_str("The following directories have exceeded their size thresholds:\n\n");

        for line in &self.lines {
            txt.push_str(&format!(
                "Directory: {} ({})\n",
                line.name,
                line.path.display()
            ));
            txt.push_str(&format!("Current Size: {}\n", format_size(line.actual_bytes)));
            txt.push_str(&format!("Threshold: {}\n", line.threshold_label));
            txt.push_str(&format!("Exceeded by: {}\n\n", format_size(line.excess_bytes)));
        }

        if !self.scan_notes.is_empty() {
            txt.push_str(
                "The following directories could not be fully scanned; their sizes are lower bounds:\n\n",
            );
            for note in &self.scan_notes {
                txt.push_str(&format!(
                    "Directory: {} ({})\n",
                    note.name,
                    note.path.display()
                ));
                if note.root_unreadable {
                    txt.push_str("  Directory could not be read at all\n");
                } else {
                    txt.push_str(&format!("  Unreadable entries: {}\n", note.unreadable_count));
                }
                if !note.complete {
                    txt.push_str("  Scan stopped early: time budget exhausted\n");
                }
                txt.push('\n');
            }
        }

        txt.push_str(&format!(
            "Generated at {}.\nThis is an automated message from the Directory Size Monitor running on {}.\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S %Z"),
            self.hostname
        ));

        txt
    }

    pub fn to_message(&self) -> AlertMessage {
        AlertMessage {
            subject: self.subject(),
            body: self.render(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitoredTarget;
    use chrono::TimeZone;

    const GB: u64 = 1_073_741_824;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn verdict(name: &str, actual: u64, threshold: u64, label: &str) -> Verdict {
        Verdict {
            target: MonitoredTarget::new(name, format!("/{name}"), threshold)
                .with_threshold_label(label),
            actual_bytes: actual,
            exceeded: actual > threshold,
            unreadable_count: 0,
            root_unreadable: false,
            complete: true,
        }
    }

    #[test]
    fn test_no_report_when_nothing_exceeded() {
        let verdicts = vec![
            verdict("a", 10, 100, "100"),
            verdict("b", GB, GB, "1GB"),
        ];
        assert!(compose(&verdicts, at(), "host").is_none());
        assert!(compose(&[], at(), "host").is_none());
    }

    #[test]
    fn test_lines_follow_configuration_order() {
        let verdicts = vec![
            verdict("dirA", 5 * GB, GB, "1GB"),
            verdict("dirB", 10, GB, "1GB"),
            verdict("dirC", 2 * GB, GB, "1GB"),
        ];
        let report = compose(&verdicts, at(), "host").unwrap();
        let names: Vec<&str> = report.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["dirA", "dirC"]);
    }

    #[test]
    fn test_two_gb_over_one_gb() {
        let verdicts = vec![verdict("data", 2 * GB, GB, "1GB")];
        let report = compose(&verdicts, at(), "host").unwrap();
        let line = &report.lines[0];

        assert_eq!(line.excess_bytes, GB);
        assert_eq!(line.threshold_label, "1GB");

        let body = report.render();
        assert!(body.contains("Directory: data (/data)\n"));
        assert!(body.contains("Current Size: 2.00 GB\n"));
        assert!(body.contains("Threshold: 1GB\n"));
        assert!(body.contains("Exceeded by: 1.00 GB\n"));
        assert!(!body.contains("could not be fully scanned"));
    }

    #[test]
    fn test_subject_has_host_and_minute() {
        let report = compose(&[verdict("data", 2 * GB, GB, "1GB")], at(), "web-01").unwrap();
        assert_eq!(
            report.subject(),
            "Directory Size Alert on web-01 - 2024-05-01 09:30"
        );
        let message = report.to_message();
        assert_eq!(message.subject, report.subject());
        assert!(message.body.ends_with("running on web-01.\n"));
    }

    #[test]
    fn test_partial_scans_are_noted() {
        let mut over = verdict("data", 2 * GB, GB, "1GB");
        over.unreadable_count = 2;
        let mut missing = verdict("archive", 0, GB, "1GB");
        missing.unreadable_count = 1;
        missing.root_unreadable = true;
        let fine = verdict("tmp", 1, GB, "1GB");

        let report = compose(&[over, missing, fine], at(), "host").unwrap();

        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.scan_notes.len(), 2);
        assert_eq!(report.scan_notes[0].name, "data");
        assert_eq!(report.scan_notes[1].name, "archive");

        let body = report.render();
        assert!(body.contains("Unreadable entries: 2"));
        assert!(body.contains("Directory: archive (/archive)\n  Directory could not be read at all"));
    }
}
