use anyhow::{Context, Result};
use dirsize_alert::cli::{Cli, OutputFormat};
use dirsize_alert::config::Config;
use dirsize_alert::error::ConfigError;
use dirsize_alert::logging;
use dirsize_alert::mailer::SmtpMailer;
use dirsize_alert::monitor::{
    Delivery, Monitor, MonitoredTarget, RunOptions, RunOutcome, RunPhase, RunState, ScanBudget,
    EXIT_CONFIG_FAILED,
};
use dirsize_alert::output::RunSummary;
use dirsize_alert::units::format_size;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init(cli.log_file.as_deref());

    let mut state = RunState::new();
    state.advance(RunPhase::LoadingConfig);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    tracing::info!(path = %config_path.display(), "Loading configuration");

    let (config, targets) = match load_config(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(error = %e, "Configuration error; no directories were checked");
            state.advance(RunPhase::Done);
            return ExitCode::from(EXIT_CONFIG_FAILED);
        }
    };

    let recipients = config.recipients();
    let options = RunOptions {
        parallel: config.scan.parallel,
        threads: config.scan.threads,
        budget: config
            .scan
            .timeout()
            .map(ScanBudget::with_timeout)
            .unwrap_or_default(),
        dry_run: cli.dry_run,
    };
    let mailer = SmtpMailer::new(config.smtp.clone());

    tracing::info!(targets = targets.len(), "Starting directory size check");
    let outcome = Monitor::new(&targets, &recipients, &mailer, options).run(&mut state);

    if let Err(e) = print_outcome(&cli, &outcome) {
        tracing::error!(error = %e, "Failed to write run summary");
    }

    let code = outcome.exit_status();
    tracing::info!(
        exit_code = code,
        duration_ms = outcome.duration.as_millis() as u64,
        "Directory size check completed"
    );
    ExitCode::from(code)
}

fn load_config(path: &Path) -> Result<(Config, Vec<MonitoredTarget>), ConfigError> {
    let config = Config::load(path)?;
    let targets = config.validate()?;
    Ok((config, targets))
}

fn print_outcome(cli: &Cli, outcome: &RunOutcome) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&RunSummary::from_outcome(outcome))?;
            if let Some(path) = &cli.out {
                fs::write(path, &json)
                    .with_context(|| format!("writing {}", path.display()))?;
            } else {
                println!("{}", json);
            }
        }
        OutputFormat::Human => {
            for verdict in &outcome.verdicts {
                let status = if verdict.exceeded { "EXCEEDED" } else { "ok" };
                let partial = if verdict.is_partial() { " (partial)" } else { "" };
                println!(
                    "{:<9} {} ({}): {} / {}{}",
                    status,
                    verdict.target.name,
                    verdict.target.path.display(),
                    format_size(verdict.actual_bytes),
                    verdict.target.threshold_label,
                    partial
                );
            }

            match &outcome.delivery {
                Delivery::NotDue => println!("\nNo thresholds exceeded."),
                Delivery::Sent => println!("\nAlert sent."),
                Delivery::DryRun => println!("\nDry run: alert not sent."),
                Delivery::Failed(e) => println!("\nAlert could not be sent: {}", e),
            }
        }
    }

    if cli.dry_run {
        if let Some(report) = &outcome.report {
            let text = format!("Subject: {}\n\n{}", report.subject(), report.render());
            match cli.format {
                OutputFormat::Human => println!("\n{}", text),
                OutputFormat::Json => eprintln!("{}", text),
            }
        }
    }

    Ok(())
}
