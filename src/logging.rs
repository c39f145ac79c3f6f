use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "dirsize_alert=info";

/// Installs the global subscriber: stderr always, plus an append-only file
/// when `log_file` is given. `RUST_LOG` overrides the default filter.
pub fn init(log_file: Option<&Path>) {
    let mut open_failure: Option<(PathBuf, io::Error)> = None;
    let file_layer = log_file.and_then(|path| match open_log(path) {
        Ok(file) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        ),
        Err(e) => {
            open_failure = Some((path.to_path_buf(), e));
            None
        }
    });

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging already initialised: {}", e);
    }

    if let Some((path, e)) = open_failure {
        tracing::warn!(path = %path.display(), error = %e, "Could not open log file; logging to stderr only");
    }
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
