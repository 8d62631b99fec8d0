use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialise logging. Without `debug` the level is forced to `info`, even if
/// `RUST_LOG` is set; with it, `RUST_LOG` may override the `debug` default.
///
/// When `log_file` is given, output goes to that file instead of stderr.
/// Later calls are no-ops once a global subscriber is installed.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let file_target = log_file.as_ref().and_then(|path| {
        let name = path.file_name()?.to_owned();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Some((dir, name))
    });

    let _ = match file_target {
        Some((dir, name)) => builder
            .with_ansi(false)
            .with_writer(tracing_appender::rolling::never(dir, name))
            .try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
}
