use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialise logging. The default level is `info`; passing `debug = true`
/// switches to `debug` and lets the `RUST_LOG` environment variable override
/// the filter. When `file` is given, log lines are also appended to it.
///
/// Calling this more than once is harmless: only the first subscriber sticks.
pub fn init(debug: bool, file: Option<PathBuf>) {
    // RUST_LOG only applies in debug mode.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let file_writer = file.and_then(|path| {
        let dir = path.parent()?.to_path_buf();
        let name = path.file_name()?.to_owned();
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        Some((writer, guard))
    });

    match file_writer {
        Some((writer, guard)) => {
            let installed = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stderr.and(writer))
                .try_init()
                .is_ok();
            if installed {
                let _ = FILE_GUARD.set(guard);
            }
        }
        None => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        }
    }
}
