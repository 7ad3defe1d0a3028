// file: src/utils/logging.rs
// description: Tracing subscriber initialization with optional ANSI coloring and file output

use crate::config::LoggingConfig;
use colored::*;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Install the global subscriber. `RUST_LOG` wins over `--verbose`, which
/// wins over `logging.level`. Keep the returned guard alive for the whole
/// process so buffered file output is flushed.
pub fn init_logger(
    colored_output: bool,
    verbose: bool,
    logging: &LoggingConfig,
) -> Option<WorkerGuard> {
    let level = if verbose {
        "debug".to_string()
    } else {
        logging.level.to_lowercase()
    };

    let console_layer = logging.console.then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(verbose)
            .with_line_number(verbose)
            .compact()
            .with_ansi(colored_output)
            .with_writer(std::io::stderr)
            .with_filter(console_filter(&level))
    });

    let (file_layer, guard) = match &logging.file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| ".".into());
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "research.log".into());
            let _ = std::fs::create_dir_all(&dir);

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn console_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}
