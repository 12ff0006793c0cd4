//! Console and log-file tracing setup.

use anyhow::Context;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Echo log lines to the console and append the same events to `log_file`.
///
/// With `machine_output` the console copy goes to stderr so stdout carries
/// only the JSON document.
pub fn init(level: &str, log_file: &Path, machine_output: bool) -> anyhow::Result<()> {
    let level = match level {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };

    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    let console = fmt::layer()
        .with_writer(BoxMakeWriter::new(move || -> Box<dyn Write> {
            if machine_output { Box::new(std::io::stderr()) } else { Box::new(std::io::stdout()) }
        }))
        .without_time()
        .with_target(false);
    let persisted = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false).with_target(false);

    tracing_subscriber::registry().with(level).with(console).with(persisted).try_init()?;
    Ok(())
}
