//! Process-wide tracing setup shared by the cloudlet binaries.
//!
//! Configuration comes from the environment:
//!
//! | variable              | values                     | default            |
//! |-----------------------|----------------------------|--------------------|
//! | `CLOUDLET_LOG_LEVEL`  | any `EnvFilter` directive  | `RUST_LOG`, `info` |
//! | `CLOUDLET_LOG_FORMAT` | `human`, `json`            | `human`            |
//! | `CLOUDLET_LOG_OUTPUT` | `console`, `file`, `both`  | `console`          |
//! | `CLOUDLET_LOG_FILE`   | path of the rolling log    | `/tmp/cloudlet.log`|

use std::{
    env,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, registry, EnvFilter, Layer, Registry};

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_LOG_FILE: &str = "/tmp/cloudlet.log";

// Chatty dependencies are capped regardless of the requested level
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "tokio=warn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Console,
    File,
    Both,
}

impl LogOutput {
    fn console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source. Unknown values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let level = var("CLOUDLET_LOG_LEVEL")
            .or_else(|| var("RUST_LOG"))
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

        let format = match var("CLOUDLET_LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Human,
        };

        let output = match var("CLOUDLET_LOG_OUTPUT")
            .map(|o| o.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("file") => LogOutput::File,
            Some("both") => LogOutput::Both,
            _ => LogOutput::Console,
        };

        let file = var("CLOUDLET_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        Self {
            level,
            format,
            output,
            file,
        }
    }

    fn filter(&self) -> EnvFilter {
        let filter = EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
        QUIET_TARGETS
            .iter()
            .filter_map(|directive| directive.parse().ok())
            .fold(filter, |filter, directive| filter.add_directive(directive))
    }

    /// Directory and file name for the daily rolling appender.
    fn file_parts(&self) -> (PathBuf, PathBuf) {
        let dir = self
            .file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = self
            .file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cloudlet.log"));
        (dir.to_path_buf(), name)
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(format: LogFormat, writer: W) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(writer);
    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Human => layer.boxed(),
    }
}

/// Initializes the global tracing subscriber from the environment.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the lifetime of the process. Returns `None` when no file output is
/// configured. Calling this twice leaves the first subscriber in place.
pub fn init_subscriber() -> Option<WorkerGuard> {
    init_with(&LogSettings::from_env())
}

pub fn init_with(settings: &LogSettings) -> Option<WorkerGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if settings.output.console() {
        layers.push(fmt_layer(settings.format, std::io::stdout));
    }

    if settings.output.file() {
        let (dir, name) = settings.file_parts();
        let appender = tracing_appender::rolling::daily(dir, name);
        let (writer, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);
        layers.push(fmt_layer(settings.format, writer));
    }

    if registry()
        .with(layers)
        .with(settings.filter())
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }

    guard
}
