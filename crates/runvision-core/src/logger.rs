//! Minimal logger.
//!
//! Prints `[elapsed LEVEL module] message` to stderr. The control loop logs a
//! line per cycle, so the elapsed prefix doubles as a frame-rate trace.
//! Use `init_with_level` once at startup.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose records pass at the requested level; everything else is
/// capped at `warn` so dependency chatter stays out of the per-cycle trace.
const OWN_TARGETS: [&str; 4] = [
    "runvision",
    "runvision_core",
    "runvision_segment",
    "runvision_nav",
];

fn is_own_target(target: &str) -> bool {
    let krate = target.split("::").next().unwrap_or(target);
    OWN_TARGETS.contains(&krate)
}

/// Effective filter for `target` when the operator asked for `level`.
pub fn level_for_target(target: &str, level: LevelFilter) -> LevelFilter {
    if is_own_target(target) {
        level
    } else {
        level.min(LevelFilter::Warn)
    }
}

/// `EnvFilter` directives equivalent to [`level_for_target`]: dependencies
/// at `warn` or lower, the pipeline crates at `level`.
pub fn filter_directives(level: LevelFilter) -> String {
    let name = |l: LevelFilter| l.to_string().to_ascii_lowercase();
    let mut directives = vec![name(level.min(LevelFilter::Warn))];
    directives.extend(OWN_TARGETS.iter().map(|t| format!("{t}={}", name(level))));
    directives.join(",")
}

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= level_for_target(metadata.target(), self.level)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let module = record.target().rsplit("::").next().unwrap_or("");
        let mut stderr = std::io::stderr();
        let _ = writeln!(
            stderr,
            "[{:8.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            module,
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger with the provided level filter.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StderrLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Parse a level name (`off`, `error`, ..., `trace`), falling back to `info`.
pub fn parse_level(name: &str) -> LevelFilter {
    LevelFilter::from_str(name).unwrap_or(LevelFilter::Info)
}

/// Install a `tracing` subscriber. `RUST_LOG` wins when set; otherwise
/// `level` applies to the pipeline crates as in [`filter_directives`].
/// Span close events carry the duration of the instrumented stages.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
