use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use anyhow::Result;
use slog::o;
use slog::Drain;
use slog::FnValue;
use slog::IgnoreResult;
use slog::Level;
use slog::Logger;
use slog::Never;
use slog::Record;

/// Append JSON encoded records to the file at `path`.
pub fn file(path: String, level: Level) -> Result<Logger> {
    let writer = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("unable to open log file at {}", path))?;
    let drain = slog_json::Json::new(writer)
        .set_newlines(true)
        .set_flush(true)
        .set_pretty(false)
        .add_default_keys()
        .build();
    let drain = Mutex::new(drain).map(IgnoreResult::new);
    Ok(root(drain, level))
}

/// Write human readable records to stderr.
pub fn terminal(level: Level) -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build();
    let drain = Mutex::new(drain).map(IgnoreResult::new);
    root(drain, level)
}

/// Filter records below `level` and attach the emitting module to every record.
fn root<D>(drain: D, level: Level) -> Logger
where
    D: Drain<Ok = (), Err = Never>
        + Send
        + Sync
        + std::panic::UnwindSafe
        + std::panic::RefUnwindSafe
        + 'static,
{
    let drain = drain.filter_level(level).fuse();
    Logger::root(
        drain,
        o!("module" => FnValue(|record: &Record| record.module())),
    )
}
