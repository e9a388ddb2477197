//! Handle one operator event delivered by the host.
use anyhow::Context as AnyContext;
use anyhow::Result;
use clap::Args;
use tokio::io::AsyncReadExt;

use idop_reconcile::DeferReason;
use idop_reconcile::Event;
use idop_reconcile::Outcome;

use crate::init::Globals;
use crate::EXIT_DEFER;

/// Handle one event and exit with the outcome.
#[derive(Debug, Args)]
pub struct DispatchCli {
    /// JSON encoded event to handle, or `-` to read it from stdin.
    #[arg(default_value_t = String::from("-"))]
    pub event: String,
}

/// Decode the event and hand it to the reconciliation engine.
pub async fn run(globals: &Globals, cli: &DispatchCli) -> Result<i32> {
    let event = read_event(&cli.event).await?;
    let context = &globals.context;
    let outcome = globals.engine.handle(context, event).await?;
    let code = match outcome {
        Outcome::Handled => 0,
        Outcome::Rejected(rejection) => {
            slog::info!(context.logger, "Event dropped"; "reason" => rejection.kind());
            0
        }
        Outcome::DeferRetry(DeferReason::Gate(rejection)) => {
            slog::info!(context.logger, "Event deferred"; "reason" => rejection.kind());
            EXIT_DEFER
        }
        Outcome::DeferRetry(DeferReason::Failure(message)) => {
            slog::warn!(context.logger, "Event deferred after failure"; "error" => message);
            EXIT_DEFER
        }
    };
    Ok(code)
}

/// Read and decode an event from a file or stdin.
async fn read_event(source: &str) -> Result<Event> {
    let data = if source == "-" {
        let mut data = String::new();
        tokio::io::stdin()
            .read_to_string(&mut data)
            .await
            .context("failed to read event from stdin")?;
        data
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("failed to read event from {}", source))?
    };
    let event = serde_json::from_str(&data).context("failed to decode event")?;
    Ok(event)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use idop_reconcile::Event;

    #[tokio::test]
    async fn read_event_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"event": "config-changed"}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();
        let event = super::read_event(&path).await.unwrap();
        assert_eq!(event, Event::ConfigChanged);
    }

    #[tokio::test]
    async fn read_event_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"event": "unknown"}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();
        assert!(super::read_event(&path).await.is_err());
    }
}
