//! `parse` command implementation.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use contracts::DetectionEvent;
use tracing::debug;

use crate::cli::ParseArgs;

/// Execute the `parse` command
pub fn run_parse(args: &ParseArgs) -> Result<()> {
    let body = read_body(&args.file)?;
    debug!(bytes = body.len(), "Parsing alert email body");

    let event = parse_body(&body)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&event).context("Failed to serialize parsed event")?;
        println!("{}", json);
    } else {
        print_event(&event);
    }
    Ok(())
}

fn read_body(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read email body from stdin")?;
        return Ok(body);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read email body from {}", path.display()))
}

fn parse_body(body: &str) -> Result<DetectionEvent> {
    mailbox::parse_message(body).context("Not a recognised alert email")
}

fn print_event(event: &DetectionEvent) {
    println!("Event type: {}", event.event_type.alert_label());
    println!("Cameras:    {}", event.camera_label());
    println!(
        "Time:       {}",
        event.occurred_at.format("%Y-%m-%d %H:%M:%S")
    );
}
