use serde::Deserialize;
use std::io::BufRead;
use std::sync::mpsc::Sender;

/// A message pushed by `GET /api/live-reload`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveReloadMessage {
    Connected,
    Reload {
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        file: Option<String>,
    },
}

/// What the reader thread reports to the index controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Message(LiveReloadMessage),
    Error(String),
}

/// Incremental `text/event-stream` decoder yielding `data` payloads.
#[derive(Debug, Default)]
pub struct EventStreamParser {
    data: Vec<String>,
}

impl EventStreamParser {
    /// Feed one line without its terminator. Returns a payload when the event ends.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            return Some(std::mem::take(&mut self.data).join("\n"));
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}

pub fn parse_message(payload: &str) -> Result<LiveReloadMessage, serde_json::Error> {
    serde_json::from_str(payload)
}

/// Pump a connected stream into `tx` until it ends, fails, or the receiver is dropped.
///
/// Always finishes with a `ChannelEvent::Error` unless the receiver went away first.
pub fn pump(reader: impl BufRead, tx: &Sender<ChannelEvent>) {
    let mut parser = EventStreamParser::default();
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                let _ = tx.send(ChannelEvent::Error(e.to_string()));
                return;
            }
        };
        let Some(payload) = parser.push_line(&line) else {
            continue;
        };
        match parse_message(&payload) {
            Ok(message) => {
                if tx.send(ChannelEvent::Message(message)).is_err() {
                    tracing::debug!("live-reload receiver dropped, stopping reader");
                    return;
                }
            }
            Err(e) => tracing::warn!("ignoring live-reload payload {payload:?}: {e}"),
        }
    }
    let _ = tx.send(ChannelEvent::Error("live-reload stream closed".to_string()));
}
