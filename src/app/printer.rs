//! Printing processor used by the `relayq` binary
//!
//! Writes one line per entry, as plain text or JSON, and optionally hands
//! the entry back to the store under another queue (`--forward-to`).

use crate::consumer::{Disposition, Entry, ProcessError, Processor, ReturnDirective};
use crate::core::styles::StyleRole;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::sync::Mutex;

/// Output line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

pub struct Printer {
    format: OutputFormat,
    color: bool,
    forward_to: Option<ReturnDirective>,
    out: Mutex<Box<dyn Write + Send>>,
}

impl Printer {
    pub fn new(format: OutputFormat, color: bool, forward_to: Option<ReturnDirective>) -> Self {
        Self::with_writer(format, color, forward_to, Box::new(std::io::stdout()))
    }

    pub fn with_writer(
        format: OutputFormat,
        color: bool,
        forward_to: Option<ReturnDirective>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            format,
            color,
            forward_to,
            out: Mutex::new(out),
        }
    }

    /// Render one entry as a single output line (no trailing newline)
    pub fn render(&self, entry: &Entry) -> String {
        match self.format {
            OutputFormat::Text => self.render_text(entry),
            OutputFormat::Json => self.render_json(entry),
        }
    }

    fn render_text(&self, entry: &Entry) -> String {
        let paint = |role: StyleRole, text: &str| role.paint(text, self.color);
        let timestamp = entry.fetched_at().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        let payload = match entry.payload_str() {
            Some(text) => text.to_string(),
            None => format!("<{} bytes>", entry.payload().len()),
        };

        let mut line = format!(
            "{} {} {}",
            paint(StyleRole::Timestamp, &timestamp),
            paint(StyleRole::Queue, entry.queue()),
            paint(StyleRole::Payload, &payload)
        );
        if let Some(target) = &self.forward_to {
            let arrow = format!("-> {} ({})", target.queue(), target.end());
            line.push(' ');
            line.push_str(&paint(StyleRole::Returned, &arrow));
        }
        line
    }

    fn render_json(&self, entry: &Entry) -> String {
        let mut obj = Map::new();
        obj.insert("timestamp".into(), json!(entry.fetched_at().to_rfc3339()));
        obj.insert("queue".into(), json!(entry.queue()));
        match entry.payload_str() {
            Some(text) => obj.insert("payload".into(), json!(text)),
            None => obj.insert("payload_bytes".into(), json!(entry.payload())),
        };
        if let Some(target) = &self.forward_to {
            obj.insert("forwarded_to".into(), json!(target.queue()));
        }
        Value::Object(obj).to_string()
    }
}

#[async_trait::async_trait]
impl Processor for Printer {
    async fn process(&self, entry: &Entry) -> Result<Disposition, ProcessError> {
        let line = self.render(entry);
        {
            let mut out = self
                .out
                .lock()
                .map_err(|_| ProcessError::new("output writer lock poisoned"))?;
            writeln!(out, "{}", line)
                .and_then(|_| out.flush())
                .map_err(|e| ProcessError::with_source("cannot write entry", e))?;
        }

        Ok(match &self.forward_to {
            Some(target) => Disposition::Return(target.clone()),
            None => Disposition::Consumed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::QueueEnd;
    use std::sync::Arc;

    /// Writer that keeps everything in a shared buffer
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_text_line_without_color() {
        let captured = Captured::default();
        let printer =
            Printer::with_writer(OutputFormat::Text, false, None, Box::new(captured.clone()));
        let entry = Entry::new("jobs", "hello world", QueueEnd::Front);

        let disposition = printer.process(&entry).await.unwrap();
        assert_eq!(disposition, Disposition::Consumed);

        let output = captured.text();
        assert!(output.ends_with(" jobs hello world\n"));
        assert!(!output.contains('\x1b'));
    }

    #[tokio::test]
    async fn test_forwarding_returns_entry() {
        let target = ReturnDirective::to_front("audit");
        let printer = Printer::with_writer(
            OutputFormat::Text,
            false,
            Some(target.clone()),
            Box::new(Captured::default()),
        );
        let entry = Entry::new("jobs", "x", QueueEnd::Front);

        assert_eq!(
            printer.process(&entry).await.unwrap(),
            Disposition::Return(target)
        );
        assert!(printer.render(&entry).ends_with("-> audit (front)"));
    }

    #[test]
    fn test_json_line() {
        let printer =
            Printer::with_writer(OutputFormat::Json, true, None, Box::new(Captured::default()));
        let entry = Entry::new("jobs", "payload", QueueEnd::Back);

        let value: Value = serde_json::from_str(&printer.render(&entry)).unwrap();
        assert_eq!(value["queue"], "jobs");
        assert_eq!(value["payload"], "payload");
        assert!(value["timestamp"].as_str().is_some());
        assert!(value.get("forwarded_to").is_none());
    }

    #[test]
    fn test_binary_payload() {
        let printer =
            Printer::with_writer(OutputFormat::Json, false, None, Box::new(Captured::default()));
        let entry = Entry::new("raw", vec![0xff, 0x00], QueueEnd::Front);

        let value: Value = serde_json::from_str(&printer.render(&entry)).unwrap();
        assert_eq!(value["payload_bytes"], json!([255, 0]));

        let text = Printer::with_writer(OutputFormat::Text, false, None, Box::new(Captured::default()));
        assert!(text.render(&entry).ends_with("raw <2 bytes>"));
    }
}
