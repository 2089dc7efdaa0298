//! Following log stream: daemon bytes in, batches of rendered lines out.
//!
//! The pipeline ends when the daemon closes the attach or errors. Dropping
//! the returned stream drops the daemon request with it.

use chrono::DateTime;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::ansi::AnsiConverter;
use crate::container::engine::{ByteStream, LogRequest, SharedDaemon};
use crate::container::frame::FrameDecoder;
use crate::error::Result;

static TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z)\s?(.*)$")
        .expect("timestamp pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub message: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// One outbound event: the decoded text plus its complete lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogBatch {
    pub text: String,
    pub lines: Vec<LogLine>,
}

/// Split a daemon-injected timestamp off the front of a line.
///
/// A line without one is all message.
pub fn split_timestamp(line: &str) -> (Option<&str>, &str) {
    if let Some(caps) = TIMESTAMP_PREFIX.captures(line) {
        if let (Some(ts), Some(rest)) = (caps.get(1), caps.get(2)) {
            if DateTime::parse_from_rfc3339(ts.as_str()).is_ok() {
                return (Some(ts.as_str()), rest.as_str());
            }
        }
    }
    (None, line)
}

/// Turns decoded text into lines, holding back an unterminated tail.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: String,
    ansi: AnsiConverter,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: &str) -> Vec<LogLine> {
        self.pending.push_str(text);
        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };
        let complete: String = self.pending.drain(..=last_newline).collect();
        complete.split('\n').filter_map(|line| self.render(line)).collect()
    }

    pub fn finish(&mut self) -> Vec<LogLine> {
        let rest = std::mem::take(&mut self.pending);
        self.render(&rest).into_iter().collect()
    }

    fn render(&mut self, raw: &str) -> Option<LogLine> {
        let line = raw.replace('\r', "");
        if line.trim().is_empty() {
            return None;
        }
        let (timestamp, message) = split_timestamp(&line);
        Some(LogLine {
            html: self.ansi.to_html(message),
            message: message.to_string(),
            timestamp: timestamp.map(str::to_string),
        })
    }
}

struct Pipeline {
    source: ByteStream,
    decoder: FrameDecoder,
    lines: LineSplitter,
}

/// Decode an attach stream into batches, one per chunk that produced text.
pub fn batches(source: ByteStream) -> BoxStream<'static, Result<LogBatch>> {
    let state = Pipeline {
        source,
        decoder: FrameDecoder::new(),
        lines: LineSplitter::new(),
    };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        loop {
            match state.source.next().await {
                Some(Ok(chunk)) => {
                    let text = state.decoder.push(&chunk);
                    if text.is_empty() {
                        continue;
                    }
                    let lines = state.lines.push(&text);
                    return Some((Ok(LogBatch { text, lines }), Some(state)));
                }
                Some(Err(e)) => {
                    tracing::warn!("Log stream failed: {}", e);
                    return Some((Err(e), None));
                }
                None => {
                    tracing::debug!("Log stream source ended");
                    let text = std::mem::take(&mut state.decoder).finish();
                    let mut lines = state.lines.push(&text);
                    lines.extend(state.lines.finish());
                    if text.is_empty() && lines.is_empty() {
                        return None;
                    }
                    return Some((Ok(LogBatch { text, lines }), None));
                }
            }
        }
    })
    .boxed()
}

/// Follow a container's log, replaying the last `tail` lines first.
pub async fn open_log_stream(
    daemon: &SharedDaemon,
    container: &str,
    tail: usize,
) -> Result<BoxStream<'static, Result<LogBatch>>> {
    let request = LogRequest {
        follow: true,
        tail,
        timestamps: true,
    };
    let source = daemon.logs(container, request).await?;
    tracing::debug!("Opened log stream for {} (tail {})", container, tail);
    Ok(batches(source))
}
