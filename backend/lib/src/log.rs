//! Process-wide logging setup
//!
//! Logs are emitted either as Bunyan JSON or as human readable text, with
//! [`LogFormat::Auto`] picking JSON whenever stdout is not a terminal.
//! Bunyan's `log.` field prefix is rewritten to `backend_log.` since log
//! ingestion pipelines reserve the former.

use std::borrow::Cow;
use std::io::Write;

use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::config::LogFormat;
use crate::constants::server::SERVICE_NAME;

const LOG_KEY_PREFIX: &str = "\"log.";
const RENAMED_KEY_PREFIX: &str = "\"backend_log.";

/// Whether the string literal opening at `start` is an object key
fn is_object_key(line: &str, start: usize) -> bool {
    let after_key = matches!(line[..start].trim_end().chars().last(), Some('{' | ','));
    if !after_key {
        return false;
    }

    let mut escaped = false;
    for (offset, c) in line[start + 1..].char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                let rest = &line[start + 1 + offset + 1..];
                return rest.trim_start().starts_with(':');
            }
            _ => escaped = false,
        }
    }
    false
}

/// Rename `log.`-prefixed keys of a JSON line, leaving values alone
fn rename_log_keys(line: &str) -> Cow<'_, str> {
    let mut renamed = String::new();
    let mut copied = 0;

    for (start, _) in line.match_indices(LOG_KEY_PREFIX) {
        if is_object_key(line, start) {
            renamed.push_str(&line[copied..start]);
            renamed.push_str(RENAMED_KEY_PREFIX);
            copied = start + LOG_KEY_PREFIX.len();
        }
    }

    if copied == 0 {
        return Cow::Borrowed(line);
    }
    renamed.push_str(&line[copied..]);
    Cow::Owned(renamed)
}

struct PrefixReplacingWriter<W: Write> {
    inner: W,
}

impl<W: Write> Write for PrefixReplacingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match std::str::from_utf8(buf) {
            Ok(s) => {
                self.inner.write_all(rename_log_keys(s).as_bytes())?;
                Ok(buf.len())
            }
            Err(_) => self.inner.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

struct StdoutPrefixReplacing;

impl<'a> MakeWriter<'a> for StdoutPrefixReplacing {
    type Writer = PrefixReplacingWriter<std::io::Stdout>;

    fn make_writer(&'a self) -> Self::Writer {
        PrefixReplacingWriter {
            inner: std::io::stdout(),
        }
    }
}

/// Install the global tracing subscriber
///
/// Filtering follows `RUST_LOG`, defaulting to `info` when unset.
pub fn initialize_logging(log_format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format.resolve() {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(JsonStorageLayer)
                .with(BunyanFormattingLayer::new(
                    SERVICE_NAME.to_string(),
                    StdoutPrefixReplacing,
                ))
                .init();
        }
        LogFormat::Text | LogFormat::Auto => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
