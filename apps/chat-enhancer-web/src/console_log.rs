//! Routes `tracing` output to the browser console.
//!
//! The `fmt` layer formats each event into a [`ConsoleWriter`] buffer; the
//! buffer is flushed to `console.debug/info/warn/error` when the writer drops,
//! so one event is always one console entry.

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;

const PREFIX: &str = "[chat-enhancer]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsoleLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&Level> for ConsoleLevel {
    fn from(level: &Level) -> Self {
        match *level {
            Level::ERROR => ConsoleLevel::Error,
            Level::WARN => ConsoleLevel::Warn,
            Level::INFO => ConsoleLevel::Info,
            _ => ConsoleLevel::Debug,
        }
    }
}

/// Unknown names fall back to `info`; the config validator rejects them first.
pub(crate) fn level_filter(name: &str) -> LevelFilter {
    match name.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// The console entry for one formatted event, or `None` if nothing was written.
pub(crate) fn console_line(buffer: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(buffer);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(format!("{PREFIX} {text}"))
}

#[cfg(target_arch = "wasm32")]
mod sink {
    use std::io;

    use tracing::Metadata;
    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    use super::{ConsoleLevel, console_line, level_filter};

    pub(crate) struct ConsoleWriter {
        level: ConsoleLevel,
        buffer: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let Some(line) = console_line(&self.buffer) else {
                return;
            };
            let line = JsValue::from_str(&line);
            match self.level {
                ConsoleLevel::Debug => web_sys::console::debug_1(&line),
                ConsoleLevel::Info => web_sys::console::info_1(&line),
                ConsoleLevel::Warn => web_sys::console::warn_1(&line),
                ConsoleLevel::Error => web_sys::console::error_1(&line),
            }
        }
    }

    pub(crate) struct ConsoleMakeWriter;

    impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: ConsoleLevel::Info,
                buffer: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: ConsoleLevel::from(meta.level()),
                buffer: Vec::new(),
            }
        }
    }

    /// Installs the global subscriber. A second call keeps the first one.
    pub(crate) fn install(level: &str) -> bool {
        tracing_subscriber::fmt()
            .without_time()
            .with_target(false)
            .with_max_level(level_filter(level))
            .with_writer(ConsoleMakeWriter)
            .try_init()
            .is_ok()
    }
}

#[cfg(target_arch = "wasm32")]
pub(crate) use sink::install;
