//! `tracing` subscriber that writes to the browser console.

use std::io;

use tracing_subscriber::EnvFilter;
use wasm_bindgen::JsValue;

use crate::config::LOG_DIRECTIVE;

/// Buffers one formatted event and logs it when dropped.
#[derive(Debug, Default)]
struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if !line.is_empty() {
            web_sys::console::log_1(&JsValue::from_str(line));
        }
        self.buf.clear();
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}

pub fn init() {
    let filter = EnvFilter::try_new(LOG_DIRECTIVE).unwrap_or_else(|_| EnvFilter::new("info"));
    // No wall clock on wasm32-unknown-unknown.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(ConsoleWriter::default)
        .with_ansi(false)
        .without_time()
        .try_init();
}
