use serde::Serialize;
use std::io::{self, Write};

/// Потоковая запись в формате JSONL (JSON Lines).
/// - Одна запись - один JSON-объект
/// - Каждый объект заканчивается '\n'
pub struct JsonlWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.inner, value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.inner.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
