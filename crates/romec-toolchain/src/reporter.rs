//! Output sinks for compiled code.

use std::io::{self, Stdout, Write};
use std::sync::Mutex;

use romec_core::Reporter;

/// Writes each report in one `write_all` + `flush` under a lock.
#[derive(Debug)]
pub struct WriterReporter<W: Write + Send> {
    sink: Mutex<W>,
}

pub type StdoutReporter = WriterReporter<Stdout>;

impl<W: Write + Send> WriterReporter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.sink.into_inner().map_err(|_| poisoned())
    }
}

impl StdoutReporter {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "reporter sink lock poisoned")
}

impl<W: Write + Send> Reporter for WriterReporter<W> {
    fn write_all(&self, code: &str) -> io::Result<()> {
        let mut sink = self.sink.lock().map_err(|_| poisoned())?;
        sink.write_all(code.as_bytes())?;
        sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_verbatim() {
        let reporter = WriterReporter::new(Vec::new());
        reporter.write_all("var a = 1;\n").unwrap();
        reporter.write_all("b();").unwrap();
        assert_eq!(reporter.into_inner().unwrap(), b"var a = 1;\nb();");
    }

    #[test]
    fn test_write_error_propagates() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let err = WriterReporter::new(Closed).write_all("x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
