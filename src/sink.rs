use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Destination byte stream shared by a handler and everything derived from it.
///
/// Each rendered record reaches the writer through a single locked
/// `write_all`, so lines from concurrent callers never interleave. The lock
/// is held only for that one write.
pub struct OutputSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl OutputSink {
    pub fn new<W>(out: W) -> Self
    where
        W: Write + Send + 'static,
    {
        OutputSink {
            out: Mutex::new(Box::new(out)),
        }
    }

    /// Write the whole buffer as one operation.
    ///
    /// **Returns**
    /// - `Ok(())` once every byte was accepted by the writer.
    /// - `Err(..)` with the writer's error, unchanged. Nothing is retried.
    pub fn write(&self, buf: &[u8]) -> io::Result<()> {
        // A writer that panicked mid-write must not disable logging for good.
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(buf)
    }

    pub fn flush(&self) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.flush()
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}

/// In-memory writer whose clones all append to the same buffer.
///
/// Useful for tests and for capturing output that is inspected later.
#[derive(Clone, Default, Debug)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
    }

    pub fn clear(&self) {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Refusing;

    impl Write for Refusing {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_errors_are_returned_unchanged() {
        let sink = OutputSink::new(Refusing);
        let err = sink.write(b"line\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(err.to_string(), "reader went away");

        // The lock is released after a failure.
        let err = sink.write(b"again\n").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn concurrent_writes_do_not_interleave() {
        let buffer = SharedBuffer::new();
        let sink = Arc::new(OutputSink::new(buffer.clone()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    let line = format!("{}\n", i.to_string().repeat(64));
                    for _ in 0..50 {
                        sink.write(line.as_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = buffer.contents();
        assert_eq!(contents.lines().count(), 400);
        for line in contents.lines() {
            let first = line.chars().next().unwrap();
            assert!(line.chars().all(|c| c == first), "interleaved line: {}", line);
        }
    }
}
