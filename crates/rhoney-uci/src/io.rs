//! Output sink shared by the control thread and the search threads
//!
//! Each write takes the channel's lock for one whole line and flushes, so
//! lines from different threads never interleave.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

type Channel = Arc<Mutex<Box<dyn Write + Send>>>;

/// Protocol output (stdout) plus a diagnostic channel (stderr)
#[derive(Clone)]
pub struct SyncOut {
    out: Channel,
    err: Channel,
}

impl SyncOut {
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
            err: Arc::new(Mutex::new(err)),
        }
    }

    /// Process stdout / stderr
    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// In-memory sink for tests: returns the sink and the two buffers
    pub fn capture() -> (Self, CaptureBuffer, CaptureBuffer) {
        let out = CaptureBuffer::default();
        let err = CaptureBuffer::default();
        (Self::new(Box::new(out.clone()), Box::new(err.clone())), out, err)
    }

    /// One protocol line
    pub fn println(&self, line: &str) {
        write_line(&self.out, line);
    }

    /// One diagnostic line (bench statistics)
    pub fn eprintln(&self, line: &str) {
        write_line(&self.err, line);
    }

    /// `info string ...`
    pub fn info_string<S: AsRef<str>>(&self, s: S) {
        self.println(&format!("info string {}", s.as_ref()));
    }
}

fn write_line(channel: &Channel, line: &str) {
    let mut w = channel.lock().unwrap_or_else(PoisonError::into_inner);
    // A closed pipe means the GUI went away; there is nobody left to tell
    if writeln!(w, "{line}").and_then(|()| w.flush()).is_err() {
        log::debug!("output channel closed, dropped line: {line}");
    }
}

/// Cloneable in-memory writer
#[derive(Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_separates_channels() {
        let (out, stdout, stderr) = SyncOut::capture();
        out.println("uciok");
        out.info_string("hello");
        out.eprintln("Nodes searched  : 1");
        assert_eq!(stdout.lines(), vec!["uciok", "info string hello"]);
        assert_eq!(stderr.lines(), vec!["Nodes searched  : 1"]);
    }

    #[test]
    fn test_clones_share_buffers() {
        let (out, stdout, _) = SyncOut::capture();
        let other = out.clone();
        std::thread::spawn(move || other.println("from thread")).join().unwrap();
        out.println("from main");
        assert_eq!(stdout.lines(), vec!["from thread", "from main"]);
    }
}
