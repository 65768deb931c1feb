//! The optional trace logger. Blink's `CLOG` writes a line-oriented
//! human-readable dump of emitted code to `/tmp/blink.s` through a
//! process-wide file descriptor and disassembler context. Here the
//! disassembler is out of scope (an external collaborator), so this module
//! is responsible only for the sink abstraction and the structured
//! `tracing` events every emission site reports through regardless of
//! whether a sink is attached.

use std::ffi::CString;
use std::os::unix::io::RawFd;
use std::sync::{Arc, Mutex};

use aero_pc_constants::MIN_TRACE_LOG_FD;

/// Where trace-log lines go. A file in production, an injectable in-memory
/// buffer in tests, so buffers can be captured in tests rather than
/// needing a real file descriptor.
pub trait TraceSink: Send {
    fn write_line(&mut self, line: &str);
}

/// An in-memory sink for tests.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub lines: Vec<String>,
}

impl TraceSink for BufferSink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }
}

/// A sink that hands its lines to a shared buffer, so a test can attach it
/// and still hold a handle to inspect what was written.
#[derive(Clone, Default)]
pub struct SharedBufferSink(pub Arc<Mutex<Vec<String>>>);

impl TraceSink for SharedBufferSink {
    fn write_line(&mut self, line: &str) {
        self.0.lock().expect("shared buffer sink mutex poisoned").push(line.to_owned());
    }
}

/// The production sink: `/tmp/blink.s`, opened close-on-exec and then
/// redirected (still close-on-exec) to a file descriptor number at or above
/// [`MIN_TRACE_LOG_FD`], mirroring blink's own `SetupClog` exactly —
/// `open(..., O_CLOEXEC)` followed by `fcntl(fd, F_DUPFD_CLOEXEC, kMinBlinkFd)`
/// so the trace log never collides with a low guest-visible fd number.
pub struct FileSink {
    fd: RawFd,
}

impl FileSink {
    /// Opens `/tmp/blink.s` for truncated writing and floors its descriptor
    /// number to [`MIN_TRACE_LOG_FD`]. Fails if either syscall fails.
    pub fn open_default() -> std::io::Result<Self> {
        let path = CString::new("/tmp/blink.s").expect("literal path has no interior NUL");
        Self::open(&path)
    }

    fn open(path: &std::ffi::CStr) -> std::io::Result<Self> {
        // SAFETY: `path` is a valid NUL-terminated C string for the duration
        // of the call.
        let opened = unsafe {
            libc::open(path.as_ptr(), libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC | libc::O_CLOEXEC, 0o644)
        };
        if opened < 0 {
            return Err(std::io::Error::last_os_error());
        }
        // SAFETY: `opened` is a freshly opened, valid descriptor; this call
        // either returns a new descriptor (closing `opened`) or fails,
        // leaving `opened` open.
        let floored = unsafe { libc::fcntl(opened, libc::F_DUPFD_CLOEXEC, MIN_TRACE_LOG_FD) };
        if floored < 0 {
            let err = std::io::Error::last_os_error();
            unsafe { libc::close(opened) };
            return Err(err);
        }
        if floored != opened {
            unsafe { libc::close(opened) };
        }
        Ok(FileSink { fd: floored })
    }
}

impl TraceSink for FileSink {
    fn write_line(&mut self, line: &str) {
        let Ok(line) = CString::new(format!("{line}\n")) else { return };
        let bytes = line.as_bytes();
        // SAFETY: `self.fd` is open for the lifetime of `self`; `bytes` is a
        // valid, correctly-sized buffer for the call.
        unsafe {
            libc::write(self.fd, bytes.as_ptr().cast(), bytes.len());
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // SAFETY: `self.fd` was opened by `Self::open` and is closed at most
        // once.
        unsafe {
            libc::close(self.fd);
        }
    }
}

unsafe impl Send for FileSink {}

/// Process-scoped trace logger. `tracing::trace!` events are always emitted
/// (a `tracing` subscriber decides whether they go anywhere); the optional
/// sink additionally gets the same line verbatim, for tests that want to
/// assert on the dump without installing a subscriber.
pub struct TraceLogger {
    sink: Mutex<Option<Box<dyn TraceSink>>>,
}

impl Default for TraceLogger {
    fn default() -> Self {
        TraceLogger { sink: Mutex::new(None) }
    }
}

impl TraceLogger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `SetupClog(machine)`: attaches a sink. Idempotent; replaces whatever
    /// sink (if any) was previously attached.
    pub fn attach(&self, sink: Box<dyn TraceSink>) {
        *self.sink.lock().expect("trace logger mutex poisoned") = Some(sink);
    }

    /// Explicit teardown, releasing the sink.
    pub fn detach(&self) {
        *self.sink.lock().expect("trace logger mutex poisoned") = None;
    }

    pub fn log_path_start(&self, pc: u64) {
        tracing::trace!(target: "aero_jit::path", pc, "path start");
        self.emit(&format!("; path start @ {pc:#x}"));
    }

    pub fn log_op(&self, pc: u64, mopcode: u16, jit_pc: usize) {
        tracing::trace!(target: "aero_jit::path", pc, mopcode, jit_pc, "op");
        self.emit(&format!("{pc:#x}: mopcode={mopcode:#x} -> jit {jit_pc:#x}"));
    }

    pub fn log_oom(&self, pc: u64) {
        tracing::debug!(target: "aero_jit::path", pc, "OOM");
        self.emit(&format!("; OOM @ {pc:#x}"));
    }

    pub fn log_path_finished(&self, pc: u64, bytes: usize) {
        tracing::trace!(target: "aero_jit::path", pc, bytes, "path finished");
        self.emit(&format!("; path finished @ {pc:#x}, {bytes} bytes"));
    }

    pub fn log_path_abandoned(&self, pc: u64) {
        tracing::debug!(target: "aero_jit::path", pc, "path abandoned");
        self.emit(&format!("; path abandoned @ {pc:#x}"));
    }

    fn emit(&self, line: &str) {
        if let Some(sink) = self.sink.lock().expect("trace logger mutex poisoned").as_mut() {
            sink.write_line(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attached_sink_receives_lines() {
        let logger = TraceLogger::new();
        let sink = SharedBufferSink::default();
        let lines = sink.0.clone();
        logger.attach(Box::new(sink));
        logger.log_path_start(0x1000);
        logger.log_op(0x1000, 0x090, 0x2000);
        logger.log_path_finished(0x1000, 31);

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("path start"));
        assert!(lines[2].contains("31 bytes"));
    }

    #[test]
    fn detach_stops_future_sink_writes() {
        let logger = TraceLogger::new();
        logger.attach(Box::new(BufferSink::default()));
        logger.detach();
        // No sink attached: this must not panic.
        logger.log_path_abandoned(0x2000);
    }
}
