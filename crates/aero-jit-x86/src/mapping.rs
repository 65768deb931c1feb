use std::io;
use std::ptr::NonNull;

use crate::error::JitError;

/// An owned, anonymous `mmap` region. Starts out read-write-execute; real
/// W^X toggling (mprotect RW during emission, RX after `finish`) is left as
/// a follow-up since this crate targets a single-threaded embedding where
/// the block is never written to after finalization anyway.
pub struct ExecutableMapping {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the mapping is a plain owned byte buffer; nothing aliases it
// outside of this type, so it's safe to move across threads.
unsafe impl Send for ExecutableMapping {}

impl ExecutableMapping {
    pub fn new(len: usize) -> Result<Self, JitError> {
        assert!(len > 0, "mapping length must be non-zero");
        // SAFETY: MAP_ANONYMOUS with fd -1 and offset 0 is the documented
        // contract for an anonymous mapping; the returned pointer is only
        // dereferenced after checking it's not MAP_FAILED.
        let raw = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE | libc::PROT_EXEC,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(JitError::MapFailed {
                len,
                source: io::Error::last_os_error(),
            });
        }
        let ptr = NonNull::new(raw.cast::<u8>()).expect("mmap returned null without MAP_FAILED");
        Ok(Self { ptr, len })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// View of the bytes written so far, for tests and trace logging.
    #[must_use]
    pub fn as_slice(&self, written: usize) -> &[u8] {
        let written = written.min(self.len);
        // SAFETY: `written` is clamped to `self.len`, and the mapping is
        // valid for `self.len` bytes for the lifetime of `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), written) }
    }
}

impl Drop for ExecutableMapping {
    fn drop(&mut self) {
        // SAFETY: `self.ptr`/`self.len` are exactly the region `mmap`
        // returned in `new`, and this is the only owner.
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast(), self.len);
        }
    }
}
