use std::io;

/// Failures raised by the host-native code emitter: memory acquisition,
/// finalization, and the arch-reachability checks around block execution.
#[derive(Debug, thiserror::Error)]
pub enum JitError {
    #[error("failed to map {len} bytes of executable memory: {source}")]
    MapFailed { len: usize, source: io::Error },

    #[error("block overflowed its {capacity}-byte capacity")]
    Overflow { capacity: usize },

    #[error("no native codegen backend for this host architecture")]
    UnsupportedHost,

    #[error("attempted to execute a block encoded for {encoded_for:?} on a {running_on:?} host")]
    ArchMismatch {
        encoded_for: crate::arch::HostArch,
        running_on: crate::arch::HostArch,
    },
}
