/// Recoverable failures building the initial guest stack.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("writing {len} bytes at guest address {addr:#x} failed: {reason}")]
    GuestWriteFailed { addr: u64, len: usize, reason: String },

    #[error("guest stack pointer underflowed while reserving {needed} bytes")]
    StackUnderflow { needed: u64 },
}
