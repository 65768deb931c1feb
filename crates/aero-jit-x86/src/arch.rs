/// Host architectures this crate can emit native prologues/epilogues for.
///
/// Blink itself only ever JITs on these two hosts (`HAVE_JIT` is undefined
/// elsewhere); a third port would add a variant here and a matching
/// `codegen` module, not a fallback branch, since there is no portable
/// native encoding to fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostArch {
    X86_64,
    Aarch64,
}

impl HostArch {
    /// The architecture this binary is actually running on, if it's one the
    /// emitter supports. `None` means the JIT must stay disabled on this
    /// host (`CreatePath` returns `false`).
    #[must_use]
    pub fn current() -> Option<Self> {
        #[cfg(target_arch = "x86_64")]
        {
            Some(HostArch::X86_64)
        }
        #[cfg(target_arch = "aarch64")]
        {
            Some(HostArch::Aarch64)
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            None
        }
    }
}
