use aero_jit_abi::MachineHandle;

use crate::arch::HostArch;
use crate::error::JitError;
use crate::mapping::ExecutableMapping;

/// A finalized, executable native code block: the result of
/// [`crate::arena::JitArena::finish`]. Read-only from here on; nothing in
/// this crate writes to `mapping` again once wrapped.
pub struct FinalizedBlock {
    mapping: ExecutableMapping,
    arch: HostArch,
    len: usize,
}

impl FinalizedBlock {
    pub(crate) fn new(mapping: ExecutableMapping, arch: HostArch, len: usize) -> Self {
        FinalizedBlock { mapping, arch, len }
    }

    #[must_use]
    pub fn arch(&self) -> HostArch {
        self.arch
    }

    #[must_use]
    pub fn entry_addr(&self) -> usize {
        self.mapping.as_ptr() as usize
    }

    #[must_use]
    pub fn emitted(&self) -> &[u8] {
        self.mapping.as_slice(self.len)
    }

    /// Jumps into this block as a path entry point: `extern "C" fn(machine)`.
    ///
    /// Returns [`JitError::ArchMismatch`] instead of silently corrupting the
    /// process when called on a host other than the one this block's bytes
    /// were encoded for.
    ///
    /// # Safety
    /// `machine` must be a valid pointer for whatever the compiled path's
    /// semantic ops expect (a live `Machine`, per the `aero-jit-abi`
    /// contract), and must stay valid until the path returns.
    pub unsafe fn call(&self, machine: MachineHandle) -> Result<(), JitError> {
        let running_on = HostArch::current().ok_or(JitError::UnsupportedHost)?;
        if running_on != self.arch {
            return Err(JitError::ArchMismatch {
                encoded_for: self.arch,
                running_on,
            });
        }
        let entry: unsafe extern "C" fn(MachineHandle) = std::mem::transmute(self.entry_addr());
        entry(machine);
        Ok(())
    }
}
