use crate::arch::HostArch;
use crate::block::JitBlock;
use crate::error::JitError;
use crate::exec::FinalizedBlock;
use crate::mapping::ExecutableMapping;

/// Default per-path code buffer size. Generous for the handful of
/// instructions a typical path strings together; a path that overflows it
/// is abandoned rather than grown, matching `AddPath`'s "treat overflow as
/// an immediate abandon" contract.
pub const DEFAULT_BLOCK_CAPACITY: usize = 4096;

/// Owns the pool of finalized native-code pages a [`HookTable`] full of
/// native entries ultimately points into. A fresh page is mmap'd per path
/// (see [`Self::start_block`] doc) rather than sub-allocated from one
/// shared arena, so a path can be abandoned and its page unmapped without
/// disturbing any other path's code.
///
/// [`HookTable`]: struct `HookTable` in the companion `aero-jit` crate.
pub struct JitArena {
    block_capacity: usize,
    finalized: Vec<FinalizedBlock>,
}

impl Default for JitArena {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_CAPACITY)
    }
}

impl JitArena {
    #[must_use]
    pub fn new(block_capacity: usize) -> Self {
        JitArena {
            block_capacity,
            finalized: Vec::new(),
        }
    }

    /// `StartJit`: acquires a fresh native-code buffer for one path, sized
    /// to this arena's configured capacity, for the given host
    /// architecture (almost always [`HostArch::current`]; tests pass a
    /// different arch to exercise the other backend's byte encodings
    /// without being able to execute them).
    pub fn start_block(&self, arch: HostArch) -> Result<JitBlock, JitError> {
        let mapping = ExecutableMapping::new(self.block_capacity)?;
        Ok(JitBlock::new(mapping, arch))
    }

    /// `FinishJit`: the block becomes an immutable, callable entry. Kept
    /// alive by this arena for as long as the hook table might still
    /// reference it.
    pub fn finish(&mut self, block: JitBlock) -> Result<&FinalizedBlock, JitError> {
        let arch = block.arch();
        let (mapping, entry_len) = block.into_mapping()?;
        self.finalized.push(FinalizedBlock::new(mapping, arch, entry_len));
        Ok(self.finalized.last().expect("just pushed"))
    }

    /// `AbandonJit`: drops the block's mapping outright, freeing the pages
    /// without ever publishing them into the hook table.
    pub fn abandon(&self, _block: JitBlock) {
        // Dropping `_block` unmaps its pages via `ExecutableMapping::drop`.
    }

    /// Number of finalized blocks this arena is keeping alive.
    #[must_use]
    pub fn finalized_count(&self) -> usize {
        self.finalized.len()
    }

    /// Drops every finalized block, invalidating any hook table entries
    /// that pointed into them. Mirrors a JIT arena reset: the hook table
    /// must be cleared wholesale alongside this call.
    pub fn reset(&mut self) {
        self.finalized.clear();
    }
}
