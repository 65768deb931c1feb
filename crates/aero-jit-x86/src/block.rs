use crate::abi;
use crate::arch::HostArch;
use crate::codegen::{aarch64, x86_64, ArgReg};
use crate::error::JitError;
use crate::mapping::ExecutableMapping;

/// A single path's native code buffer: a window into one `mmap`'d region,
/// append-only, with a sticky overflow marker once a write would exceed
/// capacity.
///
/// Mirrors blink's `struct JitBlock`: `index` is the write cursor (bytes
/// written, relative to the mapping's own base, since every block owns a
/// dedicated region rather than sharing one arena-wide cursor), `start` is
/// the cursor value snapshotted when the path began (used only for trace
/// logging: "this many bytes emitted for this path").
pub struct JitBlock {
    mapping: ExecutableMapping,
    arch: HostArch,
    capacity: usize,
    index: usize,
    start: usize,
}

impl JitBlock {
    pub(crate) fn new(mapping: ExecutableMapping, arch: HostArch) -> Self {
        let capacity = mapping.len();
        JitBlock {
            mapping,
            arch,
            capacity,
            index: 0,
            start: 0,
        }
    }

    #[must_use]
    pub fn arch(&self) -> HostArch {
        self.arch
    }

    /// The address the next appended byte will land at, i.e. the JIT
    /// program counter an in-flight path's code would resume at.
    #[must_use]
    pub fn jit_pc(&self) -> usize {
        self.mapping.as_ptr() as usize + self.index.min(self.capacity)
    }

    #[must_use]
    pub fn start_addr(&self) -> usize {
        self.mapping.as_ptr() as usize
    }

    #[must_use]
    pub fn is_overflowed(&self) -> bool {
        self.index == self.capacity + 1
    }

    /// Snapshots the current cursor as this path's starting point, for
    /// later "bytes emitted" accounting.
    pub fn mark_start(&mut self) {
        self.start = self.index.min(self.capacity);
    }

    /// Bytes emitted since the last [`Self::mark_start`], or `None` if this
    /// block overflowed along the way.
    #[must_use]
    pub fn bytes_since_start(&self) -> Option<usize> {
        if self.is_overflowed() {
            None
        } else {
            Some(self.index - self.start)
        }
    }

    /// Appends raw bytes. Once the block has overflowed, further appends
    /// are no-ops (the sticky `capacity + 1` marker stays put) so a path
    /// builder can keep emitting speculatively and check
    /// [`Self::is_overflowed`] once at the end instead of after every op.
    pub fn append(&mut self, bytes: &[u8]) {
        if self.is_overflowed() {
            return;
        }
        let new_index = self.index + bytes.len();
        if new_index > self.capacity {
            self.index = self.capacity + 1;
            return;
        }
        // SAFETY: `new_index <= self.capacity == mapping.len()`, so the
        // write stays in bounds; the mapping is RW (in addition to X) for
        // exactly this reason.
        unsafe {
            let dst = self.mapping.as_mut_ptr().add(self.index);
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
        }
        self.index = new_index;
    }

    pub fn emit_prologue(&mut self) {
        match self.arch {
            HostArch::X86_64 => self.append(abi::X86_64_ENTER),
            HostArch::Aarch64 => self.append(&aarch64::words_to_bytes(abi::AARCH64_ENTER)),
        }
    }

    pub fn emit_epilogue_and_ret(&mut self) {
        match self.arch {
            HostArch::X86_64 => {
                self.append(abi::X86_64_LEAVE);
                self.append(&x86_64::ret());
            }
            HostArch::Aarch64 => {
                self.append(&aarch64::words_to_bytes(abi::AARCH64_LEAVE));
                self.append(&aarch64::ret());
            }
        }
    }

    pub fn emit_mov_reg(&mut self, dst: ArgReg, src: ArgReg) {
        let bytes = match self.arch {
            HostArch::X86_64 => x86_64::mov_reg(dst, src),
            HostArch::Aarch64 => aarch64::mov_reg(dst, src),
        };
        self.append(&bytes);
    }

    pub fn emit_set_reg(&mut self, reg: ArgReg, imm: u64) {
        let bytes = match self.arch {
            HostArch::X86_64 => x86_64::set_reg(reg, imm),
            HostArch::Aarch64 => aarch64::set_reg(reg, imm),
        };
        self.append(&bytes);
    }

    pub fn emit_call(&mut self, target: usize) {
        let bytes = match self.arch {
            HostArch::X86_64 => x86_64::call_absolute(target),
            HostArch::Aarch64 => aarch64::call_absolute(target),
        };
        self.append(&bytes);
    }

    pub fn emit_jump(&mut self, target: usize) {
        let bytes = match self.arch {
            HostArch::X86_64 => x86_64::jump_absolute(target),
            HostArch::Aarch64 => aarch64::jump_absolute(target),
        };
        self.append(&bytes);
    }

    /// `AddPath_EndOp`'s inline fast path: skip the call to commit a stash
    /// iff the machine's `stashaddr` field (at byte offset `stash_offset`
    /// from the pointer in the machine/arg0 register) is still zero.
    ///
    /// The skip distance is computed from the call sequence's own encoded
    /// length rather than hardcoded, so it stays correct independent of how
    /// the call itself is encoded on a given arch.
    pub fn emit_stash_check(&mut self, stash_offset: u32, commit_stash: usize) {
        match self.arch {
            HostArch::X86_64 => {
                let call = x86_64::call_absolute(commit_stash);
                let disp8 = u8::try_from(stash_offset).expect("stashaddr offset must fit a disp8");
                let skip = u8::try_from(call.len()).expect("call sequence fits a u8 skip distance");
                self.append(&x86_64::stash_check_and_skip(disp8, skip));
                self.append(&call);
            }
            HostArch::Aarch64 => {
                let call = aarch64::call_absolute(commit_stash);
                let disp = u16::try_from(stash_offset).expect("stashaddr offset must fit a u16");
                // `CBZ`'s immediate is relative to its own address, not the
                // following instruction (unlike x86_64's `jz` above), so
                // skipping the N-instruction call that follows needs N+1.
                let skip_instructions = (call.len() / 4) as i32 + 1;
                self.append(&aarch64::stash_check_and_skip(disp, skip_instructions));
                self.append(&call);
            }
        }
    }

    /// View of the bytes emitted so far (including overflowed attempts up
    /// to capacity), for tests and trace logging.
    #[must_use]
    pub fn emitted(&self) -> &[u8] {
        self.mapping.as_slice(self.index.min(self.capacity))
    }

    pub(crate) fn into_mapping(self) -> Result<(ExecutableMapping, usize), JitError> {
        if self.is_overflowed() {
            Err(JitError::Overflow { capacity: self.capacity })
        } else {
            Ok((self.mapping, self.index))
        }
    }
}
