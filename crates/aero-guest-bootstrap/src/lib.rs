//! Guest stack bootstrap: builds the argv/envp/auxv block a System-V-style
//! ELF loader expects to find at the initial stack pointer, before any JIT
//! path exists to run.
//!
//! Ported from blink's `LoadArgv` (`argv.c`). The virtual memory subsystem
//! is an external collaborator: this crate only ever calls its "copy bytes
//! to a guest physical address" operation, exposed here as
//! [`GuestMemoryWriter`] rather than depending on a full guest memory
//! crate, mirroring how `aero-jit-abi` stands in for the decoder and op
//! registry.

mod error;

pub use error::BootstrapError;

use aero_pc_constants::{AT_EXECFN, AT_NULL, STACK_ALIGN};

/// The "copy-to-guest" operation this crate consumes from the virtual
/// memory subsystem. Writes are always contiguous and always succeed
/// unless the backing store rejects the address range outright (e.g. it
/// falls outside mapped guest RAM).
pub trait GuestMemoryWriter {
    fn write_from(&mut self, guest_addr: u64, bytes: &[u8]) -> Result<(), String>;
}

/// Guest registers this crate touches: the stack pointer (read before, set
/// after) and `rdi`, which `LoadArgv` zeroes as a platform-probe
/// requirement ("or ape detects freebsd" in blink's own comment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapRegisters {
    pub sp: u64,
    pub rdi: u64,
}

fn push_string(
    memory: &mut dyn GuestMemoryWriter,
    sp: &mut u64,
    s: &str,
) -> Result<u64, BootstrapError> {
    let len = s.len() + 1; // + NUL terminator
    let needed = u64::try_from(len).expect("a single argv/envp string fits in a u64 length");
    *sp = sp.checked_sub(needed).ok_or(BootstrapError::StackUnderflow { needed })?;
    let mut bytes = vec![0u8; len];
    bytes[..s.len()].copy_from_slice(s.as_bytes());
    memory
        .write_from(*sp, &bytes)
        .map_err(|reason| BootstrapError::GuestWriteFailed { addr: *sp, len, reason })?;
    Ok(*sp)
}

/// `LoadArgv(m, prog, args, vars)`: builds the initial guest stack.
///
/// `initial_sp` is the guest stack pointer before any of this runs (e.g.
/// the top of the mapped guest stack region). Returns the registers the
/// caller must write back to the guest `Machine` (new `sp`, and `rdi`
/// zeroed).
pub fn load_argv(
    memory: &mut dyn GuestMemoryWriter,
    initial_sp: u64,
    prog: &str,
    args: &[&str],
    vars: &[&str],
) -> Result<BootstrapRegisters, BootstrapError> {
    let mut sp = initial_sp;

    // Step 1: push strings. Order mirrors blink's `LoadArgv`: prog first,
    // then envp strings (highest index first), then argv strings (highest
    // index first) — the reverse push order that, once the final pointer
    // block is assembled in step 3, yields each list back in its original
    // order.
    let prog_ptr = push_string(memory, &mut sp, prog)?;

    let mut var_ptrs = Vec::with_capacity(vars.len());
    for v in vars.iter().rev() {
        var_ptrs.push(push_string(memory, &mut sp, v)?);
    }
    var_ptrs.reverse();

    let mut arg_ptrs = Vec::with_capacity(args.len());
    for a in args.iter().rev() {
        arg_ptrs.push(push_string(memory, &mut sp, a)?);
    }
    arg_ptrs.reverse();

    // Step 2 + 3: assemble the pointer block in descending-address order:
    // argc, argv ptrs, NUL, envp ptrs, NUL, auxv entries, {0,0}.
    let mut block: Vec<u64> = Vec::with_capacity(1 + args.len() + 1 + vars.len() + 1 + 4);
    block.push(u64::try_from(args.len()).expect("argv count fits in a u64"));
    block.extend_from_slice(&arg_ptrs);
    block.push(0);
    block.extend_from_slice(&var_ptrs);
    block.push(0);
    block.push(AT_EXECFN);
    block.push(prog_ptr);
    block.push(AT_NULL);
    block.push(AT_NULL);

    let block_bytes = u64::try_from(block.len() * 8).expect("pointer block size fits in a u64");

    // Step 4: align so that `sp - block_bytes` is 16-byte aligned.
    while (sp.wrapping_sub(block_bytes)) % STACK_ALIGN != 0 {
        sp = sp.checked_sub(1).ok_or(BootstrapError::StackUnderflow { needed: 1 })?;
    }
    sp = sp.checked_sub(block_bytes).ok_or(BootstrapError::StackUnderflow { needed: block_bytes })?;

    // Step 5: copy the pointer block to guest memory.
    let mut bytes = Vec::with_capacity(block.len() * 8);
    for word in &block {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    memory
        .write_from(sp, &bytes)
        .map_err(|reason| BootstrapError::GuestWriteFailed { addr: sp, len: bytes.len(), reason })?;

    Ok(BootstrapRegisters { sp, rdi: 0 })
}
