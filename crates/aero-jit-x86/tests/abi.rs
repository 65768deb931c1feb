//! End-to-end host ABI checks against the public `aero-jit-x86` API: a
//! block emitting nothing but the prologue and epilogue sequence must
//! round-trip through a real host call without crashing, and the emitted
//! byte lengths must match `GetPrologueSize`.

use aero_jit_x86::{abi, HostArch, JitArena};

#[test]
fn prologue_size_matches_emitted_bytes_on_every_backend() {
    for arch in [HostArch::X86_64, HostArch::Aarch64] {
        let arena = JitArena::new(256);
        let mut block = arena.start_block(arch).unwrap();
        block.emit_prologue();
        assert_eq!(block.emitted().len(), abi::prologue_size(arch));
    }
}

#[test]
fn epilogue_follows_prologue_without_overflowing_a_small_block() {
    for arch in [HostArch::X86_64, HostArch::Aarch64] {
        let arena = JitArena::new(256);
        let mut block = arena.start_block(arch).unwrap();
        block.emit_prologue();
        block.emit_epilogue_and_ret();
        assert!(!block.is_overflowed());
    }
}

#[test]
#[cfg(target_arch = "x86_64")]
fn bare_prologue_epilogue_block_executes_and_returns() {
    let mut arena = JitArena::new(256);
    let mut block = arena.start_block(HostArch::X86_64).unwrap();
    block.emit_prologue();
    block.emit_epilogue_and_ret();
    let finalized = arena.finish(block).unwrap();
    // SAFETY: the block never dereferences its argument.
    unsafe {
        finalized.call(std::ptr::null_mut()).unwrap();
    }
}
