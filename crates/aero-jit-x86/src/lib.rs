//! Host-native code emitter: the low-level primitive `aero-jit`'s path
//! builder is layered on top of. Owns executable memory, knows the two
//! supported host ABIs' prologue/epilogue bytes, and can encode the small
//! set of instruction shapes (load-immediate, move, absolute call/jump,
//! return, stash-check-and-branch) the path builder ever asks for.
//!
//! Nothing in this crate understands guest instruction semantics; it only
//! ever sees opaque call targets and immediates handed to it by the path
//! builder.

pub mod abi;
pub mod arch;
pub mod arena;
pub mod block;
pub mod codegen;
pub mod error;
mod exec;
mod mapping;

pub use arch::HostArch;
pub use arena::JitArena;
pub use block::JitBlock;
pub use codegen::ArgReg;
pub use error::JitError;
pub use exec::FinalizedBlock;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_finish_and_reset_round_trip() {
        let mut arena = JitArena::new(256);
        let arch = HostArch::current().expect("test host is x86_64 or aarch64");
        let mut block = arena.start_block(arch).unwrap();
        block.emit_prologue();
        block.emit_epilogue_and_ret();
        let finalized = arena.finish(block).unwrap();
        assert_eq!(finalized.arch(), arch);
        assert_eq!(arena.finalized_count(), 1);
        arena.reset();
        assert_eq!(arena.finalized_count(), 0);
    }

    #[test]
    fn overflowing_block_fails_to_finish() {
        let arena = JitArena::new(4);
        let arch = HostArch::current().expect("test host is x86_64 or aarch64");
        let mut block = arena.start_block(arch).unwrap();
        block.append(&[0u8; 8]);
        assert!(block.is_overflowed());
        let err = block.into_mapping().unwrap_err();
        assert!(matches!(err, JitError::Overflow { capacity: 4 }));
    }

    #[test]
    fn abandon_does_not_register_a_finalized_block() {
        let arena = JitArena::new(64);
        let arch = HostArch::current().expect("test host is x86_64 or aarch64");
        let block = arena.start_block(arch).unwrap();
        arena.abandon(block);
        assert_eq!(arena.finalized_count(), 0);
    }

    #[test]
    #[cfg(target_arch = "x86_64")]
    fn a_finalized_block_that_just_returns_executes_cleanly() {
        let mut arena = JitArena::new(256);
        let mut block = arena.start_block(HostArch::X86_64).unwrap();
        block.emit_prologue();
        block.emit_epilogue_and_ret();
        let finalized = arena.finish(block).unwrap();
        // SAFETY: the block is a bare prologue+epilogue+ret; it never
        // dereferences its argument, so any pointer value is fine here.
        unsafe {
            finalized.call(std::ptr::null_mut()).unwrap();
        }
    }
}
