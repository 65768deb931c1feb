//! Dependency-free numeric constants shared by the JIT core and the guest
//! bootstrap code.
//!
//! Kept as its own crate, a leaf with zero dependencies, so that both
//! `aero-jit` and `aero-guest-bootstrap` can depend on it without pulling
//! each other in.
#![no_std]

/// Byte alignment the initial guest stack pointer must satisfy after the
/// argv/envp/auxv block has been reserved, per the System V x86-64 ABI.
pub const STACK_ALIGN: u64 = 16;

/// `AT_EXECFN` auxiliary vector key: value is the guest address of the
/// NUL-terminated program path string.
pub const AT_EXECFN: u64 = 31;

/// `AT_NULL`: terminates the auxiliary vector.
pub const AT_NULL: u64 = 0;

/// Number of general-purpose guest registers modeled by the path core's
/// `Machine` register file (rax..r15).
pub const GPR_COUNT: usize = 16;

/// Minimum host file descriptor the optional trace logger is willing to
/// land on after `dup`-ing its log fd away from low-numbered descriptors
/// that guest code might expect to be free (stdin/stdout/stderr and a
/// handful of reserved slots).
pub const MIN_TRACE_LOG_FD: i32 = 64;
