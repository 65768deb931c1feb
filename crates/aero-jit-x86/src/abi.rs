//! Host-ABI prologue/epilogue byte sequences every JIT path begins and ends
//! with. Bit-exact per architecture: these are calling-convention artifacts
//! of the host CPU, not something a register allocator derives, so they're
//! plain byte/word tables rather than anything generated.
//!
//! `x86_64`: establishes a frame, spills the five callee-saved GPRs the path
//! body is free to clobber, and parks the machine pointer (the first call
//! argument) in `rbx` — a callee-saved scratch the path body restores into
//! the argument register before every op call.
//!
//! `aarch64`: the AAPCS64 equivalent, parking the machine pointer in `x19`.

use crate::arch::HostArch;

pub const X86_64_ENTER: &[u8] = &[
    0x55, // push %rbp
    0x48, 0x89, 0xe5, // mov %rsp,%rbp
    0x48, 0x83, 0xec, 0x30, // sub $0x30,%rsp
    0x48, 0x89, 0x5d, 0xd8, // mov %rbx,-0x28(%rbp)
    0x4c, 0x89, 0x65, 0xe0, // mov %r12,-0x20(%rbp)
    0x4c, 0x89, 0x6d, 0xe8, // mov %r13,-0x18(%rbp)
    0x4c, 0x89, 0x75, 0xf0, // mov %r14,-0x10(%rbp)
    0x4c, 0x89, 0x7d, 0xf8, // mov %r15,-0x8(%rbp)
    0x48, 0x89, 0xfb, // mov %rdi,%rbx
];

pub const X86_64_LEAVE: &[u8] = &[
    0x4c, 0x8b, 0x7d, 0xf8, // mov -0x8(%rbp),%r15
    0x4c, 0x8b, 0x75, 0xf0, // mov -0x10(%rbp),%r14
    0x4c, 0x8b, 0x6d, 0xe8, // mov -0x18(%rbp),%r13
    0x4c, 0x8b, 0x65, 0xe0, // mov -0x20(%rbp),%r12
    0x48, 0x8b, 0x5d, 0xd8, // mov -0x28(%rbp),%rbx
    0x48, 0x83, 0xc4, 0x30, // add $0x30,%rsp
    0x5d, // pop %rbp
];

pub const AARCH64_ENTER: &[u32] = &[
    0xa9bc7bfd, // stp x29,x30,[sp,#-64]!
    0x910003fd, // mov x29,sp
    0xa90153f3, // stp x19,x20,[sp,#16]
    0xa9025bf5, // stp x21,x22,[sp,#32]
    0xa90363f7, // stp x23,x24,[sp,#48]
    0xaa0003f3, // mov x19,x0
];

pub const AARCH64_LEAVE: &[u32] = &[
    0xa94153f3, // ldp x19,x20,[sp,#16]
    0xa9425bf5, // ldp x21,x22,[sp,#32]
    0xa94363f7, // ldp x23,x24,[sp,#48]
    0xa8c47bfd, // ldp x29,x30,[sp],#64
];

/// `GetPrologueSize()`: bytes the path body's first real instruction begins
/// after, used by `CreatePath` to record `jb->index` past the prologue.
#[must_use]
pub fn prologue_size(arch: HostArch) -> usize {
    match arch {
        HostArch::X86_64 => X86_64_ENTER.len(),
        HostArch::Aarch64 => AARCH64_ENTER.len() * 4,
    }
}
