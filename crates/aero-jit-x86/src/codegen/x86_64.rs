//! Raw x86_64 instruction encoders for the handful of shapes the path
//! builder ever emits: absolute loads/calls/jumps via a scratch register,
//! register-to-register moves between the argument and callee-saved
//! registers, and the stash/commit short-circuit compare-and-branch.
//!
//! These are hand-encoded rather than routed through an assembler crate:
//! the instruction set emitted here is tiny and fixed, and a real JIT's
//! codegen tier (not this one) is where a general encoder would belong.

use super::ArgReg;

/// System V AMD64 integer argument/callee-saved register codes this crate
/// ever names, as 3-bit ModR/M codes plus the REX extension bit.
fn reg_code(reg: ArgReg) -> u8 {
    match reg {
        ArgReg::Arg0 => 7,  // rdi
        ArgReg::Arg1 => 6,  // rsi
        ArgReg::Arg2 => 2,  // rdx
        ArgReg::Arg3 => 1,  // rcx
        ArgReg::Sav0 => 3,  // rbx
    }
}

/// r10, used as the scratch register for absolute calls/jumps. Chosen
/// because it's caller-saved and never a call argument, so clobbering it
/// between op calls is always safe.
const SCRATCH: u8 = 10;

/// `mov dst, src` (64-bit, register-to-register).
pub fn mov_reg(dst: ArgReg, src: ArgReg) -> Vec<u8> {
    encode_mov_r64(reg_code(dst), reg_code(src))
}

fn encode_mov_r64(dst: u8, src: u8) -> Vec<u8> {
    let rex = 0x48 | if src >= 8 { 0x4 } else { 0 } | if dst >= 8 { 0x1 } else { 0 };
    let modrm = 0xC0 | ((src & 7) << 3) | (dst & 7);
    vec![rex, 0x89, modrm]
}

/// `mov reg, imm64`.
pub fn set_reg(reg: ArgReg, imm: u64) -> Vec<u8> {
    encode_movabs(reg_code(reg), imm)
}

fn encode_movabs(reg: u8, imm: u64) -> Vec<u8> {
    let rex = 0x48 | if reg >= 8 { 0x1 } else { 0 };
    let opcode = 0xB8 | (reg & 7);
    let mut out = vec![rex, opcode];
    out.extend_from_slice(&imm.to_le_bytes());
    out
}

/// `mov r10, imm64; call r10`. Absolute (not rel32) so the target need not
/// be within 2GiB of the emitted code, which `mmap`'d JIT memory on a
/// modern ASLR host makes no guarantee of.
pub fn call_absolute(target: usize) -> Vec<u8> {
    let mut out = encode_movabs(SCRATCH, target as u64);
    out.extend_from_slice(&[0x41, 0xFF, 0xD2]); // call r10
    out
}

/// `mov r10, imm64; jmp r10`.
pub fn jump_absolute(target: usize) -> Vec<u8> {
    let mut out = encode_movabs(SCRATCH, target as u64);
    out.extend_from_slice(&[0x41, 0xFF, 0xE2]); // jmp r10
    out
}

pub fn ret() -> Vec<u8> {
    vec![0xC3]
}

/// `cmpq $0x0, disp8(%rdi); jz +skip`. `skip` is the caller-supplied length
/// of the call sequence that follows, so this stays correct regardless of
/// how the call itself is encoded (unlike a hardcoded branch-distance
/// constant tied to one specific call-encoding choice).
pub fn stash_check_and_skip(disp8: u8, skip: u8) -> Vec<u8> {
    vec![
        0x48, 0x83, 0x78 | 7, disp8, 0x00, // cmpq $0x0, disp8(%rdi)
        0x74, skip, // jz +skip
    ]
}
