//! Raw AArch64 instruction encoders, the counterpart to
//! [`super::x86_64`]. Instructions are emitted as `u32` words (native
//! instruction width) and flattened to little-endian bytes when appended to
//! a block.

use super::ArgReg;

fn reg_code(reg: ArgReg) -> u32 {
    match reg {
        ArgReg::Arg0 => 0,  // x0
        ArgReg::Arg1 => 1,  // x1
        ArgReg::Arg2 => 2,  // x2
        ArgReg::Arg3 => 3,  // x3
        ArgReg::Sav0 => 19, // x19
    }
}

/// x16 (IP0): reserved by AAPCS64 for veneers/scratch use, never a call
/// argument or callee-saved register.
const SCRATCH: u32 = 16;
/// x1 is free to use as scratch inside the stash-check tail: it's not yet
/// holding a live operand at the point that check runs.
const STASH_SCRATCH: u32 = 1;

pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 4);
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    out
}

/// `MOV Xd, Xm` (the `ORR Xd, XZR, Xm` alias).
pub fn mov_reg(dst: ArgReg, src: ArgReg) -> Vec<u8> {
    words_to_bytes(&[0xAA00_03E0 | (reg_code(src) << 16) | reg_code(dst)])
}

fn load_imm64(reg: u32, imm: u64) -> Vec<u32> {
    let mut words = Vec::with_capacity(4);
    words.push(0xD280_0000 | (0 << 21) | (((imm & 0xffff) as u32) << 5) | reg);
    for hw in 1..4u32 {
        let chunk = ((imm >> (hw * 16)) & 0xffff) as u32;
        words.push(0xF280_0000 | (hw << 21) | (chunk << 5) | reg);
    }
    words
}

pub fn set_reg(reg: ArgReg, imm: u64) -> Vec<u8> {
    words_to_bytes(&load_imm64(reg_code(reg), imm))
}

/// `BLR x16`.
pub fn call_absolute(target: usize) -> Vec<u8> {
    let mut words = load_imm64(SCRATCH, target as u64);
    words.push(0xD63F_0000 | (SCRATCH << 5));
    words_to_bytes(&words)
}

/// `BR x16`.
pub fn jump_absolute(target: usize) -> Vec<u8> {
    let mut words = load_imm64(SCRATCH, target as u64);
    words.push(0xD61F_0000 | (SCRATCH << 5));
    words_to_bytes(&words)
}

pub fn ret() -> Vec<u8> {
    words_to_bytes(&[0xD65F_03C0])
}

/// `LDR x1, [x0, #disp]; CBZ x1, +skip_instructions`. `disp` must be a
/// multiple of 8; `skip_instructions` counts whole instructions (not
/// bytes), matching AArch64's instruction-granular branch immediates.
///
/// `CBZ`'s immediate is relative to the `CBZ` instruction's own address, not
/// the next instruction, so a caller skipping an `N`-instruction sequence
/// that immediately follows this `CBZ` must pass `N + 1`, not `N` (blink's
/// own `kSkipStash` uses `+2` to skip its one-instruction call).
pub fn stash_check_and_skip(disp: u16, skip_instructions: i32) -> Vec<u8> {
    assert_eq!(disp % 8, 0, "LDR unsigned offset must be 8-byte aligned");
    let ldr = 0xF940_0000 | ((u32::from(disp) / 8) << 10) | (reg_code(ArgReg::Arg0) << 5) | STASH_SCRATCH;
    let cbz = 0xB400_0000 | (((skip_instructions as u32) & 0x7ffff) << 5) | STASH_SCRATCH;
    words_to_bytes(&[ldr, cbz])
}
