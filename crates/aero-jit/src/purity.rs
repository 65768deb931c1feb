//! The purity classifier: `IsPure`/`MustUpdateIp`, grounded directly in
//! blink's `IsPure` (`path.c`), which switches on its internal micro-opcode
//! value. This crate's `Rde` descriptor (`aero-jit-abi`) is a self-contained
//! 12-bit mopcode space rather than blink's literal encoding, so the
//! constants below assign one representative mopcode per named instruction
//! — illustrative values, not a byte-identical port — while the three-way
//! classification logic they feed is a direct port of blink's `IsPure`
//! switch.

use aero_jit_abi::Rde;

use crate::hook::HookValue;

/// Unconditionally pure: NOP.
pub const OP_NOP: u16 = 0x090;
/// Unconditionally pure: `SAHF`.
pub const OP_SAHF: u16 = 0x09e;
/// Unconditionally pure: `LAHF`.
pub const OP_LAHF: u16 = 0x09f;
/// Unconditionally pure: `CLC`/`STC`/`CMC`/`SALC` flag manipulation.
pub const OP_CLC: u16 = 0x0a0;
pub const OP_STC: u16 = 0x0a1;
pub const OP_CMC: u16 = 0x0a2;
pub const OP_SALC: u16 = 0x0a3;
/// Unconditionally pure: immediate-to-accumulator arithmetic (`ADD AL,Ib`
/// and friends).
pub const OP_ALU_IMM_ACC: u16 = 0x004;
/// Unconditionally pure: `BSWAP` on a register.
pub const OP_BSWAP: u16 = 0x1c8;
/// Unconditionally pure: `XCHG` with the accumulator.
pub const OP_XCHG_ACC: u16 = 0x0b0;
/// Unconditionally pure: `MOVMSK`.
pub const OP_MOVMSK: u16 = 0x0b8;
/// Unconditionally pure: absolute `MOV` between RAX and a memory offset
/// (pure because IP advancement is still a pure `+=len` side effect
/// regardless of the memory access this op itself performs).
pub const OP_MOV_RAX_OFFSET: u16 = 0x0a8;

/// Pure iff ModR/M names a register: the general ALU family.
pub const OP_ALU_RM: u16 = 0x000;
/// Pure iff ModR/M names a register: `MOV r/r`.
pub const OP_MOV_RM: u16 = 0x080;
/// Pure iff ModR/M names a register: `XCHG r/r`.
pub const OP_XCHG_RM: u16 = 0x086;
/// Pure iff ModR/M names a register: shift/rotate group.
pub const OP_SHIFT_RM: u16 = 0x0c0;
/// Pure iff ModR/M names a register: `TEST`.
pub const OP_TEST_RM: u16 = 0x0f6;
/// Pure iff ModR/M names a register: `IMUL` with a register source.
pub const OP_IMUL_RM: u16 = 0x069;
/// Pure iff ModR/M names a register: `CMOVcc` (16 condition codes).
pub const OP_CMOVCC_BASE: u16 = 0x140;
/// Pure iff ModR/M names a register: `SETcc` (16 condition codes).
pub const OP_SETCC_BASE: u16 = 0x190;
/// Pure iff ModR/M names a register: `BT`/`BTR`/`BTS`/`BTC`.
pub const OP_BT_FAMILY: u16 = 0x1a3;
/// Pure iff ModR/M names a register: `BSF`/`BSR`.
pub const OP_BSF: u16 = 0x1bc;
pub const OP_BSR: u16 = 0x1bd;
/// Pure iff ModR/M names a register: `MOVZX`/`MOVSX`.
pub const OP_MOVZX: u16 = 0x1b6;
pub const OP_MOVSX: u16 = 0x1be;
/// Pure iff ModR/M names a register: double-precision shift (`SHLD`/`SHRD`).
pub const OP_SHLD: u16 = 0x1a4;
pub const OP_SHRD: u16 = 0x1ac;

/// LEA: pure iff its memory operand is not RIP-relative.
pub const OP_LEA: u16 = 0x08d;

const CMOVCC_RANGE: std::ops::RangeInclusive<u16> = OP_CMOVCC_BASE..=(OP_CMOVCC_BASE + 0xf);
const SETCC_RANGE: std::ops::RangeInclusive<u16> = OP_SETCC_BASE..=(OP_SETCC_BASE + 0xf);

/// `IsPure(rde)`: does this op's only observable effect on control state
/// reduce to `IP += Oplength(rde)`?
#[must_use]
pub fn is_pure(rde: Rde) -> bool {
    let mopcode = rde.mopcode();
    match mopcode {
        OP_NOP | OP_SAHF | OP_LAHF | OP_CLC | OP_STC | OP_CMC | OP_SALC | OP_ALU_IMM_ACC
        | OP_BSWAP | OP_XCHG_ACC | OP_MOVMSK | OP_MOV_RAX_OFFSET => true,

        OP_ALU_RM | OP_MOV_RM | OP_XCHG_RM | OP_SHIFT_RM | OP_TEST_RM | OP_IMUL_RM
        | OP_BT_FAMILY | OP_BSF | OP_BSR | OP_MOVZX | OP_MOVSX | OP_SHLD | OP_SHRD => {
            rde.is_modrm_register()
        }
        m if CMOVCC_RANGE.contains(&m) || SETCC_RANGE.contains(&m) => rde.is_modrm_register(),

        OP_LEA => !rde.is_rip_relative(),

        _ => false,
    }
}

/// `MustUpdateIp(machine, rde)`: must the precise guest IP be materialized
/// before the next op, rather than folded into `skew`?
///
/// True when the op itself is impure, or the immediately-following guest PC
/// has no hook, or that hook is anything other than [`HookValue::General`]
/// — any other consumer of that PC needs a precise IP, so skew cannot be
/// deferred across it.
#[must_use]
pub fn must_update_ip(rde: Rde, next_hook: Option<HookValue>) -> bool {
    if !is_pure(rde) {
        return true;
    }
    match next_hook {
        None => true,
        Some(HookValue::General) => false,
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rde(mopcode: u16, is_modrm_register: bool, is_rip_relative: bool) -> Rde {
        Rde::new(mopcode, 1, is_modrm_register, is_rip_relative)
    }

    #[test]
    fn unconditionally_pure_ignores_modrm() {
        assert!(is_pure(rde(OP_NOP, false, false)));
        assert!(is_pure(rde(OP_SAHF, true, true)));
    }

    #[test]
    fn modrm_conditional_tracks_is_modrm_register() {
        assert!(is_pure(rde(OP_ALU_RM, true, false)));
        assert!(!is_pure(rde(OP_ALU_RM, false, false)));
        assert!(is_pure(rde(OP_CMOVCC_BASE + 3, true, false)));
        assert!(!is_pure(rde(OP_SETCC_BASE + 9, false, false)));
    }

    #[test]
    fn lea_tracks_rip_relative_independent_of_modrm() {
        assert!(is_pure(rde(OP_LEA, false, false)));
        assert!(!is_pure(rde(OP_LEA, true, true)));
    }

    #[test]
    fn unclassified_opcode_is_impure() {
        assert!(!is_pure(rde(0x0e8, true, false)));
    }

    #[test]
    fn must_update_ip_true_for_impure_op() {
        assert!(must_update_ip(rde(0x0e8, false, false), Some(HookValue::General)));
    }

    #[test]
    fn must_update_ip_false_only_for_pure_op_with_general_next_hook() {
        let pure = rde(OP_NOP, false, false);
        assert!(!must_update_ip(pure, Some(HookValue::General)));
        assert!(must_update_ip(pure, None));
        assert!(must_update_ip(pure, Some(HookValue::Jitless)));
        assert!(must_update_ip(pure, Some(HookValue::Native(0x1000))));
    }
}
