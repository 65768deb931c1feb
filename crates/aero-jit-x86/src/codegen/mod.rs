pub mod aarch64;
pub mod x86_64;

/// The four call-argument slots `AddPath`/`AddPath_EndOp` ever touch: the
/// machine pointer (restored from the callee-saved scratch before every op
/// call) and the three semantic-op operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgReg {
    /// First call argument: the machine pointer.
    Arg0,
    /// Second call argument: `rde`.
    Arg1,
    /// Third call argument: `disp`.
    Arg2,
    /// Fourth call argument: `uimm0`.
    Arg3,
    /// The callee-saved register the prologue parks the machine pointer in.
    Sav0,
}
