/// Tunables the path lifecycle leaves implicit: whether the JIT is enabled
/// at all, how large each path's code buffer is, and whether the trace
/// logger is active. A plain `Copy` struct with a `Default` favoring "on",
/// matching the shape of `aero_cpu_core::jit::runtime`'s config types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitConfig {
    /// `CreatePath` returns `false` immediately when this is `false`.
    pub enabled: bool,
    /// Per-path native code buffer capacity, in bytes.
    pub block_capacity: usize,
    /// Whether the optional trace logger is active for this run.
    pub trace: bool,
}

impl Default for JitConfig {
    fn default() -> Self {
        JitConfig {
            enabled: true,
            block_capacity: aero_jit_x86::arena::DEFAULT_BLOCK_CAPACITY,
            trace: false,
        }
    }
}
