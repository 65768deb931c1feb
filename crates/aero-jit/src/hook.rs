use std::collections::HashMap;

/// A dispatch function the interpreter loop would otherwise jump to via a
/// raw pointer. Modeled as a closed enum rather than an arbitrary function
/// pointer: any future dispatch kind is then a compile-time decision that
/// forces every `match` here — including `must_update_ip` — to say whether
/// it tolerates a deferred IP, instead of silently inheriting undefined
/// behavior from a new pointer value nobody classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookValue {
    /// Ordinary interpreter dispatch. The only hook kind the skew optimizer
    /// may defer an IP update across.
    General,
    /// Interpreter dispatch that refuses to start a second path at this PC
    /// (installed while a path is under construction here).
    Jitless,
    /// A staged native path entry, at this host address.
    Native(usize),
}

/// Maps guest program counter to dispatch function. In this single-threaded
/// model, `HashMap` already gives atomic observe-before/after-a-write
/// semantics for any single reader/writer pair; the many-reader /
/// single-writer contract for SMP guests is a documented requirement on a
/// real embedding, not something this in-process map enforces itself.
#[derive(Debug, Default)]
pub struct HookTable {
    entries: HashMap<u64, HookValue>,
}

impl HookTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `HasHook(pc)`.
    #[must_use]
    pub fn has_hook(&self, pc: u64) -> bool {
        self.entries.contains_key(&pc)
    }

    /// `GetHook(pc)`. `None` stands in for the "0 / evicted" sentinel.
    #[must_use]
    pub fn get_hook(&self, pc: u64) -> Option<HookValue> {
        self.entries.get(&pc).copied()
    }

    /// `SetHook(pc, funcptr)`.
    pub fn set_hook(&mut self, pc: u64, value: HookValue) {
        self.entries.insert(pc, value);
    }

    /// `SetHook(pc, 0)`: evicts any hook at `pc`.
    pub fn evict(&mut self, pc: u64) {
        self.entries.remove(&pc);
    }

    /// Clears every entry. Used when the JIT arena resets and every
    /// `Native` hook it backed becomes a dangling address.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
