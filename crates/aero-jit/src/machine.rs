use aero_jit_abi::OpRegistry;
use aero_jit_x86::{HostArch, JitArena};
use aero_pc_constants::GPR_COUNT;

use crate::config::JitConfig;
use crate::hook::HookTable;
use crate::logger::TraceLogger;
use crate::stats::PathStats;

/// The guest general-purpose register file. Semantic ops (an external
/// collaborator) are the only code that interprets individual slots; the
/// path core itself only ever touches `ip`/`reserving`/`stashaddr` on
/// [`Machine`] directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterFile {
    pub gpr: [u64; GPR_COUNT],
}

/// At most one active per [`Machine`]. `jb.is_some()` is the "is making
/// path" predicate named in the data model.
#[derive(Default)]
pub struct PathRecord {
    pub(crate) start: u64,
    pub(crate) elements: u64,
    pub(crate) skew: u64,
    pub(crate) jb: Option<aero_jit_x86::JitBlock>,
}

impl PathRecord {
    #[must_use]
    pub fn is_making_path(&self) -> bool {
        self.jb.is_some()
    }

    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    #[must_use]
    pub fn elements(&self) -> u64 {
        self.elements
    }

    #[must_use]
    pub fn skew(&self) -> u64 {
        self.skew
    }
}

/// One per emulated guest thread.
pub struct Machine {
    pub registers: RegisterFile,
    pub ip: u64,
    /// Set by a semantic op that is about to stash a pending guest-memory
    /// write; cleared by the emitted commit tail (or by this crate's
    /// `EndOp`-equivalent helper) once the write is committed.
    pub reserving: bool,
    /// Nonzero iff a pending stashed write is live.
    pub stashaddr: u64,
    pub path: PathRecord,
    arch: HostArch,
}

impl Machine {
    #[must_use]
    pub fn new(arch: HostArch) -> Self {
        Machine {
            registers: RegisterFile::default(),
            ip: 0,
            reserving: false,
            stashaddr: 0,
            path: PathRecord::default(),
            arch,
        }
    }

    #[must_use]
    pub fn arch(&self) -> HostArch {
        self.arch
    }

    /// Raw handle to pass as the first call argument of emitted native
    /// code, and to the internal `AddIp`/`SkewIp`/`CommitStash` helpers.
    /// Also how a caller invokes a finalized path's native entry directly
    /// (the entry point stored in [`HookValue::Native`]).
    ///
    /// # Safety contract for callers
    /// The returned pointer is only valid for the lifetime of the `&mut
    /// Machine` borrow that produced it, and must not be stored past a
    /// single call into JIT'd code.
    #[must_use]
    pub fn handle(&mut self) -> aero_jit_abi::MachineHandle {
        (self as *mut Machine).cast()
    }
}

/// Shared by every [`Machine`] under one emulated process.
pub struct System {
    pub arena: JitArena,
    pub hooks: HookTable,
    pub stats: PathStats,
    pub logger: TraceLogger,
    pub config: JitConfig,
    op_registry: Box<dyn OpRegistry>,
    /// `ender`: lazily initialized on first path.
    ender: Option<usize>,
}

impl System {
    #[must_use]
    pub fn new(config: JitConfig, op_registry: Box<dyn OpRegistry>) -> Self {
        System {
            arena: JitArena::new(config.block_capacity),
            hooks: HookTable::new(),
            stats: PathStats::default(),
            logger: TraceLogger::new(),
            config,
            op_registry,
            ender: None,
        }
    }

    #[must_use]
    pub fn op_registry(&self) -> &dyn OpRegistry {
        self.op_registry.as_ref()
    }

    #[must_use]
    pub fn ender(&self) -> Option<usize> {
        self.ender
    }

    pub(crate) fn set_ender(&mut self, addr: usize) {
        self.ender = Some(addr);
    }
}
