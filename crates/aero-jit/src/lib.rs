//! The path-based JIT compiler core of a user-mode x86_64 emulator: hook
//! table, path builder lifecycle, purity classifier driving the IP-skew
//! optimization, and the stash/commit protocol glue. Layered on the
//! host-native code emitter in `aero-jit-x86`; the instruction decoder and
//! per-opcode semantic ops are external collaborators consumed through the
//! `aero-jit-abi` contract.

pub mod config;
pub mod error;
pub mod hook;
pub mod logger;
pub mod machine;
pub mod path;
pub mod purity;
pub mod stats;

pub use config::JitConfig;
pub use error::PathError;
pub use hook::{HookTable, HookValue};
pub use logger::{BufferSink, FileSink, SharedBufferSink, TraceLogger, TraceSink};
pub use machine::{Machine, PathRecord, RegisterFile, System};
pub use path::{
    abandon_path, add_path, add_path_end_op, add_path_start_op, complete_path, create_path,
    finish_path, flush_skew, get_prologue_size, StartOpHook,
};
pub use stats::PathStats;

#[cfg(test)]
mod tests {
    use super::*;
    use aero_jit_abi::{OpFn, OpRegistry, Rde};
    use aero_jit_x86::HostArch;

    struct NopRegistry;

    unsafe extern "C" fn semantic_nop(_machine: aero_jit_abi::MachineHandle, _rde: Rde, _disp: i64, _uimm0: u64) {}

    impl OpRegistry for NopRegistry {
        fn get_op(&self, _mopcode: u16) -> Option<OpFn> {
            Some(semantic_nop)
        }
    }

    fn test_system() -> System {
        System::new(JitConfig::default(), Box::new(NopRegistry))
    }

    #[test]
    fn create_path_rejects_zero_pc() {
        let mut system = test_system();
        let arch = HostArch::current().expect("test host supported");
        let mut machine = Machine::new(arch);
        machine.ip = 0;
        assert!(!create_path(&mut system, &mut machine));
    }

    #[test]
    fn create_path_installs_jitless_hook() {
        let mut system = test_system();
        let arch = HostArch::current().expect("test host supported");
        let mut machine = Machine::new(arch);
        machine.ip = 0x1000;
        assert!(create_path(&mut system, &mut machine));
        assert_eq!(system.hooks.get_hook(0x1000), Some(HookValue::Jitless));
        assert!(machine.path.is_making_path());
    }

    #[test]
    #[should_panic(expected = "already active")]
    fn create_path_twice_panics() {
        let mut system = test_system();
        let arch = HostArch::current().expect("test host supported");
        let mut machine = Machine::new(arch);
        machine.ip = 0x1000;
        assert!(create_path(&mut system, &mut machine));
        create_path(&mut system, &mut machine);
    }

    #[test]
    fn abandon_path_clears_state_and_evicts_hook() {
        let mut system = test_system();
        let arch = HostArch::current().expect("test host supported");
        let mut machine = Machine::new(arch);
        machine.ip = 0x3000;
        assert!(create_path(&mut system, &mut machine));
        machine.path.skew = 5;
        machine.reserving = true;
        abandon_path(&mut system, &mut machine);
        assert!(!system.hooks.has_hook(0x3000));
        assert_eq!(machine.path.skew(), 0);
        assert!(!machine.reserving);
        assert!(!machine.path.is_making_path());
        assert_eq!(system.stats.path_abandoned, 1);
    }
}
