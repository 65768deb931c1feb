//! End-to-end scenarios for the path core: each test drives the public
//! lifecycle API the way an interpreter loop would, then
//! either inspects the hook table/stats or actually calls into the
//! finalized native entry and checks the guest IP it leaves behind.

use aero_jit::{
    abandon_path, add_path, add_path_end_op, add_path_start_op, complete_path, create_path,
    finish_path, HookValue, JitConfig, Machine, StartOpHook, System,
};
use aero_jit_abi::{MachineHandle, OpFn, OpRegistry, Rde};
use aero_jit_x86::{abi, HostArch};

struct NopRegistry;

unsafe extern "C" fn semantic_nop(_machine: MachineHandle, _rde: Rde, _disp: i64, _uimm0: u64) {}

impl OpRegistry for NopRegistry {
    fn get_op(&self, _mopcode: u16) -> Option<OpFn> {
        Some(semantic_nop)
    }
}

fn nop_rde() -> Rde {
    // mopcode value doesn't matter to the purity classifier beyond hitting
    // the OP_NOP arm; oplength=1 matches a real one-byte x86 NOP.
    Rde::new(aero_jit::purity::OP_NOP, 1, false, false)
}

fn system() -> System {
    System::new(JitConfig::default(), Box::new(NopRegistry))
}

fn host() -> HostArch {
    HostArch::current().expect("test host is x86_64 or aarch64")
}

fn build_nop_path(system: &mut System, machine: &mut Machine, pc: u64) {
    machine.ip = pc;
    assert!(create_path(system, machine));
    let rde = nop_rde();
    add_path_start_op(system, machine, pc, rde, None);
    assert!(add_path(system, machine, rde, 0, 0));
    add_path_end_op(machine);
}

#[test]
#[cfg(target_arch = "x86_64")]
fn scenario_1_single_nop_path_advances_ip_by_one() {
    let mut system = system();
    let mut machine = Machine::new(host());
    build_nop_path(&mut system, &mut machine, 0x1000);
    complete_path(&mut system, &mut machine);

    let native = match system.hooks.get_hook(0x1000) {
        Some(HookValue::Native(addr)) => addr,
        other => panic!("expected a native hook, got {other:?}"),
    };

    machine.ip = 0x1000;
    let handle = machine.handle();
    // SAFETY: `native` was just finalized for this host's architecture by
    // `complete_path` above, and `handle` stays valid for the call.
    let entry: unsafe extern "C" fn(MachineHandle) = unsafe { std::mem::transmute(native) };
    unsafe { entry(handle) };
    assert_eq!(machine.ip, 0x1001);
}

#[test]
fn scenario_2_pure_run_with_general_next_hook_emits_single_skew_flush() {
    let mut system = system();
    let mut machine = Machine::new(host());
    let rde = nop_rde();

    // In the running system the interpreter would already have visited
    // 0x2001..0x2003 as plain single steps before this path ever got hot
    // enough to build, installing GeneralDispatch at each in passing; the
    // scenario's setup only calls out 0x2003 because that's the one whose
    // absence would actually change behavior (deferring across it is the
    // thing under test).
    for next_pc in [0x2001u64, 0x2002, 0x2003] {
        system.hooks.set_hook(next_pc, HookValue::General);
    }

    machine.ip = 0x2000;
    assert!(create_path(&mut system, &mut machine));
    for pc in [0x2000u64, 0x2001, 0x2002] {
        add_path_start_op(&mut system, &mut machine, pc, rde, None);
        assert!(add_path(&system, &mut machine, rde, 0, 0));
        add_path_end_op(&mut machine);
        // Every op here is pure with a GeneralDispatch-bound successor, so
        // each one defers its IP update into skew instead of flushing.
        assert!(machine.path.skew() > 0, "op at {pc:#x} should have deferred into skew");
    }
    assert_eq!(machine.path.skew(), 3, "all three NOPs' lengths folded into one deferred update");
    complete_path(&mut system, &mut machine);
    assert_eq!(machine.path.skew(), 0, "CompletePath must flush residual skew");
}

#[test]
fn scenario_3_next_hook_non_general_forces_immediate_ip_update() {
    let mut system = system();
    let mut machine = Machine::new(host());
    let rde = nop_rde();

    system.hooks.set_hook(0x3001, HookValue::Native(0xdead_beef));

    machine.ip = 0x3000;
    assert!(create_path(&mut system, &mut machine));
    add_path_start_op(&mut system, &mut machine, 0x3000, rde, None);
    // The next PC's hook is non-general, so skew cannot absorb this op's
    // length: it must have been flushed immediately.
    assert_eq!(machine.path.skew(), 0);
}

#[test]
fn scenario_5_finalize_oom_clears_hook_and_bumps_stat() {
    // Sized to fit the shared `ender` trampoline (epilogue + ret) but not
    // this path's own prologue, so `CreatePath` succeeds (ender init
    // doesn't touch this path's block) while this path's own `finish` at
    // `FinishPath` overflows partway through just the prologue.
    let capacity = abi::prologue_size(host()) - 1;
    let mut system = System::new(
        JitConfig { block_capacity: capacity, ..JitConfig::default() },
        Box::new(NopRegistry),
    );
    let mut machine = Machine::new(host());
    machine.ip = 0x4000;
    assert!(create_path(&mut system, &mut machine));
    finish_path(&mut system, &mut machine);

    assert!(!system.hooks.has_hook(0x4000), "failed finalize must clear the hook, not leave Jitless");
    assert_eq!(system.stats.path_ooms, 1);
    assert!(!machine.path.is_making_path());
}

#[test]
fn scenario_6_abandon_resets_everything_to_interpreting() {
    let mut system = system();
    let mut machine = Machine::new(host());
    let rde = nop_rde();
    // A General next-hook lets the op's length defer into skew instead of
    // flushing immediately, so abandonment has nonzero skew to clear.
    system.hooks.set_hook(0x5001, HookValue::General);
    machine.ip = 0x5000;
    assert!(create_path(&mut system, &mut machine));
    add_path_start_op(&mut system, &mut machine, 0x5000, rde, None);
    assert!(add_path(&system, &mut machine, rde, 0, 0));
    add_path_end_op(&mut machine);
    assert!(machine.path.skew() > 0, "pure op with General next-hook should defer into skew");
    machine.reserving = true;

    abandon_path(&mut system, &mut machine);

    assert!(!system.hooks.has_hook(0x5000));
    assert_eq!(machine.path.skew(), 0);
    assert!(!machine.reserving);
    assert!(!machine.path.is_making_path());
    assert_eq!(system.stats.path_abandoned, 1);
}

#[test]
fn add_path_start_op_invokes_the_observer_hook_with_the_decoded_op() {
    let mut system = system();
    let mut machine = Machine::new(host());
    let rde = nop_rde();

    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let seen_in_hook = seen.clone();
    let mut observer: StartOpHook = Box::new(move |pc, rde| seen_in_hook.borrow_mut().push((pc, rde.mopcode())));

    machine.ip = 0x6000;
    assert!(create_path(&mut system, &mut machine));
    add_path_start_op(&mut system, &mut machine, 0x6000, rde, Some(&mut observer));

    assert_eq!(seen.borrow().as_slice(), &[(0x6000, rde.mopcode())]);
}
