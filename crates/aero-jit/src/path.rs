//! The path builder: `CreatePath`, `AddPath_StartOp`, `AddPath`,
//! `AddPath_EndOp`, `CompletePath`, `FinishPath`, `AbandonPath`, and the
//! skew manager's `FlushSkew`, ported from blink's `path.c`.
//!
//! Every emission site that needs the machine pointer in the call-argument
//! register restores it from `sav0` (the callee-saved register the
//! prologue parked it in) immediately before the call that needs it,
//! rather than relying on it surviving across an intervening call — nothing
//! pins down that liveness precisely enough to skip the restore safely, and
//! a spurious extra `mov` per call is free compared to a wrong machine
//! pointer.

use aero_jit_abi::{MachineHandle, Rde};
use aero_jit_x86::ArgReg;

use crate::error::PathError;
use crate::hook::HookValue;
use crate::machine::{Machine, System};
use crate::purity::must_update_ip;

/// Always passed in by `&mut` and invoked synchronously within
/// `AddPath_StartOp`, never stored or sent across a thread boundary — this
/// core is single-threaded per machine (§5) — so no `Send` bound is needed.
pub type StartOpHook = Box<dyn FnMut(u64, Rde)>;

unsafe extern "C" fn helper_add_ip(machine: MachineHandle, len: u64) {
    let m = &mut *machine.cast::<Machine>();
    m.ip += len;
}

unsafe extern "C" fn helper_skew_ip(machine: MachineHandle, total: u64, _len: u64) {
    let m = &mut *machine.cast::<Machine>();
    m.ip += total;
}

unsafe extern "C" fn helper_commit_stash(machine: MachineHandle) {
    let m = &mut *machine.cast::<Machine>();
    m.stashaddr = 0;
    m.reserving = false;
}

fn stashaddr_offset() -> u32 {
    u32::try_from(memoffset::offset_of!(Machine, stashaddr)).expect("Machine is far under 4GiB")
}

/// Lazy one-shot `ender` init: a JIT block holding only
/// the host leave sequence and a return, finalized as the shared epilogue
/// every completed path jumps to.
fn ensure_ender(system: &mut System, arch: aero_jit_x86::HostArch) -> Result<usize, PathError> {
    if let Some(addr) = system.ender() {
        return Ok(addr);
    }
    let mut block = system.arena.start_block(arch)?;
    block.emit_epilogue_and_ret();
    let finalized = system.arena.finish(block)?;
    let addr = finalized.entry_addr();
    system.set_ender(addr);
    Ok(addr)
}

/// `GetPrologueSize()`.
#[must_use]
pub fn get_prologue_size(arch: aero_jit_x86::HostArch) -> usize {
    aero_jit_x86::abi::prologue_size(arch)
}

/// `CreatePath(machine)`.
pub fn create_path(system: &mut System, machine: &mut Machine) -> bool {
    assert!(
        !machine.path.is_making_path(),
        "CreatePath precondition violated: a path is already active for this machine"
    );
    if !system.config.enabled {
        return false;
    }
    let pc = machine.ip;
    if pc == 0 {
        return false;
    }
    let arch = machine.arch();
    if ensure_ender(system, arch).is_err() {
        return false;
    }
    let mut block = match system.arena.start_block(arch) {
        Ok(block) => block,
        Err(_) => return false,
    };
    block.mark_start();
    block.emit_prologue();

    machine.path.start = pc;
    machine.path.elements = 0;
    machine.path.skew = 0;
    machine.path.jb = Some(block);

    system.hooks.set_hook(pc, HookValue::Jitless);
    system.logger.log_path_start(pc);
    true
}

/// `FlushSkew(machine)`: the standalone form, used at `CompletePath`. Emits
/// a plain `AddIp(skew)` call if skew is nonzero.
pub fn flush_skew(machine: &mut Machine) {
    let skew = machine.path.skew;
    if skew == 0 {
        return;
    }
    let block = machine.path.jb.as_mut().expect("FlushSkew called with no active path");
    block.emit_mov_reg(ArgReg::Arg0, ArgReg::Sav0);
    block.emit_set_reg(ArgReg::Arg1, skew);
    block.emit_call(helper_add_ip as usize);
    machine.path.skew = 0;
}

/// `AddPath_StartOp(machine, decoded)`.
pub fn add_path_start_op(system: &mut System, machine: &mut Machine, pc: u64, rde: Rde, hook: Option<&mut StartOpHook>) {
    assert!(machine.path.is_making_path(), "AddPath_StartOp called with no active path");
    machine.path.elements += 1;

    let len = u64::from(rde.oplength());
    let next_pc = pc.wrapping_add(len);
    let next_hook = system.hooks.get_hook(next_pc);

    if must_update_ip(rde, next_hook) {
        let skew = machine.path.skew;
        let block = machine.path.jb.as_mut().expect("path active");
        block.emit_mov_reg(ArgReg::Arg0, ArgReg::Sav0);
        if skew == 0 {
            block.emit_set_reg(ArgReg::Arg1, len);
            block.emit_call(helper_add_ip as usize);
        } else {
            block.emit_set_reg(ArgReg::Arg1, skew + len);
            block.emit_set_reg(ArgReg::Arg2, len);
            block.emit_call(helper_skew_ip as usize);
        }
        machine.path.skew = 0;
    } else {
        machine.path.skew += len;
    }

    let block = machine.path.jb.as_mut().expect("path active");
    block.emit_mov_reg(ArgReg::Arg0, ArgReg::Sav0);
    machine.reserving = false;

    let jit_pc = machine.path.jb.as_ref().expect("path active").jit_pc();
    system.logger.log_op(pc, rde.mopcode(), jit_pc);
    if let Some(hook) = hook {
        hook(pc, rde);
    }
}

/// `AddPath(machine, decoded)`.
pub fn add_path(system: &System, machine: &mut Machine, rde: Rde, disp: i64, uimm0: u64) -> bool {
    let Some(op) = system.op_registry().get_op(rde.mopcode()) else {
        return false;
    };
    let block = machine.path.jb.as_mut().expect("AddPath called with no active path");
    block.emit_set_reg(ArgReg::Arg1, rde.bits());
    block.emit_set_reg(ArgReg::Arg2, disp as u64);
    block.emit_set_reg(ArgReg::Arg3, uimm0);
    block.emit_call(op as usize);
    true
}

/// `AddPath_EndOp(machine, decoded)`.
pub fn add_path_end_op(machine: &mut Machine) {
    let block = machine.path.jb.as_mut().expect("AddPath_EndOp called with no active path");
    block.emit_mov_reg(ArgReg::Arg0, ArgReg::Sav0);
    block.emit_stash_check(stashaddr_offset(), helper_commit_stash as usize);
}

/// `CompletePath(machine)`.
pub fn complete_path(system: &mut System, machine: &mut Machine) {
    flush_skew(machine);
    let ender = system.ender().expect("ender initialized by CreatePath");
    let block = machine.path.jb.as_mut().expect("CompletePath called with no active path");
    block.emit_jump(ender);
    finish_path(system, machine);
}

/// `FinishPath(machine)`. A finalize-time OOM is not a propagated
/// error: it's handled in place (hook cleared, `path_ooms` bumped) exactly
/// like a successful finish, just without installing a native entry.
pub fn finish_path(system: &mut System, machine: &mut Machine) {
    let start = machine.path.start;
    let elements = machine.path.elements;
    let block = machine.path.jb.take().expect("FinishPath called with no active path");

    let bytes_emitted = block.bytes_since_start();
    match system.arena.finish(block) {
        Ok(finalized) => {
            let addr = finalized.entry_addr();
            system.hooks.set_hook(start, HookValue::Native(addr));
            system.stats.record_finished(elements, bytes_emitted.unwrap_or(0) as u64);
            system.logger.log_path_finished(start, bytes_emitted.unwrap_or(0));
        }
        Err(_) => {
            system.hooks.evict(start);
            system.stats.record_oom();
            system.logger.log_oom(start);
        }
    }
}

/// `AbandonPath(machine)`.
pub fn abandon_path(system: &mut System, machine: &mut Machine) {
    let start = machine.path.start;
    if let Some(block) = machine.path.jb.take() {
        system.arena.abandon(block);
    }
    machine.path.skew = 0;
    // Also clear `reserving`, since no future op boundary is coming to
    // clear it safely once a path is abandoned.
    machine.reserving = false;
    system.hooks.evict(start);
    system.stats.record_abandoned();
    system.logger.log_path_abandoned(start);
}
