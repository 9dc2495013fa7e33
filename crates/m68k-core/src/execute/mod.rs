//! Instruction execution for the 68000 integer instruction set.
//!
//! The machine has already advanced the program counter past the whole
//! instruction when a handler runs, so branch targets are computed from the
//! instruction address rather than the live PC. A handler that returns a
//! [`Trap`] may have performed register or memory updates before the trap
//! was detected; the host sees the trap and decides what to do next.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::similar_names,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    unknown_lints,
    missing_docs
)]

mod arith;
mod bcd;
mod bits;
mod control;
mod data;
mod flags;
mod helpers;
mod logic;
mod shift;

pub use bcd::{bcd_add, bcd_sub};
pub use flags::FlagsUpdate;
pub use shift::{shift, ShiftKind};

use crate::decoder::Instruction;
use crate::encoding::HandlerId;
use crate::{Machine, Trap};

/// Executes one decoded instruction against the machine.
///
/// # Errors
///
/// Any [`Trap`] raised by the instruction.
#[allow(clippy::too_many_lines)]
pub fn execute_instruction(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    use HandlerId as H;

    match instr.handler {
        H::Nop => Ok(()),
        H::OriToCcr | H::AndiToCcr | H::EoriToCcr => logic::execute_ccr_immediate(machine, instr),
        H::OriToSr | H::AndiToSr | H::EoriToSr => logic::execute_sr_immediate(machine, instr),
        H::Ori | H::Andi | H::Eori => logic::execute_logic_immediate(machine, instr),
        H::Or | H::And => logic::execute_logic(machine, instr),
        H::Eor => logic::execute_eor(machine, instr),
        H::Not => logic::execute_not(machine, instr),
        H::Tst => logic::execute_tst(machine, instr),
        H::Tas => logic::execute_tas(machine, instr),

        H::Addi | H::Subi | H::Cmpi => arith::execute_arith_immediate(machine, instr),
        H::Add | H::Sub => arith::execute_add_sub(machine, instr),
        H::Cmp => arith::execute_cmp(machine, instr),
        H::Addq | H::Subq => arith::execute_quick(machine, instr),
        H::Adda | H::Suba | H::Cmpa => arith::execute_address_arith(machine, instr),
        H::Addx | H::Subx => arith::execute_extended(machine, instr),
        H::Cmpm => arith::execute_cmpm(machine, instr),
        H::Neg => arith::execute_neg(machine, instr),
        H::Negx => arith::execute_negx(machine, instr),
        H::Mulu | H::Muls => arith::execute_multiply(machine, instr),
        H::Divu | H::Divs => arith::execute_divide(machine, instr),

        H::Abcd | H::Sbcd => bcd::execute_bcd(machine, instr),
        H::Nbcd => bcd::execute_nbcd(machine, instr),

        H::AsrMemory
        | H::AslMemory
        | H::LsrMemory
        | H::LslMemory
        | H::RoxrMemory
        | H::RoxlMemory
        | H::RorMemory
        | H::RolMemory => shift::execute_shift_memory(machine, instr),
        H::AsrRegister
        | H::AslRegister
        | H::LsrRegister
        | H::LslRegister
        | H::RoxrRegister
        | H::RoxlRegister
        | H::RorRegister
        | H::RolRegister => shift::execute_shift_register(machine, instr),

        H::BtstStatic
        | H::BchgStatic
        | H::BclrStatic
        | H::BsetStatic
        | H::BtstDynamic
        | H::BchgDynamic
        | H::BclrDynamic
        | H::BsetDynamic => bits::execute_bit_op(machine, instr),

        H::Move => data::execute_move(machine, instr),
        H::Movea => data::execute_movea(machine, instr),
        H::Moveq => data::execute_moveq(machine, instr),
        H::MoveFromSr => data::execute_move_from_sr(machine, instr),
        H::MoveToCcr => data::execute_move_to_ccr(machine, instr),
        H::MoveToSr => data::execute_move_to_sr(machine, instr),
        H::MoveUsp => data::execute_move_usp(machine, instr),
        H::Movep => data::execute_movep(machine, instr),
        H::Movem => data::execute_movem(machine, instr),
        H::Clr => data::execute_clr(machine, instr),
        H::Ext => data::execute_ext(machine, instr),
        H::Swap => data::execute_swap(machine, instr),
        H::Exg => data::execute_exg(machine, instr),
        H::Lea => data::execute_lea(machine, instr),
        H::Pea => data::execute_pea(machine, instr),
        H::Link => data::execute_link(machine, instr),
        H::Unlk => data::execute_unlk(machine, instr),
        H::Scc => data::execute_scc(machine, instr),

        H::Bra | H::Bsr | H::Bcc => control::execute_branch(machine, instr),
        H::Dbcc => control::execute_dbcc(machine, instr),
        H::Jmp | H::Jsr => control::execute_jump(machine, instr),
        H::Rts => control::execute_rts(machine, instr),
        H::Rtr => control::execute_rtr(machine, instr),
        H::Rte => control::execute_rte(machine, instr),
        H::Trap | H::Trapv | H::Illegal => control::execute_trap(machine, instr),
        H::Chk => control::execute_chk(machine, instr),
        H::Stop => control::execute_stop(machine, instr),
        H::Reset => control::execute_reset(machine, instr),
    }
}
