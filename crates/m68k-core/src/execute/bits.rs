//! Single-bit test and modify.

use crate::decoder::Instruction;
use crate::ea::Operand;
use crate::encoding::HandlerId;
use crate::state::SR_Z;
use crate::{Machine, Trap};

/// `BTST`, `BCHG`, `BCLR`, `BSET` with a static or dynamic bit number.
///
/// The bit number is taken modulo 32 for a data register and modulo 8 for a
/// memory byte. Z reflects the bit before modification.
pub fn execute_bit_op(machine: &mut Machine, instr: &Instruction) -> Result<(), Trap> {
    use HandlerId as H;

    let number = match instr.handler {
        H::BtstStatic | H::BchgStatic | H::BclrStatic | H::BsetStatic => {
            u32::from(instr.extension.word())
        }
        _ => machine.registers.read_data(instr.high_register()),
    };
    let operand = machine.destination(instr)?;
    let modulo = if matches!(operand, Operand::DataRegister(_)) {
        31
    } else {
        7
    };
    let mask = 1u32 << (number & modulo);

    let value = machine.read(operand, instr.size)?;
    machine.registers.set_flag(SR_Z, value & mask == 0);
    let updated = match instr.handler {
        H::BchgStatic | H::BchgDynamic => value ^ mask,
        H::BclrStatic | H::BclrDynamic => value & !mask,
        H::BsetStatic | H::BsetDynamic => value | mask,
        _ => return Ok(()),
    };
    machine.write(operand, instr.size, updated)
}
