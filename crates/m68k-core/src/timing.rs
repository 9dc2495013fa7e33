use crate::encoding::HandlerId;

/// Instruction classes that share an approximate base cycle cost.
///
/// Costs are the register-form figures for a 68000; effective-address and
/// operand-dependent penalties are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleCostKind {
    /// `NOP`.
    Nop,
    /// `MOVE`, `MOVEA`, `MOVEQ`.
    Move,
    /// Register ALU forms (`ADD`, `AND`, `CMP`, `NOT`, `TST`, ...).
    Alu,
    /// Immediate ALU forms (`ADDI`, `ORI`, `CMPI`, ...).
    AluImmediate,
    /// `ADDA`, `SUBA`, `CMPA`.
    AddressArithmetic,
    /// `ADDX`, `SUBX`, `CMPM`, `NEGX`.
    Extended,
    /// `ABCD`, `SBCD`, `NBCD`.
    Decimal,
    /// Shift and rotate group.
    Shift,
    /// `BTST`, `BCHG`, `BCLR`, `BSET`.
    BitOp,
    /// `MULU`, `MULS`.
    Multiply,
    /// `DIVU`, `DIVS`.
    Divide,
    /// `Bcc`, `BRA`, `DBcc`.
    Branch,
    /// `JMP`.
    Jump,
    /// `BSR`, `JSR`.
    Call,
    /// `RTS`, `RTR`.
    Return,
    /// `RTE`.
    ExceptionReturn,
    /// `LEA`, `PEA`.
    EffectiveAddress,
    /// `MOVEM`, `MOVEP`.
    MultipleTransfer,
    /// `LINK`, `UNLK`.
    Frame,
    /// `EXG`, `SWAP`, `EXT`, `Scc`, `CLR`.
    Register,
    /// Status-register moves and immediates, `MOVE USP`.
    Status,
    /// `TAS`.
    TestAndSet,
    /// `CHK`.
    Chk,
    /// Exception entry for `TRAP`, `TRAPV`, `ILLEGAL`.
    Exception,
    /// `STOP`.
    Stop,
    /// `RESET`.
    Reset,
}

/// Single source-of-truth base cycle cost table.
pub const CYCLE_COST_TABLE: &[(CycleCostKind, u16)] = &[
    (CycleCostKind::Nop, 4),
    (CycleCostKind::Move, 4),
    (CycleCostKind::Alu, 4),
    (CycleCostKind::AluImmediate, 8),
    (CycleCostKind::AddressArithmetic, 8),
    (CycleCostKind::Extended, 4),
    (CycleCostKind::Decimal, 6),
    (CycleCostKind::Shift, 6),
    (CycleCostKind::BitOp, 6),
    (CycleCostKind::Multiply, 70),
    (CycleCostKind::Divide, 140),
    (CycleCostKind::Branch, 10),
    (CycleCostKind::Jump, 8),
    (CycleCostKind::Call, 18),
    (CycleCostKind::Return, 16),
    (CycleCostKind::ExceptionReturn, 20),
    (CycleCostKind::EffectiveAddress, 4),
    (CycleCostKind::MultipleTransfer, 12),
    (CycleCostKind::Frame, 16),
    (CycleCostKind::Register, 4),
    (CycleCostKind::Status, 12),
    (CycleCostKind::TestAndSet, 10),
    (CycleCostKind::Chk, 10),
    (CycleCostKind::Exception, 34),
    (CycleCostKind::Stop, 4),
    (CycleCostKind::Reset, 132),
];

/// Looks up the cycle cost for a cycle-cost kind.
#[must_use]
pub fn cycle_cost(kind: CycleCostKind) -> Option<u16> {
    CYCLE_COST_TABLE
        .iter()
        .find_map(|(entry_kind, cycles)| (*entry_kind == kind).then_some(*cycles))
}

/// Maps a handler onto its cost class.
#[must_use]
pub const fn cost_kind(handler: HandlerId) -> CycleCostKind {
    use HandlerId as H;
    match handler {
        H::Nop => CycleCostKind::Nop,
        H::Move | H::Movea | H::Moveq => CycleCostKind::Move,
        H::Or | H::And | H::Eor | H::Add | H::Sub | H::Cmp | H::Not | H::Neg | H::Tst
        | H::Addq | H::Subq => CycleCostKind::Alu,
        H::Ori | H::Andi | H::Eori | H::Addi | H::Subi | H::Cmpi => CycleCostKind::AluImmediate,
        H::Adda | H::Suba | H::Cmpa => CycleCostKind::AddressArithmetic,
        H::Addx | H::Subx | H::Cmpm | H::Negx => CycleCostKind::Extended,
        H::Abcd | H::Sbcd | H::Nbcd => CycleCostKind::Decimal,
        H::AsrMemory
        | H::AslMemory
        | H::LsrMemory
        | H::LslMemory
        | H::RoxrMemory
        | H::RoxlMemory
        | H::RorMemory
        | H::RolMemory
        | H::AsrRegister
        | H::AslRegister
        | H::LsrRegister
        | H::LslRegister
        | H::RoxrRegister
        | H::RoxlRegister
        | H::RorRegister
        | H::RolRegister => CycleCostKind::Shift,
        H::BtstStatic
        | H::BchgStatic
        | H::BclrStatic
        | H::BsetStatic
        | H::BtstDynamic
        | H::BchgDynamic
        | H::BclrDynamic
        | H::BsetDynamic => CycleCostKind::BitOp,
        H::Mulu | H::Muls => CycleCostKind::Multiply,
        H::Divu | H::Divs => CycleCostKind::Divide,
        H::Bra | H::Bcc | H::Dbcc => CycleCostKind::Branch,
        H::Jmp => CycleCostKind::Jump,
        H::Bsr | H::Jsr => CycleCostKind::Call,
        H::Rts | H::Rtr => CycleCostKind::Return,
        H::Rte => CycleCostKind::ExceptionReturn,
        H::Lea | H::Pea => CycleCostKind::EffectiveAddress,
        H::Movem | H::Movep => CycleCostKind::MultipleTransfer,
        H::Link | H::Unlk => CycleCostKind::Frame,
        H::Exg | H::Swap | H::Ext | H::Scc | H::Clr => CycleCostKind::Register,
        H::OriToCcr
        | H::OriToSr
        | H::AndiToCcr
        | H::AndiToSr
        | H::EoriToCcr
        | H::EoriToSr
        | H::MoveFromSr
        | H::MoveToCcr
        | H::MoveToSr
        | H::MoveUsp => CycleCostKind::Status,
        H::Tas => CycleCostKind::TestAndSet,
        H::Chk => CycleCostKind::Chk,
        H::Trap | H::Trapv | H::Illegal => CycleCostKind::Exception,
        H::Stop => CycleCostKind::Stop,
        H::Reset => CycleCostKind::Reset,
    }
}

/// Approximate base cost of one retired instruction.
#[must_use]
pub fn instruction_cycles(handler: HandlerId) -> u16 {
    cycle_cost(cost_kind(handler)).unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{cost_kind, cycle_cost, instruction_cycles, CycleCostKind, CYCLE_COST_TABLE};
    use crate::encoding::HandlerId;

    #[test]
    fn table_contains_unique_kinds() {
        let kinds: HashSet<_> = CYCLE_COST_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds.len(), CYCLE_COST_TABLE.len());
    }

    #[test]
    fn table_values_match_base_costs() {
        assert_eq!(cycle_cost(CycleCostKind::Nop), Some(4));
        assert_eq!(cycle_cost(CycleCostKind::Multiply), Some(70));
        assert_eq!(cycle_cost(CycleCostKind::Divide), Some(140));
        assert_eq!(cycle_cost(CycleCostKind::Exception), Some(34));
    }

    #[test]
    fn handlers_map_to_expected_classes() {
        assert_eq!(cost_kind(HandlerId::Moveq), CycleCostKind::Move);
        assert_eq!(cost_kind(HandlerId::RoxlMemory), CycleCostKind::Shift);
        assert_eq!(cost_kind(HandlerId::Jsr), CycleCostKind::Call);
        assert_eq!(instruction_cycles(HandlerId::Divs), 140);
        assert_eq!(instruction_cycles(HandlerId::Rts), 16);
    }
}
