use std::sync::OnceLock;

/// Operation family an opcode resolves to.
///
/// Memory and register forms of the shift/rotate group get separate ids
/// because their operand layout differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum HandlerId {
    OriToCcr,
    OriToSr,
    Ori,
    AndiToCcr,
    AndiToSr,
    Andi,
    Subi,
    Addi,
    EoriToCcr,
    EoriToSr,
    Eori,
    Cmpi,
    Movep,
    BtstStatic,
    BchgStatic,
    BclrStatic,
    BsetStatic,
    BtstDynamic,
    BchgDynamic,
    BclrDynamic,
    BsetDynamic,
    Move,
    Movea,
    MoveFromSr,
    MoveToCcr,
    MoveToSr,
    Negx,
    Clr,
    Neg,
    Not,
    Ext,
    Nbcd,
    Swap,
    Pea,
    Illegal,
    Tas,
    Tst,
    Trap,
    Link,
    Unlk,
    MoveUsp,
    Reset,
    Nop,
    Stop,
    Rte,
    Rts,
    Trapv,
    Rtr,
    Jsr,
    Jmp,
    Movem,
    Chk,
    Lea,
    Dbcc,
    Scc,
    Addq,
    Subq,
    Bra,
    Bsr,
    Bcc,
    Moveq,
    Divu,
    Divs,
    Sbcd,
    Or,
    Suba,
    Subx,
    Sub,
    Cmpa,
    Cmpm,
    Eor,
    Cmp,
    Mulu,
    Muls,
    Abcd,
    Exg,
    And,
    Adda,
    Addx,
    Add,
    AsrMemory,
    AslMemory,
    LsrMemory,
    LslMemory,
    RoxrMemory,
    RoxlMemory,
    RorMemory,
    RolMemory,
    AsrRegister,
    AslRegister,
    LsrRegister,
    LslRegister,
    RoxrRegister,
    RoxlRegister,
    RorRegister,
    RolRegister,
}

impl HandlerId {
    /// Base assembler mnemonic, without size or condition suffix.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::OriToCcr | Self::OriToSr | Self::Ori => "ORI",
            Self::AndiToCcr | Self::AndiToSr | Self::Andi => "ANDI",
            Self::Subi => "SUBI",
            Self::Addi => "ADDI",
            Self::EoriToCcr | Self::EoriToSr | Self::Eori => "EORI",
            Self::Cmpi => "CMPI",
            Self::Movep => "MOVEP",
            Self::BtstStatic | Self::BtstDynamic => "BTST",
            Self::BchgStatic | Self::BchgDynamic => "BCHG",
            Self::BclrStatic | Self::BclrDynamic => "BCLR",
            Self::BsetStatic | Self::BsetDynamic => "BSET",
            Self::Move | Self::MoveFromSr | Self::MoveToCcr | Self::MoveToSr | Self::MoveUsp => {
                "MOVE"
            }
            Self::Movea => "MOVEA",
            Self::Negx => "NEGX",
            Self::Clr => "CLR",
            Self::Neg => "NEG",
            Self::Not => "NOT",
            Self::Ext => "EXT",
            Self::Nbcd => "NBCD",
            Self::Swap => "SWAP",
            Self::Pea => "PEA",
            Self::Illegal => "ILLEGAL",
            Self::Tas => "TAS",
            Self::Tst => "TST",
            Self::Trap => "TRAP",
            Self::Link => "LINK",
            Self::Unlk => "UNLK",
            Self::Reset => "RESET",
            Self::Nop => "NOP",
            Self::Stop => "STOP",
            Self::Rte => "RTE",
            Self::Rts => "RTS",
            Self::Trapv => "TRAPV",
            Self::Rtr => "RTR",
            Self::Jsr => "JSR",
            Self::Jmp => "JMP",
            Self::Movem => "MOVEM",
            Self::Chk => "CHK",
            Self::Lea => "LEA",
            Self::Dbcc => "DB",
            Self::Scc => "S",
            Self::Addq => "ADDQ",
            Self::Subq => "SUBQ",
            Self::Bra => "BRA",
            Self::Bsr => "BSR",
            Self::Bcc => "B",
            Self::Moveq => "MOVEQ",
            Self::Divu => "DIVU",
            Self::Divs => "DIVS",
            Self::Sbcd => "SBCD",
            Self::Or => "OR",
            Self::Suba => "SUBA",
            Self::Subx => "SUBX",
            Self::Sub => "SUB",
            Self::Cmpa => "CMPA",
            Self::Cmpm => "CMPM",
            Self::Eor => "EOR",
            Self::Cmp => "CMP",
            Self::Mulu => "MULU",
            Self::Muls => "MULS",
            Self::Abcd => "ABCD",
            Self::Exg => "EXG",
            Self::And => "AND",
            Self::Adda => "ADDA",
            Self::Addx => "ADDX",
            Self::Add => "ADD",
            Self::AsrMemory | Self::AsrRegister => "ASR",
            Self::AslMemory | Self::AslRegister => "ASL",
            Self::LsrMemory | Self::LsrRegister => "LSR",
            Self::LslMemory | Self::LslRegister => "LSL",
            Self::RoxrMemory | Self::RoxrRegister => "ROXR",
            Self::RoxlMemory | Self::RoxlRegister => "ROXL",
            Self::RorMemory | Self::RorRegister => "ROR",
            Self::RolMemory | Self::RolRegister => "ROL",
        }
    }
}

/// One `(value, mask)` entry of the pattern table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodePattern {
    /// Bits that must be present after masking.
    pub value: u16,
    /// Bits of the opcode that participate in the match.
    pub mask: u16,
    /// Handler selected by a match.
    pub handler: HandlerId,
}

impl OpcodePattern {
    const fn new(value: u16, mask: u16, handler: HandlerId) -> Self {
        Self {
            value,
            mask,
            handler,
        }
    }

    /// Returns `true` when `opcode & mask == value`.
    #[must_use]
    pub const fn matches(self, opcode: u16) -> bool {
        opcode & self.mask == self.value
    }
}

use HandlerId as H;

const GROUP_0: &[OpcodePattern] = &[
    OpcodePattern::new(0x003C, 0xFFFF, H::OriToCcr),
    OpcodePattern::new(0x007C, 0xFFFF, H::OriToSr),
    OpcodePattern::new(0x0000, 0xFF00, H::Ori),
    OpcodePattern::new(0x023C, 0xFFFF, H::AndiToCcr),
    OpcodePattern::new(0x027C, 0xFFFF, H::AndiToSr),
    OpcodePattern::new(0x0200, 0xFF00, H::Andi),
    OpcodePattern::new(0x0400, 0xFF00, H::Subi),
    OpcodePattern::new(0x0600, 0xFF00, H::Addi),
    OpcodePattern::new(0x0A3C, 0xFFFF, H::EoriToCcr),
    OpcodePattern::new(0x0A7C, 0xFFFF, H::EoriToSr),
    OpcodePattern::new(0x0A00, 0xFF00, H::Eori),
    OpcodePattern::new(0x0C00, 0xFF00, H::Cmpi),
    OpcodePattern::new(0x0108, 0xF138, H::Movep),
    OpcodePattern::new(0x0800, 0xFFC0, H::BtstStatic),
    OpcodePattern::new(0x0840, 0xFFC0, H::BchgStatic),
    OpcodePattern::new(0x0880, 0xFFC0, H::BclrStatic),
    OpcodePattern::new(0x08C0, 0xFFC0, H::BsetStatic),
    OpcodePattern::new(0x0100, 0xF1C0, H::BtstDynamic),
    OpcodePattern::new(0x0140, 0xF1C0, H::BchgDynamic),
    OpcodePattern::new(0x0180, 0xF1C0, H::BclrDynamic),
    OpcodePattern::new(0x01C0, 0xF1C0, H::BsetDynamic),
];

const GROUP_1: &[OpcodePattern] = &[OpcodePattern::new(0x1000, 0xF000, H::Move)];

const GROUP_2: &[OpcodePattern] = &[
    OpcodePattern::new(0x2040, 0xF1C0, H::Movea),
    OpcodePattern::new(0x2000, 0xF000, H::Move),
];

const GROUP_3: &[OpcodePattern] = &[
    OpcodePattern::new(0x3040, 0xF1C0, H::Movea),
    OpcodePattern::new(0x3000, 0xF000, H::Move),
];

const GROUP_4: &[OpcodePattern] = &[
    OpcodePattern::new(0x40C0, 0xFFC0, H::MoveFromSr),
    OpcodePattern::new(0x44C0, 0xFFC0, H::MoveToCcr),
    OpcodePattern::new(0x46C0, 0xFFC0, H::MoveToSr),
    OpcodePattern::new(0x4000, 0xFF00, H::Negx),
    OpcodePattern::new(0x4200, 0xFF00, H::Clr),
    OpcodePattern::new(0x4400, 0xFF00, H::Neg),
    OpcodePattern::new(0x4600, 0xFF00, H::Not),
    OpcodePattern::new(0x4880, 0xFFB8, H::Ext),
    OpcodePattern::new(0x4800, 0xFFC0, H::Nbcd),
    OpcodePattern::new(0x4840, 0xFFF8, H::Swap),
    OpcodePattern::new(0x4840, 0xFFC0, H::Pea),
    OpcodePattern::new(0x4AFC, 0xFFFF, H::Illegal),
    OpcodePattern::new(0x4AC0, 0xFFC0, H::Tas),
    OpcodePattern::new(0x4A00, 0xFF00, H::Tst),
    OpcodePattern::new(0x4E40, 0xFFF0, H::Trap),
    OpcodePattern::new(0x4E50, 0xFFF8, H::Link),
    OpcodePattern::new(0x4E58, 0xFFF8, H::Unlk),
    OpcodePattern::new(0x4E60, 0xFFF0, H::MoveUsp),
    OpcodePattern::new(0x4E70, 0xFFFF, H::Reset),
    OpcodePattern::new(0x4E71, 0xFFFF, H::Nop),
    OpcodePattern::new(0x4E72, 0xFFFF, H::Stop),
    OpcodePattern::new(0x4E73, 0xFFFF, H::Rte),
    OpcodePattern::new(0x4E75, 0xFFFF, H::Rts),
    OpcodePattern::new(0x4E76, 0xFFFF, H::Trapv),
    OpcodePattern::new(0x4E77, 0xFFFF, H::Rtr),
    OpcodePattern::new(0x4E80, 0xFFC0, H::Jsr),
    OpcodePattern::new(0x4EC0, 0xFFC0, H::Jmp),
    OpcodePattern::new(0x4880, 0xFB80, H::Movem),
    OpcodePattern::new(0x4180, 0xF1C0, H::Chk),
    OpcodePattern::new(0x41C0, 0xF1C0, H::Lea),
];

const GROUP_5: &[OpcodePattern] = &[
    OpcodePattern::new(0x50C8, 0xF0F8, H::Dbcc),
    OpcodePattern::new(0x50C0, 0xF0C0, H::Scc),
    OpcodePattern::new(0x5000, 0xF100, H::Addq),
    OpcodePattern::new(0x5100, 0xF100, H::Subq),
];

const GROUP_6: &[OpcodePattern] = &[
    OpcodePattern::new(0x6000, 0xFF00, H::Bra),
    OpcodePattern::new(0x6100, 0xFF00, H::Bsr),
    OpcodePattern::new(0x6000, 0xF000, H::Bcc),
];

const GROUP_7: &[OpcodePattern] = &[OpcodePattern::new(0x7000, 0xF100, H::Moveq)];

const GROUP_8: &[OpcodePattern] = &[
    OpcodePattern::new(0x80C0, 0xF1C0, H::Divu),
    OpcodePattern::new(0x81C0, 0xF1C0, H::Divs),
    OpcodePattern::new(0x8100, 0xF1F0, H::Sbcd),
    OpcodePattern::new(0x8000, 0xF000, H::Or),
];

const GROUP_9: &[OpcodePattern] = &[
    OpcodePattern::new(0x90C0, 0xF0C0, H::Suba),
    OpcodePattern::new(0x9100, 0xF130, H::Subx),
    OpcodePattern::new(0x9000, 0xF000, H::Sub),
];

const GROUP_B: &[OpcodePattern] = &[
    OpcodePattern::new(0xB0C0, 0xF0C0, H::Cmpa),
    OpcodePattern::new(0xB108, 0xF138, H::Cmpm),
    OpcodePattern::new(0xB100, 0xF100, H::Eor),
    OpcodePattern::new(0xB000, 0xF100, H::Cmp),
];

const GROUP_C: &[OpcodePattern] = &[
    OpcodePattern::new(0xC0C0, 0xF1C0, H::Mulu),
    OpcodePattern::new(0xC1C0, 0xF1C0, H::Muls),
    OpcodePattern::new(0xC100, 0xF1F0, H::Abcd),
    // Opmode 10000 is not an EXG form; it would otherwise be AND.L Dn,Dn.
    OpcodePattern::new(0xC180, 0xF1F8, H::Illegal),
    OpcodePattern::new(0xC100, 0xF130, H::Exg),
    OpcodePattern::new(0xC000, 0xF000, H::And),
];

const GROUP_D: &[OpcodePattern] = &[
    OpcodePattern::new(0xD0C0, 0xF0C0, H::Adda),
    OpcodePattern::new(0xD100, 0xF130, H::Addx),
    OpcodePattern::new(0xD000, 0xF000, H::Add),
];

const GROUP_E: &[OpcodePattern] = &[
    OpcodePattern::new(0xE0C0, 0xFFC0, H::AsrMemory),
    OpcodePattern::new(0xE1C0, 0xFFC0, H::AslMemory),
    OpcodePattern::new(0xE2C0, 0xFFC0, H::LsrMemory),
    OpcodePattern::new(0xE3C0, 0xFFC0, H::LslMemory),
    OpcodePattern::new(0xE4C0, 0xFFC0, H::RoxrMemory),
    OpcodePattern::new(0xE5C0, 0xFFC0, H::RoxlMemory),
    OpcodePattern::new(0xE6C0, 0xFFC0, H::RorMemory),
    OpcodePattern::new(0xE7C0, 0xFFC0, H::RolMemory),
    OpcodePattern::new(0xE000, 0xF118, H::AsrRegister),
    OpcodePattern::new(0xE100, 0xF118, H::AslRegister),
    OpcodePattern::new(0xE008, 0xF118, H::LsrRegister),
    OpcodePattern::new(0xE108, 0xF118, H::LslRegister),
    OpcodePattern::new(0xE010, 0xF118, H::RoxrRegister),
    OpcodePattern::new(0xE110, 0xF118, H::RoxlRegister),
    OpcodePattern::new(0xE018, 0xF118, H::RorRegister),
    OpcodePattern::new(0xE118, 0xF118, H::RolRegister),
];

/// Pattern lists indexed by opcode bits 15-12.
///
/// Entries are tried in order and the first match wins; several encodings
/// overlap on purpose (for example `PEA Dn` resolves to `SWAP`).
pub const PATTERN_BUCKETS: [&[OpcodePattern]; 16] = [
    GROUP_0, GROUP_1, GROUP_2, GROUP_3, GROUP_4, GROUP_5, GROUP_6, GROUP_7, GROUP_8, GROUP_9,
    &[], GROUP_B, GROUP_C, GROUP_D, GROUP_E, &[],
];

/// Resolves an opcode by scanning its bucket in order.
#[must_use]
pub fn match_pattern(opcode: u16) -> Option<HandlerId> {
    PATTERN_BUCKETS[usize::from(opcode >> 12)]
        .iter()
        .find(|pattern| pattern.matches(opcode))
        .map(|pattern| pattern.handler)
}

/// Every opcode resolved ahead of time, so decode is a single index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerTable {
    entries: Box<[Option<HandlerId>]>,
}

impl HandlerTable {
    /// Builds the table from [`PATTERN_BUCKETS`], preserving scan precedence.
    #[must_use]
    pub fn build() -> Self {
        let entries = (0..=u16::MAX).map(match_pattern).collect();
        Self { entries }
    }

    /// Looks up the handler for `opcode`.
    #[must_use]
    pub fn lookup(&self, opcode: u16) -> Option<HandlerId> {
        self.entries[usize::from(opcode)]
    }

    /// Number of opcodes that resolve to some handler.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }
}

/// Process-wide table, built on first use.
#[must_use]
pub fn handler_table() -> &'static HandlerTable {
    static TABLE: OnceLock<HandlerTable> = OnceLock::new();
    TABLE.get_or_init(HandlerTable::build)
}

/// Resolves an opcode through the precomputed table.
#[must_use]
pub fn lookup_handler(opcode: u16) -> Option<HandlerId> {
    handler_table().lookup(opcode)
}
