//! Instruction fetch and decode.
//!
//! The decoder reads the opcode word at the program counter, resolves it
//! through the precomputed handler table, and then consumes exactly the
//! extension words the handler's operand shape calls for. Handler-specific
//! words (immediates, displacements, register masks, bit numbers) come
//! first, followed by the source EA's words and then the destination's.

use crate::encoding::{lookup_handler, HandlerId};
use crate::{MachineError, Memory, OpSize};

/// One of the twelve addressing modes a 6-bit EA field can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
    /// `Dn`
    DataDirect(u8),
    /// `An`
    AddressDirect(u8),
    /// `(An)`
    Indirect(u8),
    /// `(An)+`
    PostIncrement(u8),
    /// `-(An)`
    PreDecrement(u8),
    /// `d16(An)`
    Displacement(u8),
    /// `d8(An,Xn)`
    Indexed(u8),
    /// `$xxxx.W`
    AbsoluteShort,
    /// `$xxxxxxxx.L`
    AbsoluteLong,
    /// `d16(PC)`
    PcDisplacement,
    /// `d8(PC,Xn)`
    PcIndexed,
    /// `#imm`
    Immediate,
}

impl AddressingMode {
    /// Splits a 6-bit EA field (`mode << 3 | reg`) into a mode.
    ///
    /// Returns `None` for the unassigned mode-7 register values 5-7.
    #[must_use]
    pub const fn from_field(field: u8) -> Option<Self> {
        let reg = field & 7;
        match (field >> 3) & 7 {
            0 => Some(Self::DataDirect(reg)),
            1 => Some(Self::AddressDirect(reg)),
            2 => Some(Self::Indirect(reg)),
            3 => Some(Self::PostIncrement(reg)),
            4 => Some(Self::PreDecrement(reg)),
            5 => Some(Self::Displacement(reg)),
            6 => Some(Self::Indexed(reg)),
            _ => match reg {
                0 => Some(Self::AbsoluteShort),
                1 => Some(Self::AbsoluteLong),
                2 => Some(Self::PcDisplacement),
                3 => Some(Self::PcIndexed),
                4 => Some(Self::Immediate),
                _ => None,
            },
        }
    }

    /// Number of extension words this mode consumes for an operand of `size`.
    #[must_use]
    pub const fn extension_words(self, size: OpSize) -> u8 {
        match self {
            Self::DataDirect(_)
            | Self::AddressDirect(_)
            | Self::Indirect(_)
            | Self::PostIncrement(_)
            | Self::PreDecrement(_) => 0,
            Self::Displacement(_)
            | Self::Indexed(_)
            | Self::AbsoluteShort
            | Self::PcDisplacement
            | Self::PcIndexed => 1,
            Self::AbsoluteLong => 2,
            Self::Immediate => {
                if matches!(size, OpSize::Long) {
                    2
                } else {
                    1
                }
            }
        }
    }

    /// Returns `true` for modes that name a register rather than memory.
    #[must_use]
    pub const fn is_register(self) -> bool {
        matches!(self, Self::DataDirect(_) | Self::AddressDirect(_))
    }
}

/// Up to two extension words plus the address of the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtensionWords {
    words: [u16; 2],
    len: u8,
    address: u32,
}

impl ExtensionWords {
    /// Packs already-fetched words. Only the first two entries of `words` are kept.
    #[must_use]
    pub fn new(address: u32, words: &[u16]) -> Self {
        let mut packed = [0u16; 2];
        let len = words.len().min(2);
        packed[..len].copy_from_slice(&words[..len]);
        Self {
            words: packed,
            len: u8::try_from(len).unwrap_or(2),
            address,
        }
    }

    /// Address the first word was fetched from.
    #[must_use]
    pub const fn address(&self) -> u32 {
        self.address
    }

    /// Number of words held.
    #[must_use]
    pub const fn len(&self) -> u8 {
        self.len
    }

    /// Returns `true` when no word was fetched.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First word (zero when absent).
    #[must_use]
    pub const fn word(&self) -> u16 {
        self.words[0]
    }

    /// Both words joined big-endian, or the single word zero-extended.
    #[must_use]
    pub const fn long(&self) -> u32 {
        if self.len >= 2 {
            ((self.words[0] as u32) << 16) | self.words[1] as u32
        } else {
            self.words[0] as u32
        }
    }

    /// The held words as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u16] {
        &self.words[..usize::from(self.len)]
    }
}

/// A 6-bit EA field together with the extension words fetched for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EaField {
    /// Raw `mode << 3 | reg` field.
    pub field: u8,
    /// Words consumed by the field's mode.
    pub ext: ExtensionWords,
}

impl EaField {
    /// Decoded addressing mode, `None` when the field is unassigned.
    #[must_use]
    pub const fn mode(&self) -> Option<AddressingMode> {
        AddressingMode::from_field(self.field)
    }
}

/// A fully fetched instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Address of the opcode word.
    pub address: u32,
    /// The opcode word.
    pub opcode: u16,
    /// Handler resolved from the opcode.
    pub handler: HandlerId,
    /// Operation size.
    pub size: OpSize,
    /// Handler-specific words (immediate, displacement, mask, bit number).
    pub extension: ExtensionWords,
    /// Source EA, when the handler takes one.
    pub src: Option<EaField>,
    /// Destination EA, when the handler takes one.
    pub dst: Option<EaField>,
    /// Total encoded length in bytes.
    pub length: u32,
}

impl Instruction {
    /// Address of the word following this instruction.
    #[must_use]
    pub const fn next_address(&self) -> u32 {
        self.address.wrapping_add(self.length)
    }

    /// Register number held in opcode bits 2-0.
    #[must_use]
    pub const fn low_register(&self) -> u8 {
        (self.opcode & 7) as u8
    }

    /// Register number held in opcode bits 11-9.
    #[must_use]
    pub const fn high_register(&self) -> u8 {
        ((self.opcode >> 9) & 7) as u8
    }
}

/// Operand layout of one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shape {
    size: OpSize,
    fixed_words: u8,
    src: Option<u8>,
    dst: Option<u8>,
}

impl Shape {
    const fn bare(size: OpSize) -> Self {
        Self {
            size,
            fixed_words: 0,
            src: None,
            dst: None,
        }
    }

    const fn fixed(size: OpSize, words: u8) -> Self {
        Self {
            size,
            fixed_words: words,
            src: None,
            dst: None,
        }
    }

    const fn source(size: OpSize, field: u8) -> Self {
        Self {
            size,
            fixed_words: 0,
            src: Some(field),
            dst: None,
        }
    }

    const fn destination(size: OpSize, field: u8) -> Self {
        Self {
            size,
            fixed_words: 0,
            src: None,
            dst: Some(field),
        }
    }

    const fn with_fixed(mut self, words: u8) -> Self {
        self.fixed_words = words;
        self
    }
}

/// Computes the operand shape; `None` marks an encoding with an unusable size field.
fn shape_of(handler: HandlerId, opcode: u16) -> Option<Shape> {
    use HandlerId as H;

    let ea = (opcode & 0x3F) as u8;
    let size_field = OpSize::from_bits(opcode >> 6);
    let long_if = |bit: u16| {
        if opcode & bit == 0 {
            OpSize::Word
        } else {
            OpSize::Long
        }
    };

    let shape = match handler {
        H::OriToCcr | H::AndiToCcr | H::EoriToCcr => Shape::fixed(OpSize::Byte, 1),
        H::OriToSr | H::AndiToSr | H::EoriToSr => Shape::fixed(OpSize::Word, 1),
        H::Ori | H::Andi | H::Subi | H::Addi | H::Eori | H::Cmpi => {
            let size = size_field?;
            let words = if matches!(size, OpSize::Long) { 2 } else { 1 };
            Shape::destination(size, ea).with_fixed(words)
        }
        H::BtstStatic | H::BchgStatic | H::BclrStatic | H::BsetStatic => {
            Shape::destination(bit_operand_size(ea), ea).with_fixed(1)
        }
        H::BtstDynamic | H::BchgDynamic | H::BclrDynamic | H::BsetDynamic => {
            Shape::destination(bit_operand_size(ea), ea)
        }
        H::Movep => Shape::fixed(long_if(0x40), 1),
        H::Move | H::Movea => {
            let dst = (((opcode & 0x01C0) >> 3) | ((opcode & 0x0E00) >> 9)) as u8;
            Shape {
                size: OpSize::from_move_bits(opcode >> 12),
                fixed_words: 0,
                src: Some(ea),
                dst: Some(dst),
            }
        }
        H::MoveFromSr => Shape::destination(OpSize::Word, ea),
        H::MoveToCcr => Shape::source(OpSize::Byte, ea),
        H::MoveToSr => Shape::source(OpSize::Word, ea),
        H::Negx | H::Clr | H::Neg | H::Not | H::Tst | H::Addq | H::Subq => {
            Shape::destination(size_field?, ea)
        }
        H::Or | H::Sub | H::Eor | H::Cmp | H::And | H::Add => Shape::destination(size_field?, ea),
        H::Ext => Shape::bare(long_if(0x40)),
        H::Nbcd | H::Tas | H::Scc => Shape::destination(OpSize::Byte, ea),
        H::Swap | H::MoveUsp | H::Moveq | H::Exg => Shape::bare(OpSize::Long),
        H::Pea | H::Jsr | H::Jmp | H::Lea => Shape::source(OpSize::Long, ea),
        H::Link | H::Stop | H::Dbcc => Shape::fixed(OpSize::Word, 1),
        H::Illegal
        | H::Trap
        | H::Unlk
        | H::Reset
        | H::Nop
        | H::Rte
        | H::Rts
        | H::Trapv
        | H::Rtr => Shape::bare(OpSize::Word),
        H::Chk | H::Divu | H::Divs | H::Mulu | H::Muls => Shape::source(OpSize::Word, ea),
        H::Movem => Shape::destination(long_if(0x40), ea).with_fixed(1),
        H::Bra | H::Bsr | H::Bcc => {
            let words = u8::from(opcode & 0xFF == 0);
            Shape::fixed(OpSize::Word, words)
        }
        H::Sbcd | H::Abcd => Shape::bare(OpSize::Byte),
        H::Suba | H::Cmpa | H::Adda => Shape::source(long_if(0x100), ea),
        H::Subx | H::Addx | H::Cmpm => Shape::bare(size_field?),
        H::AsrMemory
        | H::AslMemory
        | H::LsrMemory
        | H::LslMemory
        | H::RoxrMemory
        | H::RoxlMemory
        | H::RorMemory
        | H::RolMemory => Shape::source(OpSize::Word, ea),
        H::AsrRegister
        | H::AslRegister
        | H::LsrRegister
        | H::LslRegister
        | H::RoxrRegister
        | H::RoxlRegister
        | H::RorRegister
        | H::RolRegister => Shape::bare(size_field?),
    };
    Some(shape)
}

/// Bit operations act on a long in a data register and on a byte in memory.
const fn bit_operand_size(ea: u8) -> OpSize {
    if ea >> 3 == 0 {
        OpSize::Long
    } else {
        OpSize::Byte
    }
}

/// Sequential word reader over a loaded code range.
#[derive(Debug)]
pub struct Decoder<'m> {
    memory: &'m Memory,
    pc: u32,
    code_end: u32,
}

impl<'m> Decoder<'m> {
    /// Creates a decoder reading from `pc` up to (not including) `code_end`.
    #[must_use]
    pub const fn new(memory: &'m Memory, pc: u32, code_end: u32) -> Self {
        Self {
            memory,
            pc,
            code_end,
        }
    }

    /// Address of the next word to be read.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Reads the next word and advances.
    ///
    /// # Errors
    ///
    /// [`MachineError::PastEndOfCode`] when the word would extend beyond
    /// `code_end`; a trap when the memory read itself fails.
    pub fn next_word(&mut self) -> Result<u16, MachineError> {
        if u64::from(self.pc) + 2 > u64::from(self.code_end) {
            return Err(MachineError::PastEndOfCode { pc: self.pc });
        }
        let word = self.memory.read_word(self.pc)?;
        self.pc = self.pc.wrapping_add(2);
        Ok(word)
    }

    fn next_words(&mut self, count: u8) -> Result<ExtensionWords, MachineError> {
        let address = self.pc;
        let mut words = [0u16; 2];
        for slot in words.iter_mut().take(usize::from(count)) {
            *slot = self.next_word()?;
        }
        Ok(ExtensionWords::new(address, &words[..usize::from(count.min(2))]))
    }

    fn ea_field(&mut self, field: u8, size: OpSize) -> Result<EaField, MachineError> {
        let count = AddressingMode::from_field(field).map_or(0, |mode| mode.extension_words(size));
        Ok(EaField {
            field,
            ext: self.next_words(count)?,
        })
    }

    /// Fetches and decodes one instruction.
    ///
    /// Returns `Ok(None)` when the opcode matches no pattern (or carries an
    /// unusable size field); the caller raises `IllegalInstruction`. The
    /// decoder has still advanced past the opcode word in that case.
    ///
    /// # Errors
    ///
    /// [`MachineError::PastEndOfCode`] when the opcode or any extension
    /// word lies beyond the loaded code.
    pub fn fetch(&mut self) -> Result<Option<Instruction>, MachineError> {
        let address = self.pc;
        let opcode = self.next_word()?;
        let Some(handler) = lookup_handler(opcode) else {
            return Ok(None);
        };
        let Some(shape) = shape_of(handler, opcode) else {
            return Ok(None);
        };

        let extension = self.next_words(shape.fixed_words)?;
        let src = shape
            .src
            .map(|field| self.ea_field(field, shape.size))
            .transpose()?;
        let dst = shape
            .dst
            .map(|field| self.ea_field(field, shape.size))
            .transpose()?;

        Ok(Some(Instruction {
            address,
            opcode,
            handler,
            size: shape.size,
            extension,
            src,
            dst,
            length: self.pc.wrapping_sub(address),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressingMode, Decoder};
    use crate::encoding::HandlerId;
    use crate::{MachineError, Memory, OpSize};

    fn memory_with(words: &[u16]) -> (Memory, u32) {
        let mut memory = Memory::new(0x1000);
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        memory.load(&bytes, 0x200, false).expect("fits");
        let end = 0x200 + u32::try_from(bytes.len()).expect("small");
        (memory, end)
    }

    #[test]
    fn addressing_mode_fields_cover_all_assigned_values() {
        assert_eq!(AddressingMode::from_field(0x01), Some(AddressingMode::DataDirect(1)));
        assert_eq!(AddressingMode::from_field(0x1F), Some(AddressingMode::PostIncrement(7)));
        assert_eq!(AddressingMode::from_field(0x3C), Some(AddressingMode::Immediate));
        assert_eq!(AddressingMode::from_field(0x3D), None);
        assert_eq!(AddressingMode::from_field(0x3F), None);
    }

    #[test]
    fn extension_word_counts_follow_mode() {
        assert_eq!(AddressingMode::Indirect(0).extension_words(OpSize::Long), 0);
        assert_eq!(AddressingMode::Displacement(2).extension_words(OpSize::Byte), 1);
        assert_eq!(AddressingMode::AbsoluteLong.extension_words(OpSize::Word), 2);
        assert_eq!(AddressingMode::Immediate.extension_words(OpSize::Word), 1);
        assert_eq!(AddressingMode::Immediate.extension_words(OpSize::Long), 2);
    }

    #[test]
    fn immediate_op_reads_immediate_then_destination_words() {
        // ORI.L #$12345678,$0010(A1)
        let (memory, end) = memory_with(&[0x00A9, 0x1234, 0x5678, 0x0010]);
        let mut decoder = Decoder::new(&memory, 0x200, end);
        let instr = decoder.fetch().expect("decodes").expect("known opcode");

        assert_eq!(instr.handler, HandlerId::Ori);
        assert_eq!(instr.size, OpSize::Long);
        assert_eq!(instr.extension.long(), 0x1234_5678);
        let dst = instr.dst.expect("destination");
        assert_eq!(dst.mode(), Some(AddressingMode::Displacement(1)));
        assert_eq!(dst.ext.word(), 0x0010);
        assert_eq!(dst.ext.address(), 0x206);
        assert_eq!(instr.length, 8);
        assert_eq!(decoder.pc(), 0x208);
    }

    #[test]
    fn move_reads_source_words_before_destination_words() {
        // MOVE.W $1234.W,$5678.W
        let (memory, end) = memory_with(&[0x31F8, 0x1234, 0x5678]);
        let mut decoder = Decoder::new(&memory, 0x200, end);
        let instr = decoder.fetch().expect("decodes").expect("known opcode");

        assert_eq!(instr.handler, HandlerId::Move);
        assert_eq!(instr.size, OpSize::Word);
        assert_eq!(instr.src.expect("source").ext.word(), 0x1234);
        let dst = instr.dst.expect("destination");
        assert_eq!(dst.mode(), Some(AddressingMode::AbsoluteShort));
        assert_eq!(dst.ext.word(), 0x5678);
    }

    #[test]
    fn short_branch_has_no_extension_word() {
        let (memory, end) = memory_with(&[0x607E, 0x6000, 0x0DFE]);
        let mut decoder = Decoder::new(&memory, 0x200, end);

        let short = decoder.fetch().expect("decodes").expect("known opcode");
        assert!(short.extension.is_empty());
        assert_eq!(short.length, 2);

        let long = decoder.fetch().expect("decodes").expect("known opcode");
        assert_eq!(long.extension.word(), 0x0DFE);
        assert_eq!(long.length, 4);
    }

    #[test]
    fn fetch_past_loaded_code_fails() {
        let (memory, end) = memory_with(&[0x0041]);
        let mut decoder = Decoder::new(&memory, 0x200, end);
        assert_eq!(
            decoder.fetch(),
            Err(MachineError::PastEndOfCode { pc: 0x202 })
        );
    }

    #[test]
    fn unknown_opcode_yields_none() {
        let (memory, end) = memory_with(&[0xA000]);
        let mut decoder = Decoder::new(&memory, 0x200, end);
        assert_eq!(decoder.fetch(), Ok(None));
        assert_eq!(decoder.pc(), 0x202);
    }

    #[test]
    fn movem_reads_mask_before_destination() {
        // MOVEM.L D0-D1,-(A7)
        let (memory, end) = memory_with(&[0x48E7, 0xC000]);
        let mut decoder = Decoder::new(&memory, 0x200, end);
        let instr = decoder.fetch().expect("decodes").expect("known opcode");
        assert_eq!(instr.handler, HandlerId::Movem);
        assert_eq!(instr.size, OpSize::Long);
        assert_eq!(instr.extension.word(), 0xC000);
        assert_eq!(instr.dst.expect("destination").mode(), Some(AddressingMode::PreDecrement(7)));
    }

    #[test]
    fn memory_shift_takes_word_source() {
        let (memory, end) = memory_with(&[0xE5D1]);
        let mut decoder = Decoder::new(&memory, 0x200, end);
        let instr = decoder.fetch().expect("decodes").expect("known opcode");
        assert_eq!(instr.handler, HandlerId::RoxlMemory);
        assert_eq!(instr.size, OpSize::Word);
        assert_eq!(instr.src.expect("source").mode(), Some(AddressingMode::Indirect(1)));
    }
}
