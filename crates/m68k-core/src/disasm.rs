//! Motorola-syntax disassembly.
//!
//! [`disassemble`] renders one decoded [`Instruction`]; [`disassemble_range`]
//! walks a span of memory with the same decoder the machine uses, emitting a
//! `DC.W` row for any word that does not decode.

use core::fmt;

use crate::decoder::{AddressingMode, Decoder, EaField, Instruction};
use crate::encoding::HandlerId;
use crate::state::Condition;
use crate::{Memory, OpSize};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the opcode word.
    pub address: u32,
    /// Opcode word followed by its extension words.
    pub words: Vec<u16>,
    /// Instruction text, e.g. `MOVE.B (A0)+,D0`.
    pub text: String,
    /// Whether the opcode word failed to decode.
    pub is_illegal: bool,
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: Vec<String> = self.words.iter().map(|word| format!("{word:04X}")).collect();
        write!(f, "{:08X}  {:<24}{}", self.address, hex.join(" "), self.text)
    }
}

/// Lists every instruction in `[start, end)`.
///
/// Words that do not decode, or whose extension words would run past `end`,
/// are shown as `DC.W $xxxx` and skipped one word at a time. The walk stops
/// early if memory ends before `end`.
#[must_use]
pub fn disassemble_range(memory: &Memory, start: u32, end: u32) -> Vec<DisassemblyRow> {
    let mut rows = Vec::new();
    let mut pc = start;
    while pc < end {
        if let Ok(Some(instr)) = Decoder::new(memory, pc, end).fetch() {
            let words = (0..instr.length / 2)
                .filter_map(|i| memory.read_word(pc.wrapping_add(i * 2)).ok())
                .collect();
            rows.push(DisassemblyRow {
                address: pc,
                words,
                text: disassemble(&instr),
                is_illegal: false,
            });
            pc = instr.next_address();
            continue;
        }
        let Ok(word) = memory.read_word(pc) else {
            break;
        };
        rows.push(DisassemblyRow {
            address: pc,
            words: vec![word],
            text: format!("DC.W ${word:04X}"),
            is_illegal: true,
        });
        pc = pc.wrapping_add(2);
    }
    rows
}

/// Renders a decoded instruction in Motorola syntax.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn disassemble(instr: &Instruction) -> String {
    use HandlerId as H;

    let name = instr.handler.mnemonic();
    let sized = format!("{name}{}", instr.size.suffix());
    let dn = |n: u8| format!("D{n}");
    let an = |n: u8| format!("A{n}");
    let (low, high) = (instr.low_register(), instr.high_register());
    let src = || ea_text(instr.src.as_ref(), instr.size);
    let dst = || ea_text(instr.dst.as_ref(), instr.size);
    let imm = || immediate(instr.size, instr.extension.long());

    match instr.handler {
        H::OriToCcr | H::AndiToCcr | H::EoriToCcr => {
            format!("{name} #${:02X},CCR", instr.extension.word() & 0xFF)
        }
        H::OriToSr | H::AndiToSr | H::EoriToSr => {
            format!("{name} #${:04X},SR", instr.extension.word())
        }
        H::Ori | H::Andi | H::Subi | H::Addi | H::Eori | H::Cmpi => {
            format!("{sized} {},{}", imm(), dst())
        }
        H::BtstStatic | H::BchgStatic | H::BclrStatic | H::BsetStatic => {
            format!("{name} #{},{}", instr.extension.word(), dst())
        }
        H::BtstDynamic | H::BchgDynamic | H::BclrDynamic | H::BsetDynamic => {
            format!("{name} {},{}", dn(high), dst())
        }
        H::Movep => {
            let memory = format!("{}({})", signed_word(instr.extension.word()), an(low));
            if instr.opcode & 0x0080 == 0 {
                format!("{sized} {memory},{}", dn(high))
            } else {
                format!("{sized} {},{memory}", dn(high))
            }
        }
        H::Move | H::Movea => format!("{sized} {},{}", src(), dst()),
        H::MoveFromSr => format!("{name} SR,{}", dst()),
        H::MoveToCcr => format!("{name} {},CCR", src()),
        H::MoveToSr => format!("{name} {},SR", src()),
        H::MoveUsp => {
            if instr.opcode & 0x0008 == 0 {
                format!("{name} {},USP", an(low))
            } else {
                format!("{name} USP,{}", an(low))
            }
        }
        H::Negx | H::Clr | H::Neg | H::Not | H::Tst => format!("{sized} {}", dst()),
        H::Ext => format!("{sized} {}", dn(low)),
        H::Nbcd | H::Tas => format!("{name} {}", dst()),
        H::Swap => format!("{name} {}", dn(low)),
        H::Pea | H::Jmp | H::Jsr => format!("{name} {}", src()),
        H::Lea => format!("{name} {},{}", src(), an(high)),
        H::Illegal | H::Reset | H::Nop | H::Rte | H::Rts | H::Trapv | H::Rtr => name.to_owned(),
        H::Trap => format!("{name} #{}", instr.opcode & 0x0F),
        H::Link => format!("{name} {},#{}", an(low), signed_word(instr.extension.word())),
        H::Unlk => format!("{name} {}", an(low)),
        H::Stop => format!("{name} #${:04X}", instr.extension.word()),
        H::Movem => {
            let ea = instr.dst.as_ref();
            let predecrement = matches!(
                ea.and_then(EaField::mode),
                Some(AddressingMode::PreDecrement(_))
            );
            let mask = instr.extension.word();
            let list = register_list(if predecrement {
                mask.reverse_bits()
            } else {
                mask
            });
            if instr.opcode & 0x0400 == 0 {
                format!("{sized} {list},{}", dst())
            } else {
                format!("{sized} {},{list}", dst())
            }
        }
        H::Chk | H::Divu | H::Divs | H::Mulu | H::Muls => {
            format!("{name} {},{}", src(), dn(high))
        }
        H::Scc => format!(
            "{name}{} {}",
            Condition::from_opcode(instr.opcode).suffix(),
            dst()
        ),
        H::Dbcc => format!(
            "{name}{} {},${:04X}",
            Condition::from_opcode(instr.opcode).suffix(),
            dn(low),
            branch_target(instr)
        ),
        H::Bra | H::Bsr => format!("{name} ${:04X}", branch_target(instr)),
        H::Bcc => format!(
            "{name}{} ${:04X}",
            Condition::from_opcode(instr.opcode).suffix(),
            branch_target(instr)
        ),
        H::Addq | H::Subq => {
            let data = match high {
                0 => 8,
                n => n,
            };
            format!("{sized} #{data},{}", dst())
        }
        H::Moveq => format!("{name} #{},{}", signed_byte(instr.opcode), dn(high)),
        H::Sbcd | H::Abcd | H::Subx | H::Addx => {
            let text = if matches!(instr.handler, H::Subx | H::Addx) {
                sized.as_str()
            } else {
                name
            };
            if instr.opcode & 0x0008 == 0 {
                format!("{text} {},{}", dn(low), dn(high))
            } else {
                format!("{text} -({}),-({})", an(low), an(high))
            }
        }
        H::Or | H::Sub | H::And | H::Add => {
            if instr.opcode & 0x0100 == 0 {
                format!("{sized} {},{}", dst(), dn(high))
            } else {
                format!("{sized} {},{}", dn(high), dst())
            }
        }
        H::Cmp => format!("{sized} {},{}", dst(), dn(high)),
        H::Eor => format!("{sized} {},{}", dn(high), dst()),
        H::Suba | H::Cmpa | H::Adda => format!("{sized} {},{}", src(), an(high)),
        H::Cmpm => format!("{sized} ({})+,({})+", an(low), an(high)),
        H::Exg => match (instr.opcode >> 3) & 0x1F {
            0x09 => format!("{name} {},{}", an(high), an(low)),
            0x11 => format!("{name} {},{}", dn(high), an(low)),
            _ => format!("{name} {},{}", dn(high), dn(low)),
        },
        H::AsrMemory
        | H::AslMemory
        | H::LsrMemory
        | H::LslMemory
        | H::RoxrMemory
        | H::RoxlMemory
        | H::RorMemory
        | H::RolMemory => format!("{sized} {}", src()),
        H::AsrRegister
        | H::AslRegister
        | H::LsrRegister
        | H::LslRegister
        | H::RoxrRegister
        | H::RoxlRegister
        | H::RorRegister
        | H::RolRegister => {
            if instr.opcode & 0x0020 == 0 {
                let count = match high {
                    0 => 8,
                    n => n,
                };
                format!("{sized} #{count},{}", dn(low))
            } else {
                format!("{sized} {},{}", dn(high), dn(low))
            }
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn signed_word(word: u16) -> i16 {
    word as i16
}

#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
const fn signed_byte(word: u16) -> i8 {
    word as u8 as i8
}

fn immediate(size: OpSize, value: u32) -> String {
    match size {
        OpSize::Byte => format!("#${:02X}", value & 0xFF),
        OpSize::Word => format!("#${:04X}", value & 0xFFFF),
        OpSize::Long => format!("#${value:08X}"),
    }
}

fn branch_target(instr: &Instruction) -> u32 {
    let inline = instr.opcode & 0xFF;
    let displacement = if instr.handler == HandlerId::Dbcc || inline == 0 {
        OpSize::Word.sign_extend(u32::from(instr.extension.word()))
    } else {
        OpSize::Byte.sign_extend(u32::from(inline))
    };
    instr.address.wrapping_add(2).wrapping_add(displacement)
}

fn index_text(word: u16) -> String {
    let kind = if word & 0x8000 == 0 { 'D' } else { 'A' };
    let width = if word & 0x0800 == 0 { 'W' } else { 'L' };
    format!("{kind}{}.{width}", (word >> 12) & 7)
}

/// Formats one EA field; an absent or unassigned field renders as `?`.
fn ea_text(ea: Option<&EaField>, size: OpSize) -> String {
    let Some(ea) = ea else {
        return "?".to_owned();
    };
    let word = ea.ext.word();
    match ea.mode() {
        Some(AddressingMode::DataDirect(n)) => format!("D{n}"),
        Some(AddressingMode::AddressDirect(n)) => format!("A{n}"),
        Some(AddressingMode::Indirect(n)) => format!("(A{n})"),
        Some(AddressingMode::PostIncrement(n)) => format!("(A{n})+"),
        Some(AddressingMode::PreDecrement(n)) => format!("-(A{n})"),
        Some(AddressingMode::Displacement(n)) => format!("{}(A{n})", signed_word(word)),
        Some(AddressingMode::Indexed(n)) => {
            format!("{}(A{n},{})", signed_byte(word), index_text(word))
        }
        Some(AddressingMode::AbsoluteShort) => format!("${word:04X}.W"),
        Some(AddressingMode::AbsoluteLong) => format!("${:08X}.L", ea.ext.long()),
        Some(AddressingMode::PcDisplacement) => format!("{}(PC)", signed_word(word)),
        Some(AddressingMode::PcIndexed) => {
            format!("{}(PC,{})", signed_byte(word), index_text(word))
        }
        Some(AddressingMode::Immediate) => immediate(size, ea.ext.long()),
        None => "?".to_owned(),
    }
}

/// Renders a MOVEM mask (bit 0 = `D0` ... bit 15 = `A7`) as `D0-D2/A6`.
fn register_list(mask: u16) -> String {
    let mut groups = Vec::new();
    for (bank, prefix) in [(0u16, 'D'), (8, 'A')] {
        let mut n = 0;
        while n < 8 {
            if mask & (1 << (bank + n)) == 0 {
                n += 1;
                continue;
            }
            let first = n;
            while n + 1 < 8 && mask & (1 << (bank + n + 1)) != 0 {
                n += 1;
            }
            if first == n {
                groups.push(format!("{prefix}{first}"));
            } else {
                groups.push(format!("{prefix}{first}-{prefix}{n}"));
            }
            n += 1;
        }
    }
    groups.join("/")
}

#[cfg(test)]
mod tests {
    use super::{disassemble, disassemble_range, register_list};
    use crate::decoder::Decoder;
    use crate::Memory;

    fn render(words: &[u16]) -> String {
        let mut memory = Memory::new(0x1000);
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();
        memory.load(&bytes, 0x200, false).expect("fits");
        let end = 0x200 + 2 * u32::try_from(words.len()).expect("small");
        let instr = Decoder::new(&memory, 0x200, end)
            .fetch()
            .expect("fetches")
            .expect("decodes");
        disassemble(&instr)
    }

    #[test]
    fn renders_common_forms() {
        assert_eq!(render(&[0x0041, 0x1234]), "ORI.W #$1234,D1");
        assert_eq!(render(&[0x1018]), "MOVE.B (A0)+,D0");
        assert_eq!(render(&[0x660E]), "BNE $0210");
        assert_eq!(
            render(&[0x23FC, 0xDEAD, 0xBEEF, 0x0000, 0x1000]),
            "MOVE.L #$DEADBEEF,$00001000.L"
        );
        assert_eq!(render(&[0x76FF]), "MOVEQ #-1,D3");
        assert_eq!(render(&[0x4E75]), "RTS");
        assert_eq!(render(&[0x51C8, 0xFFFE]), "DBF D0,$0200");
        assert_eq!(render(&[0x43E8, 0x0008]), "LEA 8(A0),A1");
        assert_eq!(render(&[0x4E56, 0xFFF8]), "LINK A6,#-8");
        assert_eq!(render(&[0xE2A0]), "ASR.L D1,D0");
        assert_eq!(render(&[0x003C, 0x0010]), "ORI #$10,CCR");
    }

    #[test]
    fn movem_lists_registers_in_canonical_order() {
        assert_eq!(render(&[0x48E7, 0xC080]), "MOVEM.L D0-D1/A0,-(A7)");
        assert_eq!(render(&[0x4CDF, 0x020C]), "MOVEM.L (A7)+,D2-D3/A1");
        assert_eq!(register_list(0xFFFF), "D0-D7/A0-A7");
        assert_eq!(register_list(0x0000), "");
    }

    #[test]
    fn range_marks_undecodable_words() {
        let mut memory = Memory::new(0x1000);
        memory
            .load(&[0x4E, 0x71, 0xFF, 0xFF, 0x4E, 0x75], 0x100, false)
            .expect("fits");
        let rows = disassemble_range(&memory, 0x100, 0x106);
        let text: Vec<&str> = rows.iter().map(|row| row.text.as_str()).collect();
        assert_eq!(text, ["NOP", "DC.W $FFFF", "RTS"]);
        assert!(rows[1].is_illegal);
        assert_eq!(rows[2].address, 0x104);
    }

    #[test]
    fn truncated_extension_shows_as_data() {
        let mut memory = Memory::new(0x1000);
        memory.load(&[0x00, 0x41], 0x100, false).expect("fits");
        let rows = disassemble_range(&memory, 0x100, 0x102);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "DC.W $0041");
        assert_eq!(rows[0].to_string(), "00000100  0041                    DC.W $0041");
    }
}
