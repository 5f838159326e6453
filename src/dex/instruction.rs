use super::{Error, Format, Opcode};
use crate::util::Width;

/// A Dalvik instruction, generic over how branch targets are represented
///
/// There is one variant per encoding [`Format`], so the variant fixes the size and operand layout
/// while the `opcode` field picks the actual operation. Branch targets are `Target`:
///
///   - `i32` relative offsets (in code units) in a finished method. For switch payload elements,
///     the offset is relative to the switch instruction referring to the payload, not to the
///     payload itself.
///   - [`Label`](crate::dex::builder::Label) while a method is being edited
///
/// Register and literal fields use the smallest Rust integer that can hold the format's field.
/// Fields narrower than that (4-bit registers, 4-bit literals, high-only literals) are checked by
/// [`Instruction::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instruction<Target> {
    Format10t {
        opcode: Opcode,
        target: Target,
    },
    Format10x {
        opcode: Opcode,
    },
    Format11n {
        opcode: Opcode,
        register_a: u8,
        literal: i8,
    },
    Format11x {
        opcode: Opcode,
        register_a: u8,
    },
    Format12x {
        opcode: Opcode,
        register_a: u8,
        register_b: u8,
    },
    /// Verification error kind, with a reference describing the failure
    Format20bc {
        opcode: Opcode,
        verification_error: u8,
        reference: u16,
    },
    Format20t {
        opcode: Opcode,
        target: Target,
    },
    Format21c {
        opcode: Opcode,
        register_a: u8,
        reference: u16,
    },
    /// Only the high 16 bits of `literal` are encoded
    Format21ih {
        opcode: Opcode,
        register_a: u8,
        literal: i32,
    },
    /// Only the high 16 bits of `literal` are encoded
    Format21lh {
        opcode: Opcode,
        register_a: u8,
        literal: i64,
    },
    Format21s {
        opcode: Opcode,
        register_a: u8,
        literal: i16,
    },
    Format21t {
        opcode: Opcode,
        register_a: u8,
        target: Target,
    },
    Format22b {
        opcode: Opcode,
        register_a: u8,
        register_b: u8,
        literal: i8,
    },
    Format22c {
        opcode: Opcode,
        register_a: u8,
        register_b: u8,
        reference: u16,
    },
    /// Field accessed by its byte offset in the object
    Format22cs {
        opcode: Opcode,
        register_a: u8,
        register_b: u8,
        field_offset: u16,
    },
    Format22s {
        opcode: Opcode,
        register_a: u8,
        register_b: u8,
        literal: i16,
    },
    Format22t {
        opcode: Opcode,
        register_a: u8,
        register_b: u8,
        target: Target,
    },
    Format22x {
        opcode: Opcode,
        register_a: u8,
        register_b: u16,
    },
    Format23x {
        opcode: Opcode,
        register_a: u8,
        register_b: u8,
        register_c: u8,
    },
    Format30t {
        opcode: Opcode,
        target: Target,
    },
    Format31c {
        opcode: Opcode,
        register_a: u8,
        reference: u32,
    },
    Format31i {
        opcode: Opcode,
        register_a: u8,
        literal: i32,
    },
    Format31t {
        opcode: Opcode,
        register_a: u8,
        target: Target,
    },
    Format32x {
        opcode: Opcode,
        register_a: u16,
        register_b: u16,
    },
    /// Up to five 4-bit argument registers
    Format35c {
        opcode: Opcode,
        registers: Vec<u8>,
        reference: u16,
    },
    Format35mi {
        opcode: Opcode,
        registers: Vec<u8>,
        inline_index: u16,
    },
    Format35ms {
        opcode: Opcode,
        registers: Vec<u8>,
        vtable_index: u16,
    },
    Format3rc {
        opcode: Opcode,
        start_register: u16,
        register_count: u8,
        reference: u16,
    },
    Format3rmi {
        opcode: Opcode,
        start_register: u16,
        register_count: u8,
        inline_index: u16,
    },
    Format3rms {
        opcode: Opcode,
        start_register: u16,
        register_count: u8,
        vtable_index: u16,
    },
    Format45cc {
        opcode: Opcode,
        registers: Vec<u8>,
        reference: u16,
        proto: u16,
    },
    Format4rcc {
        opcode: Opcode,
        start_register: u16,
        register_count: u8,
        reference: u16,
        proto: u16,
    },
    Format51l {
        opcode: Opcode,
        register_a: u8,
        literal: i64,
    },
    PackedSwitchPayload {
        first_key: i32,
        targets: Vec<Target>,
    },
    SparseSwitchPayload {
        elements: Vec<SwitchElement<Target>>,
    },
    /// `data` holds the raw little-endian elements, so its length is a multiple of the width
    ArrayPayload {
        element_width: u16,
        data: Vec<u8>,
    },
}

/// Entry in a sparse switch payload
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SwitchElement<Target> {
    pub key: i32,
    pub target: Target,
}

impl<Target> Instruction<Target> {
    pub fn opcode(&self) -> Opcode {
        use Instruction::*;

        match self {
            Format10t { opcode, .. }
            | Format10x { opcode }
            | Format11n { opcode, .. }
            | Format11x { opcode, .. }
            | Format12x { opcode, .. }
            | Format20bc { opcode, .. }
            | Format20t { opcode, .. }
            | Format21c { opcode, .. }
            | Format21ih { opcode, .. }
            | Format21lh { opcode, .. }
            | Format21s { opcode, .. }
            | Format21t { opcode, .. }
            | Format22b { opcode, .. }
            | Format22c { opcode, .. }
            | Format22cs { opcode, .. }
            | Format22s { opcode, .. }
            | Format22t { opcode, .. }
            | Format22x { opcode, .. }
            | Format23x { opcode, .. }
            | Format30t { opcode, .. }
            | Format31c { opcode, .. }
            | Format31i { opcode, .. }
            | Format31t { opcode, .. }
            | Format32x { opcode, .. }
            | Format35c { opcode, .. }
            | Format35mi { opcode, .. }
            | Format35ms { opcode, .. }
            | Format3rc { opcode, .. }
            | Format3rmi { opcode, .. }
            | Format3rms { opcode, .. }
            | Format45cc { opcode, .. }
            | Format4rcc { opcode, .. }
            | Format51l { opcode, .. } => *opcode,
            PackedSwitchPayload { .. } => Opcode::PackedSwitchPayload,
            SparseSwitchPayload { .. } => Opcode::SparseSwitchPayload,
            ArrayPayload { .. } => Opcode::ArrayPayload,
        }
    }

    /// Format implied by the variant
    pub fn format(&self) -> Format {
        use Instruction::*;

        match self {
            Format10t { .. } => Format::Format10t,
            Format10x { .. } => Format::Format10x,
            Format11n { .. } => Format::Format11n,
            Format11x { .. } => Format::Format11x,
            Format12x { .. } => Format::Format12x,
            Format20bc { .. } => Format::Format20bc,
            Format20t { .. } => Format::Format20t,
            Format21c { .. } => Format::Format21c,
            Format21ih { .. } => Format::Format21ih,
            Format21lh { .. } => Format::Format21lh,
            Format21s { .. } => Format::Format21s,
            Format21t { .. } => Format::Format21t,
            Format22b { .. } => Format::Format22b,
            Format22c { .. } => Format::Format22c,
            Format22cs { .. } => Format::Format22cs,
            Format22s { .. } => Format::Format22s,
            Format22t { .. } => Format::Format22t,
            Format22x { .. } => Format::Format22x,
            Format23x { .. } => Format::Format23x,
            Format30t { .. } => Format::Format30t,
            Format31c { .. } => Format::Format31c,
            Format31i { .. } => Format::Format31i,
            Format31t { .. } => Format::Format31t,
            Format32x { .. } => Format::Format32x,
            Format35c { .. } => Format::Format35c,
            Format35mi { .. } => Format::Format35mi,
            Format35ms { .. } => Format::Format35ms,
            Format3rc { .. } => Format::Format3rc,
            Format3rmi { .. } => Format::Format3rmi,
            Format3rms { .. } => Format::Format3rms,
            Format45cc { .. } => Format::Format45cc,
            Format4rcc { .. } => Format::Format4rcc,
            Format51l { .. } => Format::Format51l,
            PackedSwitchPayload { .. } => Format::PackedSwitchPayload,
            SparseSwitchPayload { .. } => Format::SparseSwitchPayload,
            ArrayPayload { .. } => Format::ArrayPayload,
        }
    }

    /// Size of the encoded instruction, in 16-bit code units
    pub fn code_units(&self) -> usize {
        match self {
            Instruction::PackedSwitchPayload { targets, .. } => targets.len() * 2 + 4,
            Instruction::SparseSwitchPayload { elements } => elements.len() * 4 + 2,
            Instruction::ArrayPayload { data, .. } => (data.len() + 1) / 2 + 4,
            other => other.format().code_units().unwrap_or(0),
        }
    }

    pub fn is_payload(&self) -> bool {
        self.format().is_payload()
    }

    /// Every branch target in the instruction, in encoding order
    pub fn targets(&self) -> Vec<&Target> {
        use Instruction::*;

        match self {
            Format10t { target, .. }
            | Format20t { target, .. }
            | Format21t { target, .. }
            | Format22t { target, .. }
            | Format30t { target, .. }
            | Format31t { target, .. } => vec![target],
            PackedSwitchPayload { targets, .. } => targets.iter().collect(),
            SparseSwitchPayload { elements } => elements.iter().map(|elem| &elem.target).collect(),
            _ => vec![],
        }
    }

    /// Check that the operands fit the format and the opcode belongs to the format
    pub fn validate(&self) -> Result<(), Error> {
        use Instruction::*;

        let opcode = self.opcode();
        let invalid = |reason: &'static str| Err(Error::InvalidInstruction { opcode, reason });
        let nibble = |register: u8| register < 16;

        if opcode.format() != self.format() {
            return invalid("opcode does not use this format");
        }

        match self {
            Format11n {
                register_a,
                literal,
                ..
            } => {
                if !nibble(*register_a) {
                    return invalid("register must fit in 4 bits");
                }
                if !(-8..=7).contains(literal) {
                    return invalid("literal must fit in 4 bits");
                }
            }
            Format12x {
                register_a,
                register_b,
                ..
            }
            | Format22c {
                register_a,
                register_b,
                ..
            }
            | Format22cs {
                register_a,
                register_b,
                ..
            }
            | Format22s {
                register_a,
                register_b,
                ..
            }
            | Format22t {
                register_a,
                register_b,
                ..
            } => {
                if !nibble(*register_a) || !nibble(*register_b) {
                    return invalid("register must fit in 4 bits");
                }
            }
            Format21ih { literal, .. } if literal & 0xffff != 0 => {
                return invalid("only the high 16 bits of the literal may be set");
            }
            Format21lh { literal, .. } if literal & 0xffff_ffff_ffff != 0 => {
                return invalid("only the high 16 bits of the literal may be set");
            }
            Format35c { registers, .. }
            | Format35mi { registers, .. }
            | Format35ms { registers, .. }
            | Format45cc { registers, .. } => {
                if registers.len() > 5 {
                    return invalid("at most 5 registers can be passed");
                }
                if !registers.iter().all(|r| nibble(*r)) {
                    return invalid("register must fit in 4 bits");
                }
            }
            Format3rc {
                start_register,
                register_count,
                ..
            }
            | Format3rmi {
                start_register,
                register_count,
                ..
            }
            | Format3rms {
                start_register,
                register_count,
                ..
            }
            | Format4rcc {
                start_register,
                register_count,
                ..
            } if *start_register as u32 + *register_count as u32 > 0x10000 => {
                return invalid("register range runs past the last register");
            }
            PackedSwitchPayload { targets, .. } if targets.len() > u16::MAX as usize => {
                return invalid("too many switch targets");
            }
            SparseSwitchPayload { elements } => {
                if elements.len() > u16::MAX as usize {
                    return invalid("too many switch targets");
                }
                if elements.windows(2).any(|pair| pair[0].key >= pair[1].key) {
                    return invalid("sparse switch keys must be sorted and distinct");
                }
            }
            ArrayPayload {
                element_width,
                data,
            } => {
                if ![1, 2, 4, 8].contains(element_width) {
                    return invalid("element width must be 1, 2, 4, or 8");
                }
                if data.len() % *element_width as usize != 0 {
                    return invalid("data is not a whole number of elements");
                }
                if data.len() / *element_width as usize > u32::MAX as usize {
                    return invalid("too many array elements");
                }
            }
            _ => (),
        }

        Ok(())
    }

    /// Convert the branch targets, leaving everything else untouched
    pub fn map_targets<Target2, E>(
        &self,
        mut map_target: impl FnMut(&Target) -> Result<Target2, E>,
    ) -> Result<Instruction<Target2>, E> {
        use Instruction::*;

        Ok(match self {
            Format10t { opcode, target } => Format10t {
                opcode: *opcode,
                target: map_target(target)?,
            },
            Format10x { opcode } => Format10x { opcode: *opcode },
            Format11n {
                opcode,
                register_a,
                literal,
            } => Format11n {
                opcode: *opcode,
                register_a: *register_a,
                literal: *literal,
            },
            Format11x { opcode, register_a } => Format11x {
                opcode: *opcode,
                register_a: *register_a,
            },
            Format12x {
                opcode,
                register_a,
                register_b,
            } => Format12x {
                opcode: *opcode,
                register_a: *register_a,
                register_b: *register_b,
            },
            Format20bc {
                opcode,
                verification_error,
                reference,
            } => Format20bc {
                opcode: *opcode,
                verification_error: *verification_error,
                reference: *reference,
            },
            Format20t { opcode, target } => Format20t {
                opcode: *opcode,
                target: map_target(target)?,
            },
            Format21c {
                opcode,
                register_a,
                reference,
            } => Format21c {
                opcode: *opcode,
                register_a: *register_a,
                reference: *reference,
            },
            Format21ih {
                opcode,
                register_a,
                literal,
            } => Format21ih {
                opcode: *opcode,
                register_a: *register_a,
                literal: *literal,
            },
            Format21lh {
                opcode,
                register_a,
                literal,
            } => Format21lh {
                opcode: *opcode,
                register_a: *register_a,
                literal: *literal,
            },
            Format21s {
                opcode,
                register_a,
                literal,
            } => Format21s {
                opcode: *opcode,
                register_a: *register_a,
                literal: *literal,
            },
            Format21t {
                opcode,
                register_a,
                target,
            } => Format21t {
                opcode: *opcode,
                register_a: *register_a,
                target: map_target(target)?,
            },
            Format22b {
                opcode,
                register_a,
                register_b,
                literal,
            } => Format22b {
                opcode: *opcode,
                register_a: *register_a,
                register_b: *register_b,
                literal: *literal,
            },
            Format22c {
                opcode,
                register_a,
                register_b,
                reference,
            } => Format22c {
                opcode: *opcode,
                register_a: *register_a,
                register_b: *register_b,
                reference: *reference,
            },
            Format22cs {
                opcode,
                register_a,
                register_b,
                field_offset,
            } => Format22cs {
                opcode: *opcode,
                register_a: *register_a,
                register_b: *register_b,
                field_offset: *field_offset,
            },
            Format22s {
                opcode,
                register_a,
                register_b,
                literal,
            } => Format22s {
                opcode: *opcode,
                register_a: *register_a,
                register_b: *register_b,
                literal: *literal,
            },
            Format22t {
                opcode,
                register_a,
                register_b,
                target,
            } => Format22t {
                opcode: *opcode,
                register_a: *register_a,
                register_b: *register_b,
                target: map_target(target)?,
            },
            Format22x {
                opcode,
                register_a,
                register_b,
            } => Format22x {
                opcode: *opcode,
                register_a: *register_a,
                register_b: *register_b,
            },
            Format23x {
                opcode,
                register_a,
                register_b,
                register_c,
            } => Format23x {
                opcode: *opcode,
                register_a: *register_a,
                register_b: *register_b,
                register_c: *register_c,
            },
            Format30t { opcode, target } => Format30t {
                opcode: *opcode,
                target: map_target(target)?,
            },
            Format31c {
                opcode,
                register_a,
                reference,
            } => Format31c {
                opcode: *opcode,
                register_a: *register_a,
                reference: *reference,
            },
            Format31i {
                opcode,
                register_a,
                literal,
            } => Format31i {
                opcode: *opcode,
                register_a: *register_a,
                literal: *literal,
            },
            Format31t {
                opcode,
                register_a,
                target,
            } => Format31t {
                opcode: *opcode,
                register_a: *register_a,
                target: map_target(target)?,
            },
            Format32x {
                opcode,
                register_a,
                register_b,
            } => Format32x {
                opcode: *opcode,
                register_a: *register_a,
                register_b: *register_b,
            },
            Format35c {
                opcode,
                registers,
                reference,
            } => Format35c {
                opcode: *opcode,
                registers: registers.clone(),
                reference: *reference,
            },
            Format35mi {
                opcode,
                registers,
                inline_index,
            } => Format35mi {
                opcode: *opcode,
                registers: registers.clone(),
                inline_index: *inline_index,
            },
            Format35ms {
                opcode,
                registers,
                vtable_index,
            } => Format35ms {
                opcode: *opcode,
                registers: registers.clone(),
                vtable_index: *vtable_index,
            },
            Format3rc {
                opcode,
                start_register,
                register_count,
                reference,
            } => Format3rc {
                opcode: *opcode,
                start_register: *start_register,
                register_count: *register_count,
                reference: *reference,
            },
            Format3rmi {
                opcode,
                start_register,
                register_count,
                inline_index,
            } => Format3rmi {
                opcode: *opcode,
                start_register: *start_register,
                register_count: *register_count,
                inline_index: *inline_index,
            },
            Format3rms {
                opcode,
                start_register,
                register_count,
                vtable_index,
            } => Format3rms {
                opcode: *opcode,
                start_register: *start_register,
                register_count: *register_count,
                vtable_index: *vtable_index,
            },
            Format45cc {
                opcode,
                registers,
                reference,
                proto,
            } => Format45cc {
                opcode: *opcode,
                registers: registers.clone(),
                reference: *reference,
                proto: *proto,
            },
            Format4rcc {
                opcode,
                start_register,
                register_count,
                reference,
                proto,
            } => Format4rcc {
                opcode: *opcode,
                start_register: *start_register,
                register_count: *register_count,
                reference: *reference,
                proto: *proto,
            },
            Format51l {
                opcode,
                register_a,
                literal,
            } => Format51l {
                opcode: *opcode,
                register_a: *register_a,
                literal: *literal,
            },
            PackedSwitchPayload { first_key, targets } => PackedSwitchPayload {
                first_key: *first_key,
                targets: targets
                    .iter()
                    .map(&mut map_target)
                    .collect::<Result<_, _>>()?,
            },
            SparseSwitchPayload { elements } => SparseSwitchPayload {
                elements: elements
                    .iter()
                    .map(|elem| {
                        Ok(SwitchElement {
                            key: elem.key,
                            target: map_target(&elem.target)?,
                        })
                    })
                    .collect::<Result<_, _>>()?,
            },
            ArrayPayload {
                element_width,
                data,
            } => ArrayPayload {
                element_width: *element_width,
                data: data.clone(),
            },
        })
    }
}

impl<Target> Width for Instruction<Target> {
    fn width(&self) -> usize {
        self.code_units()
    }
}
