//! Encoding of instructions into the code array of a method
//!
//! The code array is a sequence of little-endian 16-bit code units. The first code unit of every
//! instruction holds the opcode in its low byte and (usually) some operands in its high byte.
//! Payloads are recognized by a whole first code unit of `0x0100`, `0x0200`, or `0x0300`, which
//! would otherwise decode as a `nop` with a non-zero high byte.

use super::{Error, Format, Instruction, Opcode, SwitchElement};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor};

/// Utility trait for serializing data inside the code array
pub trait Serialize: Sized {
    /// Serialize construct into a binary output stream
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> io::Result<()>;
}

/// Encode a sequence of instructions into a code array
pub fn encode_instructions(instructions: &[Instruction<i32>]) -> io::Result<Vec<u8>> {
    let mut code = vec![];
    for instruction in instructions {
        instruction.serialize(&mut code)?;
    }
    Ok(code)
}

/// Decode a code array into instructions
pub fn decode_instructions(code: &[u8]) -> Result<Vec<Instruction<i32>>, Error> {
    let mut reader = Cursor::new(code);
    let mut instructions = vec![];
    while (reader.position() as usize) < code.len() {
        let address = reader.position() as usize / 2;
        let instruction = UnitReader {
            reader: &mut reader,
            address,
        }
        .instruction()?;
        instructions.push(instruction);
    }
    Ok(instructions)
}

fn unit(opcode: Opcode, high: u8) -> u16 {
    opcode.value() | (high as u16) << 8
}

/// Pack two 4-bit fields into a byte (`a` in the low nibble)
fn nibbles(a: u8, b: u8) -> u8 {
    (b << 4) | (a & 0xf)
}

fn narrow<T: TryFrom<i32>>(offset: i32, opcode: Opcode) -> io::Result<T> {
    T::try_from(offset).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("offset {} does not fit in {}", offset, opcode),
        )
    })
}

fn write_register_list<W: WriteBytesExt>(
    writer: &mut W,
    opcode: Opcode,
    registers: &[u8],
    index: u16,
) -> io::Result<()> {
    let mut regs = [0u8; 5];
    for (slot, reg) in regs.iter_mut().zip(registers) {
        *slot = *reg;
    }
    writer.write_u16::<LittleEndian>(unit(opcode, nibbles(regs[4], registers.len() as u8)))?;
    writer.write_u16::<LittleEndian>(index)?;
    writer.write_u16::<LittleEndian>(
        nibbles(regs[0], regs[1]) as u16 | (nibbles(regs[2], regs[3]) as u16) << 8,
    )
}

impl Serialize for Instruction<i32> {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> io::Result<()> {
        use Instruction::*;

        match self {
            Format10t { opcode, target } => {
                let target: i8 = narrow(*target, *opcode)?;
                writer.write_u16::<LittleEndian>(unit(*opcode, target as u8))?;
            }
            Format10x { opcode } => writer.write_u16::<LittleEndian>(unit(*opcode, 0))?,
            Format11n {
                opcode,
                register_a,
                literal,
            } => {
                writer.write_u16::<LittleEndian>(unit(
                    *opcode,
                    nibbles(*register_a, *literal as u8 & 0xf),
                ))?;
            }
            Format11x { opcode, register_a } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?
            }
            Format12x {
                opcode,
                register_a,
                register_b,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, nibbles(*register_a, *register_b)))?
            }
            Format20bc {
                opcode,
                verification_error,
                reference,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *verification_error))?;
                writer.write_u16::<LittleEndian>(*reference)?;
            }
            Format20t { opcode, target } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, 0))?;
                writer.write_i16::<LittleEndian>(narrow(*target, *opcode)?)?;
            }
            Format21c {
                opcode,
                register_a,
                reference,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_u16::<LittleEndian>(*reference)?;
            }
            Format21ih {
                opcode,
                register_a,
                literal,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_u16::<LittleEndian>((*literal >> 16) as u16)?;
            }
            Format21lh {
                opcode,
                register_a,
                literal,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_u16::<LittleEndian>((*literal >> 48) as u16)?;
            }
            Format21s {
                opcode,
                register_a,
                literal,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_i16::<LittleEndian>(*literal)?;
            }
            Format21t {
                opcode,
                register_a,
                target,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_i16::<LittleEndian>(narrow(*target, *opcode)?)?;
            }
            Format22b {
                opcode,
                register_a,
                register_b,
                literal,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_u8(*register_b)?;
                writer.write_i8(*literal)?;
            }
            Format22c {
                opcode,
                register_a,
                register_b,
                reference: index,
            }
            | Format22cs {
                opcode,
                register_a,
                register_b,
                field_offset: index,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, nibbles(*register_a, *register_b)))?;
                writer.write_u16::<LittleEndian>(*index)?;
            }
            Format22s {
                opcode,
                register_a,
                register_b,
                literal,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, nibbles(*register_a, *register_b)))?;
                writer.write_i16::<LittleEndian>(*literal)?;
            }
            Format22t {
                opcode,
                register_a,
                register_b,
                target,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, nibbles(*register_a, *register_b)))?;
                writer.write_i16::<LittleEndian>(narrow(*target, *opcode)?)?;
            }
            Format22x {
                opcode,
                register_a,
                register_b,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_u16::<LittleEndian>(*register_b)?;
            }
            Format23x {
                opcode,
                register_a,
                register_b,
                register_c,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_u8(*register_b)?;
                writer.write_u8(*register_c)?;
            }
            Format30t { opcode, target } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, 0))?;
                writer.write_i32::<LittleEndian>(*target)?;
            }
            Format31c {
                opcode,
                register_a,
                reference,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_u32::<LittleEndian>(*reference)?;
            }
            Format31i {
                opcode,
                register_a,
                literal,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_i32::<LittleEndian>(*literal)?;
            }
            Format31t {
                opcode,
                register_a,
                target,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_i32::<LittleEndian>(*target)?;
            }
            Format32x {
                opcode,
                register_a,
                register_b,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, 0))?;
                writer.write_u16::<LittleEndian>(*register_a)?;
                writer.write_u16::<LittleEndian>(*register_b)?;
            }
            Format35c {
                opcode,
                registers,
                reference: index,
            }
            | Format35mi {
                opcode,
                registers,
                inline_index: index,
            }
            | Format35ms {
                opcode,
                registers,
                vtable_index: index,
            } => write_register_list(writer, *opcode, registers, *index)?,
            Format3rc {
                opcode,
                start_register,
                register_count,
                reference: index,
            }
            | Format3rmi {
                opcode,
                start_register,
                register_count,
                inline_index: index,
            }
            | Format3rms {
                opcode,
                start_register,
                register_count,
                vtable_index: index,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_count))?;
                writer.write_u16::<LittleEndian>(*index)?;
                writer.write_u16::<LittleEndian>(*start_register)?;
            }
            Format45cc {
                opcode,
                registers,
                reference,
                proto,
            } => {
                write_register_list(writer, *opcode, registers, *reference)?;
                writer.write_u16::<LittleEndian>(*proto)?;
            }
            Format4rcc {
                opcode,
                start_register,
                register_count,
                reference,
                proto,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_count))?;
                writer.write_u16::<LittleEndian>(*reference)?;
                writer.write_u16::<LittleEndian>(*start_register)?;
                writer.write_u16::<LittleEndian>(*proto)?;
            }
            Format51l {
                opcode,
                register_a,
                literal,
            } => {
                writer.write_u16::<LittleEndian>(unit(*opcode, *register_a))?;
                writer.write_i64::<LittleEndian>(*literal)?;
            }
            PackedSwitchPayload { first_key, targets } => {
                writer.write_u16::<LittleEndian>(Opcode::PackedSwitchPayload.value())?;
                writer.write_u16::<LittleEndian>(targets.len() as u16)?;
                writer.write_i32::<LittleEndian>(*first_key)?;
                for target in targets {
                    writer.write_i32::<LittleEndian>(*target)?;
                }
            }
            SparseSwitchPayload { elements } => {
                writer.write_u16::<LittleEndian>(Opcode::SparseSwitchPayload.value())?;
                writer.write_u16::<LittleEndian>(elements.len() as u16)?;
                for element in elements {
                    writer.write_i32::<LittleEndian>(element.key)?;
                }
                for element in elements {
                    writer.write_i32::<LittleEndian>(element.target)?;
                }
            }
            ArrayPayload {
                element_width,
                data,
            } => {
                writer.write_u16::<LittleEndian>(Opcode::ArrayPayload.value())?;
                writer.write_u16::<LittleEndian>(*element_width)?;
                let element_count = data.len() / (*element_width).max(1) as usize;
                writer.write_u32::<LittleEndian>(element_count as u32)?;
                writer.write_all(data)?;
                if data.len() % 2 == 1 {
                    writer.write_u8(0)?;
                }
            }
        }
        Ok(())
    }
}

/// Reads one instruction, reporting truncation against the instruction's start address
struct UnitReader<'a, R> {
    reader: &'a mut R,
    address: usize,
}

impl<'a, R: ReadBytesExt> UnitReader<'a, R> {
    fn truncated(&self, err: io::Error) -> Error {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::TruncatedInstruction {
                address: self.address,
            }
        } else {
            Error::IoError(err)
        }
    }

    fn u16(&mut self) -> Result<u16, Error> {
        self.reader
            .read_u16::<LittleEndian>()
            .map_err(|err| self.truncated(err))
    }

    fn i16(&mut self) -> Result<i16, Error> {
        Ok(self.u16()? as i16)
    }

    fn u32(&mut self) -> Result<u32, Error> {
        self.reader
            .read_u32::<LittleEndian>()
            .map_err(|err| self.truncated(err))
    }

    fn i32(&mut self) -> Result<i32, Error> {
        Ok(self.u32()? as i32)
    }

    fn i64(&mut self) -> Result<i64, Error> {
        self.reader
            .read_i64::<LittleEndian>()
            .map_err(|err| self.truncated(err))
    }

    fn register_list(&mut self, opcode: Opcode, high: u8) -> Result<(Vec<u8>, u16), Error> {
        let count = (high >> 4) as usize;
        if count > 5 {
            return Err(Error::InvalidInstruction {
                opcode,
                reason: "at most 5 registers can be passed",
            });
        }
        let reference = self.u16()?;
        let packed = self.u16()?;
        let regs = [
            (packed & 0xf) as u8,
            (packed >> 4 & 0xf) as u8,
            (packed >> 8 & 0xf) as u8,
            (packed >> 12) as u8,
            high & 0xf,
        ];
        Ok((regs[..count].to_vec(), reference))
    }

    fn instruction(&mut self) -> Result<Instruction<i32>, Error> {
        let first = self.u16()?;
        let high = (first >> 8) as u8;
        let unknown = Error::UnknownOpcode {
            address: self.address,
            value: first,
        };

        let opcode = match first & 0xff {
            0 => match first {
                0x0000 => Opcode::Nop,
                0x0100 => Opcode::PackedSwitchPayload,
                0x0200 => Opcode::SparseSwitchPayload,
                0x0300 => Opcode::ArrayPayload,
                _ => return Err(unknown),
            },
            value => Opcode::from_value(value).ok_or(unknown)?,
        };
        let (a, b) = (high & 0xf, high >> 4);

        Ok(match opcode.format() {
            Format::Format10t => Instruction::Format10t {
                opcode,
                target: high as i8 as i32,
            },
            Format::Format10x => Instruction::Format10x { opcode },
            Format::Format11n => Instruction::Format11n {
                opcode,
                register_a: a,
                literal: (high as i8) >> 4,
            },
            Format::Format11x => Instruction::Format11x {
                opcode,
                register_a: high,
            },
            Format::Format12x => Instruction::Format12x {
                opcode,
                register_a: a,
                register_b: b,
            },
            Format::Format20bc => Instruction::Format20bc {
                opcode,
                verification_error: high,
                reference: self.u16()?,
            },
            Format::Format20t => Instruction::Format20t {
                opcode,
                target: self.i16()? as i32,
            },
            Format::Format21c => Instruction::Format21c {
                opcode,
                register_a: high,
                reference: self.u16()?,
            },
            Format::Format21ih => Instruction::Format21ih {
                opcode,
                register_a: high,
                literal: (self.u16()? as i32) << 16,
            },
            Format::Format21lh => Instruction::Format21lh {
                opcode,
                register_a: high,
                literal: (self.u16()? as i64) << 48,
            },
            Format::Format21s => Instruction::Format21s {
                opcode,
                register_a: high,
                literal: self.i16()?,
            },
            Format::Format21t => Instruction::Format21t {
                opcode,
                register_a: high,
                target: self.i16()? as i32,
            },
            Format::Format22b => {
                let second = self.u16()?;
                Instruction::Format22b {
                    opcode,
                    register_a: high,
                    register_b: (second & 0xff) as u8,
                    literal: (second >> 8) as u8 as i8,
                }
            }
            Format::Format22c => Instruction::Format22c {
                opcode,
                register_a: a,
                register_b: b,
                reference: self.u16()?,
            },
            Format::Format22cs => Instruction::Format22cs {
                opcode,
                register_a: a,
                register_b: b,
                field_offset: self.u16()?,
            },
            Format::Format22s => Instruction::Format22s {
                opcode,
                register_a: a,
                register_b: b,
                literal: self.i16()?,
            },
            Format::Format22t => Instruction::Format22t {
                opcode,
                register_a: a,
                register_b: b,
                target: self.i16()? as i32,
            },
            Format::Format22x => Instruction::Format22x {
                opcode,
                register_a: high,
                register_b: self.u16()?,
            },
            Format::Format23x => {
                let second = self.u16()?;
                Instruction::Format23x {
                    opcode,
                    register_a: high,
                    register_b: (second & 0xff) as u8,
                    register_c: (second >> 8) as u8,
                }
            }
            Format::Format30t => Instruction::Format30t {
                opcode,
                target: self.i32()?,
            },
            Format::Format31c => Instruction::Format31c {
                opcode,
                register_a: high,
                reference: self.u32()?,
            },
            Format::Format31i => Instruction::Format31i {
                opcode,
                register_a: high,
                literal: self.i32()?,
            },
            Format::Format31t => Instruction::Format31t {
                opcode,
                register_a: high,
                target: self.i32()?,
            },
            Format::Format32x => Instruction::Format32x {
                opcode,
                register_a: self.u16()?,
                register_b: self.u16()?,
            },
            Format::Format35c => {
                let (registers, reference) = self.register_list(opcode, high)?;
                Instruction::Format35c {
                    opcode,
                    registers,
                    reference,
                }
            }
            Format::Format35mi => {
                let (registers, inline_index) = self.register_list(opcode, high)?;
                Instruction::Format35mi {
                    opcode,
                    registers,
                    inline_index,
                }
            }
            Format::Format35ms => {
                let (registers, vtable_index) = self.register_list(opcode, high)?;
                Instruction::Format35ms {
                    opcode,
                    registers,
                    vtable_index,
                }
            }
            Format::Format3rc => Instruction::Format3rc {
                opcode,
                register_count: high,
                reference: self.u16()?,
                start_register: self.u16()?,
            },
            Format::Format3rmi => Instruction::Format3rmi {
                opcode,
                register_count: high,
                inline_index: self.u16()?,
                start_register: self.u16()?,
            },
            Format::Format3rms => Instruction::Format3rms {
                opcode,
                register_count: high,
                vtable_index: self.u16()?,
                start_register: self.u16()?,
            },
            Format::Format45cc => {
                let (registers, reference) = self.register_list(opcode, high)?;
                Instruction::Format45cc {
                    opcode,
                    registers,
                    reference,
                    proto: self.u16()?,
                }
            }
            Format::Format4rcc => Instruction::Format4rcc {
                opcode,
                register_count: high,
                reference: self.u16()?,
                start_register: self.u16()?,
                proto: self.u16()?,
            },
            Format::Format51l => Instruction::Format51l {
                opcode,
                register_a: high,
                literal: self.i64()?,
            },
            Format::PackedSwitchPayload => {
                let size = self.u16()?;
                let first_key = self.i32()?;
                let targets = (0..size)
                    .map(|_| self.i32())
                    .collect::<Result<Vec<_>, _>>()?;
                Instruction::PackedSwitchPayload { first_key, targets }
            }
            Format::SparseSwitchPayload => {
                let size = self.u16()?;
                let keys = (0..size)
                    .map(|_| self.i32())
                    .collect::<Result<Vec<_>, _>>()?;
                let mut elements = Vec::with_capacity(keys.len());
                for key in keys {
                    elements.push(SwitchElement {
                        key,
                        target: self.i32()?,
                    });
                }
                Instruction::SparseSwitchPayload { elements }
            }
            Format::ArrayPayload => {
                let element_width = self.u16()?;
                let size = self.u32()?;
                let byte_len = element_width as u64 * size as u64;
                let mut data = vec![];
                for _ in 0..byte_len {
                    data.push(self.reader.read_u8().map_err(|err| self.truncated(err))?);
                }
                if byte_len % 2 == 1 {
                    self.reader.read_u8().map_err(|err| self.truncated(err))?;
                }
                Instruction::ArrayPayload {
                    element_width,
                    data,
                }
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(instruction: Instruction<i32>, expected_bytes: &[u8]) {
        let bytes = encode_instructions(&[instruction.clone()]).unwrap();
        assert_eq!(bytes, expected_bytes);
        assert_eq!(bytes.len(), instruction.code_units() * 2);
        assert_eq!(decode_instructions(&bytes).unwrap(), vec![instruction]);
    }

    #[test]
    fn short_formats() {
        round_trip(
            Instruction::Format10x {
                opcode: Opcode::ReturnVoid,
            },
            &[0x0e, 0x00],
        );
        round_trip(
            Instruction::Format10t {
                opcode: Opcode::Goto,
                target: -2,
            },
            &[0x28, 0xfe],
        );
        round_trip(
            Instruction::Format11n {
                opcode: Opcode::Const4,
                register_a: 1,
                literal: -3,
            },
            &[0x12, 0xd1],
        );
        round_trip(
            Instruction::Format12x {
                opcode: Opcode::Move,
                register_a: 2,
                register_b: 7,
            },
            &[0x01, 0x72],
        );
    }

    #[test]
    fn wide_formats() {
        round_trip(
            Instruction::Format22t {
                opcode: Opcode::IfEq,
                register_a: 1,
                register_b: 2,
                target: -300,
            },
            &[0x32, 0x21, 0xd4, 0xfe],
        );
        round_trip(
            Instruction::Format30t {
                opcode: Opcode::Goto32,
                target: 0x12345,
            },
            &[0x2a, 0x00, 0x45, 0x23, 0x01, 0x00],
        );
        round_trip(
            Instruction::Format21ih {
                opcode: Opcode::ConstHigh16,
                register_a: 3,
                literal: 0x7f00_0000,
            },
            &[0x15, 0x03, 0x00, 0x7f],
        );
        round_trip(
            Instruction::Format35c {
                opcode: Opcode::InvokeStatic,
                registers: vec![1, 2, 3, 4, 5],
                reference: 0x0102,
            },
            &[0x71, 0x55, 0x02, 0x01, 0x21, 0x43],
        );
        round_trip(
            Instruction::Format3rc {
                opcode: Opcode::InvokeVirtualRange,
                start_register: 0x100,
                register_count: 3,
                reference: 7,
            },
            &[0x74, 0x03, 0x07, 0x00, 0x00, 0x01],
        );
        round_trip(
            Instruction::Format51l {
                opcode: Opcode::ConstWide,
                register_a: 0,
                literal: -2,
            },
            &[0x18, 0x00, 0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
        );
    }

    #[test]
    fn optimized_formats() {
        round_trip(
            Instruction::Format20bc {
                opcode: Opcode::ThrowVerificationError,
                verification_error: 2,
                reference: 0x0304,
            },
            &[0xed, 0x02, 0x04, 0x03],
        );
        round_trip(
            Instruction::Format22cs {
                opcode: Opcode::IgetQuick,
                register_a: 1,
                register_b: 3,
                field_offset: 8,
            },
            &[0xf2, 0x31, 0x08, 0x00],
        );
        round_trip(
            Instruction::Format35mi {
                opcode: Opcode::ExecuteInline,
                registers: vec![4, 5],
                inline_index: 1,
            },
            &[0xee, 0x20, 0x01, 0x00, 0x54, 0x00],
        );
        round_trip(
            Instruction::Format35ms {
                opcode: Opcode::InvokeVirtualQuick,
                registers: vec![0],
                vtable_index: 0x1a,
            },
            &[0xf8, 0x10, 0x1a, 0x00, 0x00, 0x00],
        );
        round_trip(
            Instruction::Format3rmi {
                opcode: Opcode::ExecuteInlineRange,
                start_register: 2,
                register_count: 3,
                inline_index: 9,
            },
            &[0xef, 0x03, 0x09, 0x00, 0x02, 0x00],
        );
        round_trip(
            Instruction::Format3rms {
                opcode: Opcode::InvokeVirtualQuickRange,
                start_register: 0x10,
                register_count: 1,
                vtable_index: 5,
            },
            &[0xf9, 0x01, 0x05, 0x00, 0x10, 0x00],
        );
    }

    #[test]
    fn payloads() {
        round_trip(
            Instruction::PackedSwitchPayload {
                first_key: 1,
                targets: vec![6, -3],
            },
            &[
                0x00, 0x01, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0xfd,
                0xff, 0xff, 0xff,
            ],
        );
        round_trip(
            Instruction::SparseSwitchPayload {
                elements: vec![SwitchElement { key: 10, target: 4 }],
            },
            &[
                0x00, 0x02, 0x01, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
            ],
        );
        round_trip(
            Instruction::ArrayPayload {
                element_width: 1,
                data: vec![9, 8, 7],
            },
            &[
                0x00, 0x03, 0x01, 0x00, 0x03, 0x00, 0x00, 0x00, 0x09, 0x08, 0x07, 0x00,
            ],
        );
    }

    #[test]
    fn malformed_code() {
        assert!(matches!(
            decode_instructions(&[0x3e, 0x00]),
            Err(Error::UnknownOpcode {
                address: 0,
                value: 0x003e
            })
        ));
        assert!(matches!(
            decode_instructions(&[0x00, 0x05]),
            Err(Error::UnknownOpcode { .. })
        ));
        assert!(matches!(
            decode_instructions(&[0x00, 0x00, 0x14, 0x00, 0x01]),
            Err(Error::TruncatedInstruction { address: 1 })
        ));
        assert!(matches!(
            decode_instructions(&[0x0e]),
            Err(Error::TruncatedInstruction { address: 0 })
        ));
    }

    #[test]
    fn oversized_offset_is_rejected() {
        let goto = Instruction::Format10t {
            opcode: Opcode::Goto,
            target: 200,
        };
        assert!(encode_instructions(&[goto]).is_err());
    }
}
