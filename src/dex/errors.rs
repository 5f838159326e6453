use super::builder::Label;
use super::Opcode;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Instruction index is past the end of the method
    ///
    /// `len` is the number of instructions, so the end-of-method index `len` is only accepted by
    /// operations that can target the end of the method (insertion, labels, debug items).
    IndexOutOfBounds { index: usize, len: usize },

    /// Code address is negative or past the end of the method
    AddressOutOfBounds { address: i64, code_units: usize },

    /// Label was not issued by this method
    UnknownLabel(Label),

    /// Instruction operands don't fit its format (or its opcode doesn't match its format)
    InvalidInstruction {
        opcode: Opcode,
        reason: &'static str,
    },

    /// Switch at this index targets the end of the method instead of a payload
    SwitchTargetsEndOfMethod { index: usize },

    /// Switch at this index targets something other than a payload
    SwitchWithoutPayload { index: usize },

    /// Switch at this index targets a payload of the wrong kind
    MismatchedPayload {
        index: usize,
        expected: Opcode,
        found: Opcode,
    },

    /// More than one switch refers to the payload at this index
    AmbiguousPayload { payload_index: usize },

    /// Label is referenced but was never given a location
    UnplacedLabel(Label),

    /// Resolved branch offset doesn't fit the instruction's format (only `goto` is widened)
    BranchOffsetOverflow {
        index: usize,
        opcode: Opcode,
        offset: i64,
    },

    /// Code unit does not start a known instruction
    UnknownOpcode { address: usize, value: u16 },

    /// Instruction at this address runs past the end of the code
    TruncatedInstruction { address: usize },

    IoError(std::io::Error),

    /// Sequential builder finished with labels that were never placed
    MethodNotFinished { unplaced_labels: Vec<String> },

    /// Named label was placed twice
    DuplicateLabel(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IndexOutOfBounds { index, len } => {
                write!(f, "index {} out of bounds (method has {} instructions)", index, len)
            }
            Error::AddressOutOfBounds {
                address,
                code_units,
            } => write!(
                f,
                "address {} out of bounds (method has {} code units)",
                address, code_units
            ),
            Error::UnknownLabel(label) => write!(f, "unknown label {:?}", label),
            Error::InvalidInstruction { opcode, reason } => {
                write!(f, "invalid {} instruction: {}", opcode, reason)
            }
            Error::SwitchTargetsEndOfMethod { index } => write!(
                f,
                "switch instruction at index {} targets the end of the method",
                index
            ),
            Error::SwitchWithoutPayload { index } => write!(
                f,
                "switch instruction at index {} does not refer to a payload",
                index
            ),
            Error::MismatchedPayload {
                index,
                expected,
                found,
            } => write!(
                f,
                "switch instruction at index {} expects a {} but refers to a {}",
                index, expected, found
            ),
            Error::AmbiguousPayload { payload_index } => write!(
                f,
                "payload at index {} is referenced by more than one switch",
                payload_index
            ),
            Error::UnplacedLabel(label) => write!(f, "label {:?} was never placed", label),
            Error::BranchOffsetOverflow {
                index,
                opcode,
                offset,
            } => write!(
                f,
                "offset {} of {} at index {} does not fit its format",
                offset, opcode, index
            ),
            Error::UnknownOpcode { address, value } => {
                write!(f, "unknown opcode {:#06x} at address {}", value, address)
            }
            Error::TruncatedInstruction { address } => {
                write!(f, "truncated instruction at address {}", address)
            }
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::MethodNotFinished { unplaced_labels } => write!(
                f,
                "method has unplaced labels: {}",
                unplaced_labels.join(", ")
            ),
            Error::DuplicateLabel(name) => write!(f, "label {:?} placed twice", name),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
