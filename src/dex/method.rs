use super::binary_format::{decode_instructions, encode_instructions};
use super::{AddressedDebugItem, Error, Instruction};
use crate::util::{Offset, OffsetResult, OffsetVec};

/// Read-only view of a method body, with branch targets as relative offsets
pub trait MethodImplementation {
    fn register_count(&self) -> u16;

    /// Instructions, keyed by their code address
    fn instructions(&self) -> &OffsetVec<Instruction<i32>>;

    fn try_blocks(&self) -> &[TryBlock];

    fn debug_items(&self) -> &[AddressedDebugItem];
}

/// Range of code covered by a set of exception handlers
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TryBlock {
    pub start_address: usize,
    pub code_unit_count: usize,
    pub handlers: Vec<ExceptionHandler>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExceptionHandler {
    /// Type pool index of the caught exception, or `None` to catch everything
    pub exception_type: Option<u32>,
    pub handler_address: usize,
}

/// Finished method body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImmutableMethodImplementation {
    pub register_count: u16,
    pub instructions: OffsetVec<Instruction<i32>>,
    pub try_blocks: Vec<TryBlock>,
    pub debug_items: Vec<AddressedDebugItem>,
}

impl ImmutableMethodImplementation {
    pub fn new(
        register_count: u16,
        instructions: Vec<Instruction<i32>>,
        try_blocks: Vec<TryBlock>,
        debug_items: Vec<AddressedDebugItem>,
    ) -> ImmutableMethodImplementation {
        ImmutableMethodImplementation {
            register_count,
            instructions: instructions.into_iter().collect(),
            try_blocks,
            debug_items,
        }
    }

    /// Decode a method body from its code array
    pub fn from_bytes(
        register_count: u16,
        code: &[u8],
        try_blocks: Vec<TryBlock>,
        debug_items: Vec<AddressedDebugItem>,
    ) -> Result<ImmutableMethodImplementation, Error> {
        let instructions = decode_instructions(code)?;
        Ok(ImmutableMethodImplementation::new(
            register_count,
            instructions,
            try_blocks,
            debug_items,
        ))
    }

    /// Encode the code array
    pub fn code_bytes(&self) -> Result<Vec<u8>, Error> {
        let instructions: Vec<Instruction<i32>> = self
            .instructions
            .iter()
            .map(|(_, _, instruction)| instruction.clone())
            .collect();
        Ok(encode_instructions(&instructions)?)
    }

    /// Total size of the code, in code units
    pub fn code_units(&self) -> usize {
        self.instructions.offset_len().0
    }

    /// Instruction starting exactly at a code address
    pub fn instruction_at(&self, address: usize) -> Option<&Instruction<i32>> {
        match self.instructions.get_offset(Offset(address)) {
            OffsetResult::Ok(_, instruction) => Some(instruction),
            _ => None,
        }
    }
}

impl MethodImplementation for ImmutableMethodImplementation {
    fn register_count(&self) -> u16 {
        self.register_count
    }

    fn instructions(&self) -> &OffsetVec<Instruction<i32>> {
        &self.instructions
    }

    fn try_blocks(&self) -> &[TryBlock] {
        &self.try_blocks
    }

    fn debug_items(&self) -> &[AddressedDebugItem] {
        &self.debug_items
    }
}
