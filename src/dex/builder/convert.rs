//! Conversion between [`MutableMethodImplementation`] and finished method bodies
//!
//! Importing turns every code address mentioned in the method (branch targets, try block bounds,
//! handlers, debug items) into a label. Exporting relaxes the method and turns labels back into
//! addresses and offsets.

use super::{BuilderInstruction, BuilderTryBlock, Label, MutableMethodImplementation};
use crate::dex::{
    Error, ExceptionHandler, ImmutableMethodImplementation, Instruction, MethodImplementation,
    Opcode, TryBlock,
};
use crate::util::OffsetVec;
use std::collections::HashMap;

/// Maps code addresses to the index of the instruction covering them
struct AddressTable {
    indices: Vec<usize>,
}

impl AddressTable {
    /// Every address in `0..=code_units` gets an entry, with the end of the method mapping to the
    /// end-of-method index
    fn new(instructions: &OffsetVec<Instruction<i32>>) -> AddressTable {
        let code_units = instructions.offset_len().0;
        let mut indices = vec![instructions.len(); code_units + 1];
        for (offset, index, instruction) in instructions {
            indices[offset.0..offset.0 + instruction.code_units()].fill(index);
        }
        AddressTable { indices }
    }

    fn code_units(&self) -> usize {
        self.indices.len() - 1
    }

    /// Index of the instruction covering an address
    ///
    /// Addresses inside an instruction resolve to that instruction, and addresses past the end
    /// resolve to the end of the method.
    fn index(&self, address: i64) -> Result<usize, Error> {
        if address < 0 {
            return Err(Error::AddressOutOfBounds {
                address,
                code_units: self.code_units(),
            });
        }
        let address = (address as u64).min(self.code_units() as u64) as usize;
        Ok(self.indices[address])
    }

    fn label(
        &self,
        method: &mut MutableMethodImplementation,
        address: i64,
    ) -> Result<Label, Error> {
        let index = self.index(address)?;
        Ok(method.new_label_at(index))
    }
}

/// Address of the switch whose payload is at `payload_index`
///
/// A switch may target a run of `nop`s before its payload, so those are searched too.
fn switch_address(
    payload_index: usize,
    switch_targets: &HashMap<usize, usize>,
    instructions: &OffsetVec<Instruction<i32>>,
) -> Option<usize> {
    let mut index = payload_index;
    loop {
        if let Some(address) = switch_targets.get(&index) {
            return Some(*address);
        }
        index = index.checked_sub(1)?;
        match instructions.get_index(index) {
            Some((
                _,
                Instruction::Format10x {
                    opcode: Opcode::Nop,
                },
            )) => continue,
            _ => return None,
        }
    }
}

impl MutableMethodImplementation {
    /// Import a finished method body
    pub fn from_implementation(
        implementation: &impl MethodImplementation,
    ) -> Result<MutableMethodImplementation, Error> {
        let instructions = implementation.instructions();
        let table = AddressTable::new(instructions);
        let mut method = MutableMethodImplementation::with_placeholders(
            implementation.register_count(),
            instructions.len(),
        );
        let mut converted: Vec<Option<BuilderInstruction>> = vec![None; instructions.len()];

        // Switch target index to switch address (the first switch wins)
        let mut switch_targets: HashMap<usize, usize> = HashMap::new();

        for (offset, index, instruction) in instructions {
            if instruction.is_payload() {
                continue;
            }
            let address = offset.0 as i64;
            converted[index] = Some(
                instruction
                    .map_targets(|target| table.label(&mut method, address + *target as i64))?,
            );
            if instruction.opcode().is_switch() {
                if let Some(target) = instruction.targets().first() {
                    let target_index = table.index(address + **target as i64)?;
                    switch_targets.entry(target_index).or_insert(offset.0);
                }
            }
        }

        // Payload targets are relative to their switch, so these go second
        for (offset, index, instruction) in instructions {
            if !instruction.is_payload() {
                continue;
            }
            converted[index] = Some(match switch_address(index, &switch_targets, instructions) {
                Some(base) => instruction
                    .map_targets(|target| table.label(&mut method, base as i64 + *target as i64))?,
                None => {
                    log::trace!(
                        "No switch refers to {} at address {}",
                        instruction.opcode(),
                        offset.0
                    );
                    instruction
                        .map_targets(|target| table.label(&mut method, (*target as i64).max(0)))?
                }
            });
        }

        for (index, instruction) in converted.into_iter().enumerate() {
            if let Some(instruction) = instruction {
                instruction.validate()?;
                let id = method.order[index];
                method.locations[id].instruction = Some(instruction);
            }
        }
        method.reindex_from(0);

        for try_block in implementation.try_blocks() {
            let start_address = try_block.start_address as i64;
            let end_address = start_address + try_block.code_unit_count as i64;
            for handler in &try_block.handlers {
                let start = table.label(&mut method, start_address)?;
                let end = table.label(&mut method, end_address)?;
                let handler_label = table.label(&mut method, handler.handler_address as i64)?;
                method.try_blocks.push(BuilderTryBlock {
                    start,
                    end,
                    exception_type: handler.exception_type,
                    handler: handler_label,
                });
            }
        }

        for debug_item in implementation.debug_items() {
            let index = table.index(debug_item.address as i64)?;
            let id = method.order[index];
            method.locations[id].debug_items.push(debug_item.item.clone());
        }

        log::debug!(
            "Imported method with {} instructions ({} code units)",
            method.len(),
            method.code_units()
        );
        Ok(method)
    }

    /// Relax the method and export it as a finished method body
    pub fn to_immutable(&mut self) -> Result<ImmutableMethodImplementation, Error> {
        self.relax()?;

        let mut instructions = Vec::with_capacity(self.len());
        for index in 0..self.len() {
            let location = self.location_at(index);
            let instruction = match &location.instruction {
                Some(instruction) => instruction,
                None => continue,
            };
            let opcode = instruction.opcode();

            // Payload offsets are relative to the switch referring to them
            let base = match self.payload_referrers.get(&self.order[index]) {
                Some(referrer) => self.locations[*referrer].address,
                None => location.address,
            };

            let exported = instruction.map_targets(|label| {
                let offset = self.label_location(*label)?.address as i64 - base as i64;
                i32::try_from(offset).map_err(|_| Error::BranchOffsetOverflow {
                    index,
                    opcode,
                    offset,
                })
            })?;
            check_offset_fits(&exported, index)?;
            instructions.push(exported);
        }

        let mut try_blocks: Vec<TryBlock> = vec![];
        for entry in &self.try_blocks {
            let start_address = self.label_location(entry.start)?.address;
            let end_address = self.label_location(entry.end)?.address;
            let handler = ExceptionHandler {
                exception_type: entry.exception_type,
                handler_address: self.label_location(entry.handler)?.address,
            };
            if end_address <= start_address {
                log::trace!(
                    "Dropping empty try block at address {} (handler at {})",
                    start_address,
                    handler.handler_address
                );
                continue;
            }

            let code_unit_count = end_address - start_address;
            match try_blocks.last_mut() {
                Some(last)
                    if last.start_address == start_address
                        && last.code_unit_count == code_unit_count =>
                {
                    last.handlers.push(handler)
                }
                _ => try_blocks.push(TryBlock {
                    start_address,
                    code_unit_count,
                    handlers: vec![handler],
                }),
            }
        }

        let debug_items = self.addressed_debug_items();

        log::debug!(
            "Exported method with {} instructions ({} code units)",
            instructions.len(),
            self.code_units()
        );
        Ok(ImmutableMethodImplementation::new(
            self.register_count,
            instructions,
            try_blocks,
            debug_items,
        ))
    }
}

/// Check branch offsets against formats that can't be widened automatically
fn check_offset_fits(instruction: &Instruction<i32>, index: usize) -> Result<(), Error> {
    let (opcode, offset, fits) = match instruction {
        Instruction::Format10t { opcode, target } => {
            (*opcode, *target, i8::try_from(*target).is_ok())
        }
        Instruction::Format20t { opcode, target }
        | Instruction::Format21t { opcode, target, .. }
        | Instruction::Format22t { opcode, target, .. } => {
            (*opcode, *target, i16::try_from(*target).is_ok())
        }
        _ => return Ok(()),
    };
    if fits {
        Ok(())
    } else {
        Err(Error::BranchOffsetOverflow {
            index,
            opcode,
            offset: offset as i64,
        })
    }
}
