//! This module is responsible for turning a freshly edited method into one whose instructions can
//! actually be encoded. Three things can go wrong after an edit:
//!
//!   - a `goto` or `goto/16` might not have enough bits for the distance to its target, in which
//!     case it gets widened (`goto` → `goto/16` → `goto/32`)
//!
//!   - a payload might end up at an odd code address, which is not allowed. This is fixed by
//!     deleting a `nop` right before the payload, or inserting one if there isn't any.
//!
//!   - a switch payload might no longer be referred to by a switch, in which case it is deleted
//!
//! Before any of that, every switch instruction is matched up with the payload it targets (the
//! target may be a run of `nop`s leading up to the payload). A payload can only have one switch.
//!
//! ### Termination
//!
//! Every fix changes the layout of the method and may invalidate the ones already done: widening
//! a `goto` pushes other targets further away, and inserting or deleting a `nop` flips the parity
//! of every address after it. We just repeat passes over the method until nothing changes. This
//! always finishes:
//!
//!   - `goto` instructions only ever get wider, and `goto/32` reaches anywhere
//!
//!   - deleted payloads never come back
//!
//!   - a pass walks the method from front to back, and every fix only moves the instructions after
//!     it. By the end of a pass, every payload is therefore aligned, so the only thing that can
//!     require another pass is a `goto` whose target moved. Since `goto`s only get wider, there can
//!     only be so many of those passes.

use super::{BuilderInstruction, Label, MutableMethodImplementation};
use crate::dex::{Error, Instruction, Opcode};

/// Bring a method to a state where every instruction can be encoded
pub(super) fn relax(method: &mut MutableMethodImplementation) -> Result<(), Error> {
    log::debug!("Relaxing method with {} instructions", method.len());

    check_labels_placed(method)?;
    bind_switch_payloads(method)?;

    let mut passes = 1;
    while relaxation_pass(method)? {
        passes += 1;
    }

    log::debug!(
        "Relaxed method in {} passes: {} instructions, {} code units",
        passes,
        method.len(),
        method.code_units()
    );
    Ok(())
}

fn check_labels_placed(method: &MutableMethodImplementation) -> Result<(), Error> {
    for index in 0..method.len() {
        if let Some(instruction) = &method.location_at(index).instruction {
            for label in instruction.targets() {
                method.label_location(*label)?;
            }
        }
    }
    for try_block in &method.try_blocks {
        for label in [try_block.start, try_block.end, try_block.handler] {
            method.label_location(label)?;
        }
    }
    Ok(())
}

fn is_nop(instruction: &Option<BuilderInstruction>) -> bool {
    matches!(
        instruction,
        Some(Instruction::Format10x {
            opcode: Opcode::Nop
        })
    )
}

/// Find the payload of every switch, and record the switch as the payload's referrer
fn bind_switch_payloads(method: &mut MutableMethodImplementation) -> Result<(), Error> {
    method.payload_referrers.clear();

    for index in 0..method.len() {
        let (opcode, target) = match &method.location_at(index).instruction {
            Some(Instruction::Format31t { opcode, target, .. }) if opcode.is_switch() => {
                (*opcode, *target)
            }
            _ => continue,
        };

        let mut payload_index = method.label_location(target)?.index;
        if payload_index == method.len() {
            return Err(Error::SwitchTargetsEndOfMethod { index });
        }
        while is_nop(&method.location_at(payload_index).instruction) {
            payload_index += 1;
        }

        let found = match &method.location_at(payload_index).instruction {
            Some(payload) if payload.is_payload() => payload.opcode(),
            _ => return Err(Error::SwitchWithoutPayload { index }),
        };
        let expected = match opcode {
            Opcode::PackedSwitch => Opcode::PackedSwitchPayload,
            _ => Opcode::SparseSwitchPayload,
        };
        if found != expected {
            return Err(Error::MismatchedPayload {
                index,
                expected,
                found,
            });
        }

        let payload_id = method.order[payload_index];
        let switch_id = method.order[index];
        if method
            .payload_referrers
            .insert(payload_id, switch_id)
            .is_some()
        {
            return Err(Error::AmbiguousPayload { payload_index });
        }
    }

    Ok(())
}

/// Wider `goto` to use if the offset doesn't fit the current one
fn widened_goto(opcode: Opcode, offset: i64, target: Label) -> Option<BuilderInstruction> {
    let fits_8bit = i8::try_from(offset).is_ok();
    let fits_16bit = i16::try_from(offset).is_ok();
    match opcode {
        Opcode::Goto if fits_16bit && !fits_8bit => Some(Instruction::Format20t {
            opcode: Opcode::Goto16,
            target,
        }),
        Opcode::Goto | Opcode::Goto16 if !fits_16bit => Some(Instruction::Format30t {
            opcode: Opcode::Goto32,
            target,
        }),
        _ => None,
    }
}

/// Single pass of fixes over the method, returning whether anything changed
fn relaxation_pass(method: &mut MutableMethodImplementation) -> Result<bool, Error> {
    let mut changed = false;
    let mut index = 0;

    while index < method.len() {
        let location = method.location_at(index);
        let address = location.address;
        let instruction = match &location.instruction {
            Some(instruction) => instruction,
            None => break,
        };
        let opcode = instruction.opcode();

        match instruction {
            Instruction::Format10t { target, .. } | Instruction::Format20t { target, .. }
                if opcode.is_goto() =>
            {
                let target = *target;
                let offset = method.label_location(target)?.address as i64 - address as i64;
                if let Some(widened) = widened_goto(opcode, offset, target) {
                    log::trace!(
                        "Widening {} at index {} (offset {}) to {}",
                        opcode,
                        index,
                        offset,
                        widened.opcode()
                    );
                    method.set_instruction(index, widened);
                    changed = true;
                }
                index += 1;
            }

            Instruction::PackedSwitchPayload { .. } | Instruction::SparseSwitchPayload { .. }
                if !method.payload_referrers.contains_key(&method.order[index]) =>
            {
                log::trace!("Removing unreferenced {} at index {}", opcode, index);
                method.remove_location(index);
                changed = true;
            }

            payload if payload.is_payload() && address % 2 == 1 => {
                if index > 0 && is_nop(&method.location_at(index - 1).instruction) {
                    log::trace!("Aligning {} at index {} by removing a nop", opcode, index);
                    method.remove_location(index - 1);
                } else {
                    log::trace!("Aligning {} at index {} by adding a nop", opcode, index);
                    method.insert_location(
                        index,
                        Instruction::Format10x {
                            opcode: Opcode::Nop,
                        },
                    );
                    index += 2;
                }
                changed = true;
            }

            _ => index += 1,
        }
    }

    Ok(changed)
}
