use super::location::{Location, LocationArena, LocationId};
use super::{relaxation, BuilderInstruction, Label};
use crate::dex::{AddressedDebugItem, DebugItem, Error};
use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of the ids tying labels to the method that issued them
static NEXT_METHOD_ID: AtomicUsize = AtomicUsize::new(0);

/// One handler of a try block, with the covered range given by labels
///
/// The covered range runs from `start` up to (but excluding) `end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BuilderTryBlock {
    pub start: Label,
    pub end: Label,
    /// Type pool index of the caught exception, or `None` to catch everything
    pub exception_type: Option<u32>,
    pub handler: Label,
}

/// Editable method body
///
/// Instructions live in [`Location`]s, which are kept in method order with their indices and
/// addresses up to date after every edit. Branches refer to [`Label`]s instead of offsets, so
/// editing never requires patching other instructions.
///
/// What edits don't do is pick instruction encodings: a `goto` may end up too short for its
/// target, a payload may land on an odd address, or a switch payload may lose its switch. These
/// are fixed up by [relaxation](Self::relax), which runs on demand before anything is read back
/// out. The read accessors therefore take `&mut self`.
///
/// A clone keeps the id of the original, so labels issued before cloning work on both copies.
#[derive(Clone, Debug)]
pub struct MutableMethodImplementation {
    /// Id stamped on every label this method issues
    pub(super) id: usize,

    pub(super) register_count: u16,

    pub(super) locations: LocationArena,

    /// Locations in method order, ending with the end-of-method location
    pub(super) order: Vec<LocationId>,

    /// Location denoted by each label, indexed by label (`None` until the label is placed)
    pub(super) labels: Vec<Option<LocationId>>,

    pub(super) try_blocks: Vec<BuilderTryBlock>,

    /// Switch instruction referring to each switch payload (only valid after relaxation)
    pub(super) payload_referrers: HashMap<LocationId, LocationId>,

    pub(super) needs_relaxation: bool,
}

impl MutableMethodImplementation {
    /// Empty method
    pub fn new(register_count: u16) -> MutableMethodImplementation {
        MutableMethodImplementation::with_placeholders(register_count, 0)
    }

    /// Method with `count` empty locations before the end location
    ///
    /// The locations have to be filled in (and then reindexed) before the method is usable.
    pub(super) fn with_placeholders(
        register_count: u16,
        count: usize,
    ) -> MutableMethodImplementation {
        let mut locations = LocationArena::new();
        let order = (0..=count)
            .map(|index| locations.alloc(Location::new(index, 0, None)))
            .collect();
        MutableMethodImplementation {
            id: NEXT_METHOD_ID.fetch_add(1, Ordering::Relaxed),
            register_count,
            locations,
            order,
            labels: vec![],
            try_blocks: vec![],
            payload_referrers: HashMap::new(),
            needs_relaxation: count > 0,
        }
    }

    pub fn register_count(&self) -> u16 {
        self.register_count
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.order.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the method in code units, with instruction encodings as they currently stand
    pub fn code_units(&self) -> usize {
        self.location_at(self.len()).address
    }

    /// Instruction at an index, as it currently stands (this does not trigger relaxation)
    pub fn instruction(&self, index: usize) -> Option<&BuilderInstruction> {
        self.order
            .get(index)
            .and_then(|id| self.locations[*id].instruction.as_ref())
    }

    pub(super) fn location_at(&self, index: usize) -> &Location {
        &self.locations[self.order[index]]
    }

    fn check_index(&self, index: usize, allow_end: bool) -> Result<(), Error> {
        let len = self.len();
        if index < len || (allow_end && index == len) {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds { index, len })
        }
    }

    pub(super) fn check_label(&self, label: Label) -> Result<(), Error> {
        if label.method == self.id && label.index < self.labels.len() {
            Ok(())
        } else {
            Err(Error::UnknownLabel(label))
        }
    }

    fn check_instruction(&self, instruction: &BuilderInstruction) -> Result<(), Error> {
        instruction.validate()?;
        for label in instruction.targets() {
            self.check_label(*label)?;
        }
        Ok(())
    }

    /// Add an instruction to the end of the method
    ///
    /// Labels and debug items pinned to the end of the method end up on the new instruction.
    pub fn append_instruction(&mut self, instruction: BuilderInstruction) -> Result<(), Error> {
        self.check_instruction(&instruction)?;
        self.append_location(instruction);
        self.needs_relaxation = true;
        Ok(())
    }

    /// Add an instruction at an index, shifting the instruction there (and its labels) forward
    ///
    /// Inserting at the end-of-method index is the same as appending.
    pub fn insert_instruction(
        &mut self,
        index: usize,
        instruction: BuilderInstruction,
    ) -> Result<(), Error> {
        self.check_index(index, true)?;
        self.check_instruction(&instruction)?;
        self.insert_location(index, instruction);
        self.needs_relaxation = true;
        Ok(())
    }

    /// Swap out the instruction at an index, returning the old instruction
    pub fn replace_instruction(
        &mut self,
        index: usize,
        instruction: BuilderInstruction,
    ) -> Result<BuilderInstruction, Error> {
        self.check_index(index, false)?;
        self.check_instruction(&instruction)?;
        let len = self.len();
        let old = self
            .set_instruction(index, instruction)
            .ok_or(Error::IndexOutOfBounds { index, len })?;
        self.needs_relaxation = true;
        Ok(old)
    }

    /// Remove the instruction at an index, returning it
    ///
    /// Labels and debug items of the removed instruction move to the instruction after it (ahead
    /// of that instruction's own debug items).
    pub fn remove_instruction(&mut self, index: usize) -> Result<BuilderInstruction, Error> {
        self.check_index(index, false)?;
        let len = self.len();
        let removed = self
            .remove_location(index)
            .ok_or(Error::IndexOutOfBounds { index, len })?;
        self.needs_relaxation = true;
        Ok(removed)
    }

    /// Exchange two instructions (labels and debug items stay where they are)
    pub fn swap_instructions(&mut self, index1: usize, index2: usize) -> Result<(), Error> {
        self.check_index(index1, false)?;
        self.check_index(index2, false)?;
        if index1 != index2 {
            let (id1, id2) = (self.order[index1], self.order[index2]);
            let instruction1 = self.locations[id1].instruction.take();
            let instruction2 = mem::replace(&mut self.locations[id2].instruction, instruction1);
            self.locations[id1].instruction = instruction2;
            self.reindex_from(index1.min(index2) + 1);
            self.needs_relaxation = true;
        }
        Ok(())
    }

    /// Fresh label for the instruction at an index (or the end of the method)
    pub fn label_for_index(&mut self, index: usize) -> Result<Label, Error> {
        self.check_index(index, true)?;
        Ok(self.new_label_at(index))
    }

    /// Fresh label for the instruction covering a code address (or the end of the method)
    ///
    /// An address inside an instruction gets a label on that instruction. Addresses reflect the
    /// instruction encodings as they currently stand, so call [`relax`](Self::relax) first if the
    /// method was edited.
    pub fn label_for_address(&mut self, address: usize) -> Result<Label, Error> {
        if address > self.code_units() {
            return Err(Error::AddressOutOfBounds {
                address: address as i64,
                code_units: self.code_units(),
            });
        }
        let found = self
            .order
            .binary_search_by_key(&address, |id| self.locations[*id].address);
        let index = match found {
            Ok(index) => index,
            Err(insert_at) => insert_at - 1,
        };
        Ok(self.new_label_at(index))
    }

    /// Index of the instruction a label denotes
    pub fn label_index(&self, label: Label) -> Result<usize, Error> {
        Ok(self.label_location(label)?.index)
    }

    /// Address of the instruction a label denotes, after relaxation
    pub fn label_address(&mut self, label: Label) -> Result<usize, Error> {
        self.relax()?;
        Ok(self.label_location(label)?.address)
    }

    /// Add a handler for a range of instructions
    pub fn add_try_block(
        &mut self,
        start: Label,
        end: Label,
        handler: Label,
        exception_type: Option<u32>,
    ) -> Result<(), Error> {
        self.check_label(start)?;
        self.check_label(end)?;
        self.check_label(handler)?;
        self.try_blocks.push(BuilderTryBlock {
            start,
            end,
            exception_type,
            handler,
        });
        Ok(())
    }

    /// Pin a debug item to the instruction at an index (or the end of the method)
    pub fn add_debug_item(&mut self, index: usize, item: DebugItem) -> Result<(), Error> {
        self.check_index(index, true)?;
        let id = self.order[index];
        self.locations[id].debug_items.push(item);
        Ok(())
    }

    /// Detach the debug items pinned to the instruction at an index (or the end of the method)
    pub fn remove_debug_items(&mut self, index: usize) -> Result<Vec<DebugItem>, Error> {
        self.check_index(index, true)?;
        let id = self.order[index];
        Ok(self.locations[id].debug_items.take())
    }

    /// Keep only the debug items matching a predicate, throughout the method
    pub fn retain_debug_items(&mut self, mut keep: impl FnMut(&DebugItem) -> bool) {
        let mut removed = 0;
        for id in &self.order {
            let debug_items = &mut self.locations[*id].debug_items;
            let before = debug_items.len();
            debug_items.retain(&mut keep);
            removed += before - debug_items.len();
        }
        log::trace!("Removed {} debug items", removed);
    }

    /// Fix up instruction encodings, if anything changed since the last time
    ///
    /// On failure, the method is left as is and the next read will try again.
    pub fn relax(&mut self) -> Result<(), Error> {
        if self.needs_relaxation {
            relaxation::relax(self)?;
            self.needs_relaxation = false;
        }
        Ok(())
    }

    pub fn instructions(
        &mut self,
    ) -> Result<impl Iterator<Item = &BuilderInstruction> + '_, Error> {
        self.relax()?;
        let this: &MutableMethodImplementation = self;
        Ok(this
            .order
            .iter()
            .filter_map(move |id| this.locations[*id].instruction.as_ref()))
    }

    /// Every location, including the end-of-method location
    pub fn locations(&mut self) -> Result<impl Iterator<Item = &Location> + '_, Error> {
        self.relax()?;
        let this: &MutableMethodImplementation = self;
        Ok(this.order.iter().map(move |id| &this.locations[*id]))
    }

    pub fn try_blocks(&mut self) -> Result<&[BuilderTryBlock], Error> {
        self.relax()?;
        Ok(&self.try_blocks)
    }

    pub fn debug_items(&mut self) -> Result<Vec<AddressedDebugItem>, Error> {
        self.relax()?;
        Ok(self.addressed_debug_items())
    }

    pub(super) fn addressed_debug_items(&self) -> Vec<AddressedDebugItem> {
        self.order
            .iter()
            .map(|id| &self.locations[*id])
            .flat_map(|location| {
                location.debug_items.iter().map(move |item| AddressedDebugItem {
                    address: location.address,
                    item: item.clone(),
                })
            })
            .collect()
    }

    /// Location a label denotes
    pub(super) fn label_location(&self, label: Label) -> Result<&Location, Error> {
        if label.method != self.id {
            return Err(Error::UnknownLabel(label));
        }
        match self.labels.get(label.index) {
            None => Err(Error::UnknownLabel(label)),
            Some(None) => Err(Error::UnplacedLabel(label)),
            Some(Some(id)) => Ok(&self.locations[*id]),
        }
    }

    pub(super) fn new_label_at(&mut self, index: usize) -> Label {
        let label = self.unplaced_label();
        self.place_label(label, index);
        label
    }

    pub(super) fn unplaced_label(&mut self) -> Label {
        let label = Label {
            method: self.id,
            index: self.labels.len(),
        };
        self.labels.push(None);
        label
    }

    /// Pin a label to a location (the label must not already be placed)
    pub(super) fn place_label(&mut self, label: Label, index: usize) {
        let id = self.order[index];
        self.labels[label.index] = Some(id);
        self.locations[id].labels.push(label);
    }

    /// Recompute indices and addresses of the locations from `index` onwards
    pub(super) fn reindex_from(&mut self, index: usize) {
        let mut address = match index.checked_sub(1) {
            Some(previous) => self.location_at(previous).next_address(),
            None => 0,
        };
        for (idx, id) in self.order.iter().enumerate().skip(index) {
            let location = &mut self.locations[*id];
            location.index = idx;
            location.address = address;
            address = location.next_address();
        }
    }

    pub(super) fn append_location(&mut self, instruction: BuilderInstruction) {
        let end_id = self.order[self.len()];
        let end = &mut self.locations[end_id];
        end.instruction = Some(instruction);
        let new_end = Location::new(end.index + 1, end.next_address(), None);
        let new_end_id = self.locations.alloc(new_end);
        self.order.push(new_end_id);
    }

    pub(super) fn insert_location(&mut self, index: usize, instruction: BuilderInstruction) {
        if index == self.len() {
            return self.append_location(instruction);
        }
        let address = self.location_at(index).address;
        let id = self
            .locations
            .alloc(Location::new(index, address, Some(instruction)));
        self.order.insert(index, id);
        self.reindex_from(index + 1);
    }

    pub(super) fn set_instruction(
        &mut self,
        index: usize,
        instruction: BuilderInstruction,
    ) -> Option<BuilderInstruction> {
        let id = self.order[index];
        let old = self.locations[id].instruction.replace(instruction);
        self.reindex_from(index + 1);
        old
    }

    pub(super) fn remove_location(&mut self, index: usize) -> Option<BuilderInstruction> {
        let id = self.order.remove(index);
        let mut removed = self.locations.free(id)?;
        let next_id = self.order[index];

        for label in &removed.labels {
            self.labels[label.index] = Some(next_id);
        }
        let next = &mut self.locations[next_id];
        removed.labels.merge_into(&mut next.labels);
        removed.debug_items.merge_into(&mut next.debug_items);

        self.payload_referrers.remove(&id);
        self.payload_referrers.retain(|_, referrer| *referrer != id);

        self.reindex_from(index);
        removed.instruction
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dex::{Instruction, Opcode};

    fn nop() -> BuilderInstruction {
        Instruction::Format10x {
            opcode: Opcode::Nop,
        }
    }

    fn const16(register: u8) -> BuilderInstruction {
        Instruction::Format21s {
            opcode: Opcode::Const16,
            register_a: register,
            literal: 7,
        }
    }

    fn addresses(method: &mut MutableMethodImplementation) -> Vec<(usize, usize)> {
        method
            .locations()
            .unwrap()
            .map(|loc| (loc.index(), loc.address()))
            .collect()
    }

    #[test]
    fn insertion_shifts_addresses() {
        let mut method = MutableMethodImplementation::new(2);
        method.append_instruction(nop()).unwrap();
        method.append_instruction(nop()).unwrap();
        method.insert_instruction(1, const16(0)).unwrap();
        assert_eq!(method.len(), 3);
        assert_eq!(addresses(&mut method), vec![(0, 0), (1, 1), (2, 3), (3, 4)]);
        assert_eq!(method.instruction(1), Some(&const16(0)));
    }

    #[test]
    fn remove_moves_labels_forward() {
        let mut method = MutableMethodImplementation::new(2);
        method.append_instruction(const16(0)).unwrap();
        method.append_instruction(nop()).unwrap();
        let label = method.label_for_index(0).unwrap();
        method.add_debug_item(0, DebugItem::LineNumber { line: 1 }).unwrap();
        method.add_debug_item(1, DebugItem::LineNumber { line: 2 }).unwrap();

        assert_eq!(method.remove_instruction(0).unwrap(), const16(0));
        assert_eq!(method.label_index(label).unwrap(), 0);
        assert_eq!(
            method.debug_items().unwrap(),
            vec![
                AddressedDebugItem {
                    address: 0,
                    item: DebugItem::LineNumber { line: 1 }
                },
                AddressedDebugItem {
                    address: 0,
                    item: DebugItem::LineNumber { line: 2 }
                },
            ]
        );
        assert_eq!(addresses(&mut method), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn swap_recomputes_addresses() {
        let mut method = MutableMethodImplementation::new(2);
        method.append_instruction(nop()).unwrap();
        method.append_instruction(const16(1)).unwrap();
        let label = method.label_for_index(1).unwrap();
        method.swap_instructions(0, 1).unwrap();
        assert_eq!(method.instruction(0), Some(&const16(1)));
        assert_eq!(addresses(&mut method), vec![(0, 0), (1, 2), (2, 3)]);
        assert_eq!(method.label_index(label).unwrap(), 1);
    }

    #[test]
    fn bounds_are_checked() {
        let mut method = MutableMethodImplementation::new(0);
        method.append_instruction(const16(0)).unwrap();
        assert!(matches!(
            method.remove_instruction(1),
            Err(Error::IndexOutOfBounds { index: 1, len: 1 })
        ));
        assert!(method.label_for_index(1).is_ok());
        assert!(method.label_for_index(2).is_err());
        let inside = method.label_for_address(1).unwrap();
        assert_eq!(method.label_index(inside).unwrap(), 0);
        assert!(matches!(
            method.label_for_address(3),
            Err(Error::AddressOutOfBounds { .. })
        ));
        assert!(method.label_for_address(2).is_ok());
    }

    #[test]
    fn foreign_labels_are_rejected() {
        let mut other = MutableMethodImplementation::new(0);
        other.append_instruction(nop()).unwrap();
        let foreign = other.label_for_index(1).unwrap();

        let mut method = MutableMethodImplementation::new(0);
        method.append_instruction(nop()).unwrap();
        let own = method.label_for_index(0).unwrap();
        assert_eq!(own.index, foreign.index);

        let goto = Instruction::Format10t {
            opcode: Opcode::Goto,
            target: foreign,
        };
        assert!(matches!(
            method.insert_instruction(0, goto),
            Err(Error::UnknownLabel(label)) if label == foreign
        ));
        assert!(matches!(
            method.add_try_block(own, own, foreign, None),
            Err(Error::UnknownLabel(_))
        ));
        assert!(matches!(
            method.label_index(foreign),
            Err(Error::UnknownLabel(_))
        ));
        assert_eq!(method.len(), 1);
        assert!(method.try_blocks().unwrap().is_empty());
    }

    #[test]
    fn debug_items_can_be_detached() {
        let mut method = MutableMethodImplementation::new(1);
        method.append_instruction(nop()).unwrap();
        method.append_instruction(nop()).unwrap();
        method.add_debug_item(0, DebugItem::PrologueEnd).unwrap();
        method.add_debug_item(0, DebugItem::LineNumber { line: 7 }).unwrap();
        method.add_debug_item(1, DebugItem::LineNumber { line: 8 }).unwrap();

        method.retain_debug_items(|item| !matches!(item, DebugItem::LineNumber { .. }));
        assert_eq!(
            method.debug_items().unwrap(),
            vec![AddressedDebugItem {
                address: 0,
                item: DebugItem::PrologueEnd
            }]
        );

        assert_eq!(method.remove_debug_items(0).unwrap(), vec![DebugItem::PrologueEnd]);
        assert!(method.remove_debug_items(0).unwrap().is_empty());
        assert!(method.debug_items().unwrap().is_empty());
        assert!(method.remove_debug_items(3).is_err());
    }
}
