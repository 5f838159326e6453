use super::{BuilderInstruction, Label, LocatedItems};
use crate::dex::DebugItem;
use std::ops::{Index, IndexMut};

/// Stable handle to a location (survives insertions and removals elsewhere in the method)
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LocationId(usize);

/// Slot in a mutable method: an instruction along with everything pinned to it
///
/// The last location of a method has no instruction. It stands for the end of the method, so
/// labels and debug items can refer to the position after the last instruction.
#[derive(Clone, Debug)]
pub struct Location {
    pub(super) index: usize,
    pub(super) address: usize,
    pub(super) instruction: Option<BuilderInstruction>,
    pub(super) labels: LocatedItems<Label>,
    pub(super) debug_items: LocatedItems<DebugItem>,
}

impl Location {
    pub(super) fn new(
        index: usize,
        address: usize,
        instruction: Option<BuilderInstruction>,
    ) -> Location {
        Location {
            index,
            address,
            instruction,
            labels: LocatedItems::new(),
            debug_items: LocatedItems::new(),
        }
    }

    /// Position in the method's instruction list
    pub fn index(&self) -> usize {
        self.index
    }

    /// Code address, in code units from the start of the method
    pub fn address(&self) -> usize {
        self.address
    }

    pub fn instruction(&self) -> Option<&BuilderInstruction> {
        self.instruction.as_ref()
    }

    pub fn labels(&self) -> &LocatedItems<Label> {
        &self.labels
    }

    pub fn debug_items(&self) -> &LocatedItems<DebugItem> {
        &self.debug_items
    }

    /// Address of the following location
    pub(super) fn next_address(&self) -> usize {
        self.address + self.instruction.as_ref().map_or(0, |instr| instr.code_units())
    }
}

/// Owner of every location in a method
///
/// Freed slots are not reused, so a `LocationId` never gets reassigned to a different location.
#[derive(Clone, Debug, Default)]
pub struct LocationArena {
    slots: Vec<Option<Location>>,
}

impl LocationArena {
    pub fn new() -> LocationArena {
        LocationArena { slots: vec![] }
    }

    pub fn alloc(&mut self, location: Location) -> LocationId {
        let id = LocationId(self.slots.len());
        self.slots.push(Some(location));
        id
    }

    pub fn free(&mut self, id: LocationId) -> Option<Location> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }
}

/// Panics if the location was freed
impl Index<LocationId> for LocationArena {
    type Output = Location;

    fn index(&self, id: LocationId) -> &Location {
        match self.get(id) {
            Some(location) => location,
            None => panic!("location {:?} was freed", id),
        }
    }
}

impl IndexMut<LocationId> for LocationArena {
    fn index_mut(&mut self, id: LocationId) -> &mut Location {
        match self.get_mut(id) {
            Some(location) => location,
            None => panic!("location {:?} was freed", id),
        }
    }
}
