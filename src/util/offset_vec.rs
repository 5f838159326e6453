use std::fmt::{Debug, Formatter};
use std::iter::{Enumerate, FromIterator};
use std::slice::Iter;

/// Elements with a width measured in code units (eg. when used in an `OffsetVec`)
pub trait Width {
    fn width(&self) -> usize;
}

/// A vector of elements of different widths, where the offset of an element is the sum of the
/// widths of all the elements before it.
///
/// This is how a method's code array is laid out: an instruction's address is the number of code
/// units occupied by the instructions preceding it, not its position in the list.
#[derive(Clone)]
pub struct OffsetVec<T> {
    /// Entries, along with their offset
    entries: Vec<(Offset, T)>,

    /// Offset of the next element to be added
    offset_len: Offset,
}

/// Offset into an `OffsetVec`
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Offset(pub usize);

/// Outcome of looking up an element by offset
#[derive(Debug, PartialEq, Eq)]
pub enum OffsetResult<'a, T> {
    /// Element starting exactly at the offset (and its index)
    Ok(usize, &'a T),

    /// Offset falls strictly inside the element at this index
    InsideElement(usize),

    /// Offset is at or past the end of the vector
    TooLarge,
}

impl<T: Width> OffsetVec<T> {
    pub fn new() -> OffsetVec<T> {
        OffsetVec {
            entries: vec![],
            offset_len: Offset(0),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offset of the next element to be added (aka. total width of the vector)
    pub fn offset_len(&self) -> Offset {
        self.offset_len
    }

    /// Add an entry to the back, returning its offset
    pub fn push(&mut self, elem: T) -> Offset {
        let offset = self.offset_len;
        self.offset_len.0 += elem.width();
        self.entries.push((offset, elem));
        offset
    }

    /// Get an entry (and its index) by its offset
    ///
    /// Note: this uses binary search to find the offset
    pub fn get_offset(&self, offset: Offset) -> OffsetResult<'_, T> {
        match self.entries.binary_search_by_key(&offset, |(off, _)| *off) {
            Ok(found_idx) => OffsetResult::Ok(found_idx, &self.entries[found_idx].1),
            Err(_) if offset >= self.offset_len => OffsetResult::TooLarge,
            Err(insert_at) => OffsetResult::InsideElement(insert_at - 1),
        }
    }

    /// Get an entry (and its offset) by its position
    pub fn get_index(&self, index: usize) -> Option<(Offset, &T)> {
        self.entries.get(index).map(|(offset, elem)| (*offset, elem))
    }

    pub fn iter(&self) -> OffsetVecIter<'_, T> {
        OffsetVecIter(self.entries.iter().enumerate())
    }
}

impl<T: Width> Default for OffsetVec<T> {
    fn default() -> Self {
        OffsetVec::new()
    }
}

impl<T: PartialEq> PartialEq for OffsetVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: Eq> Eq for OffsetVec<T> {}

/// Iterator for borrowed `OffsetVec`, yielding `(offset, index, element)`
pub struct OffsetVecIter<'a, T>(Enumerate<Iter<'a, (Offset, T)>>);

impl<'a, T> Iterator for OffsetVecIter<'a, T> {
    type Item = (Offset, usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(idx, (off, elem))| (*off, idx, elem))
    }
}

impl<'a, T> DoubleEndedIterator for OffsetVecIter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0
            .next_back()
            .map(|(idx, (off, elem))| (*off, idx, elem))
    }
}

impl<'a, T: Width> IntoIterator for &'a OffsetVec<T> {
    type Item = (Offset, usize, &'a T);
    type IntoIter = OffsetVecIter<'a, T>;

    fn into_iter(self) -> OffsetVecIter<'a, T> {
        self.iter()
    }
}

impl<T: Width> FromIterator<T> for OffsetVec<T> {
    fn from_iter<A: IntoIterator<Item = T>>(elems: A) -> Self {
        let mut offset_vec = OffsetVec::new();
        for elem in elems {
            offset_vec.push(elem);
        }
        offset_vec
    }
}

impl<T: Debug> Debug for OffsetVec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for (off, elem) in &self.entries {
            list.entry(&format_args!("{:#06x}: {:?}", off.0, elem));
        }
        list.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    enum Unit {
        Short(u8),
        Wide(u8),
        Long(u8),
    }

    impl Width for Unit {
        fn width(&self) -> usize {
            match self {
                Unit::Short(_) => 1,
                Unit::Wide(_) => 2,
                Unit::Long(_) => 3,
            }
        }
    }

    #[test]
    fn offsets_accumulate_widths() {
        let units: OffsetVec<Unit> = vec![Unit::Short(1), Unit::Long(2), Unit::Wide(3)]
            .into_iter()
            .collect();
        assert_eq!(
            units.iter().collect::<Vec<_>>(),
            vec![
                (Offset(0), 0, &Unit::Short(1)),
                (Offset(1), 1, &Unit::Long(2)),
                (Offset(4), 2, &Unit::Wide(3)),
            ]
        );
        assert_eq!(units.offset_len(), Offset(6));
        assert_eq!(units.len(), 3);
    }

    #[test]
    fn lookup_by_offset() {
        let units: OffsetVec<Unit> = vec![Unit::Short(1), Unit::Long(2), Unit::Wide(3)]
            .into_iter()
            .collect();
        assert_eq!(units.get_offset(Offset(0)), OffsetResult::Ok(0, &Unit::Short(1)));
        assert_eq!(units.get_offset(Offset(1)), OffsetResult::Ok(1, &Unit::Long(2)));
        assert_eq!(units.get_offset(Offset(2)), OffsetResult::InsideElement(1));
        assert_eq!(units.get_offset(Offset(3)), OffsetResult::InsideElement(1));
        assert_eq!(units.get_offset(Offset(4)), OffsetResult::Ok(2, &Unit::Wide(3)));
        assert_eq!(units.get_offset(Offset(5)), OffsetResult::InsideElement(2));
        assert_eq!(units.get_offset(Offset(6)), OffsetResult::TooLarge);
        assert_eq!(units.get_offset(Offset(60)), OffsetResult::TooLarge);
    }

    #[test]
    fn empty_vector() {
        let units: OffsetVec<Unit> = OffsetVec::new();
        assert!(units.is_empty());
        assert_eq!(units.get_offset(Offset(0)), OffsetResult::TooLarge);
        assert_eq!(units.get_index(0), None);
    }
}
