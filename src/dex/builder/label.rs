use std::fmt;

/// Symbolic position in a [`MutableMethodImplementation`](super::MutableMethodImplementation)
///
/// A label is a handle into the method's label table. It keeps denoting the same instruction
/// across unrelated edits; removing the instruction moves the label onto the next one. Labels
/// remember which method issued them, so handing one to a different method is an error.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    pub(crate) method: usize,
    pub(crate) index: usize,
}

impl fmt::Debug for Label {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("l{}", self.index))
    }
}
