use std::slice;

/// Items attached to a location (labels, debug items)
///
/// Most locations carry nothing, so the list is only allocated on the first push.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedItems<T>(Option<Vec<T>>);

impl<T> LocatedItems<T> {
    pub fn new() -> LocatedItems<T> {
        LocatedItems(None)
    }

    pub fn push(&mut self, item: T) {
        self.0.get_or_insert_with(Vec::new).push(item);
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.0.as_deref().unwrap_or(&[]).iter()
    }

    /// Keep only the items matching a predicate
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        if let Some(items) = &mut self.0 {
            items.retain(keep);
            if items.is_empty() {
                self.0 = None;
            }
        }
    }

    /// Detach every item
    pub fn take(&mut self) -> Vec<T> {
        self.0.take().unwrap_or_default()
    }

    /// Move all items onto `next`, ahead of the items it already has
    pub fn merge_into(&mut self, next: &mut LocatedItems<T>) {
        if let Some(mut items) = self.0.take() {
            if let Some(next_items) = next.0.take() {
                items.extend(next_items);
            }
            next.0 = Some(items);
        }
    }
}

impl<T> Default for LocatedItems<T> {
    fn default() -> Self {
        LocatedItems::new()
    }
}

impl<'a, T> IntoIterator for &'a LocatedItems<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.iter()
    }
}
