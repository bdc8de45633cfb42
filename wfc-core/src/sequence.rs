/// A growable ordered container with a FIFO read cursor.
///
/// Appends are amortized O(1) and every element stays addressable by index
/// until [`clear`](Self::clear). [`pop_front`](Self::pop_front) advances a
/// cursor instead of shifting storage, which makes it a cheap breadth-first
/// work queue: drain it, clear it, reuse the allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence<T> {
    items: Vec<T>,
    head: usize,
}

impl<T> Default for Sequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sequence<T> {
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            head: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            head: 0,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Element at absolute position `index` (unaffected by the read cursor).
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Total elements appended since the last clear.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Elements not yet consumed by `pop_front`.
    pub fn pending(&self) -> usize {
        self.items.len() - self.head
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Drops every element and rewinds the cursor, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
        self.head = 0;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Copy> Sequence<T> {
    /// Next unconsumed element in append order.
    pub fn pop_front(&mut self) -> Option<T> {
        let item = *self.items.get(self.head)?;
        self.head += 1;
        Some(item)
    }
}

impl<T> FromIterator<T> for Sequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            head: 0,
        }
    }
}

impl<'a, T> IntoIterator for &'a Sequence<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
