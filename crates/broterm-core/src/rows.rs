//! Screen-local lookup from table row to item.
//!
//! Owned by one screen activation: rebuilt on every populate and cleared on
//! hide, so a selection never resolves to an item from an earlier visit.

use std::collections::BTreeMap;

/// Row 0 is the header; items start at row 1.
pub const FIRST_ROW: usize = 1;

#[derive(Debug, Clone)]
pub struct RowIndex<T> {
    rows: BTreeMap<usize, T>,
    capacity: usize,
}

impl<T> Default for RowIndex<T> {
    fn default() -> Self {
        Self::new(usize::from(u8::MAX))
    }
}

impl<T> RowIndex<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: BTreeMap::new(),
            capacity,
        }
    }

    /// Replaces the contents with `items`, numbered from [`FIRST_ROW`].
    ///
    /// Items past the capacity are not indexed. Returns how many were kept.
    pub fn rebuild(&mut self, items: impl IntoIterator<Item = T>) -> usize {
        self.rows.clear();
        for (offset, item) in items.into_iter().take(self.capacity).enumerate() {
            self.rows.insert(FIRST_ROW + offset, item);
        }
        self.rows.len()
    }

    pub fn get(&self, row: usize) -> Option<&T> {
        self.rows.get(&row)
    }

    /// Drops one row and renumbers the rows below it.
    pub fn remove(&mut self, row: usize) -> Option<T> {
        let removed = self.rows.remove(&row)?;
        let tail: Vec<_> = self.rows.split_off(&row).into_values().collect();
        for (offset, item) in tail.into_iter().enumerate() {
            self.rows.insert(row + offset, item);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.rows.iter().map(|(row, item)| (*row, item))
    }

    /// Next selectable row after `row`, wrapping to the first.
    pub fn next_row(&self, row: Option<usize>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        Some(match row {
            Some(r) if r + 1 < FIRST_ROW + self.len() => r + 1,
            _ => FIRST_ROW,
        })
    }

    /// Previous selectable row before `row`, wrapping to the last.
    pub fn prev_row(&self, row: Option<usize>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let last = FIRST_ROW + self.len() - 1;
        Some(match row {
            Some(r) if r > FIRST_ROW && r <= last => r - 1,
            _ => last,
        })
    }
}
