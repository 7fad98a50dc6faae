//! # Spatial index
//!
//! A uniform grid over the canvas. Each entry is listed in every cell its rectangle touches, except for
//! very large (or non-finite) entries which live in a separate list checked by every query - a handful of
//! huge backgrounds would otherwise bloat thousands of cells.

use crate::{component::ComponentID, util::Rect};
use az::CheckedAs;

/// Entries spanning more cells than this go in the oversized list.
const MAX_CELLS_PER_ENTRY: i64 = 64;
/// Queries spanning more cells than this scan every entry instead.
const MAX_CELLS_PER_QUERY: i64 = 4096;

/// Inclusive range of cell coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct CellRange {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}
impl CellRange {
    fn count(&self) -> i64 {
        (i64::from(self.x1) - i64::from(self.x0) + 1) * (i64::from(self.y1) - i64::from(self.y0) + 1)
    }
    fn iter(self) -> impl Iterator<Item = (i32, i32)> {
        (self.y0..=self.y1).flat_map(move |y| (self.x0..=self.x1).map(move |x| (x, y)))
    }
}

#[derive(Copy, Clone, Debug)]
enum Placement {
    Cells(CellRange),
    Oversized,
}
#[derive(Copy, Clone, Debug)]
struct Entry {
    rect: Rect,
    placement: Placement,
}

#[derive(Clone, Debug)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: hashbrown::HashMap<(i32, i32), smallvec::SmallVec<[ComponentID; 4]>>,
    entries: hashbrown::HashMap<ComponentID, Entry>,
    oversized: hashbrown::HashSet<ComponentID>,
}
impl SpatialIndex {
    /// Create an empty index. Non-positive or non-finite cell sizes are replaced with a default.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("invalid spatial cell size {cell_size}, using default");
            crate::config::DEFAULT_SPATIAL_CELL_SIZE
        };
        Self {
            cell_size,
            cells: hashbrown::HashMap::new(),
            entries: hashbrown::HashMap::new(),
            oversized: hashbrown::HashSet::new(),
        }
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    #[must_use]
    pub fn contains(&self, id: ComponentID) -> bool {
        self.entries.contains_key(&id)
    }
    /// Cells covered by the rect, or None if it can't be expressed as a cell range.
    fn cell_range(&self, rect: &Rect) -> Option<CellRange> {
        let cell = |v: f32| -> Option<i32> { (v / self.cell_size).floor().checked_as::<i32>() };
        Some(CellRange {
            x0: cell(rect.x)?,
            y0: cell(rect.y)?,
            x1: cell(rect.right())?,
            y1: cell(rect.bottom())?,
        })
    }
    /// Add or replace an entry.
    pub fn insert(&mut self, id: ComponentID, rect: Rect) {
        self.remove(id);
        let placement = match self.cell_range(&rect) {
            Some(range) if range.count() <= MAX_CELLS_PER_ENTRY => {
                for cell in range.iter() {
                    self.cells.entry(cell).or_default().push(id);
                }
                Placement::Cells(range)
            }
            _ => {
                self.oversized.insert(id);
                Placement::Oversized
            }
        };
        self.entries.insert(id, Entry { rect, placement });
    }
    /// Remove an entry, returning whether it was present.
    pub fn remove(&mut self, id: ComponentID) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        match entry.placement {
            Placement::Cells(range) => {
                for cell in range.iter() {
                    if let hashbrown::hash_map::Entry::Occupied(mut occupied) = self.cells.entry(cell) {
                        occupied.get_mut().retain(|other| *other != id);
                        if occupied.get().is_empty() {
                            occupied.remove();
                        }
                    }
                }
            }
            Placement::Oversized => {
                self.oversized.remove(&id);
            }
        }
        true
    }
    /// Every entry whose rect intersects `rect`, each exactly once, in no particular order.
    #[must_use]
    pub fn query(&self, rect: &Rect) -> Vec<ComponentID> {
        let touches = |id: &ComponentID| {
            self.entries
                .get(id)
                .is_some_and(|entry| entry.rect.intersects(rect))
        };
        let range = self
            .cell_range(rect)
            .filter(|range| range.count() <= MAX_CELLS_PER_QUERY);
        let Some(range) = range else {
            // Huge query, cheaper to check everything.
            return self
                .entries
                .iter()
                .filter(|(_, entry)| entry.rect.intersects(rect))
                .map(|(id, _)| *id)
                .collect();
        };
        let mut found = hashbrown::HashSet::new();
        for cell in range.iter() {
            if let Some(ids) = self.cells.get(&cell) {
                found.extend(ids.iter().copied().filter(touches));
            }
        }
        found.extend(self.oversized.iter().copied().filter(touches));
        found.into_iter().collect()
    }
}
