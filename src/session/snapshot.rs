use std::collections::HashSet;

use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    Green,
    Burning,
    Burnt,
}

/// One tree of the remote grid. Positions are 1-indexed `(column, row)`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Cell {
    pub id: u64,
    pub pos: (u32, u32),
    pub status: CellStatus,
}

impl Cell {
    pub fn column(&self) -> u32 {
        self.pos.0
    }
    pub fn row(&self) -> u32 {
        self.pos.1
    }
}

/// The whole grid at one simulation step, as returned by a single fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridSnapshot {
    cells: Vec<Cell>,
}

impl GridSnapshot {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn count(&self, status: CellStatus) -> usize {
        self.cells.iter().filter(|c| c.status == status).count()
    }

    pub fn burning_count(&self) -> usize {
        self.count(CellStatus::Burning)
    }

    /// Share of burnt cells in `[0, 1]`; an empty grid counts as unburnt.
    pub fn burnt_fraction(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.0;
        }
        self.count(CellStatus::Burnt) as f64 / self.cells.len() as f64
    }

    /// True when the snapshot holds exactly `width * height` cells with
    /// unique ids.
    pub fn matches_dimensions(&self, width: u32, height: u32) -> bool {
        if self.cells.len() != width as usize * height as usize {
            return false;
        }
        let mut ids = HashSet::with_capacity(self.cells.len());
        self.cells.iter().all(|c| ids.insert(c.id))
    }
}

impl From<Vec<Cell>> for GridSnapshot {
    fn from(cells: Vec<Cell>) -> Self {
        Self::new(cells)
    }
}
