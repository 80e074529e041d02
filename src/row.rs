//! Row views and header-name lookup.

use std::ops::Index;

use foldhash::{HashMap, HashMapExt};

use crate::cell::Cell;
use crate::error::Result;

/// Header name to column position, built from one scanned header row.
///
/// Each run that scans a header owns its own index, so readers never share
/// lookup state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    /// Build the index from header cells, using their unquoted form.
    ///
    /// When a name repeats, lookups resolve to its first column.
    pub fn from_cells(cells: &[Cell<'_>]) -> Result<Self> {
        let mut names = Vec::with_capacity(cells.len());
        let mut positions = HashMap::with_capacity(cells.len());
        for (i, cell) in cells.iter().enumerate() {
            let name = cell.unquoted_string()?;
            positions.entry(name.clone()).or_insert(i);
            names.push(name);
        }
        Ok(Self { names, positions })
    }

    /// Position of the column called `name`.
    #[inline]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Column names in header order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One row: exactly `cols` cells, plus the header index when one was scanned.
#[derive(Debug, Clone, Copy)]
pub struct Row<'r, 'a> {
    cells: &'r [Cell<'a>],
    index: Option<&'r ColumnIndex>,
}

impl<'r, 'a> Row<'r, 'a> {
    pub fn new(cells: &'r [Cell<'a>], index: Option<&'r ColumnIndex>) -> Self {
        Self { cells, index }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at `position`.
    #[inline]
    pub fn get(&self, position: usize) -> Option<Cell<'a>> {
        self.cells.get(position).copied()
    }

    /// Cell under the header column `name`.
    ///
    /// Returns `None` for unknown names and for rows scanned without a header.
    pub fn get_by_name(&self, name: &str) -> Option<Cell<'a>> {
        self.index
            .and_then(|index| index.position(name))
            .and_then(|i| self.get(i))
    }

    /// The header index this row was produced with.
    pub fn index(&self) -> Option<&'r ColumnIndex> {
        self.index
    }

    pub fn cells(&self) -> &'r [Cell<'a>] {
        self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell<'a>> + 'r {
        self.cells.iter().copied()
    }

    /// Owned unquoted strings, one per cell.
    pub fn to_strings(&self) -> Result<Vec<String>> {
        self.cells.iter().map(Cell::unquoted_string).collect()
    }
}

impl<'a> Index<usize> for Row<'_, 'a> {
    type Output = Cell<'a>;

    fn index(&self, position: usize) -> &Cell<'a> {
        &self.cells[position]
    }
}
