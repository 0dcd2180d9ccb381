// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellCoord {
    pub col: usize,
    pub row: usize,
}

impl CellCoord {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// Where an interaction landed. The sticky title column never takes part in
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellTarget {
    Display { row: usize },
    Data(CellCoord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickModifier {
    Plain,
    Extend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Empty,
    SingleColumn(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Reset,
    Added,
    Removed,
    Collapsed,
    Cleared,
    Unchanged,
}

/// Multi-cell selection. Every non-empty selection lies in exactly one
/// column; insertion order is kept so the first pick seeds bulk edits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    cells: Vec<CellCoord>,
}

impl Selection {
    pub fn mode(&self) -> SelectionMode {
        match self.cells.first() {
            None => SelectionMode::Empty,
            Some(first) => SelectionMode::SingleColumn(first.col),
        }
    }

    pub fn click(&mut self, coord: CellCoord, modifier: ClickModifier) -> SelectionChange {
        match (modifier, self.mode()) {
            (ClickModifier::Plain, _) => {
                self.cells = vec![coord];
                SelectionChange::Reset
            }
            (ClickModifier::Extend, SelectionMode::Empty) => {
                self.cells.push(coord);
                SelectionChange::Added
            }
            (ClickModifier::Extend, SelectionMode::SingleColumn(col)) if col != coord.col => {
                self.cells = vec![coord];
                SelectionChange::Collapsed
            }
            (ClickModifier::Extend, SelectionMode::SingleColumn(_)) => {
                if let Some(position) = self.cells.iter().position(|cell| *cell == coord) {
                    self.cells.remove(position);
                    SelectionChange::Removed
                } else {
                    self.cells.push(coord);
                    SelectionChange::Added
                }
            }
        }
    }

    pub fn clear(&mut self) -> SelectionChange {
        if self.cells.is_empty() {
            return SelectionChange::Unchanged;
        }
        self.cells.clear();
        SelectionChange::Cleared
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        self.cells.contains(&coord)
    }

    pub fn first(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }

    pub fn column(&self) -> Option<usize> {
        match self.mode() {
            SelectionMode::Empty => None,
            SelectionMode::SingleColumn(col) => Some(col),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().copied()
    }
}
