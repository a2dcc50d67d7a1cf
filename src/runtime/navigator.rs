//! Grid navigator: directional and reading-order focus over a ragged grid of
//! named nodes.

use std::collections::HashMap;

use crate::core::error::{EngineError, EngineResult};

/// Location reported for grids without any node.
pub const EMPTY_LOCATION: &str = "";

/// Where focus starts on a freshly built grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartNode {
    Name(String),
    Iteration(usize),
}

impl From<&str> for StartNode {
    fn from(value: &str) -> Self {
        StartNode::Name(value.to_string())
    }
}

impl From<usize> for StartNode {
    fn from(value: usize) -> Self {
        StartNode::Iteration(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

type Coord = (usize, usize);

/// Immutable grid layout plus its derived indexes. `rows` keeps every row and
/// cell at its declared position, gaps included; `order` lists only named
/// cells.
#[derive(Debug, Clone, Default)]
struct GridLayout {
    rows: Vec<Vec<String>>,
    order: Vec<Coord>,
    iterations: HashMap<String, usize>,
}

impl GridLayout {
    fn build<G, R, S>(grid: G) -> EngineResult<Self>
    where
        G: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows: Vec<Vec<String>> = grid
            .into_iter()
            .map(|row| row.into_iter().map(|name| -> String { name.into() }).collect())
            .collect();

        let mut order = Vec::new();
        let mut iterations = HashMap::new();
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, name) in row.iter().enumerate() {
                if name.is_empty() {
                    continue;
                }
                if iterations.insert(name.clone(), order.len()).is_some() {
                    return Err(EngineError::DuplicateNode(name.clone()));
                }
                order.push((row_idx, col_idx));
            }
        }

        Ok(Self {
            rows,
            order,
            iterations,
        })
    }

    fn name_at(&self, (row, col): Coord) -> Option<&str> {
        self.rows
            .get(row)?
            .get(col)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Index of the last named cell in `row`.
    fn last_named_col(&self, row: usize) -> Option<usize> {
        self.rows.get(row)?.iter().rposition(|name| !name.is_empty())
    }

    fn resolve_start(&self, start: Option<&StartNode>) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        let iteration = match start {
            Some(StartNode::Name(name)) => self.iterations.get(name).copied(),
            Some(StartNode::Iteration(n)) if *n < self.order.len() => Some(*n),
            _ => None,
        };
        Some(iteration.unwrap_or(0))
    }
}

/// Focus cursor over a [`GridLayout`].
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    layout: GridLayout,
    current: Option<Coord>,
}

impl Navigator {
    /// Build a navigator from rows of node names. Empty names and empty rows
    /// are gaps: they keep their position in the grid but hold no node.
    /// Duplicate names are rejected.
    pub fn new<G, R, S>(grid: G, start: Option<StartNode>) -> EngineResult<Self>
    where
        G: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let layout = GridLayout::build(grid)?;
        let current = layout
            .resolve_start(start.as_ref())
            .map(|iteration| layout.order[iteration]);
        Ok(Self { layout, current })
    }

    /// Replace the layout, keeping the reading-order position when it still
    /// exists and clamping to the last node otherwise.
    pub fn rebuild<G, R, S>(&mut self, grid: G) -> EngineResult<&str>
    where
        G: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let layout = GridLayout::build(grid)?;
        let position = self.iteration();
        self.current = match layout.order.len() {
            0 => None,
            size => Some(layout.order[position.min(size - 1)]),
        };
        self.layout = layout;
        self.validated()
    }

    pub fn location(&self) -> &str {
        self.current
            .and_then(|coord| self.layout.name_at(coord))
            .unwrap_or(EMPTY_LOCATION)
    }

    pub fn iteration(&self) -> usize {
        self.current
            .and_then(|coord| self.layout.order.iter().position(|c| *c == coord))
            .unwrap_or(0)
    }

    pub fn size(&self) -> usize {
        self.layout.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.order.is_empty()
    }

    pub fn is_focused(&self, name: &str) -> bool {
        self.current.is_some() && self.location() == name
    }

    pub fn coordinate_of(&self, name: &str) -> Option<(usize, usize)> {
        let iteration = *self.layout.iterations.get(name)?;
        self.layout.order.get(iteration).copied()
    }

    pub fn iteration_of(&self, name: &str) -> Option<usize> {
        self.layout.iterations.get(name).copied()
    }

    /// Node following `name` in reading order, wrapping at the end.
    pub fn next_of(&self, name: &str) -> Option<&str> {
        let iteration = self.iteration_of(name)?;
        let next = (iteration + 1) % self.size();
        self.layout.name_at(self.layout.order[next])
    }

    /// Node preceding `name` in reading order, wrapping at the start.
    pub fn prev_of(&self, name: &str) -> Option<&str> {
        let iteration = self.iteration_of(name)?;
        let prev = (iteration + self.size() - 1) % self.size();
        self.layout.name_at(self.layout.order[prev])
    }

    /// Node names in reading order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.layout
            .order
            .iter()
            .filter_map(|coord| self.layout.name_at(*coord))
    }

    pub fn up(&mut self) -> EngineResult<&str> {
        self.step(Direction::Up)
    }

    pub fn down(&mut self) -> EngineResult<&str> {
        self.step(Direction::Down)
    }

    pub fn left(&mut self) -> EngineResult<&str> {
        self.step(Direction::Left)
    }

    pub fn right(&mut self) -> EngineResult<&str> {
        self.step(Direction::Right)
    }

    /// Move one cell in `direction`. A shorter destination row clamps the
    /// column to its last named cell; a missing row, an empty row or a gap
    /// leaves focus where it is.
    pub fn step(&mut self, direction: Direction) -> EngineResult<&str> {
        let Some((row, col)) = self.current else {
            return Ok(EMPTY_LOCATION);
        };
        let (d_row, d_col) = direction.delta();
        let target = row.checked_add_signed(d_row).zip(col.checked_add_signed(d_col));

        if let Some((target_row, target_col)) = target {
            if let Some(last) = self.layout.last_named_col(target_row) {
                let coord = (target_row, target_col.min(last));
                if self.layout.name_at(coord).is_some() {
                    self.current = Some(coord);
                }
            }
        }
        self.validated()
    }

    pub fn next(&mut self) -> EngineResult<&str> {
        if self.is_empty() {
            return Ok(EMPTY_LOCATION);
        }
        let next = (self.iteration() + 1) % self.size();
        self.current = Some(self.layout.order[next]);
        self.validated()
    }

    pub fn prev(&mut self) -> EngineResult<&str> {
        if self.is_empty() {
            return Ok(EMPTY_LOCATION);
        }
        let prev = (self.iteration() + self.size() - 1) % self.size();
        self.current = Some(self.layout.order[prev]);
        self.validated()
    }

    /// Jump to the `n`th node in reading order; out-of-range `n` is a no-op.
    pub fn move_to_iteration(&mut self, n: usize) -> EngineResult<&str> {
        if let Some(coord) = self.layout.order.get(n) {
            self.current = Some(*coord);
        }
        self.validated()
    }

    /// Jump to a node by name; unknown names are a no-op.
    pub fn move_to(&mut self, name: &str) -> EngineResult<&str> {
        if let Some(coord) = self.coordinate_of(name) {
            self.current = Some(coord);
        }
        self.validated()
    }

    fn validated(&self) -> EngineResult<&str> {
        match self.current {
            None if self.is_empty() => Ok(EMPTY_LOCATION),
            None => Err(EngineError::invariant(
                "navigator",
                "non-empty grid without focus",
            )),
            Some(coord) => self.layout.name_at(coord).ok_or_else(|| {
                EngineError::invariant(
                    "navigator",
                    format!("focus {coord:?} outside grid"),
                )
            }),
        }
    }
}
