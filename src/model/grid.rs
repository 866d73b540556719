//! Text pictures of layouts.
//!
//! A layout is drawn as a grid of uppercase letters, one letter per cell,
//! with each window repeating its letter over every cell it covers:
//!
//! ```text
//! ┌───┬───┐
//! │ A │ B │
//! │ A │ C*│
//! └───┴───┘
//! ```
//!
//! Whitespace and box-drawing characters are ignored, and a `*` after a
//! letter marks the focused window.

use thiserror::Error;

use crate::layout_engine::{BuildError, LayoutTree};
use crate::sys::geometry::Rect;
use crate::sys::host::WindowId;

const SEPARATORS: &[char] = &[
    '│', '─', '┌', '┐', '└', '┘', '├', '┤', '┬', '┴', '┼', '|', '-', '+',
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Layout has no windows")]
    Empty,
    #[error("Line {line}: `*` must follow a window letter")]
    StrayMarker { line: usize },
    #[error("Line {line}: unexpected character {ch:?}")]
    UnexpectedChar { line: usize, ch: char },
    #[error("Line {line} has {found} cells, expected {expected}")]
    RaggedRow {
        line: usize,
        found: usize,
        expected: usize,
    },
    #[error("Both {0} and {1} are marked as focused")]
    MultipleFocus(char, char),
    #[error("Window {0} does not cover a rectangle")]
    NotRectangular(char),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Maps the letters of a picture to the windows they stand for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Names {
    names: Vec<(char, WindowId)>,
}

impl Names {
    pub fn get(&self, name: char) -> Option<WindowId> {
        self.names.iter().find(|(n, _)| *n == name).map(|(_, w)| *w)
    }

    pub fn name_of(&self, window: WindowId) -> Option<char> {
        self.names.iter().find(|(_, w)| *w == window).map(|(n, _)| *n)
    }

    /// Letters in order of first appearance.
    pub fn iter(&self) -> impl Iterator<Item = (char, WindowId)> + '_ { self.names.iter().copied() }

    pub fn len(&self) -> usize { self.names.len() }

    pub fn is_empty(&self) -> bool { self.names.is_empty() }

    fn get_or_insert(&mut self, name: char) -> WindowId {
        if let Some(window) = self.get(name) {
            return window;
        }
        let window = WindowId(self.names.len() as u32 + 1);
        self.names.push((name, window));
        window
    }
}

/// Converts between letter pictures and trees. Each cell stands for a
/// `cell_width` by `cell_height` block of the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid {
    pub cell_width: u32,
    pub cell_height: u32,
}

impl Default for Grid {
    fn default() -> Self { Grid { cell_width: 10, cell_height: 10 } }
}

#[derive(Clone, Copy)]
struct Extent {
    name: char,
    window: WindowId,
    min_col: usize,
    max_col: usize,
    min_row: usize,
    max_row: usize,
    cells: usize,
}

impl Grid {
    pub fn new(cell_width: u32, cell_height: u32) -> Self { Grid { cell_width, cell_height } }

    pub fn load(&self, text: &str) -> Result<(LayoutTree, Names), GridError> {
        let mut rows: Vec<Vec<char>> = Vec::new();
        let mut focus: Option<char> = None;
        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let mut row = Vec::new();
            let mut chars = line.chars().peekable();
            while let Some(ch) = chars.next() {
                if ch.is_ascii_uppercase() {
                    row.push(ch);
                    if chars.next_if_eq(&'*').is_some() {
                        match focus {
                            Some(prev) if prev != ch => return Err(GridError::MultipleFocus(prev, ch)),
                            _ => focus = Some(ch),
                        }
                    }
                } else if ch == '*' {
                    return Err(GridError::StrayMarker { line: line_no });
                } else if !ch.is_whitespace() && !SEPARATORS.contains(&ch) {
                    return Err(GridError::UnexpectedChar { line: line_no, ch });
                }
            }
            if row.is_empty() {
                continue;
            }
            if let Some(first) = rows.first()
                && first.len() != row.len()
            {
                return Err(GridError::RaggedRow {
                    line: line_no,
                    found: row.len(),
                    expected: first.len(),
                });
            }
            rows.push(row);
        }
        if rows.is_empty() {
            return Err(GridError::Empty);
        }

        let mut names = Names::default();
        let mut extents: Vec<Extent> = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, &name) in row.iter().enumerate() {
                let window = names.get_or_insert(name);
                match extents.iter_mut().find(|e| e.name == name) {
                    Some(e) => {
                        e.min_col = e.min_col.min(c);
                        e.max_col = e.max_col.max(c);
                        e.min_row = e.min_row.min(r);
                        e.max_row = e.max_row.max(r);
                        e.cells += 1;
                    }
                    None => extents.push(Extent {
                        name,
                        window,
                        min_col: c,
                        max_col: c,
                        min_row: r,
                        max_row: r,
                        cells: 1,
                    }),
                }
            }
        }

        let mut rects = Vec::with_capacity(extents.len());
        for e in &extents {
            let cols = e.max_col - e.min_col + 1;
            let lines = e.max_row - e.min_row + 1;
            if cols * lines != e.cells {
                return Err(GridError::NotRectangular(e.name));
            }
            rects.push((
                e.window,
                Rect::new(
                    e.min_col as u32 * self.cell_width,
                    e.min_row as u32 * self.cell_height,
                    cols as u32 * self.cell_width,
                    lines as u32 * self.cell_height,
                ),
            ));
        }

        let frame = Rect::new(
            0,
            0,
            rows[0].len() as u32 * self.cell_width,
            rows.len() as u32 * self.cell_height,
        );
        let focus = focus.and_then(|f| names.get(f)).or_else(|| names.iter().next().map(|(_, w)| w));
        let tree = LayoutTree::from_rects(frame, &rects, focus)?;
        Ok((tree, names))
    }

    /// Draws `tree` as rows of letters without separators. Cells whose window
    /// has no name are drawn as `?`.
    pub fn render(&self, tree: &LayoutTree, names: &Names) -> String {
        let frame = tree.frame();
        let layout = tree.layout();
        let cols = frame.width / self.cell_width.max(1);
        let rows = frame.height / self.cell_height.max(1);
        (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| {
                        let x = frame.x + col * self.cell_width;
                        let y = frame.y + row * self.cell_height;
                        layout
                            .iter()
                            .find(|(_, rect)| rect.contains_point(x, y))
                            .and_then(|(window, _)| names.name_of(*window))
                            .unwrap_or('?')
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A tree under test together with the names of its windows.
#[cfg(test)]
pub(crate) struct Fixture {
    pub tree: LayoutTree,
    pub names: Names,
    pub grid: Grid,
    pub policy: crate::layout_engine::Policy,
}

#[cfg(test)]
impl Fixture {
    #[track_caller]
    pub fn load(text: &str) -> Self { Self::load_with(Grid::default(), text) }

    #[track_caller]
    pub fn load_with(grid: Grid, text: &str) -> Self {
        let (tree, names) = grid.load(text).unwrap_or_else(|e| panic!("bad fixture: {e}\n{text}"));
        Fixture {
            tree,
            names,
            grid,
            policy: Default::default(),
        }
    }

    #[track_caller]
    pub fn window(&self, name: char) -> WindowId {
        self.names.get(name).unwrap_or_else(|| panic!("no window named {name}"))
    }

    #[track_caller]
    pub fn name_of(&self, window: WindowId) -> char {
        self.names.name_of(window).unwrap_or_else(|| panic!("no name for {window}"))
    }

    #[track_caller]
    pub fn focus_on(&mut self, name: char) {
        let window = self.window(name);
        assert!(self.tree.set_focus(window), "{name} is not in the layout");
    }

    pub fn focus_name(&self) -> char { self.name_of(self.tree.focus()) }

    pub fn render(&self) -> String { self.grid.render(&self.tree, &self.names) }

    pub fn swallow(
        &mut self,
        direction: crate::layout_engine::Direction,
    ) -> Result<crate::layout_engine::SwallowOutcome, crate::layout_engine::SwallowError> {
        crate::layout_engine::swallow(&mut self.tree, direction, self.policy)
    }

    pub fn swallow_aggressive(
        &mut self,
        direction: crate::layout_engine::Direction,
    ) -> Result<crate::layout_engine::SwallowOutcome, crate::layout_engine::SwallowError> {
        let policy = crate::layout_engine::Policy { aggressive: true, ..self.policy };
        crate::layout_engine::swallow(&mut self.tree, direction, policy)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn loads_box_drawn_pictures() {
        let (tree, names) = Grid::default()
            .load(
                "
                ┌───┬───┐
                │ A │ B │
                ├   ┼───┤
                │ A │ C*│
                └───┴───┘
                ",
            )
            .unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(tree.focus(), names.get('C').unwrap());
        assert_eq!(tree.window_rect(names.get('A').unwrap()), Some(Rect::new(0, 0, 10, 20)));
        assert_eq!(tree.frame(), Rect::new(0, 0, 20, 20));
    }

    #[test]
    fn ids_follow_reading_order() {
        let (tree, names) = Grid::default().load("B A\nC C").unwrap();
        assert_eq!(names.get('B'), Some(WindowId(1)));
        assert_eq!(names.get('A'), Some(WindowId(2)));
        assert_eq!(names.get('C'), Some(WindowId(3)));
        // Without a marker the top-left window has the focus.
        assert_eq!(tree.focus(), WindowId(1));
    }

    #[test]
    fn cell_size_scales_rectangles() {
        let (tree, names) = Grid::new(3, 2).load("A B B").unwrap();
        assert_eq!(tree.window_rect(names.get('B').unwrap()), Some(Rect::new(3, 0, 6, 2)));
    }

    #[test]
    fn renders_what_it_loads() {
        let grid = Grid::default();
        let text = "ABB\nACD\nECD";
        let (tree, names) = grid.load(text).unwrap();
        assert_eq!(grid.render(&tree, &names), text);
    }

    #[test]
    fn rejects_malformed_pictures() {
        let grid = Grid::default();
        assert_eq!(grid.load("  \n ").unwrap_err(), GridError::Empty);
        assert_eq!(grid.load("A B\nA").unwrap_err(), GridError::RaggedRow {
            line: 2,
            found: 1,
            expected: 2
        });
        assert_eq!(grid.load("A *B").unwrap_err(), GridError::StrayMarker { line: 1 });
        assert_eq!(grid.load("A* B*").unwrap_err(), GridError::MultipleFocus('A', 'B'));
        assert_eq!(grid.load("A b").unwrap_err(), GridError::UnexpectedChar { line: 1, ch: 'b' });
        assert_eq!(grid.load("A B A").unwrap_err(), GridError::NotRectangular('A'));
        assert!(matches!(
            grid.load("AAB\nDEB\nDCC").unwrap_err(),
            GridError::Build(BuildError::NotGuillotine(_))
        ));
    }
}
