// PSPP - a program for statistical analysis.
// Copyright (C) 2025 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! Tables.
//!
//! A table is a rectangular grid of cells.  Cells can be joined to form larger
//! cells.  Rows and columns can be separated by rules of various types.  Rows
//! at the top and bottom of a table and columns at the left and right edges of
//! a table can be designated as headers, which means that if the table must be
//! broken across more than one page, those rows or columns are repeated on each
//! page.
//!
//! Tables are shared as `Arc<Table>` once built.  [Table::make_mut] gives
//! copy-on-write access: it clones the table only if someone else still holds
//! a reference to it.

use std::{ops::Range, sync::Arc};

use enum_map::{EnumMap, enum_map};
use ndarray::{Array, Array2};

use crate::{
    geometry::{Axis2, Coord2, Rect2},
    look::{Area, AreaStyle, BorderStyle, HeadingRegion, HorzAlign},
    value::{DisplayValue, Value, ValueOptions},
};

#[derive(Clone, Debug)]
pub struct CellRef<'a> {
    pub coord: Coord2,
    pub content: &'a Content,
}

impl CellRef<'_> {
    pub fn inner(&self) -> &CellInner {
        self.content.inner()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn rect(&self) -> Rect2 {
        self.content.rect(self.coord)
    }

    pub fn is_top_left(&self) -> bool {
        self.content.is_top_left(self.coord)
    }

    pub fn span(&self, axis: Axis2) -> usize {
        self.content.span(axis)
    }
}

/// What is stored at a single grid position.
#[derive(Clone, Debug)]
pub enum Content {
    /// A cell that occupies just this position.
    Value(CellInner),

    /// Part of a cell that spans more than one position.  Every position in
    /// the span refers to the same [Cell].
    Join(Arc<Cell>),
}

impl Content {
    pub fn inner(&self) -> &CellInner {
        match self {
            Content::Value(cell_inner) => cell_inner,
            Content::Join(cell) => &cell.inner,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner().is_empty()
    }

    /// Returns the rectangle that this cell covers, given that `coord` is one
    /// of the positions it covers.
    pub fn rect(&self, coord: Coord2) -> Rect2 {
        match self {
            Content::Join(cell) => cell.region.clone(),
            Content::Value(_) => Rect2::for_cell(coord),
        }
    }

    pub fn is_top_left(&self, coord: Coord2) -> bool {
        match self {
            Content::Join(cell) => cell.region.top_left() == coord,
            Content::Value(_) => true,
        }
    }

    pub fn span(&self, axis: Axis2) -> usize {
        match self {
            Content::Join(cell) => cell.region.len(axis),
            Content::Value(_) => 1,
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::Value(CellInner::default())
    }
}

/// A cell that spans more than one grid position.
#[derive(Clone, Debug)]
pub struct Cell {
    inner: CellInner,

    /// Occupied table region.
    region: Rect2,
}

impl Cell {
    pub fn region(&self) -> &Rect2 {
        &self.region
    }
}

#[derive(Clone, Debug, Default)]
pub struct CellInner {
    /// Rotate cell contents 90 degrees?
    pub rotate: bool,

    /// The area that the cell belongs to.
    pub area: Area,

    pub value: Box<Value>,
}

impl CellInner {
    pub fn new(area: Area, value: impl Into<Value>) -> Self {
        Self {
            rotate: false,
            area,
            value: Box::new(value.into()),
        }
    }

    pub fn with_rotate(self, rotate: bool) -> Self {
        Self { rotate, ..self }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// A table.
#[derive(Clone, derive_more::Debug)]
pub struct Table {
    /// Number of columns and rows.
    pub n: Coord2,

    /// Number of header columns (`h[Axis2::X]`) and rows (`h[Axis2::Y]`).
    /// Index 0 counts the headers at the left or top, index 1 those at the
    /// right or bottom.
    pub h: EnumMap<Axis2, [usize; 2]>,

    pub contents: Array2<Content>,

    /// Styles for areas of the table.
    #[debug(skip)]
    pub areas: EnumMap<Area, AreaStyle>,

    /// Vertical rules (`rules[Axis2::X]`, indexed by `[x, y]` with
    /// `0..=n.x()` by `0..n.y()`) and horizontal rules (`rules[Axis2::Y]`,
    /// `0..n.x()` by `0..=n.y()`).
    #[debug(skip)]
    pub rules: EnumMap<Axis2, Array2<BorderStyle>>,

    /// How to present values.
    #[debug(skip)]
    pub value_options: ValueOptions,
}

impl Table {
    pub fn new(
        n: Coord2,
        headers: EnumMap<Axis2, [usize; 2]>,
        areas: EnumMap<Area, AreaStyle>,
        value_options: ValueOptions,
    ) -> Self {
        for axis in [Axis2::X, Axis2::Y] {
            let [h0, h1] = headers[axis];
            assert!(
                h0 + h1 <= n[axis],
                "{h0}+{h1} headers along {axis:?} exceed table size {}",
                n[axis]
            );
        }
        Self {
            n,
            h: headers,
            contents: Array::default((n.x(), n.y())),
            areas,
            rules: enum_map! {
                Axis2::X => Array::from_elem((n.x() + 1, n.y()), BorderStyle::none()),
                Axis2::Y => Array::from_elem((n.x(), n.y() + 1), BorderStyle::none()),
            },
            value_options,
        }
    }

    /// Returns mutable access to `table`, cloning it first if it is shared.
    pub fn make_mut(table: &mut Arc<Table>) -> &mut Table {
        if Arc::strong_count(table) > 1 {
            log::trace!("cloning shared {:?} table before modification", table.n);
        }
        Arc::make_mut(table)
    }

    /// Returns the range of body (non-header) columns or rows along `axis`.
    pub fn body(&self, axis: Axis2) -> Range<usize> {
        self.h[axis][0]..self.n[axis] - self.h[axis][1]
    }

    pub fn get(&self, coord: Coord2) -> CellRef<'_> {
        assert!(
            coord.x() < self.n.x() && coord.y() < self.n.y(),
            "cell ({}, {}) is outside {}×{} table",
            coord.x(),
            coord.y(),
            self.n.x(),
            self.n.y()
        );
        CellRef {
            coord,
            content: &self.contents[[coord.x(), coord.y()]],
        }
    }

    /// Returns the style of the rule along `axis` at `pos`.  `pos[axis]` is a
    /// rule index in `0..=n[axis]` and `pos[!axis]` a cell index.
    pub fn get_rule(&self, axis: Axis2, pos: Coord2) -> BorderStyle {
        let rules = &self.rules[axis];
        let (nx, ny) = rules.dim();
        assert!(
            pos.x() < nx && pos.y() < ny,
            "rule ({}, {}) along {axis:?} is outside {}×{} table",
            pos.x(),
            pos.y(),
            self.n.x(),
            self.n.y()
        );
        rules[[pos.x(), pos.y()]]
    }

    /// Puts `inner` into `region`, joining the positions in `region` into a
    /// single cell if it covers more than one.
    pub fn put(&mut self, region: Rect2, inner: CellInner) {
        use Axis2::*;
        assert!(
            !region.is_empty() && region[X].end <= self.n.x() && region[Y].end <= self.n.y(),
            "region {region:?} does not fit in {}×{} table",
            self.n.x(),
            self.n.y()
        );
        if region[X].len() == 1 && region[Y].len() == 1 {
            self.contents[[region[X].start, region[Y].start]] = Content::Value(inner);
        } else {
            let cell = Arc::new(Cell {
                inner,
                region: region.clone(),
            });
            for y in region[Y].clone() {
                for x in region[X].clone() {
                    self.contents[[x, y]] = Content::Join(cell.clone())
                }
            }
        }
    }

    /// Draws a horizontal rule at `y` across columns `x`.
    pub fn h_line(&mut self, style: BorderStyle, x: Range<usize>, y: usize) {
        for x in x {
            self.rules[Axis2::Y][[x, y]] = style;
        }
    }

    /// Draws a vertical rule at `x` across rows `y`.
    pub fn v_line(&mut self, style: BorderStyle, x: usize, y: Range<usize>) {
        for y in y {
            self.rules[Axis2::X][[x, y]] = style;
        }
    }

    /// Draws a rule that separates positions along axis `a` at `a_value`,
    /// extending across `b_range` on the other axis.
    pub fn draw_line(
        &mut self,
        style: BorderStyle,
        (a, a_value): (Axis2, usize),
        b_range: Range<usize>,
    ) {
        match a {
            Axis2::X => self.v_line(style, a_value, b_range),
            Axis2::Y => self.h_line(style, b_range, a_value),
        }
    }

    /// Draws `style` on every rule, inside and around the table.
    pub fn draw_grid(&mut self, style: BorderStyle) {
        for axis in [Axis2::X, Axis2::Y] {
            self.rules[axis].fill(style);
        }
    }

    /// Replaces every rule that has no stroke by `style`.
    pub fn fill_missing_rules(&mut self, style: BorderStyle) {
        for axis in [Axis2::X, Axis2::Y] {
            self.rules[axis].map_inplace(|rule| {
                if rule.is_none() {
                    *rule = style;
                }
            });
        }
    }

    /// The heading region that `pos` is part of, if any.
    pub fn heading_region(&self, pos: Coord2) -> Option<HeadingRegion> {
        if !self.body(Axis2::X).contains(&pos.x()) {
            Some(HeadingRegion::Rows)
        } else if !self.body(Axis2::Y).contains(&pos.y()) {
            Some(HeadingRegion::Columns)
        } else {
            None
        }
    }

    /// Iterates across all of the cells in the table, visiting each of them
    /// once in top-down, left-to-right order. Spanned cells are visited once,
    /// at the point in the iteration where their top-left cell would appear if
    /// they were not spanned.
    pub fn cells(&self) -> impl Iterator<Item = CellRef<'_>> {
        (0..self.n.y())
            .flat_map(move |y| (0..self.n.x()).map(move |x| Coord2::new(x, y)))
            .map(move |coord| self.get(coord))
            .filter(|cell| cell.is_top_left())
    }

    pub fn is_empty(&self) -> bool {
        self.n[Axis2::X] == 0 || self.n[Axis2::Y] == 0
    }
}

/// A read-only view of a cell, as handed to a device for measuring and
/// drawing.
pub struct DrawCell<'a> {
    pub rotate: bool,
    pub value: &'a Value,
    pub style: &'a AreaStyle,
    pub value_options: ValueOptions,
}

impl<'a> DrawCell<'a> {
    pub fn new(inner: &'a CellInner, table: &'a Table) -> Self {
        Self {
            rotate: inner.rotate,
            value: &inner.value,
            style: inner.value.style().unwrap_or(&table.areas[inner.area]),
            value_options: table.value_options,
        }
    }

    pub fn display(&self) -> DisplayValue<'a> {
        self.value.display(self.value_options)
    }

    /// Returns the cell's horizontal alignment, resolving "mixed" alignment
    /// by whether the cell's text is a number.
    pub fn horz_align(&self) -> HorzAlign {
        self.style.cell_style.horz_align.unwrap_or_else(|| {
            if self.value.text.trim().parse::<f64>().is_ok() {
                HorzAlign::Right
            } else {
                HorzAlign::Left
            }
        })
    }

    /// Number of shown footnotes referenced by the cell.
    pub fn footnote_count(&self) -> usize {
        self.value.footnote_count()
    }
}
