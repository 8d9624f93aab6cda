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

use std::{
    cmp::{max, min},
    collections::HashMap,
    ops::Range,
    sync::Arc,
};

use enum_map::{EnumMap, enum_map};
use num::Integer;

use crate::{
    geometry::{Axis2, Coord2, Rect2},
    look::{BorderStyle, Look, VertAlign},
    table::{Content, DrawCell, Table},
};

use super::{
    Device, Extreme,
    widths::{accumulate, distribute_spanned_width, interpolate_widths, measure_rule},
};

/// A cell that does not entirely fit on a [Page].
///
/// [Break::next](super::Break::next) can break a table such that some cells
/// are not fully contained within a page.  This happens when a cell is too
/// wide or too tall to fit on a single page, or when a cell spans multiple
/// rows or columns and the page only includes some of them.
///
/// Suppose, for example, that a cell that joins 2 columns has a width of 60
/// pixels and content "abcdef", that the 2 columns that it joins have widths
/// of 20 and 30 pixels, respectively, and that therefore the rule between the
/// two joined columns has a width of 10 (20 + 10 + 30 = 60).  It might render
/// like this, if each character is 10x10, and showing a few extra table cells
/// for context:
///
/// ```text
/// +------+
/// |abcdef|
/// +--+---+
/// |gh|ijk|
/// +--+---+
/// ```
///
/// If the page is broken at the rule that separates "gh" from "ijk", then the
/// page that contains the left side of the "abcdef" cell will have
/// `trim[X][1]` of 10 + 30 = 40 for its portion of the cell, and the page that
/// contains the right side of the cell will have `trim[X][0]` of 20 + 10 =
/// 30.  The two resulting pages would look like this:
///
/// ```text
/// +---
/// |abc
/// +--+
/// |gh|
/// +--+
/// ```
///
/// and:
///
/// ```text
/// ----+
/// cdef|
/// +---+
/// |ijk|
/// +---+
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Overflow {
    /// The part of the page that the cell occupies.
    pub region: Rect2,

    /// Space trimmed off each side of the cell:
    ///
    /// `trim[X][0]`: space trimmed off its left side.
    /// `trim[X][1]`: space trimmed off its right side.
    /// `trim[Y][0]`: space trimmed off its top.
    /// `trim[Y][1]`: space trimmed off its bottom.
    ///
    /// Space that the cell may spill into from the surrounding rules is
    /// included.
    pub trim: EnumMap<Axis2, [usize; 2]>,
}

/// A layout for rendering a specific table on a specific device.
///
/// May represent the layout of an entire table presented to
/// [Pager::new](super::Pager::new), or a rectangular subregion of a table
/// broken out using [Break::next](super::Break::next) to allow a table to be
/// broken across multiple pages.
///
/// A page's size is not limited to the size passed in as part of
/// [Params](super::Params).  [Pager](super::Pager) breaks a [Page] into
/// smaller pages that will fit in the available space.
///
/// # Rendered cells
///
/// Along each axis, a page renders the leading headers `h[axis][0]`, then the
/// body cells `r[axis]` of the table, then the trailing headers
/// `h[axis][1]`.  `n[axis]` is the sum of the three.
#[derive(Debug)]
pub struct Page {
    table: Arc<Table>,

    /// Size of the page in cells.
    n: Coord2,

    /// Header sizes: `h[axis][0]` leading, `h[axis][1]` trailing.
    h: EnumMap<Axis2, [usize; 2]>,

    /// Body cells of the table to render, in table coordinates.
    r: EnumMap<Axis2, Range<usize>>,

    /// "Cell positions".
    ///
    /// cp[X] represents x positions within the page.
    /// cp[X][0] = 0.
    /// cp[X][1] = the width of the leftmost vertical rule.
    /// cp[X][2] = cp[X][1] + the width of the leftmost column.
    /// cp[X][3] = cp[X][2] + the width of the second-from-left vertical rule.
    /// and so on:
    /// cp[X][2 * n[X]] = x position of the rightmost vertical rule.
    /// cp[X][2 * n[X] + 1] = total page width including all rules.
    ///
    /// Similarly, cp[Y] represents y positions within the page.
    ///
    /// Rules and columns can have width or height 0, in which case consecutive
    /// values in this array are equal.
    cp: EnumMap<Axis2, Vec<usize>>,

    /// Cells that don't completely fit on this page, keyed by the top-left
    /// position of the part that does.
    overflows: HashMap<Coord2, Overflow>,

    /// Whether pixels have been cut off the outer edges of the page, so that
    /// the rule along that edge must not be drawn.
    ///
    /// `is_edge_cutoff[X][0]` is for the left side of the leftmost column,
    /// `is_edge_cutoff[X][1]` the right side of the rightmost column, and
    /// `is_edge_cutoff[Y]` similarly for the top and bottom.
    is_edge_cutoff: EnumMap<Axis2, [bool; 2]>,

    /// `join_crossing[axis][z]` is the width of rule `z` along `axis` if a
    /// cell that spans across that rule exists, otherwise 0.  Breaking the
    /// page at the rule loses that much of the spanning cell, so it gets
    /// added back when both leading and trailing headers are present.
    join_crossing: EnumMap<Axis2, Vec<usize>>,

    /// Mirror the page horizontally when drawing.
    rtl: bool,
}

/// Returns the offset in `cp` of the cell with index `cell_index`.
/// That is, if `cell_index` is 0, then the offset is 1, that of the leftmost
/// or topmost cell; if `cell_index` is 1, then the offset is 3, that of the
/// next cell to the right (or below); and so on.
fn cell_ofs(cell_index: usize) -> usize {
    cell_index * 2 + 1
}

/// Returns the offset in `cp` of the rule with index `rule_index`.
fn rule_ofs(rule_index: usize) -> usize {
    rule_index * 2
}

/// Is `ofs` the offset of a rule in `cp`?
fn is_rule(ofs: usize) -> bool {
    ofs.is_even()
}

/// Returns the width of cells within `extent` in `cp`, including the rules
/// between them but not those around them.
fn joined_width(cp: &[usize], extent: Range<usize>) -> usize {
    cp[cell_ofs(extent.end) - 1] - cp[cell_ofs(extent.start)]
}

fn clamp_to_heading_width(w: &mut EnumMap<Extreme, usize>, range: &EnumMap<Extreme, usize>) {
    use Extreme::*;
    if w[Min] < range[Min] {
        w[Min] = range[Min];
        w[Max] = max(w[Max], w[Min]);
    } else if w[Max] > range[Max] {
        w[Max] = range[Max];
        w[Min] = min(w[Min], w[Max]);
    }
}

fn set_join_crossings(join_crossing: &mut [usize], extent: Range<usize>, rules: &[usize]) {
    for z in extent.start + 1..extent.end {
        join_crossing[z] = rules[z];
    }
}

/// Maps a range of page positions to table positions, by adding `t0 - p0`.
#[derive(Copy, Clone, Debug)]
struct Map {
    p0: usize,
    t0: usize,
    n: usize,
}

impl Map {
    fn to_table(&self, z: usize) -> usize {
        z - self.p0 + self.t0
    }

    /// Maps `extent`, in table positions, back to page positions, clipped to
    /// the part of the page that this map covers.
    fn to_page(&self, extent: Range<usize>) -> Range<usize> {
        let start = max(extent.start, self.t0);
        let end = min(extent.end, self.t0 + self.n);
        start - self.t0 + self.p0..end - self.t0 + self.p0
    }
}

/// A table cell as it appears on a page.
#[derive(Clone)]
struct RenderCell<'a> {
    /// The part of the page the cell occupies.
    rect: Rect2,
    content: &'a Content,
}

impl Page {
    /// Creates and returns a new [Page] for rendering `table` with the given
    /// `look` on `device`.
    ///
    /// If `min_width` is nonzero, the columns are widened as necessary to
    /// make the page at least that wide.
    ///
    /// The new [Page] will be suitable for rendering on a device whose page
    /// size is `params.size`, but the caller is responsible for actually
    /// breaking it up to fit on such a device, using [Break](super::Break).
    pub fn new(table: Arc<Table>, device: &dyn Device, min_width: usize, look: &Look) -> Self {
        use Axis2::*;
        use Extreme::*;

        let params = device.params();
        let n = table.n;

        // Figure out rule widths.
        //
        // `rules[X]` is vertical rules.
        // `rules[Y]` is horizontal rules.
        let rules = EnumMap::from_fn(|axis| {
            (0..=n[axis])
                .map(|z| measure_rule(device, &table, axis, z))
                .collect::<Vec<_>>()
        });
        let mut join_crossing = EnumMap::from_fn(|axis| vec![0; n[axis] + 1]);

        let heading_widths = params.px_size.map(|px_size| {
            look.heading_widths.clone().map(|_region, range| {
                enum_map! {
                    Min => *range.start() * px_size,
                    Max => *range.end() * px_size,
                }
            })
        });

        // Calculate minimum and maximum widths of cells that do not span
        // multiple columns.
        let mut unspanned_columns = EnumMap::from_fn(|_| vec![0; n[X]]);
        for cell in table.cells().filter(|cell| cell.span(X) == 1) {
            let mut w = device.measure_cell_width(&DrawCell::new(cell.inner(), &table));
            if let Some(heading_widths) = &heading_widths {
                if let Some(region) = table.heading_region(cell.coord) {
                    clamp_to_heading_width(&mut w, &heading_widths[region]);
                }
            }

            for ext in [Min, Max] {
                let column = &mut unspanned_columns[ext][cell.coord[X]];
                *column = max(*column, w[ext]);
            }
        }

        // Distribute widths of spanned columns.
        let mut columns = unspanned_columns.clone();
        for cell in table.cells().filter(|cell| cell.span(X) > 1) {
            let rect = cell.rect();
            let w = device.measure_cell_width(&DrawCell::new(cell.inner(), &table));
            for ext in [Min, Max] {
                distribute_spanned_width(
                    w[ext],
                    &unspanned_columns[ext][rect[X].clone()],
                    &mut columns[ext][rect[X].clone()],
                    &rules[X][rect[X].start..=rect[X].end],
                );
            }
            set_join_crossings(&mut join_crossing[X], rect[X].clone(), &rules[X]);
        }
        if min_width > 0 {
            for ext in [Min, Max] {
                distribute_spanned_width(
                    min_width,
                    &unspanned_columns[ext],
                    &mut columns[ext],
                    &rules[X],
                );
            }
        }

        // In pathological cases, spans can cause the minimum width of a column
        // to exceed the maximum width.  This bollixes our interpolation
        // algorithm later, so fix it up.
        for x in 0..n[X] {
            columns[Max][x] = max(columns[Max][x], columns[Min][x]);
        }

        // Decide final column widths.
        let rule_widths = rules[X].iter().sum::<usize>();
        let table_widths =
            EnumMap::from_fn(|ext| columns[ext].iter().sum::<usize>() + rule_widths);
        let size = params.size[X];
        let cp_x = if table_widths[Max] <= size {
            // Fits even with maximum widths.  Use them.
            accumulate(&columns[Max], &rules[X])
        } else if table_widths[Min] <= size {
            // Fits with minimum widths, so distribute the leftover space.
            log::debug!(
                "interpolating column widths between {} and {} to fit {size}",
                table_widths[Min],
                table_widths[Max]
            );
            let widths = interpolate_widths(
                &columns[Min],
                &columns[Max],
                table_widths[Min],
                table_widths[Max],
                size,
            );
            accumulate(&widths, &rules[X])
        } else {
            // Doesn't fit even with minimum widths.  Assign minimums for now,
            // and later we can break it horizontally into multiple pages.
            log::debug!(
                "table needs at least {} of {size} available width",
                table_widths[Min]
            );
            accumulate(&columns[Min], &rules[X])
        };

        // Calculate heights of cells that do not span multiple rows.
        let mut unspanned_rows = vec![0; n[Y]];
        for cell in table.cells().filter(|cell| cell.span(Y) == 1) {
            let w = joined_width(&cp_x, cell.rect()[X].clone());
            let h = device.measure_cell_height(&DrawCell::new(cell.inner(), &table), w);
            let row = &mut unspanned_rows[cell.coord[Y]];
            *row = max(*row, h);
        }

        // Distribute heights of spanned rows.
        let mut rows = unspanned_rows.clone();
        for cell in table.cells().filter(|cell| cell.span(Y) > 1) {
            let rect = cell.rect();
            let w = joined_width(&cp_x, rect[X].clone());
            let h = device.measure_cell_height(&DrawCell::new(cell.inner(), &table), w);
            distribute_spanned_width(
                h,
                &unspanned_rows[rect[Y].clone()],
                &mut rows[rect[Y].clone()],
                &rules[Y][rect[Y].start..=rect[Y].end],
            );
            set_join_crossings(&mut join_crossing[Y], rect[Y].clone(), &rules[Y]);
        }

        // Decide final row heights.
        let cp_y = accumulate(&rows, &rules[Y]);

        let mut page = Self {
            n,
            h: table.h,
            r: EnumMap::from_fn(|axis| table.body(axis)),
            cp: Axis2::new_enum(cp_x, cp_y),
            overflows: HashMap::new(),
            is_edge_cutoff: EnumMap::default(),
            join_crossing,
            table,
            rtl: params.rtl,
        };

        // Measure headers.  If they are "too big", get rid of them.
        for axis in [X, Y] {
            if page.h[axis] == [0, 0] {
                continue;
            }
            let hw = page.headers_width(axis);
            let size = params.size[axis];
            if hw * 2 >= size || hw + page.max_cell_width(axis) > size {
                log::debug!("dropping {axis:?} headers {hw} wide on {size} page");
                page.h[axis] = [0, 0];
                page.r[axis] = 0..n[axis];
            }
        }
        page
    }

    /// Returns the number of cells along each axis.
    pub fn n(&self) -> Coord2 {
        self.n
    }

    /// Returns the number of leading and trailing header cells along `axis`.
    pub fn headers(&self, axis: Axis2) -> [usize; 2] {
        self.h[axis]
    }

    /// Returns the range of the table's body cells that this page shows along
    /// `axis`.
    pub fn body(&self, axis: Axis2) -> Range<usize> {
        self.r[axis].clone()
    }

    /// Returns the "cell positions" along `axis`: `2 * n[axis] + 2` offsets,
    /// alternating between the start of a rule and the start of a cell, then
    /// the total size.
    pub fn cp(&self, axis: Axis2) -> &[usize] {
        &self.cp[axis]
    }

    pub fn overflows(&self) -> &HashMap<Coord2, Overflow> {
        &self.overflows
    }

    pub fn is_edge_cutoff(&self, axis: Axis2) -> [bool; 2] {
        self.is_edge_cutoff[axis]
    }

    pub fn join_crossing(&self, axis: Axis2) -> &[usize] {
        &self.join_crossing[axis]
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Returns the width of `extent` along `axis`, where `extent` is a range
    /// of offsets into `cp`.
    fn axis_width(&self, axis: Axis2, extent: Range<usize>) -> usize {
        self.cp[axis][extent.end] - self.cp[axis][extent.start]
    }

    /// Returns the width of cells within `extent` along `axis`.
    pub(super) fn joined_width(&self, axis: Axis2, extent: Range<usize>) -> usize {
        joined_width(&self.cp[axis], extent)
    }

    /// Returns the total width of the leading and trailing headers along
    /// `axis`, including all of their rules.
    pub(super) fn headers_width(&self, axis: Axis2) -> usize {
        let [h0, h1] = self.h[axis];
        self.axis_width(axis, rule_ofs(0)..cell_ofs(h0))
            + self.axis_width(axis, self.rule_ofs_r(axis, h1)..cell_ofs(self.n[axis]))
    }

    /// Returns the offset in `cp` of the rule with index `rule_index_r`,
    /// which counts from the right side (or bottom) of the page.
    fn rule_ofs_r(&self, axis: Axis2, rule_index_r: usize) -> usize {
        rule_ofs(self.n[axis] - rule_index_r)
    }

    /// Returns the width of rule `z` along `axis`.
    pub(super) fn rule_width(&self, axis: Axis2, z: usize) -> usize {
        let ofs = rule_ofs(z);
        self.axis_width(axis, ofs..ofs + 1)
    }

    /// Returns the width of rule `z` along `axis`, counting from the right
    /// side (or bottom).
    pub(super) fn rule_width_r(&self, axis: Axis2, z: usize) -> usize {
        let ofs = self.rule_ofs_r(axis, z);
        self.axis_width(axis, ofs..ofs + 1)
    }

    /// Returns the width of cell `z` along `axis`.
    pub(super) fn cell_width(&self, axis: Axis2, z: usize) -> usize {
        let ofs = cell_ofs(z);
        self.axis_width(axis, ofs..ofs + 1)
    }

    /// Returns the width of the leading headers along `axis`, not including
    /// the rule that separates them from the body.
    pub(super) fn leading_headers_width(&self, axis: Axis2) -> usize {
        self.axis_width(axis, 0..rule_ofs(self.h[axis][0]))
    }

    /// Returns the width of the trailing headers along `axis`, not including
    /// the rule that separates them from the body.
    pub(super) fn trailing_headers_width(&self, axis: Axis2) -> usize {
        self.axis_width(axis, self.rule_ofs_r(axis, self.h[axis][1]) + 1..cell_ofs(self.n[axis]))
    }

    /// Returns the width of the widest body cell along `axis`.
    fn max_cell_width(&self, axis: Axis2) -> usize {
        self.body_cells(axis)
            .map(|z| self.cell_width(axis, z))
            .max()
            .unwrap_or(0)
    }

    /// Returns the range of body cells along `axis`, in page positions.
    pub(super) fn body_cells(&self, axis: Axis2) -> Range<usize> {
        self.h[axis][0]..self.n[axis] - self.h[axis][1]
    }

    /// Returns the total size of the page along `axis`.
    pub fn size(&self, axis: Axis2) -> usize {
        self.cp[axis][2 * self.n[axis] + 1]
    }

    fn get_map(&self, axis: Axis2, z: usize) -> Map {
        let [h0, h1] = self.h[axis];
        if z < h0 {
            Map { p0: 0, t0: 0, n: h0 }
        } else if z < self.n[axis] - h1 {
            Map {
                p0: h0,
                t0: self.r[axis].start,
                n: self.r[axis].len(),
            }
        } else {
            Map {
                p0: self.n[axis] - h1,
                t0: self.table.n[axis] - self.table.h[axis][1],
                n: h1,
            }
        }
    }

    fn get_cell(&self, coord: Coord2) -> RenderCell<'_> {
        assert!(
            coord.x() < self.n.x() && coord.y() < self.n.y(),
            "cell ({}, {}) is outside {}×{} page",
            coord.x(),
            coord.y(),
            self.n.x(),
            self.n.y()
        );
        let maps = EnumMap::from_fn(|axis| self.get_map(axis, coord[axis]));
        let cell = self
            .table
            .get(Coord2::from_fn(|axis| maps[axis].to_table(coord[axis])));
        RenderCell {
            rect: Rect2::from_fn(|axis| maps[axis].to_page(cell.rect()[axis].clone())),
            content: cell.content,
        }
    }

    /// Iterates over the cells that intersect position `z` along `axis`,
    /// yielding each one with its width along the other axis.
    pub(super) fn cells_across(
        &self,
        axis: Axis2,
        z: usize,
    ) -> impl Iterator<Item = (DrawCell<'_>, usize)> {
        let b = !axis;
        let mut w = 0;
        std::iter::from_fn(move || {
            (w < self.n[b]).then(|| {
                let cell = self.get_cell(Coord2::for_axis((axis, z), w));
                w = cell.rect[b].end;
                (
                    DrawCell::new(cell.content.inner(), &self.table),
                    self.joined_width(b, cell.rect[b].clone()),
                )
            })
        })
    }

    /// Creates and returns a new [Page] whose contents are a subregion of this
    /// page's contents.  The new page includes body cells `extent` along
    /// `a`, plus any headers on `a`.
    ///
    /// If `pixel0` is nonzero, then it is a number of pixels to exclude from
    /// the left or top (according to `a`) of cell `extent.start`.
    /// Similarly, `pixel1` is a number of pixels to exclude from the right or
    /// bottom of cell `extent.end - 1`.  (`pixel0` and `pixel1` are used to
    /// render cells that are too large to fit on a single page.)
    ///
    /// The whole of axis `!a` is included.  (The caller may follow up with
    /// another call to select on `!a`.)
    pub fn select(
        self: &Arc<Self>,
        a: Axis2,
        extent: Range<usize>,
        pixel0: usize,
        pixel1: usize,
    ) -> Arc<Self> {
        let body = self.body_cells(a);
        assert!(
            body.start <= extent.start && extent.start < extent.end && extent.end <= body.end,
            "selection {extent:?} along {a:?} is outside body {body:?}"
        );

        // If all of the page is selected, just make a copy.
        if extent == body && pixel0 == 0 && pixel1 == 0 {
            return self.clone();
        }

        let s = Selection {
            page: self,
            a,
            z0: extent.start,
            z1: extent.end,
            p0: pixel0,
            p1: pixel1,
        };
        log::trace!("selecting {extent:?} along {a:?} trimming {pixel0}/{pixel1}");
        let mut subpage = s.subpage();
        subpage.overflows = s.overflows(&subpage);
        Arc::new(subpage)
    }

    /// Draws the cells of this page whose `cp` offsets fall within `bb`,
    /// followed by the rules.
    fn draw_cells(&self, device: &mut dyn Device, ofs: Coord2, bb: Rect2) {
        use Axis2::*;

        for y in bb[Y].clone() {
            let mut x = bb[X].start;
            while x < bb[X].end {
                if !is_rule(x) && !is_rule(y) {
                    let cell = self.get_cell(Coord2::new(x / 2, y / 2));
                    if y / 2 == bb[Y].start / 2 || y / 2 == cell.rect[Y].start {
                        self.draw_cell(device, ofs, &cell);
                    }
                    x = rule_ofs(cell.rect[X].end);
                } else {
                    x += 1;
                }
            }
        }

        for y in bb[Y].clone() {
            for x in bb[X].clone() {
                if is_rule(x) || is_rule(y) {
                    self.draw_rule(device, ofs, Coord2::new(x, y));
                }
            }
        }
    }

    /// Draws the whole page with its top-left corner at `ofs`.
    pub fn draw(&self, device: &mut dyn Device, ofs: Coord2) {
        let bb = Rect2::from_fn(|axis| 0..self.n[axis] * 2 + 1);
        self.draw_cells(device, ofs, bb);
    }

    /// Draws the cells and rules of this page that intersect `clip`, with the
    /// page's top-left corner at `ofs`.  `clip` is relative to the page.
    pub fn draw_region(&self, device: &mut dyn Device, ofs: Coord2, clip: &Rect2) {
        let bb = Rect2::from_fn(|axis| {
            let cp = &self.cp[axis];
            let n = self.n[axis] * 2 + 1;
            clip_min_extent(clip[axis].start, &cp[..n])..clip_max_extent(clip[axis].end, cp, n)
        });
        self.draw_cells(device, ofs, bb);
    }

    /// Returns the bounding box of the cp offsets `extent`, in device
    /// coordinates.
    fn device_box(&self, ofs: Coord2, extent: &Rect2) -> Rect2<isize> {
        let mut bb = Rect2::from_fn(|axis| {
            let cp = &self.cp[axis];
            cp[extent[axis].start] as isize..cp[extent[axis].end] as isize
        });
        self.mirror(&mut bb);
        bb.translate(ofs.0.map(|_, ofs| ofs as isize))
    }

    /// Mirrors page-relative `bb` horizontally, for right-to-left output.
    fn mirror(&self, bb: &mut Rect2<isize>) {
        if self.rtl {
            let width = self.size(Axis2::X) as isize;
            let x = bb[Axis2::X].clone();
            bb[Axis2::X] = width - x.end..width - x.start;
        }
    }

    fn draw_rule(&self, device: &mut dyn Device, ofs: Coord2, coord: Coord2) {
        let mut styles = EnumMap::from_fn(|_| [BorderStyle::none(); 2]);
        for a in [Axis2::X, Axis2::Y] {
            let b = !a;
            if !is_rule(coord[a])
                || (self.is_edge_cutoff[a][0] && coord[a] == 0)
                || (self.is_edge_cutoff[a][1] && coord[a] == self.n[a] * 2)
            {
                continue;
            }

            if is_rule(coord[b]) {
                if coord[b] > 0 {
                    let mut e = coord;
                    e[b] -= 1;
                    styles[a][0] = self.get_rule(a, e);
                }
                if coord[b] / 2 < self.n[b] {
                    styles[a][1] = self.get_rule(a, coord);
                }
            } else {
                let style = self.get_rule(a, coord);
                styles[a] = [style, style];
            }
        }

        if styles.values().flatten().any(|style| !style.is_none()) {
            let extent = Rect2::from_fn(|axis| coord[axis]..coord[axis] + 1);
            device.draw_line(self.device_box(ofs, &extent), styles);
        }
    }

    /// Returns the style of the rule along axis `a` at `cp` offset `coord`.
    ///
    /// Where headers meet the body, one rendered rule stands for two rules
    /// in the table, and the stronger of the two wins.
    fn get_rule(&self, a: Axis2, coord: Coord2) -> BorderStyle {
        let b = !a;
        let mut d = Coord2::from_fn(|axis| coord[axis] / 2);
        let [h0, h1] = self.h[a];

        let mut d2 = None;
        if d[a] < h0 {
            // Leading header rules are the same in the table.
        } else if d[a] <= self.n[a] - h1 {
            if h0 > 0 && d[a] == h0 {
                d2 = Some(h0);
            } else if h1 > 0 && d[a] == self.n[a] - h1 {
                d2 = Some(self.table.n[a] - h1);
            }
            d[a] = d[a] - h0 + self.r[a].start;
        } else {
            d[a] = d[a] - (self.n[a] - h1) + (self.table.n[a] - self.table.h[a][1]);
        }
        d[b] = self.get_map(b, d[b]).to_table(d[b]);

        let style = self.table.get_rule(a, d);
        match d2 {
            Some(d2) => {
                d[a] = d2;
                style.combine(self.table.get_rule(a, d))
            }
            None => style,
        }
    }

    fn draw_cell(&self, device: &mut dyn Device, ofs: Coord2, cell: &RenderCell) {
        use Axis2::*;

        let draw_cell = DrawCell::new(cell.content.inner(), &self.table);
        let inner =
            Rect2::from_fn(|axis| cell_ofs(cell.rect[axis].start)..rule_ofs(cell.rect[axis].end));
        let mut bb = Rect2::from_fn(|axis| {
            let cp = &self.cp[axis];
            cp[inner[axis].start] as isize..cp[inner[axis].end] as isize
        });
        let mut clip = bb.clone();

        let valign_offset = match draw_cell.style.cell_style.vert_align {
            VertAlign::Top => 0,
            valign => {
                let height = device.measure_cell_height(&draw_cell, bb.len(X) as usize);
                let extra = (bb.len(Y) as usize).saturating_sub(height);
                if valign == VertAlign::Middle {
                    extra / 2
                } else {
                    extra
                }
            }
        };

        if let Some(overflow) = self.overflows.get(&cell.rect.top_left()) {
            for axis in [X, Y] {
                let cp = &self.cp[axis];
                let [trim0, trim1] = overflow.trim[axis];
                if trim0 > 0 {
                    bb[axis].start -= trim0 as isize;
                    if cell.rect[axis].start == 0 && !self.is_edge_cutoff[axis][0] {
                        clip[axis].start = cp[rule_ofs(cell.rect[axis].start)] as isize;
                    }
                }
                if trim1 > 0 {
                    bb[axis].end += trim1 as isize;
                    if cell.rect[axis].end == self.n[axis] && !self.is_edge_cutoff[axis][1] {
                        clip[axis].end = cp[cell_ofs(cell.rect[axis].end)] as isize;
                    }
                }
            }
        }

        let ofs = ofs.0.map(|_, ofs| ofs as isize);
        self.mirror(&mut bb);
        self.mirror(&mut clip);
        let bb = bb.translate(ofs);
        let clip = clip.translate(ofs);

        let spill = EnumMap::from_fn(|axis| {
            [
                self.rule_width(axis, cell.rect[axis].start) / 2,
                self.rule_width(axis, cell.rect[axis].end) / 2,
            ]
        });

        // Body rows alternate, counting from the first body row of the table,
        // so that the pattern continues across pages.
        let y = cell.rect[Y].start;
        let row = self.get_map(Y, y).to_table(y);
        let alternate_row =
            self.table.body(Y).contains(&row) && (row - self.table.h[Y][0]).is_odd();

        device.draw_cell(&draw_cell, alternate_row, bb, valign_offset, spill, &clip);
    }

    /// Returns the largest height no greater than `height` at which this page
    /// may be broken between rows: 0 if even the first row and the rules
    /// around it don't fit, otherwise the position just below the last rule
    /// that fits, or `height` itself if the whole page fits.
    pub fn best_breakpoint(&self, height: usize) -> usize {
        let cp = &self.cp[Axis2::Y];
        if cp.get(3).is_some_and(|&y| y > height) {
            return 0;
        }
        (5..=2 * self.n[Axis2::Y] + 1)
            .step_by(2)
            .find(|&y| cp[y] > height)
            .map_or(height, |y| cp[y - 2])
    }
}

/// Returns the greatest index `i` such that `cp[i] <= x0`, or 0 if there is
/// none.
fn clip_min_extent(x0: usize, cp: &[usize]) -> usize {
    cp.partition_point(|&x| x <= x0).saturating_sub(1)
}

/// Returns the least index `i < n` such that `cp[i] >= x1`, or `n` if there is
/// none, then backs up over zero-width rules and cells.
fn clip_max_extent(x1: usize, cp: &[usize], n: usize) -> usize {
    let mut best = cp[..n].partition_point(|&x| x < x1);
    while best > 0 && cp[best - 1] == cp[best] {
        best -= 1;
    }
    best
}

/// Reduces `trim` by a total of up to `extra`, taking from the leading side
/// first.
fn give_back(trim: &mut [usize; 2], mut extra: usize) {
    for side in trim {
        let n = min(*side, extra);
        *side -= n;
        extra -= n;
    }
}

/// A selection of body cells `z0..z1` along axis `a` of `page`, trimming `p0`
/// pixels from the first and `p1` from the last.
struct Selection<'a> {
    page: &'a Page,
    a: Axis2,
    z0: usize,
    z1: usize,
    p0: usize,
    p1: usize,
}

impl Selection<'_> {
    /// Builds the subpage, without its overflows.
    fn subpage(&self) -> Page {
        let Self {
            page,
            a,
            z0,
            z1,
            p0,
            p1,
        } = *self;
        let [h0, h1] = page.h[a];
        let body = page.body_cells(a);

        let trim = [z0 - body.start, body.end - z1];
        let mut n = page.n;
        n[a] -= trim[0] + trim[1];
        let mut r = page.r.clone();
        r[a].start += trim[0];
        r[a].end -= trim[1];

        // An edge is cut off if it was cut off in `page` or if we're trimming
        // pixels off that side of the page and there are no headers.
        let mut is_edge_cutoff = page.is_edge_cutoff;
        is_edge_cutoff[a] = [
            h0 == 0 && (p0 > 0 || (z0 == 0 && page.is_edge_cutoff[a][0])),
            h1 == 0 && (p1 > 0 || (z1 == page.n[a] && page.is_edge_cutoff[a][1])),
        ];

        let jc = &page.join_crossing[a];
        let mut join_crossing = page.join_crossing.clone();
        join_crossing[a] = jc[..h0]
            .iter()
            .chain(&jc[z0..=z1])
            .chain(&jc[body.end..page.n[a]])
            .copied()
            .collect();

        // Select widths from `page` into the subpage.
        let both_headers = h0 > 0 && h1 > 0;
        let scp = page.cp[a].as_slice();
        let width = |z: usize| scp[z + 1] - scp[z];
        let leading = (0..=rule_ofs(h0))
            .map(|z| if z == 0 && is_edge_cutoff[a][0] { 0 } else { width(z) });
        let body_widths = (cell_ofs(z0)..=cell_ofs(z1 - 1)).map(|z| {
            let mut w = width(z);
            if z == cell_ofs(z0) {
                if both_headers {
                    w += jc[z0];
                }
                w -= p0;
            }
            if z == cell_ofs(z1 - 1) {
                w -= p1;
            }
            w
        });
        let last = page.rule_ofs_r(a, 0);
        let trailing = (page.rule_ofs_r(a, h1)..=last).map(|z| {
            if z == last && is_edge_cutoff[a][1] {
                0
            } else {
                width(z)
            }
        });
        let dcp = std::iter::once(0)
            .chain(leading.chain(body_widths).chain(trailing).scan(0, |total, w| {
                *total += w;
                Some(*total)
            }))
            .collect::<Vec<_>>();
        debug_assert_eq!(dcp.len(), 2 * n[a] + 2);

        let mut cp = page.cp.clone();
        cp[a] = dcp;

        Page {
            table: page.table.clone(),
            n,
            h: page.h,
            r,
            cp,
            overflows: HashMap::new(),
            is_edge_cutoff,
            join_crossing,
            rtl: page.rtl,
        }
    }

    /// Maps `extent`, in `page` positions along `a`, to positions in the
    /// subpage, clipping body cells to the selection.  `extent` lies entirely
    /// within the leading headers, the body, or the trailing headers.
    fn to_subpage(&self, extent: Range<usize>) -> Range<usize> {
        let [h0, h1] = self.page.h[self.a];
        let body_end = self.page.n[self.a] - h1;
        if extent.end <= h0 {
            extent
        } else if extent.start >= body_end {
            let shift = body_end - h0 - (self.z1 - self.z0);
            extent.start - shift..extent.end - shift
        } else {
            max(extent.start, self.z0) - self.z0 + h0..min(extent.end, self.z1) - self.z0 + h0
        }
    }

    fn region(&self, rect: &Rect2) -> Rect2 {
        let mut region = rect.clone();
        region[self.a] = self.to_subpage(rect[self.a].clone());
        region
    }

    /// Finds or creates the overflow record for `cell` in `overflows`,
    /// starting from whatever `page` recorded for it.
    fn overflow<'b>(
        &self,
        overflows: &'b mut HashMap<Coord2, Overflow>,
        rect: &Rect2,
    ) -> &'b mut Overflow {
        let region = self.region(rect);
        overflows.entry(region.top_left()).or_insert_with(|| Overflow {
            trim: self
                .page
                .overflows
                .get(&rect.top_left())
                .map_or_else(EnumMap::default, |old| old.trim),
            region,
        })
    }

    /// Computes the subpage's overflows.
    fn overflows(&self, subpage: &Page) -> HashMap<Coord2, Overflow> {
        let Self {
            page,
            a,
            z0,
            z1,
            p0,
            p1,
        } = *self;
        let b = !a;
        let [h0, h1] = page.h[a];
        let both_headers = h0 > 0 && h1 > 0;
        let mut overflows = HashMap::new();

        // Cells cut off at the leading edge of the selection, and possibly
        // its trailing edge too.
        if h0 == 0 || z0 > h0 || p0 > 0 {
            let mut z = 0;
            while z < page.n[b] {
                let cell = page.get_cell(Coord2::for_axis((a, z0), z));
                let (start, end) = (cell.rect[a].start, cell.rect[a].end);
                let overflow0 = p0 > 0 || start < z0;
                let overflow1 = end > z1 || (end == z1 && p1 > 0);
                if overflow0 || overflow1 {
                    let of = self.overflow(&mut overflows, &cell.rect);
                    if overflow0 {
                        of.trim[a][0] += p0 + page.axis_width(a, cell_ofs(start)..cell_ofs(z0));
                    }
                    if overflow1 {
                        of.trim[a][1] += p1 + page.axis_width(a, rule_ofs(z1)..rule_ofs(end));
                    }
                }
                z = cell.rect[b].end;
            }
        }

        // Cells cut off only at the trailing edge.
        if h1 == 0 || z1 < page.n[a] - h1 || p1 > 0 {
            let mut z = 0;
            while z < page.n[b] {
                let cell = page.get_cell(Coord2::for_axis((a, z1 - 1), z));
                let end = cell.rect[a].end;
                let key = self.region(&cell.rect).top_left();
                if (end > z1 || (end == z1 && p1 > 0)) && !overflows.contains_key(&key) {
                    let of = self.overflow(&mut overflows, &cell.rect);
                    of.trim[a][1] += p1 + page.axis_width(a, rule_ofs(z1)..rule_ofs(end));
                }
                z = cell.rect[b].end;
            }
        }

        // Inherit the rest of `page`'s overflows, for cells that are still
        // present.  Header cells along `a` always are.
        let body = page.body_cells(a);
        for old in page.overflows.values() {
            let extent = &old.region[a];
            let present = !body.contains(&extent.start) || (extent.end > z0 && extent.start < z1);
            if present {
                self.overflow(&mut overflows, &old.region);
            }
        }

        // The first body cell of the subpage is wider than in `page` by the
        // join crossing at `z0`.  Cells that cover it and are trimmed anyway
        // take that much less off, so that each one still totals its full
        // width.
        if both_headers {
            let extra = page.join_crossing[a][z0];
            for of in overflows.values_mut() {
                if extra > 0 && of.region[a].contains(&h0) {
                    give_back(&mut of.trim[a], extra);
                }
            }
        }

        debug_assert!(
            overflows
                .values()
                .all(|of| of.region[a].end <= subpage.n[a] && of.region[b].end <= subpage.n[b])
        );
        overflows
    }
}
