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

//! Laying out tables and breaking them into pages.
//!
//! A [Device] measures and draws cells and rules.  A [Page] is the layout of
//! a table, or of a piece of one, for a particular device.  [Break] carves a
//! [Page] into pieces that fit within a given size along one axis, and
//! [Pager] drives the whole process for a table and the pseudo-tables (title,
//! layers, caption, footnotes) that surround it.
//!
//! # Coordinate system
//!
//! The rendering code assumes that larger `x` is to the right and larger `y`
//! toward the bottom of the page.
//!
//! The rendering code assumes that the table being rendered has its upper left
//! corner at (0,0) in device coordinates.  This is usually not the case from
//! the driver's perspective, so the driver should expect to apply its own
//! offset to coordinates passed to callback functions.

use enum_map::{Enum, EnumMap};

use crate::{
    geometry::{Axis2, Coord2, Rect2},
    look::{BorderStyle, Stroke},
    table::DrawCell,
};

mod breaks;
mod page;
mod pager;
mod widths;

pub use breaks::Break;
pub use page::{Overflow, Page};
pub use pager::Pager;

#[cfg(test)]
mod tests;

/// Parameters for rendering a table to a device.
#[derive(Clone, Debug)]
pub struct Params {
    /// Page size to try to fit the rendering into.  Some tables will, of
    /// course, overflow this size.
    pub size: Coord2,

    /// Nominal size of a character in the most common font:
    /// `font_size[Axis2::X]` is the em width.
    /// `font_size[Axis2::Y]` is the line leading.
    pub font_size: EnumMap<Axis2, usize>,

    /// Width of different kinds of lines.
    pub line_widths: EnumMap<Stroke, usize>,

    /// 1/96" of an inch (1px) in the rendering unit.  Used only for the
    /// heading width ranges in [Look](crate::look::Look).  `None` disables
    /// them.
    pub px_size: Option<usize>,

    /// Minimum cell width or height before allowing the cell to be broken
    /// across two pages.  (Joined cells may always be broken at join
    /// points.)
    pub min_break: EnumMap<Axis2, usize>,

    /// True if the driver supports cell margins.  (If false, the rendering
    /// engine will insert a small space between adjacent cells that don't have
    /// an intervening rule.)
    pub supports_margins: bool,

    /// True if the local language has a right-to-left direction, otherwise
    /// false.
    pub rtl: bool,

    /// True if the table is being rendered for printing (as opposed to
    /// on-screen display).
    pub printing: bool,

    /// Whether [Device::adjust_break] is implemented.
    pub can_adjust_break: bool,

    /// Whether [Device::scale] is implemented.
    pub can_scale: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Enum)]
pub enum Extreme {
    Min,
    Max,
}

pub trait Device {
    fn params(&self) -> &Params;

    /// Measures `cell`'s width.  Returns `map`, where:
    ///
    /// - `map[Extreme::Min]` is the minimum width required to avoid splitting a
    ///   single word across multiple lines.  This is usually the width of the
    ///   longest word in the cell.
    ///
    /// - `map[Extreme::Max]` is the minimum width required to avoid line breaks
    ///   other than at new-lines.
    fn measure_cell_width(&self, cell: &DrawCell) -> EnumMap<Extreme, usize>;

    /// Returns the height required to render `cell` given a width of `width`.
    fn measure_cell_height(&self, cell: &DrawCell, width: usize) -> usize;

    /// Given that `cell`, rendered `width` wide, must be broken at or above
    /// `height`, returns the largest height no greater than `height` at which
    /// breaking is appropriate, e.g. one that falls between two lines of text
    /// rather than through one.
    ///
    /// Called only if [Params::can_adjust_break] is true.
    fn adjust_break(&self, cell: &DrawCell, width: usize, height: usize) -> usize {
        let _ = (cell, width);
        height
    }

    /// Draws a generalized intersection of lines in `bb`.
    ///
    /// `styles` is interpreted this way:
    ///
    /// `styles[Axis2::X][0]`: style of line from top of `bb` to its center.
    /// `styles[Axis2::X][1]`: style of line from bottom of `bb` to its center.
    /// `styles[Axis2::Y][0]`: style of line from left of `bb` to its center.
    /// `styles[Axis2::Y][1]`: style of line from right of `bb` to its center.
    fn draw_line(&mut self, bb: Rect2<isize>, styles: EnumMap<Axis2, [BorderStyle; 2]>);

    /// Draws `cell` within bounding box `bb`.  `clip` is the same as `bb` (the
    /// common case) or a subregion enclosed by `bb`.  In the latter case only
    /// the part of the cell that lies within `clip` should actually be drawn,
    /// although `bb` should used to determine the layout of the cell.
    ///
    /// The text in the cell needs to be vertically offset `valign_offset` units
    /// from the top of the bounding box.  The implementation must handle
    /// horizontal alignment itself.
    ///
    /// `spill` is how far the cell's background may extend into the
    /// surrounding rules on each side.  `alternate_row` is true for
    /// odd-numbered body rows, which may use alternate colors.
    fn draw_cell(
        &mut self,
        cell: &DrawCell,
        alternate_row: bool,
        bb: Rect2<isize>,
        valign_offset: usize,
        spill: EnumMap<Axis2, [usize; 2]>,
        clip: &Rect2<isize>,
    );

    /// Scales all output by `factor`, e.g. a `factor` of 0.5 would cause
    /// everything subsequent to be drawn half-size.  `factor` will be greater
    /// than 0 and less than or equal to 1.
    ///
    /// Called only if [Params::can_scale] is true.
    fn scale(&mut self, factor: f64) {
        let _ = factor;
    }
}
