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

use std::{cmp::max, sync::Arc};

use crate::geometry::Axis2;

use super::{Device, Page};

/// Breaks a [Page] into pieces that fit within a given size along one axis.
///
/// Every piece repeats the page's headers along that axis.
#[derive(Debug)]
pub struct Break {
    page: Arc<Page>,

    /// Axis along which `page` is being broken.
    axis: Axis2,

    /// Next cell along `axis`.
    z: usize,

    /// Pixel offset within cell `z` (usually 0).
    pixel: usize,

    /// Width of headers of `page` along `axis`.
    hw: usize,
}

impl Break {
    pub fn new(page: Arc<Page>, axis: Axis2) -> Self {
        let z = page.body_cells(axis).start;
        let hw = page.headers_width(axis);
        Self {
            page,
            axis,
            z,
            pixel: 0,
            hw,
        }
    }

    /// Returns true if there is more of the page left to break out.
    pub fn has_next(&self) -> bool {
        self.z < self.page.body_cells(self.axis).end
    }

    /// Returns the width of the headers along the axis being broken, which
    /// every piece includes.
    pub fn headers_width(&self) -> usize {
        self.hw
    }

    /// Returns the width that would be required along this breaker's axis to
    /// render a page from the current position up to but not including `cell`.
    fn needed_size(&self, cell: usize) -> usize {
        let page = &self.page;
        let axis = self.axis;
        let [h0, h1] = page.headers(axis);

        // Width of leading headers, not including the rule after them.
        let mut size = page.leading_headers_width(axis);

        // If we have a pixel offset and there are no leading headers, then the
        // leftmost rule of the body is omitted, so that a partial cell does
        // not look like a whole one.  Otherwise the rule after the headers
        // merges with the leftmost rule of the body, and a merged rule is as
        // wide as the wider of the two.
        if self.pixel == 0 || h0 > 0 {
            size += max(page.rule_width(axis, h0), page.rule_width(axis, self.z));
        }

        // Width of body, minus any pixel offset in the leftmost cell.
        size += page.joined_width(axis, self.z..cell) - self.pixel;

        // Width of rightmost rule in body merged with leftmost rule in
        // trailing headers.
        size += max(page.rule_width_r(axis, h1), page.rule_width(axis, cell));

        // Width of trailing headers, not including their leftmost rule.
        size += page.trailing_headers_width(axis);

        // Space for the part of a joined cell lost at the break.
        if h0 > 0 && h1 > 0 {
            size += page.join_crossing(axis)[self.z];
        }

        size
    }

    /// Returns a new [Page] that is up to `size` pixels wide along the axis
    /// used for breaking.  Returns `None` if the page has already been
    /// completely broken up, or if `size` is too small to reasonably render
    /// any more of it.  The latter will never happen if `size` is at least as
    /// large as the page size passed to [Page::new] along the axis used for
    /// breaking.
    pub fn next(&mut self, device: &dyn Device, size: usize) -> Option<Arc<Page>> {
        if !self.has_next() {
            return None;
        }

        let (z, pixel) = self.find_breakpoint(device, size)?;
        let page = match pixel {
            0 => self.page.select(self.axis, self.z..z, self.pixel, 0),
            pixel => self.page.select(
                self.axis,
                self.z..z + 1,
                self.pixel,
                self.page.cell_width(self.axis, z) - pixel,
            ),
        };
        log::trace!(
            "broke {:?} at cell {z} pixel {pixel} into piece {} wide",
            self.axis,
            page.size(self.axis)
        );
        self.z = z;
        self.pixel = pixel;
        Some(page)
    }

    /// Returns the rest of the current cell as a new [Page], whatever its
    /// size, and moves on to the next cell.  Returns `None` if the page has
    /// already been completely broken up.
    ///
    /// This is the way out when [Break::next] cannot make progress even with
    /// a whole page of space, so that no content is ever dropped.
    pub fn force_next(&mut self) -> Option<Arc<Page>> {
        if !self.has_next() {
            return None;
        }
        let z = self.z;
        log::warn!(
            "cell {z} along {:?} does not fit on a page, rendering it anyway",
            self.axis
        );
        let page = self.page.select(self.axis, z..z + 1, self.pixel, 0);
        self.z = z + 1;
        self.pixel = 0;
        Some(page)
    }

    fn find_breakpoint(&self, device: &dyn Device, size: usize) -> Option<(usize, usize)> {
        let end = self.page.body_cells(self.axis).end;
        for z in self.z..end {
            let needed = self.needed_size(z + 1);
            if needed > size {
                let pixel = self.break_cell(device, z, needed - size);
                if z == self.z && pixel <= self.pixel {
                    return None;
                } else {
                    return Some((z, pixel));
                }
            }
        }
        Some((end, 0))
    }

    /// Returns how far into cell `z` to break, given that including all of it
    /// would overfill the available space by `overflow`, or 0 to break before
    /// it.
    fn break_cell(&self, device: &dyn Device, z: usize, overflow: usize) -> usize {
        if !self.cell_is_breakable(device, z) {
            return 0;
        }
        let params = device.params();

        // Without trailing headers, a partial cell at the end of the body
        // omits the rule after it, like the leading side in
        // [Self::needed_size].
        let rule_allowance = if self.page.headers(self.axis)[1] > 0 {
            0
        } else {
            self.page.rule_width(self.axis, z)
        };

        // The amount that, if we added cell `z`, the rendering would
        // overfill the allocated `size`.  At least one pixel of the cell
        // always goes to the next piece.
        let overhang = overflow.saturating_sub(rule_allowance).max(1);

        // The amount trimmed off the leading side of `z`, and the amount left
        // to render.
        let cell_size = self.page.cell_width(self.axis, z);
        let cell_ofs = if z == self.z { self.pixel } else { 0 };
        let cell_left = cell_size - cell_ofs;

        // If some of the cell remains to render, and there would still be
        // some of the cell left afterward, then partially render that much of
        // the cell.
        let mut pixel = if cell_left > 0 && cell_left > overhang {
            cell_left - overhang + cell_ofs
        } else {
            0
        };

        // If only a sliver of the cell would be left over, render a little
        // less of it.
        let em = params.font_size[self.axis];
        if pixel + em > cell_size {
            pixel = pixel.saturating_sub(em);
        }

        // When breaking vertically, a cell may have a better breakpoint than
        // the exact number of pixels available, e.g. between two lines of
        // text instead of through one.
        if self.axis == Axis2::Y && params.can_adjust_break {
            let start_pixel = if z == self.z { self.pixel } else { 0 };
            for (cell, width) in self.page.cells_across(Axis2::Y, z) {
                let better_pixel = device.adjust_break(&cell, width, pixel);
                if better_pixel < pixel {
                    if better_pixel > start_pixel {
                        pixel = better_pixel;
                        break;
                    } else if better_pixel == 0 && z != self.z {
                        pixel = 0;
                        break;
                    }
                }
            }
        }

        pixel
    }

    /// Returns true if cell `z` along this breaker's axis may be broken across
    /// a page boundary.
    ///
    /// This is just a heuristic.  Breaking cells across page boundaries can
    /// save space, but it looks ugly.
    fn cell_is_breakable(&self, device: &dyn Device, z: usize) -> bool {
        self.page.cell_width(self.axis, z) >= device.params().min_break[self.axis]
    }
}
