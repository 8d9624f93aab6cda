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

use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
    geometry::{Axis2, Coord2, Rect2},
    item::TableItem,
    table::Table,
};

use super::{Break, Device, Page};

/// Renders a [TableItem] one page-sized chunk at a time.
pub struct Pager {
    scale: f64,

    /// [Page]s to be rendered, in order, vertically.  There may be up to 5
    /// pages, for the title, layers, body, caption, and footnotes.
    pages: SmallVec<[Arc<Page>; 5]>,

    /// Index into `pages` of the next page to start breaking.
    cur_page: usize,

    x_break: Option<Break>,
    y_break: Option<Break>,
}

impl Pager {
    pub fn new(device: &dyn Device, item: &TableItem) -> Self {
        use Axis2::*;

        let params = device.params();
        let look = item.look();
        let output = item.output(params.printing);

        // Figure out the width of the body of the table.  Use this to
        // determine the base scale.
        let body_page = Arc::new(Page::new(output.body, device, 0, look));
        let mut body_width = body_page.size(X);
        let mut scale = 1.0;
        if body_width > params.size[X] {
            if look.shrink_to_fit[X] && params.can_scale {
                scale = params.size[X] as f64 / body_width as f64;
            } else {
                body_width = Break::new(body_page.clone(), X)
                    .next(device, params.size[X])
                    .map_or(0, |page| page.size(X));
            }
        }

        let new_page =
            |table: Table| Arc::new(Page::new(Arc::new(table), device, body_width, look));
        let mut pages: SmallVec<[Arc<Page>; 5]> = SmallVec::new();
        pages.extend([output.title, output.layers].into_iter().flatten().map(&new_page));
        pages.push(body_page);
        pages.extend([output.caption, output.footnotes].into_iter().flatten().map(&new_page));

        // If we're shrinking tables to fit the page length, then adjust the
        // scale factor.
        //
        // This will sometimes shrink more than needed, because adjusting the
        // scale factor allows for cells to be "wider", which means that
        // sometimes they won't break across as much vertical space, thus
        // shrinking the table vertically more than the scale would imply.
        if look.shrink_to_fit[Y] && params.can_scale {
            let total_height = pages.iter().map(|page| page.size(Y)).sum::<usize>() as f64;
            let max_height = params.size[Y] as f64;
            if total_height * scale >= max_height {
                scale *= max_height / total_height;
            }
        }
        if scale != 1.0 {
            log::debug!("scaling table by {scale}");
        }

        Self {
            scale,
            pages,
            cur_page: 0,
            x_break: None,
            y_break: None,
        }
    }

    /// Returns the factor by which output is scaled.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Converts `size`, in device units, into the units of the unscaled
    /// pages.
    fn unscaled(&self, size: usize) -> usize {
        if self.scale == 1.0 {
            size
        } else {
            (size as f64 / self.scale + 1e-9) as usize
        }
    }

    /// True if there's content left to render.
    pub fn has_next(&mut self, device: &dyn Device) -> bool {
        while self
            .y_break
            .as_ref()
            .is_none_or(|y_break| !y_break.has_next())
        {
            let width = self.unscaled(device.params().size[Axis2::X]);
            match self.x_break.as_mut().filter(|x_break| x_break.has_next()) {
                Some(x_break) => {
                    self.y_break = x_break
                        .next(device, width)
                        .or_else(|| x_break.force_next())
                        .map(|page| Break::new(page, Axis2::Y));
                }
                None => {
                    let Some(page) = self.pages.get(self.cur_page) else {
                        self.x_break = None;
                        self.y_break = None;
                        return false;
                    };
                    self.x_break = Some(Break::new(page.clone(), Axis2::X));
                    self.cur_page += 1;
                }
            }
        }
        true
    }

    /// Draws a chunk of content to fit in a space that has vertical size
    /// `space` and the horizontal size specified in the device parameters.
    /// Returns the amount of vertical space actually used by the rendered
    /// chunk, which will be 0 if `space` is too small to render anything or if
    /// no content remains (use [Self::has_next] to distinguish these cases).
    ///
    /// A call renders at most one chunk of each page, stacking the chunks of
    /// successive pages (for example, the title and the start of the body)
    /// vertically.
    pub fn draw_next(&mut self, device: &mut dyn Device, space: usize) -> usize {
        use Axis2::*;

        let space = if self.scale != 1.0 {
            device.scale(self.scale);
            self.unscaled(space)
        } else {
            space
        };
        let full_page = self.unscaled(device.params().size[Y]);

        let mut ofs = Coord2::new(0, 0);
        let mut start_page = None;
        while self.has_next(&*device) {
            if start_page == Some(self.cur_page) {
                break;
            }
            start_page = Some(self.cur_page);

            let Some(y_break) = self.y_break.as_mut() else {
                break;
            };
            let page = match y_break.next(&*device, space.saturating_sub(ofs[Y])) {
                Some(page) => page,
                None if ofs[Y] == 0 && space >= full_page => match y_break.force_next() {
                    Some(page) => page,
                    None => break,
                },
                None => break,
            };
            page.draw(device, ofs);
            ofs[Y] += page.size(Y);
        }

        (ofs[Y] as f64 * self.scale).round() as usize
    }

    /// Draws all of the pages, unbroken and stacked vertically.
    pub fn draw(&self, device: &mut dyn Device) {
        self.draw_region(device, &Rect2::new(0..usize::MAX, 0..usize::MAX));
    }

    /// Draws the parts of the pages, unbroken and stacked vertically, that
    /// intersect `clip`.
    pub fn draw_region(&self, device: &mut dyn Device, clip: &Rect2) {
        use Axis2::*;

        let mut ofs = Coord2::new(0, 0);
        for page in &self.pages {
            let size = page.size(Y);
            let y = clip[Y].start.max(ofs[Y]) - ofs[Y]
                ..clip[Y].end.min(ofs[Y] + size).saturating_sub(ofs[Y]);
            if y.start < y.end {
                page.draw_region(device, ofs, &Rect2::new(clip[X].clone(), y));
            }
            ofs[Y] += size;
        }
    }

    /// Returns the size of all of the pages, unbroken and stacked vertically:
    /// the widest page's width, or the sum of the heights.
    pub fn size(&self, axis: Axis2) -> usize {
        let sizes = self.pages.iter().map(|page| page.size(axis));
        match axis {
            Axis2::X => sizes.max().unwrap_or(0),
            Axis2::Y => sizes.sum(),
        }
    }

    /// Returns the largest height no greater than `height` at which the
    /// pages, stacked vertically, may be broken between rows.
    pub fn best_breakpoint(&self, height: usize) -> usize {
        let mut y = 0;
        for page in &self.pages {
            let size = page.size(Axis2::Y);
            if y + size >= height {
                return page.best_breakpoint(height - y) + y;
            }
            y += size;
        }
        height
    }
}
