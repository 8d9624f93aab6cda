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

//! Column widths, row heights, and rule widths.

use std::iter::once;

use enum_map::EnumMap;
use itertools::interleave;

use crate::{
    geometry::{Axis2, Coord2},
    look::Stroke,
    table::Table,
};

use super::Device;

/// Returns the width of the rule in `table` that is at offset `z` along axis
/// `a`, if rendered on `device`.
pub(super) fn measure_rule(device: &dyn Device, table: &Table, a: Axis2, z: usize) -> usize {
    let params = device.params();

    let mut present = EnumMap::<Stroke, bool>::default();
    for w in 0..table.n[!a] {
        present[table.get_rule(a, Coord2::for_axis((a, z), w)).stroke] = true;
    }

    // [Stroke::None] has no width.  A device without cell margins still needs
    // a gap between adjacent columns, but not at the table's outer edges.
    if std::mem::take(&mut present[Stroke::None])
        && a == Axis2::X
        && !params.supports_margins
        && z > 0
        && z < table.n[a]
    {
        present[Stroke::Solid] = true;
    }

    present
        .iter()
        .filter(|(_, present)| **present)
        .map(|(stroke, _)| params.line_widths[stroke])
        .max()
        .unwrap_or(0)
}

/// Widens the columns in `spanned` so that together they are at least
/// `width` wide, for a cell that spans all of them.
///
/// `unspanned` holds the widths the columns need for cells that span only one
/// column, and `rules` the widths of the `unspanned.len() + 1` rules around
/// and between them.
///
/// Half of the extra width is divided equally among the columns.  The other
/// half is divided in proportion to each column's unspanned width, counting
/// half of each adjoining interior rule.  The shares are exact fractions over
/// a common denominator, with the remainder carried from left to right, so
/// the shares add up to exactly `width`.  The carry starts at half the
/// denominator: the running total of the shares through any column is the
/// exact running total rounded to nearest, with halves rounded up.  No column
/// is ever narrowed.
pub(super) fn distribute_spanned_width(
    width: usize,
    unspanned: &[usize],
    spanned: &mut [usize],
    rules: &[usize],
) {
    let n = unspanned.len();
    if n == 0 {
        return;
    }

    debug_assert_eq!(spanned.len(), n);
    debug_assert_eq!(rules.len(), n + 1);

    let total_unspanned =
        unspanned.iter().sum::<usize>() + rules[1..n].iter().copied().sum::<usize>();
    if total_unspanned >= width {
        return;
    }

    // Signed, because a column that is already wider than its share drives
    // the carry below zero.
    let width = width as i128;
    let total = total_unspanned as i128;
    let d0 = n as i128;
    let d1 = 2 * total.max(1);
    let d = if total > 0 { 2 * d0 * d1 } else { d0 * d1 };

    let mut carry = d / 2;
    for x in 0..n {
        carry += width * d1;
        if total > 0 {
            let left = if x > 0 { rules[x] } else { 0 };
            let right = if x + 1 < n { rules[x + 1] } else { 0 };
            let weight = 2 * unspanned[x] + left + right;
            carry += width * weight as i128 * d0;
        }
        let share = (carry / d).max(spanned[x] as i128);
        spanned[x] = share as usize;
        carry -= share * d;
    }
}

/// Chooses column widths between `min` and `max` so that, with the rules,
/// the table is exactly `target` wide.  `w_min` and `w_max` are the table's
/// total widths at the minimum and maximum column widths (rules included),
/// with `w_min <= target < w_max`.
///
/// Each column gets its minimum plus a share of the leftover space
/// proportional to how much more it would like, with the fractional part
/// carried to the next column.
pub(super) fn interpolate_widths(
    min: &[usize],
    max: &[usize],
    w_min: usize,
    w_max: usize,
    target: usize,
) -> Vec<usize> {
    debug_assert!(w_min <= target && target < w_max);
    let avail = target - w_min;
    let wanted = w_max - w_min;
    let mut carry = wanted / 2;
    min.iter()
        .zip(max)
        .map(|(&lo, &hi)| {
            carry += avail * (hi - lo);
            let extra = carry / wanted;
            carry -= extra * wanted;
            lo + extra
        })
        .collect()
}

/// Builds "cell positions" from cell widths `cells` and the widths of the
/// `cells.len() + 1` rules around them: `0`, then the position after the
/// first rule, then after the first cell, and so on through the total.
pub(super) fn accumulate(cells: &[usize], rules: &[usize]) -> Vec<usize> {
    debug_assert_eq!(rules.len(), cells.len() + 1);
    once(0)
        .chain(interleave(rules, cells).scan(0, |total, width| {
            *total += *width;
            Some(*total)
        }))
        .collect()
}
