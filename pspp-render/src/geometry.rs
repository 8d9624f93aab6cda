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

//! Two-dimensional geometry shared by tables, pages, and devices.

use std::ops::{Add, Index, IndexMut, Not, Range, Sub};

use enum_map::{enum_map, Enum, EnumMap};
use serde::{Deserialize, Serialize};

/// An axis of a 2-dimensional table.
#[derive(Copy, Clone, Debug, Enum, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis2 {
    X,
    Y,
}

impl Axis2 {
    pub fn new_enum<T>(x: T, y: T) -> EnumMap<Axis2, T> {
        EnumMap::from_array([x, y])
    }
}

impl Not for Axis2 {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// A 2-dimensional `(x,y)` pair of cell indexes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coord2(pub EnumMap<Axis2, usize>);

impl Coord2 {
    pub fn new(x: usize, y: usize) -> Self {
        use Axis2::*;
        Self(enum_map! {
            X => x,
            Y => y
        })
    }

    /// Returns a coordinate with `az` along axis `a` and `bz` along the other
    /// axis.
    pub fn for_axis((a, az): (Axis2, usize), bz: usize) -> Self {
        let mut coord = Self::default();
        coord[a] = az;
        coord[!a] = bz;
        coord
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(Axis2) -> usize,
    {
        Self(EnumMap::from_fn(f))
    }

    pub fn x(&self) -> usize {
        self.0[Axis2::X]
    }

    pub fn y(&self) -> usize {
        self.0[Axis2::Y]
    }
}

impl From<EnumMap<Axis2, usize>> for Coord2 {
    fn from(value: EnumMap<Axis2, usize>) -> Self {
        Self(value)
    }
}

impl Index<Axis2> for Coord2 {
    type Output = usize;

    fn index(&self, index: Axis2) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<Axis2> for Coord2 {
    fn index_mut(&mut self, index: Axis2) -> &mut Self::Output {
        &mut self.0[index]
    }
}

/// A rectangle, as a half-open range along each axis.
///
/// Cell regions within a table use the default `usize`.  Bounding boxes
/// passed to a [Device](crate::render::Device) use `isize`, because a cell
/// that overflows a page fragment extends past the fragment's origin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rect2<T = usize>(pub EnumMap<Axis2, Range<T>>);

impl<T> Rect2<T> {
    pub fn new(x_range: Range<T>, y_range: Range<T>) -> Self {
        Self(EnumMap::from_array([x_range, y_range]))
    }

    pub fn for_ranges((a, a_range): (Axis2, Range<T>), b_range: Range<T>) -> Self
    where
        T: Default,
    {
        let mut ranges = EnumMap::default();
        ranges[a] = a_range;
        ranges[!a] = b_range;
        Self(ranges)
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(Axis2) -> Range<T>,
    {
        Self(EnumMap::from_fn(f))
    }

    pub fn is_empty(&self) -> bool
    where
        T: PartialOrd,
    {
        self[Axis2::X].is_empty() || self[Axis2::Y].is_empty()
    }

    /// Returns the extent along `axis`.
    pub fn len(&self, axis: Axis2) -> T
    where
        T: Copy + Sub<Output = T>,
    {
        self[axis].end - self[axis].start
    }

    pub fn translate(self, offset: EnumMap<Axis2, T>) -> Self
    where
        T: Copy + Add<Output = T>,
    {
        Self::from_fn(|axis| self[axis].start + offset[axis]..self[axis].end + offset[axis])
    }
}

impl Rect2 {
    pub fn for_cell(cell: Coord2) -> Self {
        Self::new(cell.x()..cell.x() + 1, cell.y()..cell.y() + 1)
    }

    pub fn top_left(&self) -> Coord2 {
        Coord2::from_fn(|axis| self[axis].start)
    }

    pub fn contains(&self, coord: Coord2) -> bool {
        self[Axis2::X].contains(&coord.x()) && self[Axis2::Y].contains(&coord.y())
    }
}

impl<T> From<EnumMap<Axis2, Range<T>>> for Rect2<T> {
    fn from(value: EnumMap<Axis2, Range<T>>) -> Self {
        Self(value)
    }
}

impl<T> Index<Axis2> for Rect2<T> {
    type Output = Range<T>;

    fn index(&self, index: Axis2) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> IndexMut<Axis2> for Rect2<T> {
    fn index_mut(&mut self, index: Axis2) -> &mut Self::Output {
        &mut self.0[index]
    }
}
