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

//! Table layout and pagination.
//!
//! A [Table](table::Table) is a grid of cells, some of which span several
//! rows or columns, with styled rules between them and optional header rows
//! and columns on each side.  [render::Pager] lays out a [TableItem] (a table
//! plus its title, layers, caption, and footnotes) for a
//! [Device](render::Device) and breaks it into page-sized chunks, repeating
//! headers on every chunk and splitting cells that are too big for one page.
//!
//! [TableItem]: item::TableItem

pub mod config;
pub mod geometry;
pub mod item;
pub mod look;
pub mod render;
pub mod table;
pub mod value;
