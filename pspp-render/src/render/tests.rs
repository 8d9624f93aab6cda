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

use std::{fmt::Display, sync::Arc};

use enum_map::{EnumMap, enum_map};
use rand::{Rng, SeedableRng, rngs::StdRng};
use unicode_width::UnicodeWidthStr;

use crate::{
    geometry::{Axis2, Coord2, Rect2},
    item::TableItem,
    look::{Area, BorderStyle, HeadingRegion, HorzAlign, Look, Stroke},
    table::{CellInner, DrawCell, Table},
    value::ValueOptions,
};

use super::{Break, Device, Extreme, Page, Pager, Params};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn assert_lines_eq<E, A>(expected: &str, expected_name: E, actual: &str, actual_name: A)
where
    E: Display,
    A: Display,
{
    if expected != actual {
        eprintln!("Unexpected output:\n--- {expected_name}\n+++ {actual_name}");
        for result in diff::lines(expected, actual) {
            let (prefix, line) = match result {
                diff::Result::Left(line) => ('-', line),
                diff::Result::Both(line, _) => (' ', line),
                diff::Result::Right(line) => ('+', line),
            };
            let suffix = if line.trim_end().len() != line.len() {
                "$"
            } else {
                ""
            };
            eprintln!("{prefix}{line}{suffix}");
        }
        panic!();
    }
}

fn assert_rendering(name: &str, actual: &str, expected: &str) {
    assert_lines_eq(
        expected,
        format!("{name} expected"),
        actual,
        format!("{name} actual"),
    );
}

/// Breaks `text` into lines no wider than `width`, at spaces and new-lines.
/// A word wider than `width` gets a line of its own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if !line.is_empty() && line.width() + 1 + word.width() > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

/// A device that draws on a grid of characters, one character per unit.
struct TestDevice {
    params: Params,
    lines: Vec<Vec<char>>,
    scales: Vec<f64>,

    /// If set, cells may only be broken vertically at multiples of this many
    /// lines.
    line_step: Option<usize>,

    /// Each cell drawn, with whether it was drawn as an alternate row.
    cells: Vec<(String, bool)>,
}

impl TestDevice {
    fn new(width: usize, length: usize) -> Self {
        Self {
            params: Params {
                size: Coord2::new(width, length),
                font_size: Axis2::new_enum(1, 1),
                line_widths: EnumMap::from_fn(|stroke| if stroke == Stroke::None { 0 } else { 1 }),
                px_size: None,
                min_break: Axis2::new_enum(width / 2, length / 2),
                supports_margins: true,
                rtl: false,
                printing: false,
                can_adjust_break: false,
                can_scale: false,
            },
            lines: Vec::new(),
            scales: Vec::new(),
            line_step: None,
            cells: Vec::new(),
        }
    }

    fn put(&mut self, x: isize, y: isize, c: char) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if self.lines.len() <= y {
            self.lines.resize(y + 1, Vec::new());
        }
        let line = &mut self.lines[y];
        if line.len() <= x {
            line.resize(x + 1, ' ');
        }
        line[x] = c;
    }

    /// Returns what has been drawn so far and clears the canvas.
    fn take(&mut self) -> String {
        let mut s = String::new();
        for line in std::mem::take(&mut self.lines) {
            let line = line.into_iter().collect::<String>();
            s.push_str(line.trim_end());
            s.push('\n');
        }
        s
    }
}

impl Device for TestDevice {
    fn params(&self) -> &Params {
        &self.params
    }

    fn measure_cell_width(&self, cell: &DrawCell) -> EnumMap<Extreme, usize> {
        let text = cell.display().to_string();
        enum_map! {
            Extreme::Min => text.split_whitespace().map(|word| word.width()).max().unwrap_or(0),
            Extreme::Max => text.split('\n').map(|line| line.width()).max().unwrap_or(0),
        }
    }

    fn measure_cell_height(&self, cell: &DrawCell, width: usize) -> usize {
        let text = cell.display().to_string();
        if text.is_empty() {
            0
        } else {
            wrap(&text, width).len()
        }
    }

    fn adjust_break(&self, _cell: &DrawCell, _width: usize, height: usize) -> usize {
        match self.line_step {
            Some(step) => height / step * step,
            None => height,
        }
    }

    fn draw_line(&mut self, bb: Rect2<isize>, styles: EnumMap<Axis2, [BorderStyle; 2]>) {
        let vertical = styles[Axis2::X].iter().any(|style| !style.is_none());
        let horizontal = styles[Axis2::Y].iter().any(|style| !style.is_none());
        let c = match (vertical, horizontal) {
            (true, true) => '+',
            (true, false) => '|',
            (false, true) => '-',
            (false, false) => return,
        };
        for y in bb[Axis2::Y].clone() {
            for x in bb[Axis2::X].clone() {
                self.put(x, y, c);
            }
        }
    }

    fn draw_cell(
        &mut self,
        cell: &DrawCell,
        alternate_row: bool,
        bb: Rect2<isize>,
        valign_offset: usize,
        _spill: EnumMap<Axis2, [usize; 2]>,
        clip: &Rect2<isize>,
    ) {
        let text = cell.display().to_string();
        self.cells.push((text.clone(), alternate_row));
        let width = bb.len(Axis2::X);
        for (i, line) in wrap(&text, width as usize).iter().enumerate() {
            let y = bb[Axis2::Y].start + (valign_offset + i) as isize;
            let extra = width - line.width() as isize;
            let x0 = bb[Axis2::X].start
                + match cell.horz_align() {
                    HorzAlign::Left => 0,
                    HorzAlign::Right => extra,
                    HorzAlign::Center => extra / 2,
                };
            for (x, c) in (x0..).zip(line.chars()) {
                if clip[Axis2::X].contains(&x) && clip[Axis2::Y].contains(&y) {
                    self.put(x, y, c);
                }
            }
        }
    }

    fn scale(&mut self, factor: f64) {
        self.scales.push(factor);
    }
}

/// Makes a table with a cell for each of `rows` and solid rules everywhere.
fn grid_table(rows: &[&[&str]], headers: EnumMap<Axis2, [usize; 2]>) -> Table {
    let n = Coord2::new(rows[0].len(), rows.len());
    let mut table = Table::new(n, headers, Look::default().areas, ValueOptions::default());
    table.draw_grid(BorderStyle::solid());
    for (y, row) in rows.iter().enumerate() {
        for (x, text) in row.iter().enumerate() {
            table.put(
                Rect2::for_cell(Coord2::new(x, y)),
                CellInner::new(Area::Data, *text),
            );
        }
    }
    table
}

fn no_headers() -> EnumMap<Axis2, [usize; 2]> {
    EnumMap::default()
}

/// Renders `item` a page at a time, returning each page.
fn paginate(device: &mut TestDevice, item: &TableItem) -> Vec<String> {
    let mut pager = Pager::new(&*device, item);
    let length = device.params.size[Axis2::Y];
    let mut pages = Vec::new();
    while pager.has_next(&*device) {
        pager.draw_next(device, length);
        pages.push(device.take());
        assert!(pages.len() < 1000, "pagination does not terminate");
    }
    pages
}

/// Breaks `page` along `axis` into pieces no bigger than `size`, except for
/// pieces that cannot be made that small.
fn break_all(page: Arc<Page>, axis: Axis2, device: &TestDevice, size: usize) -> Vec<Arc<Page>> {
    let mut b = Break::new(page, axis);
    let mut pieces = Vec::new();
    while b.has_next() {
        pieces.push(b.next(device, size).or_else(|| b.force_next()).unwrap());
        assert!(pieces.len() < 1000, "breaking does not terminate");
    }
    pieces
}

#[test]
fn simple_fit() {
    init_logging();
    let row: &[&str] = &["abcdefghij", "klmnopqrst", "uvwxyzabcd"];
    let table = Arc::new(grid_table(&[row, row, row], no_headers()));
    let mut device = TestDevice::new(40, 100);

    let page = Page::new(table.clone(), &device, 0, &Look::default());
    assert_eq!(page.cp(Axis2::X), &[0, 1, 11, 12, 22, 23, 33, 34]);
    assert_eq!(page.cp(Axis2::Y), &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(page.size(Axis2::X), 34);

    let pages = paginate(&mut device, &TableItem::new(table));
    assert_eq!(pages.len(), 1);
    assert_rendering(
        "simple_fit",
        &pages[0],
        "\
+----------+----------+----------+
|abcdefghij|klmnopqrst|uvwxyzabcd|
+----------+----------+----------+
|abcdefghij|klmnopqrst|uvwxyzabcd|
+----------+----------+----------+
|abcdefghij|klmnopqrst|uvwxyzabcd|
+----------+----------+----------+
",
    );
}

#[test]
fn forced_break() {
    init_logging();
    let table = Arc::new(grid_table(
        &[&["abcdefghij", "klmnopqrst", "uvwxyzabcd"]],
        no_headers(),
    ));
    let mut device = TestDevice::new(23, 100);

    let page = Arc::new(Page::new(table.clone(), &device, 0, &Look::default()));
    let slices = break_all(page, Axis2::X, &device, 23);
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].body(Axis2::X), 0..2);
    assert_eq!(slices[0].cp(Axis2::X), &[0, 1, 11, 12, 22, 23]);
    assert_eq!(slices[1].body(Axis2::X), 2..3);
    assert_eq!(slices[1].cp(Axis2::X), &[0, 1, 11, 12]);
    for slice in &slices {
        assert_eq!(slice.is_edge_cutoff(Axis2::X), [false, false]);
        assert!(slice.overflows().is_empty());
    }

    let pages = paginate(&mut device, &TableItem::new(table));
    assert_eq!(pages.len(), 2);
    assert_rendering(
        "forced_break 1",
        &pages[0],
        "\
+----------+----------+
|abcdefghij|klmnopqrst|
+----------+----------+
",
    );
    assert_rendering(
        "forced_break 2",
        &pages[1],
        "\
+----------+
|uvwxyzabcd|
+----------+
",
    );
}

#[test]
fn pixel_split() {
    init_logging();
    let text = "a".repeat(30);
    let table = Arc::new(grid_table(&[&[&text]], no_headers()));
    let mut device = TestDevice::new(20, 100);

    let page = Arc::new(Page::new(table.clone(), &device, 0, &Look::default()));
    assert_eq!(page.cp(Axis2::X), &[0, 1, 31, 32]);
    let slices = break_all(page, Axis2::X, &device, 20);
    assert_eq!(slices.len(), 2);

    assert_eq!(slices[0].cp(Axis2::X), &[0, 1, 20, 20]);
    assert_eq!(slices[0].is_edge_cutoff(Axis2::X), [false, true]);
    let overflow = &slices[0].overflows()[&Coord2::new(0, 0)];
    assert_eq!(overflow.region, Rect2::new(0..1, 0..1));
    assert_eq!(overflow.trim[Axis2::X], [0, 11]);
    assert_eq!(overflow.trim[Axis2::Y], [0, 0]);

    assert_eq!(slices[1].cp(Axis2::X), &[0, 0, 11, 12]);
    assert_eq!(slices[1].is_edge_cutoff(Axis2::X), [true, false]);
    assert_eq!(slices[1].overflows()[&Coord2::new(0, 0)].trim[Axis2::X], [19, 0]);

    let pages = paginate(&mut device, &TableItem::new(table));
    assert_eq!(pages.len(), 2);
    assert_rendering(
        "pixel_split 1",
        &pages[0],
        "\
+-------------------
|aaaaaaaaaaaaaaaaaaa
+-------------------
",
    );
    assert_rendering(
        "pixel_split 2",
        &pages[1],
        "\
-----------+
aaaaaaaaaaa|
-----------+
",
    );
}

#[test]
fn spanning_cell() {
    init_logging();
    let mut table = grid_table(&[&["", ""], &["bbbbbbbbbb", "cccccccccc"]], no_headers());
    table.put(
        Rect2::new(0..2, 0..1),
        CellInner::new(Area::Data, "a".repeat(25)),
    );
    let device = TestDevice::new(100, 100);

    let page = Page::new(Arc::new(table), &device, 0, &Look::default());
    assert_eq!(page.cp(Axis2::X), &[0, 1, 14, 15, 27, 28]);
    assert_eq!(page.join_crossing(Axis2::X), &[0, 1, 0]);
    assert_eq!(page.join_crossing(Axis2::Y), &[0, 0, 0]);
}

#[test]
fn spanning_cell_broken_between_columns() {
    init_logging();
    let mut table = grid_table(
        &[&["", "", ""], &["bbbbbbbbbb", "cccccccccc", "dddddddddd"]],
        no_headers(),
    );
    table.put(
        Rect2::new(0..2, 0..1),
        CellInner::new(Area::Data, "aaaa"),
    );
    let mut device = TestDevice::new(23, 100);
    device.params.min_break[Axis2::X] = 100;

    let page = Arc::new(Page::new(Arc::new(table), &device, 0, &Look::default()));
    let slices = break_all(page, Axis2::X, &device, 12);
    assert_eq!(slices.len(), 3);
    let trims = slices
        .iter()
        .map(|slice| {
            slice
                .overflows()
                .get(&Coord2::new(0, 0))
                .map(|overflow| overflow.trim[Axis2::X])
        })
        .collect::<Vec<_>>();
    assert_eq!(trims, [Some([0, 11]), Some([11, 0]), None]);
}

#[test]
fn select_whole_body_is_identity() {
    let table = Arc::new(grid_table(&[&["a", "b"], &["c", "d"]], no_headers()));
    let device = TestDevice::new(100, 100);
    let page = Arc::new(Page::new(table, &device, 0, &Look::default()));
    for axis in [Axis2::X, Axis2::Y] {
        let selected = page.select(axis, page.body(axis), 0, 0);
        assert!(Arc::ptr_eq(&page, &selected));
    }
}

#[test]
fn shrink_to_fit_width() {
    init_logging();
    let text = "a".repeat(28);
    let look =
        Look::default().with_shrink_to_fit(enum_map! { Axis2::X => true, Axis2::Y => false });
    let item = TableItem::new(grid_table(&[&[&text]], no_headers())).with_look(look);
    let mut device = TestDevice::new(20, 100);
    device.params.can_scale = true;

    let mut pager = Pager::new(&device, &item);
    assert!((pager.scale() - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(pager.size(Axis2::X), 30);

    // The body's 3 rows of characters take 2 rows when scaled.
    assert_eq!(pager.draw_next(&mut device, 10), 2);
    assert_eq!(device.scales, [pager.scale()]);
    assert!(!pager.has_next(&device));
}

#[test]
fn shrink_to_fit_length() {
    let rows = vec![["a"].as_slice(); 10];
    let look =
        Look::default().with_shrink_to_fit(enum_map! { Axis2::X => false, Axis2::Y => true });
    let item = TableItem::new(grid_table(&rows, no_headers())).with_look(look);
    let mut device = TestDevice::new(20, 7);
    device.params.can_scale = true;

    let pager = Pager::new(&device, &item);
    assert_eq!(pager.size(Axis2::Y), 21);
    assert!((pager.scale() - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn no_scaling_without_device_support() {
    let text = "a".repeat(28);
    let look = Look::default().with_shrink_to_fit(enum_map! { Axis2::X => true, Axis2::Y => true });
    let item = TableItem::new(grid_table(&[&[&text]], no_headers())).with_look(look);
    let device = TestDevice::new(20, 100);

    let pager = Pager::new(&device, &item);
    assert_eq!(pager.scale(), 1.0);
}

#[test]
fn column_headers_repeat() {
    init_logging();
    let headers = enum_map! { Axis2::X => [1, 0], Axis2::Y => [0, 0] };
    let table = grid_table(&[&["hh", "abcdefghij", "klmnopqrst"]], headers);
    let mut device = TestDevice::new(16, 100);
    device.params.min_break[Axis2::X] = 100;

    let pages = paginate(&mut device, &TableItem::new(table));
    assert_eq!(pages.len(), 2);
    assert_rendering(
        "column_headers_repeat 1",
        &pages[0],
        "\
+--+----------+
|hh|abcdefghij|
+--+----------+
",
    );
    assert_rendering(
        "column_headers_repeat 2",
        &pages[1],
        "\
+--+----------+
|hh|klmnopqrst|
+--+----------+
",
    );
}

#[test]
fn headers_dropped_when_too_big() {
    let headers = enum_map! { Axis2::X => [1, 0], Axis2::Y => [0, 0] };
    let table = Arc::new(grid_table(&[&["hhhhhhhh", "abcdefghij"]], headers));
    let device = TestDevice::new(16, 100);

    let page = Page::new(table, &device, 0, &Look::default());
    assert_eq!(page.headers(Axis2::X), [0, 0]);
    assert_eq!(page.body(Axis2::X), 0..2);
}

#[test]
fn row_headers_repeat() {
    init_logging();
    let headers = enum_map! { Axis2::X => [0, 0], Axis2::Y => [1, 0] };
    let table = grid_table(&[&["head"], &["r1"], &["r2"], &["r3"], &["r4"]], headers);
    let mut device = TestDevice::new(20, 9);

    let mut pager = Pager::new(&device, &TableItem::new(table));

    // Too little space to draw anything.
    assert_eq!(pager.draw_next(&mut device, 2), 0);
    assert!(pager.has_next(&device));

    assert_eq!(pager.draw_next(&mut device, 9), 9);
    assert_rendering(
        "row_headers_repeat 1",
        &device.take(),
        "\
+----+
|head|
+----+
|r1  |
+----+
|r2  |
+----+
|r3  |
+----+
",
    );
    assert_eq!(pager.draw_next(&mut device, 9), 5);
    assert_rendering(
        "row_headers_repeat 2",
        &device.take(),
        "\
+----+
|head|
+----+
|r4  |
+----+
",
    );
    assert!(!pager.has_next(&device));
}

#[test]
fn best_breakpoint() {
    let table = grid_table(&[&["a"], &["b"], &["c"], &["d"], &["e"]], no_headers());
    let device = TestDevice::new(20, 100);
    let page = Page::new(Arc::new(table), &device, 0, &Look::default());
    assert_eq!(page.best_breakpoint(2), 0);
    assert_eq!(page.best_breakpoint(6), 5);
    assert_eq!(page.best_breakpoint(100), 100);

    let pager = Pager::new(&device, &TableItem::new(grid_table(&[&["a"], &["b"]], no_headers())));
    assert_eq!(pager.best_breakpoint(4), 3);
}

#[test]
fn right_to_left() {
    let table = grid_table(&[&["ab", "cd"]], no_headers());
    let mut device = TestDevice::new(20, 100);
    device.params.rtl = true;

    let pages = paginate(&mut device, &TableItem::new(table));
    assert_rendering(
        "right_to_left",
        &pages[0],
        "\
+--+--+
|cd|ab|
+--+--+
",
    );
}

#[test]
fn title_above_body() {
    let item = TableItem::new(grid_table(&[&["abcdefghij"]], no_headers())).with_title("Title");
    let mut device = TestDevice::new(40, 100);

    let mut pager = Pager::new(&device, &item);
    assert_eq!(pager.draw_next(&mut device, 100), 4);
    assert!(!pager.has_next(&device));
    assert_rendering(
        "title_above_body",
        &device.take(),
        concat!(
            "   Title\n",
            "+----------+\n",
            "|abcdefghij|\n",
            "+----------+\n"
        ),
    );
}

#[test]
fn draw_region_clips_rows() {
    let item = TableItem::new(grid_table(&[&["a"], &["b"], &["c"]], no_headers()));
    let mut device = TestDevice::new(20, 100);
    let pager = Pager::new(&device, &item);

    pager.draw_region(&mut device, &Rect2::new(0..usize::MAX, 2..5));
    assert_rendering(
        "draw_region_clips_rows",
        &device.take(),
        "\n\n+-+\n|b|\n+-+\n",
    );

    pager.draw_region(&mut device, &Rect2::new(0..usize::MAX, 3..4));
    assert_rendering("draw_region_clips_rows", &device.take(), "\n\n\n|b|\n");

    pager.draw(&mut device);
    assert_eq!(device.take().lines().count(), 7);
}

#[test]
fn oversize_cell_is_not_lost() {
    init_logging();
    let table = grid_table(&[&["abcdefghijklmnopqrstuvwxyz"]], no_headers());
    let mut device = TestDevice::new(10, 100);
    device.params.min_break[Axis2::X] = 100;

    let pages = paginate(&mut device, &TableItem::new(table));
    assert_rendering(
        "oversize_cell_is_not_lost",
        &pages.concat(),
        "\
+--------------------------+
|abcdefghijklmnopqrstuvwxyz|
+--------------------------+
",
    );
}

#[test]
fn heading_width_ranges() {
    let headers = enum_map! { Axis2::X => [1, 0], Axis2::Y => [0, 0] };
    let table = grid_table(&[&["hh", "abc"]], headers);
    let mut device = TestDevice::new(100, 100);
    device.params.px_size = Some(1);
    let look = Look::default().with_heading_widths(enum_map! {
        HeadingRegion::Rows => 5..=6,
        HeadingRegion::Columns => 0..=1,
    });

    let page = Page::new(Arc::new(table), &device, 0, &look);
    // The row heading is widened to 5, the data cell is unaffected.
    assert_eq!(page.cp(Axis2::X), &[0, 1, 6, 7, 10, 11]);
}

#[test]
fn minimum_width() {
    let table = grid_table(&[&["ab", "cd"]], no_headers());
    let device = TestDevice::new(100, 100);
    let page = Page::new(Arc::new(table), &device, 21, &Look::default());
    // The columns themselves add up to the minimum width.
    assert_eq!(page.cp(Axis2::X), &[0, 1, 12, 13, 23, 24]);
}

#[test]
fn minimum_width_weighted_by_unspanned_widths() {
    let mut table = grid_table(&[&["", ""], &["bbbbbbbbbb", "cc"]], no_headers());
    table.put(
        Rect2::new(0..2, 0..1),
        CellInner::new(Area::Data, "a".repeat(30)),
    );
    let device = TestDevice::new(100, 100);
    let page = Page::new(Arc::new(table), &device, 40, &Look::default());
    // The spanning cell splits 30 as 20 and 10, but the extra width goes by
    // the 10 and 2 that the columns need on their own.
    assert_eq!(page.cp(Axis2::X), &[0, 1, 27, 28, 42, 43]);
}

#[test]
fn gap_between_columns_without_margins() {
    let mut table = Table::new(
        Coord2::new(2, 1),
        no_headers(),
        Look::default().areas,
        ValueOptions::default(),
    );
    table.put(Rect2::for_cell(Coord2::new(0, 0)), CellInner::new(Area::Data, "a"));
    table.put(Rect2::for_cell(Coord2::new(1, 0)), CellInner::new(Area::Data, "b"));
    let table = Arc::new(table);

    let mut device = TestDevice::new(100, 100);
    let page = Page::new(table.clone(), &device, 0, &Look::default());
    assert_eq!(page.cp(Axis2::X), &[0, 0, 1, 1, 2, 2]);

    // Only the rule between the columns gets a gap, not the outer edges or
    // the rules between rows.
    device.params.supports_margins = false;
    let page = Page::new(table, &device, 0, &Look::default());
    assert_eq!(page.cp(Axis2::X), &[0, 0, 1, 2, 3, 3]);
    assert_eq!(page.cp(Axis2::Y), &[0, 0, 1, 1]);
    page.draw(&mut device, Coord2::new(0, 0));
    assert_eq!(device.take(), "a b\n");
}

#[test]
fn break_between_lines() {
    init_logging();
    let text = vec!["x"; 20].join("\n");
    let table = Arc::new(grid_table(&[&[text.as_str()]], no_headers()));
    let mut device = TestDevice::new(10, 11);

    let page = Arc::new(Page::new(table, &device, 0, &Look::default()));
    assert_eq!(page.cp(Axis2::Y), &[0, 1, 21, 22]);
    let sizes = |pieces: &[Arc<Page>]| {
        pieces
            .iter()
            .map(|piece| piece.size(Axis2::Y))
            .collect::<Vec<_>>()
    };

    // Without help from the device, each piece is filled to the limit.
    let pieces = break_all(page.clone(), Axis2::Y, &device, 11);
    assert_eq!(sizes(&pieces), [11, 11]);

    // The device only allows breaks every 4 lines.
    device.params.can_adjust_break = true;
    device.line_step = Some(4);
    let pieces = break_all(page, Axis2::Y, &device, 11);
    assert_eq!(sizes(&pieces), [9, 8, 5]);
    assert_eq!(pieces[0].cp(Axis2::Y), &[0, 1, 9, 9]);
    assert_eq!(pieces[1].cp(Axis2::Y), &[0, 0, 8, 8]);
    assert_eq!(pieces[2].cp(Axis2::Y), &[0, 0, 4, 5]);
    let trims = pieces
        .iter()
        .map(|piece| piece.overflows()[&Coord2::new(0, 0)].trim[Axis2::Y])
        .collect::<Vec<_>>();
    assert_eq!(trims, [[0, 12], [8, 4], [16, 0]]);
}

#[test]
fn alternate_rows_continue_across_pages() {
    init_logging();
    let mut headers = no_headers();
    headers[Axis2::Y] = [1, 0];
    let table = Arc::new(grid_table(
        &[&["h"], &["r1"], &["r2"], &["r3"], &["r4"]],
        headers,
    ));
    let mut device = TestDevice::new(10, 9);

    let page = Arc::new(Page::new(table, &device, 0, &Look::default()));
    page.draw(&mut device, Coord2::new(0, 0));
    let expected = [
        ("h", false),
        ("r1", false),
        ("r2", true),
        ("r3", false),
        ("r4", true),
    ];
    let expected = expected.map(|(text, alternate)| (String::from(text), alternate));
    assert_eq!(std::mem::take(&mut device.cells), expected);

    let pieces = break_all(page, Axis2::Y, &device, 9);
    assert_eq!(pieces.len(), 2);
    pieces[0].draw(&mut device, Coord2::new(0, 0));
    assert_eq!(std::mem::take(&mut device.cells), expected[..4]);
    pieces[1].draw(&mut device, Coord2::new(0, 0));
    assert_eq!(
        std::mem::take(&mut device.cells),
        [expected[0].clone(), expected[4].clone()]
    );
}

#[test]
fn pixel_split_with_headers_on_both_sides() {
    init_logging();
    let mut headers = no_headers();
    headers[Axis2::X] = [1, 1];
    let b = "b".repeat(10);
    let c = "c".repeat(20);
    let mut table = grid_table(
        &[&["h", "", "", "t"], &["h", b.as_str(), c.as_str(), "t"]],
        headers,
    );
    table.put(Rect2::new(1..3, 0..1), CellInner::new(Area::Data, "aaaa"));
    let device = TestDevice::new(28, 100);

    let page = Arc::new(Page::new(Arc::new(table), &device, 0, &Look::default()));
    assert_eq!(page.cp(Axis2::X), &[0, 1, 2, 3, 13, 14, 34, 35, 36, 37]);
    assert_eq!(page.join_crossing(Axis2::X), &[0, 0, 1, 0, 0]);

    let slices = break_all(page.clone(), Axis2::X, &device, 28);
    assert_eq!(slices.len(), 2);
    let trims = |slice: &Page, coord: Coord2| slice.overflows()[&coord].trim[Axis2::X];

    assert_eq!(slices[0].cp(Axis2::X), &[0, 1, 2, 3, 13, 14, 25, 26, 27, 28]);
    assert_eq!(trims(&slices[0], Coord2::new(1, 0)), [0, 9]);
    assert_eq!(trims(&slices[0], Coord2::new(2, 1)), [0, 9]);

    // The rest of the "c" column is widened to make room for the rule that
    // the spanning cell crosses, and that room counts as visible.
    assert_eq!(slices[1].cp(Axis2::X), &[0, 1, 2, 3, 13, 14, 15, 16]);
    assert_eq!(slices[1].is_edge_cutoff(Axis2::X), [false, false]);
    assert_eq!(trims(&slices[1], Coord2::new(1, 0)), [21, 0]);
    assert_eq!(trims(&slices[1], Coord2::new(1, 1)), [10, 0]);

    for slice in &slices {
        check_cp(slice);
        check_overflows(&page, slice);
    }
}

/// Generates a table with random content, joined cells in the body, and
/// possibly leading and trailing headers on each axis.
fn random_table(rng: &mut StdRng) -> Table {
    use Axis2::*;

    let n = Coord2::new(rng.random_range(1..7), rng.random_range(1..7));
    let headers = EnumMap::from_fn(|axis| {
        let h0 = if n[axis] > 1 { rng.random_range(0..2) } else { 0 };
        let h1 = if n[axis] > h0 + 1 { rng.random_range(0..2) } else { 0 };
        [h0, h1]
    });
    let body = EnumMap::from_fn(|axis: Axis2| headers[axis][0]..n[axis] - headers[axis][1]);
    let mut table = Table::new(n, headers, Look::default().areas, ValueOptions::default());
    table.draw_grid(BorderStyle::solid());

    let mut filled = vec![vec![false; n.y()]; n.x()];
    for y in 0..n.y() {
        for x in 0..n.x() {
            if filled[x][y] {
                continue;
            }
            let mut rect = Rect2::for_cell(Coord2::new(x, y));
            if body[X].contains(&x) && body[Y].contains(&y) && rng.random_bool(0.3) {
                let span = Coord2::new(rng.random_range(1..4), rng.random_range(1..4));
                while rect[X].end < body[X].end
                    && rect[X].len() < span[X]
                    && !filled[rect[X].end][y]
                {
                    rect[X].end += 1;
                }
                while rect[Y].end < body[Y].end
                    && rect[Y].len() < span[Y]
                    && rect[X].clone().all(|x| !filled[x][rect[Y].end])
                {
                    rect[Y].end += 1;
                }
            }
            for x in rect[X].clone() {
                for y in rect[Y].clone() {
                    filled[x][y] = true;
                }
            }

            let words = (0..rng.random_range(1..4))
                .map(|_| "x".repeat(rng.random_range(1..9)))
                .collect::<Vec<_>>();
            table.put(rect, CellInner::new(Area::Data, words.join(" ")));
        }
    }
    table
}

/// Maps position `z` along `axis` in `page` to a table position.
fn to_table(page: &Page, axis: Axis2, z: usize) -> usize {
    let [h0, h1] = page.headers(axis);
    let n = page.n()[axis];
    let table = page.table();
    if z < h0 {
        z
    } else if z < n - h1 {
        z - h0 + page.body(axis).start
    } else {
        z - (n - h1) + (table.n[axis] - table.h[axis][1])
    }
}

fn check_cp(page: &Page) {
    for axis in [Axis2::X, Axis2::Y] {
        let cp = page.cp(axis);
        assert_eq!(cp.len(), 2 * page.n()[axis] + 2);
        assert_eq!(cp[0], 0);
        assert!(cp.windows(2).all(|w| w[0] <= w[1]), "{cp:?} decreases");
    }
}

/// Checks that, for every cell that doesn't fit in `fragment`, the part that
/// is visible plus the part trimmed off adds up to the whole cell in `full`.
fn check_overflows(full: &Page, fragment: &Page) {
    for overflow in fragment.overflows().values() {
        let coord = Coord2::from_fn(|axis| to_table(fragment, axis, overflow.region[axis].start));
        let rect = fragment.table().get(coord).rect();
        for axis in [Axis2::X, Axis2::Y] {
            let visible = fragment.joined_width(axis, overflow.region[axis].clone());
            let whole = full.joined_width(axis, rect[axis].clone());
            match overflow.trim[axis] {
                // Room for a join crossing can make an untrimmed cell wider.
                [0, 0] => assert!(
                    visible >= whole,
                    "cell {rect:?} along {axis:?}: {overflow:?}"
                ),
                [trim0, trim1] => assert_eq!(
                    visible + trim0 + trim1,
                    whole,
                    "cell {rect:?} along {axis:?}: {overflow:?}"
                ),
            }
        }
    }
}

/// Checks that `pieces`, broken out of `page` along `axis`, cover its body
/// in order, overlapping only where a cell was split between two pieces.
fn check_coverage(page: &Page, pieces: &[Arc<Page>], axis: Axis2) {
    let body = page.body(axis);
    if body.is_empty() {
        assert!(pieces.is_empty());
        return;
    }
    let mut next = body.start;
    for (index, piece) in pieces.iter().enumerate() {
        let range = piece.body(axis);
        // A piece that continues a cell split by the previous piece starts
        // one cell early.  With trailing headers, the previous piece's edge
        // is not cut off even so.
        assert!(
            range.start == next || (index > 0 && range.start + 1 == next),
            "piece {index} along {axis:?} starts at {} after {next}",
            range.start
        );
        assert!(range.start < range.end);
        next = range.end;
    }
    assert_eq!(next, body.end);
}

#[test]
fn random_breaks() {
    init_logging();
    for seed in 0..400 {
        let mut rng = StdRng::seed_from_u64(seed);
        let table = Arc::new(random_table(&mut rng));
        let width = rng.random_range(4..40);
        let length = rng.random_range(4..30);
        let mut device = TestDevice::new(width, length);
        device.params.min_break = Axis2::new_enum(rng.random_range(0..8), rng.random_range(0..4));

        let page = Arc::new(Page::new(table, &device, 0, &Look::default()));
        check_cp(&page);
        let slices = break_all(page.clone(), Axis2::X, &device, width);
        check_coverage(&page, &slices, Axis2::X);
        for slice in &slices {
            check_cp(slice);
            check_overflows(&page, slice);
            let fragments = break_all(slice.clone(), Axis2::Y, &device, length);
            check_coverage(slice, &fragments, Axis2::Y);
            for fragment in &fragments {
                check_cp(fragment);
                check_overflows(&page, fragment);
            }
        }
    }
}

#[test]
fn random_pagination_terminates() {
    for seed in 0..100 {
        let mut rng = StdRng::seed_from_u64(seed);
        let item = TableItem::new(random_table(&mut rng)).with_title("A title for the table");
        let mut device = TestDevice::new(rng.random_range(4..40), rng.random_range(4..30));
        device.params.min_break = Axis2::new_enum(rng.random_range(0..8), rng.random_range(0..4));
        let pages = paginate(&mut device, &item);
        assert!(!pages.is_empty());
    }
}
