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

//! The tabular document that a [Pager](crate::render::Pager) renders.

use std::sync::Arc;

use enum_map::EnumMap;

use crate::{
    geometry::{Coord2, Rect2},
    look::{Area, BorderStyle, Look, Stroke},
    table::{CellInner, Table},
    value::{Footnote, Value, ValueOptions},
};

/// A table together with the title, layer labels, caption, and footnotes
/// that are rendered around it.
#[derive(Clone, Debug)]
pub struct TableItem {
    body: Arc<Table>,
    title: Option<Value>,
    layers: Vec<Value>,
    caption: Option<Value>,
    look: Arc<Look>,
    show_title: bool,
    show_caption: bool,

    /// Whether to draw dashed lines where the body has no rules, when
    /// printing.
    show_grid_lines: bool,
}

impl TableItem {
    pub fn new(body: impl Into<Arc<Table>>) -> Self {
        Self {
            body: body.into(),
            title: None,
            layers: Vec::new(),
            caption: None,
            look: Arc::new(Look::default()),
            show_title: true,
            show_caption: true,
            show_grid_lines: false,
        }
    }

    pub fn with_title(self, title: impl Into<Value>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    /// Adds a layer label.  Labels are rendered one per row, in the order
    /// added.
    pub fn with_layer(mut self, layer: impl Into<Value>) -> Self {
        self.layers.push(layer.into());
        self
    }

    pub fn with_caption(self, caption: impl Into<Value>) -> Self {
        Self {
            caption: Some(caption.into()),
            ..self
        }
    }

    pub fn with_look(self, look: impl Into<Arc<Look>>) -> Self {
        Self {
            look: look.into(),
            ..self
        }
    }

    pub fn with_show_title(self, show_title: bool) -> Self {
        Self { show_title, ..self }
    }

    pub fn with_show_caption(self, show_caption: bool) -> Self {
        Self {
            show_caption,
            ..self
        }
    }

    pub fn with_show_grid_lines(self, show_grid_lines: bool) -> Self {
        Self {
            show_grid_lines,
            ..self
        }
    }

    pub fn body(&self) -> &Arc<Table> {
        &self.body
    }

    pub fn look(&self) -> &Look {
        &self.look
    }

    fn value_options(&self) -> ValueOptions {
        ValueOptions {
            footnote_marker_type: self.look.footnote_marker_type,
        }
    }

    /// Creates a table with one column and a row for each of `rows`, styled
    /// as `area`.
    fn create_aux_table<I>(&self, area: Area, rows: I) -> Option<Table>
    where
        I: ExactSizeIterator<Item = Value>,
    {
        if rows.len() == 0 {
            return None;
        }
        let mut table = Table::new(
            Coord2::new(1, rows.len()),
            EnumMap::default(),
            self.look.areas.clone(),
            self.value_options(),
        );
        for (y, row) in rows.enumerate() {
            table.put(
                Rect2::for_cell(Coord2::new(0, y)),
                CellInner::new(area, row),
            );
        }
        Some(table)
    }

    pub fn output_title(&self) -> Option<Table> {
        self.create_aux_table(Area::Title, self.title.iter().cloned())
    }

    pub fn output_layers(&self) -> Option<Table> {
        self.create_aux_table(Area::Layers, self.layers.iter().cloned())
    }

    pub fn output_caption(&self) -> Option<Table> {
        self.create_aux_table(Area::Caption, self.caption.iter().cloned())
    }

    /// Creates a table that lists `footnotes`, one per row, as the marker
    /// followed by the content.
    pub fn output_footnotes(&self, footnotes: &[Arc<Footnote>]) -> Option<Table> {
        let options = self.value_options();
        self.create_aux_table(
            Area::Footer,
            footnotes.iter().map(|f| {
                Value::new(format!("{}. {}", f.display_marker(options), f.content))
            }),
        )
    }

    /// Returns the body to render.  When printing with grid lines, rules
    /// that the body leaves out are drawn dashed, in a copy of the body.
    pub fn output_body(&self, printing: bool) -> Arc<Table> {
        let mut body = self.body.clone();
        if printing && self.show_grid_lines {
            Table::make_mut(&mut body)
                .fill_missing_rules(BorderStyle::none().with_stroke(Stroke::Dashed));
        }
        body
    }

    /// Produces the tables to render, in top-to-bottom order.  `printing`
    /// is true when rendering for print rather than screen.
    pub fn output(&self, printing: bool) -> OutputTables {
        // Produce most of the tables.
        let title = self.show_title.then(|| self.output_title()).flatten();
        let layers = self.output_layers();
        let body = self.output_body(printing);
        let caption = self.show_caption.then(|| self.output_caption()).flatten();

        // Then collect the footnotes from those tables.
        let tables = [title.as_ref(), layers.as_ref(), Some(&*body), caption.as_ref()];
        let footnotes = self.output_footnotes(&collect_footnotes(tables.into_iter().flatten()));

        OutputTables {
            title,
            layers,
            body,
            caption,
            footnotes,
        }
    }
}

/// Returns the shown footnotes referenced by cells in `tables`, in order by
/// index, each once.
fn collect_footnotes<'a>(tables: impl Iterator<Item = &'a Table>) -> Vec<Arc<Footnote>> {
    let mut refs = Vec::new();
    for table in tables {
        for cell in table.cells() {
            refs.extend(cell.inner().value.shown_footnotes().cloned());
        }
    }
    refs.sort_by_key(|f| f.index());
    refs.dedup_by_key(|f| f.index());
    refs
}

/// The tables that make up a rendered [TableItem].
pub struct OutputTables {
    pub title: Option<Table>,
    pub layers: Option<Table>,
    pub body: Arc<Table>,
    pub caption: Option<Table>,
    pub footnotes: Option<Table>,
}
