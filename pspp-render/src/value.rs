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

//! Cell contents.
//!
//! The layout engine does not interpret what a cell means.  A [Value] is
//! just text, optionally decorated with subscripts, a superscript, and
//! references to footnotes, plus an optional style that overrides the style
//! of the area that the cell is in.

use std::{
    fmt::{Display, Write},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::look::AreaStyle;

#[derive(Copy, Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FootnoteMarkerType {
    /// a, b, c, ...
    #[default]
    Alphabetic,

    /// 1, 2, 3, ...
    Numeric,
}

/// Options for displaying a [Value].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ValueOptions {
    pub footnote_marker_type: FootnoteMarkerType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Footnote {
    index: usize,
    pub content: String,
    pub marker: Option<String>,
    pub show: bool,
}

impl Footnote {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            index: 0,
            content: content.into(),
            marker: None,
            show: true,
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn with_show(mut self, show: bool) -> Self {
        self.show = show;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn display_marker(&self, options: ValueOptions) -> DisplayMarker<'_> {
        DisplayMarker {
            footnote: self,
            options,
        }
    }
}

pub struct DisplayMarker<'a> {
    footnote: &'a Footnote,
    options: ValueOptions,
}

impl Display for DisplayMarker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.footnote.marker {
            Some(marker) => f.write_str(marker),
            None => {
                let i = self.footnote.index + 1;
                match self.options.footnote_marker_type {
                    FootnoteMarkerType::Alphabetic => write!(f, "{}", Display26Adic(i)),
                    FootnoteMarkerType::Numeric => write!(f, "{i}"),
                }
            }
        }
    }
}

/// Displays a positive integer in bijective base 26: `a` through `z`, then
/// `aa` through `zz`, and so on.
pub struct Display26Adic(pub usize);

impl Display for Display26Adic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut digits = SmallVec::<[char; 8]>::new();
        let mut number = self.0;
        while number > 0 {
            number -= 1;
            digits.push(char::from(b'a' + (number % 26) as u8));
            number /= 26;
        }
        digits.iter().rev().try_for_each(|c| f.write_char(*c))
    }
}

/// Decorations on a [Value] beyond its text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueStyle {
    /// Overrides the style of the area that contains the value.
    pub style: Option<AreaStyle>,
    pub subscripts: Vec<String>,
    pub superscript: Option<String>,
    pub footnotes: Vec<Arc<Footnote>>,
}

/// The content of a single table cell, or of a title or a caption.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Value {
    pub text: String,
    pub styling: Option<Box<ValueStyle>>,
}

impl Value {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            styling: None,
        }
    }

    fn styling_mut(&mut self) -> &mut ValueStyle {
        self.styling.get_or_insert_default()
    }

    pub fn with_style(mut self, style: AreaStyle) -> Self {
        self.styling_mut().style = Some(style);
        self
    }

    pub fn with_subscripts<I, S>(mut self, subscripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styling_mut().subscripts = subscripts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_superscript(mut self, superscript: impl Into<String>) -> Self {
        self.styling_mut().superscript = Some(superscript.into());
        self
    }

    pub fn with_footnote(mut self, footnote: &Arc<Footnote>) -> Self {
        self.add_footnote(footnote);
        self
    }

    pub fn add_footnote(&mut self, footnote: &Arc<Footnote>) {
        let footnotes = &mut self.styling_mut().footnotes;
        footnotes.push(footnote.clone());
        footnotes.sort_by_key(|f| f.index);
    }

    pub fn style(&self) -> Option<&AreaStyle> {
        self.styling.as_ref().and_then(|styling| styling.style.as_ref())
    }

    pub fn subscripts(&self) -> &[String] {
        self.styling
            .as_ref()
            .map_or(&[], |styling| styling.subscripts.as_slice())
    }

    pub fn superscript(&self) -> Option<&str> {
        self.styling
            .as_ref()
            .and_then(|styling| styling.superscript.as_deref())
    }

    pub fn footnotes(&self) -> &[Arc<Footnote>] {
        self.styling
            .as_ref()
            .map_or(&[], |styling| styling.footnotes.as_slice())
    }

    /// Returns an iterator over the footnotes that are shown.
    pub fn shown_footnotes(&self) -> impl Iterator<Item = &Arc<Footnote>> {
        self.footnotes().iter().filter(|f| f.show)
    }

    pub fn footnote_count(&self) -> usize {
        self.shown_footnotes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.styling.is_none()
    }

    pub fn display(&self, options: ValueOptions) -> DisplayValue<'_> {
        DisplayValue {
            value: self,
            options,
            show_suffixes: true,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Displays a [Value] as plain text: the text itself, then `_` and the
/// comma-separated subscripts, then `^` and the superscript, then each shown
/// footnote marker in brackets.
pub struct DisplayValue<'a> {
    value: &'a Value,
    options: ValueOptions,
    show_suffixes: bool,
}

impl<'a> DisplayValue<'a> {
    pub fn without_suffixes(self) -> Self {
        Self {
            show_suffixes: false,
            ..self
        }
    }

    pub fn text(&self) -> &'a str {
        &self.value.text
    }

    /// Returns the number of decorations (subscripts, superscript, and shown
    /// footnotes) that follow the text.
    pub fn n_suffixes(&self) -> usize {
        self.value.subscripts().len()
            + usize::from(self.value.superscript().is_some())
            + self.value.footnote_count()
    }
}

impl Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value.text)?;
        if !self.show_suffixes {
            return Ok(());
        }

        let subscripts = self.value.subscripts();
        if !subscripts.is_empty() {
            write!(f, "_{}", subscripts.join(","))?;
        }
        if let Some(superscript) = self.value.superscript() {
            write!(f, "^{superscript}")?;
        }
        for footnote in self.value.shown_footnotes() {
            write!(f, "[{}]", footnote.display_marker(self.options))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Display26Adic, Footnote, FootnoteMarkerType, Value, ValueOptions};

    #[test]
    fn display_26adic() {
        for (number, expected) in [
            (1, "a"),
            (2, "b"),
            (26, "z"),
            (27, "aa"),
            (28, "ab"),
            (702, "zz"),
            (703, "aaa"),
        ] {
            assert_eq!(Display26Adic(number).to_string(), expected);
        }
    }

    #[test]
    fn markers() {
        let a = Footnote::new("first").with_index(0);
        let c = Footnote::new("third").with_index(2);
        let star = Footnote::new("starred").with_marker("*");
        let alpha = ValueOptions::default();
        let numeric = ValueOptions {
            footnote_marker_type: FootnoteMarkerType::Numeric,
        };
        assert_eq!(a.display_marker(alpha).to_string(), "a");
        assert_eq!(c.display_marker(alpha).to_string(), "c");
        assert_eq!(c.display_marker(numeric).to_string(), "3");
        assert_eq!(star.display_marker(numeric).to_string(), "*");
    }

    #[test]
    fn suffixes() {
        let b = Arc::new(Footnote::new("b").with_index(1));
        let a = Arc::new(Footnote::new("a").with_index(0));
        let hidden = Arc::new(Footnote::new("hidden").with_index(2).with_show(false));
        let value = Value::new("Mean")
            .with_subscripts(["x", "y"])
            .with_superscript("2")
            .with_footnote(&b)
            .with_footnote(&hidden)
            .with_footnote(&a);
        let display = value.display(ValueOptions::default());
        assert_eq!(display.n_suffixes(), 5);
        assert_eq!(value.footnote_count(), 2);
        assert_eq!(display.to_string(), "Mean_x,y^2[a][b]");
        assert_eq!(
            value.display(ValueOptions::default()).without_suffixes().to_string(),
            "Mean"
        );
        assert_eq!(Value::from("plain").display(ValueOptions::default()).n_suffixes(), 0);
    }
}
