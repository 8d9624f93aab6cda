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

//! Styling: rules, colors, alignment, fonts, and the table look.

use std::{ops::RangeInclusive, str::FromStr};

pub use color::ParseError as ParseColorError;
use color::{AlphaColor, Rgba8, Srgb, palette::css::TRANSPARENT};
use enum_map::{Enum, EnumMap, enum_map};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use crate::{geometry::Axis2, value::FootnoteMarkerType};

/// Areas of a table for styling purposes.
#[derive(Copy, Clone, Debug, Default, Enum, PartialEq, Eq)]
pub enum Area {
    Title,
    Caption,

    /// Footnotes,
    Footer,

    // Top-left corner.
    Corner,

    /// Labels for columns ([Axis2::X]) and rows ([Axis2::Y]).
    Labels(Axis2),

    #[default]
    Data,

    /// Layer indication.
    Layers,
}

impl Area {
    fn default_cell_style(self) -> CellStyle {
        use HorzAlign::*;
        use VertAlign::*;
        let (horz_align, vert_align, hmargins, vmargins) = match self {
            Area::Title => (Some(Center), Middle, [8, 11], [1, 8]),
            Area::Caption => (Some(Left), Top, [8, 11], [1, 1]),
            Area::Footer => (Some(Left), Top, [11, 8], [2, 3]),
            Area::Corner => (Some(Left), Bottom, [8, 11], [1, 1]),
            Area::Labels(Axis2::X) => (Some(Center), Top, [8, 11], [1, 3]),
            Area::Labels(Axis2::Y) => (Some(Left), Top, [8, 11], [1, 3]),
            Area::Data => (None, Top, [8, 11], [1, 1]),
            Area::Layers => (Some(Left), Bottom, [8, 11], [1, 3]),
        };
        CellStyle {
            horz_align,
            vert_align,
            margins: enum_map! { Axis2::X => hmargins, Axis2::Y => vmargins },
        }
    }

    fn default_font_style(self) -> FontStyle {
        FontStyle {
            bold: self == Area::Title,
            italic: false,
            underline: false,
            font: String::from("Sans Serif"),
            fg: [Color::BLACK; 2],
            bg: [Color::WHITE; 2],
            size: 9,
        }
    }

    pub fn default_area_style(self) -> AreaStyle {
        AreaStyle {
            cell_style: self.default_cell_style(),
            font_style: self.default_font_style(),
        }
    }
}

/// The heading region of a rendered table:
///
/// ```text
/// ┌──────────────────┬─────────────────────────────────────────────────┐
/// │                  │                  column headings                │
/// │                  ├─────────────────────────────────────────────────┤
/// │      corner      │                                                 │
/// │       and        │                                                 │
/// │   row headings   │                      data                       │
/// │                  │                                                 │
/// │                  │                                                 │
/// └──────────────────┴─────────────────────────────────────────────────┘
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Enum)]
pub enum HeadingRegion {
    Rows,
    Columns,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AreaStyle {
    pub cell_style: CellStyle,
    pub font_style: FontStyle,
}

impl Default for AreaStyle {
    fn default() -> Self {
        Area::default().default_area_style()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CellStyle {
    /// `None` means "mixed" alignment: align strings to the left, numbers to
    /// the right.
    pub horz_align: Option<HorzAlign>,
    pub vert_align: VertAlign,

    /// Margins in 1/96" units.
    ///
    /// `margins[Axis2::X][0]` is the left margin.
    /// `margins[Axis2::X][1]` is the right margin.
    /// `margins[Axis2::Y][0]` is the top margin.
    /// `margins[Axis2::Y][1]` is the bottom margin.
    pub margins: EnumMap<Axis2, [i32; 2]>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HorzAlign {
    /// Right aligned.
    Right,

    /// Left aligned.
    Left,

    /// Centered.
    Center,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VertAlign {
    /// Top alignment.
    Top,

    /// Centered,
    Middle,

    /// Bottom alignment.
    Bottom,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub font: String,

    /// `fg[0]` is the usual foreground color.
    ///
    /// `fg[1]` is used only for alternate rows in the table body.
    pub fg: [Color; 2],

    /// `bg[0]` is the usual background color.
    ///
    /// `bg[1]` is used only for alternate rows in the table body.
    pub bg: [Color; 2],

    /// In 1/72" units.
    pub size: i32,
}

/// An sRGB color with an alpha channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r,
            g,
            b,
            alpha: 255,
        }
    }

    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self { alpha, ..self }
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    /// Parses CSS color syntax.  Also accepts six hex digits without the
    /// leading `#`, and `transparent`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bare_hex = s.len() == 6 && s.bytes().all(|b| b.is_ascii_hexdigit());
        let color: AlphaColor<Srgb> = if bare_hex {
            format!("#{s}").parse()?
        } else if s.eq_ignore_ascii_case("transparent") {
            TRANSPARENT
        } else {
            s.parse()?
        };
        let Rgba8 { r, g, b, a } = color.to_rgba8();
        Ok(Self::new(r, g, b).with_alpha(a))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(D::Error::custom)
    }
}

/// The style of a rule: its stroke and its color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BorderStyle {
    pub stroke: Stroke,
    pub color: Color,
}

impl Default for BorderStyle {
    fn default() -> Self {
        Self::none()
    }
}

impl BorderStyle {
    pub const fn none() -> Self {
        Self {
            stroke: Stroke::None,
            color: Color::BLACK,
        }
    }

    pub const fn solid() -> Self {
        Self {
            stroke: Stroke::Solid,
            color: Color::BLACK,
        }
    }

    pub const fn with_stroke(self, stroke: Stroke) -> Self {
        Self { stroke, ..self }
    }

    pub fn is_none(&self) -> bool {
        self.stroke.is_none()
    }

    /// Returns a border style that "combines" the two arguments, that is, that
    /// gives a reasonable choice for a rule for different reasons should have
    /// both styles.
    pub fn combine(self, other: BorderStyle) -> Self {
        Self {
            stroke: self.stroke.combine(other.stroke),
            color: self.color,
        }
    }
}

/// The kind of line used to draw a rule, from weakest to strongest.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Enum, Deserialize, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Stroke {
    #[default]
    None,
    Solid,
    Dashed,
    Thick,
    Thin,
    Double,
}

impl Stroke {
    pub fn is_none(&self) -> bool {
        self == &Self::None
    }

    /// Returns a stroke that "combines" the two arguments, that is, that gives
    /// a reasonable stroke choice for a rule for different reasons should have
    /// both styles.
    pub fn combine(self, other: Stroke) -> Self {
        self.max(other)
    }
}

/// Styling for a table and the pseudo-tables around it.
#[derive(Clone, Debug)]
pub struct Look {
    /// Ranges of column widths in the two heading regions, in 1/96" units.
    pub heading_widths: EnumMap<HeadingRegion, RangeInclusive<usize>>,

    /// Kind of markers to use for footnotes.
    pub footnote_marker_type: FootnoteMarkerType,

    /// Styles for areas of the table.
    pub areas: EnumMap<Area, AreaStyle>,

    /// Whether to scale the table down to fit the page, along each axis,
    /// rather than breaking it across pages.
    pub shrink_to_fit: EnumMap<Axis2, bool>,
}

impl Default for Look {
    fn default() -> Self {
        Self {
            heading_widths: EnumMap::from_fn(|region| match region {
                HeadingRegion::Rows => 36..=72,
                HeadingRegion::Columns => 36..=120,
            }),
            footnote_marker_type: FootnoteMarkerType::default(),
            areas: EnumMap::from_fn(Area::default_area_style),
            shrink_to_fit: EnumMap::from_fn(|_| false),
        }
    }
}

impl Look {
    pub fn with_heading_widths(
        mut self,
        heading_widths: EnumMap<HeadingRegion, RangeInclusive<usize>>,
    ) -> Self {
        self.heading_widths = heading_widths;
        self
    }

    pub fn with_footnote_marker_type(mut self, footnote_marker_type: FootnoteMarkerType) -> Self {
        self.footnote_marker_type = footnote_marker_type;
        self
    }

    pub fn with_area_style(mut self, area: Area, style: AreaStyle) -> Self {
        self.areas[area] = style;
        self
    }

    pub fn with_shrink_to_fit(mut self, shrink_to_fit: EnumMap<Axis2, bool>) -> Self {
        self.shrink_to_fit = shrink_to_fit;
        self
    }
}
