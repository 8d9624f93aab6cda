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

//! Device parameters read from TOML.

use enum_map::EnumMap;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::{
    geometry::{Axis2, Coord2},
    look::Stroke,
    render::Params,
};

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    TomlError(#[from] toml::de::Error),

    #[error("Page width must be positive.")]
    ZeroWidth,

    #[error("Page length must be positive.")]
    ZeroLength,

    #[error("Font size along {0:?} axis must be positive.")]
    ZeroFontSize(Axis2),
}

/// Widths of the kinds of lines.  A rule with no line always has width 0.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LineWidths {
    pub solid: usize,
    pub dashed: usize,
    pub thick: usize,
    pub thin: usize,
    pub double: usize,
}

impl Default for LineWidths {
    fn default() -> Self {
        Self {
            solid: 1,
            dashed: 1,
            thick: 1,
            thin: 1,
            double: 1,
        }
    }
}

impl LineWidths {
    fn to_enum_map(self) -> EnumMap<Stroke, usize> {
        EnumMap::from_fn(|stroke| match stroke {
            Stroke::None => 0,
            Stroke::Solid => self.solid,
            Stroke::Dashed => self.dashed,
            Stroke::Thick => self.thick,
            Stroke::Thin => self.thin,
            Stroke::Double => self.double,
        })
    }
}

/// Configuration for a rendering device.
///
/// All sizes are in the device's unit, e.g. characters for a text device.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Page width.
    pub width: usize,

    /// Page length, or `None` for pages of unlimited length.
    pub length: Option<usize>,

    /// Width of an em in the most common font.
    pub em: usize,

    /// Height of a line of text in the most common font.
    pub line: usize,

    pub line_widths: LineWidths,

    /// Minimum cell width (`x`) and height (`y`) before a cell may be broken
    /// across pages.  Defaults to half the page size.
    pub min_break: Option<EnumMap<Axis2, usize>>,

    /// Size of 1/96" in the device's unit, for enforcing heading widths.
    pub px_size: Option<usize>,

    /// Does the device add margins around cell contents?
    pub supports_margins: bool,

    /// Lay out tables right-to-left?
    pub rtl: bool,

    /// Rendering for print rather than screen?
    pub printing: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 79,
            length: None,
            em: 1,
            line: 1,
            line_widths: LineWidths::default(),
            min_break: None,
            px_size: None,
            supports_margins: false,
            rtl: false,
            printing: false,
        }
    }
}

impl RenderConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Validates this configuration and converts it to [Params] for a device
    /// whose capabilities are `can_adjust_break` and `can_scale`.
    pub fn to_params(
        &self,
        can_adjust_break: bool,
        can_scale: bool,
    ) -> Result<Params, ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.length == Some(0) {
            return Err(ConfigError::ZeroLength);
        }
        let font_size = Axis2::new_enum(self.em, self.line);
        if let Some((axis, _)) = font_size.iter().find(|(_, size)| **size == 0) {
            return Err(ConfigError::ZeroFontSize(axis));
        }

        let size = Coord2::new(self.width, self.length.unwrap_or(usize::MAX));
        Ok(Params {
            size,
            font_size,
            line_widths: self.line_widths.to_enum_map(),
            px_size: self.px_size,
            min_break: self.min_break.unwrap_or_else(|| {
                Axis2::new_enum(self.width / 2, self.length.map_or(0, |length| length / 2))
            }),
            supports_margins: self.supports_margins,
            rtl: self.rtl,
            printing: self.printing,
            can_adjust_break,
            can_scale,
        })
    }
}
