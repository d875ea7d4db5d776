//! Colors and fill color values
//!
//! Colors are kept as the CSS strings the chart renderer consumes
//! (`#rrggbb`, `rgba(...)`, named colors). No parsing or validation is
//! done beyond what the editor needs.

use serde::{Deserialize, Serialize};

/// A CSS color string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Create a color from any CSS color string
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The transparent fill used when fill is toggled
    #[inline]
    #[must_use]
    pub fn transparent() -> Self {
        Self::new("transparent")
    }

    /// Build an `rgba(r, g, b, a)` string from picker components
    #[must_use]
    pub fn from_rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self(format!("rgba({r}, {g}, {b}, {a})"))
    }

    /// Underlying CSS string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `rgba(0,0,0,0)` in any spacing
    #[must_use]
    pub fn is_fully_transparent(&self) -> bool {
        let compact: String = self.0.chars().filter(|c| !c.is_whitespace()).collect();
        compact.eq_ignore_ascii_case("rgba(0,0,0,0)")
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Color {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Fill color of a dataset: one shared color or one color per category
///
/// Stored untagged so a canonical record may carry either a bare string or a
/// list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillColor {
    /// One color for every category
    Single(Color),
    /// Ordered per-category colors
    Multi(Vec<Color>),
}

impl FillColor {
    /// Normalize to a sequence, wrapping a scalar in a one-element list
    #[must_use]
    pub fn to_sequence(&self) -> Vec<Color> {
        match self {
            Self::Single(color) => vec![color.clone()],
            Self::Multi(colors) => colors.clone(),
        }
    }

    /// First color (the scalar itself for `Single`)
    #[must_use]
    pub fn first(&self) -> Option<&Color> {
        match self {
            Self::Single(color) => Some(color),
            Self::Multi(colors) => colors.first(),
        }
    }

    /// Color at a category index
    ///
    /// A `Single` fill only answers index 0.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Color> {
        match self {
            Self::Single(color) if index == 0 => Some(color),
            Self::Single(_) => None,
            Self::Multi(colors) => colors.get(index),
        }
    }

    /// Number of colors held
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(colors) => colors.len(),
        }
    }

    /// True only for an empty `Multi`
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collapse a one-element sequence to a scalar for single-fill consumers
    #[must_use]
    pub fn normalized(&self) -> Self {
        match self {
            Self::Multi(colors) if colors.len() == 1 => Self::Single(colors[0].clone()),
            other => other.clone(),
        }
    }
}

impl Default for FillColor {
    fn default() -> Self {
        Self::Single(Color::transparent())
    }
}

impl From<Color> for FillColor {
    fn from(color: Color) -> Self {
        Self::Single(color)
    }
}

impl From<Vec<Color>> for FillColor {
    fn from(colors: Vec<Color>) -> Self {
        Self::Multi(colors)
    }
}
