//! Default chart palette

use cdc_model::Color;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Colors offered by the pickers and used to backfill categories
pub const DEFAULT_CHART_COLORS: [&str; 12] = [
    "#4285F4", "#DB4437", "#F4B400", "#0F9D58", "#AB47BC", "#00ACC1", "#FF7043", "#9E9D24",
    "#5C6BC0", "#F06292", "#00796B", "#C2185B",
];

/// Brand color shown in place of a fully transparent swatch
pub const DEFAULT_PRIMARY: &str = "#1A7FC1";

/// Palette errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
    /// A palette must hold at least one color to cycle over
    #[error("palette must contain at least one color")]
    Empty,
}

/// Fixed, ordered, non-empty sequence of default colors
///
/// Cheap to clone and never mutated after construction; pass it to the
/// derivation functions instead of reaching for a global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Color>", into = "Vec<Color>")]
pub struct Palette {
    colors: Arc<[Color]>,
}

impl Palette {
    /// Create a palette
    ///
    /// # Errors
    /// `PaletteError::Empty` when `colors` is empty.
    pub fn new(colors: Vec<Color>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self {
            colors: colors.into(),
        })
    }

    /// The built-in chart colors
    #[must_use]
    pub fn chart_defaults() -> Self {
        Self {
            colors: DEFAULT_CHART_COLORS.iter().map(|c| Color::new(*c)).collect(),
        }
    }

    /// Color at `index`, wrapping around the palette length
    #[inline]
    #[must_use]
    pub fn cycled(&self, index: usize) -> &Color {
        &self.colors[index % self.colors.len()]
    }

    /// Number of distinct colors
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; kept for API symmetry with `len`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colors in order
    pub fn iter(&self) -> std::slice::Iter<'_, Color> {
        self.colors.iter()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::chart_defaults()
    }
}

impl TryFrom<Vec<Color>> for Palette {
    type Error = PaletteError;

    fn try_from(colors: Vec<Color>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl From<Palette> for Vec<Color> {
    fn from(palette: Palette) -> Self {
        palette.colors.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_palette_rejected() {
        assert_eq!(Palette::new(Vec::new()), Err(PaletteError::Empty));
    }

    #[test]
    fn cycled_wraps() {
        let palette = Palette::new(vec![Color::new("#111"), Color::new("#222")]).unwrap();
        assert_eq!(palette.cycled(0).as_str(), "#111");
        assert_eq!(palette.cycled(3).as_str(), "#222");
    }

    #[test]
    fn deserialize_rejects_empty_list() {
        assert!(serde_json::from_str::<Palette>("[]").is_err());
        let palette: Palette = serde_json::from_str("[\"#000\"]").unwrap();
        assert_eq!(palette.len(), 1);
    }
}
