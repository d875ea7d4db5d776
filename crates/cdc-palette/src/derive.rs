//! Fill color derivation
//!
//! Invariants:
//! - Extending never truncates; surplus colors survive a shrinking category
//!   count, so deriving twice with the same count is a no-op.
//! - Collapsing always yields the first color of the prior sequence.
//! - Point edits never grow the sequence.
//! - Rendering lookups never fail; missing entries fall back to neutral.

use crate::palette::Palette;
use cdc_model::{Color, FillColor};

/// Derive the fill color for a multi-fill toggle
///
/// `enabling = true` extends the current colors to `category_count` entries
/// (see [`extend_to`]); `false` collapses to a single color (see
/// [`collapse`]).
#[must_use]
pub fn derive_palette(
    current: &FillColor,
    enabling: bool,
    category_count: usize,
    palette: &Palette,
) -> FillColor {
    let derived = if enabling {
        FillColor::Multi(extend_to(current, category_count, palette))
    } else {
        FillColor::Single(collapse(current))
    };
    tracing::debug!(
        enabling,
        category_count,
        before = current.len(),
        after = derived.len(),
        "derived fill palette"
    );
    derived
}

/// Normalize to a sequence and backfill up to `category_count` colors
///
/// Appended colors are taken from the palette in order, wrapping around its
/// length: the first missing category gets `palette[0]`, the next
/// `palette[1]`, and so on.
#[must_use]
pub fn extend_to(current: &FillColor, category_count: usize, palette: &Palette) -> Vec<Color> {
    let mut colors = current.to_sequence();
    let existing = colors.len();
    if existing < category_count {
        colors.extend((0..category_count - existing).map(|k| palette.cycled(k).clone()));
    }
    colors
}

/// First color of the current fill
///
/// An empty sequence has no first color; it collapses to transparent, the
/// same value a freshly toggled fill starts with.
#[must_use]
pub fn collapse(current: &FillColor) -> Color {
    current.first().cloned().unwrap_or_else(Color::transparent)
}

/// Replace the color of one category
///
/// Returns `None` when `index` is past the end of the current colors; the
/// sequence is never auto-extended by a point edit.
#[must_use]
pub fn set_category_color(current: &FillColor, index: usize, color: Color) -> Option<FillColor> {
    match current {
        FillColor::Single(_) if index == 0 => Some(FillColor::Single(color)),
        FillColor::Single(_) => None,
        FillColor::Multi(colors) if index < colors.len() => {
            let mut colors = colors.clone();
            colors[index] = color;
            Some(FillColor::Multi(colors))
        }
        FillColor::Multi(_) => None,
    }
}

/// Color to render for a category, falling back to `neutral`
#[must_use]
pub fn color_at(current: &FillColor, index: usize, neutral: &Color) -> Color {
    current.get(index).unwrap_or(neutral).clone()
}

/// Pair each category label with the color it renders in
#[must_use]
pub fn category_colors<'a>(
    current: &FillColor,
    labels: &'a [String],
    neutral: &Color,
) -> Vec<(&'a str, Color)> {
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| (label.as_str(), color_at(current, index, neutral)))
        .collect()
}

/// Color shown on a picker swatch
///
/// A fully transparent color would be invisible, so it shows as `primary`.
#[must_use]
pub fn swatch<'a>(color: &'a Color, primary: &'a Color) -> &'a Color {
    if color.is_fully_transparent() {
        primary
    } else {
        color
    }
}
