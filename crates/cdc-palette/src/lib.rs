//! CDC Palette
//!
//! Derives fill colors for a dataset as it switches between one shared fill
//! color and one color per category.
//!
//! # Core Concepts
//!
//! - [`Palette`]: immutable, ordered default colors injected by the caller
//! - [`derive_palette`]: toggle multi-fill on (extend) or off (collapse)
//! - [`set_category_color`]: point edit of a single category
//! - [`color_at`]: rendering lookup with a neutral fallback
//!
//! # Example
//!
//! ```rust
//! use cdc_model::{Color, FillColor};
//! use cdc_palette::{derive_palette, Palette};
//!
//! let palette = Palette::new(vec![Color::new("#111"), Color::new("#222")]).unwrap();
//! let fill = FillColor::Multi(vec![Color::new("#fff")]);
//!
//! let derived = derive_palette(&fill, true, 4, &palette);
//! assert_eq!(derived.len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod derive;
mod palette;

pub use derive::{
    category_colors, collapse, color_at, derive_palette, extend_to, set_category_color, swatch,
};
pub use palette::{Palette, PaletteError, DEFAULT_CHART_COLORS, DEFAULT_PRIMARY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
