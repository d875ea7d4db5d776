//! Palette derivation properties

use cdc_model::{Color, FillColor};
use cdc_palette::{color_at, derive_palette, set_category_color, Palette};
use proptest::prelude::*;

fn color() -> impl Strategy<Value = Color> {
    "#[0-9a-f]{6}".prop_map(Color::new)
}

fn palette() -> impl Strategy<Value = Palette> {
    prop::collection::vec(color(), 1..8).prop_map(|colors| Palette::new(colors).unwrap())
}

fn fill() -> impl Strategy<Value = FillColor> {
    prop_oneof![
        color().prop_map(FillColor::Single),
        prop::collection::vec(color(), 0..10).prop_map(FillColor::Multi),
    ]
}

proptest! {
    #[test]
    fn extension_reaches_category_count_and_keeps_prefix(
        existing in prop::collection::vec(color(), 0..6),
        extra in 1usize..10,
        palette in palette(),
    ) {
        let target = existing.len() + extra;
        let derived = derive_palette(&FillColor::Multi(existing.clone()), true, target, &palette);

        let FillColor::Multi(colors) = derived else {
            panic!("enabling multi-fill must produce a sequence");
        };
        prop_assert_eq!(colors.len(), target);
        prop_assert_eq!(&colors[..existing.len()], existing.as_slice());
    }

    #[test]
    fn derivation_is_idempotent(current in fill(), count in 0usize..16, palette in palette()) {
        let once = derive_palette(&current, true, count, &palette);
        let twice = derive_palette(&once, true, count, &palette);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn shrinking_count_retains_surplus(current in fill(), count in 0usize..16, palette in palette()) {
        let wide = derive_palette(&current, true, count, &palette);
        let narrow = derive_palette(&wide, true, count / 2, &palette);
        prop_assert_eq!(wide, narrow);
    }

    #[test]
    fn collapse_yields_first_element(colors in prop::collection::vec(color(), 1..10), palette in palette()) {
        let first = colors[0].clone();
        let collapsed = derive_palette(&FillColor::Multi(colors), false, 0, &palette);
        prop_assert_eq!(collapsed, FillColor::Single(first));
    }

    #[test]
    fn point_edit_preserves_length(current in fill(), index in 0usize..12, replacement in color()) {
        match set_category_color(&current, index, replacement.clone()) {
            Some(edited) => {
                prop_assert!(index < current.len());
                prop_assert_eq!(edited.len(), current.len());
                prop_assert_eq!(edited.get(index), Some(&replacement));
            }
            None => prop_assert!(index >= current.len()),
        }
    }

    #[test]
    fn lookup_never_fails(current in fill(), index in 0usize..32) {
        let neutral = Color::new("white");
        let rendered = color_at(&current, index, &neutral);
        if index >= current.len() {
            prop_assert_eq!(rendered, neutral);
        }
    }
}
