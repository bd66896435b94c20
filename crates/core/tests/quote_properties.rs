//! Property tests for the quote calculator.

use indexmap::IndexMap;
use proptest::prelude::*;
use rust_decimal::Decimal;

use unikron_core::domain::catalog::{Addon, AddonId, InventoryCatalog, Style, StyleId, TierKey};
use unikron_core::domain::selection::{Selection, SquareMeters};
use unikron_core::quote::pricing::{compute_line_items, compute_total, LineItem};
use unikron_core::quote::{DeterministicQuoteCalculator, QuoteCalculator};

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

/// Catalog with 1..4 styles, 0..5 add-ons and a `standard` tier fixed at 1.0.
fn catalog_strategy() -> impl Strategy<Value = InventoryCatalog> {
    (
        prop::collection::vec(1_i64..1_000_000, 1..4),
        prop::collection::vec(0_i64..500_000, 0..5),
        prop::collection::vec(1_i64..5_000, 0..3),
    )
        .prop_map(|(style_prices, addon_prices, extra_tiers)| {
            let styles = style_prices
                .into_iter()
                .enumerate()
                .map(|(index, price)| Style {
                    id: StyleId::new(format!("style-{index}")),
                    name: format!("Style {index}"),
                    price_per_square_meter: cents(price),
                })
                .collect();
            let addons = addon_prices
                .into_iter()
                .enumerate()
                .map(|(index, price)| Addon {
                    id: AddonId::new(format!("addon-{index}")),
                    name: format!("Addon {index}"),
                    price: cents(price),
                })
                .collect();
            let mut tiers = IndexMap::new();
            tiers.insert(TierKey::new("standard"), Decimal::ONE);
            for (index, factor) in extra_tiers.into_iter().enumerate() {
                tiers.insert(TierKey::new(format!("tier-{index}")), Decimal::new(factor, 3));
            }

            InventoryCatalog::new(styles, addons, tiers).expect("generated catalog is valid")
        })
}

fn selection_strategy() -> impl Strategy<Value = Selection> {
    (
        0_usize..5,
        prop::collection::vec(0_usize..7, 0..6),
        prop_oneof![Just("standard".to_string()), Just("tier-0".to_string()), Just("mystery".to_string())],
        0_i64..1_000_000,
    )
        .prop_map(|(style_index, addon_indexes, tier, area_tenths)| {
            let mut selection = Selection::default()
                .with_style(StyleId::new(format!("style-{style_index}")))
                .with_tier(TierKey::new(tier))
                .with_area(SquareMeters::new(Decimal::new(area_tenths, 1)).expect("area in range"));
            for index in addon_indexes {
                selection = selection.with_addon(AddonId::new(format!("addon-{index}")));
            }
            selection
        })
}

proptest! {
    /// Same catalog and selection always price identically.
    #[test]
    fn quote_is_deterministic(catalog in catalog_strategy(), selection in selection_strategy()) {
        let first = DeterministicQuoteCalculator.quote(&catalog, &selection);
        let second = DeterministicQuoteCalculator.quote(&catalog, &selection);
        prop_assert_eq!(first, second);
    }

    /// Line items re-derive the same total the calculator reports.
    #[test]
    fn line_items_agree_with_total(catalog in catalog_strategy(), selection in selection_strategy()) {
        let breakdown = DeterministicQuoteCalculator.quote(&catalog, &selection);
        prop_assert!(breakdown.agrees());

        let style_known = catalog.find_style(&selection.style_id).is_some();
        prop_assert_eq!(breakdown.total.is_some(), style_known);
        prop_assert_eq!(breakdown.line_items.is_empty(), !style_known);
    }

    /// Ids missing from the catalog never change the price.
    #[test]
    fn unknown_addon_ids_are_ignored(catalog in catalog_strategy(), selection in selection_strategy()) {
        let with_stale = selection.clone().with_addon(AddonId::new("retired-addon"));

        prop_assert_eq!(compute_total(&catalog, &with_stale), compute_total(&catalog, &selection));
        let addon_lines = compute_line_items(&catalog, &with_stale)
            .into_iter()
            .filter(|item| matches!(item, LineItem::Addon { addon_id, .. } if addon_id.as_str() == "retired-addon"))
            .count();
        prop_assert_eq!(addon_lines, 0);
    }

    /// A tier key the catalog does not list prices like a factor of exactly 1.
    #[test]
    fn unknown_tier_prices_as_identity(catalog in catalog_strategy(), selection in selection_strategy()) {
        let unknown = selection.clone().with_tier(TierKey::new("not-a-tier"));
        let standard = selection.with_tier(TierKey::new("standard"));

        prop_assert_eq!(compute_total(&catalog, &unknown), compute_total(&catalog, &standard));
    }
}
