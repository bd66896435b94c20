use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{Addon, AddonId, InventoryCatalog, Style, StyleId, TierKey};
use crate::domain::selection::Selection;

/// One row of a price breakdown.
///
/// `Multiplier` is a factor applied to the base line, every other variant
/// carries an additive amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItem {
    Base {
        style_id: StyleId,
        label: String,
        price_per_square_meter: Decimal,
        area_square_meters: Decimal,
        amount: Decimal,
    },
    Addon {
        addon_id: AddonId,
        label: String,
        amount: Decimal,
    },
    Multiplier {
        tier: TierKey,
        factor: Decimal,
        resolved: bool,
    },
    Total {
        amount: Decimal,
    },
}

impl LineItem {
    pub fn label(&self) -> String {
        match self {
            Self::Base { label, .. } | Self::Addon { label, .. } => label.clone(),
            Self::Multiplier { tier, .. } => format!("Complexity ({})", tier.display_label()),
            Self::Total { .. } => "Total".to_string(),
        }
    }

    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Base { amount, .. } | Self::Addon { amount, .. } | Self::Total { amount } => {
                Some(*amount)
            }
            Self::Multiplier { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

pub fn compute_total(catalog: &InventoryCatalog, selection: &Selection) -> Option<Decimal> {
    let style = catalog.find_style(&selection.style_id)?;
    let (factor, _) = resolve_multiplier(catalog, &selection.complexity_tier);
    let base = base_amount(style, selection) * factor;

    Some(base + selected_addons(catalog, selection).map(|addon| addon.price).sum::<Decimal>())
}

pub fn compute_line_items(catalog: &InventoryCatalog, selection: &Selection) -> Vec<LineItem> {
    let Some(style) = catalog.find_style(&selection.style_id) else {
        return Vec::new();
    };
    let Some(total) = compute_total(catalog, selection) else {
        return Vec::new();
    };

    let mut items = vec![LineItem::Base {
        style_id: style.id.clone(),
        label: style.name.clone(),
        price_per_square_meter: style.price_per_square_meter,
        area_square_meters: selection.area_square_meters.value(),
        amount: base_amount(style, selection),
    }];

    items.extend(selected_addons(catalog, selection).map(|addon| LineItem::Addon {
        addon_id: addon.id.clone(),
        label: addon.name.clone(),
        amount: addon.price,
    }));

    let (factor, resolved) = resolve_multiplier(catalog, &selection.complexity_tier);
    items.push(LineItem::Multiplier { tier: selection.complexity_tier.clone(), factor, resolved });
    items.push(LineItem::Total { amount: total });

    items
}

pub fn compute_trace(catalog: &InventoryCatalog, selection: &Selection) -> Vec<PricingTraceStep> {
    let Some(style) = catalog.find_style(&selection.style_id) else {
        return Vec::new();
    };

    let base = base_amount(style, selection);
    let (factor, resolved) = resolve_multiplier(catalog, &selection.complexity_tier);
    let adjusted = base * factor;
    let addons_total = selected_addons(catalog, selection).map(|addon| addon.price).sum::<Decimal>();
    let ignored = selection
        .addon_ids
        .iter()
        .filter(|addon_id| catalog.find_addon(addon_id).is_none())
        .count();

    vec![
        PricingTraceStep {
            stage: "base".to_string(),
            detail: format!(
                "{} * {} m2 ({})",
                style.price_per_square_meter, selection.area_square_meters, style.id.0
            ),
            amount: base,
        },
        PricingTraceStep {
            stage: "complexity".to_string(),
            detail: if resolved {
                format!("x{factor} ({})", selection.complexity_tier.0)
            } else {
                format!("x{factor} (unknown tier `{}`)", selection.complexity_tier.0)
            },
            amount: adjusted,
        },
        PricingTraceStep {
            stage: "addons".to_string(),
            detail: format!("sum(addon.price), {ignored} unknown id(s) ignored"),
            amount: addons_total,
        },
        PricingTraceStep {
            stage: "total".to_string(),
            detail: "base * multiplier + addons".to_string(),
            amount: adjusted + addons_total,
        },
    ]
}

// `InventoryCatalog::validate` bounds rate x largest area x multiplier + add-ons, so this cannot overflow.
fn base_amount(style: &Style, selection: &Selection) -> Decimal {
    style.price_per_square_meter * selection.area_square_meters.value()
}

fn resolve_multiplier(catalog: &InventoryCatalog, tier: &TierKey) -> (Decimal, bool) {
    match catalog.multiplier(tier) {
        Some(factor) => (factor, true),
        None => (Decimal::ONE, false),
    }
}

// Catalog order, not selection order; ids missing from the catalog drop out here.
fn selected_addons<'a>(
    catalog: &'a InventoryCatalog,
    selection: &'a Selection,
) -> impl Iterator<Item = &'a Addon> + 'a {
    catalog.addons().iter().filter(move |addon| selection.addon_ids.contains(&addon.id))
}
