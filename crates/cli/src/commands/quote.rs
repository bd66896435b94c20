use rust_decimal::Decimal;
use serde_json::json;
use unikron_core::domain::catalog::{AddonId, InventoryCatalog, StyleId, TierKey};
use unikron_core::domain::selection::{Selection, SquareMeters};
use unikron_core::quote::pricing::LineItem;
use unikron_core::quote::{DeterministicQuoteCalculator, QuoteBreakdown, QuoteCalculator};

use crate::commands::{
    load_config, CommandResult, EXIT_CATALOG, EXIT_CONFIG, EXIT_INVALID_INPUT, EXIT_NO_QUOTE,
};
use crate::QuoteArgs;

const COMMAND: &str = "quote";

pub fn run(args: &QuoteArgs) -> CommandResult {
    let config = match load_config(args.catalog.clone()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure(COMMAND, "config_validation", error, EXIT_CONFIG),
    };

    let catalog = match InventoryCatalog::load(&config.catalog.path) {
        Ok(catalog) => catalog,
        Err(error) => {
            return CommandResult::failure(COMMAND, "catalog", error.to_string(), EXIT_CATALOG);
        }
    };

    let selection = match build_selection(args, config.catalog.area_square_meters) {
        Ok(selection) => selection,
        Err(error) => {
            return CommandResult::failure(COMMAND, "invalid_input", error, EXIT_INVALID_INPUT);
        }
    };

    let breakdown = DeterministicQuoteCalculator.quote(&catalog, &selection);
    let Some(total) = breakdown.total else {
        let known =
            catalog.styles().iter().map(|style| style.id.as_str()).collect::<Vec<_>>().join(", ");
        return CommandResult::failure(
            COMMAND,
            "unknown_style",
            format!("style `{}` is not in the catalog (known: {known})", selection.style_id.as_str()),
            EXIT_NO_QUOTE,
        );
    };

    if args.json {
        let data = json!({
            "selection": selection,
            "total": total,
            "line_items": breakdown.line_items,
        });
        return CommandResult::success_with_data(
            COMMAND,
            format!("total {}", money(total)),
            Some(data),
        );
    }

    CommandResult::plain(render_human(&breakdown))
}

fn build_selection(args: &QuoteArgs, configured_area: Decimal) -> Result<Selection, String> {
    let area = SquareMeters::new(args.area.unwrap_or(configured_area))
        .map_err(|error| error.to_string())?;

    let mut selection = Selection::with_area_default(area).with_style(StyleId::new(&args.style));
    for addon in &args.addons {
        selection = selection.with_addon(AddonId::new(addon));
    }
    if let Some(tier) = &args.tier {
        selection = selection.with_tier(TierKey::new(tier));
    }
    Ok(selection)
}

fn render_human(breakdown: &QuoteBreakdown) -> String {
    breakdown
        .line_items
        .iter()
        .map(|item| {
            let value = match item {
                LineItem::Base { price_per_square_meter, area_square_meters, amount, .. } => {
                    format!(
                        "{} ({} m2 x {})",
                        money(*amount),
                        area_square_meters.normalize(),
                        money(*price_per_square_meter)
                    )
                }
                LineItem::Addon { amount, .. } => format!("+{}", money(*amount)),
                LineItem::Multiplier { factor, resolved: true, .. } => {
                    format!("x{}", factor.normalize())
                }
                LineItem::Multiplier { factor, resolved: false, .. } => {
                    format!("x{} (unknown tier)", factor.normalize())
                }
                LineItem::Total { amount } => money(*amount),
            };
            format!("{:<28} {value}", item.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn money(amount: Decimal) -> String {
    amount.round_dp(2).normalize().to_string()
}
