pub mod pricing;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::InventoryCatalog;
use crate::domain::selection::Selection;

use self::pricing::{compute_line_items, compute_total, compute_trace, LineItem, PricingTraceStep};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    pub total: Option<Decimal>,
    pub line_items: Vec<LineItem>,
    pub trace: Vec<PricingTraceStep>,
}

impl QuoteBreakdown {
    /// Re-derives the total from the itemized rows: `base * factor + addons`.
    pub fn itemized_total(&self) -> Option<Decimal> {
        let mut base = None;
        let mut factor = Decimal::ONE;
        let mut addons = Decimal::ZERO;

        for item in &self.line_items {
            match item {
                LineItem::Base { amount, .. } => base = Some(*amount),
                LineItem::Addon { amount, .. } => addons += *amount,
                LineItem::Multiplier { factor: value, .. } => factor = *value,
                LineItem::Total { .. } => {}
            }
        }

        base.map(|base| base * factor + addons)
    }

    /// True when the breakdown and the total describe the same quote.
    pub fn agrees(&self) -> bool {
        let stated_total = self.line_items.iter().rev().find_map(|item| match item {
            LineItem::Total { amount } => Some(*amount),
            _ => None,
        });

        match self.total {
            None => self.line_items.is_empty(),
            Some(total) => self.itemized_total() == Some(total) && stated_total == Some(total),
        }
    }
}

pub trait QuoteCalculator: Send + Sync {
    fn quote(&self, catalog: &InventoryCatalog, selection: &Selection) -> QuoteBreakdown;
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicQuoteCalculator;

impl QuoteCalculator for DeterministicQuoteCalculator {
    fn quote(&self, catalog: &InventoryCatalog, selection: &Selection) -> QuoteBreakdown {
        QuoteBreakdown {
            total: compute_total(catalog, selection),
            line_items: compute_line_items(catalog, selection),
            trace: compute_trace(catalog, selection),
        }
    }
}
