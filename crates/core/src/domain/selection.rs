use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::{AddonId, StyleId, TierKey};
use crate::errors::DomainError;

pub const DEFAULT_STYLE_ID: &str = "signature";
pub const DEFAULT_COMPLEXITY_TIER: &str = "standard";
pub const DEFAULT_AREA_SQUARE_METERS: i64 = 100;
pub const MAX_AREA_SQUARE_METERS: i64 = 10_000_000;
pub const CUSTOM_STYLE_ID: &str = "custom";

/// Project footprint used for the estimate. Always within `0..=MAX_AREA_SQUARE_METERS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct SquareMeters(Decimal);

impl SquareMeters {
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO || value > Decimal::from(MAX_AREA_SQUARE_METERS) {
            return Err(DomainError::InvalidArea { value: value.to_string() });
        }
        Ok(Self(value))
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl Default for SquareMeters {
    fn default() -> Self {
        Self(Decimal::from(DEFAULT_AREA_SQUARE_METERS))
    }
}

impl TryFrom<Decimal> for SquareMeters {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SquareMeters> for Decimal {
    fn from(value: SquareMeters) -> Self {
        value.0
    }
}

impl FromStr for SquareMeters {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parsed = Decimal::from_str(value.trim())
            .map_err(|_| DomainError::InvalidArea { value: value.to_string() })?;
        Self::new(parsed)
    }
}

impl fmt::Display for SquareMeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// One snapshot of the user's in-progress choices.
///
/// Snapshots are values: every studio interaction produces a new `Selection`
/// through the `with_*`/`toggle_*` builders and the quote is recomputed from
/// scratch, so no pricing state accumulates between interactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default = "default_style_id")]
    pub style_id: StyleId,
    #[serde(default)]
    pub addon_ids: BTreeSet<AddonId>,
    #[serde(default = "default_complexity_tier")]
    pub complexity_tier: TierKey,
    #[serde(default)]
    pub area_square_meters: SquareMeters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            style_id: default_style_id(),
            addon_ids: BTreeSet::new(),
            complexity_tier: default_complexity_tier(),
            area_square_meters: SquareMeters::default(),
            custom_prompt: None,
        }
    }
}

impl Selection {
    pub fn with_area_default(area_square_meters: SquareMeters) -> Self {
        Self { area_square_meters, ..Self::default() }
    }

    pub fn with_style(mut self, style_id: StyleId) -> Self {
        self.style_id = style_id;
        self
    }

    pub fn with_addon(mut self, addon_id: AddonId) -> Self {
        self.addon_ids.insert(addon_id);
        self
    }

    pub fn toggle_addon(mut self, addon_id: AddonId) -> Self {
        if !self.addon_ids.remove(&addon_id) {
            self.addon_ids.insert(addon_id);
        }
        self
    }

    pub fn with_tier(mut self, complexity_tier: TierKey) -> Self {
        self.complexity_tier = complexity_tier;
        self
    }

    pub fn with_area(mut self, area_square_meters: SquareMeters) -> Self {
        self.area_square_meters = area_square_meters;
        self
    }

    pub fn with_custom_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.custom_prompt = if prompt.trim().is_empty() { None } else { Some(prompt) };
        self
    }

    pub fn is_custom_style(&self) -> bool {
        self.style_id.as_str() == CUSTOM_STYLE_ID
    }

    /// Prompt forwarded to the renderer; only the free-form style carries one.
    pub fn render_prompt(&self) -> Option<&str> {
        if self.is_custom_style() {
            self.custom_prompt.as_deref()
        } else {
            None
        }
    }
}

fn default_style_id() -> StyleId {
    StyleId::new(DEFAULT_STYLE_ID)
}

fn default_complexity_tier() -> TierKey {
    TierKey::new(DEFAULT_COMPLEXITY_TIER)
}
