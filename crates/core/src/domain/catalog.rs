use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::selection::MAX_AREA_SQUARE_METERS;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierKey(pub String);

impl StyleId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AddonId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TierKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human label used by the studio tier switcher (`ultra_luxe` -> `ULTRA LUXE`).
    pub fn display_label(&self) -> String {
        self.0.replace('_', " ").to_uppercase()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub id: StyleId,
    pub name: String,
    pub price_per_square_meter: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
    pub id: AddonId,
    pub name: String,
    pub price: Decimal,
}

/// Raw shape of the inventory resource before validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub styles: Vec<Style>,
    pub addons: Vec<Addon>,
    pub complexity_multipliers: IndexMap<TierKey, Decimal>,
}

/// Validated, read-only price list for styles, add-ons and complexity tiers.
///
/// A value of this type always satisfies the catalog invariants: at least one
/// style, unique ids, positive style prices, non-negative add-on prices and a
/// non-empty mapping of positive multipliers. Tier order follows the source
/// document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CatalogDocument")]
pub struct InventoryCatalog {
    styles: Vec<Style>,
    addons: Vec<Addon>,
    complexity_multipliers: IndexMap<TierKey, Decimal>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog must define at least one style")]
    NoStyles,
    #[error("catalog {kind} id must not be blank")]
    BlankIdentifier { kind: &'static str },
    #[error("duplicate style id `{0}`")]
    DuplicateStyle(String),
    #[error("duplicate addon id `{0}`")]
    DuplicateAddon(String),
    #[error("style `{style}` has non-positive pricePerSquareMeter {price}")]
    NonPositiveStylePrice { style: String, price: Decimal },
    #[error("addon `{addon}` has negative price {price}")]
    NegativeAddonPrice { addon: String, price: Decimal },
    #[error("catalog must define at least one complexity multiplier")]
    NoComplexityTiers,
    #[error("complexity tier `{tier}` has non-positive multiplier {multiplier}")]
    NonPositiveMultiplier { tier: String, multiplier: Decimal },
    #[error("catalog prices overflow the largest quotable total ({area} m2 at the highest rate and multiplier)")]
    PriceOutOfRange { area: i64 },
}

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("could not read catalog file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog document: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("invalid catalog: {0}")]
    Invalid(#[from] CatalogError),
}

impl InventoryCatalog {
    pub fn new(
        styles: Vec<Style>,
        addons: Vec<Addon>,
        complexity_multipliers: IndexMap<TierKey, Decimal>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self { styles, addons, complexity_multipliers };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogLoadError> {
        let document =
            serde_json::from_str::<CatalogDocument>(raw).map_err(CatalogLoadError::Parse)?;
        Ok(Self::try_from(document)?)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogLoadError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogLoadError::Read { path: path.to_path_buf(), source })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.styles.is_empty() {
            return Err(CatalogError::NoStyles);
        }

        let mut seen_styles = BTreeSet::new();
        for style in &self.styles {
            if style.id.0.trim().is_empty() {
                return Err(CatalogError::BlankIdentifier { kind: "style" });
            }
            if !seen_styles.insert(style.id.as_str()) {
                return Err(CatalogError::DuplicateStyle(style.id.0.clone()));
            }
            if style.price_per_square_meter <= Decimal::ZERO {
                return Err(CatalogError::NonPositiveStylePrice {
                    style: style.id.0.clone(),
                    price: style.price_per_square_meter,
                });
            }
        }

        let mut seen_addons = BTreeSet::new();
        for addon in &self.addons {
            if addon.id.0.trim().is_empty() {
                return Err(CatalogError::BlankIdentifier { kind: "addon" });
            }
            if !seen_addons.insert(addon.id.as_str()) {
                return Err(CatalogError::DuplicateAddon(addon.id.0.clone()));
            }
            if addon.price < Decimal::ZERO {
                return Err(CatalogError::NegativeAddonPrice {
                    addon: addon.id.0.clone(),
                    price: addon.price,
                });
            }
        }

        if self.complexity_multipliers.is_empty() {
            return Err(CatalogError::NoComplexityTiers);
        }
        for (tier, multiplier) in &self.complexity_multipliers {
            if tier.0.trim().is_empty() {
                return Err(CatalogError::BlankIdentifier { kind: "complexity tier" });
            }
            if *multiplier <= Decimal::ZERO {
                return Err(CatalogError::NonPositiveMultiplier {
                    tier: tier.0.clone(),
                    multiplier: *multiplier,
                });
            }
        }

        self.largest_total()
            .map(|_| ())
            .ok_or(CatalogError::PriceOutOfRange { area: MAX_AREA_SQUARE_METERS })
    }

    // Unknown tiers price at 1.0, so the factor never drops below it.
    fn largest_total(&self) -> Option<Decimal> {
        let rate = self.styles.iter().map(|style| style.price_per_square_meter).max()?;
        let factor = self
            .complexity_multipliers
            .values()
            .copied()
            .fold(Decimal::ONE, Decimal::max);
        let addons = self
            .addons
            .iter()
            .try_fold(Decimal::ZERO, |sum, addon| sum.checked_add(addon.price))?;

        rate.checked_mul(Decimal::from(MAX_AREA_SQUARE_METERS))?
            .checked_mul(factor)?
            .checked_add(addons)
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn addons(&self) -> &[Addon] {
        &self.addons
    }

    pub fn complexity_multipliers(&self) -> &IndexMap<TierKey, Decimal> {
        &self.complexity_multipliers
    }

    pub fn find_style(&self, style_id: &StyleId) -> Option<&Style> {
        self.styles.iter().find(|style| &style.id == style_id)
    }

    pub fn find_addon(&self, addon_id: &AddonId) -> Option<&Addon> {
        self.addons.iter().find(|addon| &addon.id == addon_id)
    }

    pub fn multiplier(&self, tier: &TierKey) -> Option<Decimal> {
        self.complexity_multipliers.get(tier).copied()
    }

    pub fn tier_keys(&self) -> impl Iterator<Item = &TierKey> {
        self.complexity_multipliers.keys()
    }

    pub fn into_document(self) -> CatalogDocument {
        CatalogDocument {
            styles: self.styles,
            addons: self.addons,
            complexity_multipliers: self.complexity_multipliers,
        }
    }
}

impl TryFrom<CatalogDocument> for InventoryCatalog {
    type Error = CatalogError;

    fn try_from(document: CatalogDocument) -> Result<Self, Self::Error> {
        Self::new(document.styles, document.addons, document.complexity_multipliers)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use indexmap::IndexMap;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{
        Addon, AddonId, CatalogError, CatalogLoadError, InventoryCatalog, Style, StyleId, TierKey,
    };

    const INVENTORY: &str = r#"{
        "styles": [
            { "id": "signature", "name": "Signature", "pricePerSquareMeter": 50 },
            { "id": "luxe", "name": "Luxe", "pricePerSquareMeter": 82.5 }
        ],
        "addons": [
            { "id": "lighting", "name": "Smart Lighting", "price": 200 },
            { "id": "landscaping", "name": "Landscaping", "price": 0 }
        ],
        "complexityMultipliers": { "standard": 1.0, "complex": 1.5, "ultra_complex": 2 }
    }"#;

    #[test]
    fn parses_inventory_document_with_camel_case_fields() {
        let catalog = InventoryCatalog::from_json_str(INVENTORY).expect("catalog should parse");

        assert_eq!(catalog.styles().len(), 2);
        let luxe = catalog.find_style(&StyleId::new("luxe")).expect("luxe style");
        assert_eq!(luxe.price_per_square_meter, Decimal::new(825, 1));
        assert_eq!(catalog.multiplier(&TierKey::new("complex")), Some(Decimal::new(15, 1)));
        assert_eq!(catalog.find_addon(&AddonId::new("landscaping")).map(|a| a.price), Some(Decimal::ZERO));
    }

    #[test]
    fn tier_order_follows_source_document() {
        let catalog = InventoryCatalog::from_json_str(INVENTORY).expect("catalog should parse");
        let keys = catalog.tier_keys().map(TierKey::as_str).collect::<Vec<_>>();

        assert_eq!(keys, vec!["standard", "complex", "ultra_complex"]);
        assert_eq!(TierKey::new("ultra_complex").display_label(), "ULTRA COMPLEX");
    }

    #[test]
    fn missing_collection_is_a_parse_error() {
        let error = InventoryCatalog::from_json_str(
            r#"{ "styles": [{ "id": "a", "name": "A", "pricePerSquareMeter": 1 }], "addons": [] }"#,
        )
        .expect_err("missing complexityMultipliers should fail");

        assert!(matches!(error, CatalogLoadError::Parse(_)));
        assert!(error.to_string().contains("complexityMultipliers"));
    }

    #[test]
    fn rejects_non_positive_style_price() {
        let error = InventoryCatalog::from_json_str(
            r#"{
                "styles": [{ "id": "free", "name": "Free", "pricePerSquareMeter": 0 }],
                "addons": [],
                "complexityMultipliers": { "standard": 1 }
            }"#,
        )
        .expect_err("zero price should fail");

        assert!(matches!(
            error,
            CatalogLoadError::Invalid(CatalogError::NonPositiveStylePrice { ref style, .. }) if style == "free"
        ));
    }

    #[test]
    fn rejects_empty_multiplier_mapping() {
        let result = InventoryCatalog::new(
            vec![style("signature", 50)],
            Vec::new(),
            IndexMap::new(),
        );
        assert_eq!(result, Err(CatalogError::NoComplexityTiers));
    }

    #[test]
    fn rejects_duplicate_ids_and_negative_addon_prices() {
        let duplicate = InventoryCatalog::new(
            vec![style("signature", 50), style("signature", 60)],
            Vec::new(),
            standard_tier(),
        );
        assert_eq!(duplicate, Err(CatalogError::DuplicateStyle("signature".to_string())));

        let negative = InventoryCatalog::new(
            vec![style("signature", 50)],
            vec![Addon {
                id: AddonId::new("rebate"),
                name: "Rebate".to_string(),
                price: Decimal::new(-1, 0),
            }],
            standard_tier(),
        );
        assert!(matches!(negative, Err(CatalogError::NegativeAddonPrice { .. })));
    }

    #[test]
    fn rejects_non_positive_multiplier_and_empty_styles() {
        let mut tiers = standard_tier();
        tiers.insert(TierKey::new("broken"), Decimal::ZERO);
        let result = InventoryCatalog::new(vec![style("signature", 50)], Vec::new(), tiers);
        assert!(matches!(result, Err(CatalogError::NonPositiveMultiplier { ref tier, .. }) if tier == "broken"));

        let empty = InventoryCatalog::new(Vec::new(), Vec::new(), standard_tier());
        assert_eq!(empty, Err(CatalogError::NoStyles));
    }

    #[test]
    fn deserializing_directly_still_validates() {
        let result = serde_json::from_str::<InventoryCatalog>(
            r#"{ "styles": [], "addons": [], "complexityMultipliers": { "standard": 1 } }"#,
        );
        let error = result.expect_err("empty styles must not deserialize");
        assert!(error.to_string().contains("at least one style"));
    }

    #[test]
    fn load_reads_catalog_from_disk() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("inventory.json");
        fs::write(&path, INVENTORY).expect("write inventory");

        let catalog = InventoryCatalog::load(&path).expect("load inventory");
        assert_eq!(catalog.addons().len(), 2);

        let missing = InventoryCatalog::load(&dir.path().join("missing.json"))
            .expect_err("missing file should fail");
        assert!(matches!(missing, CatalogLoadError::Read { .. }));
    }

    #[test]
    fn rejects_prices_that_overflow_at_the_largest_area() {
        let error = InventoryCatalog::from_json_str(
            r#"{
                "styles": [{ "id": "signature", "name": "Signature", "pricePerSquareMeter": 10000000000000000000000 }],
                "addons": [],
                "complexityMultipliers": { "standard": 1 }
            }"#,
        )
        .expect_err("rate times the largest area overflows");
        assert!(matches!(
            error,
            CatalogLoadError::Invalid(CatalogError::PriceOutOfRange { area: 10_000_000 })
        ));

        let huge_addon = Addon {
            id: AddonId::new("palace"),
            name: "Palace".to_string(),
            price: Decimal::MAX,
        };
        let result = InventoryCatalog::new(vec![style("signature", 50)], vec![huge_addon], standard_tier());
        assert!(matches!(result, Err(CatalogError::PriceOutOfRange { .. })));
    }

    #[test]
    fn largest_quote_stays_computable_for_accepted_catalogs() {
        let mut tiers = standard_tier();
        tiers.insert(TierKey::new("ultra_complex"), Decimal::new(22, 1));
        let catalog = InventoryCatalog::new(
            vec![style("signature", 1_000_000_000_000)],
            vec![Addon { id: AddonId::new("solar"), name: "Solar".to_string(), price: Decimal::from(8_000) }],
            tiers,
        )
        .expect("large but representable prices are accepted");

        let total = catalog.largest_total().expect("largest total fits");
        assert_eq!(total, "22000000000000008000".parse::<Decimal>().expect("decimal literal"));
    }

    fn style(id: &str, price: i64) -> Style {
        Style { id: StyleId::new(id), name: id.to_uppercase(), price_per_square_meter: Decimal::from(price) }
    }

    fn standard_tier() -> IndexMap<TierKey, Decimal> {
        let mut tiers = IndexMap::new();
        tiers.insert(TierKey::new("standard"), Decimal::ONE);
        tiers
    }
}
