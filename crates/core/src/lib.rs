pub mod activity;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod errors;
pub mod fallback;
pub mod flows;
pub mod quote;
pub mod service;

pub use activity::{ActivityEntry, ActivityKind, ActivitySink, InMemoryActivityLog};
pub use diagnostics::{run_diagnostics, DiagnosticsReport, ServiceCheck, ServiceProbe, ServiceStatus};
pub use domain::catalog::{
    Addon, AddonId, CatalogDocument, CatalogError, CatalogLoadError, InventoryCatalog, Style,
    StyleId, TierKey,
};
pub use domain::design::RenderedDesign;
pub use domain::selection::{Selection, SquareMeters};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use fallback::FallbackPolicy;
pub use quote::pricing::{compute_line_items, compute_total, LineItem};
pub use quote::{DeterministicQuoteCalculator, QuoteBreakdown, QuoteCalculator};
pub use service::Service;
