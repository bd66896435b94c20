use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::InventoryCatalog;
use crate::domain::selection::Selection;

pub const DEFAULT_ACTIVITY_CAPACITY: usize = 500;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    StylePicked,
    AddonToggled,
    TierChanged,
    CustomPrompt,
    Selection,
    RenderRequested,
    RenderDelivered,
    CheckoutStarted,
    SessionReset,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub entry_id: String,
    pub kind: ActivityKind,
    pub summary: String,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, summary: impl Into<String>) -> Self {
        Self {
            entry_id: Uuid::new_v4().to_string(),
            kind,
            summary: summary.into(),
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    /// `Selection: Luxe style for 150m2 project`
    pub fn for_selection(catalog: &InventoryCatalog, selection: &Selection) -> Self {
        let style_name = catalog
            .find_style(&selection.style_id)
            .map(|style| style.name.clone())
            .unwrap_or_else(|| selection.style_id.as_str().to_string());

        Self::new(
            ActivityKind::Selection,
            format!("Selection: {style_name} style for {}m2 project", selection.area_square_meters),
        )
        .with_metadata("style_id", selection.style_id.as_str())
        .with_metadata("tier", selection.complexity_tier.as_str())
        .with_metadata("addon_count", selection.addon_ids.len().to_string())
    }

    /// One entry per field that differs from `baseline`: style, each toggled add-on, then tier.
    pub fn changes_from(catalog: &InventoryCatalog, baseline: &Selection, selection: &Selection) -> Vec<Self> {
        let mut entries = Vec::new();

        if selection.style_id != baseline.style_id {
            let name = catalog
                .find_style(&selection.style_id)
                .map(|style| style.name.clone())
                .unwrap_or_else(|| selection.style_id.as_str().to_string());
            entries.push(
                Self::new(ActivityKind::StylePicked, format!("Style picked: {name}"))
                    .with_metadata("style_id", selection.style_id.as_str()),
            );
        }

        let toggled = selection
            .addon_ids
            .symmetric_difference(&baseline.addon_ids)
            .map(|addon_id| (addon_id, selection.addon_ids.contains(addon_id)));
        for (addon_id, selected) in toggled {
            let name = catalog
                .find_addon(addon_id)
                .map(|addon| addon.name.clone())
                .unwrap_or_else(|| addon_id.as_str().to_string());
            let verb = if selected { "selected" } else { "removed" };
            entries.push(
                Self::new(ActivityKind::AddonToggled, format!("Add-on {verb}: {name}"))
                    .with_metadata("addon_id", addon_id.as_str())
                    .with_metadata("selected", selected.to_string()),
            );
        }

        if selection.complexity_tier != baseline.complexity_tier {
            entries.push(
                Self::new(
                    ActivityKind::TierChanged,
                    format!("Complexity tier: {}", selection.complexity_tier.display_label()),
                )
                .with_metadata("tier", selection.complexity_tier.as_str()),
            );
        }

        entries
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn transcript_line(&self) -> String {
        format!("[{}] {}", self.occurred_at.format("%Y-%m-%d %H:%M:%S"), self.summary)
    }
}

pub trait ActivitySink: Send + Sync {
    fn record(&self, entry: ActivityEntry);
}

/// Bounded log; once full, the oldest entry is dropped for each new one.
#[derive(Clone)]
pub struct InMemoryActivityLog {
    entries: Arc<Mutex<VecDeque<ActivityEntry>>>,
    capacity: usize,
}

impl Default for InMemoryActivityLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ACTIVITY_CAPACITY)
    }
}

impl InMemoryActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))), capacity }
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    /// Most recent `limit` entries as transcript lines, oldest first.
    pub fn transcript(&self, limit: usize) -> Vec<String> {
        let entries = self.entries();
        let skip = entries.len().saturating_sub(limit);
        entries.iter().skip(skip).map(ActivityEntry::transcript_line).collect()
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActivitySink for InMemoryActivityLog {
    fn record(&self, entry: ActivityEntry) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}
