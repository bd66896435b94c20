use uuid::Uuid;

use crate::domain::design::RenderedDesign;

pub const FALLBACK_RENDER_IMAGE_URL: &str = "https://images.unsplash.com/photo-1600210492486-724fe5c67fb0?auto=format&fit=crop&q=80&w=1000";
pub const DEMO_DESIGN_ID_PREFIX: &str = "demo-";
pub const TRENDS_NOT_CONFIGURED: &str =
    "Gemini is not configured. Please add GEMINI_API_KEY to your environment.";
pub const TRENDS_UNAVAILABLE: &str = "Trend analysis unavailable at this time.";

/// Literal values handed back when a collaborator is missing or failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub render_image_url: String,
    pub trends_not_configured: String,
    pub trends_unavailable: String,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            render_image_url: FALLBACK_RENDER_IMAGE_URL.to_string(),
            trends_not_configured: TRENDS_NOT_CONFIGURED.to_string(),
            trends_unavailable: TRENDS_UNAVAILABLE.to_string(),
        }
    }
}

impl FallbackPolicy {
    pub fn fallback_design(&self) -> RenderedDesign {
        RenderedDesign {
            image_url: self.render_image_url.clone(),
            id: demo_design_id(),
            fallback: true,
        }
    }
}

/// `demo-` followed by six uppercase alphanumerics.
pub fn demo_design_id() -> String {
    let suffix = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("{DEMO_DESIGN_ID_PREFIX}{suffix}")
}
