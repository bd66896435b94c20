use serde::{Deserialize, Serialize};

/// Reference to a rendered 3D design returned to the studio.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDesign {
    pub image_url: String,
    pub id: String,
    #[serde(default)]
    pub fallback: bool,
}
