use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    Customizing,
    Generating,
    Rendered,
    CheckingOut,
    Finalized,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowEvent {
    GenerateRequested,
    RenderDelivered,
    CheckoutRequested,
    CheckoutRedirected,
    CheckoutFailed,
    NewDesignRequested,
}

/// Facts about the current studio session that guard transitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub plan_uploaded: bool,
    pub style_resolved: bool,
    pub quote_available: bool,
}

impl FlowContext {
    pub fn missing_for_generation(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.plan_uploaded {
            missing.push("floor_plan".to_string());
        }
        if !self.style_resolved {
            missing.push("style".to_string());
        }
        missing
    }

    pub fn missing_for_checkout(&self) -> Vec<String> {
        if self.quote_available {
            Vec::new()
        } else {
            vec!["quote".to_string()]
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowAction {
    RequestRender,
    ShowRendering,
    CreateCheckoutSession,
    RedirectToCheckout,
    AbandonRender,
    ResetSelection,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: FlowState,
    pub to: FlowState,
    pub event: FlowEvent,
    pub actions: Vec<FlowAction>,
}
