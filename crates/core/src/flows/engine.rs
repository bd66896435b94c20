use thiserror::Error;

use crate::activity::{ActivityEntry, ActivityKind, ActivitySink};
use crate::flows::states::{FlowAction, FlowContext, FlowEvent, FlowState, TransitionOutcome};

pub trait FlowDefinition {
    fn initial_state(&self) -> FlowState;
    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Storefront steps: customize, generate a rendering, then check out.
#[derive(Clone, Debug, Default)]
pub struct StudioFlow;

impl FlowDefinition for StudioFlow {
    fn initial_state(&self) -> FlowState {
        FlowState::Customizing
    }

    fn transition(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_studio(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> FlowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }

    pub fn apply_with_activity<S>(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
        sink: &S,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: ActivitySink + ?Sized,
    {
        let result = self.apply(current, event, context);
        if let Ok(outcome) = &result {
            let kind = match outcome.event {
                FlowEvent::GenerateRequested => Some(ActivityKind::RenderRequested),
                FlowEvent::CheckoutRequested => Some(ActivityKind::CheckoutStarted),
                FlowEvent::NewDesignRequested => Some(ActivityKind::SessionReset),
                _ => None,
            };
            if let Some(kind) = kind {
                sink.record(ActivityEntry::new(
                    kind,
                    format!("Studio moved from {:?} to {:?}", outcome.from, outcome.to),
                ));
            }
        }
        result
    }
}

impl Default for FlowEngine<StudioFlow> {
    fn default() -> Self {
        Self::new(StudioFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("missing required fields before transition from {state:?}: {missing_fields:?}")]
    MissingRequiredFields { state: FlowState, missing_fields: Vec<String> },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: FlowState, event: FlowEvent },
}

fn transition_studio(
    current: &FlowState,
    event: &FlowEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{
        AbandonRender, CreateCheckoutSession, RedirectToCheckout, RequestRender, ResetSelection,
        ShowRendering,
    };
    use FlowEvent::{
        CheckoutFailed, CheckoutRedirected, CheckoutRequested, GenerateRequested,
        NewDesignRequested, RenderDelivered,
    };
    use FlowState::{CheckingOut, Customizing, Finalized, Generating, Rendered};

    let (to, actions) = match (current, event) {
        (Customizing, GenerateRequested) | (Rendered, GenerateRequested) => {
            require(current, context.missing_for_generation())?;
            (Generating, vec![RequestRender])
        }
        (Generating, RenderDelivered) => (Rendered, vec![ShowRendering]),
        (Rendered, CheckoutRequested) => {
            require(current, context.missing_for_checkout())?;
            (CheckingOut, vec![CreateCheckoutSession])
        }
        (CheckingOut, CheckoutRedirected) => (Finalized, vec![RedirectToCheckout, ResetSelection]),
        (CheckingOut, CheckoutFailed) => (Rendered, Vec::new()),
        (Generating, NewDesignRequested) => (Customizing, vec![AbandonRender, ResetSelection]),
        (_, NewDesignRequested) => (Customizing, vec![ResetSelection]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, event: event.clone(), actions })
}

fn require(state: &FlowState, missing_fields: Vec<String>) -> Result<(), FlowTransitionError> {
    if missing_fields.is_empty() {
        return Ok(());
    }
    Err(FlowTransitionError::MissingRequiredFields { state: state.clone(), missing_fields })
}
