//! HTTP adapters for the image renderer and the payment provider.

pub mod checkout;
pub mod render;

pub use checkout::{
    CheckoutClient, CheckoutError, CheckoutRequest, CheckoutService, CheckoutSession, StripeClient,
    StripeProbe,
};
pub use render::{NanoBananaClient, NanoBananaProbe, RenderClient, RenderError, RenderRequest, RenderService};
