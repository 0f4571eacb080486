//! Service Layer
//!
//! Webhook authentication, topic dispatch, affiliate attribution,
//! commission computation and the processor that ties them together.

pub mod attribution;
pub mod commission;
pub mod events;
pub mod planner;
pub mod processor;
pub mod signature;

pub use attribution::{AffiliateAttribution, AttributionSource};
pub use commission::{CommissionSplit, FEE_SHARE, PLATFORM_FEE};
pub use events::WebhookEvent;
pub use planner::{IntendedWrite, RateSource, SaleContext};
pub use processor::{ProcessOutcome, WebhookProcessor};
