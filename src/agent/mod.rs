//! Command interpretation and idempotent action dispatch.
//!
//! The pipeline for one inbound event: [`router::classify`] maps raw
//! bytes to a [`Command`], the [`Dispatcher`] performs exactly one
//! side-effecting operation through the API boundary, and the resulting
//! [`ResponsePlan`] is handed to the channel layer for delivery.

pub mod dispatcher;
pub mod plan;
pub mod proposal;
pub mod router;
pub mod trace;

pub use dispatcher::{BotConfig, DEFAULT_PROPOSAL_OWNER, Dispatcher};
pub use plan::{OutboundAction, ResponsePlan};
pub use proposal::{MultisigOwners, Operation};
pub use router::{Command, InboundMessage, MessageCategory, classify};
