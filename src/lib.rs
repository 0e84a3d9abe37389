//! trainbot, a Mixin Messenger bot.
//!
//! The bot listens for inbound chat events over the Blaze gateway,
//! classifies each into a command (daily claim, donate, lookups, account
//! proposal), performs at most one side-effecting operation against the
//! messenger API, and answers with an ordered response plan. Financial
//! actions are idempotent through deterministic trace keys: the daily
//! claim key is scoped to the calendar date, so "once per day" needs no
//! local storage at all.

pub mod agent;
pub mod api;
pub mod channels;
pub mod config;
pub mod error;
pub mod qr;

pub use agent::{BotConfig, Command, Dispatcher, InboundMessage, MessageCategory, ResponsePlan};
pub use config::Config;
pub use error::{Error, Result};
