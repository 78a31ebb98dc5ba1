//! Upstream assistants API integration
//!
//! This module bridges chat requests to a stateful external assistants
//! API exposing three resources: a reusable "assistant" configuration
//! bound to a knowledge corpus, a "thread" accumulating one
//! conversation's messages server-side, and a "run" representing one
//! inference invocation that is polled to completion.

pub mod client;
pub mod poll;
pub mod service;

pub use client::{AssistantClient, MessageList, RunStatus, ThreadMessage};
pub use poll::RunPoller;
pub use service::{AssistantService, ExchangeOutcome};
