//! `agent` is the runtime that turns the protocol services into a running agent
mod envelope;
pub use envelope::{DecryptedMessage, EnvelopeService};

mod agent;
pub use agent::{Agent, AgentStorage};

mod builder;
pub use builder::Builder;

#[cfg(test)]
mod fakes;
