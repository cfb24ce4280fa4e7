//! In-memory adapters for agent session persistence.

mod session;

pub use session::InMemoryAgentSessionRepository;
