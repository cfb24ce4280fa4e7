//! In-memory adapters for gate run history.

mod run;

pub use run::InMemoryGateRunRepository;
