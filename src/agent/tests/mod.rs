//! Unit tests for the agent context.
