//! Unit tests for the gate context.
