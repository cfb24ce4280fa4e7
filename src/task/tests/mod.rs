//! Unit tests for the task context.

mod state_transition_tests;
