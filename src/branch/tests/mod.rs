//! Unit tests for the branch context.

mod support;
