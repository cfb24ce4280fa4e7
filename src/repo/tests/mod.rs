//! Unit tests for the repository registry.

mod domain_tests;
