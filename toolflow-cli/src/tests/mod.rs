//! Unit tests for toolflow-cli, organized by module.
//!
//! Tests are BDD-style with Given/When/Then comments and descriptive names.

mod commands;
