//! Hierarchy assembly tests.
