//! Unit tests for the traffic simulator
//!
//! This module contains tests that exercise several components together.
