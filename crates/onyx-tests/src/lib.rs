//! Cross-crate test support for the Onyx wallet core.
//!
//! The test suites live in `tests/`: `e2e.rs` walks full wallet lifecycles
//! through the public API, `adversarial.rs` attacks invariants with
//! randomized inputs. This crate only provides shared fixtures.

pub mod helpers;
