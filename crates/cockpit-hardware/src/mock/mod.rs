//! Mock device implementations for testing and development.
//!
//! This module provides a simulated controller that can be attached,
//! detached and made to fail programmatically without requiring physical
//! hardware.

pub mod link;

// Re-export commonly used types
pub use link::{MockLink, MockResolver, MockResolverHandle, SentFrame};
