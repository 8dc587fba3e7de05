//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Competition and achievement commands
pub mod competition;

/// General utility commands
pub mod general;

/// Balance, market and withdrawal commands
pub mod points;

// Export commands
pub use competition::*;
pub use general::*;
pub use points::*;
