//! Domain layer for YAML Checker
//!
//! Architecture: Domain Model - Pure data for frontmatter validation runs
//! - Documents and spans describe what is inspected
//! - Failures and reports describe what was found
//! - Independent of file systems, terminals and YAML libraries

pub mod documents;
pub mod outcomes;

// Re-export main domain types for convenience
pub use documents::*;
pub use outcomes::*;
