// core.rs splits ledger responsibilities into submodules: block and chain
// management in `chain`, integrity checks in `validation`.
pub mod chain;
pub mod validation;

pub use chain::*;
pub use validation::*;
