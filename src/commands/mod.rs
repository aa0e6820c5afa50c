//! CLI command implementations.

pub mod locate;
pub mod run;

pub use locate::{FieldMatch, ListingCheck, LocateCommand};
pub use run::RunCommand;
