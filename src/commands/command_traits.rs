//! Command pattern interfaces
//!
//! Each CLI operation is a `Command`; a `CommandFactory` picks and builds
//! the right one from parsed arguments.

use clap::ArgMatches;

use crate::errors::ChipResult;

/// An executable CLI operation
pub trait Command {
    fn execute(&self) -> ChipResult<()>;
}

/// Creates the command matching the CLI arguments
pub trait CommandFactory {
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    ///
    /// # Returns
    /// The command to run, or a `Config` error for inconsistent arguments
    fn create_command(&self, args: &ArgMatches) -> ChipResult<Box<dyn Command>>;
}
