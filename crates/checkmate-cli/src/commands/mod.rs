pub mod config;
pub mod stats;
pub mod task;
pub mod timer;
pub mod watch;

use checkmate_core::storage::first_run;
use checkmate_core::SqliteStore;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

const INSTRUCTIONS: &str = "\
Welcome to Checkmate!
  checkmate timer start -m 25   start a 25-minute focus session
  checkmate watch               keep the countdown on screen
  checkmate timer break-start   take the suggested break
  checkmate task add <text>     jot down what you are working on
";

/// Print the welcome notice on the very first invocation.
pub fn show_instructions_once() -> checkmate_core::error::Result<()> {
    let mut store = SqliteStore::open()?;
    if first_run::needs_instructions(&store)? {
        eprint!("{INSTRUCTIONS}");
        first_run::mark_instructions_seen(&mut store)?;
    }
    Ok(())
}
