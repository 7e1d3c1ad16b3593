//! Completions command

use clap::CommandFactory;
use clap_complete::{Shell, generate};

use crate::Cli;

/// Print completions for `shell` on stdout.
pub fn completions(shell: Shell) {
    let mut command = Cli::command();
    generate(shell, &mut command, "sis", &mut std::io::stdout());
}
