//! # Completions Command Implementation
//!
//! Prints a `clap_complete` script for one shell. The script covers every
//! subcommand and flag of `zero`, including the fixed value sets of
//! `create --type` and `--color`.
//!
//! ```bash
//! zero completions bash > ~/.local/share/bash-completion/completions/zero
//! zero completions zsh > ~/.zfunc/_zero
//! zero completions fish > ~/.config/fish/completions/zero.fish
//! ```

use std::io;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout());
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn io::Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_completions_cover_subcommands() {
        let mut buffer = Vec::new();
        write_completions(Shell::Bash, &mut buffer);
        let script = String::from_utf8(buffer).unwrap();
        for subcommand in ["create", "inspect", "plugins"] {
            assert!(script.contains(subcommand), "missing {}", subcommand);
        }
        assert!(script.contains("--strict-merge"));
    }

    #[test]
    fn test_fish_completions_offer_project_types() {
        let mut buffer = Vec::new();
        write_completions(Shell::Fish, &mut buffer);
        let script = String::from_utf8(buffer).unwrap();
        assert!(script.contains("complete -c zero"));
        assert!(script.contains("web"));
        assert!(script.contains("lib"));
    }
}
