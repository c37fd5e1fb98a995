use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, Shell};

pub fn run(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::Powershell => clap_complete::Shell::PowerShell,
    };
    generate(shell, &mut cmd, "slidehost", &mut std::io::stdout());
}
