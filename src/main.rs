//! Surtir CLI — storage provisioning workflow generator.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "surtir",
    version,
    about = "Storage provisioning workflow generator — array facts in, ordered Ansible playbooks out"
)]
struct Cli {
    #[command(subcommand)]
    command: surtir::cli::Commands,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = surtir::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
