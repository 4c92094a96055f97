/// CLI module - command-line interface for noty
mod cli;

fn main() {
    cli::run_cli();
}
