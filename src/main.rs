mod bootstrap;
mod cli;
mod config;
mod database;
mod duplicates;
mod error;
#[cfg(test)]
mod fixtures;
mod homestays;
mod owners;
mod schema;

use cli::Cli;
use log::error;

fn main() {
    if let Err(err) = Cli::handle_command_line() {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
