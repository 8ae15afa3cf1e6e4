//! `WikiKisan` assistant server binary.
//! Run with: cargo run --bin wikikisan-server

use std::process::ExitCode;

use wikikisan_assistant::start_assistant;

fn main() -> ExitCode {
    start_assistant::run()
}
