//! mksprite - Command-line tool for turning images and GIFs into MakeCode Arcade sprites

use std::process::ExitCode;

use mksprite::cli;

fn main() -> ExitCode {
    cli::run()
}
