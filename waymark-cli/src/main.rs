//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use structured_logger::Builder;
use structured_logger::json::new_writer;
use waymark_cli::CliError;

fn main() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(std::io::stderr()))
        .init();
    match waymark_cli::run() {
        Ok(output) => println!("{output}"),
        // Clap owns the presentation of help, version and usage errors:
        // help/version go to stdout with exit code 0, usage errors to
        // stderr with clap's own exit code.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("waymark: {err}");
            std::process::exit(1);
        }
    }
}
