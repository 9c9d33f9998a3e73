//! prismgen CLI binary
//!
//! Minimal entrypoint; all logic is in the library, main.rs only invokes
//! cli::run().

fn main() {
    if let Err(e) = prismgen::cli::run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
