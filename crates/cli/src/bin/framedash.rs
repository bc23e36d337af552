//! Framedash CLI binary entrypoint.

fn main() {
    if let Err(err) = framedash_cli::app::run() {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
