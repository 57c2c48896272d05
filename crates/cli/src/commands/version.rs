//! `depsync version`.

/// Version string printed by the command.
pub fn version_line() -> String {
    format!("depsync {}", env!("CARGO_PKG_VERSION"))
}

/// Prints the version to stdout.
#[allow(clippy::print_stdout)]
pub fn execute() {
    println!("{}", version_line());
}
