use std::process::ExitCode;

fn main() -> ExitCode {
    unikron_cli::run()
}
