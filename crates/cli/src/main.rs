use std::process::ExitCode;

fn main() -> ExitCode {
    rankscope_cli::run()
}
