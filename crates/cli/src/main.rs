use std::process::ExitCode;

fn main() -> ExitCode {
    quotewatch_cli::run()
}
