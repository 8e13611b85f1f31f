use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    dealwise_cli::run()
}
