use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    scan_smuggler::app::startup::startup().await
}
