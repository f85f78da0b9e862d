use std::process::ExitCode;

use bw_cli::{init_logging, Cli, Parser};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<bw_core::Error>() {
                Some(e) => {
                    eprintln!("{}", e.user_message());
                    if e.is_retryable() {
                        eprintln!("hint: {e}; run the command again to retry");
                    }
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
