// src/main.rs

use migradag::{cli, logging, run};

/// Exit code when the run completed but the migration did not succeed.
const EXIT_MIGRATION_FAILED: i32 = 2;

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_MIGRATION_FAILED),
        Err(err) => {
            eprintln!("migradag error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
