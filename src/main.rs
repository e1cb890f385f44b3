// src/main.rs

use watchrunner::{cli, logging, run, Settings};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("watchrunner error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let settings = Settings::load(&args)?;
    logging::init_logging(args.log_level, settings.section.debug)?;
    run(args, settings).await
}
