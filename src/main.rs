mod cli;
mod config;
mod godbolt;
mod handlers;
mod logging;
mod preprocess;
mod printer;

use std::io::{self, Write};

use anyhow::Result;
use config::Config;
use godbolt::GodboltClient;
use handlers::submit::{self, SubmitHandler};
use is_terminal::IsTerminal;
use preprocess::Preprocessor;
use printer::ReportPrinter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init(args.verbose)?;

    let cfg = Config::load();
    tracing::debug!(path = %cfg.config_path.display(), "configuration loaded");
    let preprocessor = Preprocessor::new(&cfg.include_url_prefix())?;

    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut out = stdout.lock();

    if args.preprocess_only {
        submit::preprocess_only(&preprocessor, &mut out, &args.files)?;
        out.flush()?;
        return Ok(());
    }

    let client = GodboltClient::from_config(&cfg, args.compiler.as_deref())?;
    let mut handler = SubmitHandler::new(client, preprocessor, ReportPrinter::new(color));
    let status = handler.run_files(&mut out, &args.files, args.run).await?;
    out.flush()?;

    if status != 0 {
        std::process::exit(submit::exit_code(status));
    }
    Ok(())
}
