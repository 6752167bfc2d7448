use clap::{CommandFactory, Parser};
use regfish_scraper::config::UsageError;
use regfish_scraper::utils::error::ErrorSeverity;
use regfish_scraper::utils::{logger, validation::Validate};
use regfish_scraper::{CliConfig, ScrapeError, ScraperConfig};

fn usage_exit(error: Option<UsageError>) -> ! {
    if let Some(error) = error {
        eprintln!("{}\n", error);
    }
    eprintln!("{}", CliConfig::command().render_help());
    std::process::exit(2);
}

fn exit_code(error: &ScrapeError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,      // partial output was printed
        ErrorSeverity::Medium => 2,   // network, worth retrying
        ErrorSeverity::High => 1,     // markup or storage
        ErrorSeverity::Critical => 3, // login or configuration
    }
}

fn report(error: &ScrapeError) {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    if let ScrapeError::Batch { failures, .. } = error {
        for failure in failures {
            tracing::error!("  {}", failure);
        }
    }
    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let command = match cli.to_command() {
        Ok(command) => command,
        Err(UsageError::NoMode) => usage_exit(None),
        Err(e) => usage_exit(Some(e)),
    };

    logger::init_cli_logger(cli.verbose);
    tracing::debug!("CLI config: {:?}", cli);

    let config = match ScraperConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            report(&e);
            std::process::exit(exit_code(&e));
        }
    };

    if let Err(e) = config.validate() {
        report(&e);
        std::process::exit(exit_code(&e));
    }

    match regfish_scraper::execute(&config, &command).await {
        Ok(output) => {
            print!("{}", output.stdout);
            if let Some(e) = output.error {
                report(&e);
                std::process::exit(exit_code(&e));
            }
        }
        Err(e) => {
            report(&e);
            std::process::exit(exit_code(&e));
        }
    }

    Ok(())
}
