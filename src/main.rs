use clap::Parser;
use listing_proxy::domain::ports::ConfigProvider;
use listing_proxy::server::{self, AppState};
use listing_proxy::utils::error::{ErrorSeverity, ProxyError};
use listing_proxy::utils::{logger, validation::Validate};
use listing_proxy::{
    Aggregator, CliConfig, EtlEngine, HttpFeedFetcher, ListingsPipeline, LocalStorage,
    ProxyConfig,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting listing-proxy");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ listing-proxy failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        let exit_code = match e.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: &CliConfig) -> Result<(), ProxyError> {
    let config: ProxyConfig = cli.resolve()?;
    config.validate()?;
    tracing::info!("Loaded {} searches", config.searches().len());

    let fetcher = HttpFeedFetcher::new(config.request_timeout(), config.user_agent())?;
    let aggregator = Aggregator::new(fetcher, config.searches().to_vec());

    if cli.once {
        let storage = LocalStorage::new(config.output_path());
        let pipeline = ListingsPipeline::new(storage, aggregator, config.output_path());
        let output_path = EtlEngine::new(pipeline).run().await?;
        println!("📁 Snapshot saved to: {}", output_path);
        return Ok(());
    }

    let addr = config.bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let router = server::build_router(AppState::new(aggregator));
    server::serve(listener, router, server::wait_for_shutdown_signal()).await
}
