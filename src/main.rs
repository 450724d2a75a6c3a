use anyhow::Context;
use clap::Parser;
use sharepass::{
    cli::Cli,
    clipboard,
    config::{format_duration, ShareConfig},
    prompt,
    share::{detach, service},
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging first
    init_tracing(cli.verbose);

    let config = ShareConfig::load(&cli).context("Failed to load configuration")?;
    debug!("Loaded configuration: {:?}", config);

    let secret = if detach::is_detached_child() {
        detach::receive_handoff(std::io::stdin().lock())?
    } else {
        let secret = prompt::read_secret()?;
        if config.daemon {
            detach::detach(secret)?;
            return Ok(());
        }
        secret
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let service = service::prepare(config.address).await?;
        let url = service.endpoint().url();
        info!("Listening on {} for {}", url, format_duration(config.timeout));

        if config.copy {
            clipboard::copy_url(&url);
        }

        let outcome = service.run(secret, config.timeout).await;
        debug!("Terminated with {:?}", outcome);
        Ok::<_, anyhow::Error>(())
    })
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "sharepass=info",
        1 => "sharepass=debug,tower_http=debug",
        _ => "sharepass=trace,tower_http=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
