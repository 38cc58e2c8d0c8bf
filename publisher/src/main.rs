use clap::{Args, Parser, Subcommand};
use client::DryRunClient;
use publisher::{
    EventBus, ProvisioningMode, PublisherConfig, PublisherError, PublisherResult, ResultPublisher,
    RunEvent,
};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "publisher")]
#[command(about = "Publish test run results to a test-management service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded run events against the dry-run client
    DryRun {
        /// Newline-delimited JSON run events ("-" reads stdin)
        #[arg(short, long)]
        events: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Validate the configuration and show the derived endpoint and mode
    CheckConfig {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// Reporter options, e.g. "URL=https://tl.example.com/api,apiKey=abc,prefix=XPJ"
    #[arg(short, long)]
    options: Option<String>,
    /// TOML file with the same option names; --options take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> PublisherResult<PublisherConfig> {
        let mut config = match &self.config {
            Some(path) => PublisherConfig::from_file(path)?,
            None => PublisherConfig::default(),
        };
        if let Some(options) = &self.options {
            config = config.merge(PublisherConfig::from_reporter_options(options)?);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DryRun { events, config } => {
            dry_run(&events, &config.load()?).await?;
        }
        Commands::CheckConfig { config } => {
            check_config(&config.load()?)?;
        }
    }

    Ok(())
}

async fn dry_run(events_path: &Path, config: &PublisherConfig) -> PublisherResult<()> {
    let events = read_events(events_path)?;
    let mode = config.validate()?;

    let mut bus = EventBus::new();
    let publisher = ResultPublisher::new(&mut bus, config, |settings| {
        let client = DryRunClient::new(settings)?;
        Ok(match &mode {
            ProvisioningMode::Auto { prefix } => client.with_project(prefix.clone()),
            ProvisioningMode::Existing { .. } => client,
        })
    })?;

    for event in &events {
        bus.emit(event);
    }
    publisher.flush().await;

    let context = publisher.context();
    info!(
        "Replayed {} events through the {} client (plan: {:?}, build: {:?})",
        events.len(),
        publisher.client_name(),
        context.plan_id,
        context.build_id
    );
    Ok(())
}

fn check_config(config: &PublisherConfig) -> PublisherResult<()> {
    let mode = config.validate()?;
    let settings = config.connection_settings()?;

    println!("Endpoint: {}", settings.endpoint.url());
    println!(
        "Transport: {}",
        if settings.endpoint.secure {
            "TLS"
        } else {
            "plain"
        }
    );
    match mode {
        ProvisioningMode::Existing { plan_id, build_id } => {
            println!("Mode: existing plan {} / build {}", plan_id, build_id)
        }
        ProvisioningMode::Auto { prefix } => {
            println!("Mode: auto-provision under project prefix {}", prefix)
        }
    }
    Ok(())
}

fn read_events(path: &Path) -> PublisherResult<Vec<RunEvent>> {
    let contents = if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };

    let mut events = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line).map_err(|e| {
            error!("Invalid event on line {}: {}", index + 1, e);
            PublisherError::from(e)
        })?;
        events.push(event);
    }
    Ok(events)
}
