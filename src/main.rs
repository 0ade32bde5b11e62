use access_logger::{config, server};
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Demo server logging every request through the access-log middleware.
#[derive(Parser)]
#[command(name = "access-logger")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bind address, overrides `LISTEN`
    #[arg(short, long)]
    listen: Option<String>,

    /// Format name or template, overrides `ACCESS_LOG_FORMAT`
    #[arg(short, long)]
    format: Option<String>,

    /// Log on request arrival instead of on response
    #[arg(long)]
    immediate: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the environment config.
    fn apply(self, config: &mut config::Config) {
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(format) = self.format {
            config.access_log_format = format;
        }
        if self.immediate {
            config.access_log_immediate = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = config::Config::from_env()?;
    cli.apply(&mut config);

    init_tracing(&config.log_level, &config.log_format);

    config.validate()?;
    config.print_summary();

    server::run(config).await
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
