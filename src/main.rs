use clap::Parser;
use timberjoint::cli::{run, Cli};
use timberjoint::{init_logging, LogFormat, BUILD_DATE, VERSION};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(if cli.log_json { LogFormat::Json } else { LogFormat::Text })?;
    tracing::debug!("timberjoint {} (built {})", VERSION, BUILD_DATE);

    run(cli)
}
