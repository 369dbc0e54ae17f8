// Installs the employee table and stored procedures into the configured database
// Run with: cargo run --bin install-procedures -- [--config <path>] [--profile <name>]

use anyhow::{bail, Context};

use employee_records_lib::db::{install, SqlServerSession};
use employee_records_lib::{init_logging, load_config, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_named(
        "install-procedures",
        "Install the employee table and stored procedures",
    );
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let schema = config.preferences.schema.clone();
    if !install::is_valid_schema(&schema) {
        bail!("Schema name {:?} is not a plain identifier", schema);
    }
    let profile = config.active_profile()?.clone();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let mut session = SqlServerSession::connect(&profile, &schema).await?;
        let version = session.server_version().await?;
        println!(
            "Connected to {}:{} ({})",
            profile.host,
            profile.port,
            version.lines().next().unwrap_or("unknown version")
        );

        let batches = install::install(&mut session, &schema).await?;
        println!(
            "✅ Installed employees table and procedures in {}.{} ({} batches)",
            profile.database, schema, batches
        );
        Ok::<(), anyhow::Error>(())
    })
}
