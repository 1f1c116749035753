use clap::Parser;
use color_eyre::Result;
use daybook::{Config, Database, Profile, cli::{Cli, Commands}};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    // An explicit --config file wins over the profile's config
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_with_profile(profile)?,
    };

    // RUST_LOG takes precedence over the configured filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter.clone().into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    // Initialize database
    let db_path = config.get_database_path();
    let db = Database::new(
        db_path.to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
    )?;
    tracing::debug!(path = %db_path.display(), ?profile, "opened database");

    let export_dir = config.get_export_dir();

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Journal(command) => daybook::cli::handle_journal(command, &export_dir, &db)?,
        Commands::Workout(command) => daybook::cli::handle_workout(command, &export_dir, &db)?,
        Commands::Routine(command) => daybook::cli::handle_routine(command, &db)?,
        Commands::Spelling(command) => daybook::cli::handle_spelling(command, &db)?,
    }

    Ok(())
}
