use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repomirror::config::expand_path;
use repomirror::{
    filter_repositories, Config, GerritLister, GitHubLister, Provider, Reporter, Repository,
    RepositoryLister, RepositoryStore, ShellRunner, SyncEngine, SyncOptions, TerminalPrompt,
};

#[derive(Parser)]
#[command(name = "repomirror")]
#[command(about = "Downloads all or selected repositories of an organization")]
#[command(version)]
struct Cli {
    /// Only sync repositories whose name contains this text (case-insensitive)
    repo_name_pattern: Option<String>,

    /// Configuration file
    #[arg(long, default_value = "config.ini")]
    config_file: String,

    /// Use a previously saved JSON repository list
    #[arg(long)]
    repos_file: Option<String>,

    /// Fetch and save the repository list, then stop
    #[arg(long)]
    update_list_only: bool,

    /// Don't pull-rebase repositories that are already cloned
    #[arg(long)]
    dont_rebase: bool,

    /// Stop on any command error, including exit code 128
    #[arg(long)]
    stop_on_error: bool,

    /// Print what would run without cloning or pulling anything
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    info!("Starting repomirror v{}", env!("CARGO_PKG_VERSION"));

    let reporter = Reporter::new(!cli.no_color);

    let config_path = expand_path(&cli.config_file)?;
    let config = Config::load_or_bootstrap(&config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

    if let Some(pattern) = cli.repo_name_pattern.as_deref().filter(|p| !p.is_empty()) {
        reporter.info(format!("Processing repos: {}", pattern));
    }

    let repositories = collect_repositories(&cli, &config, reporter).await?;
    if repositories.is_empty() {
        reporter.alert("ERROR: No repos found.");
        return Ok(());
    }

    let store = RepositoryStore::new(config.repos_file_path());
    reporter.info(format!("Saving repo JSON file: {}", store.path().display()));
    store
        .save(&repositories)
        .context("Failed to save repository list")?;

    if cli.update_list_only {
        info!("Repository list updated; skipping sync");
        return Ok(());
    }

    let total = repositories.len();
    reporter.info(format!("Total Repos: {}", total));

    let verbose = cli.verbose;
    let selected = filter_repositories(repositories, cli.repo_name_pattern.as_deref(), |repo| {
        if verbose {
            reporter.info(&repo.name);
        }
    });
    reporter.info(format!(
        "Total Repos (filtered): {} ({:.2}%)",
        selected.len(),
        selected.len() as f64 / total as f64 * 100.0
    ));

    let options = SyncOptions {
        dry_run: cli.dry_run,
        stop_on_error: cli.stop_on_error,
        dont_rebase: cli.dont_rebase,
    };
    let engine = SyncEngine::new(ShellRunner::new(reporter), options, reporter)?;
    let summary = engine
        .run(&selected)
        .await
        .context("Failed to synchronize repositories")?;

    reporter.progress(&summary);
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load the saved list or fetch it from the configured provider
async fn collect_repositories(
    cli: &Cli,
    config: &Config,
    reporter: Reporter,
) -> Result<Vec<Repository>> {
    if let (Some(repos_file), false) = (&cli.repos_file, cli.update_list_only) {
        let path: PathBuf = expand_path(repos_file)?;
        return RepositoryStore::new(&path)
            .load()
            .with_context(|| format!("Failed to read repository list {:?}", path));
    }

    let lister: Box<dyn RepositoryLister> = match &config.provider {
        Some(Provider::GitHub(_)) => Box::new(GitHubLister::new(
            config,
            Box::new(TerminalPrompt),
            reporter,
        )?),
        Some(Provider::Gerrit(gerrit)) => Box::new(GerritLister::new(
            gerrit.clone(),
            ShellRunner::new(reporter),
        )),
        None => {
            debug!("No [github] or [gerrit] section; nothing to list");
            return Ok(Vec::new());
        }
    };

    info!("Listing repositories from {}", lister.provider_name());
    lister
        .list()
        .await
        .with_context(|| format!("Failed to list {} repositories", lister.provider_name()))
}
