use clap::Parser;
use mapparr::cli::{Cli, Commands};
use mapparr::{Config, cli, run};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config = Config::load()?;
    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(dispatch(args, config))
}

async fn dispatch(args: Cli, config: Config) -> anyhow::Result<()> {
    let Some(command) = args.command else {
        return run().await;
    };

    if matches!(command, Commands::Daemon) {
        return run().await;
    }

    // One-shot commands log quietly unless RUST_LOG says otherwise.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Daemon => unreachable!("handled above"),
        Commands::Resolve {
            media_type,
            tmdb,
            tvdb,
            imdb,
            tvmaze,
            mal,
            kitsu,
            anidb,
            anilist,
            targets,
        } => {
            cli::cmd_resolve(
                &config,
                &media_type,
                tmdb,
                tvdb,
                imdb,
                tvmaze,
                mal,
                kitsu,
                anidb,
                anilist,
                &targets,
            )
            .await
        }
        Commands::Stats => cli::cmd_stats(&config).await,
        Commands::Clear { older_than, all } => cli::cmd_clear(&config, older_than, all).await,
        Commands::Search {
            id,
            content_type,
            limit,
            offset,
        } => cli::cmd_search(&config, &id, content_type.as_deref(), limit, offset).await,
        Commands::AddMapping {
            content_type,
            tmdb,
            tvdb,
            imdb,
            tvmaze,
        } => cli::cmd_add_mapping(&config, &content_type, tmdb, tvdb, imdb, tvmaze).await,
        Commands::Optimize => cli::cmd_optimize(&config).await,
        Commands::Init => cli::cmd_init(),
    }
}
