//! thumbcask - shared thumbnail cache manager
//!
//! CLI entry point: resolve (or generate) the thumbnail for one source and
//! print its path.

use clap::{CommandFactory, Parser};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use thumbcask::backend::BackendRegistry;
use thumbcask::cli::{Cli, OutputFormat};
use thumbcask::config::ConfigManager;
use thumbcask::error::ThumbResult;
use thumbcask::store::CacheDir;
use thumbcask::ThumbCache;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "thumbcask", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("thumbcask=warn"),
        1 => EnvFilter::new("thumbcask=info"),
        _ => EnvFilter::new("thumbcask=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(Some(_)) => ExitCode::SUCCESS,
        Ok(None) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ThumbResult<Option<PathBuf>> {
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    let root = cli
        .cache_root
        .or(config.cache.root)
        .map(CacheDir::new)
        .unwrap_or_default();
    let registry = BackendRegistry::with_defaults().disable(&config.backends.disabled);
    let cache = ThumbCache::new(root, registry).with_default_size(config.general.default_size);

    let Some(source) = cli.source else {
        unreachable!("completions handled above; clap enforces a source operand")
    };
    let app_name = cli.app_name.or(config.general.app_name);

    let resolved = if cli.lookup_only {
        cache.lookup(&source, cli.size, cli.mtime).await?
    } else {
        cache
            .get_or_create(&source, cli.size, app_name.as_deref())
            .await?
    };

    match (&resolved, cli.format) {
        (Some(path), OutputFormat::Plain) => println!("{}", path.display()),
        (None, OutputFormat::Plain) => {
            eprintln!("{} no thumbnail for {}", style("Miss:").yellow(), source)
        }
        (path, OutputFormat::Json) => {
            let payload = serde_json::json!({
                "source": source,
                "path": path.as_ref().map(|p| p.display().to_string()),
            });
            println!("{}", serde_json::to_string(&payload)?);
        }
    }

    Ok(resolved)
}
