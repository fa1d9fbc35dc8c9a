use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::task::{self, LocalSet};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use purepaste::rule::source::{build_payload_from_sources, UpstreamSource};
use purepaste::{
    ClipboardWatcher, ConfigManager, GlobalConfig, HttpRuleFetcher, RuleCompiler, RulesCoordinator,
    SystemClipboard, UrlCleaner,
};

#[derive(Parser)]
#[command(name = "purepaste")]
#[command(author, version, about = "Strips tracking parameters from URLs on the clipboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the clipboard and clean copied URLs until Ctrl-C
    Watch {
        /// Replace tracking values with "null" instead of removing the parameter
        #[arg(long)]
        replace: bool,
    },

    /// Clean a single URL and print the result
    Clean {
        text: String,

        #[arg(long)]
        replace: bool,
    },

    /// Refetch the remote rules and update the local cache
    Refresh,

    /// Build a rule payload from a removeparam filter list and a ClearURLs provider file
    BuildRules {
        /// Filter list path or http(s) URL
        #[arg(long)]
        general: String,

        /// Provider JSON path or http(s) URL
        #[arg(long)]
        providers: String,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "purepaste=debug" } else { "purepaste=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ConfigManager::get_default();

    match cli.command {
        Commands::Watch { replace } => cmd_watch(config, replace).await,
        Commands::Clean { text, replace } => cmd_clean(config, &text, replace),
        Commands::Refresh => cmd_refresh(config).await,
        Commands::BuildRules {
            general,
            providers,
            output,
        } => cmd_build_rules(config, &general, &providers, output).await,
    }
}

fn coordinator(config: GlobalConfig) -> anyhow::Result<Arc<RulesCoordinator>> {
    let coordinator = RulesCoordinator::new(config).context("failed to initialize rule loader")?;
    coordinator.bootstrap();
    Ok(Arc::new(coordinator))
}

async fn cmd_watch(config: GlobalConfig, replace: bool) -> anyhow::Result<ExitCode> {
    let coordinator = coordinator(config.clone())?;
    let clipboard = SystemClipboard::new().context("cannot access the system clipboard")?;
    let diag_log = coordinator.loader().diagnostic_log().clone();

    let local = LocalSet::new();
    local
        .run_until(async move {
            let watcher = ClipboardWatcher::new(clipboard, coordinator.clone(), &config).with_diagnostic_log(diag_log);
            watcher.set_replace_mode(replace);
            watcher.start();

            let refresher = Arc::clone(&coordinator);
            task::spawn_local(async move {
                if let Some(outcome) = refresher.refresh_if_needed_on_launch().await {
                    info!("{}", outcome.message);
                }
            });

            let signal = tokio::signal::ctrl_c().await;
            watcher.stop();
            signal.context("failed to listen for Ctrl-C")
        })
        .await?;

    Ok(ExitCode::SUCCESS)
}

fn cmd_clean(config: GlobalConfig, text: &str, replace: bool) -> anyhow::Result<ExitCode> {
    let coordinator = coordinator(config)?;

    match coordinator.clean_if_needed(text, replace) {
        Some(cleaned) => {
            println!("{}", cleaned);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            warn!("Input is not a cleanable http(s) URL");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn cmd_refresh(config: GlobalConfig) -> anyhow::Result<ExitCode> {
    let coordinator = coordinator(config)?;
    let outcome = coordinator.refetch_manually().await;
    println!("{}", outcome.message);

    let rules = coordinator.current_rules();
    info!(
        "Active rules: exact={}, regex={}, providers={}",
        rules.general_exact().len(),
        rules.general_regex().len(),
        rules.providers().len()
    );

    Ok(if outcome.had_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn cmd_build_rules(
    config: GlobalConfig,
    general: &str,
    providers: &str,
    output: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let fetcher = HttpRuleFetcher::new(config.http_timeout)?;
    let payload = build_payload_from_sources(
        &UpstreamSource::parse(general),
        &UpstreamSource::parse(providers),
        &fetcher,
    )
    .await
    .context("failed to build rule payload")?;

    // 输出前确认载荷可被编译
    let compiled = RuleCompiler::compile(&payload);
    info!(
        "Compiled payload: exact={}, regex={}, providers={}",
        compiled.general_exact().len(),
        compiled.general_regex().len(),
        compiled.providers().len()
    );

    let data = payload.to_vec()?;
    match output {
        Some(path) => {
            std::fs::write(&path, &data).with_context(|| format!("failed to write {}", path.display()))?;
            info!("Rule payload written to {}", path.display());
        }
        None => println!("{}", String::from_utf8_lossy(&data)),
    }

    Ok(ExitCode::SUCCESS)
}
