//! CLI entry point for the harvester tool.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use harvester_core::auth::{
    AuthSession, CredentialMode, CredentialPrompt, CredentialStore, LoginProfile, MarkerCheck,
    NoPrompt, TerminalPrompt,
};
use harvester_core::batch::{DownloadOrchestrator, PageAnalysis, RunContext, RunSummary};
use harvester_core::download::{ClientOptions, HttpClient, constants};
use harvester_core::parser::{PageTarget, Selection};
use harvester_core::user_agent::select_user_agent;
use tracing::{debug, info, warn};

mod app_config;
mod cli;

use app_config::{FileConfig, VerbositySetting, load_config, resolve_default_credentials_path};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = load_config(args.config.as_deref())?;
    let file_config = loaded.file_config();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => file_config.verbosity.map_or("info", |v| v.log_level()),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(
        ?args,
        config_path = ?loaded.path,
        config_verbosity = file_config.verbosity.map(VerbositySetting::as_str),
        "CLI arguments parsed"
    );
    info!("Harvester starting");

    let input_urls = if !args.urls.is_empty() {
        args.urls.clone()
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    } else {
        info!("No input provided. Pipe page URLs via stdin or pass them as arguments.");
        info!("Example: harvester -e mp4,jpg https://example.com/gallery.html");
        return Ok(());
    };

    let targets = build_targets(&input_urls, &args);
    if targets.is_empty() {
        info!("No valid page URLs found in input");
        return Ok(());
    }

    let client = HttpClient::with_options(ClientOptions {
        connect_timeout_secs: file_config
            .connect_timeout_secs
            .unwrap_or(constants::CONNECT_TIMEOUT_SECS),
        read_timeout_secs: file_config
            .read_timeout_secs
            .unwrap_or(constants::READ_TIMEOUT_SECS),
        user_agent: select_user_agent(
            args.browser_ua || file_config.browser_user_agent.unwrap_or(false),
        ),
        cookie_jar: None,
    })
    .context("Failed to build HTTP client")?;

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| file_config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let selection = Selection::extensions(&args.extensions);

    let mut ctx = RunContext::new(&output_dir)
        .with_context(|| format!("Cannot use output directory '{}'", output_dir.display()))?
        .with_selection(selection)
        .with_collision_policy(args.collision.or(file_config.collision).unwrap_or_default());
    if let Some(store) = open_credential_store(&args, &file_config)? {
        ctx = ctx.with_credential_store(store);
    }

    let orchestrator = DownloadOrchestrator::new(Arc::new(client))
        .with_auth_session(AuthSession::new(login_profile(&args, &file_config)));
    if args.analyze_only {
        let analyses = orchestrator.analyze(&targets, ctx).await;
        return print_analyses(&analyses, args.json);
    }
    let summary = orchestrator.run(targets, ctx).await;

    print_summary(&summary, args.json)?;
    Ok(())
}

fn build_targets(urls: &[String], args: &Args) -> Vec<PageTarget> {
    let mut targets = Vec::with_capacity(urls.len());
    for url in urls {
        match PageTarget::from_parts(url, args.username.as_deref(), args.password.as_deref()) {
            Ok(target) if args.login => targets.push(target.requiring_auth()),
            Ok(target) => targets.push(target),
            Err(e) => warn!(input = %url, error = %e, "Skipped invalid page URL"),
        }
    }
    targets
}

fn open_credential_store(args: &Args, file_config: &FileConfig) -> Result<Option<CredentialStore>> {
    let explicit = args
        .credentials_file
        .clone()
        .or_else(|| file_config.credentials_file.clone());
    let required = explicit.is_some();
    let Some(path) = explicit.or_else(resolve_default_credentials_path) else {
        debug!("no credential file location available");
        return Ok(None);
    };

    let mode = args
        .credential_mode
        .or(file_config.credential_mode)
        .unwrap_or(CredentialMode::Saved);
    let prompt: Box<dyn CredentialPrompt + Send> = if args.no_prompt {
        Box::new(NoPrompt)
    } else {
        TerminalPrompt::if_terminal()
    };

    let store = CredentialStore::open(&path, required, mode, prompt)
        .with_context(|| format!("Cannot open credential file '{}'", path.display()))?;
    debug!(path = %path.display(), %mode, "credential store ready");
    Ok(Some(store))
}

fn login_profile(args: &Args, file_config: &FileConfig) -> LoginProfile {
    let mut profile = LoginProfile::default();
    if let Some(path) = args.login_path.clone().or_else(|| file_config.login_path.clone()) {
        profile = profile.with_login_path(path);
    }
    if let Some(field) = args
        .username_field
        .clone()
        .or_else(|| file_config.username_field.clone())
    {
        profile = profile.with_username_field(field);
    }
    if let Some(field) = args
        .password_field
        .clone()
        .or_else(|| file_config.password_field.clone())
    {
        profile = profile.with_password_field(field);
    }

    let mut markers = args.success_markers.clone();
    if markers.is_empty()
        && let Some(marker) = file_config.login_success_marker.clone()
    {
        markers.push(marker);
    }
    if markers.is_empty() {
        profile
    } else {
        profile.with_check(MarkerCheck::new(markers))
    }
}

fn print_analyses(analyses: &[PageAnalysis], json: bool) -> Result<()> {
    let mut reports = Vec::with_capacity(analyses.len());
    let mut failed = 0usize;

    for analysis in analyses {
        let report = match &analysis.report {
            Ok(report) => report,
            Err(reason) => {
                warn!(url = %analysis.url, error = %reason, "page analysis failed");
                failed += 1;
                continue;
            }
        };
        if json {
            reports.push(serde_json::json!({
                "url": analysis.url,
                "per_extension": report.per_extension,
                "per_category": report.per_category,
                "grand_total": report.grand_total,
            }));
        } else {
            println!("{}", analysis.url);
            if report.is_empty() {
                println!("  no file links found");
            }
            for (category, count) in &report.per_category {
                println!("  {category}: {count}");
            }
            for (extension, count) in &report.per_extension {
                println!("    .{extension}: {count}");
            }
            println!("  total: {}", report.grand_total);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    if failed == analyses.len() {
        bail!("No page could be analyzed");
    }
    Ok(())
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!(
        "Pages processed: {}\nFiles found: {}\nFiles downloaded: {}",
        summary.pages_processed, summary.files_found, summary.files_downloaded
    );
    if !summary.is_clean() {
        println!("Failures ({}):", summary.failures.len());
        for failure in &summary.failures {
            println!("  {} - {}", failure.url, failure.reason);
        }
    }
    Ok(())
}
