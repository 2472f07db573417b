use std::io;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    prelude::*,
    EnvFilter,
};

/// Initialize the logging system
pub fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if verbose {
        "debug,partsdesk=trace,actix_web=debug"
    } else {
        "info,partsdesk=info,actix_web=info"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap();

    let use_ansi = atty::is(atty::Stream::Stdout);
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(use_ansi)
        .with_writer(io::stdout);

    // Forward log crate records (actix access logs) to tracing
    let _ = tracing_log::LogTracer::init();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    tracing::info!("PID={} starting up", std::process::id());

    Ok(())
}

/// Print build and version information
pub fn print_build_info() {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let build_timestamp =
        std::env::var("VERGEN_BUILD_TIMESTAMP").unwrap_or_else(|_| chrono::Utc::now().to_rfc3339());
    let git_branch = std::env::var("VERGEN_GIT_BRANCH").unwrap_or_else(|_| "no-git".into());
    let git_sha_full = std::env::var("VERGEN_GIT_SHA").unwrap_or_else(|_| "00000000".into());
    let git_commit = git_sha_full.chars().take(8).collect::<String>();
    let desc = std::env::var("APP_PKG_DESCRIPTION").unwrap_or_else(|_| String::new());

    println!("{}", "═".repeat(60));
    println!("{} v{}", name, version);
    if !desc.is_empty() {
        println!("Description: {}", desc);
    }
    println!("{}", "─".repeat(60));
    println!("Build: {}", build_timestamp);
    println!("Git: {} ({})", git_branch, git_commit);
    println!("{}", "═".repeat(60));
    println!();
}

/// Log server startup information
pub fn log_server_startup(host: &str, port: u16) {
    tracing::info!("Server starting on http://{}:{}", host, port);
}
