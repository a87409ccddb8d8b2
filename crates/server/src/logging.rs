use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub fn init_logging(verbosity: u8) {
    // 0 = info for this crate, quiet CDP internals
    // 1 (-v) = debug for this crate
    // 2+ (-vv) = debug for everything
    let default_filter = match verbosity {
        0 => "info,chromiumoxide=warn",
        1 => "info,okta_auth=debug,okta_auth_mcp=debug,chromiumoxide=warn",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout carries the MCP protocol; all logs go to stderr.
    let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr)
        .with_target(true)
        .with_level(true)
        .compact()
        .init();
}
