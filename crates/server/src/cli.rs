use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "okta-auth-mcp")]
#[command(about = "MCP server automating Okta SSO browser login and session reuse")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v debug for this crate, -vv debug for everything)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory holding stored session blobs (default: ~/.okta-auth-mcp/sessions)
    #[arg(long, value_name = "DIR")]
    pub sessions_dir: Option<PathBuf>,
}
