use clap::Parser;
use okta_auth::SessionStore;
use okta_auth_mcp::{OktaAuthServer, cli::Cli, logging};
use rmcp::{ServiceExt, transport::stdio};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let store = match cli.sessions_dir {
        Some(dir) => SessionStore::new(dir),
        None => SessionStore::default_location(),
    };
    info!(target = "okta_auth_mcp", dir = %store.dir().display(), "session store");

    if let Err(err) = serve(store).await {
        error!(target = "okta_auth_mcp", error = %err, "server failed");
        std::process::exit(1);
    }
}

async fn serve(store: SessionStore) -> anyhow::Result<()> {
    let service = OktaAuthServer::new(store).serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
