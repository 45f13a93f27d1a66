use std::path::Path;

use anyhow::Result;
use bamboo_cli_api::BambooClient;
use bamboo_cli_config::Config;
use bamboo_cli_output::OutputRenderer;
use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone, Default)]
pub struct LoginArgs {
    /// Store the host and username in the profile once the server accepts them
    #[arg(long)]
    pub save: bool,
}

/// Where a successful login is written back to.
pub struct SaveTarget<'a> {
    pub config: Config,
    pub path: Option<&'a Path>,
    pub profile: &'a str,
    pub host: &'a str,
    pub username: Option<&'a str>,
}

pub async fn execute(
    args: LoginArgs,
    client: &BambooClient,
    renderer: &OutputRenderer,
    target: SaveTarget<'_>,
) -> Result<()> {
    let server = client.test_login().await?;
    info!(version = %server.version, "Login succeeded");

    if args.save {
        let SaveTarget {
            mut config,
            path,
            profile,
            host,
            username,
        } = target;
        config.remember_profile(profile, host, username);
        config.save(path)?;
        info!(profile, "Profile saved");
    }

    renderer.render(&server)
}
