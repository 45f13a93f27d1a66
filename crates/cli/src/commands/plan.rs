use anyhow::Result;
use bamboo_cli_api::pagination::collect_pages;
use bamboo_cli_api::BambooClient;
use bamboo_cli_output::OutputRenderer;
use clap::Subcommand;

use super::ListArgs;

#[derive(Subcommand, Debug, Clone)]
pub enum PlanCommand {
    /// List plans visible to the current user
    List(ListArgs),
    /// Show the state and number of a plan's latest build
    Latest {
        /// Plan key, like PROJECT_KEY-PLAN_KEY
        plan_key: String,
    },
    /// Show the number of a plan's latest successful build
    LatestSuccessful {
        /// Plan key, like PROJECT_KEY-PLAN_KEY
        plan_key: String,
        /// Extra query string passed to the server
        #[arg(long)]
        params: Option<String>,
    },
}

pub async fn execute(
    command: PlanCommand,
    client: &BambooClient,
    renderer: &OutputRenderer,
) -> Result<()> {
    match command {
        PlanCommand::List(args) => {
            let plans = match args.limit {
                Some(limit) => {
                    collect_pages(&client.plans_pager(args.params.as_deref()), Some(limit)).await?
                }
                None => client.all_plans(args.params.as_deref()).await?,
            };
            renderer.render(&plans)
        }
        PlanCommand::Latest { plan_key } => {
            let status = client.latest_build_status(&plan_key).await?;
            renderer.render(&[status])
        }
        PlanCommand::LatestSuccessful { plan_key, params } => {
            let number = client
                .latest_successful_build_number(&plan_key, params.as_deref())
                .await?;
            renderer.render(&number)
        }
    }
}
