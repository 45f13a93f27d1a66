use anyhow::Result;
use bamboo_cli_api::pagination::collect_pages;
use bamboo_cli_api::BambooClient;
use bamboo_cli_output::OutputRenderer;
use clap::Subcommand;
use serde_json::{Map, Value};

use super::ListArgs;

/// Fields kept per build in list output unless `--full` is given.
const SUMMARY_FIELDS: &[&str] = &[
    "key",
    "number",
    "state",
    "lifeCycleState",
    "buildRelativeTime",
];

#[derive(Subcommand, Debug, Clone)]
pub enum BuildCommand {
    /// List the latest builds across all plans
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Print every field the server returned
        #[arg(long)]
        full: bool,
    },
    /// Show a single build as returned by the server
    Show {
        /// Build key, like PROJECT_KEY-PLAN_KEY-BUILD_NUMBER
        build_key: String,
        /// Extra query string passed to the server (e.g. "expand=artifacts")
        #[arg(long)]
        params: Option<String>,
    },
    /// Show the life cycle state of a build (e.g. InProgress, Finished)
    Status {
        build_key: String,
    },
    /// List change authors of a build and of the builds it depends on
    Changes {
        build_key: String,
    },
    /// List JIRA issues of a build and of the builds it depends on
    Issues {
        build_key: String,
    },
    /// Print the content of a shared artifact
    Artifact {
        build_key: String,
        /// Artifact name as defined in the plan
        name: String,
    },
}

pub async fn execute(
    command: BuildCommand,
    client: &BambooClient,
    renderer: &OutputRenderer,
) -> Result<()> {
    match command {
        BuildCommand::List { list, full } => {
            let builds = match list.limit {
                Some(limit) => {
                    collect_pages(&client.builds_pager(list.params.as_deref()), Some(limit)).await?
                }
                None => client.all_builds(list.params.as_deref()).await?,
            };

            if full {
                renderer.render(&builds)
            } else {
                let rows: Vec<Value> = builds.iter().map(summarize).collect();
                renderer.render(&rows)
            }
        }
        BuildCommand::Show { build_key, params } => {
            let build = client.build(&build_key, params.as_deref()).await?;
            renderer.render(&build)
        }
        BuildCommand::Status { build_key } => {
            let state = client.build_status(&build_key).await?;
            renderer.render(&state.unwrap_or_else(|| "Unknown".to_string()))
        }
        BuildCommand::Changes { build_key } => {
            let changes = client.changes_from_build(&build_key).await?;
            renderer.render(&changes)
        }
        BuildCommand::Issues { build_key } => {
            let issues = client.jira_issues_from_build(&build_key).await?;
            renderer.render(&issues)
        }
        BuildCommand::Artifact { build_key, name } => {
            let content = client.artifact_content(&build_key, &name).await?;
            print!("{content}");
            Ok(())
        }
    }
}

fn summarize(build: &Value) -> Value {
    let Value::Object(fields) = build else {
        return build.clone();
    };

    let summary: Map<String, Value> = SUMMARY_FIELDS
        .iter()
        .filter_map(|field| {
            fields
                .get(*field)
                .map(|value| (field.to_string(), value.clone()))
        })
        .collect();
    Value::Object(summary)
}
