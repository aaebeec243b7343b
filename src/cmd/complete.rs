use clap::{Args, Subcommand};
use snafu::prelude::*;
use std::io::Write;

use super::GlobalArgs;
use crate::config::CmndsevenConfig;
use crate::engine::{self, EngineClient};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to load configuration"))]
    Config { source: config::ConfigError },

    #[snafu(display("Engine request failed"))]
    Engine { source: engine::Error },

    #[snafu(display("Failed to write candidates"))]
    Write { source: std::io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Args, Debug)]
pub struct CompleteArgs {
    #[command(subcommand)]
    pub command: CompleteCommands,
}

#[derive(Subcommand, Debug)]
pub enum CompleteCommands {
    /// List open user tasks as shell-completion candidates
    UserTask {
        /// Process instance whose tasks are listed; omit to list instances
        #[arg(value_name = "INSTANCE_ID")]
        instance_id: Option<String>,

        /// Task ID prefix to filter by
        #[arg(value_name = "TASK_ID")]
        task_id: Option<String>,
    },
}

/// Completion candidates for `user-task`, one per line.
///
/// Without an instance: process instance ids with open tasks, first-seen order.
/// With an instance: `task_id<TAB>name` for its tasks, optionally filtered by id prefix.
pub async fn user_task_candidates(
    client: &EngineClient,
    instance_id: Option<&str>,
    task_prefix: Option<&str>,
) -> engine::Result<Vec<String>> {
    let Some(instance_id) = instance_id else {
        let mut seen = Vec::new();
        for task in client.tasks(None).await? {
            if let Some(id) = task.process_instance_id
                && !seen.contains(&id)
            {
                seen.push(id);
            }
        }
        return Ok(seen);
    };

    let prefix = task_prefix.unwrap_or("");
    Ok(client
        .tasks(Some(instance_id))
        .await?
        .into_iter()
        .filter(|task| task.id.starts_with(prefix))
        .map(|task| match task.name.or(task.task_definition_key) {
            Some(name) => format!("{}\t{name}", task.id),
            None => task.id,
        })
        .collect())
}

/// Handle the complete subcommand
pub async fn handle_complete(global: &GlobalArgs, args: CompleteArgs) -> Result<()> {
    let config = CmndsevenConfig::load(global.config.as_deref()).context(ConfigSnafu)?;
    let client = EngineClient::new(&global.merge_with_config(&config)).context(EngineSnafu)?;

    let candidates = match &args.command {
        CompleteCommands::UserTask {
            instance_id,
            task_id,
        } => user_task_candidates(&client, instance_id.as_deref(), task_id.as_deref())
            .await
            .context(EngineSnafu)?,
    };

    let mut stdout = std::io::stdout().lock();
    for candidate in candidates {
        writeln!(stdout, "{candidate}").context(WriteSnafu)?;
    }
    Ok(())
}
