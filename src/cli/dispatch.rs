use super::Cli;
use super::commands::{Command, ConfigCommand, PagingArgs};
use crate::{
    Result,
    collector::{Collection, Target},
    config::Config,
    handlers, output,
};
use std::sync::Arc;

pub async fn dispatch(cli: Cli, config: Arc<Config>) -> Result<()> {
    let json = cli.json;
    let pretty = config.output.json_pretty;

    match cli.command {
        Command::Search { query, paging } => {
            collect(Target::search(query), paging, &config, json, pretty).await
        }
        Command::Replies {
            tweet_id,
            since,
            until,
            paging,
        } => {
            let target = Target::replies(tweet_id).with_window(since, until);
            collect(target, paging, &config, json, pretty).await
        }
        Command::Retweeters { tweet_id, paging } => {
            collect(Target::retweeters(tweet_id), paging, &config, json, pretty).await
        }
        Command::Flatten {
            file,
            kind,
            csv_dir,
        } => {
            let out_dir = csv_dir.unwrap_or_else(|| config.output.csv_dir.clone());
            let result = handlers::flatten::handle_flatten(&file, kind.map(Into::into), &out_dir)?;
            output::print_output(&result, json, pretty)
        }
        Command::Merge {
            files,
            output: merged,
        } => {
            let result = handlers::flatten::handle_merge(&files, &merged)?;
            output::print_output(&result, json, pretty)
        }
        Command::Config { subcommand } => handle_config_command(subcommand, &config, json),
    }
}

async fn collect(
    target: Target,
    paging: PagingArgs,
    config: &Config,
    json: bool,
    pretty: bool,
) -> Result<()> {
    let collection = Collection::new(target)
        .with_limit(paging.limit)
        .resume_from(paging.resume);

    let result = handlers::collect::handle_collect(config, collection).await?;
    output::print_output(&result, json, pretty)
}

fn handle_config_command(subcommand: ConfigCommand, config: &Config, json: bool) -> Result<()> {
    match subcommand {
        ConfigCommand::Init => {
            let result = handlers::config_handler::handle_config_init()?;
            output::print_output(&result, json, true)
        }
        ConfigCommand::Show => {
            let result = handlers::config_handler::handle_config_show(config)?;
            output::print_output(&result, json, true)
        }
        ConfigCommand::Path => {
            let result = handlers::config_handler::handle_config_path()?;
            output::print_output(&result, json, true)
        }
    }
}
