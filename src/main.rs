use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod media;
mod posts;
mod search;
mod storage;
#[cfg(test)]
mod tests;
mod web;
use config::Config;
use posts::{BackendMemory, PostStore};
use search::{PostSearch, StructuredQuery, TagId};

/// Parses a comma or space separated list of tag ids.
pub fn parse_tag_ids(ids: &str) -> anyhow::Result<Vec<TagId>> {
    ids.split(&[',', ' '])
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<TagId>()
                .with_context(|| format!("{value:?} is not a tag id"))
        })
        .collect()
}

/// Splits `KEY=VALUE` arguments at the first `=`.
pub fn parse_form_fields(fields: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    fields
        .iter()
        .map(|field| match field.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None => bail!("form field {field:?} is not a KEY=VALUE pair"),
        })
        .collect()
}

fn load_store(config: &Config, board: Option<PathBuf>) -> anyhow::Result<BackendMemory> {
    let path = board.unwrap_or_else(|| config.board_path());
    BackendMemory::load(&path)
}

fn print_posts(store: &dyn PostStore, search: &PostSearch, count: bool) -> anyhow::Result<()> {
    let posts = search.get_posts(store)?;

    if count {
        println!("{} posts found", posts.len());
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&posts)?);
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = cli::Args::parse();

    let config = Config::load_with(&args.base_dir)?;

    match args.command {
        cli::Command::Parse { query } => {
            let search = PostSearch::parse(&query)?;
            println!("{}", serde_json::to_string_pretty(&search.tokens)?);
            Ok(())
        }

        cli::Command::Search {
            query,
            board,
            exclude_tags,
            count,
        } => {
            let store = load_store(&config, board)?;

            let mut excluded = config.filter_tags.clone();
            if let Some(ids) = exclude_tags {
                excluded.extend(parse_tag_ids(&ids)?);
            }

            let search = PostSearch::parse(&query)?.with_exclude_tags(excluded);
            print_posts(&store, &search, count)
        }

        cli::Command::SearchForm {
            fields,
            board,
            count,
        } => {
            let store = load_store(&config, board)?;

            let query = StructuredQuery::from_pairs(parse_form_fields(&fields)?);
            let search = PostSearch::from_structured(&query)?
                .with_exclude_tags(config.filter_tags.iter().copied());
            print_posts(&store, &search, count)
        }

        cli::Command::Autocomplete {
            query,
            partial,
            no_filters,
            board,
        } => {
            let store = load_store(&config, board)?;

            let search = PostSearch::parse(&query)?
                .with_exclude_tags(config.filter_tags.iter().copied())
                .with_limits(config.suggestion_limits());
            let show_filters = config.show_filters && !no_filters;
            let items = search
                .autocomplete(&store, partial.as_deref(), None, show_filters)?
                .collect::<Vec<_>>();

            println!("{}", serde_json::to_string_pretty(&items)?);
            Ok(())
        }

        cli::Command::Filters {} => {
            for info in search::filter_infos() {
                println!("{}", info.category);
                if !info.aliases.is_empty() {
                    println!("  aliases: {}", info.aliases.join(", "));
                }
                let relations = info
                    .relations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>();
                println!("  operators: {}", relations.join(" "));
                println!("  wildcards: {}", if info.wildcards { "yes" } else { "no" });
                println!("  {}", info.desc);
                println!();
            }
            Ok(())
        }

        cli::Command::Daemon {} => {
            let store = load_store(&config, None)?;
            web::start_daemon(config, store)
        }
    }
}
