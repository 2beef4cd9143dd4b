use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory holding config.yaml
    #[clap(long, global = true, default_value = ".")]
    pub base_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a query and print its tokens
    Parse {
        /// A space delimited post search query
        query: String,
    },

    /// Search posts
    Search {
        /// A space delimited post search query, e.g. "cat -dog comment_count>2"
        #[clap(default_value = "")]
        query: String,

        /// Board file, overrides the configured one
        #[clap(long)]
        board: Option<PathBuf>,

        /// Comma separated tag ids to exclude, added to the configured filter tags
        #[clap(long)]
        exclude_tags: Option<String>,

        /// Only print the number of matching posts
        #[clap(long, default_value = "false")]
        count: bool,
    },

    /// Search posts with form fields, e.g. `tagset=3 height=600 height_relation=>`
    SearchForm {
        /// KEY=VALUE pairs
        fields: Vec<String>,

        /// Board file, overrides the configured one
        #[clap(long)]
        board: Option<PathBuf>,

        /// Only print the number of matching posts
        #[clap(long, default_value = "false")]
        count: bool,
    },

    /// Suggest tags, aliases and filters for a query
    Autocomplete {
        /// Query typed so far, its last fragment is completed
        #[clap(default_value = "")]
        query: String,

        /// Complete this instead of the last fragment of the query
        #[clap(long)]
        partial: Option<String>,

        /// Don't suggest filter names
        #[clap(long, default_value = "false")]
        no_filters: bool,

        /// Board file, overrides the configured one
        #[clap(long)]
        board: Option<PathBuf>,
    },

    /// List search filters
    Filters {},

    /// Serve the JSON api
    Daemon {},
}
