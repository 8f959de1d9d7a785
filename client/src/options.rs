use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(author, version, about = "Push and pull data from a Phatik server", long_about = None)]
pub(crate) struct Args {
    /// the server url to connect to
    #[arg(long, value_name = "URL")]
    pub(crate) endpoint: String,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// post a status to Phatik
    Post {
        /// the message to post
        message: String,
        /// the source application
        app: String,
        /// tags attached to the status
        tags: Vec<String>,
    },
    /// list recent statuses from the backend
    List {
        /// lowest id to fetch for incremental queries
        #[arg(long)]
        min_id: Option<i64>,
        /// number of messages to fetch
        #[arg(long)]
        count: Option<i64>,
        /// format of output
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Format {
    Json,
    Raw,
}
