use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use feedline_client::config::{ConfigFile, FeedlineConfig, FeedlinePaths};
use feedline_client::feed::{FeedFilter, SortOrder};
use feedline_client::session::FileSessionStore;
use feedline_client::{telemetry, FeedApp};

mod cli;

#[derive(Parser)]
#[command(author, version, about = "Feedline terminal client")]
struct Args {
    /// Base URL of the posts collection
    #[arg(long)]
    api_url: Option<String>,
    /// Directory holding config.toml and the stored username
    #[arg(long)]
    home: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive feed: sign in, browse, post, edit and delete
    Shell,
    /// Print the feed once and exit
    List {
        /// newest or oldest
        #[arg(long, default_value = "newest")]
        sort: String,
        /// Only show posts by the stored username
        #[arg(long)]
        mine: bool,
        #[arg(long)]
        search: Option<String>,
        /// How many pages to fetch before printing
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();
    let config = load_config(&args)?;
    tracing::info!(
        api = %config.api_base_url,
        home = %config.paths.base.display(),
        "configuration loaded"
    );

    let posts = feedline_client::connect(&config)?;
    let store = FileSessionStore::new(&config.paths.username_file);
    let app = FeedApp::new(posts, Box::new(store))?;

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => cli::run_shell(app).await,
        Command::List {
            sort,
            mine,
            search,
            pages,
        } => {
            let sort: SortOrder = sort.parse()?;
            let filter = if mine { FeedFilter::Mine } else { FeedFilter::All };
            cli::print_feed_once(app, sort, filter, search.unwrap_or_default(), pages).await
        }
    }
}

fn load_config(args: &Args) -> Result<FeedlineConfig> {
    let mut config = match &args.home {
        Some(home) => {
            let paths = FeedlinePaths::from_base_dir(home)?;
            let file = ConfigFile::load(&paths.config_file)?;
            FeedlineConfig::from_parts(paths, file)
        }
        None => FeedlineConfig::from_env()?,
    };
    if let Some(api_url) = &args.api_url {
        config.api_base_url = api_url.clone();
    }
    Ok(config)
}
