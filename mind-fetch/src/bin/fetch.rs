use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use mind_core::config::MindConfig;
use mind_core::db::db::MongoStore;
use mind_core::tool::init_log;
use mind_fetch::loader::fetch_mind;

/// Download the MIND dataset and load the raw records into mongodb.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path of the `toml` config file.
    #[arg(short, long, default_value = "config/mind.toml")]
    config: String,

    /// Override `mongo.uri` of the config file.
    #[arg(long)]
    mongo_uri: Option<String>,

    /// Override `dataset.data_dir` of the config file.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

async fn run(args: Args) -> Result<()> {
    let mut config = MindConfig::from_config_file(&args.config)?;

    if let Some(uri) = args.mongo_uri {
        config.mongo.uri = uri;
    }
    if let Some(data_dir) = args.data_dir {
        config.dataset.data_dir = Some(data_dir);
    }

    let store = MongoStore::connect(&config.mongo.uri, &config.mongo.db_name).await?;

    // Keep the temporary directory alive until loading is done.
    let tmpdir;
    let data_path = match &config.dataset.data_dir {
        Some(dir) => dir.clone(),
        None => {
            tmpdir = tempfile::tempdir()?;
            tmpdir.path().to_path_buf()
        }
    };

    fetch_mind(&store, &config, &data_path).await?;

    info!("MIND {} dataset is loaded", config.dataset.size);

    Ok(())
}

fn main() -> Result<()> {
    init_log();

    let args = Args::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(args))?;

    Ok(())
}
