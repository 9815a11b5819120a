use anyhow::Result;
use clap::Parser;
use datafusion::prelude::SessionContext;
use log::info;

use mind_core::config::MindConfig;
use mind_core::db::db::MongoStore;
use mind_core::db::readiness::wait_for_data;
use mind_core::schema::{Split, BEHAVIORS_SCHEMA};
use mind_core::tool::init_log;
use mind_preprocess::behaviors::preprocess_behaviors;
use mind_preprocess::sink::write_to_store;
use mind_preprocess::table::fetch_data_from_store;

/// Build click samples from the raw MIND behaviors collections.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path of the `toml` config file.
    #[arg(short, long, default_value = "config/mind.toml")]
    config: String,

    /// Override `mongo.uri` of the config file.
    #[arg(long)]
    mongo_uri: Option<String>,

    /// Override `preprocess.npratio` of the config file.
    #[arg(long)]
    npratio: Option<usize>,

    /// Do not wait for the raw collections to be seeded.
    #[arg(long, default_value_t = false)]
    skip_wait: bool,
}

async fn run(args: Args) -> Result<()> {
    let mut config = MindConfig::from_config_file(&args.config)?;

    if let Some(uri) = args.mongo_uri {
        config.mongo.uri = uri;
    }
    if let Some(npratio) = args.npratio {
        config.preprocess.npratio = npratio;
    }

    let store = MongoStore::connect(&config.mongo.uri, &config.mongo.db_name).await?;

    if !args.skip_wait {
        wait_for_data(
            &store,
            &config.wait.collections,
            &config.wait.check_field,
            config.wait.timeout(),
            config.wait.interval(),
        )
        .await?;
    }

    let ctx = SessionContext::new();

    let train_df = fetch_data_from_store(
        &ctx,
        &store,
        Split::Train.behaviors_collection(),
        &BEHAVIORS_SCHEMA,
    )
    .await?;
    let valid_df = fetch_data_from_store(
        &ctx,
        &store,
        Split::Valid.behaviors_collection(),
        &BEHAVIORS_SCHEMA,
    )
    .await?;

    let (train_df, valid_df) =
        preprocess_behaviors(&ctx, train_df, valid_df, config.preprocess.npratio).await?;

    let preprocess = &config.preprocess;
    write_to_store(train_df, &store, &preprocess.output_train, preprocess.batch_size).await?;
    write_to_store(valid_df, &store, &preprocess.output_valid, preprocess.batch_size).await?;

    info!(
        "samples written to '{}' and '{}'",
        preprocess.output_train, preprocess.output_valid
    );

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
