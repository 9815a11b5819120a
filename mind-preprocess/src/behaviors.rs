//! Behaviors to click samples.
//!
//! Each raw behaviors table goes through the following stages, each registered
//! as a view named `<label>_<stage>` on the session:
//!
//! 1. `canonical`: rename the raw columns.
//! 2. `exploded`: one row per impression token.
//! 3. `labeled`: `clicked` from the token suffix, `newsId` from the token prefix.
//! 4. `casted`: strip the `U` / `N` prefixes and cast ids to `INT`.
//! 5. `samples`: drop rows with any null id or label.
//! 6. `positives` / `negatives`: split by label. Negatives get a random tie break key
//!    and only the first `npratio` per `userId` are kept.
//! 7. `combined`: positives union all kept negatives.
//!
//! Negatives are partitioned by `userId` only, so a user without any click still
//! keeps up to `npratio` negatives.
use anyhow::Result;
use datafusion::prelude::{DataFrame, SessionContext};
use log::info;

pub const USER_PREFIX: &str = "U";
pub const NEWS_PREFIX: &str = "N";

/// Token suffix of a clicked impression.
pub const POSITIVE_SUFFIX: &str = "-1";

/// Separator between news id and label in an impression token.
pub const LABEL_SEPARATOR: &str = "-";

/// Separator between impression tokens.
pub const IMPRESSION_SEPARATOR: &str = " ";

#[inline]
fn view_name(label: &str, stage: &str) -> String {
    format!("{}_{}", label, stage)
}

/// Register `df` as view `name`, replacing any view of a previous run.
pub fn register_view(ctx: &SessionContext, name: &str, df: DataFrame) -> Result<()> {
    ctx.deregister_table(name)?;
    ctx.register_table(name, df.into_view())?;

    Ok(())
}

async fn run_stage(
    ctx: &SessionContext,
    label: &str,
    stage: &str,
    sql: &str,
) -> Result<DataFrame> {
    let name = view_name(label, stage);

    let df = ctx.sql(sql).await?;
    register_view(ctx, &name, df.clone())?;

    info!("registered stage view: {}", name);

    Ok(df)
}

/// Turn one raw behaviors table into the combined sample table.
///
/// The result has columns `userId: Int32`, `newsId: Int32` and `clicked: Int32`.
pub async fn process_behaviors(
    ctx: &SessionContext,
    label: &str,
    df: DataFrame,
    npratio: usize,
) -> Result<DataFrame> {
    let raw = view_name(label, "raw");
    register_view(ctx, &raw, df)?;

    let canonical = view_name(label, "canonical");
    run_stage(
        ctx,
        label,
        "canonical",
        &format!(
            r#"SELECT
                "impression_id" AS "impressionId",
                "user_id" AS "userId",
                "time" AS "timestamp",
                "history" AS "clicked",
                "impressions"
            FROM {raw}"#
        ),
    )
    .await?;

    let exploded = view_name(label, "exploded");
    run_stage(
        ctx,
        label,
        "exploded",
        &format!(
            r#"SELECT
                "userId",
                unnest(string_to_array("impressions", '{IMPRESSION_SEPARATOR}')) AS "impression"
            FROM {canonical}"#
        ),
    )
    .await?;

    let labeled = view_name(label, "labeled");
    run_stage(
        ctx,
        label,
        "labeled",
        &format!(
            r#"SELECT
                "userId",
                split_part("impression", '{LABEL_SEPARATOR}', 1) AS "newsId",
                CASE WHEN ends_with("impression", '{POSITIVE_SUFFIX}') THEN 1 ELSE 0 END AS "clicked"
            FROM {exploded}"#
        ),
    )
    .await?;

    let casted = view_name(label, "casted");
    run_stage(
        ctx,
        label,
        "casted",
        &format!(
            r#"SELECT
                TRY_CAST(regexp_replace("userId", '^{USER_PREFIX}', '') AS INT) AS "userId",
                TRY_CAST(regexp_replace("newsId", '^{NEWS_PREFIX}', '') AS INT) AS "newsId",
                CAST("clicked" AS INT) AS "clicked"
            FROM {labeled}"#
        ),
    )
    .await?;

    let samples = view_name(label, "samples");
    run_stage(
        ctx,
        label,
        "samples",
        &format!(
            r#"SELECT "userId", "newsId", "clicked"
            FROM {casted}
            WHERE "userId" IS NOT NULL AND "newsId" IS NOT NULL AND "clicked" IS NOT NULL"#
        ),
    )
    .await?;

    let positives = view_name(label, "positives");
    run_stage(
        ctx,
        label,
        "positives",
        &format!(
            r#"SELECT "userId", "newsId", "clicked"
            FROM {samples}
            WHERE "clicked" = 1"#
        ),
    )
    .await?;

    let negatives = view_name(label, "negatives");
    run_stage(
        ctx,
        label,
        "negatives",
        &format!(
            r#"SELECT "userId", "newsId", "clicked"
            FROM (
                SELECT
                    "userId",
                    "newsId",
                    "clicked",
                    ROW_NUMBER() OVER (PARTITION BY "userId" ORDER BY "tie_break") AS "sample_rank"
                FROM (
                    SELECT "userId", "newsId", "clicked", random() AS "tie_break"
                    FROM {samples}
                    WHERE "clicked" = 0
                ) AS keyed
            ) AS ranked
            WHERE "sample_rank" <= {npratio}"#
        ),
    )
    .await?;

    let combined = run_stage(
        ctx,
        label,
        "combined",
        &format!(
            r#"SELECT "userId", "newsId", "clicked" FROM {positives}
            UNION ALL
            SELECT "userId", "newsId", "clicked" FROM {negatives}"#
        ),
    )
    .await?;

    Ok(combined)
}

/// Preprocess the train and valid behaviors tables with the same `npratio`.
pub async fn preprocess_behaviors(
    ctx: &SessionContext,
    train_df: DataFrame,
    valid_df: DataFrame,
    npratio: usize,
) -> Result<(DataFrame, DataFrame)> {
    info!("Starting to preprocess MIND dataset, npratio: {}", npratio);

    let train_df = process_behaviors(ctx, "train", train_df, npratio).await?;
    let valid_df = process_behaviors(ctx, "valid", valid_df, npratio).await?;

    info!("Preprocessing of MIND dataset completed.");

    Ok((train_df, valid_df))
}
