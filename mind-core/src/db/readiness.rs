//! Block until upstream stages have seeded the collections a consumer reads.
use anyhow::Result;
use log::{error, info};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::db::db::DocumentStore;

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("Data was not available in collection '{collection}' within {timeout:?}.")]
    Timeout { collection: String, timeout: Duration },
}

/// Poll each collection until one document has `check_field` set.
///
/// Collections are checked in order, each with its own `timeout` budget. The first
/// collection that stays empty for the whole budget fails the call with
/// `ReadinessError::Timeout`, the remaining ones are not checked.
///
/// A `timeout` of zero fails without polling.
pub async fn wait_for_data<S: DocumentStore + ?Sized>(
    store: &S,
    collection_names: &[String],
    check_field: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<bool> {
    for collection_name in collection_names {
        let start_time = Instant::now();
        let mut found = false;

        info!("Checking collection '{}' for data...", collection_name);

        while start_time.elapsed() < timeout {
            if store.has_field(collection_name, check_field).await? {
                info!("Data found in collection '{}'.", collection_name);
                found = true;
                break;
            }

            info!("Waiting for data in collection '{}'...", collection_name);
            tokio::time::sleep(interval).await;
        }

        if !found {
            let err = ReadinessError::Timeout {
                collection: collection_name.clone(),
                timeout,
            };
            error!("{}", err);

            return Err(err.into());
        }
    }

    info!("Data is available in all specified collections.");

    Ok(true)
}
