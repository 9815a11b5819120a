//! Acquisition of the MIND dataset.
//!
//! For each split, the raw `behaviors` and `news` collections are populated from the
//! extracted TSV files, downloading the split archive only when needed:
//!
//! 1. Both collections already above their row-count thresholds: nothing to do.
//! 2. `<data_dir>/<split>/behaviors.tsv` exists: load from the extracted files.
//! 3. Otherwise: download the archive, extract it, then load.
//!
//! Loading a collection that already has documents is a no-op, so a run that failed
//! halfway can simply be restarted.
pub mod download;
pub mod loader;
