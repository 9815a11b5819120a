//! Preprocess is the stage of the MIND pipeline that turns raw `behaviors` records
//! into click samples ready for training.
//!
//! The raw `behaviors` collections are written by `mind-fetch`, maybe from another
//! process that is still running. So the first step is to wait until every raw
//! collection we read has been seeded, see `mind_core::db::readiness`.
//!
//! Then each collection is read into a `DataFusion` table. All row level work is
//! done by `DataFusion` through a sequence of named SQL stages, see `behaviors`.
//! Each impression token `N123-1` becomes one row `(userId, newsId, clicked)`.
//!
//! How many negatives do we keep?
//!
//! One user usually sees many more news than they click. For each user we keep all
//! positives and at most `npratio` negatives, picked by a random key. The random key
//! is drawn again on each run, so two runs over the same raw data give different
//! negatives.
//!
//! The samples are appended to the output collections. Nothing is deduplicated, a
//! second run appends a second sample set.
pub mod behaviors;
pub mod sink;
pub mod table;
