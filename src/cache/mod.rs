//! On-disk locations of per-repository run artifacts

pub mod paths;

pub use paths::{get_data_dir, get_snapshot_path, get_store_path, SNAPSHOT_FILE, STORE_FILE};
