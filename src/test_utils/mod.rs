//! Utilities for setting up throwaway databases in tests.
pub mod prepare_env;

pub use prepare_env::{create_test_database, prepare_logging, prepare_test_env, random_db_url};
