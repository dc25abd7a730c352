//! Helpers for tests that need a real, throwaway database. Enabled with the `test_utils` feature.
pub mod prepare_env;
