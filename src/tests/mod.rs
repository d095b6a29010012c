pub mod common;
pub mod snapshot_tests;
pub mod sweep_tests;
