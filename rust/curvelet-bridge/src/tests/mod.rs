mod error_tests;
mod ownership_tests;
