pub mod feed_client_tests;
pub mod support;
