//! Storage test suite

mod table_tests;
