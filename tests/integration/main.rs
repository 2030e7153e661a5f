//! Integration tests for Unit-Harvest
//!
//! These tests use wiremock to stand in for the catalog site and drive full
//! harvest runs end-to-end against temporary output files.

mod harvest_tests;
