//! Tests for collector services
//!
//! The HTTP client is exercised against a local `wiremock` server; the file
//! storage against a temporary directory.
