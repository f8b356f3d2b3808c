//! Integration tests for vwsync-vaultwarden
//!
//! Uses wiremock to simulate the Vaultwarden admin API and verifies the
//! client's login, re-login, and endpoint handling.

mod common;

mod test_directory;
mod test_session;
mod test_users;
