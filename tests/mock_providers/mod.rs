//! Mock speech service endpoints
//!
//! WebSocket recognition channel speaking the Watson v1 protocol. REST
//! endpoints are mocked per test with wiremock.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod websocket_mock;

pub use websocket_mock::*;
