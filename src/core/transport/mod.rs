//! Authenticated HTTP and WebSocket plumbing.

pub mod auth;
pub mod channel;
pub mod rest;

pub use auth::{Authenticator, ChannelCredentials, Credentials, DEFAULT_IAM_URL};
pub use channel::{Channel, Connector, Frame, WebSocketChannel, WebSocketConnector};
pub use rest::HttpTransport;
