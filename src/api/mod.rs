//! Client side of the remote records API.
//!
//! The API owns records and companies and their persistence rules; the
//! console only issues requests and reacts to success or failure.

mod client;

pub use client::{AgentaClient, ClientError};
