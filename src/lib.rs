//! Typed Rust client for the Vonage communications REST APIs.
//!
//! The crate has three layers: a domain layer of validated values (no I/O), a
//! transport layer for wire formats and HTTP, and a client layer that registers
//! typed endpoints once and runs each call through the same pipeline (resolve
//! auth, resolve path, encode, send, decode).
//!
//! ```rust,no_run
//! use vonage::{AuthMethod, Channel, MessageContent, MessageRequest, VonageClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vonage::VonageError> {
//!     let client = VonageClient::new(AuthMethod::token("api-key", "api-secret")?)?;
//!     let request = MessageRequest::builder(Channel::Sms, MessageContent::text("hello"))
//!         .to("+44 7700 900000")
//!         .from("Acme")
//!         .build()?;
//!     let response = client.messages().send(&request).await?;
//!     println!("{}", response.message_uuid);
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod domain;
pub mod endpoint;
pub mod error;
pub mod transport;

pub use auth::{AuthMethod, AuthMethodType, Credentials};
pub use client::{
    AccountClient, MessagesClient, ProactiveConnectClient, SubaccountsClient, VonageClient,
    VonageClientBuilder,
};
pub use domain::{
    Channel, ContactsList, E164Number, ListId, ListItemId, MessageContent, MessageRequest,
    MessageResponse, MessageUuid, ValidationError,
};
pub use endpoint::{Dispatcher, Endpoint, EndpointSpec};
pub use error::{ApiDomain, ApiResponseError, ProblemDetail, VonageError};
pub use transport::{DownloadTarget, Downloaded, HttpConfig, HttpTransport, Region};
