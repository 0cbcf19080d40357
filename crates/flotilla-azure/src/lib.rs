//! Azure Container Instances backend.
//!
//! Talks to the ARM REST API directly: container groups are created with `PUT`,
//! inspected with `GET` and removed with `DELETE`; long-running operations are
//! followed through their `Azure-AsyncOperation` / `Location` headers.

mod config;
pub use config::AzureConfig;

mod error;
pub use error::AzureError;

mod credential;
pub use credential::{ClientSecretCredential, StaticToken, TokenCredential};

mod wire;

mod operation;
pub use operation::LroHandle;

mod client;
pub use client::AciClient;
