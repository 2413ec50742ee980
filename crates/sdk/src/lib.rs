//! # Bexio SDK
//!
//! HTTP client for the Bexio REST API, implementing the
//! [`bexio_core::BexioApi`] capability used by the tool dispatcher.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bexio_core::{BexioApi, Endpoint, PageRequest, Resource};
//! use bexio_sdk::{BexioClient, SdkResult};
//!
//! # async fn example() -> SdkResult<()> {
//! let client = BexioClient::builder()
//!     .api_token("your-personal-access-token")
//!     .build()?;
//!
//! let contacts = client
//!     .list(&Endpoint::of(Resource::Contacts), PageRequest::new(20, 0))
//!     .await
//!     .map_err(|e| bexio_sdk::SdkError::Config(e.message))?;
//! println!("Found {} contacts", contacts.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::{BexioClient, BexioClientBuilder};
pub use config::{ClientConfig, RetryConfig, DEFAULT_BASE_URL};
pub use error::{SdkError, SdkResult};
