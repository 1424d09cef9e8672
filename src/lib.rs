//! Git credential helper that brokers Basic/OAuth authentication against Git hosting
//! services and persists the resulting credentials in a secure store.
//!
//! The crate is driven by Git through the credential-helper protocol: a verb
//! (`get`, `store`, `erase`) plus a `key=value` query on standard input. The
//! [`commands`] module dispatches the verb, the [`provider`] registry selects the
//! host provider that owns the remote, and the provider negotiates an
//! authentication mode and generates a credential when the [`store`] has none.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod commands;
pub mod credential;
pub mod error;
pub mod input;
pub mod provider;
pub mod settings;
pub mod store;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use reqwest::Client as ReqwestClient;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

// The tracing subscriber is installed by the binary entry point only.
use tracing_subscriber as _;
#[cfg(test)] use httpmock as _;

pub use url;
