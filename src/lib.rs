//! Keeps a local mirror of authorizer records in step with a remote directory: paginated full
//! pulls, bounded concurrent profile enrichment, diff-gated refresh-on-read, and a reaper that
//! only runs after a clean cycle.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod directory;
pub mod error;
pub mod http;
pub mod model;
pub mod obs;
pub mod store;
pub mod sync;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Semaphore;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
