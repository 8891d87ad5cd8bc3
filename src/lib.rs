// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]

//! # apicatalog
//!
//! A read-only query engine over a compact binary catalog of .NET APIs. The catalog records
//! every namespace, type and member shipped by a range of frameworks and packages, together
//! with obsoletion, platform support and preview facts for each declaration. `apicatalog`
//! answers questions such as "is this API available on `net8.0`, in-box or through a package,
//! and on which operating systems?".
//!
//! ## Features
//!
//! - **Zero-copy views** - Entities are `Copy` handles into one immutable buffer
//! - **Verified loading** - Every reference and string is checked once at load time
//! - **Fast fact lookup** - Binary search over sorted, fixed-width fact tables
//! - **Availability resolution** - In-box declarations first, then nearest package folders
//! - **Platform annotations** - Version ranges per operating system, with implied platforms
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use apicatalog::prelude::*;
//!
//! let catalog = Catalog::from_file("apicatalog.dat")?;
//! let availability = AvailabilityContext::with_defaults(&catalog);
//! let platforms = PlatformAnnotationContext::new(&availability, "net8.0")?;
//!
//! for api in catalog.all_apis().filter(|api| api.kind() == ApiKind::Class).take(20) {
//!     match availability.availability_by_name(api, "net8.0")? {
//!         Some(ApiAvailability::InBox { declaration, .. }) => {
//!             println!("{api} in {}: {}", declaration.assembly(), platforms.platform_annotation(api)?);
//!         }
//!         Some(ApiAvailability::Package { package, .. }) => println!("{api} via {package}"),
//!         None => println!("{api} is not available"),
//!     }
//! }
//! # Ok::<(), apicatalog::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`catalog`] - Stream framing, loading, verification, fact lookup and the writer
//! - [`model`] - Entity views: APIs, declarations, assemblies, frameworks, packages, facts
//! - [`availability`] - Framework parsing and in-box/package availability
//! - [`platform`] - Platform annotations and support ranges
//! - [`file`] - Primitive little-endian readers and writers
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (load summaries, verification progress, context
//! construction) and installs no subscriber.

#[macro_use]
pub(crate) mod error;

/// Primitive little-endian readers and writers over catalog bytes, and the file source.
pub mod file;

/// Small data structures shared across modules.
pub(crate) mod utils;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust,no_run
/// use apicatalog::prelude::*;
///
/// let catalog = Catalog::from_file("apicatalog.dat")?;
/// println!("{} root namespaces", catalog.root_apis().len());
/// # Ok::<(), apicatalog::Error>(())
/// ```
pub mod prelude;

/// Stream framing, loading and structural verification of catalogs.
///
/// The entry point is [`Catalog`]. [`catalog::CatalogBuilder`] writes catalogs in the same
/// format, for fixtures and tests.
pub mod catalog;

/// Zero-copy entity views over a loaded [`Catalog`].
pub mod model;

/// Availability of APIs per framework, in-box or through packages.
pub mod availability;

/// Platform annotations of APIs per framework.
pub mod platform;

mod options;
mod version;

/// `apicatalog` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust,no_run
/// use apicatalog::{Catalog, Result};
///
/// fn open(path: &str) -> Result<Catalog> {
///     Catalog::from_file(path)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `apicatalog` Error type
///
/// # Examples
///
/// ```rust,no_run
/// use apicatalog::{Catalog, Error};
///
/// match Catalog::from_file("apicatalog.dat") {
///     Ok(catalog) => println!("{} APIs", catalog.all_apis().count()),
///     Err(Error::UnsupportedVersion(version)) => println!("unsupported version {version}"),
///     Err(Error::Format { message, .. }) => println!("corrupt: {message}"),
///     Err(e) => println!("error: {e}"),
/// }
/// ```
pub use error::Error;

/// A loaded, immutable catalog.
pub use catalog::Catalog;

/// Options for loading catalogs and building platform annotations.
pub use options::{LoadOptions, PlatformOptions};

/// Four-part version numbers.
pub use version::Version;

/// Stable API identifier type, re-exported from `uguid`.
pub use uguid::Guid;
