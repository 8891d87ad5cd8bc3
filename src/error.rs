use thiserror::Error;

macro_rules! format_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Format {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Format {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into two groups. Load errors ([`Error::Format`], [`Error::UnsupportedVersion`],
/// [`Error::OutOfBounds`], [`Error::Io`]) are fatal to constructing a [`crate::Catalog`] and are
/// never retried internally; the caller decides whether to fetch the source again. Argument
/// errors ([`Error::Argument`]) are fatal to a single query and indicate caller misuse.
///
/// The absence of a fact (no obsoletion, no platform support rows, an API not available on a
/// framework) is never an error; those queries return `Option` or empty iterators.
///
/// # Examples
///
/// ```rust,no_run
/// use apicatalog::{Catalog, Error};
/// use std::path::Path;
///
/// match Catalog::from_file(Path::new("apicatalog.dat")) {
///     Ok(catalog) => println!("{} frameworks", catalog.frameworks().len()),
///     Err(Error::UnsupportedVersion(version)) => eprintln!("catalog version {version} is not supported"),
///     Err(Error::Format { message, file, line }) => eprintln!("corrupt catalog: {message} ({file}:{line})"),
///     Err(e) => eprintln!("failed to load catalog: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The catalog stream is damaged and could not be loaded.
    ///
    /// Raised for a bad magic literal, a truncated or corrupt compressed payload, invalid UTF-8
    /// in a string cell, or a reference that does not point at a row of its target table. The
    /// error includes the source location where the problem was detected.
    #[error("Format - {file}:{line}: {message}")]
    Format {
        /// The message to be printed for the Format error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The stream declares a format version other than [`crate::catalog::FORMAT_VERSION`].
    #[error("Unsupported catalog format version - {0}")]
    UnsupportedVersion(i32),

    /// An out of bound access was attempted while reading the catalog buffer.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// I/O error from the underlying stream or file.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// A query was called with an argument it cannot be answered for.
    ///
    /// Raised when a platform annotation is requested for an API that has no declaration under
    /// the selected framework, or when a framework name cannot be parsed or is unknown.
    #[error("Invalid argument - {0}")]
    Argument(String),
}

impl Error {
    /// Returns `true` if this error is fatal to a catalog load.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        !matches!(self, Error::Argument(_))
    }
}
