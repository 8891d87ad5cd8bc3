//! # apicatalog Prelude
//!
//! The types needed for most catalog queries: loading, walking the API forest, and resolving
//! availability and platform annotations.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all apicatalog operations
pub use crate::Error;

/// The result type used throughout apicatalog
pub use crate::Result;

/// Options for loading and platform annotation
pub use crate::{LoadOptions, PlatformOptions};

/// Version numbers of frameworks and platforms
pub use crate::Version;

/// Stable API and assembly ids
pub use crate::Guid;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// A loaded catalog
pub use crate::Catalog;

/// Writer for catalogs in the same format
pub use crate::catalog::{CatalogBuilder, MarkupBuilder};

// ================================================================================================
// Entity Views
// ================================================================================================

/// APIs and their traversal
pub use crate::model::{Api, ApiDeclaration, ApiKind, ApiUsage};

/// Containers of declarations
pub use crate::model::{Assembly, Framework, Package, Platform, UsageSource};

/// Declaration-scoped facts
pub use crate::model::{Obsoletion, PlatformSupport, PreviewRequirement};

/// Signature markup
pub use crate::model::{Markup, MarkupToken, MarkupTokenKind};

// ================================================================================================
// Queries
// ================================================================================================

/// Availability resolution
pub use crate::availability::{
    ApiAvailability, AvailabilityContext, FrameworkName, FrameworkResolver, MonikerResolver,
};

/// Platform annotations
pub use crate::platform::{
    PlatformAnnotation, PlatformAnnotationContext, PlatformAnnotationKind, PlatformSupportRange,
};
