//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types so callers can bring the whole
//! compiler surface in with one line.

// Compilation facade
pub use crate::collection::{CollectionCompiler, CollectionCompilerBuilder, CompileOutput};

// Output documents
pub use crate::collection::{CollectionDocument, CollectionNode, Folder, RequestItem, SeedDocument};

// Flow selection
pub use crate::flow::{
    ClientAuthMethod, FlowVariant, GrantShape, PkceMode, ProtocolBaseline, ResponseDelivery,
    Scenario,
};

// Step model
pub use crate::flow::{
    BodyField, BodyShape, Encoding, FieldValue, Header, Method, StepKind, StepTemplate,
};

// Recorded input
pub use crate::descriptor::{CallDescriptor, DescriptorHeader, FlowPlan, IntoFlowPlan};

// Endpoint templating
pub use crate::endpoint::{EndpointNormalizer, EndpointTemplate, HostCatalog};

// Configuration and determinism
pub use crate::config::CredentialProfile;
pub use crate::unique::{FixedUniqueness, RandomUniqueness, UniquenessSource};

// Errors and diagnostics
pub use crate::error::{AssemblyError, DescriptorError, Diagnostic, DiagnosticKind, Severity};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
