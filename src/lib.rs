//! # Flowdeck - Flow-to-Collection Compiler
//!
//! **Flowdeck** compiles declarative descriptions of multi-step OAuth2/OIDC
//! exchanges into a self-contained, replayable API collection document
//! (collection v2.1 schema family) plus a companion variable-seed
//! environment. The compiler is a pure, synchronous transformation: flow
//! descriptors in, documents and diagnostics out — it never performs the
//! requests it describes, and the signing code it emits into scripts is
//! illustrative, not executed at build time.
//!
//! ## Core Workflow
//!
//! 1.  **Pick flows**: choose protocol variants ([`flow::FlowVariant`]),
//!     business scenarios ([`flow::Scenario`]), or convert recorded call
//!     descriptors through [`descriptor::FlowPlan`].
//! 2.  **Build the compiler**: `CollectionCompiler::builder` takes a
//!     [`config::CredentialProfile`] and the flow requests.
//! 3.  **Compile**: `compile()` assembles each flow from the step catalog,
//!     checks variable lineage, renders every step through the endpoint
//!     normalizer, body codec, and script synthesizer, and merges the
//!     results into one document tree.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowdeck::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let profile = CredentialProfile::default();
//!     let compiler = CollectionCompiler::builder(profile)
//!         .with_name("Identity flows")
//!         .with_builtin_flows()
//!         .with_uniqueness(Box::new(FixedUniqueness::new("demo")))
//!         .build();
//!
//!     let output = compiler.compile()?;
//!     println!(
//!         "compiled {} top-level folders with {} diagnostics",
//!         output.document.item.len(),
//!         output.diagnostics.len()
//!     );
//!
//!     let json = serde_json::to_string_pretty(&output.document)?;
//!     std::fs::write("collection.json", json)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - **Lineage**: every placeholder a rendered request references is either
//!   in the seed set or published by an earlier step of the same flow;
//!   violations surface as `UnresolvedVariable` diagnostics and drop only
//!   the offending flow.
//! - **Determinism**: with a fixed [`unique::UniquenessSource`], compiling
//!   the same input twice yields identical output.
//! - **Totality**: malformed URLs and unclassifiable bodies degrade to
//!   documented fallbacks with warnings; the compiler always terminates
//!   with a document.

pub mod binder;
pub mod codec;
pub mod collection;
pub mod config;
pub mod descriptor;
pub mod endpoint;
pub mod error;
pub mod flow;
pub mod prelude;
pub mod script;
pub mod unique;
