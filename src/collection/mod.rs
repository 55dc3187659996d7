//! Collection composition: rendering assembled flows into the hierarchical
//! output document and its companion seed.

mod composer;
mod document;
mod seed;

pub use composer::{CollectionCompiler, CollectionCompilerBuilder, CompileOutput};
pub use document::{
    BodyOptions, BodySpec, COLLECTION_SCHEMA, CollectionDocument, CollectionInfo, CollectionNode,
    CollectionVariable, Event, Folder, FormParamSpec, HeaderSpec, QuerySpec, RawBodyOptions,
    RequestItem, RequestSpec, ScriptSpec, UrlSpec,
};
pub use seed::{SeedDocument, SeedValue};
