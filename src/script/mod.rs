//! Typed script statements and their rendering.
//!
//! A step's pre- and post-scripts are modeled as sequences of
//! [`ScriptStatement`]s — what the script *does* — and turned into
//! sandbox JavaScript by a single [`ScriptRenderer`] — what text encodes
//! it. The synthesizer never concatenates script text directly.

mod render;
mod synthesizer;

pub use render::ScriptRenderer;
pub use synthesizer::{ScriptSynthesizer, SynthesizedScripts};

use crate::flow::ResponseDelivery;

/// How a `client_assertion` gets signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionMethod {
    /// HS256 over the client secret, done inline (illustrative).
    ClientSecretHmac,
    /// RS256 with the registered private key; the script sandbox cannot
    /// sign this, so the statement wires in an externally signed value.
    PrivateKeyExternal,
}

/// One typed operation inside a generated script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStatement {
    /// `pm.test` asserting the response status code.
    AssertStatus { expected: u16 },
    /// Guarded extraction of a (possibly nested) response field into a
    /// variable. A missing field degrades to a console warning.
    ExtractField { path: Vec<String>, var: String },
    /// Extraction of a redirect parameter (query or fragment, depending on
    /// the delivery mode) into a variable.
    ExtractRedirectParam {
        param: String,
        var: String,
        delivery: ResponseDelivery,
    },
    /// PKCE pair generation: random verifier, derived S256 challenge.
    GeneratePkce {
        verifier_var: String,
        challenge_var: String,
    },
    /// Fresh random values for the named single-use variables (state,
    /// nonce).
    RefreshStateValues { vars: Vec<String> },
    /// HTTP Basic `Authorization` header built from two variables.
    BasicAuthHeader { id_var: String, secret_var: String },
    /// Construction of a signed client assertion into `var`.
    SignClientAssertion {
        method: AssertionMethod,
        var: String,
        audience: String,
    },
    /// A free-form comment line for the operator.
    Note { text: String },
}
