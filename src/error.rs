use crate::flow::StepKind;
use thiserror::Error;

/// Errors that abort the assembly of a single flow.
///
/// These are the only conditions the compiler treats as hard failures, and
/// even then the failure is scoped to one flow: the composer records the
/// error as a diagnostic and keeps compiling the rest of the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssemblyError {
    #[error("no step factory registered for kind '{0}'")]
    UnknownStepKind(StepKind),

    #[error("flow '{0}' assembled to an empty step sequence")]
    EmptyFlow(String),
}

/// Errors that can occur when converting recorded call descriptors into a
/// flow plan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("descriptor '{label}' has an unsupported HTTP method: '{method}'")]
    InvalidMethod { label: String, method: String },

    #[error("a recorded flow needs at least one call descriptor")]
    EmptyRecording,
}

/// Non-fatal conditions surfaced alongside the compiled output.
///
/// Every recovery path in the compiler emits one of these; nothing is
/// swallowed. `UnresolvedVariable` is the one error-severity kind: it causes
/// the owning flow to be dropped from the final document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    #[error("step '{step}' references '{variable}', which no earlier step produces and the seed set does not contain")]
    UnresolvedVariable { step: String, variable: String },

    #[error("step '{step}' has an endpoint with no recognizable host pattern: '{url}'")]
    UnrecognizedEndpointShape { step: String, url: String },

    #[error("seed variable '{variable}' declared twice with different defaults; keeping '{kept}', ignoring '{ignored}'")]
    AmbiguousSeedDefault {
        variable: String,
        kept: String,
        ignored: String,
    },

    #[error("step '{step}' asks for form encoding but its body is not flat; falling back to JSON")]
    UnsupportedBodyShape { step: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A diagnostic tied to the flow (and step) it originated from.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Name of the flow being compiled when the condition occurred, if any.
    pub flow: Option<String>,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(flow: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            flow: Some(flow.into()),
            kind,
        }
    }

    pub fn unscoped(kind: DiagnosticKind) -> Self {
        Self { flow: None, kind }
    }

    pub fn for_flow(mut self, flow: impl Into<String>) -> Self {
        self.flow = Some(flow.into());
        self
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            DiagnosticKind::UnresolvedVariable { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.flow {
            Some(flow) => write!(f, "[{}] {}", flow, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}
