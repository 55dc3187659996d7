//! Variable lineage tracking.
//!
//! The binder walks a flow's step sequence in order, accumulating each
//! step's published variables into the live scope after the step, and
//! checking every reference against the scope before it. The resulting
//! report is the single source of truth for who produces what — document
//! generation reads it directly and never re-derives lineage from rendered
//! script text.

use crate::error::{Diagnostic, DiagnosticKind};
use crate::flow::StepTemplate;
use ahash::AHashMap;
use tracing::error;

/// Extracts `{{name}}` placeholders from a rendered string, in order.
///
/// Builtin dynamic values (`{{$guid}}`-style) are not variables and are
/// skipped.
pub fn placeholders_in(text: &str) -> Vec<String> {
    let mut vars = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        rest = &rest[start + 2..];
        let Some(end) = rest.find("}}") else { break };
        let name = &rest[..end];
        rest = &rest[end + 2..];
        if !name.is_empty()
            && !name.starts_with('$')
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            vars.push(name.to_string());
        }
    }
    vars
}

/// A named value that flows between steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub origin: VarOrigin,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VarOrigin {
    /// Present in the seed document before any step runs.
    Seed { default: String, secret: bool },
    /// Published by exactly one step in the owning flow.
    Step { step: String },
}

impl Variable {
    pub fn seed(
        name: impl Into<String>,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            origin: VarOrigin::Seed {
                default: default.into(),
                secret: false,
            },
            description: description.into(),
        }
    }

    pub fn secret(
        name: impl Into<String>,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            origin: VarOrigin::Seed {
                default: default.into(),
                secret: true,
            },
            description: description.into(),
        }
    }

    pub fn produced(
        name: impl Into<String>,
        step: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            origin: VarOrigin::Step { step: step.into() },
            description: description.into(),
        }
    }
}

/// Where a consumed reference was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Producer {
    Seed,
    Step { index: usize, name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRef {
    pub variable: String,
    pub producer: Producer,
}

/// The binding outcome for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepBinding {
    pub step: String,
    pub resolved: Vec<ResolvedRef>,
    pub produces: Vec<String>,
}

/// The binding outcome for a whole flow.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingReport {
    pub steps: Vec<StepBinding>,
    pub unresolved: Vec<Diagnostic>,
}

impl BindingReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Walks step sequences and checks the lineage invariant.
pub struct VariableBinder {
    seed: Vec<String>,
}

impl VariableBinder {
    pub fn new(seed_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            seed: seed_names.into_iter().collect(),
        }
    }

    pub fn bind(&self, flow_name: &str, steps: &[StepTemplate]) -> BindingReport {
        // Producers published outside any branch, visible to every later step.
        let mut shared: AHashMap<String, (usize, String)> = AHashMap::new();
        // Branch-local producers, visible only within the same branch.
        let mut branched: AHashMap<String, AHashMap<String, (usize, String)>> = AHashMap::new();

        let mut bindings = Vec::with_capacity(steps.len());
        let mut unresolved = Vec::new();

        for (index, step) in steps.iter().enumerate() {
            let mut resolved = Vec::new();
            for variable in step.consumes() {
                let local = step
                    .branch
                    .as_ref()
                    .and_then(|b| branched.get(b))
                    .and_then(|scope| scope.get(&variable));
                let producer = local.or_else(|| shared.get(&variable));

                if let Some((producer_index, producer_name)) = producer {
                    resolved.push(ResolvedRef {
                        variable,
                        producer: Producer::Step {
                            index: *producer_index,
                            name: producer_name.clone(),
                        },
                    });
                } else if self.seed.contains(&variable) {
                    resolved.push(ResolvedRef {
                        variable,
                        producer: Producer::Seed,
                    });
                } else {
                    error!(
                        flow = flow_name,
                        step = %step.name,
                        variable = %variable,
                        "unresolved variable reference"
                    );
                    unresolved.push(Diagnostic::new(
                        flow_name,
                        DiagnosticKind::UnresolvedVariable {
                            step: step.name.clone(),
                            variable,
                        },
                    ));
                }
            }

            for produced in &step.produces {
                let entry = (index, step.name.clone());
                match &step.branch {
                    Some(branch) => {
                        branched
                            .entry(branch.clone())
                            .or_default()
                            .insert(produced.clone(), entry);
                    }
                    None => {
                        shared.insert(produced.clone(), entry);
                    }
                }
            }

            bindings.push(StepBinding {
                step: step.name.clone(),
                resolved,
                produces: step.produces.clone(),
            });
        }

        BindingReport {
            steps: bindings,
            unresolved,
        }
    }
}
