use super::catalog::{StepCatalog, StepContext};
use super::variant::{FlowVariant, GrantShape, ProtocolBaseline};
use super::{StepKind, StepTemplate};
use crate::binder::Variable;
use crate::error::AssemblyError;

/// A named sub-grouping inside an assembled flow. Protocol flows have one
/// anonymous section; business scenarios use named ones.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSection {
    pub name: Option<String>,
    pub steps: Vec<StepTemplate>,
}

impl FlowSection {
    pub fn anonymous(steps: Vec<StepTemplate>) -> Self {
        Self { name: None, steps }
    }

    pub fn named(name: impl Into<String>, steps: Vec<StepTemplate>) -> Self {
        Self {
            name: Some(name.into()),
            steps,
        }
    }
}

/// One flow's ordered steps, ready for binding and composition.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledFlow {
    pub name: String,
    pub description: Option<String>,
    /// Protocol baseline for category grouping; business scenarios and
    /// recorded flows have none.
    pub baseline: Option<ProtocolBaseline>,
    pub sections: Vec<FlowSection>,
    /// Seed defaults this flow proposes (recorded flows carry the values
    /// observed in their descriptors).
    pub seed_defaults: Vec<Variable>,
}

impl AssembledFlow {
    pub fn steps(&self) -> impl Iterator<Item = &StepTemplate> {
        self.sections.iter().flat_map(|section| section.steps.iter())
    }

    pub fn step_count(&self) -> usize {
        self.sections.iter().map(|s| s.steps.len()).sum()
    }
}

/// Selects and orders step templates from the catalog for a flow variant.
///
/// Ordering is fixed by protocol necessity: PKCE generation precedes both
/// the authorize step (which needs the challenge) and the exchange step
/// (which needs the verifier); a pushed request precedes the authorize step
/// it feeds.
pub struct FlowAssembler<'a> {
    catalog: &'a StepCatalog,
}

impl<'a> FlowAssembler<'a> {
    pub fn new(catalog: &'a StepCatalog) -> Self {
        Self { catalog }
    }

    pub fn assemble(&self, variant: &FlowVariant) -> Result<AssembledFlow, AssemblyError> {
        let mut kinds = Vec::new();
        match variant.grant {
            GrantShape::AuthorizationCode => {
                if variant.uses_pkce() {
                    kinds.push(StepKind::GeneratePkce);
                }
                if variant.par {
                    kinds.push(StepKind::Par);
                }
                kinds.push(StepKind::Authorize);
                kinds.push(StepKind::TokenExchange);
            }
            GrantShape::Hybrid => {
                if variant.uses_pkce() {
                    kinds.push(StepKind::GeneratePkce);
                }
                kinds.push(StepKind::Authorize);
                kinds.push(StepKind::TokenExchange);
            }
            GrantShape::DeviceCode => {
                kinds.push(StepKind::DeviceAuthorize);
                kinds.push(StepKind::DevicePoll);
            }
            GrantShape::ClientCredentials => {
                kinds.push(StepKind::ClientCredentials);
            }
        }
        if variant.refresh && variant.grant != GrantShape::ClientCredentials {
            kinds.push(StepKind::TokenRefresh);
        }
        if variant.introspect {
            kinds.push(StepKind::Introspect);
        }
        if variant.userinfo && variant.is_openid() && variant.grant != GrantShape::ClientCredentials
        {
            kinds.push(StepKind::UserInfo);
        }

        let ctx = StepContext { variant };
        let steps = kinds
            .into_iter()
            .map(|kind| self.catalog.build(kind, &ctx))
            .collect::<Result<Vec<_>, _>>()?;
        if steps.is_empty() {
            return Err(AssemblyError::EmptyFlow(variant.name()));
        }

        Ok(AssembledFlow {
            name: variant.name(),
            description: None,
            baseline: Some(variant.baseline),
            sections: vec![FlowSection::anonymous(steps)],
            seed_defaults: Vec::new(),
        })
    }
}
