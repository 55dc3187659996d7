use super::document::{
    BodyOptions, BodySpec, COLLECTION_SCHEMA, CollectionDocument, CollectionInfo, CollectionNode,
    CollectionVariable, Event, Folder, FormParamSpec, HeaderSpec, QuerySpec, RawBodyOptions,
    RequestItem, RequestSpec, UrlSpec,
};
use super::seed::SeedDocument;
use crate::binder::{BindingReport, Producer, StepBinding, VarOrigin, Variable, VariableBinder};
use crate::codec::{self, WireBody};
use crate::config::CredentialProfile;
use crate::descriptor::FlowPlan;
use crate::error::{AssemblyError, Diagnostic, DiagnosticKind};
use crate::flow::{
    AssembledFlow, FlowAssembler, FlowVariant, ProtocolBaseline, Scenario, StepCatalog,
    StepFactory, StepTemplate,
};
use crate::script::{ScriptRenderer, ScriptSynthesizer};
use crate::unique::{RandomUniqueness, UniquenessSource};
use ahash::AHashMap;
use itertools::Itertools;
use tracing::warn;

/// Everything one compiler run emits: the document, the seed, and every
/// diagnostic raised along the way. A flow that failed binding is present
/// only in `diagnostics`.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub document: CollectionDocument,
    pub seed: SeedDocument,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == crate::error::Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity() == crate::error::Severity::Error)
    }
}

enum FlowRequest {
    Variant(FlowVariant),
    Scenario(Scenario),
    Recorded(FlowPlan),
}

/// Compiles flow requests into one collection document plus its seed.
///
/// Each compile run is self-contained: binder scopes never cross flows, and
/// the step catalog is read-only after the builder finishes.
pub struct CollectionCompiler {
    name: String,
    description: String,
    profile: CredentialProfile,
    catalog: StepCatalog,
    uniqueness: Box<dyn UniquenessSource>,
    extra_seeds: Vec<Variable>,
    requests: Vec<FlowRequest>,
}

pub struct CollectionCompilerBuilder {
    name: String,
    description: String,
    profile: CredentialProfile,
    catalog: StepCatalog,
    uniqueness: Box<dyn UniquenessSource>,
    extra_seeds: Vec<Variable>,
    requests: Vec<FlowRequest>,
}

impl CollectionCompilerBuilder {
    pub fn new(profile: CredentialProfile) -> Self {
        Self {
            name: "Identity flows".to_string(),
            description: "Replayable OAuth2/OIDC protocol flows and identity scenarios."
                .to_string(),
            profile,
            catalog: StepCatalog::with_defaults(),
            uniqueness: Box::new(RandomUniqueness::new()),
            extra_seeds: Vec::new(),
            requests: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_variant(mut self, variant: FlowVariant) -> Self {
        self.requests.push(FlowRequest::Variant(variant));
        self
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.requests.push(FlowRequest::Scenario(scenario));
        self
    }

    pub fn with_recorded(mut self, plan: FlowPlan) -> Self {
        self.requests.push(FlowRequest::Recorded(plan));
        self
    }

    /// The full built-in matrix: every protocol variant plus every business
    /// scenario.
    pub fn with_builtin_flows(mut self) -> Self {
        for variant in FlowVariant::builtin_matrix() {
            self.requests.push(FlowRequest::Variant(variant));
        }
        for scenario in Scenario::all() {
            self.requests.push(FlowRequest::Scenario(scenario));
        }
        self
    }

    /// Extra seed variables for references the standard seed set does not
    /// cover (typically recorded flows with custom placeholders).
    pub fn with_seed_variable(mut self, variable: Variable) -> Self {
        self.extra_seeds.push(variable);
        self
    }

    pub fn with_uniqueness(mut self, source: Box<dyn UniquenessSource>) -> Self {
        self.uniqueness = source;
        self
    }

    pub fn with_step_factory(mut self, factory: Box<dyn StepFactory>) -> Self {
        self.catalog.register(factory);
        self
    }

    pub fn build(self) -> CollectionCompiler {
        CollectionCompiler {
            name: self.name,
            description: self.description,
            profile: self.profile,
            catalog: self.catalog,
            uniqueness: self.uniqueness,
            extra_seeds: self.extra_seeds,
            requests: self.requests,
        }
    }
}

impl CollectionCompiler {
    pub fn builder(profile: CredentialProfile) -> CollectionCompilerBuilder {
        CollectionCompilerBuilder::new(profile)
    }

    pub fn compile(&self) -> Result<CompileOutput, AssemblyError> {
        let uniq = self.uniqueness.suffix();
        let assembler = FlowAssembler::new(&self.catalog);

        let mut flows: Vec<(AssembledFlow, Option<FlowVariant>, &'static str)> = Vec::new();
        for request in &self.requests {
            match request {
                FlowRequest::Variant(variant) => {
                    let category = baseline_category(variant.baseline);
                    flows.push((assembler.assemble(variant)?, Some(variant.clone()), category));
                }
                FlowRequest::Scenario(scenario) => {
                    flows.push((scenario.assemble(&uniq), None, "Business scenarios"));
                }
                FlowRequest::Recorded(plan) => {
                    flows.push((plan.clone().into_assembled(), None, "Recorded flows"));
                }
            }
        }

        let mut diagnostics = Vec::new();

        // Seed declarations merge first-wins across the standard set, the
        // caller's extras, and whatever recorded flows observed.
        let mut seed_order: Vec<Variable> = Vec::new();
        let mut seed_index: AHashMap<String, usize> = AHashMap::new();
        let mut declare_seed = |variable: &Variable, diagnostics: &mut Vec<Diagnostic>| {
            if let Some(existing) = seed_index.get(&variable.name) {
                let kept = &seed_order[*existing];
                if let (
                    VarOrigin::Seed { default: kept_default, .. },
                    VarOrigin::Seed { default: new_default, .. },
                ) = (&kept.origin, &variable.origin)
                {
                    if kept_default != new_default {
                        warn!(
                            variable = %variable.name,
                            kept = %kept_default,
                            ignored = %new_default,
                            "conflicting seed defaults"
                        );
                        diagnostics.push(Diagnostic::unscoped(
                            DiagnosticKind::AmbiguousSeedDefault {
                                variable: variable.name.clone(),
                                kept: kept_default.clone(),
                                ignored: new_default.clone(),
                            },
                        ));
                    }
                }
                return;
            }
            seed_index.insert(variable.name.clone(), seed_order.len());
            seed_order.push(variable.clone());
        };

        for variable in standard_seed_variables(&self.profile) {
            declare_seed(&variable, &mut diagnostics);
        }
        for variable in &self.extra_seeds {
            declare_seed(variable, &mut diagnostics);
        }
        for (flow, _, _) in &flows {
            for variable in &flow.seed_defaults {
                declare_seed(variable, &mut diagnostics);
            }
        }

        let binder = VariableBinder::new(seed_order.iter().map(|v| v.name.clone()));

        // Category folders in fixed order; flows keep builder order within
        // their category.
        let mut categories: Vec<(String, Vec<CollectionNode>)> = Vec::new();
        let mut used_seed_names: Vec<String> = Vec::new();
        let mut produced_vars: Vec<(String, String)> = Vec::new();

        for (flow, variant, category) in &flows {
            let step_list: Vec<StepTemplate> = flow.steps().cloned().collect();
            let report = binder.bind(&flow.name, &step_list);

            if !report.is_clean() {
                // The flow is omitted; its diagnostics survive.
                diagnostics.extend(report.unresolved);
                continue;
            }

            for binding in &report.steps {
                for resolved in &binding.resolved {
                    if resolved.producer == Producer::Seed
                        && !used_seed_names.contains(&resolved.variable)
                    {
                        used_seed_names.push(resolved.variable.clone());
                    }
                }
                for produced in &binding.produces {
                    if !produced_vars.iter().any(|(name, _)| name == produced) {
                        produced_vars.push((produced.clone(), binding.step.clone()));
                    }
                }
            }

            let folder = self.render_flow(flow, variant.as_ref(), &report, &mut diagnostics);
            match categories.iter_mut().find(|(name, _)| name.as_str() == *category) {
                Some((_, items)) => items.push(CollectionNode::Folder(folder)),
                None => categories.push((
                    category.to_string(),
                    vec![CollectionNode::Folder(folder)],
                )),
            }
        }

        let seed = self.build_seed(&seed_order, &used_seed_names, &produced_vars);
        let variable = seed_order
            .iter()
            .filter(|v| used_seed_names.contains(&v.name))
            .map(|v| CollectionVariable {
                key: v.name.clone(),
                value: match &v.origin {
                    VarOrigin::Seed { default, .. } => default.clone(),
                    VarOrigin::Step { .. } => String::new(),
                },
                variable_type: match &v.origin {
                    VarOrigin::Seed { secret: true, .. } => "secret".to_string(),
                    _ => "default".to_string(),
                },
            })
            .collect();

        let document = CollectionDocument {
            info: CollectionInfo {
                name: self.name.clone(),
                description: self.description.clone(),
                schema: COLLECTION_SCHEMA.to_string(),
            },
            variable,
            item: categories
                .into_iter()
                .map(|(name, item)| {
                    CollectionNode::Folder(Folder {
                        name,
                        description: None,
                        item,
                    })
                })
                .collect(),
        };

        Ok(CompileOutput {
            document,
            seed,
            diagnostics,
        })
    }

    fn render_flow(
        &self,
        flow: &AssembledFlow,
        variant: Option<&FlowVariant>,
        report: &BindingReport,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Folder {
        let mut children: Vec<CollectionNode> = Vec::new();
        let mut step_index = 0usize;

        for section in &flow.sections {
            let mut items: Vec<CollectionNode> = Vec::new();
            for step in &section.steps {
                let binding = &report.steps[step_index];
                step_index += 1;
                let item = self.render_step(&flow.name, step, variant, binding, diagnostics);
                items.push(CollectionNode::Request(item));
            }
            match &section.name {
                Some(name) => children.push(CollectionNode::Folder(Folder {
                    name: name.clone(),
                    description: None,
                    item: items,
                })),
                None => children.extend(items),
            }
        }

        let description = flow.description.clone().unwrap_or_else(|| {
            format!(
                "Demonstrates the {} exchange in {} steps.",
                flow.name,
                flow.step_count()
            )
        });

        Folder {
            name: flow.name.clone(),
            description: Some(description),
            item: children,
        }
    }

    fn render_step(
        &self,
        flow_name: &str,
        step: &StepTemplate,
        variant: Option<&FlowVariant>,
        binding: &StepBinding,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> RequestItem {
        let (encoded, encode_diags) = codec::encode(step);
        diagnostics.extend(encode_diags.into_iter().map(|d| d.for_flow(flow_name)));

        let scripts = ScriptSynthesizer::synthesize(step, variant, binding);
        let mut event = Vec::new();
        let pre = ScriptRenderer::render(&scripts.pre);
        if !pre.is_empty() {
            event.push(Event::prerequest(pre));
        }
        let post = ScriptRenderer::render(&scripts.post);
        if !post.is_empty() {
            event.push(Event::test(post));
        }

        let mut description = if step.description.is_empty() {
            step.kind.summary().to_string()
        } else {
            step.description.clone()
        };
        if !binding.produces.is_empty() {
            let published = binding.produces.iter().map(|v| format!("`{}`", v)).join(", ");
            description.push_str(&format!(" Publishes {}.", published));
        }

        let body = encoded.body.map(|wire| match wire {
            WireBody::Form(params) => BodySpec {
                mode: "urlencoded".to_string(),
                urlencoded: Some(
                    params
                        .into_iter()
                        .map(|(key, value)| FormParamSpec { key, value })
                        .collect(),
                ),
                raw: None,
                options: None,
            },
            WireBody::Json(raw) => BodySpec {
                mode: "raw".to_string(),
                urlencoded: None,
                raw: Some(raw),
                options: Some(BodyOptions {
                    raw: RawBodyOptions {
                        language: "json".to_string(),
                    },
                }),
            },
        });

        RequestItem {
            name: step.name.clone(),
            event,
            request: RequestSpec {
                method: step.method.as_str().to_string(),
                header: encoded
                    .headers
                    .into_iter()
                    .map(|(key, value)| HeaderSpec { key, value })
                    .collect(),
                body,
                url: UrlSpec {
                    raw: step.endpoint.raw(),
                    protocol: "https".to_string(),
                    host: step.endpoint.host_segments(),
                    path: step.endpoint.path_segments(),
                    query: step
                        .endpoint
                        .query
                        .iter()
                        .map(|param| QuerySpec {
                            key: param.key.clone(),
                            value: param.value.render(),
                        })
                        .collect(),
                },
                description,
            },
            response: Vec::new(),
        }
    }

    fn build_seed(
        &self,
        seed_order: &[Variable],
        used_seed_names: &[String],
        produced_vars: &[(String, String)],
    ) -> SeedDocument {
        let mut seed = SeedDocument::new(format!("{} environment", self.name));
        for variable in seed_order {
            if !used_seed_names.contains(&variable.name) {
                continue;
            }
            if let VarOrigin::Seed { default, secret } = &variable.origin {
                seed.push(&variable.name, default, *secret);
            }
        }
        // Empty placeholders so step-produced variables resolve on import.
        for (name, _) in produced_vars {
            if !used_seed_names.contains(name) {
                seed.push(name, "", false);
            }
        }
        seed
    }
}

fn baseline_category(baseline: ProtocolBaseline) -> &'static str {
    match baseline {
        ProtocolBaseline::OAuth2 => "OAuth 2.0",
        ProtocolBaseline::Oidc => "OpenID Connect",
        ProtocolBaseline::OidcPkceMandatory => "OpenID Connect (PKCE enforced)",
    }
}

fn standard_seed_variables(profile: &CredentialProfile) -> Vec<Variable> {
    vec![
        Variable::seed("authHost", "auth.uniqid.io", "Authorization server host"),
        Variable::seed("apiHost", "api.uniqid.io", "Management API host"),
        Variable::seed(
            "tenantId",
            &profile.tenant_id,
            "Tenant (environment) identifier",
        ),
        Variable::seed("clientId", &profile.client_id, "OAuth client identifier"),
        Variable::secret("clientSecret", &profile.client_secret, "OAuth client secret"),
        Variable::seed(
            "redirectUri",
            &profile.redirect_uri,
            "Registered redirect URI",
        ),
        Variable::seed(
            "scope",
            profile.scope_string(),
            "Scopes requested by the flows",
        ),
        Variable::seed("state", "", "Refreshed by the authorize pre-script"),
        Variable::seed("nonce", "", "Refreshed by the authorize pre-script"),
        Variable::secret(
            "client_assertion",
            "",
            "Built by the signing pre-script before token requests",
        ),
        Variable::secret(
            "signedAssertion",
            "",
            "Externally signed RS256 client assertion",
        ),
        Variable::seed("otpCode", "", "One-time passcode delivered out of band"),
        Variable::secret(
            "testPassword",
            "Fl0wdeck!Sample",
            "Password set on generated test users",
        ),
    ]
}
