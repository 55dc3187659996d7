//! Common test utilities for building flows and walking compiled documents.
use flowdeck::flow::{FlowAssembler, StepCatalog};
use flowdeck::prelude::*;

/// Assembles a single variant against the default catalog.
#[allow(dead_code)]
pub fn assemble_variant(variant: &FlowVariant) -> Vec<StepTemplate> {
    let catalog = StepCatalog::with_defaults();
    let assembler = FlowAssembler::new(&catalog);
    let flow = assembler.assemble(variant).expect("assembly failed");
    flow.steps().cloned().collect()
}

/// A compiler with fixed uniqueness so output comparisons are stable.
#[allow(dead_code)]
pub fn fixed_compiler(builder: CollectionCompilerBuilder) -> CollectionCompiler {
    builder
        .with_uniqueness(Box::new(FixedUniqueness::new("t01")))
        .build()
}

/// Compiles the given variants into one collection.
#[allow(dead_code)]
pub fn compile_variants(variants: Vec<FlowVariant>) -> CompileOutput {
    let mut builder = CollectionCompiler::builder(CredentialProfile::default());
    for variant in variants {
        builder = builder.with_variant(variant);
    }
    fixed_compiler(builder).compile().expect("compile failed")
}

/// Compiles the full built-in catalog.
#[allow(dead_code)]
pub fn builtin_output() -> CompileOutput {
    let builder = CollectionCompiler::builder(CredentialProfile::default()).with_builtin_flows();
    fixed_compiler(builder).compile().expect("compile failed")
}

/// Every request item in the document, depth first.
#[allow(dead_code)]
pub fn all_request_items(document: &CollectionDocument) -> Vec<&RequestItem> {
    let mut items = Vec::new();
    for node in &document.item {
        collect_items(node, &mut items);
    }
    items
}

#[allow(dead_code)]
fn collect_items<'a>(node: &'a CollectionNode, out: &mut Vec<&'a RequestItem>) {
    match node {
        CollectionNode::Folder(folder) => {
            for child in &folder.item {
                collect_items(child, out);
            }
        }
        CollectionNode::Request(item) => out.push(item),
    }
}

/// Finds a top-level category folder by name.
#[allow(dead_code)]
pub fn category<'a>(document: &'a CollectionDocument, name: &str) -> &'a Folder {
    document
        .item
        .iter()
        .find_map(|node| match node {
            CollectionNode::Folder(folder) if folder.name == name => Some(folder),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no category folder named '{}'", name))
}

/// Finds a request item by name anywhere in the document.
#[allow(dead_code)]
pub fn item_named<'a>(document: &'a CollectionDocument, name: &str) -> &'a RequestItem {
    all_request_items(document)
        .into_iter()
        .find(|item| item.name == name)
        .unwrap_or_else(|| panic!("no request item named '{}'", name))
}

/// The exec lines of an item's script for the given listen phase, if any.
#[allow(dead_code)]
pub fn script_lines<'a>(item: &'a RequestItem, listen: &str) -> Option<&'a Vec<String>> {
    item.event
        .iter()
        .find(|event| event.listen == listen)
        .map(|event| &event.script.exec)
}

/// The full cross product of variant flags, used by the exhaustive tests.
#[allow(dead_code)]
pub fn variant_matrix() -> Vec<FlowVariant> {
    let mut variants = Vec::new();
    let grants = [
        GrantShape::AuthorizationCode,
        GrantShape::DeviceCode,
        GrantShape::ClientCredentials,
        GrantShape::Hybrid,
    ];
    let baselines = [
        ProtocolBaseline::OAuth2,
        ProtocolBaseline::Oidc,
        ProtocolBaseline::OidcPkceMandatory,
    ];
    let pkce_modes = [PkceMode::Required, PkceMode::Optional, PkceMode::Off];
    let auth_methods = [
        ClientAuthMethod::Post,
        ClientAuthMethod::Basic,
        ClientAuthMethod::ClientSecretJwt,
        ClientAuthMethod::PrivateKeyJwt,
    ];
    let deliveries = [
        ResponseDelivery::Query,
        ResponseDelivery::Fragment,
        ResponseDelivery::FormPost,
    ];

    for grant in grants {
        for baseline in baselines {
            for pkce in pkce_modes {
                for client_auth in auth_methods {
                    for delivery in deliveries {
                        for par in [false, true] {
                            for extras in [false, true] {
                                let base = match grant {
                                    GrantShape::AuthorizationCode => {
                                        FlowVariant::authorization_code(baseline)
                                    }
                                    GrantShape::DeviceCode => FlowVariant::device_code(baseline),
                                    GrantShape::ClientCredentials => {
                                        FlowVariant::client_credentials(baseline)
                                    }
                                    GrantShape::Hybrid => FlowVariant::hybrid(),
                                };
                                variants.push(
                                    base.with_pkce(pkce)
                                        .with_par(par)
                                        .with_client_auth(client_auth)
                                        .with_delivery(delivery)
                                        .with_refresh(extras)
                                        .with_introspection(extras)
                                        .with_userinfo(extras),
                                );
                            }
                        }
                    }
                }
            }
        }
    }
    variants
}

/// Recorded descriptors resembling a captured authorization-code exchange.
#[allow(dead_code)]
pub fn sample_descriptors() -> Vec<CallDescriptor> {
    vec![
        CallDescriptor {
            method: "GET".to_string(),
            url: "https://auth.eu.uniqid.io/f81d4fae-7dec-11d0-a765-00a0c91e6bf6/oauth2/authorize?client_id={{clientId}}&redirect_uri={{redirectUri}}&response_type=code&scope={{scope}}&state={{state}}"
                .to_string(),
            headers: Vec::new(),
            body: None,
            label: "Authorize (recorded)".to_string(),
            kind_hint: Some(StepKind::Authorize),
        },
        CallDescriptor {
            method: "POST".to_string(),
            url: "https://auth.eu.uniqid.io/f81d4fae-7dec-11d0-a765-00a0c91e6bf6/oauth2/token"
                .to_string(),
            headers: Vec::new(),
            body: Some(serde_json::json!({
                "grant_type": "authorization_code",
                "code": "{{auth_code}}",
                "redirect_uri": "{{redirectUri}}",
                "client_id": "{{clientId}}",
                "client_secret": "{{clientSecret}}",
            })),
            label: "Token (recorded)".to_string(),
            kind_hint: Some(StepKind::TokenExchange),
        },
    ]
}
