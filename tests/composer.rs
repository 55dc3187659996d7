//! Tests for collection composition: rendering, grouping, seed merging,
//! and batch error isolation.
mod common;
use common::*;
use flowdeck::endpoint::{EndpointTemplate, HostTemplate};
use flowdeck::prelude::*;

#[test]
fn test_compiling_twice_is_byte_identical() {
    let first = builtin_output();
    let second = builtin_output();

    let first_doc = serde_json::to_string(&first.document).expect("serialize");
    let second_doc = serde_json::to_string(&second.document).expect("serialize");
    assert_eq!(first_doc, second_doc);

    let first_seed = serde_json::to_string(&first.seed).expect("serialize");
    let second_seed = serde_json::to_string(&second.seed).expect("serialize");
    assert_eq!(first_seed, second_seed);
}

#[test]
fn test_every_body_has_content_type_and_bare_methods_have_neither() {
    let output = builtin_output();

    for item in all_request_items(&output.document) {
        let has_content_type = item
            .request
            .header
            .iter()
            .any(|h| h.key.eq_ignore_ascii_case("content-type"));

        if item.request.body.is_some() {
            assert!(
                has_content_type,
                "'{}' has a body but no content-type",
                item.name
            );
        }
        if item.request.method == "GET" || item.request.method == "DELETE" {
            assert!(
                item.request.body.is_none(),
                "'{}' is {} but carries a body",
                item.name,
                item.request.method
            );
            assert!(
                !has_content_type,
                "'{}' is {} but carries a content-type",
                item.name,
                item.request.method
            );
        }
    }
}

#[test]
fn test_lineage_holds_for_every_flag_combination() {
    for variant in variant_matrix() {
        let output = compile_variants(vec![variant.clone()]);
        assert_eq!(
            output.errors().count(),
            0,
            "unresolved variables in '{}'",
            variant.name()
        );
    }
}

#[test]
fn test_pkce_flow_renders_challenge_verifier_and_scripts() {
    let output = compile_variants(vec![
        FlowVariant::authorization_code(ProtocolBaseline::OAuth2)
            .with_pkce(PkceMode::Required)
            .with_client_auth(ClientAuthMethod::Basic),
    ]);

    let authorize = item_named(&output.document, "Build authorize URL");
    assert!(authorize.request.url.raw.contains("code_challenge={{code_challenge}}"));
    assert!(authorize.request.url.raw.contains("code_challenge_method=S256"));

    let generate = item_named(&output.document, "Generate PKCE pair");
    let pre = script_lines(generate, "prerequest").expect("missing pre-script");
    assert!(pre.iter().any(|line| line.contains("CryptoJS.SHA256")));
    assert!(
        pre.iter()
            .any(|line| line.contains("pm.environment.set(\"code_verifier\""))
    );

    let exchange = item_named(&output.document, "Exchange code for tokens");
    let body = exchange.request.body.as_ref().expect("missing body");
    let form = body.urlencoded.as_ref().expect("expected form body");
    assert!(
        form.iter()
            .any(|p| p.key == "code_verifier" && p.value == "{{code_verifier}}")
    );

    // Basic auth arrives via the pre-script, not the body.
    let exchange_pre = script_lines(exchange, "prerequest").expect("missing pre-script");
    assert!(exchange_pre.iter().any(|line| line.contains("Basic ")));
    assert!(!form.iter().any(|p| p.key == "client_secret"));
}

#[test]
fn test_par_step_expects_201_and_authorize_carries_request_uri() {
    let output = compile_variants(vec![
        FlowVariant::authorization_code(ProtocolBaseline::OidcPkceMandatory)
            .with_par(true)
            .with_client_auth(ClientAuthMethod::PrivateKeyJwt),
    ]);

    let par = item_named(&output.document, "Push authorization request");
    let post = script_lines(par, "test").expect("missing test script");
    assert!(post.iter().any(|line| line.contains("status(201)")));

    let authorize = item_named(&output.document, "Build authorize URL");
    assert!(authorize.request.url.raw.contains("request_uri={{request_uri}}"));
    assert!(!authorize.request.url.raw.contains("code_challenge"));
}

#[test]
fn test_unresolved_flow_is_omitted_while_siblings_compile() {
    let broken_step = StepTemplate::new(
        "Needs a ghost",
        StepKind::Generic,
        Method::Post,
        EndpointTemplate {
            host: HostTemplate::Literal(vec!["example".to_string(), "test".to_string()]),
            path: Vec::new(),
            query: Vec::new(),
        },
    )
    .script_consumes(&["ghost_var"]);
    let broken = FlowPlan {
        name: "Broken recording".to_string(),
        steps: vec![broken_step],
        seed_defaults: Vec::new(),
    };

    let builder = CollectionCompiler::builder(CredentialProfile::default())
        .with_variant(FlowVariant::device_code(ProtocolBaseline::OAuth2))
        .with_recorded(broken);
    let output = fixed_compiler(builder).compile().expect("compile failed");

    let errors: Vec<_> = output.errors().collect();
    assert_eq!(errors.len(), 1);
    match &errors[0].kind {
        DiagnosticKind::UnresolvedVariable { step, variable } => {
            assert_eq!(step, "Needs a ghost");
            assert_eq!(variable, "ghost_var");
        }
        other => panic!("unexpected diagnostic: {:?}", other),
    }
    assert_eq!(errors[0].flow.as_deref(), Some("Broken recording"));

    // The sibling flow still compiled; the broken one is absent.
    assert!(
        all_request_items(&output.document)
            .iter()
            .any(|item| item.name == "Start device authorization")
    );
    assert!(
        !all_request_items(&output.document)
            .iter()
            .any(|item| item.name == "Needs a ghost")
    );
}

#[test]
fn test_conflicting_seed_defaults_warn_and_first_wins() {
    let profile = CredentialProfile::default();
    let expected_tenant = profile.tenant_id.clone();

    let (plan, diagnostics) = FlowPlan::from_descriptors(
        "Recorded exchange",
        sample_descriptors(),
        &EndpointNormalizer::default(),
    )
    .expect("conversion failed");
    assert!(diagnostics.is_empty());

    let builder = CollectionCompiler::builder(profile).with_recorded(plan);
    let output = fixed_compiler(builder).compile().expect("compile failed");

    assert!(output.diagnostics.iter().any(|d| matches!(
        d.kind,
        DiagnosticKind::AmbiguousSeedDefault { ref variable, .. } if variable == "tenantId"
    )));

    let tenant = output
        .seed
        .values
        .iter()
        .find(|v| v.key == "tenantId")
        .expect("tenantId missing from seed");
    assert_eq!(tenant.value, expected_tenant);
}

#[test]
fn test_seed_document_shape() {
    let output = builtin_output();

    let secret = output
        .seed
        .values
        .iter()
        .find(|v| v.key == "clientSecret")
        .expect("clientSecret missing");
    assert_eq!(secret.value_type, "secret");
    assert!(secret.enabled);

    // Step-produced variables get empty placeholders so the document loads
    // as a complete execution environment.
    for produced in ["access_token", "device_code", "user_id"] {
        let entry = output
            .seed
            .values
            .iter()
            .find(|v| v.key == produced)
            .unwrap_or_else(|| panic!("'{}' missing from seed", produced));
        assert_eq!(entry.value, "");
    }

    // No duplicate keys after cross-flow deduplication.
    let mut keys: Vec<_> = output.seed.values.iter().map(|v| v.key.clone()).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), output.seed.values.len());
}

#[test]
fn test_scenario_folders_and_uniqueness_suffix() {
    let output = builtin_output();

    let scenarios = category(&output.document, "Business scenarios");
    let mfa = scenarios
        .item
        .iter()
        .find_map(|node| match node {
            CollectionNode::Folder(folder) if folder.name == "MFA challenge" => Some(folder),
            _ => None,
        })
        .expect("MFA challenge folder missing");

    let section_names: Vec<_> = mfa
        .item
        .iter()
        .filter_map(|node| match node {
            CollectionNode::Folder(folder) => Some(folder.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        section_names,
        vec![
            "Environment setup",
            "Configure test subject",
            "Exercise workflow"
        ]
    );

    let create = item_named(&output.document, "Create test user");
    let body = create.request.body.as_ref().expect("missing body");
    let raw = body.raw.as_ref().expect("expected JSON body");
    assert!(raw.contains("qa-user-t01@flowdeck.test"));
}

#[test]
fn test_collection_variables_match_used_seeds() {
    let output = builtin_output();
    for variable in &output.document.variable {
        assert!(
            output.seed.values.iter().any(|v| v.key == variable.key),
            "collection variable '{}' missing from seed",
            variable.key
        );
    }
}
