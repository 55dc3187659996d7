use super::{AssertionMethod, ScriptStatement};
use crate::flow::ResponseDelivery;

/// Renders statement sequences into the script sandbox's JavaScript.
pub struct ScriptRenderer;

impl ScriptRenderer {
    /// Renders a statement sequence to script lines, ready for the
    /// document's `exec` array. Returns an empty vector for an empty
    /// sequence so callers can skip the event entirely.
    pub fn render(statements: &[ScriptStatement]) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();

        if statements.iter().any(needs_base64_helper) {
            lines.extend([
                "function base64UrlEncode(words) {".to_string(),
                "    return CryptoJS.enc.Base64.stringify(words)".to_string(),
                "        .replace(/\\+/g, \"-\")".to_string(),
                "        .replace(/\\//g, \"_\")".to_string(),
                "        .replace(/=+$/, \"\");".to_string(),
                "}".to_string(),
            ]);
        }
        if statements
            .iter()
            .any(|s| matches!(s, ScriptStatement::ExtractField { .. }))
        {
            push_block(&mut lines, &["const body = pm.response.json();".to_string()]);
        }

        for statement in statements {
            let block = match statement {
                ScriptStatement::AssertStatus { expected } => render_assert_status(*expected),
                ScriptStatement::ExtractField { path, var } => render_extract_field(path, var),
                ScriptStatement::ExtractRedirectParam {
                    param,
                    var,
                    delivery,
                } => render_extract_redirect(param, var, *delivery),
                ScriptStatement::GeneratePkce {
                    verifier_var,
                    challenge_var,
                } => render_generate_pkce(verifier_var, challenge_var),
                ScriptStatement::RefreshStateValues { vars } => vars
                    .iter()
                    .map(|var| {
                        format!(
                            "pm.environment.set(\"{}\", pm.variables.replaceIn(\"{{{{$guid}}}}\"));",
                            var
                        )
                    })
                    .collect(),
                ScriptStatement::BasicAuthHeader { id_var, secret_var } => {
                    render_basic_auth(id_var, secret_var)
                }
                ScriptStatement::SignClientAssertion {
                    method,
                    var,
                    audience,
                } => render_sign_assertion(*method, var, audience),
                ScriptStatement::Note { text } => vec![format!("// {}", text)],
            };
            push_block(&mut lines, &block);
        }

        lines
    }
}

fn needs_base64_helper(statement: &ScriptStatement) -> bool {
    matches!(
        statement,
        ScriptStatement::GeneratePkce { .. }
            | ScriptStatement::SignClientAssertion {
                method: AssertionMethod::ClientSecretHmac,
                ..
            }
    )
}

fn push_block(lines: &mut Vec<String>, block: &[String]) {
    if !lines.is_empty() && !block.is_empty() {
        lines.push(String::new());
    }
    lines.extend_from_slice(block);
}

/// Turns a variable name into a safe local JavaScript identifier.
fn js_ident(var: &str) -> String {
    let mut ident: String = var
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if ident.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

fn render_assert_status(expected: u16) -> Vec<String> {
    vec![
        format!("pm.test(\"status is {}\", function () {{", expected),
        format!("    pm.response.to.have.status({});", expected),
        "});".to_string(),
    ]
}

fn render_extract_field(path: &[String], var: &str) -> Vec<String> {
    let ident = js_ident(var);
    let mut access = "(body || {})".to_string();
    for (i, key) in path.iter().enumerate() {
        if i + 1 < path.len() {
            access = format!("({}.{} || {{}})", access, key);
        } else {
            access = format!("{}.{}", access, key);
        }
    }
    vec![
        format!("const {} = {};", ident, access),
        format!("if ({} !== undefined) {{", ident),
        format!("    pm.environment.set(\"{}\", {});", var, ident),
        "} else {".to_string(),
        format!(
            "    console.warn(\"response has no '{}'; later steps that read '{}' will not resolve\");",
            path.join("."),
            var
        ),
        "}".to_string(),
    ]
}

fn render_extract_redirect(param: &str, var: &str, delivery: ResponseDelivery) -> Vec<String> {
    let ident = format!("{}Match", js_ident(param));
    let pattern = match delivery {
        ResponseDelivery::Query => format!("/[?&]{}=([^&#]+)/", param),
        ResponseDelivery::Fragment => format!("/[#&]{}=([^&]+)/", param),
        ResponseDelivery::FormPost => {
            return vec![
                format!(
                    "// form_post delivery sends '{}' to the redirect URI in a POST body;",
                    param
                ),
                format!(
                    "// capture it there and fill '{}' by hand before the next step.",
                    var
                ),
            ];
        }
    };
    vec![
        "const location = pm.response.headers.get(\"Location\") || \"\";".to_string(),
        format!("const {} = location.match({});", ident, pattern),
        format!("if ({}) {{", ident),
        format!(
            "    pm.environment.set(\"{}\", decodeURIComponent({}[1]));",
            var, ident
        ),
        "} else {".to_string(),
        format!(
            "    console.warn(\"redirect carries no '{}'; finish the login in a browser and fill '{}' by hand\");",
            param, var
        ),
        "}".to_string(),
    ]
}

fn render_generate_pkce(verifier_var: &str, challenge_var: &str) -> Vec<String> {
    vec![
        "const verifier = base64UrlEncode(CryptoJS.lib.WordArray.random(32));".to_string(),
        format!("pm.environment.set(\"{}\", verifier);", verifier_var),
        format!(
            "pm.environment.set(\"{}\", base64UrlEncode(CryptoJS.SHA256(verifier)));",
            challenge_var
        ),
    ]
}

fn render_basic_auth(id_var: &str, secret_var: &str) -> Vec<String> {
    vec![
        format!(
            "const credentials = pm.environment.get(\"{}\") + \":\" + pm.environment.get(\"{}\");",
            id_var, secret_var
        ),
        "const basic = CryptoJS.enc.Base64.stringify(CryptoJS.enc.Utf8.parse(credentials));"
            .to_string(),
        "pm.request.headers.upsert({ key: \"Authorization\", value: \"Basic \" + basic });"
            .to_string(),
    ]
}

fn render_sign_assertion(method: AssertionMethod, var: &str, audience: &str) -> Vec<String> {
    match method {
        AssertionMethod::ClientSecretHmac => vec![
            format!(
                "const audience = pm.variables.replaceIn(\"{}\");",
                audience
            ),
            "const header = { alg: \"HS256\", typ: \"JWT\" };".to_string(),
            "const now = Math.floor(Date.now() / 1000);".to_string(),
            "const claims = {".to_string(),
            "    iss: pm.environment.get(\"clientId\"),".to_string(),
            "    sub: pm.environment.get(\"clientId\"),".to_string(),
            "    aud: audience,".to_string(),
            "    iat: now,".to_string(),
            "    exp: now + 300,".to_string(),
            "    jti: pm.variables.replaceIn(\"{{$guid}}\"),".to_string(),
            "};".to_string(),
            "const encodePart = (obj) => base64UrlEncode(CryptoJS.enc.Utf8.parse(JSON.stringify(obj)));"
                .to_string(),
            "const signingInput = encodePart(header) + \".\" + encodePart(claims);".to_string(),
            "const signature = base64UrlEncode(CryptoJS.HmacSHA256(signingInput, pm.environment.get(\"clientSecret\")));"
                .to_string(),
            format!(
                "pm.environment.set(\"{}\", signingInput + \".\" + signature);",
                var
            ),
        ],
        AssertionMethod::PrivateKeyExternal => vec![
            "// RS256 signing needs the registered private key, which the script".to_string(),
            "// sandbox does not hold; sign the assertion offline and store it in".to_string(),
            "// 'signedAssertion'.".to_string(),
            "const external = pm.environment.get(\"signedAssertion\") || \"\";".to_string(),
            "if (external) {".to_string(),
            format!("    pm.environment.set(\"{}\", external);", var),
            "} else {".to_string(),
            "    console.warn(\"no externally signed assertion found in 'signedAssertion'\");"
                .to_string(),
            "}".to_string(),
        ],
    }
}
