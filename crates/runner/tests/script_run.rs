//! End-to-end script runs against an in-memory transport.

mod common;

use common::{request, test_config, StubTransport};
use genail_runner::driver::run_with_transport;
use serde_json::json;

#[tokio::test]
async fn set_then_print_integer() {
    let result = run_with_transport(
        request("set a = 5\nprint a"),
        &test_config(),
        StubTransport::new().shared(),
    )
    .await;

    assert_eq!(result.stdout, "5\n");
    assert!(result.errors.is_empty());
    assert_eq!(result.artifacts["a"], json!(5));
    assert_eq!(result.tool_calls, 0);
}

#[tokio::test]
async fn unknown_tool_is_not_counted() {
    let result = run_with_transport(
        request("call unknown_tool into x"),
        &test_config(),
        StubTransport::new().shared(),
    )
    .await;

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("call unknown_tool into x: "));
    assert!(result.errors[0].contains("tool not allowed"));
    assert_eq!(result.tool_calls, 0);
    assert!(!result.artifacts.contains_key("x"));
}

#[tokio::test]
async fn call_past_the_budget_fails_and_keeps_earlier_results() {
    let transport = StubTransport::new()
        .respond("/api/audits/t-1", json!({"audit": 1}))
        .shared();
    let script = "\
call mmv_get_audit into a1 with {\"task_id\": \"t-1\"}
call mmv_get_audit into a2 with {\"task_id\": \"t-1\"}
call mmv_get_audit into a3 with {\"task_id\": \"t-1\"}
call mmv_get_audit into a4 with {\"task_id\": \"t-1\"}";

    let result = run_with_transport(request(script), &test_config(), transport.clone()).await;

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("call mmv_get_audit into a4"));
    assert!(result.errors[0].contains("tool call limit exceeded"));
    for name in ["a1", "a2", "a3"] {
        assert_eq!(result.artifacts[name], json!({"audit": 1}));
    }
    assert!(!result.artifacts.contains_key("a4"));
    assert_eq!(transport.seen().len(), 3);
    assert_eq!(result.tool_calls, 4);
}

#[tokio::test]
async fn generate_without_flag_is_disabled() {
    let transport = StubTransport::new().shared();
    let result =
        run_with_transport(request("generate summary"), &test_config(), transport.clone()).await;

    assert_eq!(result.stdout, "");
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("generate disabled"));
    assert!(transport.seen().is_empty());
}

#[tokio::test]
async fn generate_sends_messages_and_prints_text() {
    let transport = StubTransport::new()
        .respond(
            "/v1/chat/completions",
            json!({"choices": [{"message": {"role": "assistant", "content": "Looks verified."}}]}),
        )
        .shared();
    let mut req = request(
        "message system = \"You audit tasks.\"\n\
         message user = \"Summarise {{task_id}}\"\n\
         generate summary",
    );
    req.allow_llm = Some(true);
    req.vars = json!({"task_id": "task-42"}).as_object().cloned();

    let result = run_with_transport(req, &test_config(), transport.clone()).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.stdout, "Looks verified.\n");
    assert_eq!(result.artifacts["summary"], "Looks verified.");
    assert_eq!(result.tool_calls, 0);

    let seen = transport.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].bearer.as_deref(), Some("sk-test"));
    assert_eq!(
        seen[0].body.as_ref().unwrap()["messages"],
        json!([
            {"role": "system", "content": "You audit tasks."},
            {"role": "user", "content": "Summarise task-42"}
        ])
    );
    assert_eq!(seen[0].body.as_ref().unwrap()["model"], "gpt-4o-mini");
}

#[tokio::test]
async fn generate_without_credential_fails_the_statement() {
    let mut config = test_config();
    config.generation.api_key = None;
    let mut req = request("generate summary\nprint \"after\"");
    req.allow_llm = Some(true);

    let result = run_with_transport(req, &config, StubTransport::new().shared()).await;

    assert_eq!(result.errors, ["generate summary: OPENAI_API_KEY not configured"]);
    assert_eq!(result.stdout, "after\n");
}

#[tokio::test]
async fn set_stores_placeholders_unrendered() {
    let result = run_with_transport(
        request("set y = 1\nset x = \"a {{y}}\""),
        &test_config(),
        StubTransport::new().shared(),
    )
    .await;

    assert_eq!(result.artifacts["x"], "a {{y}}");
}

#[tokio::test]
async fn templates_render_against_current_variables() {
    let script = "\
template line = \"score={{s}}\"
set s = 1
print line
set s = 2
print line";
    let result =
        run_with_transport(request(script), &test_config(), StubTransport::new().shared()).await;

    assert_eq!(result.stdout, "score=1\nscore=2\n");
    assert!(!result.artifacts.contains_key("line"));
}

#[tokio::test]
async fn print_prefers_variables_then_templates_then_literals() {
    let script = "\
set who = \"world\"
template who = \"template text\"
template greet = \"hello {{who}}\"
set obj = {\"b\": 1, \"a\": true}
print who
print greet
print \"bye {{who}} {{missing}}.\"
print obj";
    let result =
        run_with_transport(request(script), &test_config(), StubTransport::new().shared()).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.stdout,
        "\"world\"\nhello world\nbye world .\n{\n  \"a\": true,\n  \"b\": 1\n}\n"
    );
}

#[tokio::test]
async fn prompt_is_stored_verbatim() {
    let result = run_with_transport(
        request("prompt ask = \"Explain {{task_id}}\""),
        &test_config(),
        StubTransport::new().shared(),
    )
    .await;

    assert_eq!(result.artifacts["ask"], "Explain {{task_id}}");
    assert_eq!(result.stdout, "");
}

#[tokio::test]
async fn output_overflow_keeps_existing_output() {
    let mut config = test_config();
    config.limits.max_output_bytes = 8;
    let result = run_with_transport(
        request("print \"12345\"\nprint \"67890\"\nset done = true"),
        &config,
        StubTransport::new().shared(),
    )
    .await;

    assert_eq!(result.stdout, "12345\n");
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("print \"67890\": stdout limit exceeded"));
    assert_eq!(result.artifacts["done"], true);
}

#[tokio::test]
async fn every_failing_statement_is_reported_once() {
    let script = "\
# comments and blank lines are skipped

set ok = 1
frobnicate everything
set = 3
print ok
generate
call mmv_get_record into rec with {\"task_id\": 7, \"extra\": 1}";
    let result =
        run_with_transport(request(script), &test_config(), StubTransport::new().shared()).await;

    assert_eq!(result.errors.len(), 4);
    assert_eq!(
        result.errors[..3],
        [
            "frobnicate everything: unsupported statement",
            "set = 3: invalid set syntax",
            "generate: unsupported statement",
        ]
    );
    assert!(result.errors[3].starts_with("call mmv_get_record into rec with"));
    assert!(result.errors[3].contains("invalid arguments for mmv_get_record"));
    assert_eq!(result.stdout, "1\n");
    assert_eq!(result.tool_calls, 0);
}

#[tokio::test]
async fn call_arguments_from_a_variable() {
    let transport = StubTransport::new()
        .respond("/api/records/t-1", json!({"id": "t-1"}))
        .shared();
    let script = "\
set args = {\"task_id\": \"t-1\"}
call mmv_get_record into rec with args
set scalar = 5
call mmv_get_record into other with scalar";
    let result = run_with_transport(request(script), &test_config(), transport.clone()).await;

    assert_eq!(result.artifacts["rec"], json!({"id": "t-1"}));
    assert_eq!(transport.seen()[0].url, "https://mmv.test/api/records/t-1");
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("must be an object"));
    assert_eq!(result.tool_calls, 1);
}

#[tokio::test]
async fn list_records_shapes_the_response() {
    let transport = StubTransport::new()
        .respond(
            "/api/records",
            json!({"items": [{"id": "t-9", "score": 9100, "program_id": "p"}]}),
        )
        .shared();
    let script = "call mmv_list_records into recs with {\"min_score_bps\": 9000, \"limit\": 5}";
    let result = run_with_transport(request(script), &test_config(), transport.clone()).await;

    assert_eq!(
        result.artifacts["recs"],
        json!({
            "items": [{"task_id": "t-9", "score_bps": 9100, "program_id": "p"}],
            "limit": 5,
            "offset": 0
        })
    );
    assert_eq!(
        transport.seen()[0].url,
        "https://mmv.test/api/records?min_score_bps=9000&limit=5&offset=0"
    );
}

#[tokio::test]
async fn upstream_failure_is_counted_and_recorded() {
    let transport = StubTransport::new().fail("/api/receipts/t-1").shared();
    let result = run_with_transport(
        request("call mmv_get_receipt into r with {\"task_id\": \"t-1\"}"),
        &test_config(),
        transport,
    )
    .await;

    assert_eq!(result.tool_calls, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("upstream returned 502"));
    assert!(!result.artifacts.contains_key("r"));
}

#[tokio::test]
async fn private_evidence_hosts_are_rejected() {
    let transport = StubTransport::new().shared();
    let script = r#"call mmv_fetch_evidence into ev with {"bundle_uri": "http://127.0.0.1/b"}"#;
    let result = run_with_transport(request(script), &test_config(), transport.clone()).await;

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].ends_with("URL host is not allowed"));
    assert!(transport.seen().is_empty());
}

#[tokio::test]
async fn ipfs_evidence_goes_through_the_gateway() {
    let transport = StubTransport::new().respond("/ipfs/bafy1", json!({"files": []})).shared();
    let result = run_with_transport(
        request("call mmv_fetch_evidence into ev with {\"bundle_uri\": \"ipfs://bafy1\"}"),
        &test_config(),
        transport.clone(),
    )
    .await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.artifacts["ev"], json!({"files": []}));
    assert_eq!(transport.seen()[0].url, "https://ipfs.test/ipfs/bafy1");
}

#[tokio::test]
async fn verify_onchain_uses_configured_rpc() {
    let transport = StubTransport::new()
        .respond("/", json!({"jsonrpc": "2.0", "result": "0x"}))
        .shared();
    let script = concat!(
        r#"call mmv_verify_onchain into proof with {"task_id": "t-1", "bundle_hash": "0xab", "#,
        r#""chain_id": 8453, "contract_address": "0xc0"}"#,
    );
    let result = run_with_transport(request(script), &test_config(), transport.clone()).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(result.artifacts["proof"]["rpc_result"]["result"], "0x");
    assert_eq!(result.artifacts["proof"]["chain_id"], "8453");
    assert_eq!(transport.seen()[0].url, "https://rpc.test/");
    assert_eq!(transport.seen()[0].body.as_ref().unwrap()["method"], "eth_call");
}

#[tokio::test]
async fn missing_tool_config_aborts_the_run() {
    let mut req = request("set a = 1");
    req.tool_config = None;
    let result = run_with_transport(req, &test_config(), StubTransport::new().shared()).await;

    assert_eq!(result.errors, ["tool_config missing api_base_url or ipfs_gateway"]);
    assert_eq!(result.stdout, "");
    assert!(result.artifacts.is_empty());
    assert_eq!(result.tool_calls, 0);
}

#[tokio::test]
async fn oversized_script_aborts_the_run() {
    let mut config = test_config();
    config.limits.max_script_bytes = 16;
    let result = run_with_transport(
        request("print \"this script is too long\""),
        &config,
        StubTransport::new().shared(),
    )
    .await;

    assert_eq!(result.errors, ["script too large"]);
    assert!(result.artifacts.is_empty());
}

#[tokio::test]
async fn seed_vars_appear_in_artifacts() {
    let mut req = request("print \"{{task_id}}\"");
    req.vars = json!({"task_id": "task-7", "nested": {"k": [1, 2]}})
        .as_object()
        .cloned();
    let result = run_with_transport(req, &test_config(), StubTransport::new().shared()).await;

    assert_eq!(result.stdout, "task-7\n");
    assert_eq!(result.artifacts["nested"], json!({"k": [1, 2]}));
}

fn verify_call(rpc_url: &str) -> String {
    format!(
        "call mmv_verify_onchain into proof with {{\"task_id\": \"t-1\", \"bundle_hash\": \"0xab\", \
         \"chain_id\": 1, \"contract_address\": \"0xc0\", \"rpc_url\": \"{rpc_url}\"}}"
    )
}

#[tokio::test]
async fn verify_onchain_prefers_per_call_rpc() {
    let transport = StubTransport::new().shared();
    let script = verify_call("https://rpc.test/archive");
    let result = run_with_transport(request(&script), &test_config(), transport.clone()).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(transport.seen()[0].url, "https://rpc.test/archive");
}

#[tokio::test]
async fn verify_onchain_rejects_unlisted_per_call_rpc() {
    let transport = StubTransport::new().shared();
    let script = verify_call("https://evil.example");
    let result = run_with_transport(request(&script), &test_config(), transport.clone()).await;

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].ends_with("URL host not in allowlist"));
    assert!(transport.seen().is_empty());
    assert_eq!(result.tool_calls, 1);
}

#[tokio::test]
async fn verify_onchain_empty_per_call_rpc_uses_default() {
    let transport = StubTransport::new().shared();
    let script = verify_call("");
    let result = run_with_transport(request(&script), &test_config(), transport.clone()).await;

    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(transport.seen()[0].url, "https://rpc.test/");
}

#[tokio::test]
async fn large_unsigned_ids_survive_unchanged() {
    let mut req = request("print big");
    req.vars = json!({"big": u64::MAX}).as_object().cloned();
    let result = run_with_transport(req, &test_config(), StubTransport::new().shared()).await;

    assert_eq!(result.stdout, "18446744073709551615\n");
    assert_eq!(result.artifacts["big"], json!(u64::MAX));
}

#[tokio::test]
async fn disabled_generate_is_reported_before_its_syntax() {
    let result = run_with_transport(
        request("generate two words"),
        &test_config(),
        StubTransport::new().shared(),
    )
    .await;
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("generate two words: generate disabled"));

    let mut req = request("generate two words");
    req.allow_llm = Some(true);
    let transport = StubTransport::new().shared();
    let result = run_with_transport(req, &test_config(), transport.clone()).await;
    assert_eq!(result.errors, ["generate two words: invalid generate syntax"]);
    assert!(transport.seen().is_empty());
}
