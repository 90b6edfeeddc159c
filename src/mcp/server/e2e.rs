// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::*;

use crate::render::test_utils::StubRenderer;

fn new_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().expect("tokio runtime")
}

struct Harness {
    server: McpServer,
    renderer: Arc<StubRenderer>,
    _output_dir: tempfile::TempDir,
}

impl Harness {
    fn with_renderer(renderer: Arc<StubRenderer>) -> Self {
        let output_dir = tempfile::tempdir().expect("temp dir");
        let ctx =
            ServerContext::with_output_dir(renderer.clone(), output_dir.path().to_path_buf());
        Self { server: McpServer::new(Arc::new(ctx)), renderer, _output_dir: output_dir }
    }

    fn rendering(markup: &str, raster: Option<Vec<u8>>) -> Self {
        Self::with_renderer(StubRenderer::succeeding(markup, raster))
    }

    async fn roundtrip(&self, message: Value) -> Value {
        let response = self.server.handle_message(message).await.expect("response expected");
        serde_json::to_value(&response).expect("serializable response")
    }
}

#[test]
fn e2e_initialize_list_call_conversation() {
    let runtime = new_runtime();
    runtime.block_on(async {
        let raster = b"png-bytes".to_vec();
        let harness = Harness::rendering("<svg>X</svg>", Some(raster.clone()));

        // Step 1: initialize echoes a supported protocol revision.
        let init = harness
            .roundtrip(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": { "name": "probe", "version": "0.0.0" },
                },
            }))
            .await;
        assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(init["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(init["result"]["capabilities"]["tools"].is_object());

        // Step 2: the initialized notification gets no response.
        let none = harness
            .server
            .handle_message(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .await;
        assert!(none.is_none());

        // Step 3: exactly one tool is listed.
        let list = harness
            .roundtrip(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }))
            .await;
        let tools = list["result"]["tools"].as_array().expect("tools array");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], TOOL_NAME);
        assert_eq!(tools[0]["inputSchema"]["type"], "object");

        // Step 4: call it with defaults; the default output is a PNG payload.
        let call = harness
            .roundtrip(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": TOOL_NAME,
                    "arguments": { "mermaidCode": "flowchart TD\nA-->B" },
                },
            }))
            .await;
        let content = &call["result"]["content"][0];
        assert_eq!(content["type"], "image");
        assert_eq!(content["mimeType"], "image/png");
        let expected = {
            use base64::engine::general_purpose::STANDARD;
            use base64::Engine as _;
            STANDARD.encode(&raster)
        };
        assert_eq!(content["data"], expected);
        assert_eq!(harness.renderer.calls(), 1);
    });
}

#[test]
fn e2e_unknown_tool_is_method_not_found() {
    let runtime = new_runtime();
    runtime.block_on(async {
        let harness = Harness::rendering("<svg>X</svg>", None);

        let response = harness
            .roundtrip(json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": { "name": "generate_plantuml_diagram", "arguments": {} },
            }))
            .await;

        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Unknown tool: generate_plantuml_diagram");
    });
}

#[test]
fn e2e_invalid_arguments_are_invalid_params() {
    let runtime = new_runtime();
    runtime.block_on(async {
        let harness = Harness::rendering("<svg>X</svg>", None);

        let response = harness
            .roundtrip(json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": { "name": TOOL_NAME, "arguments": {} },
            }))
            .await;

        assert_eq!(response["error"]["code"], -32602);
        let message = response["error"]["message"].as_str().expect("message");
        assert!(message.contains("mermaidCode"), "got {message}");
        assert_eq!(harness.renderer.calls(), 0);
    });
}

#[test]
fn e2e_hosted_raster_url_matches_ink_pattern() {
    let runtime = new_runtime();
    runtime.block_on(async {
        let harness = Harness::rendering("<svg>X</svg>", None);

        let response = harness
            .roundtrip(json!({
                "jsonrpc": "2.0",
                "id": 6,
                "method": "tools/call",
                "params": {
                    "name": TOOL_NAME,
                    "arguments": {
                        "mermaidCode": "flowchart TD\nA-->B",
                        "theme": "default",
                        "outputKind": "hostedRasterUrl",
                    },
                },
            }))
            .await;

        let text = response["result"]["content"][0]["text"].as_str().expect("url text");
        let payload = text.strip_prefix("https://mermaid.ink/img/pako:").expect("img prefix");
        assert!(!payload.is_empty());
        assert!(
            payload.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'),
            "payload not base64url: {payload}"
        );
        assert!(!payload.contains('+'));
        assert!(!payload.contains('/'));
        assert!(!payload.ends_with('='));
    });
}

#[test]
fn e2e_render_failure_is_structured_error() {
    let runtime = new_runtime();
    runtime.block_on(async {
        let harness =
            Harness::with_renderer(StubRenderer::failing("Lexical error on line 1"));

        let response = harness
            .roundtrip(json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "tools/call",
                "params": {
                    "name": TOOL_NAME,
                    "arguments": { "mermaidCode": "not a diagram" },
                },
            }))
            .await;

        assert_eq!(response["error"]["code"], -32000);
        assert_eq!(response["error"]["message"], "Lexical error on line 1");
    });
}

#[test]
fn e2e_protocol_fallback_and_ping() {
    let runtime = new_runtime();
    runtime.block_on(async {
        let harness = Harness::rendering("<svg>X</svg>", None);

        // Unsupported client revision falls back to the server's latest.
        let init = harness
            .roundtrip(json!({
                "jsonrpc": "2.0",
                "id": 8,
                "method": "initialize",
                "params": { "protocolVersion": "1999-01-01" },
            }))
            .await;
        assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);

        let pong = harness.roundtrip(json!({ "jsonrpc": "2.0", "id": 9, "method": "ping" })).await;
        assert!(pong["result"].as_object().expect("empty object").is_empty());
    });
}

#[test]
fn e2e_malformed_frames_get_invalid_request_or_silence() {
    let runtime = new_runtime();
    runtime.block_on(async {
        let harness = Harness::rendering("<svg>X</svg>", None);

        // Unanswerable: not an object, no id to address.
        let scalar = harness.server.handle_message(json!(42)).await.expect("response");
        let scalar = serde_json::to_value(&scalar).expect("serializable");
        assert_eq!(scalar["error"]["code"], -32600);
        assert_eq!(scalar["id"], Value::Null);

        // An id without a method is answered as an invalid request.
        let no_method = harness
            .roundtrip(json!({ "jsonrpc": "2.0", "id": 10 }))
            .await;
        assert_eq!(no_method["error"]["code"], -32600);
        assert_eq!(no_method["id"], 10);

        // A stray client response (result, no method, no id) is dropped.
        let stray = harness
            .server
            .handle_message(json!({ "jsonrpc": "2.0", "result": {} }))
            .await;
        assert!(stray.is_none());

        // Unknown methods with ids are answerable.
        let unknown = harness
            .roundtrip(json!({ "jsonrpc": "2.0", "id": 11, "method": "diagram/explode" }))
            .await;
        assert_eq!(unknown["error"]["code"], -32601);
    });
}
