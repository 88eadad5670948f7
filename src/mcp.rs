use crate::analyzer::Analyzer;
use crate::cli::format::findings_json;
use crate::config::Severity;
use serde_json::json;
use std::io::{self, BufRead, Write};

/// Run a simple MCP-compatible server over stdio.
///
/// Reads line-delimited JSON-RPC requests from stdin and writes one response
/// line per request to stdout. Notifications get no response.
pub fn run_mcp_server(analyzer: &Analyzer) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    serve(analyzer, stdin.lock(), &mut stdout);
}

fn serve(analyzer: &Analyzer, input: impl BufRead, out: &mut dyn Write) {
    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(request) => match handle_request(analyzer, &request) {
                Some(r) => r,
                None => continue,
            },
            Err(e) => json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32700, "message": format!("Parse error: {}", e) }
            }),
        };

        let _ = writeln!(out, "{}", response);
        let _ = out.flush();
    }
}

fn handle_request(analyzer: &Analyzer, request: &serde_json::Value) -> Option<serde_json::Value> {
    let id = request.get("id").cloned();
    let method = request.get("method").and_then(|m| m.as_str()).unwrap_or("");
    let params = request.get("params").cloned().unwrap_or(json!({}));
    tracing::debug!(method, "mcp request");

    Some(match method {
        "initialize" => handle_initialize(id),
        "tools/list" => handle_tools_list(id),
        "tools/call" => handle_tools_call(id, &params, analyzer),
        "notifications/initialized" | "notifications/cancelled" => return None,
        _ => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": format!("Unknown method: {}", method) }
        }),
    })
}

fn handle_initialize(id: Option<serde_json::Value>) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "jscheck",
                "version": env!("CARGO_PKG_VERSION")
            }
        }
    })
}

fn handle_tools_list(id: Option<serde_json::Value>) -> serde_json::Value {
    let code_schema = json!({
        "type": "object",
        "properties": {
            "code": {
                "type": "string",
                "description": "JavaScript source text"
            }
        },
        "required": ["code"]
    });

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "tools": [
                {
                    "name": "analyze",
                    "description": "Find common JavaScript mistakes. Returns findings with positions and fix suggestions.",
                    "inputSchema": code_schema
                },
                {
                    "name": "fix",
                    "description": "Apply every automatic fix and return the corrected code.",
                    "inputSchema": code_schema
                },
                {
                    "name": "list_rules",
                    "description": "List the enabled rules.",
                    "inputSchema": {
                        "type": "object",
                        "properties": {}
                    }
                }
            ]
        }
    })
}

fn handle_tools_call(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
    analyzer: &Analyzer,
) -> serde_json::Value {
    let tool_name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    let code = arguments.get("code").and_then(|c| c.as_str());
    let payload = match (tool_name, code) {
        ("analyze", Some(code)) => analyze_payload(analyzer, code),
        ("fix", Some(code)) => fix_payload(analyzer, code),
        ("list_rules", _) => rules_payload(analyzer),
        ("analyze" | "fix", None) => {
            return tool_error(id, "missing required argument 'code'");
        }
        _ => {
            return json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32602, "message": format!("Unknown tool: {}", tool_name) }
            });
        }
    };

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "content": [{ "type": "text", "text": payload.to_string() }]
        }
    })
}

fn tool_error(id: Option<serde_json::Value>, message: &str) -> serde_json::Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": {
            "content": [{ "type": "text", "text": format!("Error: {}", message) }],
            "isError": true
        }
    })
}

fn analyze_payload(analyzer: &Analyzer, code: &str) -> serde_json::Value {
    let findings = analyzer.analyze(code);
    json!({
        "findings": findings_json(&findings),
        "summary": {
            "total": findings.len(),
            "errors": findings.iter().filter(|f| f.severity == Severity::Error).count(),
            "warnings": findings.iter().filter(|f| f.severity == Severity::Warning).count(),
            "fixable": findings.iter().filter(|f| f.is_fixable()).count(),
        }
    })
}

fn fix_payload(analyzer: &Analyzer, code: &str) -> serde_json::Value {
    let (report, _) = analyzer.fix(code);
    let remaining = analyzer.analyze(&report.text);
    json!({
        "fixed": report.text,
        "applied": report.applied,
        "skipped": report.skipped_overlap + report.skipped_stale,
        "findings": findings_json(&remaining),
    })
}

fn rules_payload(analyzer: &Analyzer) -> serde_json::Value {
    let rules: Vec<_> = analyzer
        .registry()
        .iter()
        .map(|r| {
            json!({
                "id": r.id(),
                "severity": r.severity().as_str(),
                "fixable": r.is_fixable(),
                "message": r.message(),
            })
        })
        .collect();
    json!({ "rules": rules })
}
