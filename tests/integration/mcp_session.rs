/// MCP session tests driving the server one JSON-RPC line at a time
use habit_completion_cache::*;
use serde_json::{json, Value};
use std::sync::Arc;

#[cfg(test)]
mod mcp_session_tests {
    use super::*;

    fn today() -> DateKey {
        DateKey::from_ymd(2024, 6, 1).unwrap()
    }

    fn server() -> (McpServer, Arc<MemoryLogStore>) {
        let logs = Arc::new(MemoryLogStore::new());
        let cache = CompletionCache::new(
            logs.clone(),
            Arc::new(MemoryLocalStore::new()),
            Arc::new(ManualClock::at_noon(today())),
            CacheConfig::default(),
        );
        (McpServer::new(cache), logs)
    }

    async fn send(server: &mut McpServer, request: Value) -> Value {
        let response = server
            .process_line(&request.to_string())
            .await
            .expect("request should get a response");
        serde_json::to_value(response).expect("response serializes")
    }

    async fn call_tool(server: &mut McpServer, id: u64, name: &str, arguments: Value) -> Value {
        let response = send(
            server,
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": "tools/call",
                "params": { "name": name, "arguments": arguments }
            }),
        )
        .await;
        response["result"].clone()
    }

    #[tokio::test]
    async fn test_initialize_handshake() {
        let (mut server, _) = server();

        let response = send(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert!(response["result"]["capabilities"]["tools"].is_object());
        assert!(!server.is_initialized());

        let ack = server
            .process_line(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#)
            .await;
        assert!(ack.is_none());
        assert!(server.is_initialized());
    }

    #[tokio::test]
    async fn test_tools_list_has_schemas() {
        let (mut server, _) = server();

        let response = send(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        )
        .await;

        let tools = response["result"]["tools"].as_array().expect("tools array");
        let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
        assert_eq!(
            names,
            vec![
                "completion_status",
                "completion_toggle",
                "completion_streak",
                "completion_totals",
                "completion_forget",
            ]
        );
        for tool in tools {
            assert!(tool["inputSchema"]["properties"]["habit_id"].is_object());
        }
    }

    #[tokio::test]
    async fn test_toggle_then_status() {
        let (mut server, logs) = server();

        let toggled = call_tool(&mut server, 3, "completion_toggle", json!({"habit_id": "h1"})).await;
        assert_eq!(toggled["isError"], false);
        assert_eq!(toggled["structuredContent"]["status"], "completed");
        assert_eq!(toggled["structuredContent"]["changed"], true);
        assert_eq!(toggled["structuredContent"]["current_streak"], 1);

        let status = call_tool(&mut server, 4, "completion_status", json!({"habit_id": "h1"})).await;
        assert_eq!(status["structuredContent"]["date"], "2024-06-01");
        assert_eq!(status["structuredContent"]["status"], "completed");
        assert_eq!(status["structuredContent"]["totals"]["completed"], 1);

        assert!(server.process_line("   ").await.is_none());
        // Saves run in the background.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(logs.save_count(), 1);
    }

    #[tokio::test]
    async fn test_streak_and_forget() {
        let (mut server, logs) = server();
        let habit = HabitId::from("h1");
        for ago in 0..3 {
            logs.insert(&habit, LogEntry::new(today().days_before(ago), CompletionStatus::Completed));
        }

        let streak = call_tool(&mut server, 5, "completion_streak", json!({"habit_id": "h1"})).await;
        assert_eq!(streak["structuredContent"]["current_streak"], 3);

        let forgotten = call_tool(&mut server, 6, "completion_forget", json!({"habit_id": "h1"})).await;
        assert_eq!(forgotten["structuredContent"]["was_cached"], true);
    }

    #[tokio::test]
    async fn test_bad_arguments_are_tool_errors() {
        let (mut server, _) = server();

        let bad_date = call_tool(
            &mut server,
            7,
            "completion_status",
            json!({"habit_id": "h1", "date": "June 1st"}),
        )
        .await;
        assert_eq!(bad_date["isError"], true);

        let missing = call_tool(&mut server, 8, "completion_totals", json!({})).await;
        assert_eq!(missing["isError"], true);

        let unknown = call_tool(&mut server, 9, "completion_delete", json!({"habit_id": "h1"})).await;
        assert_eq!(unknown["isError"], true);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let (mut server, _) = server();

        let unknown = send(
            &mut server,
            json!({"jsonrpc": "2.0", "id": 10, "method": "resources/list"}),
        )
        .await;
        assert_eq!(unknown["error"]["code"], -32601);

        let invalid = server.process_line("{not json").await.expect("parse error response");
        let invalid = serde_json::to_value(invalid).expect("response serializes");
        assert_eq!(invalid["error"]["code"], -32700);
        assert_eq!(invalid["id"], Value::Null);
    }
}
