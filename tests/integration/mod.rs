/// Integration tests against real stores and the MCP front end
mod basic_integration;
mod mcp_session;
