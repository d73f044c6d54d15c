//! Interactive prompt that feeds integer pairs to the `add` tool. Each call is
//! a `tools/call` JSON-RPC request sent through the same MCP engine that
//! serves remote clients.

use std::io;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::domain::tools::ADD_TOOL_NAME;
use crate::mcp::server::handle_json_rpc_request;
use crate::AppState;

pub const PROMPT_IDENTITY: &str = "local-prompt";

enum Input {
    Value(i64),
    Invalid(String),
    Exit,
}

pub async fn run_prompt<R, W>(state: &AppState, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut next_id: i64 = 0;

    loop {
        let x = match read_operand(&mut reader, &mut writer, "Enter X: (or 'exit' to quit) ").await? {
            Input::Value(value) => value,
            Input::Invalid(error) => {
                writer.write_all(format!("Invalid X: {error}\n").as_bytes()).await?;
                continue;
            }
            Input::Exit => break,
        };

        let y = match read_operand(&mut reader, &mut writer, "Enter Y: (or type 'exit' to quit) ").await? {
            Input::Value(value) => value,
            Input::Invalid(error) => {
                writer.write_all(format!("Invalid Y: {error}\n").as_bytes()).await?;
                continue;
            }
            Input::Exit => break,
        };

        next_id += 1;
        let response = handle_json_rpc_request(
            state,
            PROMPT_IDENTITY,
            Some(json!(next_id)),
            "tools/call".to_string(),
            Some(json!({
                "name": ADD_TOOL_NAME,
                "arguments": { "x": x, "y": y },
            })),
        )
        .await;
        let line = render_response(&response);
        writer.write_all(line.as_bytes()).await?;
    }

    writer.flush().await?;
    debug!("interactive prompt finished");
    Ok(())
}

fn render_response(response: &Value) -> String {
    if let Some(error) = response.get("error") {
        let message = error
            .pointer("/data/message")
            .or_else(|| error.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return format!("Tool call failed: {message}\n");
    }

    let text = response
        .pointer("/result/content/0/text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if response.pointer("/result/isError") == Some(&Value::Bool(true)) {
        format!("Tool call failed: {text}\n")
    } else {
        format!("Result: {text}\n")
    }
}

async fn read_operand<R, W>(reader: &mut R, writer: &mut W, prompt: &str) -> io::Result<Input>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(prompt.as_bytes()).await?;
    writer.flush().await?;

    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(Input::Exit);
    }

    let line = line.trim();
    if line == "exit" {
        return Ok(Input::Exit);
    }

    Ok(match line.parse::<i64>() {
        Ok(value) => Input::Value(value),
        Err(err) => Input::Invalid(err.to_string()),
    })
}
