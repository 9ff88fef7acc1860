//! Commands talking to a running facebatchd over raw JSON-RPC

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{Table, Tabled};

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

pub async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0",
        method,
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

#[derive(Deserialize, Tabled)]
struct TaskRow {
    task_id: String,
    status: String,
    #[tabled(display_with = "display_option")]
    #[serde(default)]
    output_filename: Option<String>,
    #[tabled(display_with = "display_option")]
    #[serde(default)]
    error: Option<String>,
}

fn display_option(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn colored_status(status: &str) -> String {
    match status {
        "completed" => status.green().to_string(),
        "failed" => status.red().to_string(),
        _ => status.yellow().to_string(),
    }
}

pub async fn submit(
    url: &str,
    source: &Path,
    target: &Path,
    options: serde_json::Value,
    wait: bool,
) -> Result<()> {
    let params = json!({
        "source_path": source,
        "target_path": target,
        "options": options,
    });
    let result = call_rpc(url, "task.submit.v1", params).await?;
    let mut row: TaskRow = serde_json::from_value(result)?;

    println!("{}", "✓ Task submitted".green().bold());

    if wait {
        while !matches!(row.status.as_str(), "completed" | "failed") {
            tokio::time::sleep(Duration::from_secs(2)).await;
            let result = call_rpc(url, "task.status.v1", json!({ "task_id": row.task_id })).await?;
            row = serde_json::from_value(result)?;
        }
    }

    row.status = colored_status(&row.status);
    println!("{}", Table::new(vec![row]));
    Ok(())
}

pub async fn status(url: &str, task_id: &str) -> Result<()> {
    let result = call_rpc(url, "task.status.v1", json!({ "task_id": task_id })).await?;

    println!("{}", format!("Task {}", task_id).cyan().bold());
    println!("  {} {}", "Status:".bold(), colored_status(result["status"].as_str().unwrap_or("?")));
    println!("  {} {}", "Source:".bold(), result["source_filename"].as_str().unwrap_or("-"));
    println!("  {} {}", "Target:".bold(), result["target_filename"].as_str().unwrap_or("-"));
    if let Some(output) = result["output_filename"].as_str() {
        println!("  {} {}", "Output:".bold(), output);
    }
    if let Some(error) = result["error"].as_str() {
        println!("  {} {}", "Error:".bold(), error.red());
    }
    Ok(())
}

pub async fn fetch(url: &str, task_id: &str, dest: Option<PathBuf>) -> Result<()> {
    let result = call_rpc(url, "task.fetch.v1", json!({ "task_id": task_id })).await?;
    let output_path = PathBuf::from(
        result["output_path"]
            .as_str()
            .context("response has no output_path")?,
    );
    let size_bytes = result["size_bytes"].as_u64().unwrap_or(0);

    match dest {
        Some(dest) => {
            let dest = if dest.is_dir() {
                match output_path.file_name() {
                    Some(name) => dest.join(name),
                    None => dest,
                }
            } else {
                dest
            };
            tokio::fs::copy(&output_path, &dest)
                .await
                .with_context(|| format!("copying {} to {}", output_path.display(), dest.display()))?;
            println!("{} {} ({} bytes)", "✓ Saved".green().bold(), dest.display(), size_bytes);
        }
        None => println!("{} ({} bytes)", output_path.display(), size_bytes),
    }
    Ok(())
}

pub async fn stats(url: &str) -> Result<()> {
    println!("{}", "Daemon Status".cyan().bold());
    println!();

    match call_rpc(url, "admin.stats.v1", json!({})).await {
        Ok(stats) => {
            let tasks = &stats["tasks"];
            let resources = &stats["resources"];
            println!("  {} {}", "RPC URL:".bold(), url);
            println!("  {} {}", "Status:".bold(), "ONLINE".green());
            println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
            println!();
            println!("  {} {}", "Total tasks:".bold(), tasks["total"]);
            println!("  {} {}", "Pending:".bold(), tasks["pending"]);
            println!(
                "  {} {}",
                "Processing:".bold(),
                tasks["processing_image"].as_u64().unwrap_or(0)
                    + tasks["processing_video_queued"].as_u64().unwrap_or(0)
                    + tasks["processing"].as_u64().unwrap_or(0)
            );
            println!("  {} {}", "Completed:".bold(), tasks["completed"]);
            println!("  {} {}", "Failed:".bold(), tasks["failed"]);
            println!();
            let temperature = resources["temperature_celsius"]
                .as_f64()
                .map(|t| format!("{:.1}°C", t))
                .unwrap_or_else(|| "unknown".to_string());
            println!("  {} {}", "Temperature:".bold(), temperature);
            println!("  {} {:.1}%", "CPU:".bold(), resources["cpu_percent"].as_f64().unwrap_or(0.0));
            println!(
                "  {} {:.1}%",
                "Memory:".bold(),
                resources["memory_percent"].as_f64().unwrap_or(0.0)
            );
            let verdict = resources["verdict"].as_str().unwrap_or("?");
            if resources["safe"].as_bool().unwrap_or(false) {
                println!("  {} {}", "Host:".bold(), verdict.green());
            } else {
                println!("  {} {}", "Host:".bold(), verdict.red());
            }
        }
        Err(e) => {
            println!("  {} {}", "Status:".bold(), "ERROR".red());
            println!("  {} {}", "Error:".bold(), e);
        }
    }
    Ok(())
}
