//! Helicone node CLI entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Parse configuration**: load the config file, environment overrides
//!    and credentials (see [`config`]).
//! 2. **Wire observability**: install `tracing-subscriber` with a pretty or
//!    JSON layer on stderr and, when configured, an OpenTelemetry OTLP
//!    exporter. All `tracing` spans and events emitted by every crate in the
//!    workspace flow through this layer.
//! 3. **Construct infrastructure**: create the [`llm::HttpTransport`] and
//!    inject it into a [`nodes::HeliconeNode`].
//! 4. **Run the batch**: read input items, execute them (or, with
//!    `--dry-run`, only build them) and write the output items to stdout as a
//!    JSON array.

mod config;
mod input;
mod telemetry;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use nodes::{HeliconeNode, NodeItem, NodeOutput};
use serde_json::Value;
use tracing::info;

use crate::config::AppConfig;

/// Send chat-completion requests through the Helicone gateway.
#[derive(Debug, Parser)]
#[command(name = "helicone-node", version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to ./helicone.* if present.
    #[arg(short, long, env = "HELICONE_NODE_CONFIG")]
    config: Option<PathBuf>,

    /// Input items as a JSON array or JSON Lines; `-` reads stdin.
    /// Without input, one empty item is processed.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Record item failures as `{"error": ...}` outputs instead of aborting.
    #[arg(long)]
    continue_on_fail: bool,

    /// Print the outbound requests (credentials redacted) without sending them.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let telemetry = telemetry::init(&config.logging)?;

    let result = run(&cli, &config).await;
    telemetry.shutdown();
    result
}

async fn run(cli: &Cli, config: &AppConfig) -> anyhow::Result<()> {
    let items = read_items(cli.input.as_ref()).await?;
    let node = build_node(cli, config)?;

    info!(
        provider = %config.node.provider,
        items = items.len(),
        dry_run = cli.dry_run,
        "Starting Helicone node"
    );

    let output: Vec<Value> = if cli.dry_run {
        dry_run(&node, &items)?
    } else {
        node.execute(&items)
            .await?
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?
    };

    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &output).context("failed to write output")?;
    println!();
    Ok(())
}

fn build_node(cli: &Cli, config: &AppConfig) -> anyhow::Result<HeliconeNode> {
    let transport = llm::HttpTransport::new(config.transport_config())?;
    Ok(
        HeliconeNode::new(config.credential()?, config.node.clone(), Arc::new(transport))
            .with_continue_on_fail(continue_on_fail(cli, config)),
    )
}

// The flag can only switch the setting on.
fn continue_on_fail(cli: &Cli, config: &AppConfig) -> bool {
    cli.continue_on_fail || config.continue_on_fail
}

/// Builds every item without sending. Build failures become error records
/// regardless of continue-on-failure.
fn dry_run(node: &HeliconeNode, items: &[NodeItem]) -> anyhow::Result<Vec<Value>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| dry_run_item(node, index, item))
        .collect()
}

fn dry_run_item(node: &HeliconeNode, index: usize, item: &NodeItem) -> anyhow::Result<Value> {
    let output = match node.prepare(item) {
        Ok(request) => NodeOutput::success(index, serde_json::to_value(request.redacted())?),
        Err(err) => NodeOutput::error(index, err.to_string()),
    };
    Ok(serde_json::to_value(output)?)
}

async fn read_items(source: Option<&PathBuf>) -> anyhow::Result<Vec<NodeItem>> {
    let text = match source {
        None => return Ok(vec![NodeItem::empty()]),
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
    };
    input::parse_items(&text)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use gateway::{ApiKey, GatewayCredential};
    use nodes::{NodeParameters, OpenAiParameters};
    use serde_json::json;

    use super::*;

    fn node(openai_key: &str) -> HeliconeNode {
        let parameters = NodeParameters {
            openai: OpenAiParameters {
                api_key: openai_key.into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let transport = llm::HttpTransport::new(Default::default()).unwrap();
        HeliconeNode::new(
            GatewayCredential::new(ApiKey::new("pk-helicone").unwrap()),
            parameters,
            Arc::new(transport),
        )
    }

    fn config(continue_on_fail: bool) -> AppConfig {
        let mut config = AppConfig {
            continue_on_fail,
            ..Default::default()
        };
        config.helicone.api_key = "pk-helicone".into();
        config
    }

    #[test]
    fn dry_run_prints_redacted_request_descriptors() {
        let output = dry_run_item(&node("sk-openai"), 0, &NodeItem::empty()).unwrap();

        assert_eq!(output["pairedItem"], json!({"item": 0}));
        let request = &output["json"];
        assert_eq!(request["url"], "https://oai.helicone.ai/v1/chat/completions");
        assert_eq!(request["headers"]["Helicone-Auth"], "***");
        assert_eq!(request["headers"]["Authorization"], "***");
        assert!(!output.to_string().contains("sk-openai"));
        assert!(!output.to_string().contains("pk-helicone"));
    }

    #[test]
    fn dry_run_build_failure_becomes_an_error_record() {
        // Continue-on-failure is off; dry runs record the failure anyway.
        let output = dry_run_item(&node(""), 3, &NodeItem::empty()).unwrap();

        assert_eq!(output["pairedItem"], json!({"item": 3}));
        let message = output["json"]["error"].as_str().unwrap();
        assert!(message.contains("OpenAI API key is required"), "{message}");
    }

    #[test]
    fn dry_run_keeps_going_after_a_failed_item() {
        let items = [
            NodeItem::new(json!({"parameters": {"max_tokens": 0}})),
            NodeItem::empty(),
        ];

        let outputs = dry_run(&node("sk-openai"), &items).unwrap();

        assert_eq!(outputs.len(), 2);
        assert!(outputs[0]["json"]["error"].is_string());
        assert_eq!(outputs[1]["pairedItem"], json!({"item": 1}));
        assert_eq!(outputs[1]["json"]["body"]["model"], "gpt-4o-mini");
    }

    #[test]
    fn continue_on_fail_flag_overrides_the_config() {
        let with_flag = Cli::try_parse_from(["helicone-node", "--continue-on-fail"]).unwrap();
        let without_flag = Cli::try_parse_from(["helicone-node"]).unwrap();

        assert!(continue_on_fail(&with_flag, &config(false)));
        assert!(continue_on_fail(&without_flag, &config(true)));
        assert!(!continue_on_fail(&without_flag, &config(false)));
        assert!(build_node(&with_flag, &config(false)).is_ok());
    }

    #[test]
    fn build_node_requires_the_gateway_key() {
        let cli = Cli::try_parse_from(["helicone-node", "--dry-run"]).unwrap();
        assert!(cli.dry_run);
        assert!(build_node(&cli, &AppConfig::default()).is_err());
    }

    #[tokio::test]
    async fn missing_input_runs_one_empty_item() {
        assert_eq!(read_items(None).await.unwrap(), vec![NodeItem::empty()]);
    }

    #[tokio::test]
    async fn input_file_is_parsed_as_items() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"a\": 1}}").unwrap();
        writeln!(file, "{{\"b\": 2}}").unwrap();

        let items = read_items(Some(&file.path().to_path_buf())).await.unwrap();

        assert_eq!(items, vec![NodeItem::new(json!({"a": 1})), NodeItem::new(json!({"b": 2}))]);
    }
}
