mod args;
mod approval;

use approval::StdinApprovalGate;
use args::Args;
use serde_json::json;
use shepherd_config::{init_logging, Config};
use shepherd_loop::{AllowAll, Scheduler};
use shepherd_policy::PolicyEngine;
use shepherd_provider::adapters::{AnthropicProvider, GrokProvider};
use shepherd_provider::ProviderRouter;
use shepherd_session::{FsSessionStore, SessionStore};
use shepherd_types::{BudgetLimits, LlmRequest, Message, ToolCall};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const DEFAULT_SYSTEM_PROMPT: &str = "You are shepherd, a careful coding assistant with access to \
a small set of sandboxed tools. Use them only when they help answer the user.";

#[tokio::main]
async fn main() -> ExitCode {
    let _logging_guard = init_logging("logs");

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("shepherd: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("shepherd: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = FsSessionStore::new(PathBuf::from("data/sessions"));

    if args.list_sessions {
        let summaries = sessions.list().await?;
        print_json_or_lines(args.json, &summaries, |s| {
            format!(
                "{}  updated_at={}  messages={}",
                s.id,
                s.updated_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "?".into()),
                s.message_count.map(|n| n.to_string()).unwrap_or_else(|| "?".into())
            )
        });
        return Ok(());
    }

    if let Some(id) = args.export_session {
        match sessions.export_markdown(&id).await? {
            Some(markdown) => println!("{markdown}"),
            None => {
                eprintln!("no such session: {id}");
                return Err("session not found".into());
            }
        }
        return Ok(());
    }

    if let Some(id) = args.delete_session {
        sessions.delete(&id).await?;
        println!("deleted session {id}");
        return Ok(());
    }

    if let Some(days) = args.prune_sessions {
        let deleted = sessions.prune_older_than(days).await?;
        println!("pruned {} session(s)", deleted.len());
        for id in deleted {
            println!("  {id}");
        }
        return Ok(());
    }

    let config = Config::from_env()?;
    let purpose = args.purpose();
    let policy_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let policy = Arc::new(PolicyEngine::with_default_config(policy_root));
    let registry = shepherd_tool::default_registry(policy);

    if let Some(tool_name) = &args.tool {
        let mut fields = serde_json::Map::new();
        if let Some(path) = &args.path {
            fields.insert("path".into(), json!(path));
        }
        if let Some(content) = &args.content {
            fields.insert("content".into(), json!(content));
        }
        if args.overwrite {
            fields.insert("overwrite".into(), json!(true));
        }
        if let Some(prompt) = &args.prompt {
            fields.insert("expression".into(), json!(prompt));
            fields.insert("command".into(), json!(prompt));
        }

        let call = ToolCall::new("manual", tool_name.clone(), serde_json::Value::Object(fields).to_string());
        let ctx = shepherd_tool::ToolContext { purpose };
        let result = registry.execute(&call, ctx).await;
        println!("{}", result.to_json_string());
        return if matches!(result, shepherd_types::ToolResult::Failure { .. }) {
            Err("tool call failed".into())
        } else {
            Ok(())
        };
    }

    let mut router = ProviderRouter::new();
    router.register(
        "grok",
        Arc::new(
            GrokProvider::new(config.grok_api_key.clone(), config.grok_base_url.clone())
                .with_default_model(config.grok_model.clone()),
        ),
    );
    if let Some(anthropic_key) = config.anthropic_api_key.clone() {
        router.register(
            "anthropic",
            Arc::new(
                AnthropicProvider::new(anthropic_key)
                    .with_default_model(config.anthropic_model.clone()),
            ),
        );
    }

    let mut session = sessions.get_or_create(args.session.clone()).await?;
    if session.messages.is_empty() {
        session.push(Message::system(args.system.clone().unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())));
    }
    if let Some(prompt) = &args.prompt {
        session.push(Message::user(prompt.clone()));
    }

    let request = LlmRequest {
        provider: args.provider.clone().unwrap_or_default(),
        model: args.model.clone().unwrap_or_default(),
        messages: session.messages.clone(),
        max_output_tokens: args.max_output_tokens,
        temperature: None,
        tools: None,
        purpose,
        meta: None,
    };

    if args.toolloop {
        let policy = Arc::new(PolicyEngine::with_default_config(
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        ));
        let registry = shepherd_tool::default_registry(policy);
        let scheduler = Scheduler::new(Arc::new(router), registry);
        let gate = StdinApprovalGate {
            auto_approve_reads: args.yes,
        };
        let limits = BudgetLimits::new(args.max_steps, args.max_tool_calls);
        let tool_ctx = shepherd_tool::ToolContext { purpose };

        let result = scheduler
            .run(request, limits, &gate, tool_ctx, None, session.id.as_str().into())
            .await?;

        session.messages = result.messages;
        sessions.save(&mut session).await?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&result.final_response)?);
        } else {
            println!("{}", result.final_response.text);
        }
        return Ok(());
    }

    let response = router.chat(request).await?;
    session.push(response.message.clone());
    sessions.save(&mut session).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.text);
    }

    Ok(())
}

fn print_json_or_lines<T: serde::Serialize>(as_json: bool, items: &[T], line: impl Fn(&T) -> String) {
    if as_json {
        println!("{}", serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".into()));
    } else {
        for item in items {
            println!("{}", line(item));
        }
    }
}
