pub mod chat;
pub mod cli;
pub mod config;
pub mod context;
pub mod http;
pub mod llm;
pub mod prompt;
pub mod trace;

use anyhow::{Result, anyhow, bail};
use chat::{ChatSession, ChatSettings};
use cli::{AppState, CliArgs, MISSING_KEY_MESSAGE, run_chat_ui};
use config::AppConfig;
use context::ContextFiles;
use http::{DebugSink, HttpClient, HttpDebugConfig};
use llm::gemini::GeminiProvider;
use std::env;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use trace::SessionTrace;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let settings = chat_settings(&config, &args);
    let model_name = args
        .model
        .clone()
        .unwrap_or_else(|| config.gemini_model.clone());

    let instructions_path = args
        .instructions
        .clone()
        .unwrap_or_else(|| config.context.instructions_file.clone());
    let knowledge_path = args
        .knowledge
        .clone()
        .unwrap_or_else(|| config.context.knowledge_file.clone());
    let context = ContextFiles::load(&instructions_path, &knowledge_path)?;

    let session_id = generate_session_id();
    let trace = SessionTrace::create(&session_id)?;

    let one_shot = args.ask.is_some();
    let sink = if one_shot {
        DebugSink::Stderr
    } else {
        DebugSink::Trace
    };
    let http = HttpClient::new(
        build_http_client(config.request_timeout_secs)?,
        HttpDebugConfig::from_verbose(args.verbose),
    )
    .with_trace(trace.clone())
    .with_debug_sink(sink);
    let llm = GeminiProvider::new(
        http,
        config.gemini_api_key.clone(),
        model_name.clone(),
        config.gemini_base_url.clone(),
    )
    .ok();

    if let Some(question) = args.ask.as_deref() {
        return ask_once(llm.as_ref(), &context, &settings, &trace, question).await;
    }

    let startup_messages = context.warnings();
    let app_state = AppState {
        session_id,
        llm,
        model_name,
        context,
        settings,
        welcome_message: config.context.welcome_message.clone(),
        theme_config: config.theme.clone(),
        color_enabled: !args.no_color && env::var_os("NO_COLOR").is_none(),
        startup_messages,
        trace,
    };

    run_chat_ui(app_state).await
}

fn chat_settings(config: &AppConfig, args: &CliArgs) -> ChatSettings {
    ChatSettings {
        prompt_style: args.prompt_style.unwrap_or(config.context.prompt_style),
        send_history: args.history || config.context.send_history,
        temperature: Some(args.temperature.unwrap_or(config.temperature)),
    }
}

fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|err| anyhow!("Failed to build HTTP client: {err}"))
}

/// Answers a single question on stdout. Context warnings go to stderr.
async fn ask_once(
    llm: Option<&GeminiProvider>,
    context: &ContextFiles,
    settings: &ChatSettings,
    trace: &SessionTrace,
    question: &str,
) -> Result<()> {
    for warning in context.warnings() {
        eprintln!("{warning}");
    }

    let question = question.trim();
    if question.is_empty() {
        bail!("--ask needs a non-empty question");
    }
    trace.log_chat_input(question);

    let Some(provider) = llm else {
        trace.log_chat_error(MISSING_KEY_MESSAGE);
        bail!(MISSING_KEY_MESSAGE);
    };

    let mut session = ChatSession::new();
    match chat::ask(provider, context, settings, &mut session, question).await {
        Ok(output) => {
            trace.log_chat_output(&output.text);
            println!("{}", output.text);
            Ok(())
        }
        Err(err) => {
            let message = format!("Assistant request failed: {err}");
            trace.log_chat_error(&message);
            Err(anyhow!(message))
        }
    }
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_millis());
    format!("{millis:x}-{:x}", std::process::id())
}
