pub mod assistant;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod documents;
pub mod http;
pub mod llm;
pub mod mode;
pub mod session;
pub mod trace;

use anyhow::Result;
use cli::{
    AppState, CliArgs, Palette, analyze_once, ask_once, attach_files, print_outputs, run_repl,
};
use config::AppConfig;
use http::client::HttpClient;
use http::debug::HttpDebugConfig;
use llm::gemini::GeminiProvider;
use mode::Mode;
use session::Session;
use trace::SessionTrace;

pub async fn run(args: CliArgs) -> Result<()> {
    let config = AppConfig::load_with_path(args.config.as_deref())?;
    let palette = Palette::from_env();
    let mode = startup_mode(args.mode.as_deref(), config.mode);

    let session = Session::new(mode);
    let trace = SessionTrace::create(session.id())?;
    trace.log_event("session", &format!("started in {mode} mode"));

    let http = HttpClient::new(
        reqwest::Client::new(),
        HttpDebugConfig::from_verbose(args.verbose),
    )
    .with_trace(trace.clone());
    let llm = GeminiProvider::new(
        http,
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
        config.temperature,
    )
    .ok();
    if let Some(provider) = &llm {
        trace.log_event("session", &format!("using model {}", provider.model()));
    }

    let mut app_state = AppState {
        session,
        llm,
        trace,
        analysis_prefix_chars: config.analysis_prefix_chars,
        palette,
    };

    if !args.files.is_empty() {
        let outputs = attach_files(&mut app_state, &args.files);
        print_outputs(&app_state.palette, &outputs);
    }

    if let Some(prompt) = args.ask.as_deref() {
        let reply = ask_once(&mut app_state, prompt).await?;
        println!("{reply}");
        return Ok(());
    }

    if args.analyze {
        let reply = analyze_once(&mut app_state).await?;
        println!("{reply}");
        return Ok(());
    }

    run_repl(&mut app_state).await
}

/// `--mode` wins over the config file; a name that matches no mode falls
/// back to General with a warning.
fn startup_mode(requested: Option<&str>, configured: Mode) -> Mode {
    let Some(name) = requested else {
        return configured;
    };

    match name.parse::<Mode>() {
        Ok(mode) => mode,
        Err(err) => {
            eprintln!("{err}; starting in {} mode", Mode::General);
            Mode::General
        }
    }
}
