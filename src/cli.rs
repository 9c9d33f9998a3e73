//! Command-line interface for prismgen.
//!
//! Two surfaces: `generate` submits a generation request and prints its
//! event stream as JSON lines; `canvas` drives an idea-canvas session
//! (start, answer, back, report). API keys come from an environment
//! variable named by `--api-key-env`, never from arguments, so they stay
//! out of shell history and process listings.

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use std::io::Write;

use crate::{
    CachePolicy, CanvasOrchestrator, CanvasStartRequest, CanvasTemplate, Config,
    GenerationOrchestrator, GenerationPreferences, GenerationRequest, OutputKind, Provider,
    SourceItem,
};

/// prismgen - generate documents, decks, and canvas reports via LLM providers
#[derive(Parser)]
#[command(name = "prismgen")]
#[command(about = "Generation orchestration engine for LLM-backed artifacts")]
#[command(long_about = r#"
prismgen routes input content (files, URLs, pasted text) through
language-model transformation and renderer gateways, with a
content-addressed cache and streamed progress events.

EXAMPLES:
  # Generate a markdown summary from pasted text
  echo "quarterly results..." | prismgen generate --output-kind markdown \
      --provider anthropic --model claude-sonnet-4-5

  # Generate from a URL and a file, bypassing the cache
  prismgen generate --url https://example.com/report --file notes.pdf \
      --output-kind pdf --provider openai --model gpt-4o --no-cache

  # Start an idea canvas session
  prismgen canvas start --template startup --idea "an app for dog walkers" \
      --provider anthropic --model claude-sonnet-4-5

  # Answer the current question / go back / generate the report
  prismgen canvas answer --session sess_ab12 --question q_cd34 --value "Freelancers"
  prismgen canvas back --session sess_ab12
  prismgen canvas report --session sess_ab12

CONFIGURATION:
  Settings load with precedence: --config path > PRISMGEN_CONFIG >
  ./prismgen.toml > defaults. API keys are read from the environment
  variable named by --api-key-env (default PRISMGEN_API_KEY) and are
  passed only to the provider named in the request.
"#)]
#[command(version)]
struct Cli {
    /// Explicit config file path
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Environment variable holding the provider API key
    #[arg(long, global = true, default_value = "PRISMGEN_API_KEY")]
    api_key_env: String,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an artifact from sources, streaming progress as JSON lines
    Generate {
        /// Inline text source (repeatable; stdin is read when no source is given)
        #[arg(long)]
        text: Vec<String>,
        /// URL source (repeatable)
        #[arg(long)]
        url: Vec<String>,
        /// File source (repeatable)
        #[arg(long)]
        file: Vec<Utf8PathBuf>,
        /// Output kind: pdf, docx, pptx, markdown, mindmap
        #[arg(long)]
        output_kind: OutputKind,
        /// Provider: anthropic, openai, gemini
        #[arg(long)]
        provider: Provider,
        /// Model identifier (empty uses the configured default)
        #[arg(long, default_value = "")]
        model: String,
        /// Image-model identifier
        #[arg(long)]
        image_model: Option<String>,
        /// Bypass the cache and rebuild
        #[arg(long)]
        no_cache: bool,
    },
    /// Drive an idea-canvas session
    Canvas {
        #[command(subcommand)]
        command: CanvasCommand,
    },
}

#[derive(Subcommand)]
enum CanvasCommand {
    /// Start a session; prints the first question
    Start {
        /// Template: startup, web_app, ai_agent, project_spec, tech_stack,
        /// implement_feature, solve_problem, performance, scaling,
        /// security_review, code_architecture, custom
        #[arg(long)]
        template: CanvasTemplate,
        /// The idea to explore
        #[arg(long)]
        idea: String,
        #[arg(long)]
        provider: Provider,
        #[arg(long, default_value = "")]
        model: String,
    },
    /// Answer the current question
    Answer {
        #[arg(long)]
        session: String,
        #[arg(long)]
        question: String,
        #[arg(long)]
        value: String,
    },
    /// Pop the last answer and re-expose its question
    Back {
        #[arg(long)]
        session: String,
    },
    /// Generate the report for a completed session
    Report {
        #[arg(long)]
        session: String,
    },
}

/// Entry point invoked by main().
///
/// # Errors
/// Returns an error for configuration problems, missing API keys, or I/O
/// failures; stream-level failures are reported as `error` events on
/// stdout instead.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    prismgen_utils::logging::init_tracing(cli.verbose)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let config = Config::discover(cli.config.as_deref())?;
    let api_key = std::env::var(&cli.api_key_env).with_context(|| {
        format!(
            "API key not found in environment variable '{}'",
            cli.api_key_env
        )
    })?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(dispatch(cli.command, config, api_key))
}

async fn dispatch(command: Command, config: Config, api_key: String) -> Result<()> {
    match command {
        Command::Generate {
            text,
            url,
            file,
            output_kind,
            provider,
            model,
            image_model,
            no_cache,
        } => {
            let mut sources: Vec<SourceItem> = Vec::new();
            sources.extend(file.into_iter().map(|path| SourceItem::File { path }));
            sources.extend(url.into_iter().map(|url| SourceItem::Url { url }));
            sources.extend(text.into_iter().map(|content| SourceItem::Text { content }));

            if sources.is_empty() {
                let stdin = std::io::read_to_string(std::io::stdin())
                    .context("failed to read stdin")?;
                if stdin.trim().is_empty() {
                    bail!("no sources given and stdin is empty");
                }
                sources.push(SourceItem::Text { content: stdin });
            }

            let request = GenerationRequest {
                sources,
                output_kind,
                provider,
                model,
                image_model,
                cache: CachePolicy { reuse: !no_cache },
                preferences: GenerationPreferences::default(),
            };

            let orchestrator = GenerationOrchestrator::new(config);
            let (mut stream, _cancel) = orchestrator.generate(request, api_key);

            let stdout = std::io::stdout();
            while let Some(event) = stream.next().await {
                let mut lock = stdout.lock();
                writeln!(lock, "{}", event.to_json_line()?)?;
                lock.flush()?;
            }
            Ok(())
        }
        Command::Canvas { command } => {
            let orchestrator = CanvasOrchestrator::new(config);
            match command {
                CanvasCommand::Start {
                    template,
                    idea,
                    provider,
                    model,
                } => {
                    let stream = orchestrator.start(
                        CanvasStartRequest {
                            template,
                            idea,
                            provider,
                            model,
                        },
                        api_key,
                    );
                    print_canvas_stream(stream).await
                }
                CanvasCommand::Answer {
                    session,
                    question,
                    value,
                } => {
                    let stream = orchestrator.answer(session, question, value, api_key);
                    print_canvas_stream(stream).await
                }
                CanvasCommand::Back { session } => {
                    let question = orchestrator.go_back(&session).await?;
                    println!("{}", serde_json::to_string(&question)?);
                    Ok(())
                }
                CanvasCommand::Report { session } => {
                    let report = orchestrator.report(&session, &api_key).await?;
                    println!(
                        "{}",
                        serde_json::json!({
                            "title": report.title,
                            "path": report.artifact.path,
                            "content_hash": report.artifact.content_hash,
                        })
                    );
                    Ok(())
                }
            }
        }
    }
}

async fn print_canvas_stream(mut stream: prismgen_canvas::CanvasEventStream) -> Result<()> {
    let stdout = std::io::stdout();
    while let Some(event) = stream.next().await {
        let mut lock = stdout.lock();
        writeln!(lock, "{}", serde_json::to_string(&event)?)?;
        lock.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_args() {
        let cli = Cli::parse_from([
            "prismgen",
            "generate",
            "--text",
            "hello",
            "--output-kind",
            "markdown",
            "--provider",
            "anthropic",
        ]);
        let Command::Generate {
            text, output_kind, ..
        } = cli.command
        else {
            panic!("expected generate");
        };
        assert_eq!(text, vec!["hello".to_string()]);
        assert_eq!(output_kind, OutputKind::Markdown);
    }

    #[test]
    fn test_canvas_start_args() {
        let cli = Cli::parse_from([
            "prismgen",
            "canvas",
            "start",
            "--template",
            "startup",
            "--idea",
            "dog walking app",
            "--provider",
            "gemini",
        ]);
        let Command::Canvas {
            command: CanvasCommand::Start { template, provider, .. },
        } = cli.command
        else {
            panic!("expected canvas start");
        };
        assert_eq!(template, CanvasTemplate::Startup);
        assert_eq!(provider, Provider::Gemini);
    }
}
