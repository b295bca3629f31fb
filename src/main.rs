//! LabClear terminal front end.
//!
//! Thin presentation glue over the library core: reads the report from a
//! file argument or pasted text, drives one analysis session against the
//! remote service, renders the summary, then runs the interactive
//! follow-up loop. All control-flow rules live in the library.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use labclear::client::{AnalysisClient, Provider};
use labclear::config;
use labclear::conversation::starter_questions;
use labclear::input::{format_file_size, InputCapture, InputMode, MIN_TEXT_CHARS};
use labclear::models::{FindingStatus, ReportSummary};
use labclear::presentation;
use labclear::session::{AnalysisSession, Phase};

#[derive(Parser)]
#[command(name = "labclear", version, about = "Understand your lab reports before your doctor visit")]
struct Cli {
    /// Lab report file to analyze (PDF, image, or plain text)
    file: Option<PathBuf>,

    /// Analyze pasted report text instead of a file
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,

    /// Backend model implementation: local (privacy-first) or cloud
    #[arg(long, default_value = "local")]
    provider: Provider,

    /// Base URL of the analysis service
    #[arg(long, env = "LABCLEAR_API_URL", default_value = config::DEFAULT_API_URL)]
    api_url: String,

    /// Print the summary and exit without the follow-up prompt
    #[arg(long)]
    no_chat: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let client = AnalysisClient::new(&cli.api_url);
    print_health_line(&client).await;

    let submission = match stage_input(&cli) {
        Ok(submission) => submission,
        Err(message) => {
            eprintln!("{} {message}", style("✗").red());
            std::process::exit(2);
        }
    };

    let mut session = AnalysisSession::new(cli.provider);
    println!("{} Analyzing report...", style("…").cyan());
    if let Err(e) = session.submit_with(&client, submission).await {
        eprintln!("{} {e}", style("✗").red());
        std::process::exit(2);
    }

    match session.phase() {
        Phase::Ready => {
            render_summary(session.result().expect("result present when Ready"));
        }
        Phase::Failed => {
            let message = session.error_message().expect("message present when Failed");
            eprintln!("\n{} {message}", style("✗").red());
            std::process::exit(1);
        }
        // submit_with always resolves the submission.
        phase => unreachable!("session left in {phase:?} after submission"),
    }

    if !cli.no_chat {
        follow_up_loop(&mut session, &client).await;
    }
}

/// Build the normalized submission from the CLI arguments.
fn stage_input(cli: &Cli) -> Result<labclear::input::Submission, String> {
    let mut capture = InputCapture::new();

    if let Some(path) = &cli.file {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        capture.switch_mode(InputMode::File);
        capture
            .stage_file(&name, bytes)
            .map_err(|e| e.to_string())?;
        let staged = capture.staged_file().expect("file staged above");
        println!(
            "{} {} ({})",
            style("▸").cyan(),
            staged.name,
            format_file_size(staged.bytes.len() as u64)
        );
    } else if let Some(text) = &cli.text {
        capture.switch_mode(InputMode::Text);
        capture.set_draft_text(text.clone());
    } else {
        return Err("provide a report file or --text".to_string());
    }

    capture.submission().ok_or_else(|| {
        format!("report text must be longer than {MIN_TEXT_CHARS} characters")
    })
}

/// Best-effort service status line. Analysis proceeds either way — the
/// submission itself is the real test.
async fn print_health_line(client: &AnalysisClient) {
    match client.health().await {
        Ok(health) if health.ai_model.available => {
            println!(
                "{} Service {} — {} ({})",
                style("●").green(),
                health.status,
                health.ai_model.model,
                health.ai_model.provider
            );
        }
        Ok(health) => {
            println!(
                "{} Service {} — AI model unavailable",
                style("●").yellow(),
                health.status
            );
        }
        Err(e) => {
            tracing::debug!(error = %e, "health check failed");
            println!("{} Service status unknown", style("●").yellow());
        }
    }
}

fn status_dot(status: FindingStatus) -> console::StyledObject<&'static str> {
    match status {
        FindingStatus::Normal => style("●").green(),
        FindingStatus::Borderline => style("●").yellow(),
        FindingStatus::Abnormal => style("●").red(),
    }
}

fn render_summary(analysis: &ReportSummary) {
    println!("\n{}", style("Your Report Analysis").bold());
    println!("{}\n", analysis.summary);

    let counts = presentation::finding_counts(analysis);
    if counts.total() > 0 {
        let mut stats = Vec::new();
        if counts.normal > 0 {
            stats.push(format!("{} {} normal", style("●").green(), counts.normal));
        }
        if counts.borderline > 0 {
            stats.push(format!(
                "{} {} borderline",
                style("●").yellow(),
                counts.borderline
            ));
        }
        if counts.abnormal > 0 {
            stats.push(format!("{} {} abnormal", style("●").red(), counts.abnormal));
        }
        println!("{}\n", stats.join("   "));

        for finding in &analysis.findings {
            println!(
                "{} {} — {} (ref {})",
                status_dot(finding.status),
                style(&finding.test_name).bold(),
                finding.value,
                finding.reference_range
            );
            if !finding.explanation.is_empty() {
                println!("   {}", finding.explanation);
            }
        }
        println!();
    }

    if !analysis.glossary.is_empty() {
        println!("{}", style("Glossary").bold());
        for entry in &analysis.glossary {
            println!("  {}: {}", style(&entry.term).underlined(), entry.definition);
        }
        println!();
    }

    let questions = presentation::numbered_questions(analysis);
    if !questions.is_empty() {
        println!("{}", style("Questions for your doctor").bold());
        for (number, question) in questions {
            println!("  {number}. {}", question.question);
            if !question.context.is_empty() {
                println!("     {}", style(&question.context).dim());
            }
        }
        println!();
    }

    if !analysis.disclaimer.is_empty() {
        println!("{}", style(&analysis.disclaimer).dim());
    }
}

/// Interactive follow-up Q&A. Empty line or EOF exits.
async fn follow_up_loop(session: &mut AnalysisSession, client: &AnalysisClient) {
    println!("\n{}", style("Ask follow-up questions (empty line to quit)").bold());
    println!("{}", style("Try one of:").dim());
    for suggestion in starter_questions() {
        println!("  {}", style(suggestion).dim());
    }

    let stdin = std::io::stdin();
    loop {
        print!("\n{} ", style("?").cyan());
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to read question");
                break;
            }
        }
        let question = line.trim();
        if question.is_empty() {
            break;
        }

        if let Err(e) = session.ask_with(client, question).await {
            eprintln!("{} {e}", style("✗").red());
            continue;
        }
        if let Some(answer) = session
            .thread()
            .and_then(|t| t.messages().last())
            .map(|m| m.content.clone())
        {
            println!("{}", answer);
        }
    }
}
