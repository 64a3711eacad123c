use std::env;
use std::io::{self, BufRead, Write};

use docqa_cli::{init_logging, load_settings};
use docqa_core::settings::Settings;
use docqa_orchestrator::{Orchestrator, QueryOutcome};

fn print_outcome(outcome: &QueryOutcome) {
    println!("\n{}\n", outcome.answer);
    let stages: Vec<String> = outcome
        .timings
        .iter()
        .map(|t| format!("{} {}ms{}", t.stage.as_str(), t.elapsed.as_millis(), if t.succeeded { "" } else { " (failed)" }))
        .collect();
    println!("[retrieval: {}, results used: {}, {}]", if outcome.retrieval_attempted { "yes" } else { "no" }, outcome.results_used, stages.join(", "));
}

async fn interactive(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    println!("Document QA. Type 'exit', 'quit' or 'q' to leave.");
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("\nYou: ");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 { break; }
        let query = line.trim();
        if matches!(query.to_lowercase().as_str(), "exit" | "quit" | "q") { break; }
        if query.is_empty() { continue; }
        let outcome = orchestrator.process_query(query).await;
        print_outcome(&outcome);
    }
    println!("Goodbye!");
    Ok(())
}

async fn run(settings: Settings, args: Vec<String>) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::from_settings(&settings)?;
    if let Err(e) = orchestrator.check_tool_service().await {
        eprintln!("Cannot reach the tool server at {}: {}", settings.tool_server_url(), e);
        eprintln!("Start it with: cargo run --bin docqa-tool-server");
        std::process::exit(1);
    }
    if args.is_empty() {
        interactive(&orchestrator).await
    } else {
        let outcome = orchestrator.process_query(&args.join(" ")).await;
        print_outcome(&outcome);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    init_logging(&settings.logging);
    let args: Vec<String> = env::args().skip(1).collect();
    tokio::runtime::Runtime::new()?.block_on(run(settings, args))
}
