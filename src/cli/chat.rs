use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};
use tokio::sync::mpsc;

use super::auth::{credential_store, stdin_prompt};
use crate::ai::planner::{PlannerBuilder, TranscriptEvent};
use crate::core::AppConfig;
use crate::google::GoogleEndpoints;
use crate::google::gcal::GoogleCalendar;
use crate::openai::OpenAiCompletion;

fn render(event: &TranscriptEvent) {
    match event {
        TranscriptEvent::AssistantStart => {}
        TranscriptEvent::AssistantDelta(delta) => {
            print!("{}", delta);
            let _ = io::stdout().flush();
        }
        TranscriptEvent::AssistantEnd => println!("\n"),
        TranscriptEvent::System(msg) => println!("{}\n", msg),
    }
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let completion = OpenAiCompletion::new(
        &config.openai_api_hostname,
        &config.openai_api_key,
        &config.openai_model,
        config.openai_temperature,
    )?;
    let calendar = GoogleCalendar::new(
        credential_store(config),
        GoogleEndpoints::from(config),
        stdin_prompt(),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut planner = PlannerBuilder::new(Box::new(completion), Box::new(calendar), tx)
        .config(config)
        .build();
    let mut rl = DefaultEditor::new()?;

    planner.greet();
    while let Ok(event) = rx.try_recv() {
        render(&event);
    }

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());

                // Render the transcript while the turn is still running
                // so the reply shows up as it streams in
                let turn = planner.handle_input(&line);
                tokio::pin!(turn);
                loop {
                    tokio::select! {
                        biased;
                        Some(event) = rx.recv() => render(&event),
                        result = &mut turn => {
                            result?;
                            break;
                        }
                    }
                }
                while let Ok(event) = rx.try_recv() {
                    render(&event);
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
