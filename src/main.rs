use brainbridge::app::App;
use brainbridge::config::Config;
use brainbridge::messages::{CaptureState, MicTestState, StatusPhase};
use brainbridge::transcript::{HistoryEntry, TranscriptSegment};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting brainbridge voice transcription console");

    // Load configuration
    let config = Config::load()?;
    config.validate()?;

    // Create LocalSet for !Send futures (needed for the recorder and mic
    // test, which hold cpal::Stream)
    let local = tokio::task::LocalSet::new();

    local.run_until(async move { run_app(config).await }).await
}

async fn run_app(config: Config) -> Result<()> {
    let mut app = App::new(config)?;

    println!("Commands: r = record toggle, m = mic test toggle, p = play last,");
    println!("          h = history, c = clear history, q = quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "r" => {
                        app.toggle_recording().await;
                        print_status(&app);
                    }
                    "m" => {
                        app.toggle_mic_test();
                        print_mic_status(&app);
                    }
                    "p" => app.play_last_recording().await,
                    "h" => print_history(&app),
                    "c" => {
                        app.clear_history();
                        println!("History cleared");
                    }
                    "q" => break,
                    "" => {}
                    other => println!("Unknown command: {}", other),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    app.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_status(app: &App) {
    let recording = *app.capture_state().borrow() == CaptureState::Recording;
    println!(
        "[{}]",
        if recording { "recording" } else { "idle" }
    );

    let status = app.status().borrow().clone();
    if !status.message.is_empty() {
        println!("{}", status.message);
    }

    if status.phase == StatusPhase::Success {
        println!("Current transcript:");
        for segment in app.store().current() {
            print_segment(&segment);
        }
    }
}

fn print_mic_status(app: &App) {
    match &*app.mic_test_state().borrow() {
        MicTestState::Off => println!("Mic test stopped"),
        MicTestState::Testing => println!("Microphone is working!"),
        MicTestState::Error(reason) => println!("Error accessing microphone: {}", reason),
    }
}

fn print_history(app: &App) {
    let entries = app.store().history_newest_first();
    if entries.is_empty() {
        println!("No recordings yet");
        return;
    }

    for entry in entries {
        print_entry(&entry);
    }
}

fn print_entry(entry: &HistoryEntry) {
    println!("Recording {} ({})", entry.session_index, entry.timestamp);
    if entry.segments.is_empty() {
        println!("  (no transcript)");
    }
    for segment in &entry.segments {
        print_segment(segment);
    }
}

fn print_segment(segment: &TranscriptSegment) {
    println!(
        "  {} ({:.2}s - {:.2}s): {}",
        segment.speaker, segment.start, segment.end, segment.text
    );
}
