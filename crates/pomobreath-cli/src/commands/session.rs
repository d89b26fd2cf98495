//! Foreground runner shared by `focus run` and `breathe run`.
//!
//! Events are printed to stdout as JSON lines. Ctrl-C pauses the timer and
//! saves it so the next `--resume` continues where it stopped.

use pomobreath_core::{
    Config, Database, Event, EventDispatcher, PhasePlan, PhaseSequencer, TimerController,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::terminal::{TerminalFeedback, TerminalNotifier};

pub struct RunOptions {
    /// kv key the interrupted sequencer is saved under.
    pub state_key: &'static str,
    pub label: Option<String>,
    pub feedback: bool,
    pub resume: bool,
}

pub fn load_saved(db: &Database, key: &str) -> Option<PhaseSequencer> {
    let json = db.kv_get(key).ok().flatten()?;
    match serde_json::from_str(&json) {
        Ok(seq) => Some(seq),
        Err(e) => {
            tracing::warn!(error = %e, key, "discarding unreadable saved timer");
            None
        }
    }
}

fn save(db: &Database, key: &str, seq: &PhaseSequencer) -> Result<(), Box<dyn std::error::Error>> {
    db.kv_set(key, &serde_json::to_string(seq)?)?;
    Ok(())
}

fn clock(ms: u64) -> String {
    let secs = ms.div_ceil(1000);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn announce(event: &Event) {
    match event {
        Event::TimerStarted {
            phase,
            remaining_ms,
            cycle,
            ..
        } => eprintln!("{} ({}) round {}", phase.title(), clock(*remaining_ms), cycle + 1),
        Event::PhaseAdvanced {
            phase,
            duration_secs,
            cycle,
            running: true,
            ..
        } => eprintln!(
            "{} ({}) round {}",
            phase.title(),
            clock(duration_secs * 1000),
            cycle + 1
        ),
        Event::PhaseAdvanced {
            phase,
            running: false,
            ..
        } => eprintln!("{} is ready. Press Enter to start.", phase.title()),
        Event::PlanCompleted { cycles, .. } => eprintln!("Done after {cycles} round(s)."),
        _ => {}
    }
}

pub async fn run(
    plan: PhasePlan,
    config: &Config,
    opts: RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let state_db = Database::open()?;
    let recorder = Database::open()?.with_keep_count(config.history.keep_count);
    let dispatcher = EventDispatcher::new(recorder, TerminalNotifier::default())
        .with_feedback(TerminalFeedback)
        .with_feedback_enabled(opts.feedback)
        .with_notifications_enabled(config.notifications.enabled);
    let tick = config.driver.tick_interval();

    let controller = if opts.resume {
        let saved = load_saved(&state_db, opts.state_key)
            .ok_or("no interrupted session to resume")?;
        TimerController::with_sequencer(saved, dispatcher, tick)
    } else {
        TimerController::new(plan, dispatcher, tick)
    };
    if opts.label.is_some() {
        controller.set_label(opts.label).await;
    }

    let mut events = controller.subscribe().await;
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut awaiting_start = false;
    controller.start().await;

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    announce(&event);
                    match event {
                        Event::PlanCompleted { .. } => {
                            state_db.kv_delete(opts.state_key)?;
                            break;
                        }
                        Event::PhaseAdvanced { running: false, .. } => awaiting_start = true,
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            line = stdin.next_line(), if awaiting_start => {
                if line?.is_none() {
                    save(&state_db, opts.state_key, &controller.sequencer().await)?;
                    eprintln!("stdin closed; saved. Resume with --resume.");
                    break;
                }
                awaiting_start = false;
                controller.start().await;
            }
            _ = tokio::signal::ctrl_c() => {
                for event in controller.pause().await {
                    println!("{}", serde_json::to_string(&event)?);
                }
                save(&state_db, opts.state_key, &controller.sequencer().await)?;
                eprintln!("\nPaused and saved. Resume with --resume.");
                break;
            }
        }
    }
    Ok(())
}
