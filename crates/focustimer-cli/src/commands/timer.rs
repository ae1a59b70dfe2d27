use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use clap::Args;
use focustimer_core::{
    Config, ConfigurationUpdate, Event, SessionOptions, TimerMode, TimerSession,
    TomlSettingsStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::terminal::{TerminalNotifier, TerminalTitle};

#[derive(Args)]
pub struct RunArgs {
    /// Mode to begin in (focus, short-break, long-break)
    #[arg(long)]
    mode: Option<TimerMode>,
    /// Start counting down immediately
    #[arg(long)]
    start: bool,
    /// Do not touch the terminal window title
    #[arg(long)]
    no_title: bool,
}

/// A line typed while the timer runs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Toggle,
    Reset,
    Skip,
    Switch(TimerMode),
    ResetCount,
    /// Change one timer setting, e.g. `set focus_duration 30`.
    Set { key: String, value: String },
    Help,
    Quit,
}

impl FromStr for Input {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        if words.next() == Some("set") {
            return match (words.next(), words.next(), words.next()) {
                (Some(key), Some(value), None) => Ok(Input::Set {
                    key: key.strip_prefix("timer.").unwrap_or(key).to_string(),
                    value: value.to_string(),
                }),
                _ => Err("usage: set <setting> <value>".to_string()),
            };
        }
        match s.trim() {
            "s" | "start" | "pause" | "" => Ok(Input::Toggle),
            "r" | "reset" => Ok(Input::Reset),
            "k" | "skip" => Ok(Input::Skip),
            "f" | "focus" => Ok(Input::Switch(TimerMode::Focus)),
            "sb" | "short" => Ok(Input::Switch(TimerMode::ShortBreak)),
            "lb" | "long" => Ok(Input::Switch(TimerMode::LongBreak)),
            "n" | "new" => Ok(Input::ResetCount),
            "h" | "help" | "?" => Ok(Input::Help),
            "q" | "quit" | "exit" => Ok(Input::Quit),
            other => Err(format!("unknown command '{other}' (h for help)")),
        }
    }
}

const HELP: &str = "commands: [s]tart/pause  [r]eset  s[k]ip  [f]ocus  [sb] short break  [lb] long break  [n]ew count  set <setting> <value>  [q]uit";

fn render(session: &TimerSession) {
    let state = session.state();
    let status = if state.is_running { "running" } else { "paused" };
    let mut out = std::io::stdout();
    let _ = write!(
        out,
        "\r{}  {:<11}  {:<7}  {:>3.0}%  sessions: {}   ",
        session.clock(),
        state.mode.label(),
        status,
        session.progress() * 100.0,
        state.completed_focus_sessions
    );
    let _ = out.flush();
}

fn apply(session: &TimerSession, input: Input) {
    match input {
        Input::Toggle => {
            session.toggle();
        }
        Input::Reset => {
            session.reset();
        }
        Input::Skip => {
            if session.skip().is_none() {
                println!("\nnothing to skip during focus");
            }
        }
        Input::Switch(mode) => {
            session.switch_mode(mode);
        }
        Input::ResetCount => {
            session.reset_completed_sessions();
        }
        Input::Set { key, value } => match ConfigurationUpdate::new().set_key(&key, value) {
            Ok(update) => {
                let report = session.update_configuration(&update);
                for rejected in &report.rejected {
                    println!("\n{rejected}");
                }
            }
            Err(e) => println!("\n{e}"),
        },
        Input::Help => println!("\n{HELP}"),
        Input::Quit => {}
    }
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = Arc::new(TomlSettingsStore::open_default()?);
    let session = TimerSession::new(
        store,
        Arc::new(TerminalNotifier),
        Arc::new(TerminalTitle::new(!args.no_title)),
        SessionOptions::from_config(&config),
    );

    if let Some(mode) = args.mode {
        session.switch_mode(mode);
    }
    let mut events = session.subscribe();
    if args.start {
        session.start();
    }

    println!("{HELP}");
    render(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.parse::<Input>() {
                    Ok(Input::Quit) => break,
                    Ok(input) => apply(&session, input),
                    Err(e) => println!("\n{e}"),
                }
                render(&session);
            }
            event = events.recv() => {
                match event {
                    Ok(Event::IntervalCompleted { finished, next, .. }) => {
                        println!("\n{} finished. Next up: {}. Press s to start.", finished.label(), next.label());
                        render(&session);
                    }
                    Ok(_) => render(&session),
                    Err(RecvError::Lagged(_)) => render(&session),
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    session.pause();
    println!();
    Ok(())
}
