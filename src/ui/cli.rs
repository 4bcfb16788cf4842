//! Command-line interface implementation

use clap::Parser;
use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::speech::PlaybackState;
use crate::wisdom::WisdomRecord;

/// Command-line arguments for dharma-daily
#[derive(Parser, Debug)]
#[command(author, version, about = "A daily Buddhist teaching, narrated", long_about = None)]
pub struct Args {
    /// Gemini API key
    #[arg(short, long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Config file path
    #[arg(short, long, env = "DHARMA_CONFIG")]
    pub config: Option<String>,

    /// ALSA device to use, or "none" for silence
    #[arg(short = 'd', long, env = "DHARMA_AUDIO_DEVICE")]
    pub audio_device: Option<String>,

    /// Ignore today's cached teaching and ask for a new one
    #[arg(short, long)]
    pub new: bool,

    /// Go straight to the teaching without the breathing ritual
    #[arg(long)]
    pub skip_ritual: bool,

    /// Also write shared text to this file
    #[arg(long)]
    pub share_file: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

/// A key pressed on the teaching or error screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Listen,
    Reflect,
    Share,
    NewPath,
    Retry,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(input: &str) -> Command {
        match input.trim().to_lowercase().as_str() {
            "l" | "listen" => Command::Listen,
            "r" | "reflect" => Command::Reflect,
            "s" | "share" => Command::Share,
            "n" | "new" => Command::NewPath,
            "t" | "try" | "retry" => Command::Retry,
            "q" | "quit" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Renders the teaching as terminal text.
pub fn render_wisdom(record: &WisdomRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("\n{}\n", "HIGHER CONSCIOUSNESS".dark_yellow()));
    out.push_str(&format!("{}\n", record.term.as_str().bold()));
    out.push_str(&format!(
        "{}\n",
        format!("{} \u{2022} {}", record.original_term, record.language).italic().dim()
    ));
    out.push_str(&format!("\"{}\"\n\n", record.translation));
    out.push_str(&format!("{}\n{}\n\n", "AFFIRMATION".green(), record.affirmation.as_str().italic()));
    out.push_str(&format!("{}\n{}\n\n", "THE ESSENCE".dark_yellow(), record.definition));
    out.push_str(&format!("{}\n{}\n\n", "ANCIENT INSIGHT".dark_yellow(), record.wisdom));
    out.push_str(&format!("{}\n{}\n", "PRACTICE".dark_yellow(), record.application));
    out
}

/// The action line under the teaching for the current narration state.
pub fn render_actions(playback: PlaybackState) -> String {
    let listen = match playback {
        PlaybackState::Loading => "Preparing Voice...",
        PlaybackState::Playing => "[l] Rest in Silence",
        PlaybackState::Idle | PlaybackState::Stopped => "[l] Listen to Teacher",
    };
    format!(
        "{}   [r] Offer Reflection   [s] Share Light   [n] Seek another path   [q] Quit",
        listen
    )
}

/// CLI user interface for interacting with the application
pub struct Cli {
    pub args: Args,
}

impl Cli {
    /// Create a new CLI instance
    pub fn new() -> Self {
        Cli { args: Args::parse() }
    }

    pub fn display_welcome(&self, date: &str) {
        println!("\n{}   {}", "DHARMA DAILY".bold(), date.dim());
        println!("\n{}", "Welcome home, seeker.".bold());
        println!(
            "Before we unveil today's wisdom, let us take a moment to settle the mind and open the heart."
        );
    }

    pub fn display_wisdom(&self, record: &WisdomRecord) {
        println!("{}", render_wisdom(record));
    }

    pub fn display_actions(&self, playback: PlaybackState) {
        println!("{}", render_actions(playback).dim());
    }

    pub fn display_reflection_prompt(&self, record: &WisdomRecord) {
        println!("\n{}", "CONTEMPLATIVE SPACE".dark_yellow());
        println!("How does {} resonate with you today?", record.term);
        println!("{}", record.reflection_prompt.as_str().italic());
    }

    pub fn display_echo(&self, echo: &str) {
        println!("\n{}", "DHARMA ECHO".green());
        println!("\u{201c}{}\u{201d}\n", echo.italic());
    }

    pub fn display_share(&self, text: &str) {
        println!("\n{}\n", text);
    }

    pub fn display_notice(&self, message: &str) {
        println!("{}", message.italic());
    }

    pub fn display_load_error(&self) {
        println!("\n{}", "The cloud is passing. Please try again.".italic());
        println!("{}", "[t] Try Again   [q] Quit".dim());
    }

    /// Prints a prompt without a newline and flushes it.
    pub fn prompt(&self, label: &str) -> io::Result<()> {
        print!("{}", label);
        io::stdout().flush()
    }

    /// A spinner that ticks until finished.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        let progress = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.yellow} {msg}") {
            progress.set_style(style.tick_strings(&["\u{273f}", "\u{2740}", "\u{273e}", "\u{2741}", "\u{2736}"]));
        }
        progress.set_message(message.to_string());
        progress.enable_steady_tick(Duration::from_millis(150));
        progress
    }

    /// Display error messages
    pub fn display_error(&self, error: &dyn Error) {
        eprintln!("Error: {}", error);
    }
}
