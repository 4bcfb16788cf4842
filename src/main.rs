use dharma_daily::app::DharmaSession;
use dharma_daily::audio::AudioContext;
use dharma_daily::config::Settings;
use dharma_daily::gemini::GenerativeContentService;
use dharma_daily::init_app_dirs;
use dharma_daily::speech::{ListenOutcome, MemoStatus, PlaybackState, AUDIO_FAILURE_NOTICE};
use dharma_daily::ui::{guide_breathing, Cli, Command};
use dharma_daily::wisdom::{today, WisdomCache};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_TARGET: &str = "dharma_daily::main";

type Input = Lines<BufReader<Stdin>>;

/// How the user left the teaching screen.
enum ScreenExit {
    NewPath,
    Quit,
}

fn init_tracing(json: bool) -> Result<(), Box<dyn Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dharma_daily=warn"));
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()?;
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).try_init()?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::new();
    let args = &cli.args;

    init_tracing(args.log_json)?;
    init_app_dirs()?;

    let config_path = match &args.config {
        Some(path) => Path::new(path).to_path_buf(),
        None => Settings::default_path(),
    };
    let mut settings = Settings::load(&config_path)?;

    // clap already folds the environment into the arguments.
    settings.api_key = args.api_key.clone().or(settings.api_key);
    if let Some(device) = &args.audio_device {
        settings.audio_device = device.clone();
    }
    settings.validate()?;

    let service: Arc<dyn GenerativeContentService> = Arc::new(settings.gemini_client()?);
    let context = Arc::new(AudioContext::for_device(&settings.audio_device));
    let mut session = DharmaSession::new(service, WisdomCache::new(settings.cache_file()), context);
    info!(target: LOG_TARGET, device = %settings.audio_device, "Session ready.");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let result = run(&cli, &mut session, &mut input).await;

    if let Err(e) = session.shutdown().await {
        warn!(target: LOG_TARGET, "Error closing audio: {}", e);
    }
    println!("\nPeace. Clarity. Metta.");
    result
}

async fn run(cli: &Cli, session: &mut DharmaSession, input: &mut Input) -> Result<(), Box<dyn Error>> {
    let mut pending_load = Some(cli.args.new);
    let mut seeking = false;

    loop {
        cli.display_welcome(&today());

        if let Some(force_new) = pending_load.take() {
            if !load_with_retry(cli, session, input, force_new, seeking).await? {
                return Ok(());
            }
        }

        if !cli.args.skip_ritual {
            cli.prompt("\nPress Enter to ring the bell... ")?;
            if input.next_line().await?.is_none() {
                return Ok(());
            }
            session.start_ritual();
            let progress = cli.spinner("");
            guide_breathing(&progress).await;
            progress.finish_and_clear();
        }
        session.finish_breathing();

        match wisdom_screen(cli, session, input).await? {
            ScreenExit::Quit => return Ok(()),
            ScreenExit::NewPath => {
                pending_load = Some(true);
                seeking = true;
            }
        }
    }
}

/// Loads the teaching, offering a retry after each failure.
///
/// Returns `false` when the user chose to quit instead.
async fn load_with_retry(
    cli: &Cli,
    session: &mut DharmaSession,
    input: &mut Input,
    force_new: bool,
    seeking: bool,
) -> Result<bool, Box<dyn Error>> {
    let mut force_new = force_new;
    let mut seeking = seeking;
    loop {
        let spinner = cli.spinner("Meditating...");
        let loaded = if seeking {
            session.seek_another_path().await
        } else {
            session.load_wisdom(force_new).await
        };
        spinner.finish_and_clear();

        let err = match loaded {
            Ok(_) => return Ok(true),
            Err(e) => e,
        };
        error!(target: LOG_TARGET, "Failed to load wisdom: {}", err);
        cli.display_load_error();

        loop {
            cli.prompt("> ")?;
            match input.next_line().await? {
                None => return Ok(false),
                Some(line) => match Command::parse(&line) {
                    Command::Retry => break,
                    Command::Quit => return Ok(false),
                    _ => cli.display_notice("Press t to try again or q to quit."),
                },
            }
        }
        force_new = true;
        seeking = false;
    }
}

async fn wisdom_screen(cli: &Cli, session: &mut DharmaSession, input: &mut Input) -> Result<ScreenExit, Box<dyn Error>> {
    let record = match session.wisdom() {
        Some(record) => record,
        None => return Ok(ScreenExit::Quit),
    };
    cli.display_wisdom(&record);

    loop {
        cli.display_actions(session.playback_state());
        cli.prompt("> ")?;
        let line = match input.next_line().await? {
            Some(line) => line,
            None => return Ok(ScreenExit::Quit),
        };

        match Command::parse(&line) {
            Command::Listen => listen(cli, session).await,
            Command::Reflect => {
                cli.display_reflection_prompt(&record);
                cli.prompt("Write your heart's reflection here: ")?;
                let reflection = match input.next_line().await? {
                    Some(reflection) => reflection,
                    None => return Ok(ScreenExit::Quit),
                };
                let spinner = cli.spinner("Gleaning Insight...");
                let echo = session.reflect(&reflection).await;
                spinner.finish_and_clear();
                match echo {
                    Some(echo) => cli.display_echo(&echo),
                    None => cli.display_notice("Offer a few words to reflect upon."),
                }
            }
            Command::Share => share(cli, session),
            Command::NewPath => return Ok(ScreenExit::NewPath),
            Command::Quit => return Ok(ScreenExit::Quit),
            Command::Retry | Command::Unknown(_) => {}
        }
    }
}

async fn listen(cli: &Cli, session: &DharmaSession) {
    let preparing = session.playback_state() != PlaybackState::Playing && session.prefetch().status() != MemoStatus::Ready;
    let spinner = preparing.then(|| cli.spinner("Preparing Voice..."));
    let outcome = session.listen().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match outcome {
        Ok(ListenOutcome::Started) => cli.display_notice("The teacher speaks. Press l to rest in silence."),
        Ok(ListenOutcome::Stopped) => cli.display_notice("Resting in silence."),
        Ok(ListenOutcome::Busy) => cli.display_notice("Preparing Voice..."),
        Ok(ListenOutcome::Superseded) | Ok(ListenOutcome::Cancelled) => {}
        Err(e) => {
            warn!(target: LOG_TARGET, "Audio playback failed: {}", e);
            cli.display_notice(AUDIO_FAILURE_NOTICE);
        }
    }
}

fn share(cli: &Cli, session: &DharmaSession) {
    let text = match session.share_text() {
        Some(text) => text,
        None => return,
    };
    cli.display_share(&text);
    if let Some(path) = &cli.args.share_file {
        match std::fs::write(path, &text) {
            Ok(()) => cli.display_notice("Copied to heart."),
            Err(e) => cli.display_error(&e),
        }
    }
}
