use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use simon::GameController;
use simon::presenter::{SilentTonePlayer, TonePlayer};
use simon::remote_api::{RemoteCmd, RemoteServer, drain_remote_commands, handle_remote_command};
use simon::rng::SequenceRng;
use simon::settings::SettingsStore;
use simon::sfx::RodioTonePlayer;
use simon::terminal::{
    InputClosed, TerminalCommand, TerminalPresenter, help_text, on_input_closed, parse_command,
};

/// How long to sleep when nothing is scheduled. Input wakes the loop anyway.
const IDLE_WAIT: Duration = Duration::from_secs(3_600);

#[derive(Debug, Parser)]
#[command(name = "simon", about = "Watch the sequence, then repeat it.")]
struct Cli {
    /// Seed for the color sequence (defaults to settings, then the clock).
    #[arg(long)]
    seed: Option<u64>,
    /// Serve the JSON control API on 127.0.0.1:PORT.
    #[arg(long, value_name = "PORT")]
    remote_port: Option<u16>,
    /// Play without sound.
    #[arg(long)]
    mute: bool,
}

enum Wake {
    Line(io::Result<Option<String>>),
    Remote(RemoteCmd),
    Tick,
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

async fn next_remote(remote: &mut Option<RemoteServer>) -> Option<RemoteCmd> {
    match remote {
        Some(server) => server.rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Next stdin line, or never once stdin has been closed.
async fn next_line(lines: &mut Lines<BufReader<Stdin>>, open: bool) -> io::Result<Option<String>> {
    if open {
        lines.next_line().await
    } else {
        std::future::pending().await
    }
}

fn tone_player(mute: bool, gain: f32) -> Box<dyn TonePlayer> {
    if mute || gain <= 0.0 {
        info!("sound disabled");
        return Box::new(SilentTonePlayer);
    }
    match RodioTonePlayer::new(gain) {
        Ok(player) => Box::new(player),
        Err(err) => {
            warn!(%err, "audio unavailable, continuing without sound");
            Box::new(SilentTonePlayer)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let store = SettingsStore::from_env();
    let settings = store.load();
    info!(path = %store.path().display(), "settings loaded");

    let seed = cli.seed.or(settings.seed).unwrap_or_else(clock_seed);
    info!(seed, "sequence seed");

    let tones = tone_player(
        cli.mute || settings.audio.mute_all,
        settings.audio.effective_tone_gain(),
    );
    let presenter = TerminalPresenter::new(io::stdout());
    let mut game = GameController::new(presenter, tones, SequenceRng::new(seed));

    let mut remote = match cli.remote_port {
        Some(port) => Some(
            RemoteServer::start(port)
                .await
                .with_context(|| format!("binding remote api on port {port}"))?,
        ),
        None => None,
    };

    print!("{}", help_text());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last = Instant::now();

    loop {
        let wait = game.time_until_next().unwrap_or(IDLE_WAIT);
        let wake = tokio::select! {
            line = next_line(&mut lines, stdin_open) => Wake::Line(line),
            Some(cmd) = next_remote(&mut remote) => Wake::Remote(cmd),
            _ = tokio::time::sleep(wait) => Wake::Tick,
        };

        // Catch the game clock up before applying whatever woke us.
        let now = Instant::now();
        game.advance(now - last);
        last = now;

        match wake {
            Wake::Tick => {}
            Wake::Remote(cmd) => {
                handle_remote_command(&mut game, cmd);
                drain_remote_commands(remote.as_mut(), &mut game);
            }
            Wake::Line(line) => {
                let Some(line) = line.context("reading stdin")? else {
                    match on_input_closed(remote.is_some()) {
                        InputClosed::Exit => break,
                        InputClosed::KeepServing => {
                            info!("stdin closed, serving remote commands only");
                            stdin_open = false;
                            continue;
                        }
                    }
                };
                match parse_command(&line) {
                    Some(TerminalCommand::Start) => game.on_start_requested(),
                    Some(TerminalCommand::Press(color)) => game.on_color_pressed(color),
                    Some(TerminalCommand::Help) => print!("{}", help_text()),
                    Some(TerminalCommand::Quit) => break,
                    None => {}
                }
            }
        }
    }

    if let Some(server) = remote.as_mut() {
        server.shutdown();
    }
    info!(score = game.score(), "bye");
    Ok(())
}
