//! AudioText - voice recording playback with scrub and equalizer control
//!
//! Wires the library, input, and audio crates together: decodes the
//! recording given on the command line, runs the playback engine on a
//! dedicated audio thread, and drives it from a raw-mode key loop.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use parking_lot::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use atx_audio::{AudioCommand, AudioEngine, AudioEvent, EngineState, EqualizerSettings, PlayerState};
use atx_input::{Command, InputHandler, Mode};
use atx_library::{Config, Recording, RecordingLoader, RecordingStore};

/// UI refresh / input poll interval (~30 fps)
const FRAME_MS: u64 = 33;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            print_library()?;
            return Ok(());
        }
    };

    let mut config = Config::load();
    let path = resolve_path(path, &config);

    let store_path = store_path();
    let mut store = RecordingStore::open(&store_path)
        .with_context(|| format!("opening library at {}", store_path.display()))?;

    let loader = RecordingLoader::default();
    let loaded = loader
        .load(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    // Recordings are keyed by their canonical path so rename keeps the
    // same equalizer snapshot.
    let recording_id = path.to_string_lossy().to_string();
    let recording = match store.get(&recording_id) {
        Some(existing) => existing,
        None => {
            let recording = Recording::new(
                recording_id.clone(),
                loaded.title.clone(),
                path.clone(),
                loaded.duration_secs,
            );
            store.insert(&recording)?;
            recording
        }
    };

    let saved_eq = store
        .load_equalizer(&recording_id)?
        .unwrap_or_else(EqualizerSettings::flat);

    config.last_recording = Some(recording_id.clone());
    let _ = config.save(); // Best effort

    // Audio channels and thread
    let (cmd_tx, cmd_rx, evt_tx, evt_rx) = AudioEngine::create_channels();
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_audio = shutdown.clone();

    let audio_handle = thread::spawn(move || {
        run_audio_thread(cmd_rx, evt_tx, shutdown_audio);
    });

    let engine = AudioEngine::new(cmd_tx, evt_rx);
    engine.send(AudioCommand::Load(
        Arc::new(loaded.samples),
        loaded.sample_rate,
        Some(recording.title.clone()),
        loaded.overview.into_arc(),
    ));
    engine.send(AudioCommand::SetEqualizer(saved_eq.clone()));

    enable_raw_mode()?;
    let result = run_app(engine, &mut store, recording, saved_eq, shutdown.clone());
    disable_raw_mode()?;
    println!();

    shutdown.store(true, Ordering::SeqCst);
    let _ = audio_handle.join();

    result
}

/// Print the library contents and exit (no recording argument given)
fn print_library() -> anyhow::Result<()> {
    let store = RecordingStore::open(&store_path())?;
    let recordings = store.list()?;

    if recordings.is_empty() {
        println!("Library is empty. Usage: atx <recording-file>");
        return Ok(());
    }

    println!("{} recording(s):", recordings.len());
    for rec in recordings {
        let eq = match store.load_equalizer(&rec.id)? {
            Some(settings) => settings.summary().label(),
            None => "Flat",
        };
        println!(
            "  {:<30} {:>8}  EQ: {}",
            rec.title,
            format_time(rec.duration_secs),
            eq
        );
    }
    Ok(())
}

/// Resolve a bare filename against the configured recordings folder
fn resolve_path(path: PathBuf, config: &Config) -> PathBuf {
    if path.exists() {
        return path;
    }
    if let Some(ref dir) = config.recordings_dir {
        let candidate = dir.join(&path);
        if candidate.exists() {
            return candidate;
        }
    }
    path
}

fn store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("atx")
        .join("library.db")
}

fn run_audio_thread(
    cmd_rx: Receiver<AudioCommand>,
    evt_tx: Sender<AudioEvent>,
    shutdown: Arc<AtomicBool>,
) {
    let host = cpal::default_host();
    let device = match host.default_output_device() {
        Some(d) => d,
        None => {
            let _ = evt_tx.send(AudioEvent::Error("No audio output device found".into()));
            return;
        }
    };

    let config = match device.default_output_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = evt_tx.send(AudioEvent::Error(format!("Failed to get audio config: {e}")));
            return;
        }
    };

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    info!(sample_rate, channels, "audio output opened");

    let engine_state = Arc::new(Mutex::new(EngineState::new(sample_rate)));
    let engine_for_callback = engine_state.clone();

    // Pre-allocated stereo buffer for mono output conversion (no
    // allocation in the audio callback)
    let mut stereo_buffer = vec![0.0f32; 16384];

    let mut last_publish = Instant::now();
    let publish_interval = Duration::from_millis(FRAME_MS);

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            // try_lock keeps the realtime thread from blocking; on
            // contention output silence for one buffer.
            if let Some(mut state) = engine_for_callback.try_lock() {
                if channels == 2 {
                    state.process(data);
                } else {
                    let frames = data.len() / channels;
                    let stereo = &mut stereo_buffer[..frames * 2];
                    state.process(stereo);
                    for (i, frame) in data.chunks_mut(channels).enumerate() {
                        let mixed = (stereo[i * 2] + stereo[i * 2 + 1]) * 0.5;
                        for sample in frame.iter_mut() {
                            *sample = mixed;
                        }
                    }
                }
            } else {
                data.fill(0.0);
            }
        },
        |err| {
            warn!("audio stream error: {err}");
        },
        None,
    );

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            let _ = evt_tx.send(AudioEvent::Error(format!("Failed to create stream: {e}")));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = evt_tx.send(AudioEvent::Error(format!("Failed to start audio: {e}")));
        return;
    }

    // Command processing loop
    while !shutdown.load(Ordering::Relaxed) {
        match cmd_rx.recv_timeout(Duration::from_millis(10)) {
            Ok(AudioCommand::Shutdown) => break,
            Ok(cmd) => {
                let event = engine_state.lock().handle_command(cmd);
                if let Some(event) = event {
                    let _ = evt_tx.try_send(event);
                }
            }
            Err(_) => {}
        }

        if last_publish.elapsed() >= publish_interval {
            let snapshot = engine_state.lock().snapshot();
            let _ = evt_tx.try_send(AudioEvent::State(Box::new(snapshot)));
            last_publish = Instant::now();
        }
    }
}

fn run_app(
    engine: AudioEngine,
    store: &mut RecordingStore,
    mut recording: Recording,
    mut saved_eq: EqualizerSettings,
    shutdown: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let mut input = InputHandler::new();
    let mut player_state: Option<Box<PlayerState>> = None;
    let mut working_eq = saved_eq.clone();
    let mut message = String::from("space: play/pause  s: scrub  t: flick  e: eq  r: rename  q: quit");
    let mut detent_flash = 0u8;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            engine.send(AudioCommand::Shutdown);
            break;
        }

        // Drain engine events
        while let Some(event) = engine.poll_event() {
            match event {
                AudioEvent::State(state) => player_state = Some(state),
                AudioEvent::DetentCrossed => detent_flash = 4,
                AudioEvent::EqualizerChanged(settings) => working_eq = settings,
                AudioEvent::Error(e) => message = e,
            }
        }

        render_status(
            &recording,
            player_state.as_deref(),
            &working_eq,
            &saved_eq,
            &input,
            detent_flash > 0,
            &message,
        )?;
        detent_flash = detent_flash.saturating_sub(1);

        if !event::poll(Duration::from_millis(FRAME_MS))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        // Ctrl-C always quits, regardless of mode
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            engine.send(AudioCommand::Shutdown);
            break;
        }

        let Some(command) = input.handle_key(key) else {
            continue;
        };

        match command {
            Command::Quit => {
                engine.send(AudioCommand::Shutdown);
                break;
            }
            Command::Cancel => {}

            Command::Rename(title) => {
                store.rename(&recording.id, &title)?;
                recording.title = title;
                message = "Renamed".to_string();
            }
            Command::SaveEqualizer => {
                store.save_equalizer(&recording.id, &working_eq)?;
                saved_eq = working_eq.clone();
                message = "Equalizer saved".to_string();
            }

            // Relative commands resolved against the latest snapshot
            Command::ScrubFlick { delta, velocity } => {
                let position = player_state
                    .as_ref()
                    .map(|s| s.position_normalized)
                    .unwrap_or(0.0);
                engine.send(AudioCommand::ScrubFlick {
                    position: (position + delta).clamp(0.0, 1.0),
                    velocity,
                });
            }
            Command::AdjustRate(delta) => {
                let rate = player_state.as_ref().map(|s| s.rate).unwrap_or(1.0);
                engine.send(AudioCommand::SetRate(rate + delta));
            }

            // Everything else maps straight onto an audio command
            Command::TogglePlayback => engine.send(AudioCommand::Toggle),
            Command::Stop => engine.send(AudioCommand::Stop),
            Command::Nudge(delta) => engine.send(AudioCommand::Nudge(delta)),
            Command::BeginScrub(mode) => engine.send(AudioCommand::BeginScrub(mode)),
            Command::ScrubAngle(angle) => engine.send(AudioCommand::ScrubAngle(angle)),
            Command::EndScrub => engine.send(AudioCommand::EndScrub),
            Command::AdjustBand(band, delta) => {
                engine.send(AudioCommand::AdjustBandGain(band, delta))
            }
            Command::SetBandGain(band, gain) => {
                engine.send(AudioCommand::SetBandGain(band, gain))
            }
            Command::ApplyPreset(id) => engine.send(AudioCommand::ApplyPreset(id)),
            Command::ResetEqualizer => engine.send(AudioCommand::ResetEqualizer),
        }
    }

    Ok(())
}

/// Redraw the single status line
fn render_status(
    recording: &Recording,
    state: Option<&PlayerState>,
    working_eq: &EqualizerSettings,
    saved_eq: &EqualizerSettings,
    input: &InputHandler,
    detent: bool,
    message: &str,
) -> io::Result<()> {
    let (position, duration, rate) = match state {
        Some(s) => (s.position_secs, s.duration_secs, s.rate),
        None => (0.0, recording.duration_secs, 1.0),
    };

    let dirty = if working_eq.is_dirty(saved_eq) { "*" } else { "" };
    let tick = if detent { "|" } else { " " };

    let line = match input.mode() {
        Mode::Rename => format!("[RENAME] {}_", input.rename_buffer()),
        Mode::Equalizer => format!(
            "[EQ] {} {} {:+.1} dB  {}{}  {}",
            input.selected_band().display_frequency(),
            input.selected_band().key(),
            working_eq.gain(input.selected_band()),
            working_eq.summary().label(),
            dirty,
            message,
        ),
        mode => format!(
            "[{}]{} {}  {} / {}  x{:.2}  EQ: {}{}  {}",
            mode.display_name(),
            tick,
            recording.title,
            format_time(position),
            format_time(duration),
            rate,
            working_eq.summary().label(),
            dirty,
            message,
        ),
    };

    let mut stdout = io::stdout();
    write!(stdout, "\r\x1b[2K{line}")?;
    stdout.flush()
}

/// mm:ss display for a duration in seconds
fn format_time(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
