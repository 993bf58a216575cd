//! Voice Hop headless runner
//!
//! Plays one session without a display, driven by a scripted "voice" or,
//! with the `microphone` feature, by the real microphone. Progress goes to
//! the log; set `RUST_LOG=info` (or `debug`) to see it.

#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;

#[cfg(not(target_arch = "wasm32"))]
use voice_hop::loudness::{LoudnessSource, ScriptedSource};
#[cfg(not(target_arch = "wasm32"))]
use voice_hop::{Runner, Session, Tuning};

#[cfg(not(target_arch = "wasm32"))]
#[derive(Parser, Debug)]
#[command(version, about = "Steer through the gaps with your voice")]
struct Args {
    /// Screen width in screen units
    #[arg(long, default_value_t = 1000.0)]
    width: f32,

    /// Screen height in screen units
    #[arg(long, default_value_t = 1000.0)]
    height: f32,

    /// Obstacle seed (defaults to the built-in seed)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON tuning file
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Use the default microphone instead of the scripted voice
    #[cfg(feature = "microphone")]
    #[arg(long)]
    mic: bool,

    /// Input device name for --mic (defaults to the host default)
    #[cfg(feature = "microphone")]
    #[arg(long, requires = "mic")]
    device: Option<String>,

    /// Print the available input devices and exit
    #[cfg(feature = "microphone")]
    #[arg(long)]
    list_devices: bool,
}

#[cfg(feature = "microphone")]
fn print_devices() -> i32 {
    match voice_hop::loudness::MicrophoneSource::list_devices() {
        Ok(names) if names.is_empty() => {
            println!("No input devices found");
            0
        }
        Ok(names) => {
            for name in names {
                println!("{}", name);
            }
            0
        }
        Err(e) => {
            log::error!("{}", e);
            1
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn loudness_source(args: &Args) -> Box<dyn LoudnessSource> {
    #[cfg(feature = "microphone")]
    if args.mic {
        return Box::new(voice_hop::loudness::MicrophoneSource::new(
            args.device.clone(),
        ));
    }
    let _ = args;
    // Short shouts every 1.2 s over room noise
    Box::new(ScriptedSource::bursts(
        10.0,
        -55.0,
        Duration::from_millis(350),
        Duration::from_millis(1200),
    ))
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    let args = Args::parse();
    #[cfg(feature = "microphone")]
    if args.list_devices {
        std::process::exit(print_devices());
    }

    log::info!("Voice Hop (headless) starting...");

    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path),
        None => Tuning::default(),
    };

    let session = Session::new(tuning, loudness_source(&args));
    let runner = match Runner::spawn(session) {
        Ok(runner) => runner,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let started = runner
        .set_screen_size(args.width, args.height)
        .and_then(|_| match args.seed {
            Some(seed) => runner.start_game_seeded(seed),
            None => runner.start_game(),
        });
    if let Err(e) = started {
        log::error!("{}", e);
        std::process::exit(1);
    }

    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    let mut last_countdown = u32::MAX;
    let mut last_report = Instant::now();
    loop {
        std::thread::sleep(Duration::from_millis(50));
        let snap = runner.snapshot();

        if snap.countdown != last_countdown && snap.countdown > 0 {
            println!("{}...", snap.countdown);
            last_countdown = snap.countdown;
        }
        if last_report.elapsed() >= Duration::from_millis(500) {
            log::info!(
                "y={:.1} loudness={:.1} dB obstacles={} score={}",
                snap.player_y,
                snap.smoothed_loudness,
                snap.obstacles.len(),
                snap.score
            );
            last_report = Instant::now();
        }
        if snap.is_game_over() {
            println!("Game over! Score: {}", snap.score);
            break;
        }
        if Instant::now() >= deadline {
            println!("Time's up! Score: {}", snap.score);
            break;
        }
    }

    runner.shutdown();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Headless runner needs threads; nothing to do on the web
}
