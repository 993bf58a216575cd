//! End-to-end session behaviour driven with synthetic time

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use voice_hop::loudness::ExternalSource;
use voice_hop::sim::{GameEvent, GamePhase, GameState, ScreenGeometry, TickInput, tick};
use voice_hop::{Session, Tuning};

const TICK: Duration = Duration::from_millis(16);
const READING: Duration = Duration::from_millis(30);

fn session(tuning: Tuning) -> Session {
    let mut session = Session::with_seed(tuning, Box::new(ExternalSource::default()), 2024);
    session.set_screen_size(1000.0, 1000.0);
    session
}

/// Pump a session for `length`, feeding `loudness(elapsed)` every 30 ms
fn play(
    session: &mut Session,
    t0: Instant,
    length: Duration,
    mut loudness: impl FnMut(Duration, &Session) -> f32,
) -> Vec<GameEvent> {
    let sink = session.sink();
    let mut events = Vec::new();
    let mut next_reading = Duration::ZERO;
    let mut elapsed = Duration::ZERO;
    while elapsed <= length {
        if elapsed >= next_reading {
            sink.push(loudness(elapsed, session));
            next_reading += READING;
        }
        events.extend(session.pump(t0 + elapsed));
        elapsed += TICK;
    }
    events
}

#[test]
fn silence_trajectory_is_reproducible() {
    let tuning = Tuning::default();
    let geometry = ScreenGeometry::new(1000.0, 1000.0);
    let metrics = geometry.metrics(&tuning);
    let mut state = GameState::new(1);
    state.reset(1, 0, &metrics);

    let dt = 0.016f32;
    let mut y = metrics.floor_y();
    let mut vy = 0.0f32;
    let mut previous = state.player.y;

    for _ in 0..(5.0 / dt) as usize {
        let input = TickInput {
            loudness: -60.0,
            geometry,
        };
        tick(&mut state, &input, &tuning, dt);

        vy += tuning.gravity * dt;
        y += vy * dt;
        if y < metrics.ceiling_y() {
            y = metrics.ceiling_y();
            vy = 0.0;
        }

        assert_eq!(state.player.y.to_bits(), y.to_bits());
        assert!(state.player.y <= previous);
        previous = state.player.y;
    }
    assert_eq!(state.player.y, metrics.ground_y - metrics.max_jump_height);
}

#[test]
fn full_lifecycle_and_restart() {
    let mut session = session(Tuning::default());
    let t0 = Instant::now();
    session.start_game(t0).unwrap();
    assert_eq!(session.snapshot().phase, GamePhase::Countdown);

    let events = play(&mut session, t0, Duration::from_secs(12), |_, _| -70.0);
    let snap = session.snapshot();
    assert!(snap.is_game_over());
    assert!(events.iter().any(|e| matches!(e, GameEvent::Spawned { id: 0, .. })));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::Collided { .. }))
            .count(),
        1
    );
    assert!(snap.smoothed_loudness < -60.0);

    let t1 = t0 + Duration::from_secs(13);
    session.reset_game(t1).unwrap();
    let snap = session.snapshot();
    assert_eq!(snap.phase, GamePhase::Countdown);
    assert_eq!(snap.countdown, 3);
    assert_eq!(snap.score, 0);
    assert!(snap.obstacles.is_empty());
    assert_eq!(snap.smoothed_loudness, -80.0);
    assert!(!snap.is_game_over());

    // The next run spawns its own id sequence from zero again
    let events = play(&mut session, t1, Duration::from_secs(4), |_, _| -70.0);
    assert!(events.iter().any(|e| matches!(e, GameEvent::Spawned { id: 0, .. })));
}

#[test]
fn loud_voice_is_smoothed_before_it_pushes() {
    let mut session = session(Tuning::default());
    let t0 = Instant::now();
    session.start_game(t0).unwrap();

    // Wait out the countdown in silence, let the player rise
    play(&mut session, t0, Duration::from_millis(3500), |_, _| -80.0);
    let risen = session.snapshot().player_y;
    assert!(risen < 770.0);

    // One loud reading is not enough to cross the threshold
    let sink = session.sink();
    sink.push(30.0);
    session.pump(t0 + Duration::from_millis(3600));
    assert!(session.smoothed_loudness() < -15.0);

    // Sustained shouting is
    let later = t0 + Duration::from_millis(3616);
    play(&mut session, later, Duration::from_millis(600), |_, _| 30.0);
    assert!(session.smoothed_loudness() > -15.0);
    assert!(session.snapshot().player_y > risen);
}

#[test]
fn scoring_is_monotonic_and_once_per_pair() {
    // On 1000x1000 the gap spans 600 units and its top lands in [50, 170],
    // so every gap covers the band a silent player rests in (370..470)
    let tuning = Tuning {
        max_jump_ratio: 0.4,
        gap_ratio: 0.6,
        gap_padding_ratio: 0.05,
        ..Default::default()
    };
    let mut session = session(tuning);
    let t0 = Instant::now();
    session.start_game(t0).unwrap();

    let events = play(&mut session, t0, Duration::from_secs(14), |_, _| -70.0);
    let collided = events
        .iter()
        .any(|e| matches!(e, GameEvent::Collided { .. }));
    assert!(!collided);

    let mut credited = BTreeSet::new();
    let mut last_score = 0;
    for event in &events {
        if let GameEvent::Scored { id, score } = event {
            assert!(credited.insert(*id), "pair {id} credited twice");
            assert_eq!(*score, last_score + 1);
            last_score = *score;
        }
    }
    // Pairs reach the player column every ~1.7 s once the first arrives
    assert!(last_score >= 3, "score {last_score}");
    let expected: BTreeSet<u32> = (0..last_score).collect();
    assert_eq!(credited, expected);

    let snap = session.snapshot();
    assert!(snap.running);
    assert_eq!(snap.score, last_score);
    assert_eq!(session.state().passed, credited);
}
