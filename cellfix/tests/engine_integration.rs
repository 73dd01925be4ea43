//! Integration tests for the position engine.
//!
//! These drive a real engine over a real on-disk dataset with a manual
//! clock:
//! - session admission, idle and fix-lost timers
//! - recompute vs. reuse vs. supersession
//! - online dispatch, stale results and offline fallback
//! - settings changes
//!
//! Run with: `cargo test --test engine_integration`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::broadcast;

use cellfix::cell::{CellTechnology, Coordinates, RadioTechnology, RawCellReport, UniqueCellId};
use cellfix::dataset::{CellLocationSource, ShardWriter, ShardedCellStore};
use cellfix::engine::{EngineConfig, EngineEvent, PositionEngine};
use cellfix::online::{LocateRequest, OnlineDispatch, OnlineError, OnlineFix};
use cellfix::position::PositionFields;
use cellfix::scheduler::TimerKind;
use cellfix::session::{ClientId, SessionError};
use cellfix::settings::SettingsSnapshot;
use cellfix::status::Status;
use cellfix::time::ManualClock;

// ============================================================================
// Helper Functions
// ============================================================================

const T0: u64 = 1_700_000_000_000;
const LAC: u32 = 3100;

fn gsm(cid: u32) -> UniqueCellId {
    UniqueCellId::new(CellTechnology::Gsm, cid, LAC, 244, 5)
}

/// Dataset with two cells under a country directory.
fn dataset() -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut writer = ShardWriter::new();
    writer.insert(gsm(1), Coordinates::new(60.0, 24.0));
    writer.insert(gsm(2), Coordinates::new(61.0, 25.0));
    writer.write_to(&dir.path().join("fi")).unwrap();
    dir
}

/// Both dataset cells, the second three times stronger.
/// Weighted average: (60.75, 24.75).
fn reports() -> Vec<RawCellReport> {
    vec![
        RawCellReport::with_lac_cid(RadioTechnology::Gsm, 244, 5, LAC as i32, 1, 1),
        RawCellReport::with_lac_cid(RadioTechnology::Gsm, 244, 5, LAC as i32, 2, 3),
        // not in dataset
        RawCellReport::with_lac_cid(RadioTechnology::Gsm, 244, 5, LAC as i32, 77, 9),
    ]
}

fn offline_settings() -> SettingsSnapshot {
    SettingsSnapshot {
        enabled: true,
        mls_enabled: true,
        ..Default::default()
    }
}

fn engine(dir: &TempDir, clock: &ManualClock, settings: SettingsSnapshot) -> PositionEngine {
    let source: Arc<dyn CellLocationSource> =
        Arc::new(ShardedCellStore::new(vec![dir.path().to_path_buf()]));
    PositionEngine::new(EngineConfig::default(), source, Arc::new(clock.clone()))
        .with_settings(settings)
}

fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn status_changes(events: &[EngineEvent]) -> Vec<Status> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::StatusChanged(s) => Some(*s),
            _ => None,
        })
        .collect()
}

fn position_count(events: &[EngineEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, EngineEvent::PositionChanged(_)))
        .count()
}

/// Records dispatched online queries instead of sending them.
#[derive(Clone, Default)]
struct RecordingDispatch {
    sent: Arc<Mutex<Vec<(u64, LocateRequest)>>>,
}

impl RecordingDispatch {
    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl OnlineDispatch for RecordingDispatch {
    fn dispatch(&self, generation: u64, request: LocateRequest) {
        self.sent.lock().unwrap().push((generation, request));
    }
}

fn online_engine(dir: &TempDir, clock: &ManualClock) -> (PositionEngine, RecordingDispatch) {
    let mut engine = engine(dir, clock, SettingsSnapshot::all_enabled());
    let dispatch = RecordingDispatch::default();
    engine.set_dispatcher(Box::new(dispatch.clone()));
    (engine, dispatch)
}

// ============================================================================
// Offline positioning
// ============================================================================

#[test]
fn test_first_fix_after_cells_arrive() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    let mut rx = engine.subscribe();

    engine.add_reference(&ClientId::from("client"));
    assert!(engine.is_started());
    // No cells yet: nothing published.
    assert!(drain(&mut rx).is_empty());
    assert_eq!(engine.status(), Status::Unavailable);

    engine.cells_changed(reports());
    clock.advance(Duration::from_secs(10));
    assert_eq!(engine.fire_expired(), vec![TimerKind::Recompute]);

    let events = drain(&mut rx);
    assert_eq!(status_changes(&events), vec![Status::Available]);
    assert_eq!(position_count(&events), 1);

    let position = engine.position();
    assert!((position.latitude - 60.75).abs() < 1e-9);
    assert!((position.longitude - 24.75).abs() < 1e-9);
    assert_eq!(position.accuracy.horizontal, 8000.0);
    assert_eq!(position.timestamp, (T0 + 10_000) / 1000);
    assert_eq!(
        position.fields,
        PositionFields::LATITUDE | PositionFields::LONGITUDE
    );
}

#[test]
fn test_young_fix_is_reused_without_lookups() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));
    let first = *engine.current_fix();
    assert_eq!(first.timestamp_ms, T0);
    let lookups = engine.cache_stats().lookups();

    let mut rx = engine.subscribe();
    clock.advance(Duration::from_secs(10));
    engine.fire_expired();

    assert_eq!(engine.current_fix().timestamp_ms, T0);
    assert_eq!(engine.cache_stats().lookups(), lookups);
    // Republished, but status did not change.
    let events = drain(&mut rx);
    assert_eq!(position_count(&events), 1);
    assert!(status_changes(&events).is_empty());
}

#[test]
fn test_old_fix_is_recomputed_from_cache() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));
    let probes = engine.cache_stats().probes;
    assert_eq!(probes, 3);

    // 10s ticks: reuse at 10, 20, 30; recompute at 40 (age > 30s).
    for _ in 0..4 {
        clock.advance(Duration::from_secs(10));
        engine.fire_expired();
    }
    assert_eq!(engine.current_fix().timestamp_ms, T0 + 40_000);
    assert_eq!(engine.last_fix().timestamp_ms, T0);
    let stats = engine.cache_stats();
    assert_eq!(stats.probes, 3);
    assert_eq!(stats.positive_hits, 2);
    assert_eq!(stats.negative_hits, 1);
}

#[test]
fn test_fix_lost_drops_to_acquiring() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    let client = ClientId::from("client");
    engine.cells_changed(reports());
    engine.add_reference(&client);
    engine.set_update_interval(&client, 60_000).unwrap();
    assert_eq!(engine.recompute_interval_ms(), Some(60_000));
    assert_eq!(engine.status(), Status::Available);

    let mut rx = engine.subscribe();
    clock.advance(Duration::from_secs(30));
    assert_eq!(engine.fire_expired(), vec![TimerKind::FixLost]);
    assert_eq!(engine.status(), Status::Acquiring);
    assert_eq!(status_changes(&drain(&mut rx)), vec![Status::Acquiring]);

    clock.advance(Duration::from_secs(30));
    assert_eq!(engine.fire_expired(), vec![TimerKind::Recompute]);
    assert_eq!(engine.status(), Status::Available);
    assert_eq!(engine.current_fix().timestamp_ms, T0 + 60_000);
}

#[test]
fn test_late_wakeup_recompute_rearms_fix_lost() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));
    assert_eq!(engine.status(), Status::Available);

    // Both the recompute (T0+10s) and fix-lost (T0+30s) deadlines have passed.
    let mut rx = engine.subscribe();
    clock.advance(Duration::from_secs(50));
    assert_eq!(engine.fire_expired(), vec![TimerKind::Recompute]);

    assert_eq!(engine.current_fix().timestamp_ms, T0 + 50_000);
    assert_eq!(engine.status(), Status::Available);
    assert_eq!(engine.next_deadline(), Some(T0 + 60_000));
    let events = drain(&mut rx);
    assert!(status_changes(&events).is_empty());
    assert_eq!(position_count(&events), 1);

    clock.advance(Duration::from_secs(30));
    engine.fire_expired();
    assert_eq!(engine.status(), Status::Available);
}

#[test]
fn test_cell_data_not_allowed_gives_no_fix() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let settings = SettingsSnapshot {
        cell_data_allowed: false,
        ..offline_settings()
    };
    let mut engine = engine(&dir, &clock, settings);
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));

    assert!(engine.is_started());
    assert!(!engine.current_fix().is_valid());
    assert_eq!(engine.cache_stats().lookups(), 0);
}

// ============================================================================
// Sessions and idle
// ============================================================================

#[test]
fn test_idle_timeout_without_clients() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    let mut rx = engine.subscribe();

    clock.advance(Duration::from_millis(29_999));
    assert!(engine.fire_expired().is_empty());
    clock.advance(Duration::from_millis(1));
    assert_eq!(engine.fire_expired(), vec![TimerKind::Idle]);
    assert!(engine.idle_expired());
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], EngineEvent::IdleTimeout));
}

#[test]
fn test_add_add_remove_remove_arms_idle_once() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    let x = ClientId::from(":1.7");

    engine.add_reference(&x);
    engine.add_reference(&x);
    assert!(!engine.is_timer_armed(TimerKind::Idle));

    clock.advance(Duration::from_secs(5));
    engine.remove_reference(&x);
    assert!(!engine.is_timer_armed(TimerKind::Idle));
    assert!(engine.is_started());

    engine.remove_reference(&x);
    assert_eq!(engine.session_count(), 0);
    assert!(engine.is_timer_armed(TimerKind::Idle));
    assert!(!engine.is_started());
    assert!(!engine.is_timer_armed(TimerKind::Recompute));
    assert_eq!(engine.next_deadline(), Some(T0 + 35_000));

    // Redundant removal is a no-op and leaves the deadline alone.
    clock.advance(Duration::from_secs(10));
    engine.remove_reference(&x);
    assert_eq!(engine.next_deadline(), Some(T0 + 35_000));
}

#[test]
fn test_set_interval_without_session_is_rejected() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    let ghost = ClientId::from("ghost");

    assert_eq!(
        engine.set_update_interval(&ghost, 5_000),
        Err(SessionError::NoActiveSession(ghost))
    );
    assert_eq!(engine.session_count(), 0);
    assert!(engine.is_timer_armed(TimerKind::Idle));
}

#[test]
fn test_vanished_client_stops_positioning() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    let a = ClientId::from("a");
    engine.cells_changed(reports());
    engine.add_reference(&a);
    engine.add_reference(&a);
    assert_eq!(engine.status(), Status::Available);

    engine.client_vanished(&a);
    assert!(!engine.is_started());
    assert_eq!(engine.status(), Status::Unavailable);
    assert!(engine.is_timer_armed(TimerKind::Idle));
}

#[test]
fn test_effective_interval_follows_clients() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    let a = ClientId::from("a");
    let b = ClientId::from("b");
    engine.add_reference(&a);
    engine.add_reference(&b);

    engine.set_update_interval(&a, 45_000).unwrap();
    engine.set_update_interval(&b, 20_000).unwrap();
    assert_eq!(engine.recompute_interval_ms(), Some(20_000));

    engine.set_update_interval(&a, 2_000).unwrap();
    assert_eq!(engine.recompute_interval_ms(), Some(10_000));

    engine.remove_reference(&a);
    assert_eq!(engine.recompute_interval_ms(), Some(20_000));
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_disabling_publishes_no_fix_and_stops() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));
    assert_eq!(engine.status(), Status::Available);

    let mut rx = engine.subscribe();
    engine.apply_settings(SettingsSnapshot::default());

    let events = drain(&mut rx);
    match events.first() {
        Some(EngineEvent::PositionChanged(report)) => {
            assert_eq!(report.fields, PositionFields::NONE);
            assert_eq!(report.timestamp, 0);
        }
        other => panic!("expected empty position first, got {:?}", other),
    }
    assert_eq!(status_changes(&events), vec![Status::Unavailable]);
    assert!(!engine.is_started());
    assert!(!engine.is_timer_armed(TimerKind::Recompute));
    assert!(!engine.is_timer_armed(TimerKind::FixLost));

    // Recompute ticks do nothing while disabled.
    clock.advance(Duration::from_secs(60));
    engine.fire_expired();
    assert!(!engine.current_fix().is_valid());
}

#[test]
fn test_identical_settings_are_ignored() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let mut engine = engine(&dir, &clock, offline_settings());
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));

    let mut rx = engine.subscribe();
    engine.apply_settings(offline_settings());
    assert!(drain(&mut rx).is_empty());
}

// ============================================================================
// Online positioning
// ============================================================================

#[test]
fn test_online_fix_is_published() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let (mut engine, dispatch) = online_engine(&dir, &clock);
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));

    assert_eq!(dispatch.count(), 1);
    assert!(!engine.current_fix().is_valid());
    {
        let sent = dispatch.sent.lock().unwrap();
        assert_eq!(sent[0].0, 1);
        assert_eq!(sent[0].1.query.cells.len(), 3);
    }

    clock.advance(Duration::from_secs(2));
    engine.online_result(
        1,
        Ok(OnlineFix {
            latitude: 60.5,
            longitude: 24.5,
            accuracy: 300.0,
        }),
    );
    let fix = engine.current_fix();
    assert_eq!(fix.timestamp_ms, T0 + 2_000);
    assert_eq!(fix.accuracy.horizontal, 300.0);
    assert_eq!(engine.status(), Status::Available);
}

#[test]
fn test_recompute_while_in_flight_dispatches_nothing() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let (mut engine, dispatch) = online_engine(&dir, &clock);
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));

    engine.cells_changed(reports());
    clock.advance(Duration::from_secs(10));
    engine.fire_expired();
    assert_eq!(dispatch.count(), 1);
    assert!(!engine.current_fix().is_valid());
}

#[test]
fn test_cells_changed_while_in_flight_are_queried_next() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let (mut engine, dispatch) = online_engine(&dir, &clock);
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));
    assert_eq!(dispatch.count(), 1);

    // Moved next to cell 2 only; the tick finds generation 1 still out.
    engine.cells_changed(vec![RawCellReport::with_lac_cid(
        RadioTechnology::Gsm,
        244,
        5,
        LAC as i32,
        2,
        4,
    )]);
    clock.advance(Duration::from_secs(10));
    engine.fire_expired();
    assert_eq!(dispatch.count(), 1);

    engine.online_result(
        1,
        Ok(OnlineFix {
            latitude: 60.5,
            longitude: 24.5,
            accuracy: 300.0,
        }),
    );
    assert_eq!(engine.current_fix().timestamp_ms, T0 + 10_000);

    // The fix is young, but the changed cells have not been sent yet.
    clock.advance(Duration::from_secs(10));
    engine.fire_expired();
    assert_eq!(dispatch.count(), 2);
    let sent = dispatch.sent.lock().unwrap();
    let (generation, request) = &sent[1];
    assert_eq!(*generation, 2);
    let cells: Vec<UniqueCellId> = request.query.cells.iter().map(|c| c.cell).collect();
    assert_eq!(cells, vec![gsm(2)]);
}

#[test]
fn test_stale_online_result_is_discarded() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let (mut engine, dispatch) = online_engine(&dir, &clock);
    let client = ClientId::from("client");
    engine.cells_changed(reports());
    engine.add_reference(&client);
    assert_eq!(dispatch.count(), 1);

    // Stop and restart: generation 1 is now stale.
    engine.remove_reference(&client);
    engine.add_reference(&client);
    assert_eq!(dispatch.count(), 2);

    let mut rx = engine.subscribe();
    engine.online_result(
        1,
        Ok(OnlineFix {
            latitude: 1.0,
            longitude: 1.0,
            accuracy: 1.0,
        }),
    );
    assert!(drain(&mut rx).is_empty());
    assert!(!engine.current_fix().is_valid());
}

#[test]
fn test_online_error_falls_back_to_triangulation() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let (mut engine, _dispatch) = online_engine(&dir, &clock);
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));

    engine.online_result(1, Err(OnlineError::Timeout(Duration::from_secs(15))));
    let fix = engine.current_fix();
    assert!((fix.latitude - 60.75).abs() < 1e-9);
    assert_eq!(fix.accuracy.horizontal, 8000.0);
}

#[test]
fn test_accurate_fix_supersedes_worse_candidate() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let (mut engine, dispatch) = online_engine(&dir, &clock);
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));
    engine.online_result(
        1,
        Ok(OnlineFix {
            latitude: 60.5,
            longitude: 24.5,
            accuracy: 2500.0,
        }),
    );

    // New cells force a recompute; online fails; offline gives 8000m.
    engine.cells_changed(reports());
    clock.advance(Duration::from_secs(10));
    engine.fire_expired();
    assert_eq!(dispatch.count(), 2);
    engine.online_result(2, Err(OnlineError::NotFound));

    let fix = engine.current_fix();
    assert_eq!(fix.timestamp_ms, T0);
    assert_eq!(fix.accuracy.horizontal, 2500.0);
}

#[test]
fn test_old_accurate_fix_does_not_supersede() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let (mut engine, _dispatch) = online_engine(&dir, &clock);
    let client = ClientId::from("client");
    engine.cells_changed(reports());
    engine.add_reference(&client);
    engine.set_update_interval(&client, 130_000).unwrap();
    engine.online_result(
        1,
        Ok(OnlineFix {
            latitude: 60.5,
            longitude: 24.5,
            accuracy: 2500.0,
        }),
    );

    clock.advance(Duration::from_secs(130));
    engine.fire_expired();
    engine.online_result(2, Err(OnlineError::NotFound));

    let fix = engine.current_fix();
    assert_eq!(fix.timestamp_ms, T0 + 130_000);
    assert_eq!(fix.accuracy.horizontal, 8000.0);
}

#[test]
fn test_online_disallowed_stays_offline() {
    let dir = dataset();
    let clock = ManualClock::new(T0);
    let settings = SettingsSnapshot {
        online_allowed: false,
        ..SettingsSnapshot::all_enabled()
    };
    let mut engine = engine(&dir, &clock, settings);
    let dispatch = RecordingDispatch::default();
    engine.set_dispatcher(Box::new(dispatch.clone()));
    engine.cells_changed(reports());
    engine.add_reference(&ClientId::from("client"));

    assert_eq!(dispatch.count(), 0);
    assert!(engine.current_fix().is_valid());
}
