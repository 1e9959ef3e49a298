//! Random artist discovery runtime component.
//!
//! The orchestrator pairs a randomly drawn artist name with a detail record
//! that carries a portrait, fetches albums and top tracks, renders the result,
//! and appends it to the history log. The manager listens on the bus and runs
//! each triggered discovery on its own thread.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::broadcast::{error::RecvError, Receiver, Sender};
use uuid::Uuid;

use crate::catalog::ArtistCatalog;
use crate::config::DiscoveryConfig;
use crate::device::DeviceCapabilities;
use crate::display::DisplaySurface;
use crate::history::HistoryStore;
use crate::protocol::{
    ArtistDetail, DiscoveredArtist, DiscoveryMessage, DiscoveryOutcome, Message,
};
use crate::render;

fn panic_payload_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "non-string panic payload".to_string()
}

/// Runs discovery against injected catalog, display, history, and device
/// handles. Cheap to clone; clones share every handle.
#[derive(Clone)]
pub struct DiscoveryOrchestrator {
    catalog: Arc<dyn ArtistCatalog>,
    display: Arc<dyn DisplaySurface>,
    history: Arc<Mutex<HistoryStore>>,
    device: DeviceCapabilities,
    max_attempts: u32,
    haptic_pulse: Duration,
}

impl DiscoveryOrchestrator {
    pub fn new(
        catalog: Arc<dyn ArtistCatalog>,
        display: Arc<dyn DisplaySurface>,
        history: Arc<Mutex<HistoryStore>>,
        device: DeviceCapabilities,
        config: &DiscoveryConfig,
    ) -> Self {
        Self {
            catalog,
            display,
            history,
            device,
            max_attempts: config.max_attempts.max(1),
            haptic_pulse: Duration::from_millis(config.haptic_pulse_ms),
        }
    }

    /// Executes one complete run. Never panics and never returns an error:
    /// failures end in [`DiscoveryOutcome::Failed`] with the error message
    /// shown in place of the loading indicator.
    pub fn run_discovery(&self, run_id: &str) -> DiscoveryOutcome {
        info!("Discovery[{}]: started", run_id);
        let result = catch_unwind(AssertUnwindSafe(|| self.try_run_discovery(run_id)));
        let failure = match result {
            Ok(Ok(outcome)) => return outcome,
            Ok(Err(message)) => message,
            Err(payload) => format!("panic: {}", panic_payload_to_string(payload.as_ref())),
        };

        error!("Discovery[{}]: failed: {}", run_id, failure);
        if let Err(display_error) = self.display.show_artist_info(&render::render_error()) {
            error!(
                "Discovery[{}]: could not show error state: {}",
                run_id, display_error
            );
        }
        DiscoveryOutcome::Failed(failure)
    }

    fn try_run_discovery(&self, run_id: &str) -> Result<DiscoveryOutcome, String> {
        self.display.show_artist_info(&render::render_loading())?;

        let Some(detail) = self.find_artist_with_portrait(run_id) else {
            info!(
                "Discovery[{}]: no artist with portrait after {} attempts",
                run_id, self.max_attempts
            );
            self.display.show_artist_info(&render::render_not_found())?;
            return Ok(DiscoveryOutcome::NotFound {
                attempts: self.max_attempts,
            });
        };
        info!("Discovery[{}]: found {} ({})", run_id, detail.name, detail.id);

        let albums = self.catalog.list_albums(&detail.id);
        let top_tracks = self.catalog.list_top_tracks(&detail.name);
        debug!(
            "Discovery[{}]: {} albums, {} top tracks",
            run_id,
            albums.len(),
            top_tracks.len()
        );
        let artist = DiscoveredArtist {
            detail,
            albums,
            top_tracks,
        };

        self.display
            .show_artist_info(&render::render_artist(&artist))?;

        if !self.device.pulse(self.haptic_pulse) {
            debug!("Discovery[{}]: no haptic device, skipping pulse", run_id);
        }

        let portrait = artist.detail.usable_portrait().unwrap_or_default();
        self.history
            .lock()
            .map_err(|_| "history lock poisoned".to_string())?
            .append(&artist.detail.name, portrait)?;

        Ok(DiscoveryOutcome::Found(artist))
    }

    /// Draw-then-lookup loop. Stops at the first detail record with a portrait.
    fn find_artist_with_portrait(&self, run_id: &str) -> Option<ArtistDetail> {
        for attempt in 1..=self.max_attempts {
            debug!(
                "Discovery[{}]: attempt {}/{}",
                run_id, attempt, self.max_attempts
            );
            let Some(summary) = self.catalog.draw_random_artist_name() else {
                continue;
            };
            match self.catalog.lookup_artist_detail(&summary.name) {
                Some(detail) if detail.usable_portrait().is_some() => return Some(detail),
                Some(_) => debug!(
                    "Discovery[{}]: {:?} has no portrait, drawing again",
                    run_id, summary.name
                ),
                None => debug!(
                    "Discovery[{}]: {:?} not in detail catalog, drawing again",
                    run_id, summary.name
                ),
            }
        }
        None
    }
}

/// Bus-driven host for the orchestrator.
pub struct DiscoveryManager {
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
    orchestrator: DiscoveryOrchestrator,
    in_flight: Vec<JoinHandle<()>>,
    dropped_bus_messages: u64,
}

impl DiscoveryManager {
    pub fn new(
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
        orchestrator: DiscoveryOrchestrator,
    ) -> Self {
        Self {
            bus_consumer,
            bus_producer,
            orchestrator,
            in_flight: Vec::new(),
            dropped_bus_messages: 0,
        }
    }

    /// Starts a run on its own thread. Overlapping runs are not cancelled.
    fn spawn_run(&mut self) {
        self.in_flight.retain(|handle| !handle.is_finished());

        let run_id = Uuid::new_v4().to_string();
        let orchestrator = self.orchestrator.clone();
        let bus_producer = self.bus_producer.clone();
        let spawned = thread::Builder::new()
            .name(format!("discovery-{}", &run_id[..8]))
            .spawn(move || {
                let outcome = orchestrator.run_discovery(&run_id);
                let _ = bus_producer.send(Message::Discovery(DiscoveryMessage::Finished {
                    run_id,
                    outcome,
                }));
            });
        match spawned {
            Ok(handle) => self.in_flight.push(handle),
            Err(err) => warn!("Failed to spawn discovery run: {}", err),
        }
    }

    fn join_in_flight(&mut self) {
        for handle in self.in_flight.drain(..) {
            if handle.join().is_err() {
                warn!("Discovery run thread panicked");
            }
        }
    }

    fn handle_bus_message(&mut self, message: Message) -> bool {
        match message {
            Message::Discovery(DiscoveryMessage::Start) => {
                self.spawn_run();
                true
            }
            Message::Discovery(DiscoveryMessage::Finished { run_id, outcome }) => {
                match outcome {
                    DiscoveryOutcome::Found(artist) => {
                        info!("Discovery[{}]: showing {}", run_id, artist.detail.name)
                    }
                    DiscoveryOutcome::NotFound { attempts } => {
                        info!("Discovery[{}]: not found after {} attempts", run_id, attempts)
                    }
                    DiscoveryOutcome::Failed(reason) => {
                        warn!("Discovery[{}]: ended with error: {}", run_id, reason)
                    }
                }
                true
            }
            Message::Shutdown => false,
        }
    }

    /// Skipped messages may include discovery triggers, which are lost.
    fn record_lag(&mut self, skipped: u64) {
        self.dropped_bus_messages += skipped;
        warn!(
            "Discovery manager lagged: {} bus messages dropped ({} total), \
             discovery triggers among them will not run",
            skipped, self.dropped_bus_messages
        );
    }

    /// Starts the blocking event loop. Returns after shutdown once in-flight
    /// runs have finished.
    pub fn run(&mut self) {
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(message) => {
                    if !self.handle_bus_message(message) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => self.record_lag(skipped),
                Err(RecvError::Closed) => break,
            }
        }
        self.join_in_flight();
        debug!("Discovery manager stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;
    use std::time::Duration;

    use tokio::sync::broadcast;

    use super::{DiscoveryManager, DiscoveryOrchestrator};
    use crate::catalog::ArtistCatalog;
    use crate::config::DiscoveryConfig;
    use crate::device::{testing::RecordingHaptics, DeviceCapabilities};
    use crate::display::testing::RecordingSurface;
    use crate::history::HistoryStore;
    use crate::protocol::{
        Album, ArtistDetail, ArtistSummary, DiscoveryMessage, DiscoveryOutcome, Message, Track,
    };
    use crate::render;
    use crate::storage::LocalStorage;

    /// Catalog whose detail records gain a portrait from a given draw onward.
    #[derive(Default)]
    struct ScriptedCatalog {
        portrait_from_draw: Option<usize>,
        empty_draws: usize,
        draws: AtomicUsize,
        album_calls: AtomicUsize,
        track_calls: AtomicUsize,
        album_gate: Option<Arc<Barrier>>,
        panic_on_albums: bool,
        missing_detail_draws: usize,
        no_media: bool,
    }

    impl ArtistCatalog for ScriptedCatalog {
        fn draw_random_artist_name(&self) -> Option<ArtistSummary> {
            let draw = self.draws.fetch_add(1, Ordering::SeqCst) + 1;
            if draw <= self.empty_draws {
                return None;
            }
            Some(ArtistSummary {
                name: format!("Artist {draw}"),
            })
        }

        fn lookup_artist_detail(&self, name: &str) -> Option<ArtistDetail> {
            let draw = self.draws.load(Ordering::SeqCst);
            if draw <= self.missing_detail_draws {
                return None;
            }
            let has_portrait = self
                .portrait_from_draw
                .is_some_and(|threshold| draw >= threshold);
            Some(ArtistDetail {
                id: format!("id-{draw}"),
                name: name.to_string(),
                portrait_url: has_portrait.then(|| format!("https://img.example/{draw}.jpg")),
            })
        }

        fn list_albums(&self, _artist_id: &str) -> Vec<Album> {
            self.album_calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_on_albums {
                panic!("album endpoint exploded");
            }
            if let Some(gate) = &self.album_gate {
                gate.wait();
            }
            if self.no_media {
                return Vec::new();
            }
            vec![Album {
                title: "Debut".to_string(),
            }]
        }

        fn list_top_tracks(&self, _artist_name: &str) -> Vec<Track> {
            self.track_calls.fetch_add(1, Ordering::SeqCst);
            if self.no_media {
                return Vec::new();
            }
            vec![Track {
                title: "Hit".to_string(),
                video_url: Some("https://www.youtube.com/watch?v=abc123".to_string()),
            }]
        }
    }

    struct Fixture {
        catalog: Arc<ScriptedCatalog>,
        surface: Arc<RecordingSurface>,
        history: Arc<Mutex<HistoryStore>>,
        haptics: Arc<RecordingHaptics>,
        orchestrator: DiscoveryOrchestrator,
    }

    fn fixture(catalog: ScriptedCatalog) -> Fixture {
        let catalog = Arc::new(catalog);
        let surface = Arc::new(RecordingSurface::default());
        let storage = LocalStorage::open_in_memory().expect("storage should open");
        let history = Arc::new(Mutex::new(HistoryStore::new(storage, surface.clone())));
        let haptics = Arc::new(RecordingHaptics::default());
        let orchestrator = DiscoveryOrchestrator::new(
            catalog.clone(),
            surface.clone(),
            history.clone(),
            DeviceCapabilities {
                haptics: Some(haptics.clone()),
            },
            &DiscoveryConfig::default(),
        );
        Fixture {
            catalog,
            surface,
            history,
            haptics,
            orchestrator,
        }
    }

    fn history_len(fixture: &Fixture) -> usize {
        fixture.history.lock().expect("lock").load().len()
    }

    #[test]
    fn test_no_portrait_exhausts_ten_draws_and_reports_not_found() {
        let fixture = fixture(ScriptedCatalog::default());

        let outcome = fixture.orchestrator.run_discovery("test");

        assert_eq!(outcome, DiscoveryOutcome::NotFound { attempts: 10 });
        assert_eq!(fixture.catalog.draws.load(Ordering::SeqCst), 10);
        assert_eq!(fixture.catalog.album_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            fixture.surface.artist_writes(),
            vec![render::render_loading(), render::render_not_found()]
        );
        assert_eq!(history_len(&fixture), 0);
        assert!(fixture.haptics.pulses.lock().expect("lock").is_empty());
    }

    #[test]
    fn test_portrait_on_third_attempt_stops_drawing_and_fetches_media() {
        let fixture = fixture(ScriptedCatalog {
            portrait_from_draw: Some(3),
            ..ScriptedCatalog::default()
        });

        let outcome = fixture.orchestrator.run_discovery("test");

        let DiscoveryOutcome::Found(artist) = outcome else {
            panic!("expected a found artist, got {outcome:?}");
        };
        assert_eq!(artist.detail.name, "Artist 3");
        assert_eq!(fixture.catalog.draws.load(Ordering::SeqCst), 3);
        assert_eq!(fixture.catalog.album_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.catalog.track_calls.load(Ordering::SeqCst), 1);

        let writes = fixture.surface.artist_writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[1].contains("<h2>Artist 3</h2>"));
        assert!(writes[1].contains("embed/abc123"));

        let entries = fixture.history.lock().expect("lock").load();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Artist 3");
        assert_eq!(entries[0].img, "https://img.example/3.jpg");
        assert_eq!(
            *fixture.haptics.pulses.lock().expect("lock"),
            vec![Duration::from_millis(50)]
        );
    }

    #[test]
    fn test_empty_draws_count_as_attempts() {
        let fixture = fixture(ScriptedCatalog {
            portrait_from_draw: Some(1),
            empty_draws: 10,
            ..ScriptedCatalog::default()
        });

        let outcome = fixture.orchestrator.run_discovery("test");

        assert_eq!(outcome, DiscoveryOutcome::NotFound { attempts: 10 });
        assert_eq!(fixture.catalog.draws.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_names_missing_from_detail_catalog_are_redrawn() {
        let fixture = fixture(ScriptedCatalog {
            portrait_from_draw: Some(1),
            missing_detail_draws: 4,
            ..ScriptedCatalog::default()
        });

        let outcome = fixture.orchestrator.run_discovery("test");

        let DiscoveryOutcome::Found(artist) = outcome else {
            panic!("expected a found artist, got {outcome:?}");
        };
        assert_eq!(artist.detail.name, "Artist 5");
        assert_eq!(fixture.catalog.draws.load(Ordering::SeqCst), 5);
        assert_eq!(history_len(&fixture), 1);
    }

    #[test]
    fn test_detail_catalog_never_matching_reports_not_found() {
        let fixture = fixture(ScriptedCatalog {
            portrait_from_draw: Some(1),
            missing_detail_draws: usize::MAX,
            ..ScriptedCatalog::default()
        });

        let outcome = fixture.orchestrator.run_discovery("test");

        assert_eq!(outcome, DiscoveryOutcome::NotFound { attempts: 10 });
        assert_eq!(fixture.catalog.album_calls.load(Ordering::SeqCst), 0);
        assert_eq!(history_len(&fixture), 0);
    }

    #[test]
    fn test_artist_without_albums_or_tracks_still_renders_and_saves() {
        let fixture = fixture(ScriptedCatalog {
            portrait_from_draw: Some(1),
            no_media: true,
            ..ScriptedCatalog::default()
        });

        let outcome = fixture.orchestrator.run_discovery("test");

        assert!(matches!(outcome, DiscoveryOutcome::Found(_)));
        let writes = fixture.surface.artist_writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[1].contains("<strong>Best album:</strong> N/A"));
        assert!(!writes[1].contains("<iframe"));
        assert_eq!(history_len(&fixture), 1);
    }

    #[test]
    fn test_unexpected_failure_shows_error_without_partial_state() {
        let fixture = fixture(ScriptedCatalog {
            portrait_from_draw: Some(1),
            panic_on_albums: true,
            ..ScriptedCatalog::default()
        });

        let outcome = fixture.orchestrator.run_discovery("test");

        assert!(matches!(
            outcome,
            DiscoveryOutcome::Failed(ref reason) if reason.contains("album endpoint exploded")
        ));
        assert_eq!(
            fixture.surface.artist_writes(),
            vec![render::render_loading(), render::render_error()]
        );
        assert_eq!(history_len(&fixture), 0);

        // The control stays usable after a failure.
        let retry = super::DiscoveryOrchestrator {
            catalog: Arc::new(ScriptedCatalog {
                portrait_from_draw: Some(1),
                ..ScriptedCatalog::default()
            }),
            ..fixture.orchestrator.clone()
        };
        assert!(matches!(
            retry.run_discovery("retry"),
            DiscoveryOutcome::Found(_)
        ));
        assert_eq!(history_len(&fixture), 1);
    }

    #[test]
    fn test_overlapping_runs_each_append_one_entry() {
        let fixture = fixture(ScriptedCatalog {
            portrait_from_draw: Some(1),
            album_gate: Some(Arc::new(Barrier::new(2))),
            ..ScriptedCatalog::default()
        });

        let runs: Vec<_> = (0..2)
            .map(|index| {
                let orchestrator = fixture.orchestrator.clone();
                thread::spawn(move || orchestrator.run_discovery(&format!("run-{index}")))
            })
            .collect();
        for run in runs {
            let outcome = run.join().expect("run thread should not panic");
            assert!(matches!(outcome, DiscoveryOutcome::Found(_)));
        }

        let entries = fixture.history.lock().expect("lock").load();
        assert_eq!(entries.len(), 2);
        for entry in &entries {
            assert!(entry.name.starts_with("Artist "));
            assert!(entry.img.starts_with("https://img.example/"));
            assert!(!entry.date.is_empty());
        }
        assert_ne!(entries[0].name, entries[1].name);
    }

    #[test]
    fn test_manager_runs_discovery_for_start_message_and_stops_on_shutdown() {
        let fixture = fixture(ScriptedCatalog {
            portrait_from_draw: Some(1),
            ..ScriptedCatalog::default()
        });
        let (bus_sender, _) = broadcast::channel(64);
        let mut observer = bus_sender.subscribe();
        let mut manager = DiscoveryManager::new(
            bus_sender.subscribe(),
            bus_sender.clone(),
            fixture.orchestrator.clone(),
        );
        let manager_thread = thread::spawn(move || manager.run());

        bus_sender
            .send(Message::Discovery(DiscoveryMessage::Start))
            .expect("manager should be subscribed");

        let finished = loop {
            match observer.blocking_recv().expect("bus should stay open") {
                Message::Discovery(DiscoveryMessage::Finished { outcome, .. }) => break outcome,
                _ => continue,
            }
        };
        assert!(matches!(finished, DiscoveryOutcome::Found(_)));

        bus_sender
            .send(Message::Shutdown)
            .expect("manager should be subscribed");
        manager_thread.join().expect("manager should stop cleanly");
        assert_eq!(history_len(&fixture), 1);
    }

    #[test]
    fn test_manager_survives_lag_and_runs_surviving_trigger() {
        let fixture = fixture(ScriptedCatalog {
            portrait_from_draw: Some(1),
            ..ScriptedCatalog::default()
        });
        let (bus_sender, _) = broadcast::channel(2);
        let mut manager = DiscoveryManager::new(
            bus_sender.subscribe(),
            bus_sender.clone(),
            fixture.orchestrator.clone(),
        );

        for _ in 0..4 {
            bus_sender
                .send(Message::Discovery(DiscoveryMessage::Start))
                .expect("manager should be subscribed");
        }
        bus_sender
            .send(Message::Shutdown)
            .expect("manager should be subscribed");

        manager.run();

        assert_eq!(manager.dropped_bus_messages, 3);
        assert_eq!(history_len(&fixture), 1);
    }
}
