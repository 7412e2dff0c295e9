use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use mofocup::cup::CupRepository;
use mofocup::{
    CommandHandler, Cup, CupEventSubscriber, CupService, EventDispatcher, HostEvent,
    InMemoryCupRepository,
};

/// A fixed reference instant for tests that control the clock explicitly.
/// Pair it with `with_cup_window` - the default window tracks wall time,
/// because dispatcher-driven events are stamped with `Utc::now()`.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

pub struct TestSetup {
    pub repository: Arc<InMemoryCupRepository>,
    pub service: Arc<CupService>,
    pub dispatcher: EventDispatcher,
    pub commands: CommandHandler,
    pub cup: Cup,
}

pub struct TestSetupBuilder {
    window: (DateTime<Utc>, DateTime<Utc>),
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            window: (now - Duration::days(7), now + Duration::days(23)),
        }
    }

    pub fn with_cup_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.window = (start, end);
        self
    }

    pub async fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryCupRepository::new());
        let cup = repository
            .create_cup("localhost:5154", self.window.0, self.window.1)
            .await
            .expect("test cup should be creatable");

        let service = Arc::new(CupService::builder(repository.clone()).build());

        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_handler(Arc::new(CupEventSubscriber::new(service.clone())));

        let commands = CommandHandler::new(service.clone());

        TestSetup {
            repository,
            service,
            dispatcher,
            commands,
            cup,
        }
    }
}

pub fn join(bz_id: i64, callsign: &str) -> HostEvent {
    HostEvent::PlayerJoined {
        bz_id,
        callsign: callsign.to_string(),
        team: "red".to_string(),
    }
}

pub fn kill(victim_id: i64, killer_id: i64, weapon: &str) -> HostEvent {
    HostEvent::PlayerKilled {
        victim_id,
        killer_id,
        weapon: weapon.to_string(),
        victim_team: "red".to_string(),
        killer_team: "blue".to_string(),
    }
}

pub fn capture(capper_id: i64, capped: u32, capping: u32) -> HostEvent {
    HostEvent::FlagCaptured {
        capper_id,
        capped_team_size: capped,
        capping_team_size: capping,
    }
}
