use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{config::DataSourceConfig, error::Result, utils::round_to_two_decimals};

/// Occupancy and pricing snapshot for a single room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Percentage in [0, 100]
    pub occupancy_rate: f64,
    pub average_night_rate: f64,
    pub highest_night_rate: f64,
    pub lowest_night_rate: f64,
}

/// Collaborator that produces room data for a room id
#[async_trait]
pub trait RoomDataSource: Send + Sync {
    /// Fetch data for `room_id`. Any error is reported to callers as a server error.
    async fn fetch_room_data(&self, room_id: &str) -> Result<RoomRecord>;
}

/// Randomized backend used for demos and load testing
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRoomDataSource;

impl RandomRoomDataSource {
    pub fn new() -> Self {
        Self
    }

    fn night_rate(rng: &mut impl Rng) -> f64 {
        round_to_two_decimals(rng.gen_range(50.0..200.0))
    }
}

#[async_trait]
impl RoomDataSource for RandomRoomDataSource {
    async fn fetch_room_data(&self, _room_id: &str) -> Result<RoomRecord> {
        let mut rng = rand::thread_rng();
        Ok(RoomRecord {
            occupancy_rate: round_to_two_decimals(rng.gen_range(0.0..100.0)),
            average_night_rate: Self::night_rate(&mut rng),
            highest_night_rate: Self::night_rate(&mut rng),
            lowest_night_rate: Self::night_rate(&mut rng),
        })
    }
}

/// Deterministic backend returning the same record for every room
#[derive(Debug, Clone)]
pub struct FixedRoomDataSource {
    record: RoomRecord,
}

impl FixedRoomDataSource {
    pub fn new(record: RoomRecord) -> Self {
        Self { record }
    }
}

#[async_trait]
impl RoomDataSource for FixedRoomDataSource {
    async fn fetch_room_data(&self, _room_id: &str) -> Result<RoomRecord> {
        Ok(self.record.clone())
    }
}

/// Build the backend selected in configuration
pub fn from_config(config: &DataSourceConfig) -> Box<dyn RoomDataSource> {
    match config {
        DataSourceConfig::Random => Box::new(RandomRoomDataSource::new()),
        DataSourceConfig::Fixed { record } => Box::new(FixedRoomDataSource::new(record.clone())),
    }
}
