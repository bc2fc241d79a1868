//! JSON bodies exchanged with the simulation service.

use serde::{Deserialize, Serialize};

use crate::session::{Cell, GridSnapshot, SessionHandle, SimulationConfiguration};

use super::CreatedSession;

#[derive(Debug, Serialize)]
pub struct CreateSessionRequest {
    pub dim: [u32; 2],
    pub probability: u8,
    pub south_wind_speed: i32,
    pub west_wind_speed: i32,
    pub big_jumps: bool,
}

impl From<&SimulationConfiguration> for CreateSessionRequest {
    fn from(config: &SimulationConfiguration) -> Self {
        Self {
            dim: [config.grid_width, config.grid_height],
            probability: config.spread_probability,
            south_wind_speed: config.south_wind,
            west_wind_speed: config.west_wind,
            big_jumps: config.big_jumps,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(rename = "Location")]
    pub location: String,
    pub trees: Vec<Cell>,
}

impl From<CreateSessionResponse> for CreatedSession {
    fn from(response: CreateSessionResponse) -> Self {
        Self {
            handle: SessionHandle::new(response.location),
            snapshot: GridSnapshot::new(response.trees),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SnapshotResponse {
    pub trees: Vec<Cell>,
}

impl From<SnapshotResponse> for GridSnapshot {
    fn from(response: SnapshotResponse) -> Self {
        GridSnapshot::new(response.trees)
    }
}
