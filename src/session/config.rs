use crate::error::ClientError;

/// Parameters a session is created with. The remote engine owns their
/// meaning; the client only validates the ranges it can check locally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationConfiguration {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Chance (0 - 100) that fire spreads to a neighboring tree per step
    pub spread_probability: u8,
    /// Signed wind component blowing from the south
    pub south_wind: i32,
    /// Signed wind component blowing from the west
    pub west_wind: i32,
    /// Lets the remote engine ignite trees beyond the immediate neighbors
    pub big_jumps: bool,
}

impl SimulationConfiguration {
    pub const MAX_SPREAD_PROBABILITY: u8 = 100;

    pub fn square(size: u32) -> Self {
        Self {
            grid_width: size,
            grid_height: size,
            ..Self::default()
        }
    }

    pub fn cell_count(&self) -> usize {
        self.grid_width as usize * self.grid_height as usize
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(ClientError::InvalidConfiguration(format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if self.spread_probability > Self::MAX_SPREAD_PROBABILITY {
            return Err(ClientError::InvalidConfiguration(format!(
                "spread probability must be within 0-{}, got {}",
                Self::MAX_SPREAD_PROBABILITY,
                self.spread_probability
            )));
        }
        Ok(())
    }
}

impl Default for SimulationConfiguration {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            spread_probability: 50,
            south_wind: 0,
            west_wind: 0,
            big_jumps: false,
        }
    }
}
