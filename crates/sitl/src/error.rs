use gyro_turn_core::SensorError;

/// Errors that can occur during simulator operations.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Calibration failed: {0}")]
    Calibration(SensorError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
