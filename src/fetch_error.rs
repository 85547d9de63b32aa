#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Weather API returned status {0}")]
    Status(u16),
    #[error("Failed to parse weather payload: {0}")]
    Parse(String),
}
