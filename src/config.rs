use std::env;

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub settings_path: String,
    pub weather_api_url: String,
    /// Live weather is disabled when unset
    pub weather_api_key: Option<String>,
    pub weather_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            settings_path: env::var("SETTINGS_PATH").unwrap_or_else(|_| "config.json".to_string()),
            weather_api_url: env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| DEFAULT_WEATHER_API_URL.to_string()),
            weather_api_key: env::var("WEATHER_API_KEY").ok().filter(|k| !k.is_empty()),
            weather_timeout_secs: env::var("WEATHER_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
