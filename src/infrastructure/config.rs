// Configuration loading
use crate::domain::axis::AxisRange;
use crate::presentation::chart_controller::ControllerSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    pub chart: ChartSettings,
    pub replay: ReplaySettings,
    pub socket: SocketSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChartSettings {
    pub capacity: usize,
    pub y_min: f64,
    pub y_max: f64,
    pub render_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReplaySettings {
    pub pacing_ms: u64,
    #[serde(default)]
    pub recording: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SocketSettings {
    pub bind_addr: String,
    pub axes: Vec<String>,
}

impl AppConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chart.capacity == 0 {
            anyhow::bail!("chart.capacity must be at least 1");
        }
        let (y_min, y_max) = (self.chart.y_min, self.chart.y_max);
        if y_min.is_nan() || y_max.is_nan() || y_min >= y_max {
            anyhow::bail!(
                "chart.y_min ({}) must be below chart.y_max ({})",
                self.chart.y_min,
                self.chart.y_max
            );
        }
        if self.socket.axes.is_empty() {
            anyhow::bail!("socket.axes must name at least one axis");
        }
        Ok(())
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            capacity: self.chart.capacity,
            y_range: AxisRange::new(self.chart.y_min, self.chart.y_max),
            pacing: match self.replay.pacing_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            bind_addr: self.socket.bind_addr.clone(),
            socket_axes: self.socket.axes.clone(),
        }
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.chart.render_interval_ms)
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("chart.capacity", 200)?
        .set_default("chart.y_min", -15.0)?
        .set_default("chart.y_max", 15.0)?
        .set_default("chart.render_interval_ms", 250)?
        .set_default("replay.pacing_ms", 40)?
        .set_default("socket.bind_addr", "127.0.0.1:1337")?
        .set_default("socket.axes", vec!["X", "Y", "Z"])?)
}

/// Load `config/ingestion.toml` if present, falling back to built-in defaults.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/ingestion").required(false))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

pub fn load_app_config_from(path: &std::path::Path) -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::from(path))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_fill_missing_keys() {
        let file = write_config("[chart]\ncapacity = 50\n");
        let config = load_app_config_from(file.path()).unwrap();

        assert_eq!(config.chart.capacity, 50);
        assert_eq!(config.chart.y_min, -15.0);
        assert_eq!(config.replay.pacing_ms, 40);
        assert_eq!(config.replay.recording, None);
        assert_eq!(config.socket.bind_addr, "127.0.0.1:1337");
        assert_eq!(config.socket.axes, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_controller_settings() {
        let file = write_config(
            "[replay]\npacing_ms = 0\nrecording = \"data/run.json\"\n\n[socket]\naxes = [\"a\", \"b\"]\n",
        );
        let config = load_app_config_from(file.path()).unwrap();
        let settings = config.controller_settings();

        assert_eq!(settings.pacing, None);
        assert_eq!(settings.socket_axes, vec!["a", "b"]);
        assert_eq!(settings.y_range, AxisRange::new(-15.0, 15.0));
        assert_eq!(config.replay.recording, Some(PathBuf::from("data/run.json")));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let file = write_config("[chart]\ncapacity = 0\n");
        assert!(load_app_config_from(file.path()).is_err());
    }

    #[test]
    fn test_rejects_inverted_range() {
        let file = write_config("[chart]\ny_min = 5.0\ny_max = -5.0\n");
        let err = load_app_config_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("y_min"));
    }

    #[test]
    fn test_rejects_nan_bound() {
        let file = write_config("[chart]\ny_max = nan\n");
        let err = load_app_config_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("y_max"));
    }

    #[test]
    fn test_round_trips_through_toml() {
        let file = write_config("");
        let config = load_app_config_from(file.path()).unwrap();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
