pub mod app_config;
pub mod config;
pub mod error;
pub mod freshness;
pub mod location;
pub mod locations_file;
pub mod source;
pub mod weather;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use error::{RefreshError, RefreshErrorKind};
pub use freshness::{should_skip, DEFAULT_VALIDITY_HOURS};
pub use location::Location;
pub use locations_file::{load_locations, LocationConfig, LocationsFile};
pub use source::{SecondarySources, WeatherFeature};
pub use weather::Weather;
