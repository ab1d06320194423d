pub mod error;
pub mod open_meteo;
pub mod registry;
pub mod retry;
pub mod source;

pub use error::SourceError;
pub use open_meteo::OpenMeteoSource;
pub use registry::SourceRegistry;
pub use source::WeatherSource;
