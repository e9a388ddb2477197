//! Identity operator configuration object and helpers.
mod loading;
mod object;
mod options;
mod runtime;

pub use self::loading::load;
pub use self::loading::Error;
pub use self::object::Conf;
pub use self::object::KeystoneApiConf;
pub use self::object::NetworkConf;
pub use self::object::PathsConf;
pub use self::object::TelemetryConf;
pub use self::object::WorkloadConf;
pub use self::options::CharmOptions;
pub use self::runtime::RuntimeConf;
