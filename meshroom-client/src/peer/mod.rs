mod agent;
mod connection;
mod factory;
mod registry;
mod rtc_agent;

pub use agent::*;
pub use connection::*;
pub use factory::*;
pub use registry::*;
pub use rtc_agent::*;
