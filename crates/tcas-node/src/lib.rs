//! TCAS aircraft node: configuration, transports and the scheduler loop.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod transport;

pub use config::{Config, SimulatorStart};
pub use error::{NodeError, TransportError};
pub use scheduler::{TcasNode, TrafficSnapshot};
pub use transport::{Inbound, MemoryBus, MemoryEndpoint, NatsTransport, Transport};
