pub mod acquisition;
pub mod codec;
pub mod config;
pub mod connection;
pub mod constants;
pub mod control;
pub mod error;
pub mod event;
pub mod gatt;
pub mod probe;
pub mod scheduler;
pub mod sensor;
pub mod session;
pub mod sim;
pub mod stream;
pub mod subscription;
pub mod transport;


// Re-export the streaming engine and its collaborators for easy access
pub use event::{EventSink, PeripheralEvent};
pub use gatt::{ChannelNotifier, Notifier};
pub use stream::Streamer;
pub use transport::RegisterBus;
