pub mod event_bus;
pub mod journal;
pub mod logger;

pub use event_bus::{Event, EventBus, MemoryBus};
pub use journal::Journal;
pub use logger::init_logger;
