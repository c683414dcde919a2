//! Event bus adapters.
//!
//! - `InMemoryEventBus` - In-process bus with synchronous delivery

mod in_memory;

pub use in_memory::InMemoryEventBus;
