mod core;
mod event_bus;
mod event_loop;

#[cfg(test)]
mod tests;

pub use core::App;
pub use event_bus::{EventBusRuntime, LoopEvent};
pub use event_loop::ItemReport;
