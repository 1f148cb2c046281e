mod main_loop;

pub use main_loop::{IdleControl, MainLoop, SourceId};
