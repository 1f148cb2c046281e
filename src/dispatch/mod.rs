mod action;
mod dispatcher;

pub use action::{Action, ActionType};
pub use dispatcher::{ConsumerError, Dispatcher, SubscriptionId};
