mod item;
mod navigator;
mod reading;
mod routes;
mod routing;
mod store;

use serde::{Deserialize, Serialize};

pub use item::{HistoryItem, ItemProps, PageType};
pub use navigator::Navigator;
pub use reading::ReadingHistory;
pub use routing::{Route, RoutingTable};
pub use store::{CURRENT_TIME, EntryPoint, HistoryStore, ObserverId, sanitize_query};

/// Which action vocabulary the navigator answers to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AppFlavor {
    #[default]
    Course,
    Mesh,
    Buffet,
}
