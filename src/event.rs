use serde::Serialize;

use crate::content::ContentModel;
use crate::history::HistoryItem;

/// Which way the history index last moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Backwards,
    #[default]
    Forwards,
}

/// Notifications emitted by a history store to its observers.
///
/// The payload is a snapshot taken when the store changed, so observers that
/// run later still see the state that produced the event.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    Changed {
        index: usize,
        item: HistoryItem,
        direction: Direction,
        can_go_back: bool,
        can_go_forward: bool,
    },
    CurrentQueryChanged(String),
    CurrentSetChanged(Option<ContentModel>),
    CurrentSubsetChanged(ContentModel),
}

impl HistoryEvent {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}
