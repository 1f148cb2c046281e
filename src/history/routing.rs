use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::dispatch::{Action, ActionType};
use crate::error::AppResult;

use super::AppFlavor;
use super::navigator::Navigator;
use super::routes;

pub type Route = Rc<dyn Fn(&Navigator, &Action) -> AppResult<()>>;

/// Maps action types to the handler a navigator runs for them.
#[derive(Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<ActionType, Route>,
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handled: Vec<&str> = self.routes.keys().map(ActionType::as_str).collect();
        handled.sort_unstable();
        f.debug_struct("RoutingTable")
            .field("handled", &handled)
            .finish()
    }
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// History back/forward buttons, shared by every flavor.
    pub fn base() -> Self {
        Self::new()
            .with_route(ActionType::HistoryBackClicked, |nav, _| {
                nav.go_back();
                Ok(())
            })
            .with_route(ActionType::HistoryForwardClicked, |nav, _| {
                nav.go_forward();
                Ok(())
            })
    }

    pub fn for_flavor(flavor: AppFlavor) -> Self {
        match flavor {
            AppFlavor::Course => routes::course::table(),
            AppFlavor::Mesh => routes::mesh::table(),
            AppFlavor::Buffet => routes::buffet::table(),
        }
    }

    pub fn with_route<F>(mut self, action_type: ActionType, handler: F) -> Self
    where
        F: Fn(&Navigator, &Action) -> AppResult<()> + 'static,
    {
        self.insert(action_type, handler);
        self
    }

    /// Replaces any handler already registered for `action_type`.
    pub fn insert<F>(&mut self, action_type: ActionType, handler: F)
    where
        F: Fn(&Navigator, &Action) -> AppResult<()> + 'static,
    {
        self.routes.insert(action_type, Rc::new(handler));
    }

    pub fn handles(&self, action_type: &ActionType) -> bool {
        self.routes.contains_key(action_type)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Runs the handler for `action`. Returns false when no route matches.
    pub fn route(&self, nav: &Navigator, action: &Action) -> AppResult<bool> {
        let Some(route) = action
            .action_type()
            .and_then(|action_type| self.routes.get(action_type))
        else {
            return Ok(false);
        };
        route(nav, action)?;
        Ok(true)
    }
}
