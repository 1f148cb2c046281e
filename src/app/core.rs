use std::rc::Rc;

use crate::config::Config;
use crate::content::{ContentEngine, MemoryEngine, SetMap};
use crate::dispatch::{Action, Dispatcher};
use crate::error::AppResult;
use crate::history::{HistoryItem, Navigator, ReadingHistory, RoutingTable};
use crate::runtime::MainLoop;

/// One application window: the loop, its dispatcher and the navigator
/// consuming from it.
pub struct App {
    pub config: Config,
    main_loop: MainLoop,
    dispatcher: Dispatcher,
    navigator: Navigator,
}

impl App {
    pub fn new(engine: MemoryEngine) -> AppResult<Self> {
        let config = Config::load()?;
        Ok(Self::from_memory_engine(config, engine))
    }

    /// Builds the set map from every set the engine holds.
    pub fn from_memory_engine(config: Config, engine: MemoryEngine) -> Self {
        let set_map = SetMap::from_models(engine.sets());
        Self::new_with_config(config, Rc::new(engine), set_map)
    }

    pub fn new_with_config(config: Config, engine: Rc<dyn ContentEngine>, set_map: SetMap) -> Self {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::with_config(&main_loop, &config.dispatcher);
        let reading = match ReadingHistory::from_config(config.reading_history.path.as_deref()) {
            Ok(reading) => reading,
            Err(err) => {
                tracing::warn!(error = %err, "reading history unavailable; keeping it in memory");
                ReadingHistory::in_memory()
            }
        };
        let navigator = Navigator::new(
            &dispatcher,
            engine,
            RoutingTable::for_flavor(config.app.flavor),
        )
        .with_set_map(set_map)
        .with_reading_history(reading);
        tracing::info!(flavor = ?config.app.flavor, "app initialized");

        Self {
            config,
            main_loop,
            dispatcher,
            navigator,
        }
    }

    pub fn main_loop(&self) -> &MainLoop {
        &self.main_loop
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn current_item(&self) -> Option<HistoryItem> {
        self.navigator.current_item()
    }

    /// Queues `action` and runs the loop until everything it triggered settles.
    pub fn dispatch(&self, action: Action) -> AppResult<()> {
        self.dispatcher.dispatch(action)?;
        self.main_loop.run_until_idle();
        Ok(())
    }

    pub fn dispatch_json(&self, raw: &str) -> AppResult<()> {
        self.dispatch(Action::from_json(raw)?)
    }

    pub fn shutdown(&self) {
        self.navigator.detach();
        self.dispatcher.stop();
    }
}
