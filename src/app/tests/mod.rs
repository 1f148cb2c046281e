mod config_init;

use std::cell::RefCell;
use std::rc::Rc;

use crate::app::App;
use crate::config::Config;
use crate::content::{ContentEngine, ContentModel, MemoryEngine};
use crate::dispatch::{Action, ActionType, ConsumerError};
use crate::history::{AppFlavor, HistoryItem, PageType};

fn library() -> MemoryEngine {
    MemoryEngine::from_models(vec![
        ContentModel::set("ekn:///animals")
            .with_title("Animals")
            .with_child_tags(["animals"]),
        ContentModel::set("ekn:///mammals")
            .with_title("Mammals")
            .with_tags(["animals"])
            .with_sequence_number(1)
            .with_child_tags(["mammals"]),
        ContentModel::set("ekn:///birds")
            .with_title("Birds")
            .with_tags(["animals"])
            .with_sequence_number(0),
        ContentModel::article("ekn:///cat")
            .with_title("Cat")
            .with_tags(["mammals"]),
        ContentModel::article("ekn:///dog")
            .with_title("Dog")
            .with_tags(["mammals"]),
        ContentModel::media("ekn:///cat.jpg").with_title("A cat"),
    ])
}

fn app(flavor: AppFlavor) -> App {
    let mut config = Config::default();
    config.app.flavor = flavor;
    App::from_memory_engine(config, library())
}

/// Routes consumer errors into a list instead of the log.
fn capture_errors(app: &App) -> Rc<RefCell<Vec<String>>> {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    app.dispatcher()
        .set_error_reporter(move |err: &ConsumerError| sink.borrow_mut().push(err.to_string()));
    errors
}

fn model(id: &str) -> ContentModel {
    library()
        .get_object(id)
        .expect("fixture model should exist")
}

fn send(app: &App, action: Action) {
    app.dispatch(action).expect("typed action should dispatch");
}

fn click(app: &App, id: &str) {
    send(app, Action::new(ActionType::ItemClicked).with_model(model(id)));
}

fn current(app: &App) -> HistoryItem {
    app.current_item().expect("a current item should exist")
}

fn current_page(app: &App) -> PageType {
    current(app).page_type()
}

fn current_model_id(app: &App) -> Option<String> {
    current(app).model().map(|model| model.id.clone())
}
