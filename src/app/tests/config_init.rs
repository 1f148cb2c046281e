use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::App;
use crate::config::Config;
use crate::dispatch::{Action, ActionType};
use crate::history::{AppFlavor, PageType};

use super::library;

#[test]
fn new_with_config_applies_batch_limit_and_flavor() {
    let mut config = Config::default();
    config.dispatcher.batch_limit = 1;
    config.app.flavor = AppFlavor::Buffet;

    let app = App::from_memory_engine(config, library());
    for _ in 0..2 {
        app.dispatcher()
            .dispatch(Action::new(ActionType::AllSetsClicked))
            .expect("typed action should dispatch");
    }

    assert!(app.main_loop().iteration());
    assert_eq!(app.dispatcher().queued_len(), 1);
    app.main_loop().run_until_idle();
    assert_eq!(
        app.current_item().map(|item| item.page_type()),
        Some(PageType::AllSets)
    );
}

#[test]
fn unreadable_reading_history_falls_back_to_memory() {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("knav-app-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir should be creatable");
    let path = dir.join("read.json");
    fs::write(&path, "not json").expect("fixture should be writable");

    let mut config = Config::default();
    config.reading_history.path = Some(path);
    let app = App::from_memory_engine(config, library());

    app.dispatch(Action::new(ActionType::HomeClicked))
        .expect("typed action should dispatch");
    assert!(app.navigator().reading_history().path().is_none());

    fs::remove_dir_all(&dir).expect("temp dir should be removable");
}

#[test]
fn untyped_json_is_rejected_before_queueing() {
    let app = App::from_memory_engine(Config::default(), library());
    assert!(app.dispatch_json(r#"{"search_terms": "cats"}"#).is_err());
    assert!(app.dispatch_json("not json").is_err());
    assert_eq!(app.dispatcher().queued_len(), 0);
}
