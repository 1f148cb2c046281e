use crate::content::{ContentModel, ModelKind};
use crate::dispatch::{Action, ActionType};
use crate::error::AppResult;
use crate::history::item::{ItemProps, PageType};
use crate::history::navigator::Navigator;
use crate::history::routing::RoutingTable;
use crate::history::store::EntryPoint;

use super::{follow_article_link, load_dbus_item, require_model, search, show_home, show_media};

pub fn table() -> RoutingTable {
    RoutingTable::base()
        .with_route(ActionType::HomeClicked, show_home)
        .with_route(ActionType::LaunchedFromDesktop, show_home)
        .with_route(ActionType::AllSetsClicked, |nav, _| {
            nav.set_current_item_from_props(ItemProps::page(PageType::AllSets), EntryPoint::Other)?;
            Ok(())
        })
        .with_route(ActionType::SetClicked, |nav, action| {
            let model = require_model(action, &ActionType::SetClicked)?;
            show_set(nav, model.clone())
        })
        .with_route(ActionType::ItemClicked, |nav, action| {
            show_set_or_article(nav, action, &ActionType::ItemClicked)
        })
        .with_route(ActionType::SearchClicked, |nav, action| {
            show_set_or_article(nav, action, &ActionType::SearchClicked)
        })
        .with_route(ActionType::AutocompleteClicked, |nav, action| {
            show_set_or_article(nav, action, &ActionType::AutocompleteClicked)
        })
        .with_route(ActionType::PreviousDocumentClicked, |nav, action| {
            let model = require_model(action, &ActionType::PreviousDocumentClicked)?;
            show_article(nav, action, model.clone())
        })
        .with_route(ActionType::NextDocumentClicked, |nav, action| {
            let model = require_model(action, &ActionType::NextDocumentClicked)?;
            show_article(nav, action, model.clone())
        })
        .with_route(ActionType::ArticleLinkClicked, follow_article_link)
        .with_route(ActionType::SearchTextEntered, search)
        .with_route(ActionType::DbusLoadQueryCalled, search)
        .with_route(ActionType::DbusLoadItemCalled, load_dbus_item)
}

fn show_set_or_article(nav: &Navigator, action: &Action, action_type: &ActionType) -> AppResult<()> {
    let model = require_model(action, action_type)?;
    match model.kind {
        ModelKind::Set => show_set(nav, model.clone()),
        ModelKind::Media => show_media(nav, action, model),
        ModelKind::Article => show_article(nav, action, model.clone()),
    }
}

fn show_set(nav: &Navigator, model: ContentModel) -> AppResult<()> {
    let label = model.title.clone();
    nav.set_current_item_from_props(
        ItemProps::page(PageType::Set)
            .with_model(model)
            .with_context_label(label),
        EntryPoint::LinkClicked,
    )?;
    Ok(())
}

fn show_article(nav: &Navigator, action: &Action, model: ContentModel) -> AppResult<()> {
    let props = ItemProps::page(PageType::Article)
        .with_model(model)
        .with_context_label(action.context_label().unwrap_or_default())
        .with_search_terms(action.search_terms().unwrap_or_default());
    nav.set_current_item_from_props(props, EntryPoint::LinkClicked)?;
    Ok(())
}
