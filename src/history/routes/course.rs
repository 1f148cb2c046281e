use crate::content::ModelKind;
use crate::dispatch::{Action, ActionType};
use crate::error::AppResult;
use crate::history::item::{ItemProps, PageType};
use crate::history::navigator::Navigator;
use crate::history::routing::RoutingTable;
use crate::history::store::EntryPoint;

use super::{
    close_lightbox, follow_article_link, load_dbus_item, nav_back, require_model, search,
    show_home, show_media,
};

pub fn table() -> RoutingTable {
    RoutingTable::base()
        .with_route(ActionType::HomeClicked, show_home)
        .with_route(ActionType::LaunchedFromDesktop, show_home)
        .with_route(ActionType::ItemClicked, item_clicked)
        .with_route(ActionType::NavBackClicked, nav_back)
        .with_route(ActionType::LightboxClosed, close_lightbox)
        .with_route(ActionType::SearchBoxFocused, close_lightbox)
        .with_route(ActionType::ArticleLinkClicked, follow_article_link)
        .with_route(ActionType::SearchTextEntered, search)
        .with_route(ActionType::DbusLoadQueryCalled, search)
        .with_route(ActionType::DbusLoadItemCalled, load_dbus_item)
}

/// Top-level sets open a set page and load their first subset; nested sets
/// only switch the current subset.
fn item_clicked(nav: &Navigator, action: &Action) -> AppResult<()> {
    let model = require_model(action, &ActionType::ItemClicked)?;
    match model.kind {
        ModelKind::Set => {
            if nav.parent_set(model).is_some() {
                nav.set_current_subset(model.clone());
            } else {
                nav.set_current_item_from_props(
                    ItemProps::page(PageType::Set).with_model(model.clone()),
                    EntryPoint::LinkClicked,
                )?;
                nav.load_first_subset(model.clone());
            }
        }
        ModelKind::Media => show_media(nav, action, model)?,
        ModelKind::Article => {
            nav.set_current_item_from_props(
                ItemProps::page(PageType::Article).with_model(model.clone()),
                EntryPoint::LinkClicked,
            )?;
        }
    }
    Ok(())
}
