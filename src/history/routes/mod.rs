//! Action handlers shared by the app flavors, and the per-flavor tables.

pub mod buffet;
pub mod course;
pub mod mesh;

use crate::content::ContentModel;
use crate::dispatch::{Action, ActionType};
use crate::error::{AppError, AppResult};

use super::item::{ItemProps, PageType};
use super::navigator::Navigator;
use super::store::{CURRENT_TIME, EntryPoint};

fn require_model<'a>(action: &'a Action, action_type: &ActionType) -> AppResult<&'a ContentModel> {
    action
        .model()
        .ok_or_else(|| AppError::invalid_action(format!("{action_type} requires a model")))
}

fn require_id<'a>(action: &'a Action, action_type: &ActionType) -> AppResult<&'a str> {
    action
        .id()
        .ok_or_else(|| AppError::invalid_action(format!("{action_type} requires an id")))
}

fn timestamp(action: &Action) -> u32 {
    action.timestamp().unwrap_or(CURRENT_TIME)
}

pub(crate) fn show_home(nav: &Navigator, action: &Action) -> AppResult<()> {
    nav.set_current_item_from_props(
        ItemProps::page(PageType::Home).with_timestamp(timestamp(action)),
        EntryPoint::Other,
    )?;
    Ok(())
}

pub(crate) fn close_lightbox(nav: &Navigator, _action: &Action) -> AppResult<()> {
    nav.close_lightbox();
    Ok(())
}

pub(crate) fn follow_article_link(nav: &Navigator, action: &Action) -> AppResult<()> {
    let id = require_id(action, &ActionType::ArticleLinkClicked)?;
    nav.show_id(id);
    Ok(())
}

pub(crate) fn search(nav: &Navigator, action: &Action) -> AppResult<()> {
    nav.do_search(action.search_terms().unwrap_or_default(), timestamp(action));
    Ok(())
}

pub(crate) fn load_dbus_item(nav: &Navigator, action: &Action) -> AppResult<()> {
    let id = require_id(action, &ActionType::DbusLoadItemCalled)?;
    nav.load_dbus_item(
        id,
        action.search_terms().map(str::to_string),
        timestamp(action),
    );
    Ok(())
}

/// Returns to the closest section page, or home.
///
/// From an article the closest home, set or search page counts; from anywhere
/// else only home does.
pub(crate) fn nav_back(nav: &Navigator, _action: &Action) -> AppResult<()> {
    let target = {
        let store = nav.store();
        let from_article = store
            .current_item()
            .is_some_and(|item| item.page_type() == PageType::Article);
        let targets: &[PageType] = if from_article {
            &[PageType::Home, PageType::Set, PageType::Search]
        } else {
            &[PageType::Home]
        };
        store
            .search_backwards(-1, |item| targets.contains(&item.page_type()))
            .cloned()
    };

    match target {
        Some(item) => {
            nav.set_current_item(item);
        }
        None => {
            nav.set_current_item_from_props(ItemProps::page(PageType::Home), EntryPoint::NavBack)?;
        }
    }
    Ok(())
}

/// Shows a clicked media model as a lightbox over the current page.
pub(crate) fn show_media(nav: &Navigator, action: &Action, media: &ContentModel) -> AppResult<()> {
    nav.show_lightbox(media.clone(), action.context().to_vec(), EntryPoint::LinkClicked)?;
    Ok(())
}
