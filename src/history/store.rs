use std::fmt;

use crate::content::ContentModel;
use crate::error::AppResult;
use crate::event::{Direction, HistoryEvent};

use super::item::{HistoryItem, ItemProps, PageType};

/// Timestamp used when the producer did not supply one.
pub const CURRENT_TIME: u32 = 0;

/// How the user reached a piece of content, for the content-access metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryPoint {
    #[default]
    Other,
    LinkClicked,
    ArticleLinkClicked,
    DbusCall,
    NavBack,
}

impl EntryPoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::LinkClicked => "link-clicked",
            Self::ArticleLinkClicked => "article-link-clicked",
            Self::DbusCall => "dbus-call",
            Self::NavBack => "nav-back",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    pub(super) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

type Observer = Box<dyn FnMut(&HistoryEvent)>;

/// Linear navigation history with a current index.
///
/// Empty items occupy a slot but are invisible to every traversal.
///
/// A store built with [`HistoryStore::deferred`] queues its events instead of
/// calling observers; the owner drains them with [`HistoryStore::take_events`]
/// once it no longer holds the store.
#[derive(Default)]
pub struct HistoryStore {
    items: Vec<HistoryItem>,
    index: Option<usize>,
    direction: Direction,
    current_subset: Option<ContentModel>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer_id: u64,
    deferred: bool,
    pending: Vec<HistoryEvent>,
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("items", &self.items)
            .field("index", &self.index)
            .field("direction", &self.direction)
            .field("current_subset", &self.current_subset)
            .field("observers", &self.observers.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::default()
        }
    }

    /// Events queued since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<HistoryEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn subscribe<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&HistoryEvent) + 'static,
    {
        self.next_observer_id += 1;
        let id = ObserverId(self.next_observer_id);
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(candidate, _)| *candidate != id);
        self.observers.len() != before
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    pub fn current_item(&self) -> Option<&HistoryItem> {
        self.index.and_then(|index| self.items.get(index))
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The item `offset` non-empty steps away from the current one.
    pub fn get_item(&self, offset: isize) -> Option<&HistoryItem> {
        let index = self.index? as isize;
        if offset == 0 {
            return self.current_item().filter(|item| !item.is_empty());
        }

        let step = offset.signum();
        let mut remaining = offset.unsigned_abs();
        let mut cursor = index;
        loop {
            cursor += step;
            let item = self.slot(cursor)?;
            if item.is_empty() {
                continue;
            }
            remaining -= 1;
            if remaining == 0 {
                return Some(item);
            }
        }
    }

    /// First non-empty item matching `predicate`, scanning forwards from
    /// `current + offset` inclusive.
    pub fn search<P>(&self, offset: isize, predicate: P) -> Option<&HistoryItem>
    where
        P: Fn(&HistoryItem) -> bool,
    {
        let start = self.index? as isize + offset;
        self.find_index(start, 1, predicate)
            .map(|index| &self.items[index])
    }

    /// Like [`HistoryStore::search`], scanning backwards.
    pub fn search_backwards<P>(&self, offset: isize, predicate: P) -> Option<&HistoryItem>
    where
        P: Fn(&HistoryItem) -> bool,
    {
        let start = self.index? as isize + offset;
        self.find_index(start, -1, predicate)
            .map(|index| &self.items[index])
    }

    pub fn can_go_back(&self) -> bool {
        self.search_backwards(-1, |_| true).is_some()
    }

    pub fn can_go_forward(&self) -> bool {
        self.search(1, |_| true).is_some()
    }

    pub fn go_back(&mut self) -> bool {
        let Some(index) = self.index else {
            return false;
        };
        match self.find_index(index as isize - 1, -1, |_| true) {
            Some(target) => {
                self.move_to(target, Direction::Backwards);
                true
            }
            None => false,
        }
    }

    pub fn go_forward(&mut self) -> bool {
        let Some(index) = self.index else {
            return false;
        };
        match self.find_index(index as isize + 1, 1, |_| true) {
            Some(target) => {
                self.move_to(target, Direction::Forwards);
                true
            }
            None => false,
        }
    }

    /// Makes `item` current, dropping any forward history.
    ///
    /// Returns false, without notifying, when `item` equals the current item.
    pub fn set_current_item(&mut self, item: HistoryItem) -> bool {
        if self.current_item() == Some(&item) {
            return false;
        }
        let keep = self.index.map_or(0, |index| index + 1);
        self.items.truncate(keep);
        self.items.push(item);
        self.move_to(self.items.len() - 1, Direction::Forwards);
        true
    }

    pub fn set_current_item_from_props(
        &mut self,
        props: ItemProps,
        entry_point: EntryPoint,
    ) -> AppResult<bool> {
        let item = HistoryItem::from_props(props)?;
        let changed = self.set_current_item(item);
        if changed
            && let Some(item) = self.current_item()
            && item.page_type() == PageType::Article
            && let Some(model) = item.model()
        {
            tracing::info!(
                target: "knav::metrics",
                content = %model.id,
                entry_point = entry_point.as_str(),
                "content access"
            );
        }
        Ok(changed)
    }

    pub fn current_query(&self) -> String {
        self.search_backwards(0, |item| !item.search_terms().is_empty())
            .map(|item| item.search_terms().to_string())
            .unwrap_or_default()
    }

    pub fn current_set(&self) -> Option<&ContentModel> {
        self.search_backwards(0, |item| item.page_type() == PageType::Set)
            .and_then(HistoryItem::model)
    }

    pub fn current_subset(&self) -> Option<&ContentModel> {
        self.current_subset.as_ref()
    }

    /// Notifies only when the subset id actually changes.
    pub fn set_current_subset(&mut self, model: ContentModel) -> bool {
        if self
            .current_subset
            .as_ref()
            .is_some_and(|current| current.id == model.id)
        {
            return false;
        }
        self.current_subset = Some(model.clone());
        self.emit(HistoryEvent::CurrentSubsetChanged(model));
        true
    }

    /// Leaves the lightbox by returning to the closest earlier item without
    /// media, or to the current page stripped of its media.
    pub fn close_lightbox(&mut self) -> bool {
        let Some(current) = self.current_item() else {
            return false;
        };
        if current.media_model().is_none() {
            return false;
        }

        let target = match self.search_backwards(-1, |item| item.media_model().is_none()) {
            Some(previous) => previous.clone(),
            None => {
                let mut props = current.to_props();
                props.media_model = None;
                props.context = Vec::new();
                match HistoryItem::from_props(props) {
                    Ok(item) => item,
                    Err(err) => {
                        tracing::warn!(error = %err, "cannot rebuild item without lightbox");
                        return false;
                    }
                }
            }
        };
        self.set_current_item(target)
    }

    /// Replaces the current item with an empty copy of itself, e.g. once a
    /// search turned up nothing. The page stays on screen, so no event fires;
    /// later traversal skips the slot.
    pub fn mark_current_empty(&mut self) -> bool {
        let Some(index) = self.index else {
            return false;
        };
        let current = &self.items[index];
        if current.is_empty() {
            return false;
        }
        match HistoryItem::from_props(current.to_props().with_empty(true)) {
            Ok(empty) => {
                self.items[index] = empty;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot mark current item empty");
                false
            }
        }
    }

    /// Pushes a search page. Blank queries are ignored.
    pub fn do_search(&mut self, terms: &str, timestamp: u32) -> bool {
        let query = sanitize_query(terms);
        if query.is_empty() {
            return false;
        }

        tracing::info!(target: "knav::metrics", query = %query, "search");
        let props = ItemProps::page(PageType::Search)
            .with_search_terms(query)
            .with_timestamp(timestamp);
        match HistoryItem::from_props(props) {
            Ok(item) => self.set_current_item(item),
            Err(err) => {
                tracing::warn!(error = %err, "cannot build search item");
                false
            }
        }
    }

    fn slot(&self, index: isize) -> Option<&HistoryItem> {
        usize::try_from(index).ok().and_then(|index| self.items.get(index))
    }

    fn find_index<P>(&self, start: isize, step: isize, predicate: P) -> Option<usize>
    where
        P: Fn(&HistoryItem) -> bool,
    {
        let mut cursor = start;
        while let Some(item) = self.slot(cursor) {
            if !item.is_empty() && predicate(item) {
                return Some(cursor as usize);
            }
            cursor += step;
        }
        None
    }

    fn move_to(&mut self, target: usize, direction: Direction) {
        let old_query = self.current_query();
        let old_set = self.current_set().map(|set| set.id.clone());

        self.index = Some(target);
        self.direction = direction;

        let item = self.items[target].clone();
        let event = HistoryEvent::Changed {
            index: target,
            item,
            direction,
            can_go_back: self.can_go_back(),
            can_go_forward: self.can_go_forward(),
        };
        self.emit(event);

        let new_query = self.current_query();
        if new_query != old_query {
            self.emit(HistoryEvent::CurrentQueryChanged(new_query));
        }
        let new_set = self.current_set().cloned();
        if new_set.as_ref().map(|set| &set.id) != old_set.as_ref() {
            self.emit(HistoryEvent::CurrentSetChanged(new_set));
        }
    }

    fn emit(&mut self, event: HistoryEvent) {
        if self.deferred {
            self.pending.push(event);
            return;
        }
        for (_, observer) in &mut self.observers {
            observer(&event);
        }
    }
}

/// Collapses line breaks to spaces and trims.
pub fn sanitize_query(query: &str) -> String {
    query
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}
