use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::content::{ContentEngine, ContentModel, ContentQuery, ModelKind, SetMap};
use crate::dispatch::{Action, Dispatcher, SubscriptionId};
use crate::error::AppResult;
use crate::event::HistoryEvent;

use super::item::{HistoryItem, ItemProps, PageType};
use super::reading::ReadingHistory;
use super::routing::RoutingTable;
use super::store::{EntryPoint, HistoryStore, ObserverId};

type SharedObserver = Rc<RefCell<dyn FnMut(&HistoryEvent)>>;

struct NavigatorInner {
    store: RefCell<HistoryStore>,
    observers: RefCell<Vec<(ObserverId, SharedObserver)>>,
    next_observer_id: Cell<u64>,
    engine: Rc<dyn ContentEngine>,
    set_map: RefCell<SetMap>,
    reading: RefCell<ReadingHistory>,
    routes: RoutingTable,
    dispatcher: Dispatcher,
    subscription: Cell<Option<SubscriptionId>>,
}

/// Drives one window's history from dispatched actions.
///
/// Holds the only consumer it registers on the dispatcher; every action is
/// routed through the injected [`RoutingTable`]. Engine lookups run on a later
/// loop turn and a failed lookup leaves history untouched.
///
/// Observers are notified after the store is released, so they may read the
/// navigator or drive it further.
#[derive(Clone)]
pub struct Navigator {
    inner: Rc<NavigatorInner>,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("store", &self.inner.store)
            .field("routes", &self.inner.routes)
            .field("subscription", &self.inner.subscription.get())
            .finish()
    }
}

impl Navigator {
    pub fn new(dispatcher: &Dispatcher, engine: Rc<dyn ContentEngine>, routes: RoutingTable) -> Self {
        let inner = Rc::new(NavigatorInner {
            store: RefCell::new(HistoryStore::deferred()),
            observers: RefCell::new(Vec::new()),
            next_observer_id: Cell::new(0),
            engine,
            set_map: RefCell::new(SetMap::new()),
            reading: RefCell::new(ReadingHistory::in_memory()),
            routes,
            dispatcher: dispatcher.clone(),
            subscription: Cell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let subscription = dispatcher.register(move |action| match weak.upgrade() {
            Some(inner) => Navigator { inner }.handle(action),
            None => Ok(()),
        });
        inner.subscription.set(Some(subscription));
        tracing::debug!(%subscription, routes = inner.routes.len(), "navigator attached");

        Self { inner }
    }

    pub fn with_set_map(self, set_map: SetMap) -> Self {
        *self.inner.set_map.borrow_mut() = set_map;
        self
    }

    pub fn with_reading_history(self, reading: ReadingHistory) -> Self {
        *self.inner.reading.borrow_mut() = reading;
        self
    }

    /// Unregisters from the dispatcher. Safe to call more than once.
    pub fn detach(&self) {
        if let Some(subscription) = self.inner.subscription.take() {
            self.inner.dispatcher.unregister(subscription);
            tracing::debug!(%subscription, "navigator detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.subscription.get().is_some()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn store(&self) -> Ref<'_, HistoryStore> {
        self.inner.store.borrow()
    }

    pub fn reading_history(&self) -> Ref<'_, ReadingHistory> {
        self.inner.reading.borrow()
    }

    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: FnMut(&HistoryEvent) + 'static,
    {
        let raw = self.inner.next_observer_id.get() + 1;
        self.inner.next_observer_id.set(raw);
        let id = ObserverId::from_raw(raw);
        self.inner
            .observers
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(observer)) as SharedObserver));
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.inner.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(candidate, _)| *candidate != id);
        observers.len() != before
    }

    pub fn current_item(&self) -> Option<HistoryItem> {
        self.store().current_item().cloned()
    }

    pub fn parent_set(&self, model: &ContentModel) -> Option<ContentModel> {
        self.inner.set_map.borrow().parent_set(model).cloned()
    }

    pub fn set_current_item(&self, item: HistoryItem) -> bool {
        self.mutate(|store| store.set_current_item(item))
    }

    /// Pushes the item and, when it shows an article, marks the article read.
    pub fn set_current_item_from_props(
        &self,
        props: ItemProps,
        entry_point: EntryPoint,
    ) -> AppResult<bool> {
        let changed = self.mutate(|store| store.set_current_item_from_props(props, entry_point))?;
        if changed {
            let article = self
                .current_item()
                .filter(|item| item.page_type() == PageType::Article && item.media_model().is_none())
                .and_then(|item| item.model().map(|model| model.id.clone()));
            if let Some(id) = article {
                self.mark_article_read(&id);
            }
        }
        Ok(changed)
    }

    pub fn set_current_subset(&self, model: ContentModel) -> bool {
        self.mutate(|store| store.set_current_subset(model))
    }

    pub fn close_lightbox(&self) -> bool {
        self.mutate(HistoryStore::close_lightbox)
    }

    pub fn do_search(&self, terms: &str, timestamp: u32) -> bool {
        self.mutate(|store| store.do_search(terms, timestamp))
    }

    pub fn go_back(&self) -> bool {
        self.mutate(HistoryStore::go_back)
    }

    pub fn go_forward(&self) -> bool {
        self.mutate(HistoryStore::go_forward)
    }

    /// Flags the current item as empty, e.g. a search with no results.
    pub fn mark_current_empty(&self) -> bool {
        self.mutate(HistoryStore::mark_current_empty)
    }

    /// Opens `media` over the current page.
    pub fn show_lightbox(
        &self,
        media: ContentModel,
        context: Vec<ContentModel>,
        entry_point: EntryPoint,
    ) -> AppResult<bool> {
        let current = self.current_item();
        let page_type = current
            .as_ref()
            .map_or(PageType::Home, HistoryItem::page_type);
        let mut props = ItemProps::page(page_type)
            .with_media_model(media)
            .with_context(context);
        props.model = current.and_then(|item| item.model().cloned());
        self.set_current_item_from_props(props, entry_point)
    }

    /// Resolves `id` and shows it as an article, a set or a lightbox.
    pub fn show_id(&self, id: impl Into<String>) {
        let id = id.into();
        self.defer("show_id", move |nav| {
            let model = nav.inner.engine.get_object(&id)?;
            match model.kind {
                ModelKind::Article => {
                    nav.set_current_item_from_props(
                        ItemProps::page(PageType::Article).with_model(model),
                        EntryPoint::ArticleLinkClicked,
                    )?;
                }
                ModelKind::Set => {
                    let label = model.title.clone();
                    nav.set_current_item_from_props(
                        ItemProps::page(PageType::Set)
                            .with_model(model)
                            .with_context_label(label),
                        EntryPoint::ArticleLinkClicked,
                    )?;
                }
                ModelKind::Media => {
                    let context = nav
                        .current_item()
                        .and_then(|item| item.model().cloned())
                        .map(|owner| nav.resolve_resources(&owner))
                        .unwrap_or_default();
                    nav.show_lightbox(model, context, EntryPoint::ArticleLinkClicked)?;
                }
            }
            Ok(())
        });
    }

    /// Opens an item requested by the desktop shell.
    pub fn load_dbus_item(&self, id: impl Into<String>, search_terms: Option<String>, timestamp: u32) {
        let id = id.into();
        self.defer("load_dbus_item", move |nav| {
            let model = nav.inner.engine.get_object(&id)?;
            let props = match model.kind {
                ModelKind::Article => ItemProps::page(PageType::Article)
                    .with_model(model)
                    .with_search_terms(search_terms.unwrap_or_default()),
                ModelKind::Set => {
                    let label = model.title.clone();
                    ItemProps::page(PageType::Set)
                        .with_model(model)
                        .with_context_label(label)
                }
                ModelKind::Media => {
                    tracing::debug!(id = %id, "shell asked for a media object; ignored");
                    return Ok(());
                }
            };
            nav.set_current_item_from_props(props.with_timestamp(timestamp), EntryPoint::DbusCall)?;
            Ok(())
        });
    }

    /// Makes the lowest-sequence child set of `set` the current subset.
    pub fn load_first_subset(&self, set: ContentModel) {
        self.defer("load_first_subset", move |nav| {
            let query = ContentQuery::first_subset_of(&set);
            let first = nav.inner.engine.query(&query)?.into_iter().next();
            match first {
                Some(subset) => {
                    nav.set_current_subset(subset);
                }
                None => tracing::debug!(set = %set.id, "set has no subsets"),
            }
            Ok(())
        });
    }

    fn handle(&self, action: &Action) -> AppResult<()> {
        let handled = self.inner.routes.route(self, action)?;
        if !handled {
            tracing::trace!(action = ?action.action_type(), "no route for action");
        }
        Ok(())
    }

    /// Runs `change` on the store, then notifies observers once the borrow
    /// is released.
    fn mutate<R>(&self, change: impl FnOnce(&mut HistoryStore) -> R) -> R {
        let (result, events) = {
            let mut store = self.inner.store.borrow_mut();
            let result = change(&mut store);
            (result, store.take_events())
        };
        self.notify(&events);
        result
    }

    fn notify(&self, events: &[HistoryEvent]) {
        if events.is_empty() {
            return;
        }
        let observers: Vec<(ObserverId, SharedObserver)> = self.inner.observers.borrow().clone();
        for event in events {
            for (id, observer) in &observers {
                let Ok(mut callback) = observer.try_borrow_mut() else {
                    tracing::warn!(observer = ?id, "observer is already running; skipping");
                    continue;
                };
                (&mut *callback)(event);
            }
        }
    }

    fn mark_article_read(&self, id: &str) {
        if let Err(err) = self.inner.reading.borrow_mut().mark_article_read(id) {
            tracing::warn!(article = %id, error = %err, "failed to record article as read");
        }
    }

    fn resolve_resources(&self, owner: &ContentModel) -> Vec<ContentModel> {
        owner
            .resources
            .iter()
            .filter_map(|id| match self.inner.engine.get_object(id) {
                Ok(model) => Some(model),
                Err(err) => {
                    tracing::debug!(resource = %id, error = %err, "skipping unresolved resource");
                    None
                }
            })
            .collect()
    }

    fn defer<F>(&self, operation: &'static str, work: F)
    where
        F: FnOnce(&Navigator) -> AppResult<()> + 'static,
    {
        let weak = Rc::downgrade(&self.inner);
        self.inner.dispatcher.main_loop().idle_add_once(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Err(err) = work(&Navigator { inner }) {
                tracing::warn!(operation, error = %err, "content request failed");
            }
        });
    }
}
