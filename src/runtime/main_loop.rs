use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleControl {
    Continue,
    Remove,
}

type IdleCallback = Box<dyn FnMut() -> IdleControl>;

struct IdleSource {
    id: SourceId,
    callback: IdleCallback,
}

#[derive(Default)]
struct LoopState {
    pending: VecDeque<IdleSource>,
    /// Sources taken out of `pending` by the running iteration.
    dispatching: HashSet<SourceId>,
    cancelled: HashSet<SourceId>,
    next_source_id: u64,
}

/// Single-threaded cooperative loop driving idle sources.
///
/// Every idle source runs on a later turn than the one that added it, so
/// work scheduled from inside a callback never nests inside that callback.
#[derive(Clone, Default)]
pub struct MainLoop {
    state: Rc<RefCell<LoopState>>,
}

impl MainLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idle_add<F>(&self, callback: F) -> SourceId
    where
        F: FnMut() -> IdleControl + 'static,
    {
        let mut state = self.state.borrow_mut();
        state.next_source_id += 1;
        let id = SourceId(state.next_source_id);
        state.pending.push_back(IdleSource {
            id,
            callback: Box::new(callback),
        });
        id
    }

    pub fn idle_add_once<F>(&self, callback: F) -> SourceId
    where
        F: FnOnce() + 'static,
    {
        let mut callback = Some(callback);
        self.idle_add(move || {
            if let Some(callback) = callback.take() {
                callback();
            }
            IdleControl::Remove
        })
    }

    /// Returns false when `id` is unknown or already removed.
    pub fn source_remove(&self, id: SourceId) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            if let Some(position) = state.pending.iter().position(|source| source.id == id) {
                state.pending.remove(position)
            } else {
                return state.dispatching.contains(&id) && state.cancelled.insert(id);
            }
        };
        drop(removed);
        true
    }

    pub fn pending(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    pub fn pending_sources(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Runs every source pending at the start of the call once.
    ///
    /// Returns false when nothing was pending.
    pub fn iteration(&self) -> bool {
        let ready: Vec<IdleSource> = {
            let mut state = self.state.borrow_mut();
            let ready: Vec<IdleSource> = state.pending.drain(..).collect();
            let ids: Vec<SourceId> = ready.iter().map(|source| source.id).collect();
            state.dispatching.extend(ids);
            ready
        };
        if ready.is_empty() {
            return false;
        }

        let mut survivors = Vec::new();
        for mut source in ready {
            let skip = self.state.borrow().cancelled.contains(&source.id);
            let control = if skip {
                IdleControl::Remove
            } else {
                (source.callback)()
            };

            let keep = {
                let mut state = self.state.borrow_mut();
                state.dispatching.remove(&source.id);
                let cancelled = state.cancelled.remove(&source.id);
                control == IdleControl::Continue && !cancelled
            };
            if keep {
                survivors.push(source);
            }
        }

        let mut state = self.state.borrow_mut();
        for source in survivors.into_iter().rev() {
            state.pending.push_front(source);
        }
        true
    }

    pub fn run_until_idle(&self) {
        while self.iteration() {}
    }
}
