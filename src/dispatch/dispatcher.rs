use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::DispatcherConfig;
use crate::error::{AppError, AppResult};
use crate::runtime::{IdleControl, MainLoop, SourceId};

use super::action::{Action, ActionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription-{}", self.0)
    }
}

/// A consumer returned an error while an action was delivered to it.
#[derive(thiserror::Error, Debug)]
#[error("consumer {subscription} failed handling {action_type}")]
pub struct ConsumerError {
    pub subscription: SubscriptionId,
    pub action_type: ActionType,
    #[source]
    pub source: AppError,
}

type Consumer = Rc<RefCell<dyn FnMut(&Action) -> AppResult<()>>>;
type ErrorReporter = Rc<dyn Fn(&ConsumerError)>;

struct DispatcherState {
    consumers: Vec<(SubscriptionId, Consumer)>,
    queue: VecDeque<Action>,
    next_subscription_id: u64,
    started: bool,
    paused: bool,
    flush_source: Option<SourceId>,
    /// Bumped on every schedule so a superseded flush source retires itself.
    flush_generation: u64,
    batch_limit: usize,
    reporter: ErrorReporter,
}

impl DispatcherState {
    fn delivering(&self) -> bool {
        self.started && !self.paused
    }
}

/// Asynchronous action bus.
///
/// `dispatch` only enqueues. Queued actions are delivered from an idle source
/// on the owning [`MainLoop`], in submission order, each one to every consumer
/// registered at the moment it is delivered.
#[derive(Clone)]
pub struct Dispatcher {
    state: Rc<RefCell<DispatcherState>>,
    main_loop: MainLoop,
}

impl Dispatcher {
    pub fn new(main_loop: &MainLoop) -> Self {
        Self::with_config(main_loop, &DispatcherConfig::default())
    }

    pub fn with_config(main_loop: &MainLoop, config: &DispatcherConfig) -> Self {
        let state = DispatcherState {
            consumers: Vec::new(),
            queue: VecDeque::new(),
            next_subscription_id: 0,
            started: true,
            paused: false,
            flush_source: None,
            flush_generation: 0,
            batch_limit: config.batch_limit.max(1),
            reporter: Rc::new(report_to_log),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            main_loop: main_loop.clone(),
        }
    }

    pub fn register<F>(&self, consumer: F) -> SubscriptionId
    where
        F: FnMut(&Action) -> AppResult<()> + 'static,
    {
        let mut state = self.state.borrow_mut();
        state.next_subscription_id += 1;
        let id = SubscriptionId(state.next_subscription_id);
        state
            .consumers
            .push((id, Rc::new(RefCell::new(consumer)) as Consumer));
        tracing::trace!(subscription = %id, "consumer registered");
        id
    }

    /// Unknown or already-removed handles are ignored.
    pub fn unregister(&self, id: SubscriptionId) {
        let removed = {
            let mut state = self.state.borrow_mut();
            state
                .consumers
                .iter()
                .position(|(candidate, _)| *candidate == id)
                .map(|position| state.consumers.remove(position))
        };
        if removed.is_some() {
            tracing::trace!(subscription = %id, "consumer unregistered");
        }
    }

    pub fn dispatch(&self, action: Action) -> AppResult<()> {
        let action_type = action.require_type()?.clone();
        self.state.borrow_mut().queue.push_back(action);
        tracing::debug!(action = %action_type, "action queued");
        self.schedule_flush();
        Ok(())
    }

    pub fn start(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.started {
                return;
            }
            state.started = true;
        }
        self.schedule_flush();
    }

    pub fn stop(&self) {
        {
            let mut state = self.state.borrow_mut();
            if !state.started {
                return;
            }
            state.started = false;
        }
        self.cancel_flush();
    }

    pub fn pause(&self) {
        {
            let mut state = self.state.borrow_mut();
            if state.paused {
                return;
            }
            state.paused = true;
        }
        self.cancel_flush();
    }

    /// Undoes any number of consecutive `pause` calls. Delivery of the
    /// actions queued meanwhile happens on the next loop turn.
    pub fn resume(&self) {
        {
            let mut state = self.state.borrow_mut();
            if !state.paused {
                return;
            }
            state.paused = false;
        }
        self.schedule_flush();
    }

    /// Drops every consumer and every undelivered action.
    pub fn reset(&self) {
        let (consumers, queue) = {
            let mut state = self.state.borrow_mut();
            (
                std::mem::take(&mut state.consumers),
                std::mem::take(&mut state.queue),
            )
        };
        self.cancel_flush();
        tracing::debug!(
            consumers = consumers.len(),
            discarded = queue.len(),
            "dispatcher reset"
        );
    }

    pub fn set_error_reporter<F>(&self, reporter: F)
    where
        F: Fn(&ConsumerError) + 'static,
    {
        self.state.borrow_mut().reporter = Rc::new(reporter);
    }

    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.state
            .borrow()
            .consumers
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn consumer_count(&self) -> usize {
        self.state.borrow().consumers.len()
    }

    pub fn queued_len(&self) -> usize {
        self.state.borrow().queue.len()
    }

    pub fn is_started(&self) -> bool {
        self.state.borrow().started
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    pub fn main_loop(&self) -> &MainLoop {
        &self.main_loop
    }

    fn schedule_flush(&self) {
        let generation = {
            let mut state = self.state.borrow_mut();
            if !state.delivering() || state.queue.is_empty() || state.flush_source.is_some() {
                return;
            }
            state.flush_generation += 1;
            state.flush_generation
        };

        let weak = Rc::downgrade(&self.state);
        let source = self.main_loop.idle_add(move || flush(&weak, generation));
        self.state.borrow_mut().flush_source = Some(source);
    }

    fn cancel_flush(&self) {
        let source = self.state.borrow_mut().flush_source.take();
        if let Some(source) = source {
            self.main_loop.source_remove(source);
        }
    }
}

fn flush(weak: &Weak<RefCell<DispatcherState>>, generation: u64) -> IdleControl {
    let Some(shared) = weak.upgrade() else {
        return IdleControl::Remove;
    };

    let mut delivered = 0;
    loop {
        let (action, consumers, reporter) = {
            let mut state = shared.borrow_mut();
            if state.flush_generation != generation {
                return IdleControl::Remove;
            }
            if !state.delivering() {
                state.flush_source = None;
                return IdleControl::Remove;
            }
            if delivered >= state.batch_limit && !state.queue.is_empty() {
                return IdleControl::Continue;
            }
            match state.queue.pop_front() {
                Some(action) => (action, state.consumers.clone(), Rc::clone(&state.reporter)),
                None => {
                    state.flush_source = None;
                    return IdleControl::Remove;
                }
            }
        };

        deliver(&action, &consumers, &*reporter);
        delivered += 1;
    }
}

fn deliver(
    action: &Action,
    consumers: &[(SubscriptionId, Consumer)],
    reporter: &dyn Fn(&ConsumerError),
) {
    let Some(action_type) = action.action_type() else {
        return;
    };
    for (id, consumer) in consumers {
        let Ok(mut callback) = consumer.try_borrow_mut() else {
            tracing::warn!(
                subscription = %id,
                action = %action_type,
                "consumer is already running; skipping"
            );
            continue;
        };
        if let Err(source) = (&mut *callback)(action) {
            reporter(&ConsumerError {
                subscription: *id,
                action_type: action_type.clone(),
                source,
            });
        }
    }
}

fn report_to_log(err: &ConsumerError) {
    tracing::error!(
        subscription = %err.subscription,
        action = %err.action_type,
        error = %err.source,
        "unhandled error in action consumer"
    );
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::config::DispatcherConfig;
    use crate::error::AppError;
    use crate::runtime::MainLoop;

    use crate::dispatch::{Action, ActionType};

    use super::{ConsumerError, Dispatcher};

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(dispatcher: &Dispatcher, tag: &'static str, log: &Log) {
        let log = Rc::clone(log);
        dispatcher.register(move |action| {
            let name = action.action_type().map(|t| t.to_string()).unwrap_or_default();
            log.borrow_mut().push(format!("{tag}:{name}"));
            Ok(())
        });
    }

    fn other(name: &str) -> Action {
        Action::new(ActionType::Other(name.to_string()))
    }

    #[test]
    fn delivers_every_action_to_every_consumer_in_order() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let log: Log = Rc::default();
        recorder(&dispatcher, "a", &log);
        recorder(&dispatcher, "b", &log);

        dispatcher.dispatch(other("foo")).expect("dispatch should succeed");
        dispatcher.dispatch(other("bar")).expect("dispatch should succeed");
        assert!(log.borrow().is_empty(), "delivery must not be synchronous");

        main_loop.run_until_idle();
        assert_eq!(*log.borrow(), vec!["a:foo", "b:foo", "a:bar", "b:bar"]);
    }

    #[test]
    fn dispatch_without_type_fails_synchronously() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);

        let err = dispatcher
            .dispatch(Action::untyped())
            .expect_err("untyped action should fail");
        assert!(matches!(err, AppError::InvalidAction(_)));
        assert_eq!(dispatcher.queued_len(), 0);
        assert!(!main_loop.pending());
    }

    #[test]
    fn unregistered_consumer_receives_nothing() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let log: Log = Rc::default();
        let id = {
            let log = Rc::clone(&log);
            dispatcher.register(move |_| {
                log.borrow_mut().push("called".to_string());
                Ok(())
            })
        };
        dispatcher.unregister(id);
        dispatcher.unregister(id);

        dispatcher.dispatch(other("foo")).expect("dispatch should succeed");
        main_loop.run_until_idle();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn consumer_registered_before_delivery_still_receives_action() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let log: Log = Rc::default();

        dispatcher.dispatch(other("foo")).expect("dispatch should succeed");
        recorder(&dispatcher, "late", &log);
        main_loop.run_until_idle();

        assert_eq!(*log.borrow(), vec!["late:foo"]);
    }

    #[test]
    fn consumer_added_during_delivery_misses_current_action() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let log: Log = Rc::default();
        {
            let inner = dispatcher.clone();
            let log = Rc::clone(&log);
            let mut added = false;
            dispatcher.register(move |_| {
                if !added {
                    added = true;
                    recorder(&inner, "added", &log);
                }
                Ok(())
            });
        }

        dispatcher.dispatch(other("first")).expect("dispatch should succeed");
        dispatcher.dispatch(other("second")).expect("dispatch should succeed");
        main_loop.run_until_idle();

        assert_eq!(*log.borrow(), vec!["added:second"]);
    }

    #[test]
    fn actions_dispatched_from_a_consumer_are_delivered_later() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let log: Log = Rc::default();
        {
            let inner = dispatcher.clone();
            dispatcher.register(move |action| {
                if action.action_type() == Some(&ActionType::Other("ping".to_string())) {
                    inner.dispatch(other("pong"))?;
                }
                Ok(())
            });
        }
        recorder(&dispatcher, "r", &log);

        dispatcher.dispatch(other("ping")).expect("dispatch should succeed");
        dispatcher.dispatch(other("tail")).expect("dispatch should succeed");
        main_loop.run_until_idle();

        assert_eq!(*log.borrow(), vec!["r:ping", "r:tail", "r:pong"]);
    }

    #[test]
    fn failing_consumer_is_reported_and_does_not_stop_others() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let reported: Rc<RefCell<Vec<String>>> = Rc::default();
        {
            let reported = Rc::clone(&reported);
            dispatcher.set_error_reporter(move |err: &ConsumerError| {
                reported.borrow_mut().push(err.action_type.to_string());
            });
        }
        dispatcher.register(|_| Err(AppError::invalid_argument("boom")));
        let log: Log = Rc::default();
        recorder(&dispatcher, "ok", &log);

        dispatcher.dispatch(other("foo")).expect("dispatch should succeed");
        dispatcher.dispatch(other("bar")).expect("dispatch should succeed");
        main_loop.run_until_idle();

        assert_eq!(*reported.borrow(), vec!["foo", "bar"]);
        assert_eq!(*log.borrow(), vec!["ok:foo", "ok:bar"]);
    }

    #[test]
    fn reset_drops_consumers_and_pending_actions() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let log: Log = Rc::default();
        recorder(&dispatcher, "old", &log);
        dispatcher.dispatch(other("foo")).expect("dispatch should succeed");

        dispatcher.reset();
        recorder(&dispatcher, "new", &log);
        main_loop.run_until_idle();

        assert!(log.borrow().is_empty());
        assert_eq!(dispatcher.consumer_count(), 1);
        assert_eq!(dispatcher.queued_len(), 0);
    }

    #[test]
    fn paused_dispatcher_holds_actions_until_resume() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let log: Log = Rc::default();
        recorder(&dispatcher, "r", &log);

        dispatcher.pause();
        dispatcher.pause();
        dispatcher.dispatch(other("foo")).expect("dispatch should succeed");
        dispatcher.dispatch(other("bar")).expect("dispatch should succeed");
        main_loop.run_until_idle();
        assert!(log.borrow().is_empty());
        assert_eq!(dispatcher.queued_len(), 2);

        dispatcher.resume();
        assert!(log.borrow().is_empty(), "resume must not deliver synchronously");
        main_loop.run_until_idle();
        assert_eq!(*log.borrow(), vec!["r:foo", "r:bar"]);
        assert!(!dispatcher.is_paused());
    }

    #[test]
    fn repeated_start_then_single_stop_halts_delivery() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let log: Log = Rc::default();
        recorder(&dispatcher, "r", &log);

        dispatcher.start();
        dispatcher.start();
        dispatcher.dispatch(other("foo")).expect("dispatch should succeed");
        assert_eq!(main_loop.pending_sources(), 1);
        dispatcher.stop();
        assert_eq!(main_loop.pending_sources(), 0);

        dispatcher.dispatch(other("bar")).expect("dispatch should succeed");
        main_loop.run_until_idle();
        assert!(log.borrow().is_empty());
        assert_eq!(dispatcher.queued_len(), 2);

        dispatcher.start();
        main_loop.run_until_idle();
        assert_eq!(*log.borrow(), vec!["r:foo", "r:bar"]);
    }

    #[test]
    fn pause_from_a_consumer_stops_the_remaining_batch() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let log: Log = Rc::default();
        recorder(&dispatcher, "r", &log);
        {
            let inner = dispatcher.clone();
            dispatcher.register(move |_| {
                inner.pause();
                Ok(())
            });
        }

        dispatcher.dispatch(other("one")).expect("dispatch should succeed");
        dispatcher.dispatch(other("two")).expect("dispatch should succeed");
        main_loop.run_until_idle();
        assert_eq!(*log.borrow(), vec!["r:one"]);

        dispatcher.resume();
        main_loop.run_until_idle();
        assert_eq!(*log.borrow(), vec!["r:one", "r:two"]);
    }

    #[test]
    fn batch_limit_spreads_delivery_over_turns_in_order() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::with_config(&main_loop, &DispatcherConfig { batch_limit: 2 });
        let log: Log = Rc::default();
        recorder(&dispatcher, "r", &log);

        for name in ["1", "2", "3"] {
            dispatcher.dispatch(other(name)).expect("dispatch should succeed");
        }
        main_loop.iteration();
        assert_eq!(*log.borrow(), vec!["r:1", "r:2"]);
        main_loop.iteration();
        assert_eq!(*log.borrow(), vec!["r:1", "r:2", "r:3"]);
        assert!(!main_loop.pending());
    }

    #[test]
    fn subscription_ids_follow_registration_order() {
        let main_loop = MainLoop::new();
        let dispatcher = Dispatcher::new(&main_loop);
        let first = dispatcher.register(|_| Ok(()));
        let second = dispatcher.register(|_| Ok(()));
        let third = dispatcher.register(|_| Ok(()));
        dispatcher.unregister(second);

        assert_eq!(dispatcher.subscription_ids(), vec![first, third]);
    }
}
