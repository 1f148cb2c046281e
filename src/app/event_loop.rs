use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::event::{Direction, HistoryEvent};
use crate::history::HistoryItem;

use super::core::App;
use super::event_bus::{EventBusRuntime, LoopEvent};

/// One line of output: the item that just became current.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub index: usize,
    pub direction: Direction,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub item: HistoryItem,
}

impl ItemReport {
    pub fn from_event(event: &HistoryEvent) -> Option<Self> {
        match event {
            HistoryEvent::Changed {
                index,
                item,
                direction,
                can_go_back,
                can_go_forward,
            } => Some(Self {
                index: *index,
                direction: *direction,
                can_go_back: *can_go_back,
                can_go_forward: *can_go_forward,
                item: item.clone(),
            }),
            _ => None,
        }
    }
}

impl App {
    /// Reads JSON actions from stdin until end of input, writing a report
    /// line to `out` each time the current item changes.
    pub async fn run<W: Write>(&mut self, out: &mut W) -> AppResult<()> {
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reports);
        let observer = self.navigator().subscribe(move |event| {
            if let Some(report) = ItemReport::from_event(event) {
                sink.borrow_mut().push(report);
            }
        });

        let (mut rx, mut bus) = EventBusRuntime::spawn();
        let result = async {
            while let Some(event) = rx.recv().await {
                match event {
                    LoopEvent::Line(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if let Err(err) = self.dispatch_json(line) {
                            tracing::warn!(error = %err, "rejected input line");
                        }
                        let pending = std::mem::take(&mut *reports.borrow_mut());
                        write_reports(out, &pending)?;
                    }
                    LoopEvent::InputError(message) => {
                        return Err(AppError::io_with_context(
                            io::Error::other(message),
                            "failed to read stdin",
                        ));
                    }
                }
            }
            Ok::<(), AppError>(())
        }
        .await;

        bus.shutdown();
        self.navigator().unsubscribe(observer);
        self.shutdown();
        result
    }
}

pub(crate) fn write_reports<W: Write>(out: &mut W, reports: &[ItemReport]) -> AppResult<()> {
    for report in reports {
        let line = serde_json::to_string(report).map_err(|err| {
            AppError::invalid_argument(format!("cannot encode history item: {err}"))
        })?;
        writeln!(out, "{line}")
            .map_err(|err| AppError::io_with_context(err, "failed to write stdout"))?;
    }
    out.flush()
        .map_err(|err| AppError::io_with_context(err, "failed to flush stdout"))
}
