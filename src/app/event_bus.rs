use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    Line(String),
    InputError(String),
}

/// Feeds stdin lines into the app loop. The channel closes at end of input.
pub struct EventBusRuntime {
    tasks: Vec<JoinHandle<()>>,
}

impl EventBusRuntime {
    pub fn spawn() -> (UnboundedReceiver<LoopEvent>, Self) {
        let (tx, rx) = unbounded_channel();
        let tasks = vec![spawn_stdin_task(tx)];
        (rx, Self { tasks })
    }

    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for EventBusRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_stdin_task(tx: UnboundedSender<LoopEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let event = match lines.next_line().await {
                Ok(Some(line)) => LoopEvent::Line(line),
                Ok(None) => return,
                Err(err) => LoopEvent::InputError(err.to_string()),
            };
            let failed = matches!(event, LoopEvent::InputError(_));
            if tx.send(event).is_err() || failed {
                return;
            }
        }
    })
}
