use std::sync::Arc;

use serde::Serialize;
use tauri::Emitter;

/// The single outbound channel the frontend subscribes to. Every backend
/// event — provisioning logs, download progress, game exit — flows through
/// it as one ordered stream of tagged variants.
pub const EVENT_CHANNEL: &str = "launcher-event";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LauncherEvent {
    Log {
        message: String,
    },
    Progress {
        total: usize,
        current: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        cached: bool,
    },
    Closed {
        code: Option<i32>,
    },
}

impl LauncherEvent {
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    pub fn progress(total: usize, current: usize, name: Option<String>, cached: bool) -> Self {
        Self::Progress {
            total,
            current,
            name,
            cached,
        }
    }

    pub fn closed(code: Option<i32>) -> Self {
        Self::Closed { code }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: LauncherEvent);
}

/// Shared handle used by long-running tasks (subprocess readers, the game
/// monitor) that outlive the command invocation that started them.
pub type SharedSink = Arc<dyn EventSink>;

/// Forwards events to the frontend over [`EVENT_CHANNEL`].
pub struct UiEventSink {
    app: tauri::AppHandle,
}

impl UiEventSink {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

impl EventSink for UiEventSink {
    fn emit(&self, event: LauncherEvent) {
        let _ = self.app.emit(EVENT_CHANNEL, event);
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Mutex;

    use super::{EventSink, LauncherEvent};

    /// Records every emitted event for assertions.
    #[derive(Default)]
    pub struct CollectingSink {
        events: Mutex<Vec<LauncherEvent>>,
    }

    impl CollectingSink {
        pub fn events(&self) -> Vec<LauncherEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn log_messages(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    LauncherEvent::Log { message } => Some(message),
                    _ => None,
                })
                .collect()
        }
    }

    impl EventSink for CollectingSink {
        fn emit(&self, event: LauncherEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
