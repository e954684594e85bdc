use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

impl QueryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<String>,
    pub generation: u64,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            generation: 0,
        }
    }
}

impl<T> QueryState<T> {
    pub fn is_pending(&self) -> bool {
        self.status == QueryStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied,
    Superseded,
}

impl Settlement {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

// The generation check and the write happen under the same channel lock.
#[derive(Debug)]
pub struct QueryCell<T> {
    state: watch::Sender<QueryState<T>>,
}

impl<T> Default for QueryCell<T> {
    fn default() -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self { state }
    }
}

impl<T: Clone> QueryCell<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    pub fn begin(&self, keep_data: bool) -> RequestTicket {
        let mut generation = 0;
        self.state.send_modify(|state| {
            state.generation += 1;
            state.status = QueryStatus::Pending;
            state.error = None;
            if !keep_data {
                state.data = None;
            }
            generation = state.generation;
        });

        RequestTicket { generation }
    }

    pub fn succeed(&self, ticket: RequestTicket, data: T) -> Settlement {
        self.settle(ticket, QueryStatus::Success, Some(data), None)
    }

    pub fn fail(
        &self,
        ticket: RequestTicket,
        message: Option<String>,
        data: Option<T>,
    ) -> Settlement {
        self.settle(ticket, QueryStatus::Error, data, message)
    }

    pub fn reject(&self, message: String) {
        self.state.send_modify(|state| {
            state.generation += 1;
            state.status = QueryStatus::Error;
            state.data = None;
            state.error = Some(message);
        });
    }

    fn settle(
        &self,
        ticket: RequestTicket,
        status: QueryStatus,
        data: Option<T>,
        error: Option<String>,
    ) -> Settlement {
        let applied = self.state.send_if_modified(|state| {
            if state.generation != ticket.generation {
                return false;
            }
            state.status = status;
            state.data = data;
            state.error = error;
            true
        });

        if applied {
            Settlement::Applied
        } else {
            tracing::debug!(
                generation = ticket.generation,
                "discarding settlement for superseded request"
            );
            Settlement::Superseded
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorSlot {
    message: Arc<watch::Sender<Option<String>>>,
}

impl Default for ErrorSlot {
    fn default() -> Self {
        let (message, _) = watch::channel(None);
        Self {
            message: Arc::new(message),
        }
    }
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.message.borrow().clone()
    }

    pub fn set(&self, message: String) {
        self.message.send_replace(Some(message));
    }

    pub fn clear(&self) {
        self.message.send_if_modified(|current| current.take().is_some());
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.message.subscribe()
    }
}
