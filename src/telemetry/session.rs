//! Connection lifecycle of one remote client.
//!
//! The live `connected` flag follows the transport callbacks (via
//! [`LinkEvent`](crate::events::LinkEvent)s).  Each change of that flag is
//! queued as a [`LinkTransition`] so the loop can run the side effects
//! (beep, message, re-advertise) once per edge, in arrival order, even if
//! the client bounced several times inside one iteration.
//!
//! ```text
//!            connect                      disconnect
//! Disconnected ───────▶ Connected ─────────────────▶ Disconnected
//!                          │ ▲                           │
//!                          └─┘ one update per tick       └─▶ restart advertising
//! ```

use heapless::Deque;
use log::{info, warn};

const PENDING_CAP: usize = 16;

/// One announced edge of the connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    Connected,
    Disconnected,
}

impl LinkTransition {
    /// Text shown on the display when the edge is announced.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Connected => "Connected!",
            Self::Disconnected => "Disconnected!",
        }
    }
}

#[derive(Debug)]
pub struct TelemetrySession {
    connected: bool,
    pending: Deque<LinkTransition, PENDING_CAP>,
    min_interval_ms: u32,
    last_sent_ms: Option<u32>,
}

impl TelemetrySession {
    pub fn new(min_interval_ms: u32) -> Self {
        Self {
            connected: false,
            pending: Deque::new(),
            min_interval_ms,
            last_sent_ms: None,
        }
    }

    /// Record the transport's current connection state.  Repeats of the
    /// same state are ignored.
    pub fn set_connected(&mut self, connected: bool) {
        if connected == self.connected {
            return;
        }
        self.connected = connected;
        if !connected {
            self.last_sent_ms = None;
        }

        let edge = if connected {
            LinkTransition::Connected
        } else {
            LinkTransition::Disconnected
        };
        if self.pending.push_back(edge).is_err() {
            warn!("link transition backlog full, dropped {:?}", edge);
        }
    }

    /// Oldest edge that has not been announced yet.
    pub fn next_transition(&mut self) -> Option<LinkTransition> {
        let edge = self.pending.pop_front()?;
        info!("client {:?}", edge);
        Some(edge)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether an update may go out at `now_ms`.
    pub fn send_due(&self, now_ms: u32) -> bool {
        if !self.connected {
            return false;
        }
        match self.last_sent_ms {
            None => true,
            Some(_) if self.min_interval_ms == 0 => true,
            Some(last) => now_ms.wrapping_sub(last) >= self.min_interval_ms,
        }
    }

    pub fn mark_sent(&mut self, now_ms: u32) {
        self.last_sent_ms = Some(now_ms);
    }
}
