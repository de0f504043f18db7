//! Callback → driving-loop event hand-off.
//!
//! Transport callbacks (BLE connect/disconnect, inbound writes) run in the
//! platform stack's task and must never block or do real work.  They push a
//! [`LinkEvent`] into a bounded queue; the driving loop drains it once per
//! iteration and does everything else.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │ GAP connect      │────▶│ edge FIFO (16)       │     │                  │
//! │ GAP disconnect   │────▶│ + latched link state │────▶│  AnalyzerService │
//! │ Calibrate write  │────▶│ calibration counter  │     │  ::tick()        │
//! └──────────────────┘     └──────────────────────┘     └──────────────────┘
//! ```
//!
//! Connect/disconnect edges keep their arrival order, so a disconnect
//! followed by a reconnect inside one loop iteration still produces two
//! edges.  The latest link state is latched outside the FIFO: if edges are
//! dropped, draining ends with one synthesised edge towards that state, so
//! the loop always converges on the real connection state.
//!
//! Calibration requests never take FIFO slots.  They are counted
//! (saturating) and handed out after the pending edges.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

/// Maximum number of undrained connect/disconnect edges.
const LINK_QUEUE_CAP: usize = 16;

/// Things the outside world can tell the driving loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// A client connected to the telemetry transport.
    ClientConnected,
    /// The client went away.
    ClientDisconnected,
    /// A remote write asked for a recalibration.
    CalibrationRequested,
}

impl LinkEvent {
    const fn for_link_state(connected: bool) -> Self {
        if connected {
            Self::ClientConnected
        } else {
            Self::ClientDisconnected
        }
    }
}

struct Pending {
    edges: Deque<LinkEvent, LINK_QUEUE_CAP>,
    /// Link state as last reported by the transport.
    connected: bool,
    /// Link state as of the last edge handed to the loop.
    delivered_connected: bool,
    calibrations: u8,
}

impl Pending {
    const fn new() -> Self {
        Self {
            edges: Deque::new(),
            connected: false,
            delivered_connected: false,
            calibrations: 0,
        }
    }

    fn push(&mut self, event: LinkEvent) -> bool {
        match event {
            LinkEvent::CalibrationRequested => match self.calibrations.checked_add(1) {
                Some(n) => {
                    self.calibrations = n;
                    true
                }
                None => false,
            },
            LinkEvent::ClientConnected | LinkEvent::ClientDisconnected => {
                self.connected = event == LinkEvent::ClientConnected;
                self.edges.push_back(event).is_ok()
            }
        }
    }

    fn pop(&mut self) -> Option<LinkEvent> {
        if let Some(edge) = self.edges.pop_front() {
            self.delivered_connected = edge == LinkEvent::ClientConnected;
            return Some(edge);
        }
        if self.delivered_connected != self.connected {
            self.delivered_connected = self.connected;
            return Some(LinkEvent::for_link_state(self.connected));
        }
        if self.calibrations > 0 {
            self.calibrations -= 1;
            return Some(LinkEvent::CalibrationRequested);
        }
        None
    }

    fn len(&self) -> usize {
        let resync = self.edges.is_empty() && self.delivered_connected != self.connected;
        self.edges.len() + usize::from(resync) + usize::from(self.calibrations)
    }
}

/// Bounded hand-off shared between callbacks (producers) and the loop
/// (consumer).
pub struct LinkEventQueue {
    inner: Mutex<RefCell<Pending>>,
}

impl LinkEventQueue {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Pending::new())),
        }
    }

    /// Push an event.  Safe from callback context (short critical section).
    ///
    /// Returns `false` if the event could not be stored on its own: a full
    /// edge FIFO (the link state is still latched) or a saturated
    /// calibration counter.
    pub fn push(&self, event: LinkEvent) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).push(event))
    }

    /// Next event for the loop: pending edges oldest first, then a resync
    /// edge if edges were lost, then calibration requests.
    pub fn pop(&self) -> Option<LinkEvent> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop())
    }

    /// Drain all pending events into a callback, in [`pop`](Self::pop) order.
    pub fn drain(&self, mut handler: impl FnMut(LinkEvent)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }
}

impl Default for LinkEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide queue the platform callbacks write into.
pub static LINK_EVENTS: LinkEventQueue = LinkEventQueue::new();

/// Push into [`LINK_EVENTS`].  Callback-safe.
pub fn push_link_event(event: LinkEvent) -> bool {
    let accepted = LINK_EVENTS.push(event);
    if !accepted {
        log::warn!("link event queue full, dropped {:?}", event);
    }
    accepted
}
