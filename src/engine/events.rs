use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::host::{Host, HostEvent};
use crate::io::kv_store::KeyValueStore;

use super::Engine;

/// Collects platform change notifications for the engine's loop.
pub struct EventPump {
    rx: Receiver<HostEvent>,
    debounce: Duration,
}

impl EventPump {
    pub fn new(rx: Receiver<HostEvent>, debounce: Duration) -> Self {
        EventPump { rx, debounce }
    }

    /// Non-blocking poll for queued events (may be empty).
    pub fn poll(&self) -> Vec<HostEvent> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for an event, then keep collecting until the
    /// feed has been quiet for the debounce window. Returns the whole burst.
    pub fn next_burst(&self, timeout: Duration) -> Vec<HostEvent> {
        let mut burst = match self.rx.recv_timeout(timeout) {
            Ok(event) => vec![event],
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return Vec::new(),
        };
        let mut quiet_since = Instant::now();
        while quiet_since.elapsed() < self.debounce {
            match self.rx.recv_timeout(self.debounce.saturating_sub(quiet_since.elapsed())) {
                Ok(event) => {
                    burst.push(event);
                    quiet_since = Instant::now();
                }
                Err(_) => break,
            }
        }
        burst
    }
}

impl<H: Host, S: KeyValueStore> Engine<H, S> {
    /// React to a batch of notifications with at most one refresh.
    /// Returns whether a refresh ran.
    pub fn handle_events<I>(&mut self, events: I) -> bool
    where
        I: IntoIterator<Item = HostEvent>,
    {
        let mut relevant = 0usize;
        let mut total = 0usize;
        for event in events {
            total += 1;
            if event.triggers_refresh() {
                relevant += 1;
            }
        }
        if relevant == 0 {
            return false;
        }
        debug!(total, relevant, "coalesced change events");
        self.refresh();
        true
    }

    /// Drain whatever is queued on the pump and react to it.
    pub fn pump(&mut self, pump: &EventPump) -> bool {
        self.handle_events(pump.poll())
    }
}
