// event.rs
use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};

pub enum Event {
    Tick,
    Input(KeyEvent),
    Mouse(MouseEvent),
    Resize,
}

/// Reads terminal events on a background thread. State is only ever mutated
/// by the receiver on the main thread.
pub struct EventHandler {
    receiver: Receiver<Event>,
    #[allow(dead_code)]
    event_thread: thread::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> EventHandler {
        let (sender, receiver) = mpsc::channel();
        let event_thread = thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or_else(|| Duration::from_secs(0));

                let polled = match event::poll(timeout) {
                    Ok(polled) => polled,
                    Err(e) => {
                        log::error!("Unable to poll for terminal events: {}", e);
                        break;
                    }
                };
                if polled {
                    let forwarded = match event::read() {
                        // Key releases are reported on some platforms; only presses matter.
                        Ok(CrosstermEvent::Key(e)) if e.kind == KeyEventKind::Press => {
                            Some(Event::Input(e))
                        }
                        Ok(CrosstermEvent::Mouse(e)) => Some(Event::Mouse(e)),
                        Ok(CrosstermEvent::Resize(_, _)) => Some(Event::Resize),
                        Ok(_) => None,
                        Err(e) => {
                            log::error!("Unable to read terminal event: {}", e);
                            break;
                        }
                    };
                    if let Some(event) = forwarded {
                        if sender.send(event).is_err() {
                            break;
                        }
                    }
                }

                // If enough time has passed, send a `Tick` event.
                if last_tick.elapsed() >= tick_rate {
                    if sender.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });
        EventHandler {
            receiver,
            event_thread,
        }
    }

    /// Next event, or `None` if nothing arrived within `timeout`.
    pub fn next(&self, timeout: Duration) -> Result<Option<Event>, RecvTimeoutError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
