//! Control-Change state and per-CC callback dispatch.
//!
//! The transport thread only enqueues parsed messages through a
//! [`CcSender`]; the main loop drains the queue with [`MidiRouter::pump`], so
//! callbacks always run on the thread that owns the visualizations.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Highest valid CC number and value.
pub const CC_MAX: u8 = 127;

/// Capacity of the transport-to-main-loop queue.
const QUEUE_CAPACITY: usize = 1024;

/// Callback invoked with `(cc_number, value, channel)`.
pub type CcCallback = Box<dyn FnMut(u8, u8, u8) + Send>;

/// A parsed Control-Change message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcMessage {
    pub cc: u8,
    pub value: u8,
    pub channel: u8,
}

/// Producer side of the router queue, handed to the MIDI transport.
#[derive(Debug, Clone)]
pub struct CcSender {
    sender: Sender<CcMessage>,
}

impl CcSender {
    /// Enqueue a message without blocking. Returns `false` if it was dropped.
    pub fn send(&self, message: CcMessage) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                log::debug!("MIDI queue full, dropping CC{}={}", message.cc, message.value);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Messages waiting for their callbacks, and whether a call is running them.
#[derive(Default)]
struct Dispatch {
    queue: VecDeque<CcMessage>,
    running: bool,
}

/// Latest CC values plus the callback table.
///
/// Callbacks never run concurrently. Whichever `on_cc` call finds no
/// dispatch in progress runs callbacks until the queue is empty; calls
/// made meanwhile, from other threads or from inside a callback, queue
/// their message for it.
pub struct MidiRouter {
    values: Mutex<[Option<u8>; 128]>,
    last_cc: Mutex<Option<(u8, u8)>>,
    callbacks: Mutex<HashMap<u8, Vec<CcCallback>>>,
    dispatch: Mutex<Dispatch>,
    device: Mutex<Option<String>>,
    sender: Sender<CcMessage>,
    receiver: Receiver<CcMessage>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MidiRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiRouter {
    /// Create a router with no device and no received values.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(QUEUE_CAPACITY);
        Self {
            values: Mutex::new([None; 128]),
            last_cc: Mutex::new(None),
            callbacks: Mutex::new(HashMap::new()),
            dispatch: Mutex::new(Dispatch::default()),
            device: Mutex::new(None),
            sender,
            receiver,
        }
    }

    /// Handle for the transport thread.
    pub fn sender(&self) -> CcSender {
        CcSender {
            sender: self.sender.clone(),
        }
    }

    /// Dispatch every queued message. Returns how many were handled.
    pub fn pump(&self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.receiver.try_recv() {
            self.on_cc(message.cc, message.value, message.channel);
            handled += 1;
        }
        handled
    }

    /// Record a CC value and fire its callbacks in registration order.
    ///
    /// When a dispatch is already running, the callbacks fire from it
    /// before it returns rather than from this call.
    pub fn on_cc(&self, cc: u8, value: u8, channel: u8) {
        if cc > CC_MAX {
            log::debug!("Ignoring out-of-range CC number {cc}");
            return;
        }
        let value = value.min(CC_MAX);

        lock(&self.values)[cc as usize] = Some(value);
        *lock(&self.last_cc) = Some((cc, value));
        log::debug!("CC{cc}={value} (channel {channel})");

        {
            let mut dispatch = lock(&self.dispatch);
            dispatch.queue.push_back(CcMessage { cc, value, channel });
            if dispatch.running {
                return;
            }
            dispatch.running = true;
        }
        self.run_dispatch();
    }

    /// Fire callbacks for queued messages until none are left, then stop
    /// running under the same lock so no message is stranded.
    fn run_dispatch(&self) {
        loop {
            let message = {
                let mut dispatch = lock(&self.dispatch);
                match dispatch.queue.pop_front() {
                    Some(message) => message,
                    None => {
                        dispatch.running = false;
                        return;
                    }
                }
            };
            self.fire(message);
        }
    }

    fn fire(&self, CcMessage { cc, value, channel }: CcMessage) {
        // Run the handlers without holding the table lock so they may register more.
        let mut handlers = match lock(&self.callbacks).remove(&cc) {
            Some(handlers) => handlers,
            None => return,
        };
        for handler in handlers.iter_mut() {
            handler(cc, value, channel);
        }

        let mut callbacks = lock(&self.callbacks);
        if let Some(added) = callbacks.remove(&cc) {
            handlers.extend(added);
        }
        callbacks.insert(cc, handlers);
    }

    /// Last value received for `cc`, or `default`.
    pub fn get_cc(&self, cc: u8, default: u8) -> u8 {
        if cc > CC_MAX {
            return default;
        }
        lock(&self.values)[cc as usize].unwrap_or(default)
    }

    /// Append a callback for `cc`. Handlers are never deduplicated or removed.
    pub fn register_cc_callback<F>(&self, cc: u8, handler: F)
    where
        F: FnMut(u8, u8, u8) + Send + 'static,
    {
        lock(&self.callbacks)
            .entry(cc)
            .or_default()
            .push(Box::new(handler));
    }

    /// Number of callbacks registered for `cc`.
    pub fn callback_count(&self, cc: u8) -> usize {
        lock(&self.callbacks).get(&cc).map_or(0, Vec::len)
    }

    /// Most recent `(cc, value)` pair.
    pub fn last_cc(&self) -> Option<(u8, u8)> {
        *lock(&self.last_cc)
    }

    /// Name of the connected input port.
    pub fn device(&self) -> Option<String> {
        lock(&self.device).clone()
    }

    pub fn set_device(&self, name: Option<String>) {
        *lock(&self.device) = name;
    }
}

/// Map a CC value onto `min..=max`, clamping the input to 0-127 first.
pub fn scale_cc(value: f32, min: f32, max: f32) -> f32 {
    let value = value.clamp(0.0, CC_MAX as f32);
    min + (value / CC_MAX as f32) * (max - min)
}
