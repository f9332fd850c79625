//! Scripted transport for pump and bridge tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use super::{Connector, Transport, TransportOptions};
use crate::config::Endpoint;
use crate::error::TransportError;

/// One scripted step on the receive side.
#[derive(Debug, Clone)]
pub(crate) enum IngestEvent {
    /// Poll reports readable; the next receive delivers these bytes
    /// (clamped to the caller's buffer).
    Deliver(Vec<u8>),
    /// Poll reports "nothing yet" this many times.
    Quiet(u32),
    /// Poll fails.
    PollError(&'static str),
    /// Poll reports readable, then the receive fails.
    RecvError(&'static str),
}

/// One scripted step on the send side.
#[derive(Debug, Clone)]
pub(crate) enum SendStep {
    /// Accept at most this many bytes (a partial send when smaller than
    /// the chunk offered).
    Accept(usize),
    /// The send fails.
    Fail(&'static str),
}

/// A transport whose behavior is fully scripted by the test.
///
/// With an exhausted ingest script, polls report "nothing yet" forever
/// (after sleeping the poll timeout, so a cancelled pump does not spin hot).
/// With an exhausted send plan, sends accept everything offered.
#[derive(Debug)]
pub(crate) struct MockTransport {
    events: Mutex<VecDeque<IngestEvent>>,
    send_plan: Mutex<VecDeque<SendStep>>,
    sent: Mutex<Vec<Vec<u8>>>,
    closed: AtomicBool,
}

impl MockTransport {
    pub(crate) fn scripted(events: Vec<IngestEvent>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events.into()),
            send_plan: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn sink(plan: Vec<SendStep>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(VecDeque::new()),
            send_plan: Mutex::new(plan.into()),
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Byte payloads accepted by `send`, in order.
    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.sent).clone()
    }

    /// Lengths of the payloads accepted by `send`, in order.
    pub(crate) fn sent_lens(&self) -> Vec<usize> {
        lock(&self.sent).iter().map(Vec::len).collect()
    }

    /// All accepted bytes concatenated, in order.
    pub(crate) fn sent_concat(&self) -> Vec<u8> {
        lock(&self.sent).concat()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Transport for MockTransport {
    fn poll_readable(&self, timeout: Duration) -> Result<bool, TransportError> {
        let mut events = lock(&self.events);
        loop {
            match events.front_mut() {
                Some(IngestEvent::Deliver(_) | IngestEvent::RecvError(_)) => return Ok(true),
                Some(IngestEvent::Quiet(0)) => {
                    events.pop_front();
                }
                Some(IngestEvent::Quiet(n)) => {
                    *n -= 1;
                    thread::sleep(timeout.min(Duration::from_millis(2)));
                    return Ok(false);
                }
                Some(IngestEvent::PollError(detail)) => {
                    let detail = *detail;
                    events.pop_front();
                    return Err(TransportError::poll(detail));
                }
                None => {
                    drop(events);
                    thread::sleep(timeout);
                    return Ok(false);
                }
            }
        }
    }

    fn receive(&self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut events = lock(&self.events);
        match events.pop_front() {
            Some(IngestEvent::Deliver(data)) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(len)
            }
            Some(IngestEvent::RecvError(detail)) => Err(TransportError::receive(detail)),
            other => {
                if let Some(event) = other {
                    events.push_front(event);
                }
                Err(TransportError::receive("receive without a pending packet"))
            }
        }
    }

    fn send(&self, data: &[u8]) -> Result<usize, TransportError> {
        let step = lock(&self.send_plan).pop_front();
        match step {
            None => {
                lock(&self.sent).push(data.to_vec());
                Ok(data.len())
            }
            Some(SendStep::Accept(limit)) => {
                let len = limit.min(data.len());
                lock(&self.sent).push(data[..len].to_vec());
                Ok(len)
            }
            Some(SendStep::Fail(detail)) => Err(TransportError::send(detail)),
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Connector handing out a pre-built mock, recording the options it saw.
pub(crate) struct MockConnector {
    transport: Arc<MockTransport>,
    pub(crate) seen_options: Mutex<Option<TransportOptions>>,
}

impl MockConnector {
    pub(crate) fn new(transport: Arc<MockTransport>) -> Self {
        Self {
            transport,
            seen_options: Mutex::new(None),
        }
    }
}

impl Connector for MockConnector {
    fn connect(
        &self,
        _endpoint: &Endpoint,
        options: &TransportOptions,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        *lock(&self.seen_options) = Some(options.clone());
        Ok(Arc::clone(&self.transport) as Arc<dyn Transport>)
    }
}

/// Connector that always fails, for open-failure paths.
pub(crate) struct FailingConnector;

impl Connector for FailingConnector {
    fn connect(
        &self,
        endpoint: &Endpoint,
        _options: &TransportOptions,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        Err(TransportError::connect(format!(
            "no route to {endpoint}"
        )))
    }
}
