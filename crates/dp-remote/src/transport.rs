//! Message transport between processors.
//!
//! [`RemoteEndpoint`] is the seam a real network transport would plug into;
//! the provided [`mailbox`] implementation is an in-process queue that still
//! bincode-encodes every envelope, so all wire types pass through the codec
//! on every send.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use dp_core::Pid;

use crate::error::{RemoteError, RemoteResult};
use crate::wire::Envelope;

/// A destination envelopes can be sent to.
pub trait RemoteEndpoint: Send + Sync {
    fn send(&self, envelope: Envelope) -> RemoteResult<()>;
}

struct Shared {
    pid: Pid,
    queue: Mutex<VecDeque<Vec<u8>>>,
    open: AtomicBool,
}

/// The sending half of an in-process mailbox.
pub struct MailboxEndpoint {
    shared: Arc<Shared>,
}

/// The receiving half; owned by the processor the mailbox belongs to.
pub struct Inbox {
    shared: Arc<Shared>,
}

/// Create a connected inbox/endpoint pair for `pid`.
pub fn mailbox(pid: Pid) -> (Inbox, MailboxEndpoint) {
    let shared = Arc::new(Shared {
        pid,
        queue: Mutex::new(VecDeque::new()),
        open: AtomicBool::new(true),
    });
    (Inbox { shared: Arc::clone(&shared) }, MailboxEndpoint { shared })
}

impl RemoteEndpoint for MailboxEndpoint {
    fn send(&self, envelope: Envelope) -> RemoteResult<()> {
        if !self.shared.open.load(Ordering::Acquire) {
            return Err(RemoteError::Unreachable { pid: self.shared.pid });
        }
        let bytes =
            bincode::serialize(&envelope).map_err(|e| RemoteError::Codec(e.to_string()))?;
        self.shared.queue.lock().push_back(bytes);
        Ok(())
    }
}

impl Inbox {
    /// Take and decode every queued envelope, in arrival order.
    pub fn drain(&self) -> RemoteResult<Vec<Envelope>> {
        let bytes: Vec<Vec<u8>> = self.shared.queue.lock().drain(..).collect();
        bytes
            .into_iter()
            .map(|b| bincode::deserialize(&b).map_err(|e| RemoteError::Codec(e.to_string())))
            .collect()
    }

    /// Refuse further sends.  Queued envelopes remain drainable.
    pub fn close(&self) {
        self.shared.open.store(false, Ordering::Release);
    }

    pub fn pid(&self) -> Pid {
        self.shared.pid
    }
}
