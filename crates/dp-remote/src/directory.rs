//! The name registry processors find each other through.
//!
//! Names are plain strings so the directory stays agnostic of what it binds;
//! the conventional processor name is produced by [`processor_name`].  The
//! directory is cheaply clonable and shared across every processor in a
//! cluster.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use dp_core::Pid;

use crate::error::{RemoteError, RemoteResult};
use crate::transport::RemoteEndpoint;

/// The registry name a partition's processor binds under.
pub fn processor_name(pid: Pid) -> String {
    format!("<Processor {}>", pid.0)
}

/// Shared name → endpoint registry.
#[derive(Clone, Default)]
pub struct Directory {
    entries: Arc<Mutex<HashMap<String, Arc<dyn RemoteEndpoint>>>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to an endpoint.  Rebinding a live name is refused; unbind
    /// first.
    pub fn bind(&self, name: &str, endpoint: Arc<dyn RemoteEndpoint>) -> RemoteResult<()> {
        let mut entries = self.entries.lock();
        if entries.contains_key(name) {
            return Err(RemoteError::AlreadyBound(name.to_owned()));
        }
        info!(name, "binding endpoint");
        entries.insert(name.to_owned(), endpoint);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> RemoteResult<Arc<dyn RemoteEndpoint>> {
        self.entries
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| RemoteError::Unbound(name.to_owned()))
    }

    pub fn unbind(&self, name: &str) -> RemoteResult<()> {
        match self.entries.lock().remove(name) {
            Some(_) => {
                info!(name, "unbound endpoint");
                Ok(())
            }
            None => Err(RemoteError::Unbound(name.to_owned())),
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
