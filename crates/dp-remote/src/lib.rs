//! `dp-remote` — the cross-partition access layer of `rust_dp`.
//!
//! Replaces the remote-object protocol of classic distributed-field designs
//! with four explicit pieces:
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`promise`]   | `Promise<T>` one-shot cell, `PromiseValue` typed payload  |
//! | [`table`]     | `PromiseTable` — pending requests with expiry eviction    |
//! | [`directory`] | `Directory` — name → endpoint registry (bind/lookup/unbind) |
//! | [`transport`] | `RemoteEndpoint` trait + in-process `MailboxEndpoint`     |
//! | [`wire`]      | `Envelope`/`Request` message enums, `RemoteFault`         |
//! | [`processor`] | `RemoteProcessor` — fair-locked per-partition inspector handle |
//!
//! # Consistency model
//!
//! Remote calls never block: the caller holds a pending [`Promise`] and polls
//! it on later steps.  Request/response latency is best-effort with no upper
//! bound; failures ("not local", "unreachable") travel in-band as a
//! [`wire::RemoteFault`] so a misaddressed request fails loudly instead of
//! hanging or answering with wrong-partition data.

pub mod directory;
pub mod error;
pub mod processor;
pub mod promise;
pub mod table;
pub mod transport;
pub mod wire;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use directory::{Directory, processor_name};
pub use error::{RemoteError, RemoteResult};
pub use processor::{ProcessorGuard, ProcessorState, RemoteProcessor, StatRecord};
pub use promise::{Promise, PromiseState, PromiseValue};
pub use table::PromiseTable;
pub use transport::{Inbox, MailboxEndpoint, RemoteEndpoint, mailbox};
pub use wire::{Envelope, RemoteFault, RemoteOutcome, Request};
