//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                 ┌─────────────────────────┐
//!                 │       Application       │
//!                 │  connection · reader ·  │
//!                 │        executor         │
//!                 └────────────┬────────────┘
//!                 ┌────────────┴────────────┐
//!                 ▼                         ▼
//!          ┌─────────────┐           ┌─────────────┐
//!          │  Transport  │           │  Notifier   │
//!          │   Adapter   │           │   Adapter   │
//!          └─────────────┘           └─────────────┘
//! ```

pub mod outbound;

pub use outbound::notifier::{Event, LogNotifier, Notifier, NotifierRegistry, NullNotifier};
pub use outbound::transport::{
    HttpMethod, HttpReply, HttpRequest, Transport, TransportError,
};
