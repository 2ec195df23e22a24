// Application layer - use cases over the transaction list.
// Clients (the CLI, tests) go through `LedgerService`; they never touch the
// transaction list or the repository directly.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
