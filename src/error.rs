//! Error types for spanstore.
//!
//! Every layer reports through one [`Error`]. Use [`Error::kind`] to map
//! an error onto a transport status:
//!
//! | Kind | Typical status |
//! |------|----------------|
//! | `Validation` | invalid argument |
//! | `NotSupported` | unimplemented |
//! | `NotFound` | not found |
//! | `Cancelled` | cancelled / deadline exceeded |
//! | `EngineFailure` | internal |
//! | `Configuration` | failed precondition |

pub use spanstore_core::{CodecError, Error, ErrorKind, Operation, Result, StorageError};
