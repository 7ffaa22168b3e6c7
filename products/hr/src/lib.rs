//! HR vertical slice.
//!
//! Every operation takes an explicit storage handle and the caller's
//! [`AuthContext`]; nothing here holds global state.

pub mod attendance;
pub mod context;
pub mod error;
pub mod identity;
pub mod leave;
pub mod payroll;
pub mod profile;
pub mod seed;

pub use context::AuthContext;
pub use error::{HrError, HrResult};
