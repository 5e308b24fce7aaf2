//! Authentication module.
//!
//! Every protected route goes through [`require_api_token`], which asks the
//! header guard whether the request carries the shared API token. The guard
//! compares secrets in constant time.

mod compare;
mod guard;
mod middleware;

pub use compare::*;
pub use guard::*;
pub use middleware::*;
