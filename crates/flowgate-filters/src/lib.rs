//! Built-in Flowgate Filter Kinds
//!
//! This crate ships the filter kinds a gateway needs out of the box:
//!
//! - [`Mock`]: terminal responder with its own traffic statistics
//! - [`RateLimiter`]: token-bucket limiter emitting `rateLimited`
//! - [`RequestAdaptor`]: header/path rewriting of the active request
//! - [`HeaderValidator`]: request-header validation emitting `invalid`
//!
//! Call [`register_all`] once during process start-up before parsing any
//! pipeline spec; it is idempotent.

mod headervalidator;
mod mock;
mod ratelimiter;
mod requestadaptor;

pub use headervalidator::HeaderValidator;
pub use mock::Mock;
pub use ratelimiter::RateLimiter;
pub use requestadaptor::RequestAdaptor;

use std::sync::Once;

/// Registers every built-in kind with the process-wide filter registry.
pub fn register_all() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        headervalidator::register();
        mock::register();
        ratelimiter::register();
        requestadaptor::register();
    });
}
