//! Observer seam for the engine
//!
//! Two optional callback slots, invoked synchronously on the
//! submitting caller's stack: fills first, in matching order, then
//! one order-status callback with the final order snapshot. The
//! order callback also fires when a resting order is cancelled.
//! Callbacks must not reenter the engine.

use types::fill::Fill;
use types::order::Order;

/// Called once per fill generated by a submission
pub type FillCallback = Box<dyn FnMut(&Fill)>;

/// Called with the final order snapshot after each submission, and
/// with the cancelled snapshot after a successful cancel
pub type OrderCallback = Box<dyn FnMut(&Order)>;
