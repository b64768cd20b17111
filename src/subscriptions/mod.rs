//! Subscriber lifecycle: pending -> confirmed -> unsubscribed.
//!
//! [`registry`] and [`tokens`] operate inside a caller-provided unit of work. The flow modules
//! open the unit of work, commit it and only then send the emails, whose failures are logged
//! and never undo the state change.
pub mod confirmation;
pub mod registry;
pub mod subscribe;
pub mod tokens;
pub mod unsubscribe;

#[cfg(test)]
pub mod test_support;
