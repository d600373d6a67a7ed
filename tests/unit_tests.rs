//! Component-level tests exercised through the public API.

mod unit;
