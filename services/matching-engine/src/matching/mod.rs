//! Matching rules
//!
//! The crossing predicate that decides whether an incoming order can trade
//! against a resting price level. The matching loop itself lives with the
//! book, which owns the state it mutates.

pub mod crossing;
