//! Behavioural scenarios for the janitor sweep.

mod janitor;
