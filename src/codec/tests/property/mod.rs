//! Property-oriented tests for record round-tripping and malformed inputs.

mod frames;
mod objects;
mod shared;
