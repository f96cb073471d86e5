//! Two-table join evaluation over record stores.

pub mod join;

pub use join::{inner_join, left_outer_join, InnerJoin, LeftOuterJoin};
