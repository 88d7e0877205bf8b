//! Background Tasks Module
//!
//! # Tasks
//! - Eviction sweep: removes expired cache entries at a configured interval

mod sweeper;

pub(crate) use sweeper::{spawn_sweeper, sweep_expired};
