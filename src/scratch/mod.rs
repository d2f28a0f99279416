//! Transient per-task storage.
//!
//! A [`ScratchArena`] owns one slot per concurrently running task; inside a slot,
//! every buffer is a [`Tracked`] handle that checks write-before-read in debug
//! builds.

mod arena;
mod tracked;

pub use arena::{ScratchArena, SlotPolicy, pool_size, slot_for, tasks_per_slot};
pub use tracked::Tracked;
