//! Pool of per-task scratch slots.
//!
//! Slots are assigned positionally: task `t` of `n` uses slot
//! `t / ceil(n / pool_size)`, so consecutive tasks share a slot and run on it
//! one after another. The assignment is a pure function, testable on its own.

use crate::error::{DycoreError, Result};

/// How many slots the pool holds relative to the task count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SlotPolicy {
    /// One slot per task (every task may run at once).
    OnePerTask,
    /// `min(concurrency, tasks)` slots; each slot serves a contiguous block of tasks.
    #[default]
    Blocked,
}

/// Number of slots for `num_tasks` tasks at the requested concurrency.
pub fn pool_size(policy: SlotPolicy, concurrency: usize, num_tasks: usize) -> usize {
    let size = match policy {
        SlotPolicy::OnePerTask => num_tasks,
        SlotPolicy::Blocked => concurrency.min(num_tasks),
    };
    size.max(1)
}

/// Number of consecutive tasks served by one slot.
#[inline]
pub fn tasks_per_slot(num_tasks: usize, pool_size: usize) -> usize {
    num_tasks.div_ceil(pool_size.max(1)).max(1)
}

/// Slot used by `task`.
#[inline]
pub fn slot_for(task: usize, num_tasks: usize, pool_size: usize) -> usize {
    debug_assert!(task < num_tasks);
    task / tasks_per_slot(num_tasks, pool_size)
}

/// Pre-sized pool of scratch slots of type `S`.
#[derive(Debug)]
pub struct ScratchArena<S> {
    policy: SlotPolicy,
    num_tasks: usize,
    slots: Vec<S>,
}

impl<S> ScratchArena<S> {
    /// Allocate one slot per concurrently running task.
    pub fn allocate(
        policy: SlotPolicy,
        concurrency: usize,
        num_tasks: usize,
        make_slot: impl FnMut() -> S,
    ) -> Result<Self> {
        if concurrency == 0 {
            return Err(DycoreError::invalid_config("concurrency must be positive"));
        }
        let size = pool_size(policy, concurrency, num_tasks);
        let slots: Vec<S> = std::iter::repeat_with(make_slot).take(size).collect();
        log::debug!(
            "scratch arena: {} slots for {} tasks ({:?}, concurrency {})",
            size,
            num_tasks,
            policy,
            concurrency
        );
        Ok(Self {
            policy,
            num_tasks,
            slots,
        })
    }

    /// Slot policy.
    #[inline]
    pub fn policy(&self) -> SlotPolicy {
        self.policy
    }

    /// Number of tasks the arena was sized for.
    #[inline]
    pub fn num_tasks(&self) -> usize {
        self.num_tasks
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if there are no slots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Consecutive tasks per slot.
    #[inline]
    pub fn tasks_per_slot(&self) -> usize {
        tasks_per_slot(self.num_tasks, self.slots.len())
    }

    /// Slot index used by `task`.
    #[inline]
    pub fn slot_for(&self, task: usize) -> usize {
        slot_for(task, self.num_tasks, self.slots.len())
    }

    /// Slot `idx`.
    #[inline]
    pub fn slot(&self, idx: usize) -> &S {
        &self.slots[idx]
    }

    /// Mutable slot `idx`.
    #[inline]
    pub fn slot_mut(&mut self, idx: usize) -> &mut S {
        &mut self.slots[idx]
    }

    /// All slots, mutably.
    #[inline]
    pub fn slots_mut(&mut self) -> &mut [S] {
        &mut self.slots
    }
}
