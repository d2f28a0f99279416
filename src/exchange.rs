//! Registration seam for halo exchange.
//!
//! The kernel never communicates. It only tells an exchange implementation
//! which prognostic fields live on each time level, so a driver can swap the
//! new state between neighbouring elements after a sub-stage.

use crate::error::{DycoreError, Result};

/// One field handed to an exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExchangeField {
    pub name: &'static str,
    pub time_level: usize,
    /// 1 for scalars, 2 for horizontal vectors.
    pub components: usize,
}

/// Exchange implementation as seen by the kernel.
pub trait BoundaryExchange {
    /// Declare how many 3-d field slots will be registered.
    fn set_num_fields(&mut self, num_3d: usize);

    /// Register one field.
    fn register_field(&mut self, field: ExchangeField) -> Result<()>;

    /// Close registration. No field may be added afterwards.
    fn registration_completed(&mut self) -> Result<()>;
}

/// Exchange that records registrations without moving data.
#[derive(Clone, Debug, Default)]
pub struct FieldRegistry {
    capacity: usize,
    fields: Vec<ExchangeField>,
    completed: bool,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered fields, in order.
    pub fn fields(&self) -> &[ExchangeField] {
        &self.fields
    }

    /// Total number of 3-d slots, counting vector components separately.
    pub fn num_slots(&self) -> usize {
        self.fields.iter().map(|f| f.components).sum()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

impl BoundaryExchange for FieldRegistry {
    fn set_num_fields(&mut self, num_3d: usize) {
        self.capacity = num_3d;
    }

    fn register_field(&mut self, field: ExchangeField) -> Result<()> {
        if self.completed {
            return Err(DycoreError::invalid_config(format!(
                "field '{}' registered after registration completed",
                field.name
            )));
        }
        if self.num_slots() + field.components > self.capacity {
            return Err(DycoreError::invalid_config(format!(
                "exchange declared {} slots, '{}' would exceed it",
                self.capacity, field.name
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    fn registration_completed(&mut self) -> Result<()> {
        if self.num_slots() != self.capacity {
            return Err(DycoreError::ArenaLayout {
                declared: self.capacity,
                laid_out: self.num_slots(),
            });
        }
        self.completed = true;
        log::debug!(
            "exchange registration completed with {} fields",
            self.fields.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(name: &'static str) -> ExchangeField {
        ExchangeField {
            name,
            time_level: 0,
            components: 1,
        }
    }

    #[test]
    fn test_registry_records_fields() {
        let mut reg = FieldRegistry::new();
        reg.set_num_fields(2);
        reg.register_field(scalar("t")).unwrap();
        reg.register_field(scalar("dp3d")).unwrap();
        reg.registration_completed().unwrap();
        assert!(reg.is_completed());
        assert_eq!(reg.fields().len(), 2);
    }

    #[test]
    fn test_registry_rejects_overflow_and_late_fields() {
        let mut reg = FieldRegistry::new();
        reg.set_num_fields(1);
        reg.register_field(scalar("t")).unwrap();
        assert!(reg.register_field(scalar("dp3d")).is_err());
        reg.registration_completed().unwrap();
        assert!(reg.register_field(scalar("late")).is_err());
    }

    #[test]
    fn test_incomplete_registration_is_error() {
        let mut reg = FieldRegistry::new();
        reg.set_num_fields(3);
        reg.register_field(scalar("t")).unwrap();
        assert!(reg.registration_completed().is_err());
    }
}
