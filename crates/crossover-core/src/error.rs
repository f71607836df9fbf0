use rust_decimal::Decimal;
use thiserror::Error;

/// Strategy parameter validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("Initial investment must be positive, got {0}")]
    NonPositiveInvestment(Decimal),

    #[error("{name} window must be at least 1")]
    ZeroWindow { name: &'static str },

    #[error("Share scale {0} exceeds the maximum decimal scale of 28")]
    ShareScaleTooLarge(u32),
}

/// A decimal operation left the representable range
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Decimal overflow in {operation}")]
pub struct DecimalOverflow {
    pub operation: &'static str,
}
