//! Validation utilities shared by the dispatcher and engines

use super::{Error, Result};

/// Validate a parameter condition
#[inline(always)]
pub fn parameter(condition: bool, context: &'static str, reason: &'static str) -> Result<()> {
    if !condition {
        return Err(Error::invalid_parameter(context, reason));
    }
    Ok(())
}

/// Validate that an output slice can take `required` bytes
#[inline(always)]
pub fn output_capacity(available: usize, required: usize) -> Result<()> {
    if available < required {
        return Err(Error::ShortBuffer {
            required,
            available,
        });
    }
    Ok(())
}

/// Validate a lifecycle condition
#[inline(always)]
pub fn state(condition: bool, context: &'static str) -> Result<()> {
    if !condition {
        return Err(Error::illegal_state(context));
    }
    Ok(())
}

/// Validate a key length against the accepted sizes
pub fn key_length(context: &'static str, actual: usize, accepted: &[usize]) -> Result<()> {
    if !accepted.contains(&actual) {
        return Err(Error::invalid_key(
            context,
            format!("unsupported key length {} bytes", actual),
        ));
    }
    Ok(())
}

/// Validate a parameter length
pub fn parameter_length(context: &'static str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::invalid_algorithm_parameter(
            context,
            format!("expected {} bytes, got {}", expected, actual),
        ));
    }
    Ok(())
}
