use crate::error::{Error, Result};

/// Encode a forecast lead time as `FDddhh` (days, hours of day).
///
/// `132` becomes `FD0512`, `264` becomes `FD1100`.
pub fn fd_code(hours: i64) -> Result<String> {
    if hours < 0 {
        return Err(Error::InvalidInput(format!(
            "lead time must be >= 0 hours, got {hours}"
        )));
    }
    let days = hours / 24;
    let rem = hours % 24;
    if days > 99 {
        return Err(Error::InvalidInput(format!(
            "lead time of {hours} hours does not fit FDddhh"
        )));
    }
    Ok(format!("FD{days:02}{rem:02}"))
}
