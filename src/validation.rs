use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid balance: {0}")]
    InvalidBalance(String),
}

pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    // Check if address is empty
    if address.trim().is_empty() {
        return Err(ValidationError::MissingField("address".to_string()));
    }

    let body = match address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) {
        Some(body) => body,
        None => return Err(ValidationError::InvalidAddress(address.to_string())),
    };

    // Decode hex body
    let decoded = match hex::decode(body) {
        Ok(bytes) => bytes,
        Err(_) => return Err(ValidationError::InvalidAddress(address.to_string())),
    };

    // Account addresses are 20 bytes
    if decoded.len() != 20 {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    }

    Ok(())
}

/// Parses the decimal wei balance text returned by the source.
pub fn parse_wei(balance: &str) -> Result<u128, ValidationError> {
    let trimmed = balance.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField("balance".to_string()));
    }

    // NUMERIC columns may render a zero scale as "123.0"
    let integral = match trimmed.split_once('.') {
        Some((int, frac)) if frac.chars().all(|c| c == '0') => int,
        Some(_) => return Err(ValidationError::InvalidBalance(balance.to_string())),
        None => trimmed,
    };

    integral
        .parse::<u128>()
        .map_err(|_| ValidationError::InvalidBalance(balance.to_string()))
}
