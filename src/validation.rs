use thiserror::Error;

pub const MAX_LIMIT: usize = 500;
pub const MAX_SKIP: usize = 1_000_000;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// `0x` followed by 40 hex characters, either case.
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| ValidationError::InvalidAddress(address.to_string()))?;

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    }

    Ok(())
}

/// Splits a comma-separated address list, validating each entry.
pub fn parse_address_list(raw: &str) -> Result<Vec<String>, ValidationError> {
    let addresses: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect();

    if addresses.is_empty() {
        return Err(ValidationError::MissingParameter("addresses".to_string()));
    }
    for address in &addresses {
        validate_address(address)?;
    }

    Ok(addresses)
}

pub fn validate_limit(limit: usize) -> Result<usize, ValidationError> {
    if limit == 0 || limit > MAX_LIMIT {
        return Err(ValidationError::InvalidParameter(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    Ok(limit)
}

pub fn validate_skip(skip: usize) -> Result<usize, ValidationError> {
    if skip > MAX_SKIP {
        return Err(ValidationError::InvalidParameter(format!(
            "skip must not exceed {}",
            MAX_SKIP
        )));
    }
    Ok(skip)
}

pub fn validate_min_value(min_value_usd: f64) -> Result<f64, ValidationError> {
    if !min_value_usd.is_finite() || min_value_usd < 0.0 {
        return Err(ValidationError::InvalidParameter(
            "min_value_usd must be a non-negative number".to_string(),
        ));
    }
    Ok(min_value_usd)
}

/// Chain ids are short lower-case identifiers such as `eth` or `arb`.
pub fn validate_chain(chain: &str) -> Result<(), ValidationError> {
    let valid = !chain.is_empty()
        && chain
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid {
        return Err(ValidationError::InvalidParameter(format!("Invalid chain id: {}", chain)));
    }
    Ok(())
}
