//! Startup check for the strategy interface descriptor.
//!
//! The lookup itself goes through the compiled `IStrategy` binding; an operator
//! supplied ABI file only has to prove that the contracts being queried expose a
//! compatible `strategist()` getter.

use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("failed reading ABI file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing ABI file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("ABI has no strategist() function returning an address")]
    MissingStrategist,
}

pub fn load_strategy_abi(path: &Path) -> Result<JsonAbi, AbiError> {
    let data = std::fs::read_to_string(path).map_err(|source| AbiError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let abi = parse_abi(&data).map_err(|source| AbiError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    ensure_strategist_getter(&abi)?;
    Ok(abi)
}

/// Accepts a bare ABI array or a build artifact with an `abi` field.
fn parse_abi(data: &str) -> Result<JsonAbi, serde_json::Error> {
    let value: Value = serde_json::from_str(data)?;
    let abi = match value {
        Value::Object(mut object) if object.contains_key("abi") => {
            object.remove("abi").unwrap_or(Value::Null)
        }
        other => other,
    };
    serde_json::from_value(abi)
}

pub fn ensure_strategist_getter(abi: &JsonAbi) -> Result<(), AbiError> {
    let found = abi.function("strategist").is_some_and(|overloads| {
        overloads.iter().any(|f| {
            f.inputs.is_empty() && f.outputs.len() == 1 && f.outputs[0].ty == "address"
        })
    });
    if found {
        Ok(())
    } else {
        Err(AbiError::MissingStrategist)
    }
}
