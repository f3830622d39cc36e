//! Configuration

use std::env;

use anyhow::{anyhow, Context};
use plasma_core::{parse_address, to_hex, Address};

/// Default JSON-RPC listen address
const DEFAULT_RPC_ADDR: &str = "0.0.0.0:8547";

/// Node configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Config {
    /// JSON-RPC listen address
    pub(crate) rpc_addr: String,
    /// Address whose signature every non-deposit block must carry
    pub(crate) operator: Address,
}

impl Config {
    /// Load from environment variables
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let rpc_addr = lookup("RPC_ADDR").unwrap_or_else(|| DEFAULT_RPC_ADDR.to_string());
        let raw_operator = lookup("OPERATOR_ADDRESS").context("OPERATOR_ADDRESS is not set")?;
        let operator = parse_address(raw_operator.trim())
            .ok_or_else(|| anyhow!("invalid OPERATOR_ADDRESS {raw_operator:?}"))
            .context("OPERATOR_ADDRESS must be 20 bytes of hex")?;

        Ok(Self { rpc_addr, operator })
    }

    /// Operator address as `0x`-prefixed hex
    pub(crate) fn operator_hex(&self) -> String {
        to_hex(self.operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("OPERATOR_ADDRESS", "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf")]).unwrap();
        assert_eq!(config.rpc_addr, DEFAULT_RPC_ADDR);
        assert_eq!(config.operator_hex(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("RPC_ADDR", "127.0.0.1:9000"),
            ("OPERATOR_ADDRESS", "7e5f4552091a69125d5dfcb7b8c2659029395bdf"),
        ])
        .unwrap();
        assert_eq!(config.rpc_addr, "127.0.0.1:9000");
        assert_eq!(config.operator[0], 0x7e);
    }

    #[test]
    fn test_operator_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("OPERATOR_ADDRESS"));
    }

    #[test]
    fn test_operator_must_be_address() {
        assert!(load(&[("OPERATOR_ADDRESS", "0x1234")]).is_err());
    }
}
