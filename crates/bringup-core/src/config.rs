//! Deployment parameters and the standard component stack.

use crate::domain::{ArgValue, ComponentSpec, OrderPolicy};

/// Initial ledger supply when none is configured: 1000 units at 18 decimals.
pub const DEFAULT_INITIAL_LEDGER_SUPPLY: u128 = 1_000_000_000_000_000_000_000;

/// Parameter name accepted in manifests and on the command line.
pub const INITIAL_LEDGER_SUPPLY_PARAM: &str = "initial_ledger_supply";

/// Values consumed as literal constructor arguments and run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub initial_ledger_supply: u128,
    pub order: OrderPolicy,
    /// Stop issuing deploy calls after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            initial_ledger_supply: DEFAULT_INITIAL_LEDGER_SUPPLY,
            order: OrderPolicy::default(),
            timeout_secs: None,
        }
    }
}

impl DeployConfig {
    /// Look up a named parameter as an argument value.
    pub fn parameter(&self, name: &str) -> Option<ArgValue> {
        match name {
            INITIAL_LEDGER_SUPPLY_PARAM => Some(ArgValue::Uint(self.initial_ledger_supply)),
            _ => None,
        }
    }
}

/// Governance registry, ledger and tax pool, in dependency order.
///
/// `Token(initial supply, Government)` and `TaxPool(Government, Token)`.
pub fn standard_components(config: &DeployConfig) -> Vec<ComponentSpec> {
    vec![
        ComponentSpec::new("Government", "DreamGovernment"),
        ComponentSpec::new("Token", "DreamToken")
            .with_literal(ArgValue::Uint(config.initial_ledger_supply))
            .with_ref("Government"),
        ComponentSpec::new("TaxPool", "TaxPool")
            .with_ref("Government")
            .with_ref("Token"),
    ]
}

/// Parse a decimal unsigned integer, allowing `_` separators.
pub fn parse_uint(value: &str) -> Option<u128> {
    let digits: String = value.trim().chars().filter(|c| *c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
