//! Risk limit configuration
//!
//! Per-symbol limits fall back to venue-wide defaults when unset.
//! Global caps and the order rate use zero as "disabled".

use std::collections::HashMap;

use rust_decimal::Decimal;
use types::ids::Symbol;

/// Default per-symbol position limit (absolute contracts)
pub const DEFAULT_POSITION_LIMIT: u64 = 100_000;
/// Default per-symbol order size limit
pub const DEFAULT_ORDER_SIZE_LIMIT: u64 = 10_000;
/// Default per-symbol notional exposure limit
pub const DEFAULT_NOTIONAL_LIMIT: u64 = 10_000_000;

/// Limit configuration for the risk manager
#[derive(Debug, Clone, Default)]
pub struct RiskLimits {
    position: HashMap<Symbol, u64>,
    order_size: HashMap<Symbol, u64>,
    notional: HashMap<Symbol, Decimal>,
    /// Cap on Σ |position| across symbols; 0 = disabled
    global_position: u64,
    /// Cap on Σ |exposure| across symbols; 0 = disabled
    global_notional: Decimal,
    /// Successful checks allowed per second; 0 = disabled
    order_rate: u32,
}

impl RiskLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position_limit(&mut self, symbol: Symbol, limit: u64) {
        self.position.insert(symbol, limit);
    }

    pub fn position_limit(&self, symbol: &Symbol) -> u64 {
        self.position
            .get(symbol)
            .copied()
            .unwrap_or(DEFAULT_POSITION_LIMIT)
    }

    pub fn set_order_size_limit(&mut self, symbol: Symbol, limit: u64) {
        self.order_size.insert(symbol, limit);
    }

    pub fn order_size_limit(&self, symbol: &Symbol) -> u64 {
        self.order_size
            .get(symbol)
            .copied()
            .unwrap_or(DEFAULT_ORDER_SIZE_LIMIT)
    }

    pub fn set_notional_limit(&mut self, symbol: Symbol, limit: Decimal) {
        self.notional.insert(symbol, limit);
    }

    pub fn notional_limit(&self, symbol: &Symbol) -> Decimal {
        self.notional
            .get(symbol)
            .copied()
            .unwrap_or_else(|| Decimal::from(DEFAULT_NOTIONAL_LIMIT))
    }

    pub fn set_global_position_limit(&mut self, limit: u64) {
        self.global_position = limit;
    }

    pub fn global_position_limit(&self) -> u64 {
        self.global_position
    }

    pub fn set_global_notional_limit(&mut self, limit: Decimal) {
        self.global_notional = limit;
    }

    pub fn global_notional_limit(&self) -> Decimal {
        self.global_notional
    }

    pub fn set_order_rate_limit(&mut self, orders_per_second: u32) {
        self.order_rate = orders_per_second;
    }

    pub fn order_rate_limit(&self) -> u32 {
        self.order_rate
    }
}
