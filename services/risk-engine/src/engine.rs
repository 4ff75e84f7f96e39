//! Risk manager
//!
//! Evaluates each submission against the configured limits using the
//! hypothetical post-fill state, and accumulates positions and signed
//! notional exposure from fills.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use types::fill::Fill;
use types::ids::Symbol;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

use crate::gate::{RiskGate, RiskViolation};
use crate::limits::RiskLimits;

/// Length of one order-rate window
const RATE_WINDOW: Duration = Duration::from_secs(1);

/// Stateful pre-trade gate and position accumulator
///
/// Checks run in a fixed sequence (rate, order size, position,
/// notional) and the first failure wins. The rate window is tumbling:
/// it resets at second boundaries, so a burst straddling a boundary
/// can briefly reach twice the nominal rate.
#[derive(Debug, Clone)]
pub struct RiskManager {
    limits: RiskLimits,
    /// Signed position per symbol; short positions are negative
    positions: HashMap<Symbol, i64>,
    /// Signed notional exposure per symbol
    exposures: HashMap<Symbol, Decimal>,
    window_start: Instant,
    orders_in_window: u32,
}

impl RiskManager {
    /// Create a risk manager with default limits
    pub fn new() -> Self {
        Self::with_limits(RiskLimits::default())
    }

    /// Create a risk manager with the given limits
    pub fn with_limits(limits: RiskLimits) -> Self {
        Self {
            limits,
            positions: HashMap::new(),
            exposures: HashMap::new(),
            window_start: Instant::now(),
            orders_in_window: 0,
        }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    pub fn limits_mut(&mut self) -> &mut RiskLimits {
        &mut self.limits
    }

    /// Evaluate an order: rate, order size, position, notional
    ///
    /// The rate counter increments only when the rate check itself
    /// passes; a later failing check does not refund the slot.
    pub fn check_order(&mut self, order: &Order) -> Result<(), RiskViolation> {
        self.check_order_rate()?;
        self.check_order_size(order)?;
        self.check_position(order)?;
        self.check_notional(order)?;
        Ok(())
    }

    /// Reflect a fill: `position += ±qty`, `exposure += ±price·qty`
    /// (buy positive, sell negative)
    pub fn update_position(&mut self, symbol: &Symbol, side: Side, quantity: Quantity, price: Price) {
        *self.positions.entry(symbol.clone()).or_insert(0) += signed_quantity(side, quantity);

        let notional = price.as_decimal() * quantity.as_decimal();
        let delta = match side {
            Side::Buy => notional,
            Side::Sell => -notional,
        };
        *self.exposures.entry(symbol.clone()).or_insert(Decimal::ZERO) += delta;
    }

    /// Signed position for a symbol; zero when never traded
    pub fn position(&self, symbol: &Symbol) -> i64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    /// Signed notional exposure for a symbol; zero when never traded
    pub fn notional_exposure(&self, symbol: &Symbol) -> Decimal {
        self.exposures.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }

    /// Σ |exposure| across all symbols
    pub fn total_notional_exposure(&self) -> Decimal {
        self.exposures
            .values()
            .fold(Decimal::ZERO, |acc, exposure| acc + exposure.abs())
    }

    /// Zero positions, exposures, and the rate window
    pub fn reset(&mut self) {
        self.positions.clear();
        self.exposures.clear();
        self.orders_in_window = 0;
        self.window_start = Instant::now();
    }

    fn check_order_rate(&mut self) -> Result<(), RiskViolation> {
        let limit = self.limits.order_rate_limit();
        if limit == 0 {
            return Ok(());
        }

        let now = Instant::now();
        if now.duration_since(self.window_start) >= RATE_WINDOW {
            self.orders_in_window = 0;
            self.window_start = now;
        }

        if self.orders_in_window >= limit {
            return Err(RiskViolation::OrderRate { limit });
        }
        self.orders_in_window += 1;
        Ok(())
    }

    fn check_order_size(&self, order: &Order) -> Result<(), RiskViolation> {
        let limit = self.limits.order_size_limit(&order.symbol);
        let size = order.quantity.as_u64();
        if size > limit {
            return Err(RiskViolation::OrderSize { size, limit });
        }
        Ok(())
    }

    fn check_position(&self, order: &Order) -> Result<(), RiskViolation> {
        let limit = self.limits.position_limit(&order.symbol);
        let projected = self.position(&order.symbol) + signed_quantity(order.side, order.quantity);
        if projected.unsigned_abs() > limit {
            return Err(RiskViolation::PositionLimit { projected, limit });
        }

        let global_limit = self.limits.global_position_limit();
        if global_limit > 0 {
            // hypothetical replaces current for the order's symbol,
            // even when that symbol has never traded
            let total: u64 = projected.unsigned_abs()
                + self
                    .positions
                    .iter()
                    .filter(|(symbol, _)| *symbol != &order.symbol)
                    .map(|(_, position)| position.unsigned_abs())
                    .sum::<u64>();
            if total > global_limit {
                return Err(RiskViolation::GlobalPositionLimit {
                    projected: total,
                    limit: global_limit,
                });
            }
        }
        Ok(())
    }

    fn check_notional(&self, order: &Order) -> Result<(), RiskViolation> {
        let limit = self.limits.notional_limit(&order.symbol);
        let order_notional = order.price.as_decimal() * order.quantity.as_decimal();
        let delta = match order.side {
            Side::Buy => order_notional,
            Side::Sell => -order_notional,
        };
        let projected = self.notional_exposure(&order.symbol) + delta;
        if projected.abs() > limit {
            return Err(RiskViolation::NotionalLimit { projected, limit });
        }

        let global_limit = self.limits.global_notional_limit();
        if global_limit > Decimal::ZERO {
            let total = projected.abs()
                + self
                    .exposures
                    .iter()
                    .filter(|(symbol, _)| *symbol != &order.symbol)
                    .fold(Decimal::ZERO, |acc, (_, exposure)| acc + exposure.abs());
            if total > global_limit {
                return Err(RiskViolation::GlobalNotionalLimit {
                    projected: total,
                    limit: global_limit,
                });
            }
        }
        Ok(())
    }
}

impl Default for RiskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskGate for RiskManager {
    fn check(&mut self, order: &Order) -> Result<(), RiskViolation> {
        self.check_order(order)
    }

    fn apply_fill(&mut self, fill: &Fill) {
        self.update_position(&fill.symbol, fill.side, fill.quantity, fill.price);
    }
}

fn signed_quantity(side: Side, quantity: Quantity) -> i64 {
    match side {
        Side::Buy => quantity.as_u64() as i64,
        Side::Sell => -(quantity.as_u64() as i64),
    }
}
