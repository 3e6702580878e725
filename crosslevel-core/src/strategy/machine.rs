//! Flat/Long state machine with fixed take-profit and stop-loss targets.
//!
//! The machine only emits intents. Filling them, and hitting the TP/SL
//! prices, is up to the execution engine that consumes the intents.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::StrategyConfig;
use crate::signals::CrossoverEvent;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum StrategyState {
    #[default]
    Flat,
    Long {
        entry_price: f64,
        take_profit: f64,
        stop_loss: f64,
    },
}

impl StrategyState {
    pub fn is_flat(&self) -> bool {
        matches!(self, StrategyState::Flat)
    }
}

/// What the machine wants done at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    Hold,
    EnterLong {
        entry_price: f64,
        take_profit: f64,
        stop_loss: f64,
    },
    ExitLong,
}

/// One instance per sequential run. Not meant to be shared between runs.
#[derive(Debug, Clone)]
pub struct StrategyMachine {
    config: StrategyConfig,
    state: StrategyState,
}

impl StrategyMachine {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            state: StrategyState::Flat,
        }
    }

    pub fn state(&self) -> StrategyState {
        self.state
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Feed one bar. `oscillator` is `None` while the oscillator warms up.
    pub fn on_bar(&mut self, close: f64, crossover: CrossoverEvent, oscillator: Option<f64>) -> Intent {
        match self.state {
            StrategyState::Flat => {
                if !self.entry_condition(crossover, oscillator) {
                    return Intent::Hold;
                }
                let take_profit = close * (1.0 + self.config.take_profit_pct);
                let stop_loss = close * (1.0 - self.config.stop_loss_pct);
                self.state = StrategyState::Long {
                    entry_price: close,
                    take_profit,
                    stop_loss,
                };
                debug!(close, take_profit, stop_loss, "enter long");
                Intent::EnterLong {
                    entry_price: close,
                    take_profit,
                    stop_loss,
                }
            }
            StrategyState::Long { .. } => {
                if self.exit_condition(crossover, oscillator) {
                    self.state = StrategyState::Flat;
                    debug!(close, "exit long");
                    Intent::ExitLong
                } else {
                    Intent::Hold
                }
            }
        }
    }

    fn oversold(&self, oscillator: Option<f64>) -> bool {
        oscillator.is_some_and(|v| v < self.config.oversold)
    }

    fn overbought(&self, oscillator: Option<f64>) -> bool {
        oscillator.is_some_and(|v| v > self.config.overbought)
    }

    fn entry_condition(&self, crossover: CrossoverEvent, oscillator: Option<f64>) -> bool {
        let up = crossover == CrossoverEvent::Up;
        match (self.config.use_crossover, self.config.use_oscillator) {
            (true, true) => up && self.oversold(oscillator),
            (true, false) => up,
            (false, true) => self.oversold(oscillator),
            (false, false) => false,
        }
    }

    fn exit_condition(&self, crossover: CrossoverEvent, oscillator: Option<f64>) -> bool {
        (self.config.use_crossover && crossover == CrossoverEvent::Down)
            || (self.config.use_oscillator && self.overbought(oscillator))
    }
}
