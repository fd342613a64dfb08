//! Performance statistics over closed deals: win rate, profit factor,
//! drawdown and dispersion of per-deal results.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::models::Deal;

/// Summary of realized results in a slice of deal history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealStatistics {
    /// Closing deals considered
    pub closed_deals: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub total_net_profit: Decimal,
    pub avg_win: Decimal,
    /// Average loss as a positive amount
    pub avg_loss: Decimal,
    /// Gross profit over gross loss, 0 when there are no losses
    pub profit_factor: f64,
    pub mean_net_profit: f64,
    pub std_dev_net_profit: f64,
    /// Largest fall of cumulative net profit from its running peak
    pub max_drawdown: Decimal,
}

impl DealStatistics {
    /// Statistics over the closing deals in `deals`, in time order.
    /// Opening deals book no profit and are skipped.
    pub fn calculate(deals: &[Deal]) -> Self {
        let mut closing: Vec<&Deal> = deals.iter().filter(|d| d.entry.is_exit()).collect();
        closing.sort_by_key(|d| (d.time, d.ticket));

        let pnls: Vec<Decimal> = closing.iter().map(|d| d.net_profit()).collect();

        let mut stats = DealStatistics::default();
        if pnls.is_empty() {
            return stats;
        }

        let (wins, losses): (Vec<Decimal>, Vec<Decimal>) =
            pnls.iter().copied().partition(|p| *p > Decimal::ZERO);
        // Break-even deals count as neither
        let losses: Vec<Decimal> = losses.into_iter().filter(|l| *l < Decimal::ZERO).collect();

        stats.closed_deals = pnls.len() as u32;
        stats.wins = wins.len() as u32;
        stats.losses = losses.len() as u32;
        stats.win_rate = wins.len() as f64 / pnls.len() as f64;
        stats.total_net_profit = pnls.iter().copied().sum();

        let gross_profit: Decimal = wins.iter().copied().sum();
        let gross_loss: Decimal = losses.iter().map(|l| l.abs()).sum();

        if !wins.is_empty() {
            stats.avg_win = gross_profit / Decimal::from(wins.len() as u32);
        }
        if !losses.is_empty() {
            stats.avg_loss = gross_loss / Decimal::from(losses.len() as u32);
        }
        if gross_loss > Decimal::ZERO {
            stats.profit_factor =
                gross_profit.to_f64().unwrap_or(0.0) / gross_loss.to_f64().unwrap_or(1.0);
        }

        let values: Vec<f64> = pnls.iter().filter_map(|p| p.to_f64()).collect();
        stats.mean_net_profit = values.clone().mean();
        if values.len() >= 2 {
            stats.std_dev_net_profit = values.std_dev();
        }

        stats.max_drawdown = max_drawdown(&pnls);
        stats
    }
}

fn max_drawdown(pnls: &[Decimal]) -> Decimal {
    let mut equity = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut max_dd = Decimal::ZERO;

    for pnl in pnls {
        equity += pnl;
        if equity > peak {
            peak = equity;
        }
        max_dd = max_dd.max(peak - equity);
    }

    max_dd
}
