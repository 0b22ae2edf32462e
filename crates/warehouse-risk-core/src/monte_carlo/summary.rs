//! Aggregate KPIs over a result table.

use serde::{Deserialize, Serialize};

use crate::config::ModelVariant;
use crate::error::RiskEngineError;
use crate::monte_carlo::orchestrator::ResultTable;
use crate::monte_carlo::statistics::{
    describe, fraction_above, fraction_below, mean, pearson_correlation, percentile_sorted,
    sorted, DistributionStats,
};
use crate::path::{loss_columns, PathResult, DRIVER_COLUMNS};
use crate::types::Money;
use crate::RiskEngineResult;

/// Equity view: `total_net_income / equity_capital` per path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityReturnSummary {
    pub equity_capital: Money,
    pub mean: f64,
    pub p5: f64,
    pub probability_of_equity_loss: f64,
}

/// Correlation of total net income with one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    pub column: String,
    pub correlation: f64,
}

/// Loss statistics for one funding layer (amortizing variant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrancheLossSummary {
    pub tranche: String,
    pub mean_loss: Money,
    pub max_loss: Money,
    pub probability_of_loss: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TailScope {
    All,
    #[serde(rename = "TAIL_WORST_5PCT")]
    TailWorst5Pct,
}

/// Credit vs liquidity loss breakdown for one scope (regime variant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailDecomposition {
    pub scope: TailScope,
    pub n: usize,
    pub ni_mean: Money,
    pub ni_p5: Money,
    pub ni_min: Money,
    pub credit_mean: Money,
    pub credit_p95: Money,
    pub credit_max: Money,
    pub p_credit_gt_0: f64,
    pub liq_mean: Money,
    pub liq_p95: Money,
    pub liq_max: Money,
    pub p_liq_gt_0: f64,
}

/// Aggregate result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub variant: ModelVariant,
    pub num_paths: usize,
    pub expected_total_net_income: Money,
    /// 5th percentile of total net income (worst 5%).
    pub p5_total_net_income: Money,
    /// Share of paths with negative total net income.
    pub probability_of_loss: f64,
    pub net_income: DistributionStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_returns: Option<EquityReturnSummary>,
    pub sensitivity: Vec<Sensitivity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tranche_losses: Vec<TrancheLossSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tail_decomposition: Vec<TailDecomposition>,
}

/// Summarise a result table. `equity_capital` enables the equity view.
pub fn summarize(table: &ResultTable, equity_capital: Option<Money>) -> RiskEngineResult<RunSummary> {
    let net_income = table.net_incomes();
    let stats = describe(&net_income).ok_or_else(|| {
        RiskEngineError::InsufficientData("Result table contains no paths".into())
    })?;

    let equity_returns = equity_capital
        .filter(|c| *c > 0.0)
        .map(|capital| equity_summary(&net_income, capital));

    let sensitivity = DRIVER_COLUMNS
        .iter()
        .chain(loss_columns(table.variant()))
        .filter_map(|name| {
            table.column(name).map(|values| Sensitivity {
                column: (*name).to_string(),
                correlation: pearson_correlation(&net_income, &values),
            })
        })
        .collect();

    let (tranche_losses, tail_decomposition) = match table.variant() {
        ModelVariant::Amortizing => (tranche_loss_summary(table), Vec::new()),
        ModelVariant::RegimeSwitching => (Vec::new(), tail_decomposition(table, stats.percentiles.p5)),
    };

    Ok(RunSummary {
        variant: table.variant(),
        num_paths: table.len(),
        expected_total_net_income: stats.mean,
        p5_total_net_income: stats.percentiles.p5,
        probability_of_loss: fraction_below(&net_income, 0.0),
        net_income: stats,
        equity_returns,
        sensitivity,
        tranche_losses,
        tail_decomposition,
    })
}

fn equity_summary(net_income: &[f64], equity_capital: Money) -> EquityReturnSummary {
    let returns: Vec<f64> = net_income.iter().map(|ni| ni / equity_capital).collect();
    let sorted_returns = sorted(&returns);
    EquityReturnSummary {
        equity_capital,
        mean: mean(&returns),
        p5: percentile_sorted(&sorted_returns, 5.0),
        probability_of_equity_loss: fraction_below(&returns, 0.0),
    }
}

fn tranche_loss_summary(table: &ResultTable) -> Vec<TrancheLossSummary> {
    loss_columns(ModelVariant::Amortizing)
        .iter()
        .filter_map(|name| {
            let values = table.column(name)?;
            Some(TrancheLossSummary {
                tranche: name.trim_end_matches("_loss").to_string(),
                mean_loss: mean(&values),
                max_loss: values.iter().copied().fold(0.0, f64::max),
                probability_of_loss: fraction_above(&values, 0.0),
            })
        })
        .collect()
}

fn tail_decomposition(table: &ResultTable, ni_p5: Money) -> Vec<TailDecomposition> {
    let tail: Vec<&PathResult> = table
        .iter()
        .filter(|p| p.total_net_income <= ni_p5)
        .collect();
    let all: Vec<&PathResult> = table.iter().collect();

    [(TailScope::All, all), (TailScope::TailWorst5Pct, tail)]
        .into_iter()
        .filter_map(|(scope, paths)| decompose(scope, &paths))
        .collect()
}

fn decompose(scope: TailScope, paths: &[&PathResult]) -> Option<TailDecomposition> {
    let mut ni = Vec::with_capacity(paths.len());
    let mut credit = Vec::with_capacity(paths.len());
    let mut liquidity = Vec::with_capacity(paths.len());
    for p in paths {
        let m = p.maturity_losses()?;
        ni.push(p.total_net_income);
        credit.push(m.credit_loss);
        liquidity.push(m.liquidity_loss);
    }
    if ni.is_empty() {
        return None;
    }
    let (ni_s, credit_s, liq_s) = (sorted(&ni), sorted(&credit), sorted(&liquidity));

    Some(TailDecomposition {
        scope,
        n: ni.len(),
        ni_mean: mean(&ni),
        ni_p5: percentile_sorted(&ni_s, 5.0),
        ni_min: ni_s[0],
        credit_mean: mean(&credit),
        credit_p95: percentile_sorted(&credit_s, 95.0),
        credit_max: credit_s[credit_s.len() - 1],
        p_credit_gt_0: fraction_above(&credit, 0.0),
        liq_mean: mean(&liquidity),
        liq_p95: percentile_sorted(&liq_s, 95.0),
        liq_max: liq_s[liq_s.len() - 1],
        p_liq_gt_0: fraction_above(&liquidity, 0.0),
    })
}
