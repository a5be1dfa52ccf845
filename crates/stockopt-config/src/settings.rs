use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stockopt_solver::{Micros, DEFAULT_SEARCH_BUDGET};
use stockopt_statement::parse_usd;

/// Typed view of the keys the planner reads.
///
/// | pointer                     | default       |
/// |-----------------------------|---------------|
/// | `/statement/plan`           | `GSU Class C` |
/// | `/statement/min_age_months` | `12`          |
/// | `/statement/allow_loss`     | `false`       |
/// | `/sale/gain_cap`            | `$0`          |
/// | `/report/tax_rate_pct`      | `20`          |
/// | `/solver/search_budget`     | `1000000`     |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSettings {
    /// Plan to sell from; empty means every plan.
    pub plan: String,
    pub min_age_months: u32,
    pub allow_loss: bool,
    /// Maximum total capital gain to realize.
    pub gain_cap: Micros,
    /// Whole percent applied to sold gains for the tax estimate.
    pub tax_rate_pct: u32,
    pub search_budget: u64,
}

impl Default for SaleSettings {
    fn default() -> Self {
        Self {
            plan: "GSU Class C".to_string(),
            min_age_months: 12,
            allow_loss: false,
            gain_cap: Micros::ZERO,
            tax_rate_pct: 20,
            search_budget: DEFAULT_SEARCH_BUDGET,
        }
    }
}

impl SaleSettings {
    /// Read settings from a merged config document. Absent keys keep their
    /// defaults; present keys of the wrong type are errors.
    ///
    /// `/sale/gain_cap` accepts a currency string (`"$3,000"`) or a number.
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let mut s = Self::default();

        if let Some(v) = config.pointer("/statement/plan") {
            s.plan = v
                .as_str()
                .context("/statement/plan must be a string")?
                .to_string();
        }
        if let Some(v) = config.pointer("/statement/min_age_months") {
            s.min_age_months = v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .context("/statement/min_age_months must be a non-negative integer")?;
        }
        if let Some(v) = config.pointer("/statement/allow_loss") {
            s.allow_loss = v
                .as_bool()
                .context("/statement/allow_loss must be a boolean")?;
        }
        if let Some(v) = config.pointer("/sale/gain_cap") {
            let raw = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => bail!("/sale/gain_cap must be a currency string or a number"),
            };
            s.gain_cap = parse_usd(&raw).with_context(|| format!("/sale/gain_cap: '{raw}'"))?;
        }
        if let Some(v) = config.pointer("/report/tax_rate_pct") {
            s.tax_rate_pct = v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .context("/report/tax_rate_pct must be a non-negative integer")?;
        }
        if let Some(v) = config.pointer("/solver/search_budget") {
            s.search_budget = v
                .as_u64()
                .context("/solver/search_budget must be a non-negative integer")?;
        }

        Ok(s)
    }

    /// Reject settings no run should use.
    pub fn validate(&self) -> Result<()> {
        if self.tax_rate_pct > 100 {
            bail!(
                "tax rate must be between 0 and 100 percent, got {}",
                self.tax_rate_pct
            );
        }
        if self.search_budget == 0 {
            bail!("solver search budget must be at least 1");
        }
        Ok(())
    }
}
