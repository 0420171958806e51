use crate::{tier::Tier, types::EmployeeId};
use serde::{Deserialize, Serialize};

// ── Roster ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeConfig {
    pub employee_id: EmployeeId,
    pub name: String,
}

/// Three ordered pools. List order is routing priority within a tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub junior: Vec<EmployeeConfig>,
    #[serde(default)]
    pub mid: Vec<EmployeeConfig>,
    #[serde(default)]
    pub senior: Vec<EmployeeConfig>,
}

impl RosterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an employee to the end of `tier`'s pool.
    pub fn with(mut self, tier: Tier, employee_id: &str, name: &str) -> Self {
        self.pool_mut(tier).push(EmployeeConfig {
            employee_id: employee_id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn pool(&self, tier: Tier) -> &[EmployeeConfig] {
        match tier {
            Tier::Junior => &self.junior,
            Tier::Mid => &self.mid,
            Tier::Senior => &self.senior,
        }
    }

    fn pool_mut(&mut self, tier: Tier) -> &mut Vec<EmployeeConfig> {
        match tier {
            Tier::Junior => &mut self.junior,
            Tier::Mid => &mut self.mid,
            Tier::Senior => &mut self.senior,
        }
    }

    pub fn headcount(&self) -> usize {
        self.junior.len() + self.mid.len() + self.senior.len()
    }
}

// ── Policy ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchPolicy {
    /// Also drain one backlog call into the slot an escalation frees.
    /// Off by default: only completions drain.
    #[serde(default)]
    pub drain_on_escalation: bool,
}

// ── Traffic model (simulator only) ─────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRates {
    pub junior: f64,
    pub mid: f64,
    pub senior: f64,
}

impl TierRates {
    pub fn get(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Junior => self.junior,
            Tier::Mid => self.mid,
            Tier::Senior => self.senior,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Per-attempt probability that a call of each tier arrives.
    pub arrival_probability: TierRates,
    /// Arrival attempts per tier per tick.
    pub arrival_attempts_per_tick: u32,
    /// Per-tick probability that a busy employee finishes their call.
    pub completion_probability: f64,
    /// Per-tick probability that a busy, non-senior employee escalates
    /// instead of finishing.
    pub escalation_probability: f64,
}

// ── Files ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct RosterFile {
    roster: RosterConfig,
    #[serde(default)]
    policy: DispatchPolicy,
}

#[derive(Debug, Clone, Deserialize)]
struct TrafficFile {
    traffic: TrafficConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    pub roster: RosterConfig,
    pub policy: DispatchPolicy,
    pub traffic: TrafficConfig,
}

impl DispatchConfig {
    /// Load from `{data_dir}/dispatch/roster.json` and
    /// `{data_dir}/dispatch/traffic.json`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let roster_path = format!("{data_dir}/dispatch/roster.json");
        let roster_content = std::fs::read_to_string(&roster_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {roster_path}: {e}"))?;
        let roster_file: RosterFile = serde_json::from_str(&roster_content)?;

        let traffic_path = format!("{data_dir}/dispatch/traffic.json");
        let traffic_content = std::fs::read_to_string(&traffic_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {traffic_path}: {e}"))?;
        let traffic_file: TrafficFile = serde_json::from_str(&traffic_content)?;

        let config = Self {
            roster: roster_file.roster,
            policy: roster_file.policy,
            traffic: traffic_file.traffic,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let t = &self.traffic;
        let probabilities = [
            ("arrival_probability.junior", t.arrival_probability.junior),
            ("arrival_probability.mid", t.arrival_probability.mid),
            ("arrival_probability.senior", t.arrival_probability.senior),
            ("completion_probability", t.completion_probability),
            ("escalation_probability", t.escalation_probability),
        ];
        for (field, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                anyhow::bail!("traffic.{field} must be within [0, 1], got {p}");
            }
        }
        if self.roster.headcount() == 0 {
            anyhow::bail!("roster has no employees");
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        let roster = RosterConfig::new()
            .with(Tier::Junior, "jr-01", "Avery Cole")
            .with(Tier::Junior, "jr-02", "Blake Diaz")
            .with(Tier::Junior, "jr-03", "Casey Ford")
            .with(Tier::Mid, "mid-01", "Dana Gray")
            .with(Tier::Mid, "mid-02", "Emery Hale")
            .with(Tier::Senior, "sr-01", "Finley Irwin");

        Self {
            roster,
            policy: DispatchPolicy::default(),
            traffic: TrafficConfig {
                arrival_probability: TierRates {
                    junior: 0.45,
                    mid: 0.20,
                    senior: 0.08,
                },
                arrival_attempts_per_tick: 2,
                completion_probability: 0.35,
                escalation_probability: 0.10,
            },
        }
    }
}
