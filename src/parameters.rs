//! Run parameters and their JSON configuration files.
//!
//! Every field has a default, so a configuration file only needs to list
//! what it changes. Durations are given in days and converted to whole
//! seconds when a simulation is set up.
//!
//! A configuration file holds either one parameter object or an array of
//! them, one scenario per element:
//!
//! ```json
//! [{ "population": 500, "r0": 1.2 }, { "population": 500, "r0": 2.0 }]
//! ```

use std::fs;
use std::path::Path;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::network::NetworkParameters;
use crate::random::{days_to_seconds, ModeDispersion, SeverityDistribution};
use crate::tier::{PerTier, Tier, TierLayout};

/// Fractions of the population in each tier.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgeSplit {
    pub child: f64,
    pub adult: f64,
    pub elderly: f64,
}

/// How long vaccine protection lasts. A missing dispersion is `mode / 12`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VaccineDuration {
    pub mode: f64,
    #[serde(default)]
    pub dispersion: Option<f64>,
}

impl VaccineDuration {
    #[must_use]
    pub fn resolved(&self) -> ModeDispersion {
        ModeDispersion::new(self.mode, self.dispersion.unwrap_or(self.mode / 12.0))
    }
}

/// When each node receives its first vaccination offer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaccinationSchedule {
    /// A uniformly random time in the offer window.
    Uniform,
    /// Three consecutive waves: elderly, then adults, then children.
    OldestFirst,
}

/// `ln(severity)` is normal with mean `mu` and standard deviation `sigma`
/// before scaling.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogNormalParameters {
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityParameters {
    pub tiers: PerTier<LogNormalParameters>,
    /// Raw draws are divided by this before the unit-interval check.
    pub scale: f64,
    pub max_draws: usize,
}

impl Default for SeverityParameters {
    fn default() -> Self {
        SeverityParameters {
            tiers: PerTier {
                child: LogNormalParameters { mu: 0.2, sigma: 0.6 },
                adult: LogNormalParameters { mu: 0.6, sigma: 0.6 },
                elderly: LogNormalParameters { mu: 1.1, sigma: 0.5 },
            },
            scale: 8.0,
            max_draws: 10_000,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpinionParameters {
    /// Days between two opinion events of the same node.
    pub update_interval: f64,
    /// Severity from which a case counts as severe.
    pub severe_threshold: f64,
    /// Subtracted from the pro to anti change probability when any behavioural
    /// neighbour has had a severe case.
    pub neighbour_penalty: f64,
    /// Subtracted when the node itself has had a severe case.
    pub self_penalty: f64,
}

impl Default for OpinionParameters {
    fn default() -> Self {
        OpinionParameters {
            update_interval: 42.0,
            severe_threshold: 0.8,
            neighbour_penalty: 0.5,
            self_penalty: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub population: usize,
    pub age_split: AgeSplit,
    /// Probability that a node starts out anti-vaccine.
    pub anti_vax_fraction: f64,
    pub vaccine_duration: VaccineDuration,
    /// Days before the first vaccination offers.
    pub vaccination_delay: f64,
    pub vaccination_schedule: VaccinationSchedule,
    /// Days over which first offers are spread.
    pub vaccination_offer_window: f64,
    /// Days between consecutive offers to the same node.
    pub revaccination_interval: f64,
    pub patient_zero_count: usize,
    pub r0: f64,
    /// Per-contact transmission probability. Derived from `r0` when absent.
    pub beta: Option<f64>,
    pub generation_time: ModeDispersion,
    /// Post-infection immunity.
    pub infection_immunity: ModeDispersion,
    pub severity: SeverityParameters,
    pub opinion: OpinionParameters,
    /// Days until the kill event ends the run.
    pub max_duration: f64,
    /// Days an infection counts as an active case.
    pub active_case_window: f64,
    pub retain_event_log: bool,
    /// Fresh entropy is drawn when absent.
    pub random_seed: Option<u64>,
    pub network: NetworkParameters,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            population: 1000,
            age_split: AgeSplit {
                child: 0.19,
                adult: 0.625,
                elderly: 0.185,
            },
            anti_vax_fraction: 0.25,
            vaccine_duration: VaccineDuration {
                mode: 90.0,
                dispersion: None,
            },
            vaccination_delay: 40.0,
            vaccination_schedule: VaccinationSchedule::OldestFirst,
            vaccination_offer_window: 365.0,
            revaccination_interval: 365.0,
            patient_zero_count: 5,
            r0: 1.4,
            beta: None,
            generation_time: ModeDispersion::new(5.0, 1.3),
            infection_immunity: ModeDispersion::new(90.0, 8.0),
            severity: SeverityParameters::default(),
            opinion: OpinionParameters::default(),
            max_duration: 730.0,
            active_case_window: 7.0,
            retain_event_log: true,
            random_seed: None,
            network: NetworkParameters::default(),
        }
    }
}

fn check_days(name: &'static str, days: f64) -> Result<(), SimError> {
    if days.is_finite() && days >= 0.0 {
        Ok(())
    } else {
        Err(SimError::invalid(
            name,
            format!("must be a non-negative number of days, got {days}"),
        ))
    }
}

/// Intervals that reschedule an event for the same node must advance time.
fn check_interval(name: &'static str, days: f64) -> Result<(), SimError> {
    check_days(name, days)?;
    if days_to_seconds(days) == 0 {
        return Err(SimError::invalid(name, "must be at least one second"));
    }
    Ok(())
}

fn check_fraction(name: &'static str, value: f64) -> Result<(), SimError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::invalid(
            name,
            format!("must lie in [0, 1], got {value}"),
        ))
    }
}

impl Parameters {
    /// Tier sizes: `floor(child * N)` children, `floor(adult * N)` adults and
    /// the rest elderly.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn tier_layout(&self) -> TierLayout {
        let total = self.population;
        let children = ((self.age_split.child * total as f64).floor() as usize).min(total);
        let adults = ((self.age_split.adult * total as f64).floor() as usize).min(total - children);
        TierLayout::new(children, adults, total - children - adults)
    }

    /// # Errors
    ///
    /// Returns `InvalidParameter` if the tier has invalid severity parameters.
    pub fn severity_distribution(&self, tier: Tier) -> Result<SeverityDistribution, SimError> {
        let LogNormalParameters { mu, sigma } = *self.severity.tiers.get(tier);
        SeverityDistribution::new(tier, mu, sigma, self.severity.scale, self.severity.max_draws)
    }

    /// Checks every parameter. Nothing is clamped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), SimError> {
        trace!("validating parameters");
        if self.population == 0 {
            return Err(SimError::invalid("population", "must be positive"));
        }

        let AgeSplit {
            child,
            adult,
            elderly,
        } = self.age_split;
        for fraction in [child, adult, elderly] {
            check_fraction("age_split", fraction)?;
        }
        if (child + adult + elderly - 1.0).abs() > 1e-6 {
            return Err(SimError::invalid(
                "age_split",
                format!("fractions must sum to 1, got {}", child + adult + elderly),
            ));
        }

        check_fraction("anti_vax_fraction", self.anti_vax_fraction)?;
        self.vaccine_duration
            .resolved()
            .validate("vaccine_duration")?;
        check_days("vaccination_delay", self.vaccination_delay)?;
        check_days("vaccination_offer_window", self.vaccination_offer_window)?;
        check_interval("revaccination_interval", self.revaccination_interval)?;

        if self.patient_zero_count > self.population {
            return Err(SimError::invalid(
                "patient_zero_count",
                format!(
                    "{} patient zeros exceed the population of {}",
                    self.patient_zero_count, self.population
                ),
            ));
        }
        if !(self.r0.is_finite() && self.r0 >= 0.0) {
            return Err(SimError::invalid(
                "r0",
                format!("must be non-negative and finite, got {}", self.r0),
            ));
        }
        if let Some(beta) = self.beta {
            check_fraction("beta", beta)?;
        }

        self.generation_time.validate("generation_time")?;
        self.infection_immunity.validate("infection_immunity")?;
        for tier in Tier::ALL {
            self.severity_distribution(tier)?;
        }

        check_interval("opinion.update_interval", self.opinion.update_interval)?;
        check_fraction("opinion.severe_threshold", self.opinion.severe_threshold)?;
        check_fraction("opinion.neighbour_penalty", self.opinion.neighbour_penalty)?;
        check_fraction("opinion.self_penalty", self.opinion.self_penalty)?;

        check_days("max_duration", self.max_duration)?;
        check_days("active_case_window", self.active_case_window)?;
        self.network.validate()
    }
}

/// The contents of a configuration file: one scenario or several.
///
/// `Multiple` is tried first since a struct with defaults also accepts a
/// JSON array.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Config {
    Multiple(Vec<Parameters>),
    Single(Box<Parameters>),
}

/// Reads one or more scenarios from a JSON file and validates each.
///
/// # Errors
///
/// Returns `IoError` or `JsonError` if the file cannot be read or parsed, and
/// `InvalidParameter` if a scenario fails validation.
pub fn load_parameters_from_json(path: &Path) -> Result<Vec<Parameters>, SimError> {
    trace!("loading parameters from {}", path.display());
    let contents = fs::read_to_string(path)?;
    let scenarios = match serde_json::from_str::<Config>(&contents)? {
        Config::Single(parameters) => vec![*parameters],
        Config::Multiple(scenarios) => scenarios,
    };
    if scenarios.is_empty() {
        return Err(SimError::invalid(
            "config",
            format!("{} holds no scenarios", path.display()),
        ));
    }
    for parameters in &scenarios {
        parameters.validate()?;
    }
    debug!(
        "loaded {} scenario(s) from {}",
        scenarios.len(),
        path.display()
    );
    Ok(scenarios)
}
