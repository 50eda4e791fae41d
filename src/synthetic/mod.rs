//! Synthetic hiring data
//!
//! Generates reproducible historical hiring records for demos, tests and
//! benchmarks, optionally with selection bias injected against specific
//! groups so the bias detector has something to find.

use crate::error::{AbdmfError, Result};
use crate::utils::OUTCOME_COLUMN;
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const GENDERS: [&str; 2] = ["M", "F"];
const RACES: [&str; 3] = ["A", "B", "C"];
const EDUCATION_LEVELS: [&str; 4] = ["High School", "Bachelor", "Master", "PhD"];

/// Selection suppression applied on top of the random base outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InjectedBias {
    /// Female candidates with more experience than this are never selected
    pub female_experience_cutoff: i64,
    /// Candidates older than this are never selected
    pub age_cutoff: i64,
}

impl Default for InjectedBias {
    fn default() -> Self {
        Self {
            female_experience_cutoff: 10,
            age_cutoff: 50,
        }
    }
}

/// Seeded generator of hiring records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiringDataGenerator {
    /// Random seed
    seed: u64,
    /// Probability of a positive base outcome
    selection_rate: f64,
    /// Bias to inject, if any
    bias: Option<InjectedBias>,
}

impl Default for HiringDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl HiringDataGenerator {
    /// Unbiased generator with seed 42 and a 30% base selection rate
    pub fn new() -> Self {
        Self {
            seed: 42,
            selection_rate: 0.3,
            bias: None,
        }
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the base probability of selection
    pub fn with_selection_rate(mut self, rate: f64) -> Self {
        self.selection_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Inject selection bias
    pub fn with_bias(mut self, bias: InjectedBias) -> Self {
        self.bias = Some(bias);
        self
    }

    /// Historical records including the `selected` outcome column
    pub fn generate(&self, n_samples: usize) -> Result<DataFrame> {
        if n_samples == 0 {
            return Err(AbdmfError::InvalidInput(
                "n_samples must be at least 1".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut gender = Vec::with_capacity(n_samples);
        let mut race = Vec::with_capacity(n_samples);
        let mut age = Vec::with_capacity(n_samples);
        let mut experience = Vec::with_capacity(n_samples);
        let mut education_level = Vec::with_capacity(n_samples);
        let mut education_score = Vec::with_capacity(n_samples);
        let mut interview_score = Vec::with_capacity(n_samples);
        let mut selected = Vec::with_capacity(n_samples);

        for _ in 0..n_samples {
            let g = *GENDERS.choose(&mut rng).unwrap_or(&GENDERS[0]);
            let a: i64 = rng.gen_range(22..65);
            let e: i64 = rng.gen_range(0..30);

            let mut s = rng.gen_bool(self.selection_rate);
            if let Some(bias) = &self.bias {
                if (g == "F" && e > bias.female_experience_cutoff) || a > bias.age_cutoff {
                    s = false;
                }
            }

            gender.push(g);
            race.push(*RACES.choose(&mut rng).unwrap_or(&RACES[0]));
            age.push(a);
            experience.push(e);
            education_level.push(*EDUCATION_LEVELS.choose(&mut rng).unwrap_or(&EDUCATION_LEVELS[0]));
            education_score.push(rng.gen_range(0.0..100.0));
            interview_score.push(rng.gen_range(0.0..100.0));
            selected.push(i64::from(s));
        }

        let df = df!(
            "gender" => gender,
            "race" => race,
            "age" => age,
            "experience" => experience,
            "education_level" => education_level,
            "education_score" => education_score,
            "interview_score" => interview_score,
            OUTCOME_COLUMN => selected
        )?;

        debug!(rows = n_samples, seed = self.seed, biased = self.bias.is_some(), "Generated hiring data");
        Ok(df)
    }

    /// Candidate records without the outcome column
    pub fn generate_candidates(&self, n_samples: usize) -> Result<DataFrame> {
        let df = self.generate(n_samples)?;
        Ok(df.drop(OUTCOME_COLUMN)?)
    }
}
