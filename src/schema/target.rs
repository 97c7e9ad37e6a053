//! Target aggregate profile for an assembled quiz.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// An aggregate dimension scored by the fitness function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    SumScore,
    AvgDifficulty,
    AvgDistinguishingDegree,
    SumTime,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::SumScore,
        Dimension::AvgDifficulty,
        Dimension::AvgDistinguishingDegree,
        Dimension::SumTime,
    ];
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::SumScore => "sum_score",
            Dimension::AvgDifficulty => "avg_difficulty",
            Dimension::AvgDistinguishingDegree => "avg_distinguishing_degree",
            Dimension::SumTime => "sum_time",
        };
        f.write_str(name)
    }
}

fn default_enabled() -> bool {
    true
}

/// Per-dimension "use this constraint" toggles from the authoring form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionToggles {
    #[serde(default = "default_enabled")]
    pub sum_score: bool,
    #[serde(default = "default_enabled")]
    pub avg_difficulty: bool,
    #[serde(default = "default_enabled")]
    pub avg_distinguishing_degree: bool,
    #[serde(default = "default_enabled")]
    pub sum_time: bool,
}

impl Default for DimensionToggles {
    fn default() -> Self {
        Self {
            sum_score: true,
            avg_difficulty: true,
            avg_distinguishing_degree: true,
            sum_time: true,
        }
    }
}

impl DimensionToggles {
    pub fn is_enabled(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::SumScore => self.sum_score,
            Dimension::AvgDifficulty => self.avg_difficulty,
            Dimension::AvgDistinguishingDegree => self.avg_distinguishing_degree,
            Dimension::SumTime => self.sum_time,
        }
    }

    pub fn any(&self) -> bool {
        Dimension::ALL.iter().any(|&d| self.is_enabled(d))
    }
}

/// Desired aggregate statistics of the assembled quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProfile {
    /// Number of questions to select.
    pub question_count: usize,
    /// Desired total score.
    pub sum_score: f64,
    /// Desired average difficulty (0.0-1.0).
    pub avg_difficulty: f64,
    /// Desired average distinguishing degree (0.0-1.0).
    pub avg_distinguishing_degree: f64,
    /// Desired total solution time in seconds.
    pub sum_time: f64,
    /// Which dimensions take part in the fitness.
    #[serde(default)]
    pub enabled: DimensionToggles,
    /// Desired number of questions per question type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_counts: Option<BTreeMap<String, usize>>,
    /// Desired number of questions per category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_counts: Option<BTreeMap<u64, usize>>,
}

impl TargetProfile {
    /// Create a validated profile with every dimension enabled.
    pub fn new(
        question_count: usize,
        sum_score: f64,
        avg_difficulty: f64,
        avg_distinguishing_degree: f64,
        sum_time: f64,
    ) -> Result<Self, ConfigError> {
        let target = Self {
            question_count,
            sum_score,
            avg_difficulty,
            avg_distinguishing_degree,
            sum_time,
            enabled: DimensionToggles::default(),
            type_counts: None,
            category_counts: None,
        };
        target.validate()?;
        Ok(target)
    }

    /// Replace the dimension toggles.
    pub fn with_toggles(mut self, enabled: DimensionToggles) -> Self {
        self.enabled = enabled;
        self
    }

    /// Request a number of questions per type.
    pub fn with_type_counts(mut self, counts: BTreeMap<String, usize>) -> Self {
        self.type_counts = Some(counts);
        self
    }

    /// Request a number of questions per category.
    pub fn with_category_counts(mut self, counts: BTreeMap<u64, usize>) -> Self {
        self.category_counts = Some(counts);
        self
    }

    /// Target value of a dimension.
    pub fn value(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::SumScore => self.sum_score,
            Dimension::AvgDifficulty => self.avg_difficulty,
            Dimension::AvgDistinguishingDegree => self.avg_distinguishing_degree,
            Dimension::SumTime => self.sum_time,
        }
    }

    /// True when type or category composition is requested.
    pub fn has_composition(&self) -> bool {
        self.type_counts.as_ref().is_some_and(|m| !m.is_empty())
            || self.category_counts.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Validate the profile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.question_count == 0 {
            return Err(ConfigError::InvalidQuestionCount);
        }

        for dimension in Dimension::ALL {
            let value = self.value(dimension);
            let in_range = match dimension {
                Dimension::AvgDifficulty | Dimension::AvgDistinguishingDegree => {
                    (0.0..=1.0).contains(&value)
                }
                Dimension::SumScore | Dimension::SumTime => value.is_finite() && value >= 0.0,
            };
            if !in_range {
                return Err(ConfigError::InvalidTarget { dimension, value });
            }
        }

        let check_counts = |name: &'static str, total: usize| {
            if total > self.question_count {
                Err(ConfigError::CompositionTooLarge {
                    name,
                    total,
                    question_count: self.question_count,
                })
            } else {
                Ok(())
            }
        };
        if let Some(counts) = &self.type_counts {
            check_counts("type", counts.values().sum())?;
        }
        if let Some(counts) = &self.category_counts {
            check_counts("category", counts.values().sum())?;
        }

        if !self.enabled.any() && !self.has_composition() {
            return Err(ConfigError::NoActiveConstraints);
        }

        Ok(())
    }
}

/// Load a target profile from a JSON file.
pub fn load_target<P: AsRef<Path>>(path: P) -> io::Result<TargetProfile> {
    let content = fs::read_to_string(path)?;
    let target: TargetProfile = serde_json::from_str(&content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    target
        .validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(target)
}
