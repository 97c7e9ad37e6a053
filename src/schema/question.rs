//! Candidate question types and the question pool for one assembly run.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Identifier of a question in the question bank.
pub type QuestionId = u64;

fn default_qtype() -> String {
    "multichoice".to_string()
}

/// One selectable question with its assembly attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateQuestion {
    /// Unique question identifier.
    pub id: QuestionId,
    /// Score awarded for the question.
    pub mark: f64,
    /// Difficulty (0.0-1.0).
    pub difficulty: f64,
    /// Distinguishing power (0.0-1.0).
    pub distinguishing_degree: f64,
    /// Expected solution time in seconds.
    pub solution_time: f64,
    /// Question type name (e.g. `multichoice`, `truefalse`).
    #[serde(default = "default_qtype", rename = "type")]
    pub qtype: String,
    /// Question bank category.
    #[serde(default)]
    pub category_id: u64,
}

impl CandidateQuestion {
    /// Create a validated multichoice question in category 0.
    pub fn new(
        id: QuestionId,
        mark: f64,
        difficulty: f64,
        distinguishing_degree: f64,
        solution_time: f64,
    ) -> Result<Self, ConfigError> {
        let question = Self {
            id,
            mark,
            difficulty,
            distinguishing_degree,
            solution_time,
            qtype: default_qtype(),
            category_id: 0,
        };
        question.validate()?;
        Ok(question)
    }

    /// Set the question type.
    pub fn with_type(mut self, qtype: impl Into<String>) -> Self {
        self.qtype = qtype.into();
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category_id: u64) -> Self {
        self.category_id = category_id;
        self
    }

    /// Validate numeric attributes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, value: f64| ConfigError::InvalidQuestion {
            id: self.id,
            field,
            value,
        };

        if !self.mark.is_finite() || self.mark < 0.0 {
            return Err(invalid("mark", self.mark));
        }
        if !(0.0..=1.0).contains(&self.difficulty) {
            return Err(invalid("difficulty", self.difficulty));
        }
        if !(0.0..=1.0).contains(&self.distinguishing_degree) {
            return Err(invalid("distinguishing_degree", self.distinguishing_degree));
        }
        if !self.solution_time.is_finite() || self.solution_time < 0.0 {
            return Err(invalid("solution_time", self.solution_time));
        }
        Ok(())
    }
}

/// Validated set of candidate questions, indexed by id.
///
/// Iteration order is the order the questions were supplied in. The engine
/// enumerates unused ids in this order, which keeps seeded runs reproducible.
#[derive(Debug, Clone)]
pub struct QuestionPool {
    questions: Vec<CandidateQuestion>,
    index: HashMap<QuestionId, usize>,
}

impl QuestionPool {
    /// Build a pool, rejecting invalid questions and duplicate ids.
    pub fn new(questions: Vec<CandidateQuestion>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(questions.len());
        for (i, question) in questions.iter().enumerate() {
            question.validate()?;
            if index.insert(question.id, i).is_some() {
                return Err(ConfigError::DuplicateQuestion(question.id));
            }
        }
        Ok(Self { questions, index })
    }

    /// Number of candidate questions.
    #[inline]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by id.
    #[inline]
    pub fn get(&self, id: QuestionId) -> Option<&CandidateQuestion> {
        self.index.get(&id).map(|&i| &self.questions[i])
    }

    #[inline]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.index.contains_key(&id)
    }

    /// Questions in pool order.
    pub fn questions(&self) -> &[CandidateQuestion] {
        &self.questions
    }

    /// Question ids in pool order.
    pub fn ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.iter().map(|q| q.id)
    }
}

/// Load a pool from a JSON array of questions.
pub fn load_pool<P: AsRef<Path>>(path: P) -> io::Result<QuestionPool> {
    let content = fs::read_to_string(path)?;
    let questions: Vec<CandidateQuestion> = serde_json::from_str(&content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    QuestionPool::new(questions).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
