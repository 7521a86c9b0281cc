//! Community gate
//!
//! Registration is limited to people who know the community's answers. The
//! questions and answers come from configuration; answers are compared
//! trimmed and case-insensitively.

use serde::{Deserialize, Serialize};

use thrift_common::{Error, Result};

/// Message returned when the answers do not match
pub const ACCESS_DENIED: &str = "Access Denied: Your answers do not match our community records.";

/// One gate question with its expected answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityQuestion {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub questions: Vec<CommunityQuestion>,
}

impl GateConfig {
    /// Load from `COMMUNITY_QUESTIONS`: a JSON array of `{question, answer}`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let raw = std::env::var("COMMUNITY_QUESTIONS").map_err(|_| {
            Error::Validation("COMMUNITY_QUESTIONS environment variable is required".to_string())
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let questions: Vec<CommunityQuestion> = serde_json::from_str(raw).map_err(|e| {
            Error::Validation(format!("COMMUNITY_QUESTIONS is not valid JSON: {}", e))
        })?;

        if questions.is_empty() {
            return Err(Error::Validation(
                "At least one community question is required".to_string(),
            ));
        }
        if questions
            .iter()
            .any(|q| q.question.trim().is_empty() || q.answer.trim().is_empty())
        {
            return Err(Error::Validation(
                "Community questions and answers must not be empty".to_string(),
            ));
        }

        Ok(Self { questions })
    }
}

fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

#[derive(Debug, Clone)]
pub struct CommunityGate {
    questions: Vec<CommunityQuestion>,
}

impl CommunityGate {
    pub fn new(config: GateConfig) -> Self {
        Self {
            questions: config.questions,
        }
    }

    /// Question prompts, in order, without answers
    pub fn prompts(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.question.clone()).collect()
    }

    /// Check one answer per question, in question order
    pub fn verify(&self, answers: &[String]) -> Result<()> {
        if answers.len() != self.questions.len() {
            return Err(Error::Validation(format!(
                "Expected {} answers, got {}",
                self.questions.len(),
                answers.len()
            )));
        }

        let all_match = self
            .questions
            .iter()
            .zip(answers)
            .all(|(q, given)| normalize(given) == normalize(&q.answer));

        if all_match {
            Ok(())
        } else {
            Err(Error::Authorization(ACCESS_DENIED.to_string()))
        }
    }
}
