//! Optional context tags that shape the decompose and draft prompts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Target industry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Industry {
    #[default]
    General,
    Healthcare,
    Finance,
    #[serde(rename = "E-commerce")]
    ECommerce,
    Education,
    #[serde(rename = "SaaS")]
    Saas,
    Government,
    Entertainment,
}

impl Industry {
    pub const ALL: [Industry; 8] = [
        Industry::General,
        Industry::Healthcare,
        Industry::Finance,
        Industry::ECommerce,
        Industry::Education,
        Industry::Saas,
        Industry::Government,
        Industry::Entertainment,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Industry::General => "General",
            Industry::Healthcare => "Healthcare",
            Industry::Finance => "Finance",
            Industry::ECommerce => "E-commerce",
            Industry::Education => "Education",
            Industry::Saas => "SaaS",
            Industry::Government => "Government",
            Industry::Entertainment => "Entertainment",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Industry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase();
        Industry::ALL
            .into_iter()
            .find(|i| {
                i.label()
                    .chars()
                    .filter(|c| c.is_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
                    == wanted
            })
            .ok_or_else(|| {
                let options: Vec<&str> = Industry::ALL.iter().map(|i| i.label()).collect();
                format!("unknown industry '{}' (expected one of: {})", s, options.join(", "))
            })
    }
}

/// Size of the team that will build the feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamSize {
    #[default]
    Solo,
    #[serde(rename = "2-5")]
    Small,
    #[serde(rename = "6-20")]
    Medium,
    #[serde(rename = "21-50")]
    Large,
    #[serde(rename = "51+")]
    Enterprise,
}

impl TeamSize {
    pub const ALL: [TeamSize; 5] = [
        TeamSize::Solo,
        TeamSize::Small,
        TeamSize::Medium,
        TeamSize::Large,
        TeamSize::Enterprise,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TeamSize::Solo => "Solo",
            TeamSize::Small => "2-5",
            TeamSize::Medium => "6-20",
            TeamSize::Large => "21-50",
            TeamSize::Enterprise => "51+",
        }
    }
}

impl fmt::Display for TeamSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TeamSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TeamSize::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let options: Vec<&str> = TeamSize::ALL.iter().map(|t| t.label()).collect();
                format!("unknown team size '{}' (expected one of: {})", s, options.join(", "))
            })
    }
}

/// Context flags for one run
///
/// Each flag that is set (or differs from its default, for the two
/// enumerations) adds a fixed instruction clause to the prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureContext {
    pub industry: Industry,
    pub team_size: TeamSize,
    pub include_security: bool,
    pub include_accessibility: bool,
    pub include_testing: bool,
    pub include_deployment: bool,
    pub include_cost: bool,
    pub include_api: bool,
}

impl Default for FeatureContext {
    fn default() -> Self {
        Self {
            industry: Industry::General,
            team_size: TeamSize::Solo,
            include_security: true,
            include_accessibility: false,
            include_testing: true,
            include_deployment: false,
            include_cost: true,
            include_api: false,
        }
    }
}

impl FeatureContext {
    /// A context that adds no clauses at all
    pub fn bare() -> Self {
        Self {
            include_security: false,
            include_testing: false,
            include_cost: false,
            ..Default::default()
        }
    }

    /// Instruction clauses, in a fixed order
    pub fn clauses(&self) -> Vec<String> {
        let mut clauses = Vec::new();

        if self.industry != Industry::General {
            clauses.push(format!("Industry: {}", self.industry));
        }
        if self.team_size != TeamSize::Solo {
            clauses.push(format!("Team Size: {}", self.team_size));
        }
        if self.include_security {
            clauses.push(
                "Include security requirements (authentication, authorization, encryption, data protection)."
                    .to_string(),
            );
        }
        if self.include_accessibility {
            clauses.push("Include WCAG 2.1 Level AA accessibility requirements.".to_string());
        }
        if self.include_testing {
            clauses.push("Include comprehensive testing strategy and test cases.".to_string());
        }
        if self.include_deployment {
            clauses.push("Include deployment, infrastructure, and scalability considerations.".to_string());
        }
        if self.include_cost {
            clauses.push("Include cost estimation and resource requirements.".to_string());
        }
        if self.include_api {
            clauses.push("Include RESTful API endpoint specifications.".to_string());
        }

        debug!(clause_count = clauses.len(), "FeatureContext::clauses: built");
        clauses
    }
}
