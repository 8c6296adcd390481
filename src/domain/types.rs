//! Shared domain enumerations. Persisted values are stored as TEXT.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::UnknownVariant;

/// Logical collection an account record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Student,
    ServiceProvider,
    Admin,
}

impl EntityKind {
    /// Prefix used in cache keys (`"{prefix}-{user_id}"`).
    pub fn cache_prefix(self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::ServiceProvider => "sp",
            EntityKind::Admin => "admin",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::ServiceProvider => "service_provider",
            EntityKind::Admin => "admin",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
}

impl EmploymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
            EmploymentType::Freelance => "freelance",
        }
    }
}

impl FromStr for EmploymentType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "full_time" => Ok(EmploymentType::FullTime),
            "part_time" => Ok(EmploymentType::PartTime),
            "contract" => Ok(EmploymentType::Contract),
            "internship" => Ok(EmploymentType::Internship),
            "freelance" => Ok(EmploymentType::Freelance),
            other => Err(UnknownVariant::new("employment type", other)),
        }
    }
}

/// Identity documents a student uploads during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityDocumentKind {
    Nysc,
    ValidId,
}

impl IdentityDocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentityDocumentKind::Nysc => "nysc",
            IdentityDocumentKind::ValidId => "valid_id",
        }
    }
}

impl FromStr for IdentityDocumentKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "nysc" => Ok(IdentityDocumentKind::Nysc),
            "valid_id" => Ok(IdentityDocumentKind::ValidId),
            other => Err(UnknownVariant::new("identity document kind", other)),
        }
    }
}

/// Onboarding milestones recorded on student and service-provider rows.
///
/// Values are ordinal. Each write records the step it performed, so a row
/// can move back (re-selecting a category resets it to `Category`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OnboardingStep {
    Category = 1,
    Skills = 2,
    IdentityDocuments = 3,
    Education = 4,
    WorkExperience = 5,
    ProfileSummary = 8,
    PersonalData = 10,
}

impl OnboardingStep {
    pub fn ordinal(self) -> i32 {
        self as i32
    }
}
