//! The category decision table.
//!
//! Maps a report's category and specific issue to the four base severity factors. The table is
//! plain data: rules are evaluated in order and each matching rule overwrites the factors it
//! names. New categories are added by editing the table (or the YAML file that replaces it), not
//! the analyzer.
//!
//! ```yaml
//! categories:
//!   - category: Water Supply
//!     set: { infrastructure: 4, impact: 4 }
//!     issue_rules:
//!       - when_issue_contains: no water supply
//!         set: { urgency: 5, impact: 5 }
//! major_cities: [ranchi, jamshedpur]
//! ```

use crate::constants::{BASELINE_FACTOR, MAX_SEVERITY, MIN_SEVERITY};
use crate::{IntakeError, IntakeResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The four factors the weighted base score is computed from. Each lies in [1, 5].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SeverityFactors {
    pub urgency: u8,
    pub public_safety: u8,
    pub infrastructure: u8,
    pub impact: u8,
}

impl SeverityFactors {
    pub fn baseline() -> Self {
        Self {
            urgency: BASELINE_FACTOR,
            public_safety: BASELINE_FACTOR,
            infrastructure: BASELINE_FACTOR,
            impact: BASELINE_FACTOR,
        }
    }
}

/// Absolute factor values a rule assigns. Unset fields leave the factor untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactorLevels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_safety: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<u8>,
}

impl FactorLevels {
    fn apply(&self, factors: &mut SeverityFactors) {
        if let Some(v) = self.urgency {
            factors.urgency = v;
        }
        if let Some(v) = self.public_safety {
            factors.public_safety = v;
        }
        if let Some(v) = self.infrastructure {
            factors.infrastructure = v;
        }
        if let Some(v) = self.impact {
            factors.impact = v;
        }
    }

    fn validate(&self, context: &str) -> IntakeResult<()> {
        let fields = [
            ("urgency", self.urgency),
            ("public_safety", self.public_safety),
            ("infrastructure", self.infrastructure),
            ("impact", self.impact),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&v) {
                    return Err(IntakeError::InvalidArgument(format!(
                        "{context}: {name} must be within [{MIN_SEVERITY}, {MAX_SEVERITY}], got {v}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Applies when the report description mentions any of the listed words.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Escalation {
    pub when_description_contains: Vec<String>,
    pub set: FactorLevels,
}

/// Applies when the specific issue contains `when_issue_contains` (case-insensitive).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssueRule {
    pub when_issue_contains: String,
    pub set: FactorLevels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalate: Option<Escalation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRule {
    pub category: String,
    #[serde(default)]
    pub set: FactorLevels,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue_rules: Vec<IssueRule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityTable {
    pub categories: Vec<CategoryRule>,
    /// Regions whose name contains one of these (case-insensitive) get +1 impact, capped at 5.
    #[serde(default)]
    pub major_cities: Vec<String>,
}

fn levels(
    urgency: Option<u8>,
    public_safety: Option<u8>,
    infrastructure: Option<u8>,
    impact: Option<u8>,
) -> FactorLevels {
    FactorLevels {
        urgency,
        public_safety,
        infrastructure,
        impact,
    }
}

fn issue_rule(pattern: &str, set: FactorLevels) -> IssueRule {
    IssueRule {
        when_issue_contains: pattern.into(),
        set,
        escalate: None,
    }
}

impl SeverityTable {
    /// The municipal policy table the service ships with.
    pub fn builtin() -> Self {
        Self {
            categories: vec![
                CategoryRule {
                    category: "Roads & Transport".into(),
                    set: levels(None, Some(4), Some(4), None),
                    issue_rules: vec![
                        IssueRule {
                            when_issue_contains: "pothole".into(),
                            set: levels(Some(3), None, None, None),
                            escalate: Some(Escalation {
                                when_description_contains: vec![
                                    "major".into(),
                                    "deep".into(),
                                    "large".into(),
                                ],
                                set: levels(Some(4), Some(5), None, None),
                            }),
                        },
                        issue_rule("traffic signal", levels(Some(5), Some(5), None, Some(4))),
                    ],
                },
                CategoryRule {
                    category: "Water Supply".into(),
                    set: levels(None, None, Some(4), Some(4)),
                    issue_rules: vec![
                        issue_rule("no water supply", levels(Some(5), None, None, Some(5))),
                        issue_rule("contaminated", levels(Some(4), Some(5), None, None)),
                    ],
                },
                CategoryRule {
                    category: "Waste Management".into(),
                    set: levels(None, Some(3), None, None),
                    issue_rules: vec![issue_rule(
                        "overflowing",
                        levels(Some(4), Some(4), None, None),
                    )],
                },
                CategoryRule {
                    category: "Public Facilities".into(),
                    set: FactorLevels::default(),
                    issue_rules: vec![
                        issue_rule("electrical", levels(Some(4), Some(5), None, None)),
                        issue_rule("manhole", levels(Some(5), Some(5), None, None)),
                    ],
                },
            ],
            major_cities: vec![
                "ranchi".into(),
                "jamshedpur".into(),
                "dhanbad".into(),
                "bokaro".into(),
            ],
        }
    }

    /// Parse and validate a table from YAML.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::TableParse` for malformed YAML and `IntakeError::InvalidArgument`
    /// for out-of-range factor values or blank patterns.
    pub fn from_yaml_str(yaml: &str) -> IntakeResult<Self> {
        let table: SeverityTable = serde_yaml::from_str(yaml).map_err(IntakeError::TableParse)?;
        table.validate()?;
        Ok(table)
    }

    /// # Errors
    ///
    /// As [`SeverityTable::from_yaml_str`], plus `IntakeError::TableRead` if the file cannot be
    /// read.
    pub fn from_yaml_file(path: &Path) -> IntakeResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(IntakeError::TableRead)?;
        Self::from_yaml_str(&yaml)
    }

    /// # Errors
    ///
    /// Returns `IntakeError::TableSerialize` if serialization fails.
    pub fn to_yaml_string(&self) -> IntakeResult<String> {
        serde_yaml::to_string(self).map_err(IntakeError::TableSerialize)
    }

    /// Check every factor value lies in [1, 5] and every pattern is non-blank.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError::InvalidArgument` naming the offending rule.
    pub fn validate(&self) -> IntakeResult<()> {
        for rule in &self.categories {
            if rule.category.trim().is_empty() {
                return Err(IntakeError::InvalidArgument(
                    "severity table category name cannot be empty".into(),
                ));
            }
            rule.set.validate(&rule.category)?;

            for issue in &rule.issue_rules {
                let context = format!("{} / {}", rule.category, issue.when_issue_contains);
                if issue.when_issue_contains.trim().is_empty() {
                    return Err(IntakeError::InvalidArgument(format!(
                        "{}: issue pattern cannot be empty",
                        rule.category
                    )));
                }
                issue.set.validate(&context)?;

                if let Some(escalation) = &issue.escalate {
                    if escalation
                        .when_description_contains
                        .iter()
                        .any(|w| w.trim().is_empty())
                    {
                        return Err(IntakeError::InvalidArgument(format!(
                            "{context}: escalation words cannot be empty"
                        )));
                    }
                    escalation.set.validate(&context)?;
                }
            }
        }

        if self.major_cities.iter().any(|c| c.trim().is_empty()) {
            return Err(IntakeError::InvalidArgument(
                "severity table major city names cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Compute the four base factors for a report, including the regional impact bump.
    pub fn factors_for(
        &self,
        category: &str,
        specific_issue: &str,
        description: &str,
        region: &str,
    ) -> SeverityFactors {
        let mut factors = SeverityFactors::baseline();

        let category = category.trim().to_lowercase();
        let issue = specific_issue.to_lowercase();
        let description = description.to_lowercase();

        if let Some(rule) = self
            .categories
            .iter()
            .find(|r| r.category.trim().to_lowercase() == category)
        {
            rule.set.apply(&mut factors);

            for issue_rule in &rule.issue_rules {
                if !issue.contains(&issue_rule.when_issue_contains.to_lowercase()) {
                    continue;
                }
                issue_rule.set.apply(&mut factors);

                if let Some(escalation) = &issue_rule.escalate {
                    if escalation
                        .when_description_contains
                        .iter()
                        .any(|w| description.contains(&w.to_lowercase()))
                    {
                        escalation.set.apply(&mut factors);
                    }
                }
            }
        }

        if self.is_major_city(region) {
            factors.impact = (factors.impact + 1).min(MAX_SEVERITY);
        }

        factors
    }

    pub fn is_major_city(&self, region: &str) -> bool {
        let region = region.to_lowercase();
        self.major_cities
            .iter()
            .any(|city| region.contains(&city.to_lowercase()))
    }
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self::builtin()
    }
}
