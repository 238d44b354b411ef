//! Sponsorship figures published by `ddev/sponsorship-data`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsorshipData {
    pub github_ddev_sponsorships: GitHubSponsorship,
    pub github_rfay_sponsorships: GitHubSponsorship,
    pub monthly_invoiced_sponsorships: InvoicedSponsorship,
    pub annual_invoiced_sponsorships: AnnualSponsorship,
    pub paypal_sponsorships: i64,
    pub total_monthly_average_income: f64,
    pub sponsorship_goals: Vec<SponsorshipGoalItem>,
    pub current_goal: SponsorshipCurrentGoal,
    pub appreciation_message_template: String,
    #[serde(alias = "sponsor_appreciation_message")]
    pub appreciation_message: String,
    pub monthly_historical_data: BTreeMap<String, SponsorshipHistoryEntry>,
    pub updated_datetime: Option<DateTime<Utc>>,
}

impl SponsorshipData {
    /// Sponsors across the GitHub and invoiced channels.
    pub fn total_sponsors(&self) -> i64 {
        self.github_ddev_sponsorships.total_sponsors
            + self.github_rfay_sponsorships.total_sponsors
            + self.monthly_invoiced_sponsorships.total_sponsors
            + self.annual_invoiced_sponsorships.total_sponsors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSponsorship {
    pub total_monthly_sponsorship: i64,
    pub total_sponsors: i64,
    pub sponsors_per_tier: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoicedSponsorship {
    pub total_monthly_sponsorship: i64,
    pub total_sponsors: i64,
    pub monthly_sponsors_per_tier: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnualSponsorship {
    pub total_annual_sponsorships: i64,
    pub total_sponsors: i64,
    pub monthly_equivalent_sponsorship: i64,
    pub annual_sponsors_per_tier: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsorshipGoalItem {
    pub goal_id: String,
    pub description: String,
    pub target_amount: f64,
    pub goal_creation_date: String,
    pub goal_target_date: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsorshipCurrentGoal {
    pub goal_id: String,
    pub target_amount: f64,
    pub progress_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsorshipHistoryEntry {
    pub date: String,
    pub total_monthly_average_income: f64,
}

/// Thank-you text scaled to the monthly income.
pub fn appreciation_text(income: f64, sponsors: i64) -> String {
    if income >= 5000.0 {
        format!("DDEV is thriving with ${income:.0}/month from {sponsors} amazing sponsors! This sustainable funding helps us deliver the best local development experience. Thank you for being part of our success!")
    } else if income >= 2500.0 {
        format!("DDEV is growing strong with ${income:.0}/month from {sponsors} generous sponsors! Your support helps us maintain and improve this project. Thank you for making DDEV better!")
    } else if income >= 1000.0 {
        format!("DDEV receives ${income:.0}/month from {sponsors} wonderful sponsors! This community support helps keep the project healthy and active. We're grateful for every contribution!")
    } else if income >= 500.0 {
        format!("DDEV has ${income:.0}/month from {sponsors} supportive sponsors! Every contribution helps us maintain this open-source project. Consider sponsoring us to help DDEV grow!")
    } else {
        format!("DDEV currently receives ${income:.0}/month from {sponsors} sponsors. We need your support to keep this project thriving! Consider becoming a sponsor at github.com/sponsors/ddev")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "github_ddev_sponsorships": {"total_monthly_sponsorship": 3000, "total_sponsors": 80, "sponsors_per_tier": {"5": 40}},
      "github_rfay_sponsorships": {"total_monthly_sponsorship": 200, "total_sponsors": 12},
      "monthly_invoiced_sponsorships": {"total_monthly_sponsorship": 900, "total_sponsors": 3},
      "annual_invoiced_sponsorships": {"total_annual_sponsorships": 1200, "total_sponsors": 2, "monthly_equivalent_sponsorship": 100},
      "paypal_sponsorships": 1,
      "total_monthly_average_income": 4200.5,
      "current_goal": {"goal_id": "g1", "target_amount": 12000, "progress_percentage": 35},
      "sponsor_appreciation_message": "Thanks to all sponsors!",
      "updated_datetime": "2025-06-01T12:00:00Z"
    }"#;

    #[test]
    fn test_decode_and_totals() {
        let data: SponsorshipData = serde_json::from_str(SAMPLE).unwrap();

        assert_eq!(data.total_sponsors(), 97);
        assert_eq!(data.total_monthly_average_income, 4200.5);
        assert_eq!(data.github_ddev_sponsorships.sponsors_per_tier["5"], 40);
        assert_eq!(data.appreciation_message, "Thanks to all sponsors!");
        assert!(data.updated_datetime.is_some());
    }

    #[test]
    fn test_appreciation_tiers() {
        assert!(appreciation_text(6000.0, 10)
            .starts_with("DDEV is thriving with $6000/month from 10"));
        assert!(appreciation_text(2500.0, 5).starts_with("DDEV is growing strong"));
        assert!(appreciation_text(1000.4, 5).starts_with("DDEV receives $1000/month"));
        assert!(appreciation_text(500.0, 5).starts_with("DDEV has $500/month"));
        assert!(appreciation_text(10.0, 1).starts_with("DDEV currently receives $10/month"));
    }
}
