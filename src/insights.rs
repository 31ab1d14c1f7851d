//! Canned marketing recommendations for cluster profiles
//!
//! Each business type has an ordered list of rules. A rule matches a
//! cluster when all of its threshold conditions hold on the cluster means;
//! the first match wins and clusters matching nothing get the generic
//! fallback.

use crate::business::BusinessType;
use crate::model::{ClusterProfile, Feature};
use serde::Serialize;

/// Threshold comparison on a cluster mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    AtLeast,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Condition {
    pub feature: Feature,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl Condition {
    pub const fn at_least(feature: Feature, threshold: f64) -> Self {
        Self {
            feature,
            comparison: Comparison::AtLeast,
            threshold,
        }
    }

    pub const fn below(feature: Feature, threshold: f64) -> Self {
        Self {
            feature,
            comparison: Comparison::Below,
            threshold,
        }
    }

    /// False when the profile has no mean for the feature
    pub fn holds(&self, profile: &ClusterProfile) -> bool {
        match profile.mean(self.feature) {
            Some(mean) => match self.comparison {
                Comparison::AtLeast => mean >= self.threshold,
                Comparison::Below => mean < self.threshold,
            },
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsightRule {
    pub label: &'static str,
    pub recommendation: &'static str,
    pub conditions: &'static [Condition],
}

impl InsightRule {
    pub fn matches(&self, profile: &ClusterProfile) -> bool {
        self.conditions.iter().all(|c| c.holds(profile))
    }
}

pub const FALLBACK_LABEL: &str = "General visitors";
pub const FALLBACK_RECOMMENDATION: &str =
    "Keep the splash-page welcome offer running and watch how this segment develops.";

use Feature::{Duration, FrequentVisitor, HourOfDay};

const RESTAURANT_RULES: &[InsightRule] = &[
    InsightRule {
        label: "Loyal diners",
        recommendation: "Launch a loyalty card or a members-only tasting night for regular diners.",
        conditions: &[
            Condition::at_least(Duration, 45.0),
            Condition::at_least(FrequentVisitor, 0.5),
        ],
    },
    InsightRule {
        label: "Grab-and-go",
        recommendation: "Promote breakfast combos and counter pre-orders for quick morning visits.",
        conditions: &[Condition::below(Duration, 20.0), Condition::below(HourOfDay, 11.0)],
    },
    InsightRule {
        label: "Lunch crowd",
        recommendation: "Push a fast set-lunch menu on the splash page between 11:00 and 15:00.",
        conditions: &[Condition::at_least(HourOfDay, 11.0), Condition::below(HourOfDay, 15.0)],
    },
    InsightRule {
        label: "Evening diners",
        recommendation: "Send dessert and drinks offers to guests still connected after dinner.",
        conditions: &[Condition::at_least(HourOfDay, 18.0)],
    },
];

const HOSPITAL_RULES: &[InsightRule] = &[
    InsightRule {
        label: "Long-stay visitors",
        recommendation: "Offer cafeteria meal vouchers and point families to quiet lounges.",
        conditions: &[Condition::at_least(Duration, 120.0)],
    },
    InsightRule {
        label: "Night visitors",
        recommendation: "Show late-night pharmacy and cafeteria opening hours on connect.",
        conditions: &[Condition::at_least(HourOfDay, 20.0)],
    },
    InsightRule {
        label: "Outpatients",
        recommendation: "Send appointment reminders and prescription pickup notices.",
        conditions: &[Condition::below(Duration, 45.0)],
    },
];

const BUSINESS_CAFE_RULES: &[InsightRule] = &[
    InsightRule {
        label: "Remote workers",
        recommendation: "Sell day passes with a reserved desk and bottomless coffee.",
        conditions: &[Condition::at_least(Duration, 90.0)],
    },
    InsightRule {
        label: "Regular members",
        recommendation: "Introduce a monthly membership with meeting-room credits.",
        conditions: &[Condition::at_least(FrequentVisitor, 0.5)],
    },
    InsightRule {
        label: "Meeting hoppers",
        recommendation: "Advertise bookable meeting pods and grab-and-go coffee in office hours.",
        conditions: &[
            Condition::below(Duration, 30.0),
            Condition::at_least(HourOfDay, 9.0),
            Condition::below(HourOfDay, 17.0),
        ],
    },
];

const BOUTIQUE_RULES: &[InsightRule] = &[
    InsightRule {
        label: "Returning fans",
        recommendation: "Invite returning shoppers to private previews of the new collection.",
        conditions: &[Condition::at_least(FrequentVisitor, 0.5)],
    },
    InsightRule {
        label: "Engaged shoppers",
        recommendation: "Offer a free styling session to guests who browse for over half an hour.",
        conditions: &[Condition::at_least(Duration, 30.0)],
    },
    InsightRule {
        label: "Window browsers",
        recommendation: "Send a first-visit discount code before the guest leaves the store.",
        conditions: &[Condition::below(Duration, 15.0)],
    },
];

const SUPERMARKET_RULES: &[InsightRule] = &[
    InsightRule {
        label: "Weekly stock-up",
        recommendation: "Send bulk-buy coupons and family pack promotions.",
        conditions: &[Condition::at_least(Duration, 40.0)],
    },
    InsightRule {
        label: "Morning shoppers",
        recommendation: "Announce fresh bakery and produce arrivals on connect before 10:00.",
        conditions: &[Condition::below(HourOfDay, 10.0)],
    },
    InsightRule {
        label: "Quick top-up",
        recommendation: "Highlight express checkout lanes and meal-deal bundles.",
        conditions: &[Condition::below(Duration, 15.0)],
    },
];

/// Ordered rule list for a business type
pub fn rules_for(business_type: BusinessType) -> &'static [InsightRule] {
    match business_type {
        BusinessType::Restaurant => RESTAURANT_RULES,
        BusinessType::Hospital => HOSPITAL_RULES,
        BusinessType::BusinessCafe => BUSINESS_CAFE_RULES,
        BusinessType::Boutique => BOUTIQUE_RULES,
        BusinessType::Supermarket => SUPERMARKET_RULES,
    }
}

/// Recommendation for one cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub cluster: usize,
    pub size: usize,
    pub label: String,
    pub recommendation: String,
    /// False when the generic fallback was used
    pub matched_rule: bool,
}

/// One recommendation per profile, in profile order
pub fn recommend(profiles: &[ClusterProfile], business_type: BusinessType) -> Vec<Insight> {
    let rules = rules_for(business_type);
    profiles
        .iter()
        .map(|profile| {
            let rule = rules.iter().find(|rule| rule.matches(profile));
            Insight {
                cluster: profile.cluster,
                size: profile.size,
                label: rule.map_or(FALLBACK_LABEL, |r| r.label).to_string(),
                recommendation: rule
                    .map_or(FALLBACK_RECOMMENDATION, |r| r.recommendation)
                    .to_string(),
                matched_rule: rule.is_some(),
            }
        })
        .collect()
}
