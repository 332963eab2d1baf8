//! Customer segment predicates.
//!
//! Segment labels are independent: one visit can be Repeat, Loyal and
//! Unsatisfied at once. `VisitBehavior` is the single exclusive label used by
//! the stacked month chart.

use crate::{config::SegmentThresholds, table::VisitRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Repeat,
    Churn,
    Loyal,
    Unsatisfied,
}

impl Segment {
    pub const ALL: [Segment; 4] = [Self::Repeat, Self::Churn, Self::Loyal, Self::Unsatisfied];
}

/// Exclusive per-row label: Repeat wins over Churn, everything else is Other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VisitBehavior {
    Repeat,
    Churn,
    Other,
}

impl SegmentThresholds {
    pub fn is_repeat(&self, r: &VisitRecord) -> bool {
        r.days_since_last_visit <= self.repeat_max_days
    }

    pub fn is_churn(&self, r: &VisitRecord) -> bool {
        r.days_since_last_visit > self.churn_min_days
    }

    pub fn is_loyal(&self, r: &VisitRecord) -> bool {
        (self.loyal_min_days..=self.loyal_max_days).contains(&r.days_since_last_visit)
    }

    pub fn is_unsatisfied(&self, r: &VisitRecord) -> bool {
        r.product_satisfaction <= self.unsatisfied_max_score
    }

    pub fn matches(&self, segment: Segment, r: &VisitRecord) -> bool {
        match segment {
            Segment::Repeat      => self.is_repeat(r),
            Segment::Churn       => self.is_churn(r),
            Segment::Loyal       => self.is_loyal(r),
            Segment::Unsatisfied => self.is_unsatisfied(r),
        }
    }

    pub fn classify(&self, r: &VisitRecord) -> VisitBehavior {
        if self.is_repeat(r) {
            VisitBehavior::Repeat
        } else if self.is_churn(r) {
            VisitBehavior::Churn
        } else {
            VisitBehavior::Other
        }
    }
}
