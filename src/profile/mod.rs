//! Profile accumulation
//!
//! Merges each turn's extracted facts into the conversation's profile.
//! Values only ever overwrite when they carry information, so a profile
//! is enriched turn by turn and never silently cleared.

pub mod extraction;

pub use extraction::{parse_extraction, strip_code_fence};

use crate::median;
use crate::models::{ProfileUpdate, UserProfile};
use crate::region;

/// Core fields counted toward matching readiness
pub const CORE_FIELD_COUNT: usize = 5;

/// Known core fields needed before programs are matched
pub const MIN_CORE_FIELDS_FOR_MATCH: usize = 3;

impl UserProfile {
    /// Merge a sparse update, then recompute derived fields
    pub fn merge(&mut self, update: ProfileUpdate) {
        merge_scalar(&mut self.age, update.age);
        merge_scalar(&mut self.income, update.income);
        merge_scalar(&mut self.income_type, update.income_type);
        merge_text(&mut self.income_scope, update.income_scope);
        merge_text(&mut self.residence, update.residence);
        merge_scalar(&mut self.is_seoul_resident, update.is_seoul_resident);
        merge_text(&mut self.employment_status, update.employment_status);
        merge_text(&mut self.housing_type, update.housing_type);
        merge_list(&mut self.special_conditions, update.special_conditions);
        merge_list(&mut self.needs, update.needs);
        merge_scalar(&mut self.household_size, update.household_size);

        self.refresh_derived();
    }

    /// Residence normalization and median estimate
    pub fn refresh_derived(&mut self) {
        region::normalize_profile(self);

        match median::estimate(self.income, self.income_type, self.household_size) {
            Some(estimate) => {
                self.median_percent = Some(estimate.percent);
                self.median_bracket = Some(estimate.bracket.to_string());
            }
            None => {
                self.median_percent = None;
                self.median_bracket = None;
            }
        }
    }

    /// How many of age / residence / employment / housing / income are known
    pub fn core_field_count(&self) -> usize {
        self.core_fields().iter().filter(|(_, known)| *known).count()
    }

    /// Korean labels of the core fields still unknown, in asking order
    pub fn missing_core_fields(&self) -> Vec<&'static str> {
        self.core_fields()
            .into_iter()
            .filter(|(_, known)| !known)
            .map(|(label, _)| label)
            .collect()
    }

    fn core_fields(&self) -> [(&'static str, bool); CORE_FIELD_COUNT] {
        [
            ("나이", self.age.is_some()),
            ("거주지", has_text(&self.residence)),
            ("고용 상태", has_text(&self.employment_status)),
            ("주거 형태", has_text(&self.housing_type)),
            ("소득", self.income.is_some()),
        ]
    }

    pub fn is_ready_for_matching(&self) -> bool {
        self.core_field_count() >= MIN_CORE_FIELDS_FOR_MATCH
    }

    /// Case-insensitive substring match over special conditions
    pub fn has_special_condition(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.special_conditions
            .iter()
            .any(|s| s.to_lowercase().contains(&tag))
    }

    pub fn is_newlywed(&self) -> bool {
        self.has_special_condition("신혼")
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn merge_scalar<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

fn merge_text(slot: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming {
        let value = value.trim();
        if !value.is_empty() {
            *slot = Some(value.to_string());
        }
    }
}

fn merge_list(slot: &mut Vec<String>, incoming: Vec<String>) {
    let cleaned: Vec<String> = incoming
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if !cleaned.is_empty() {
        *slot = cleaned;
    }
}
