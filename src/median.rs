//! Median-income estimation
//!
//! Places a stated income against the statutory 2025 household median
//! income table (monthly, 만원). Pure and deterministic.

use crate::models::IncomePeriod;

/// Monthly 2025 median income by household size, 1..=7 persons
pub const MEDIAN_INCOME_2025: [f64; 7] = [
    239.2, // 2,392,013원
    393.3, // 3,932,658원
    502.5, // 5,025,353원
    609.8, // 6,097,773원
    710.8, // 7,108,192원
    806.5, // 8,064,805원
    898.8, // 8,988,428원
];

pub const BRACKET_50: &str = "중위소득 50% 이하 추정";
pub const BRACKET_60: &str = "중위소득 60% 이하 추정";
pub const BRACKET_100: &str = "중위소득 100% 이하 추정";
pub const BRACKET_OVER_100: &str = "중위소득 100% 초과 추정";

/// Estimated share of the household median and its bracket label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianEstimate {
    pub percent: i64,
    pub bracket: &'static str,
}

/// Median base for a household size
///
/// Households above seven persons extend the table by the 6→7 step per
/// extra member. Zero is not a household.
pub fn median_base(household_size: u32) -> Option<f64> {
    match household_size {
        0 => None,
        1..=7 => MEDIAN_INCOME_2025.get(household_size as usize - 1).copied(),
        _ => {
            let step = MEDIAN_INCOME_2025[6] - MEDIAN_INCOME_2025[5];
            let extra = f64::from(household_size - 7);
            Some(MEDIAN_INCOME_2025[6] + step * extra)
        }
    }
}

/// Estimate where an income sits relative to the household median
///
/// A missing household size counts as one person. The bracket is chosen
/// from the unrounded percentage; the reported percent rounds half to even.
pub fn estimate(
    income: Option<f64>,
    income_type: Option<IncomePeriod>,
    household_size: Option<u32>,
) -> Option<MedianEstimate> {
    let income = income?;

    let monthly_income = match income_type {
        Some(IncomePeriod::Annual) => income / 12.0,
        _ => income,
    };

    let size = household_size.filter(|s| *s > 0).unwrap_or(1);
    let base = median_base(size)?;

    let percent = monthly_income / base * 100.0;

    Some(MedianEstimate {
        percent: percent.round_ties_even() as i64,
        bracket: bracket_for(percent),
    })
}

fn bracket_for(percent: f64) -> &'static str {
    if percent <= 50.0 {
        BRACKET_50
    } else if percent <= 60.0 {
        BRACKET_60
    } else if percent <= 100.0 {
        BRACKET_100
    } else {
        BRACKET_OVER_100
    }
}
