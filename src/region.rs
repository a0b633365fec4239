//! Region gazetteer, residence normalization and the service-area gate
//!
//! The service covers Seoul only. Residence text is classified against a
//! static list of Seoul districts and neighbourhood aliases, and against the
//! other metropolitan cities and provinces.

use crate::models::UserProfile;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Serviceable region token
pub const REGION_NAME: &str = "서울";

/// Fixed reply for users outside the service area
pub const OUT_OF_AREA_REPLY: &str = "죄송해요, 저는 **서울시 복지 전용 챗봇**이라 서울시 복지 정보만 안내해드릴 수 있어요 😢
다른 지역 복지 정보는 **[복지로(bokjiro.go.kr)](https://www.bokjiro.go.kr)**에서 확인하실 수 있어요!
전국 복지 정보를 한눈에 볼 수 있답니다.
혹시 서울로 이사 계획이 있으시거나, 서울 거주 가족분의 복지가 궁금하시면 말씀해주세요! 🙂";

lazy_static::lazy_static! {
    static ref SEOUL_GAZETTEER: Regex = Regex::new(
        r"(서울|종로|중구|용산|성동|광진|동대문|중랑|성북|강북|도봉|노원|은평|서대문|마포|양천|강서|구로|금천|영등포|동작|관악|서초|강남|송파|강동|왕십리|신촌|홍대|성수|잠실)"
    ).unwrap();

    static ref OTHER_REGIONS: Regex = Regex::new(
        r"(부산|인천|대구|대전|광주|울산|세종|경기|강원|충북|충남|전북|전남|경북|경남|제주)"
    ).unwrap();

    static ref REGION_TOKEN: Regex = Regex::new(r"서울\s*").unwrap();
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegionStatus {
    InRegion,
    OutOfRegion,
    /// Residence given but matches neither list
    Ambiguous,
}

/// Classify free-text residence
///
/// Other-region names are checked first: district names such as 중구 or
/// 강서 also exist in other cities ("대구 중구", "부산 강서구").
pub fn classify_residence(residence: &str) -> RegionStatus {
    if OTHER_REGIONS.is_match(residence) {
        RegionStatus::OutOfRegion
    } else if SEOUL_GAZETTEER.is_match(residence) {
        RegionStatus::InRegion
    } else {
        RegionStatus::Ambiguous
    }
}

/// First place name found in free text, other regions preferred
pub fn find_region_mention(text: &str) -> Option<&str> {
    OTHER_REGIONS
        .find(text)
        .or_else(|| SEOUL_GAZETTEER.find(text))
        .map(|m| m.as_str())
}

/// Canonical residence text
///
/// Seoul districts given without the city get the city prefix; residences
/// in another region lose any stray city token.
pub fn normalize_residence(residence: &str) -> String {
    let trimmed = residence.trim();

    match classify_residence(trimmed) {
        RegionStatus::OutOfRegion => {
            let cleaned = REGION_TOKEN.replace_all(trimmed, "");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                trimmed.to_string()
            } else {
                cleaned.to_string()
            }
        }
        RegionStatus::InRegion if !trimmed.contains(REGION_NAME) => {
            format!("{} {}", REGION_NAME, trimmed)
        }
        _ => trimmed.to_string(),
    }
}

/// Rewrite the profile's residence in place; runs after every merge
pub fn normalize_profile(profile: &mut UserProfile) {
    if let Some(residence) = profile.residence.as_deref() {
        if residence.trim().is_empty() {
            return;
        }
        profile.residence = Some(normalize_residence(residence));
    }
}

/// Decides whether a turn is answered by the out-of-area reply
pub struct RegionGate;

impl RegionGate {
    /// Region status from the strongest available signal
    ///
    /// The explicit residency flag wins over any residence text.
    pub fn status(profile: &UserProfile) -> Option<RegionStatus> {
        if let Some(is_resident) = profile.is_seoul_resident {
            return Some(if is_resident {
                RegionStatus::InRegion
            } else {
                RegionStatus::OutOfRegion
            });
        }

        profile
            .residence
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .map(classify_residence)
    }

    /// True only for a definite out-of-region signal
    pub fn is_out_of_area(profile: &UserProfile) -> bool {
        Self::status(profile) == Some(RegionStatus::OutOfRegion)
    }
}
