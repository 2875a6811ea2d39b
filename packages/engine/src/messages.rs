//! Localized advisory text.

use accident_risk_accident_models::RiskLevel;
use accident_risk_engine_models::{Language, RiskMessage};

/// Message and warning shown for a point assessment at `level`.
#[must_use]
pub fn risk_message(level: RiskLevel, language: Language) -> RiskMessage {
    let (message, warning) = match (language, level) {
        (Language::Vi, RiskLevel::Low) => (
            "Đoạn đường an toàn",
            "Vẫn cần chú ý quan sát khi lái xe",
        ),
        (Language::Vi, RiskLevel::Medium) => (
            "Đoạn đường hay xảy ra tai nạn, xin chú ý",
            "Giảm tốc độ và tăng cường quan sát",
        ),
        (Language::Vi, RiskLevel::High) => (
            "Đoạn đường có mức độ tai nạn cao, xin lái xe cẩn thận",
            "Cực kỳ nguy hiểm! Giảm tốc độ và cẩn thận tối đa",
        ),
        (Language::En, RiskLevel::Low) => ("Safe road segment", "Stay alert while driving"),
        (Language::En, RiskLevel::Medium) => (
            "Moderate accident risk area, please be careful",
            "Reduce speed and increase awareness",
        ),
        (Language::En, RiskLevel::High) => (
            "High accident risk area, drive with extreme caution",
            "Very dangerous! Reduce speed and be extremely careful",
        ),
    };

    RiskMessage {
        message: message.to_string(),
        warning: warning.to_string(),
    }
}

/// Advice for a route with `count` high-risk legs.
#[must_use]
pub fn dangerous_legs_advice(count: u32, language: Language) -> String {
    match language {
        Language::Vi => {
            format!("Tuyến đường có {count} đoạn nguy hiểm. Cân nhắc chọn tuyến đường khác.")
        }
        Language::En => format!(
            "The route has {count} dangerous segment(s). Consider choosing another route."
        ),
    }
}

/// Advice for a route whose overall level is high.
#[must_use]
pub const fn high_overall_advice(language: Language) -> &'static str {
    match language {
        Language::Vi => "Mức độ rủi ro tổng thể cao. Giảm tốc độ và tăng cường cảnh giác.",
        Language::En => "Overall risk is high. Reduce speed and stay alert.",
    }
}

/// Advice for a route with an elevated mean score.
#[must_use]
pub const fn timing_advice(language: Language) -> &'static str {
    match language {
        Language::Vi => "Tránh di chuyển vào giờ cao điểm hoặc thời tiết xấu nếu có thể.",
        Language::En => "Avoid travelling at rush hour or in bad weather if possible.",
    }
}

/// Advice for a route that triggered nothing else.
#[must_use]
pub const fn safe_route_advice(language: Language) -> &'static str {
    match language {
        Language::Vi => "Tuyến đường tương đối an toàn. Vẫn cần chú ý quan sát.",
        Language::En => "The route is relatively safe. Stay attentive.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_level_has_text_in_every_language() {
        for language in [Language::Vi, Language::En] {
            for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
                let m = risk_message(level, language);
                assert!(!m.message.is_empty());
                assert!(!m.warning.is_empty());
            }
        }
    }

    #[test]
    fn vietnamese_is_default_text() {
        assert_eq!(
            risk_message(RiskLevel::High, Language::default()).message,
            "Đoạn đường có mức độ tai nạn cao, xin lái xe cẩn thận"
        );
        assert_eq!(
            risk_message(RiskLevel::Low, Language::from_tag("de")).warning,
            "Vẫn cần chú ý quan sát khi lái xe"
        );
    }

    #[test]
    fn leg_count_is_interpolated() {
        assert_eq!(
            dangerous_legs_advice(2, Language::Vi),
            "Tuyến đường có 2 đoạn nguy hiểm. Cân nhắc chọn tuyến đường khác."
        );
        assert!(dangerous_legs_advice(3, Language::En).contains(" 3 "));
    }
}
