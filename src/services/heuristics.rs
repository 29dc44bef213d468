//! Keyword heuristics used by the resolver and the post-processor.
//!
//! LLM drafts mix real venues with structural placeholders (check-in,
//! return-to-lodging) and occasionally mislabel wellness venues as meals.
//! The keyword tables live here as plain config so they can be extended and
//! unit-tested without touching the pipeline control flow.

/// Configurable keyword tables. `Default` carries the production lists;
/// tests can construct narrower ones.
#[derive(Debug, Clone)]
pub struct Heuristics {
    /// Phrases marking an activity as an itinerary-structure placeholder
    /// (lodging / transit), never a real venue.
    pub lodging_markers: Vec<String>,
    /// Beauty/wellness-service words that flag a miscategorized "meal".
    pub beauty_keywords: Vec<String>,
    /// Meal-specific words scrubbed from descriptions on recategorization.
    pub meal_keywords: Vec<String>,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            lodging_markers: to_strings(&[
                "check-in",
                "check in",
                "checkin",
                "check-out",
                "check out",
                "hotel check",
                "return to hotel",
                "return to accommodation",
                "back to hotel",
                "back to accommodation",
                "체크인",
                "체크아웃",
                "숙소 복귀",
                "숙소로 이동",
                "호텔 복귀",
            ]),
            beauty_keywords: to_strings(&[
                "nail", "waxing", "spa", "massage", "salon", "네일", "왁싱", "스파", "마사지",
                "살롱", "피부",
            ]),
            meal_keywords: to_strings(&[
                "meal",
                "breakfast",
                "lunch",
                "dinner",
                "brunch",
                "restaurant",
                "food",
                "cuisine",
                "dish",
                "menu",
                "taste",
                "식사",
                "맛집",
                "아침",
                "점심",
                "저녁",
            ]),
        }
    }
}

impl Heuristics {
    /// True when the activity name is a lodging/transit placeholder that
    /// must bypass place resolution entirely.
    pub fn is_structural_marker(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.lodging_markers.iter().any(|m| lowered.contains(m.as_str()))
    }

    pub fn looks_like_beauty_service(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.beauty_keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    fn contains_meal_language(&self, sentence: &str) -> bool {
        let lowered = sentence.to_lowercase();
        self.meal_keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Drops sentences carrying meal-specific language from a description.
    /// Returns a generic line when nothing survives, so the activity never
    /// ends up with an empty description.
    pub fn strip_meal_language(&self, description: &str) -> String {
        let kept: Vec<&str> = description
            .split_inclusive(['.', '!', '?'])
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && !self.contains_meal_language(s))
            .collect();

        if kept.is_empty() {
            "Enjoy a relaxing self-care break at this local spot.".to_string()
        } else {
            kept.join(" ")
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
