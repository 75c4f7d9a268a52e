//! Query heuristics: intent classification, language detection, intent
//! boost lists and research query expansion.

use serde::{Deserialize, Serialize};

/// Coarse classification of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Images,
    Hardware,
    Tech,
    History,
    #[default]
    General,
}

impl Intent {
    /// Tech-domain boosting applies by default to these intents.
    pub fn is_technical(self) -> bool {
        matches!(self, Self::Tech | Self::Hardware)
    }
}

const IMAGE_MARKERS: &[&str] = &[
    "画像", "image", "photo", "jpg", "jpeg", "png", "gif", "svg", "webp",
];

const HARDWARE_MARKERS: &[&str] = &[
    "gpu", "cpu", "rtx", "radeon", "geforce", "intel", "amd", "nvidia", "arm", "soc",
    "benchmark", "tflops", "vrm",
];

const TECH_MARKERS: &[&str] = &[
    "exception",
    "stack trace",
    "segfault",
    "panic",
    "error",
    "npm",
    "pip",
    "cargo",
    "tsc",
    "docker",
    "kubernetes",
    "k8s",
    "api",
    "sdk",
    "http",
    "ssl",
    "tls",
];

const HISTORY_MARKERS: &[&str] = &[
    "歴史",
    "年表",
    "戦争",
    "王朝",
    "紀元前",
    "revolution",
    "dynasty",
    "timeline",
    "history",
];

const HARDWARE_DOMAINS: &[&str] = &[
    "anandtech.com",
    "tomshardware.com",
    "wikipedia.org",
    "techpowerup.com",
    "arstechnica.com",
    "developer.nvidia.com",
    "amd.com",
    "intel.com",
];

const HISTORY_DOMAINS: &[&str] = &[
    "wikipedia.org",
    "britannica.com",
    "archives.gov",
    "nationalarchives.gov.uk",
];

/// Classify `query` by case-insensitive substring markers, first match wins.
pub fn detect_intent(query: &str) -> Intent {
    let q = query.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| q.contains(m));

    if has(IMAGE_MARKERS) {
        Intent::Images
    } else if has(HARDWARE_MARKERS) {
        Intent::Hardware
    } else if has(TECH_MARKERS) {
        Intent::Tech
    } else if has(HISTORY_MARKERS) {
        Intent::History
    } else {
        Intent::General
    }
}

/// `"ja"` when the query contains kana or CJK ideographs, otherwise `"en"`.
pub fn detect_language(query: &str) -> &'static str {
    let cjk = query
        .chars()
        .any(|c| matches!(c, '\u{3040}'..='\u{30ff}' | '\u{3400}'..='\u{9fff}'));
    if cjk { "ja" } else { "en" }
}

/// Intent-specific domains that receive the intent boost.
///
/// `tech_domains` is the configured tech boost list, reused for [`Intent::Tech`].
pub fn intent_boost_domains(intent: Intent, tech_domains: &[String]) -> Vec<String> {
    match intent {
        Intent::Hardware => HARDWARE_DOMAINS.iter().map(|d| (*d).to_owned()).collect(),
        Intent::Tech => tech_domains.to_vec(),
        Intent::History => HISTORY_DOMAINS.iter().map(|d| (*d).to_owned()).collect(),
        Intent::Images | Intent::General => Vec::new(),
    }
}

/// Derive up to `max_queries` research queries from `question`.
///
/// The question itself always comes first.
pub fn expand_queries(
    question: &str,
    intent: Intent,
    language: &str,
    max_queries: usize,
) -> Vec<String> {
    let ja = language == "ja";
    let mut queries = vec![question.to_owned()];

    if max_queries > 1 {
        let suffix = match (intent, ja) {
            (Intent::Tech | Intent::Hardware, true) => "公式 ドキュメント",
            (Intent::Tech | Intent::Hardware, false) => "official documentation",
            (Intent::History, true) => "年表",
            (Intent::History, false) => "timeline",
            (_, true) => "とは",
            (_, false) => "explained",
        };
        queries.push(format!("{question} {suffix}"));
    }
    if max_queries > 2 {
        let site = if intent == Intent::Tech {
            "github.com"
        } else {
            "wikipedia.org"
        };
        queries.push(format!("{question} site:{site}"));
    }

    queries.truncate(max_queries.max(1));
    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_intent() {
        assert_eq!(detect_intent("cat photo"), Intent::Images);
        assert_eq!(detect_intent("猫 画像"), Intent::Images);
        assert_eq!(detect_intent("RTX 4090 benchmark"), Intent::Hardware);
        assert_eq!(detect_intent("fetch api"), Intent::Tech);
        assert_eq!(detect_intent("Docker permission denied"), Intent::Tech);
        assert_eq!(detect_intent("French revolution"), Intent::History);
        assert_eq!(detect_intent("江戸 年表"), Intent::History);
        assert_eq!(detect_intent("best pizza dough"), Intent::General);
    }

    #[test]
    fn earlier_intents_take_precedence() {
        // "png" (images) wins over "error" (tech).
        assert_eq!(detect_intent("png decode error"), Intent::Images);
        // "nvidia" (hardware) wins over "sdk" (tech).
        assert_eq!(detect_intent("nvidia sdk"), Intent::Hardware);
    }

    #[test]
    fn detects_language() {
        assert_eq!(detect_language("fetch api"), "en");
        assert_eq!(detect_language("ひらがな"), "ja");
        assert_eq!(detect_language("カタカナ"), "ja");
        assert_eq!(detect_language("漢字 test"), "ja");
    }

    #[test]
    fn boost_lists_per_intent() {
        let tech = vec!["github.com".to_owned()];
        let history = intent_boost_domains(Intent::History, &tech);
        assert!(history.iter().any(|d| d == "britannica.com"));
        let hardware = intent_boost_domains(Intent::Hardware, &tech);
        assert!(hardware.iter().any(|d| d == "techpowerup.com"));
        assert_eq!(intent_boost_domains(Intent::Tech, &tech), tech);
        assert!(intent_boost_domains(Intent::General, &tech).is_empty());
        assert!(intent_boost_domains(Intent::Images, &tech).is_empty());
    }

    #[test]
    fn expansion_for_tech_queries() {
        let queries = expand_queries("fetch api", Intent::Tech, "en", 3);
        assert_eq!(
            queries,
            vec![
                "fetch api",
                "fetch api official documentation",
                "fetch api site:github.com"
            ]
        );
    }

    #[test]
    fn expansion_respects_max_queries() {
        assert_eq!(expand_queries("fetch api", Intent::Tech, "en", 1), vec!["fetch api"]);
        assert_eq!(expand_queries("fetch api", Intent::Tech, "en", 2).len(), 2);
        // Only three templates exist even when more are allowed.
        assert_eq!(expand_queries("q", Intent::General, "en", 5).len(), 3);
    }

    #[test]
    fn expansion_in_japanese() {
        let queries = expand_queries("明治維新", Intent::General, "ja", 3);
        assert_eq!(queries[1], "明治維新 とは");
        assert_eq!(queries[2], "明治維新 site:wikipedia.org");

        let history = expand_queries("戦争", Intent::History, "ja", 2);
        assert_eq!(history[1], "戦争 年表");

        let hw = expand_queries("gpu", Intent::Hardware, "en", 3);
        assert_eq!(hw[1], "gpu official documentation");
        assert_eq!(hw[2], "gpu site:wikipedia.org");
    }
}
