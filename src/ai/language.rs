use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::content::collapse_whitespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    English,
    Burmese,
    French,
    Spanish,
    Chinese,
    Japanese,
    Korean,
    Thai,
    Arabic,
    Hindi,
}

impl LanguageTag {
    pub const ALL: [LanguageTag; 10] = [
        LanguageTag::English,
        LanguageTag::Burmese,
        LanguageTag::French,
        LanguageTag::Spanish,
        LanguageTag::Chinese,
        LanguageTag::Japanese,
        LanguageTag::Korean,
        LanguageTag::Thai,
        LanguageTag::Arabic,
        LanguageTag::Hindi,
    ];

    /// Lower-case identifier used in settings; also the tie-break order.
    pub fn slug(self) -> &'static str {
        match self {
            LanguageTag::English => "english",
            LanguageTag::Burmese => "burmese",
            LanguageTag::French => "french",
            LanguageTag::Spanish => "spanish",
            LanguageTag::Chinese => "chinese",
            LanguageTag::Japanese => "japanese",
            LanguageTag::Korean => "korean",
            LanguageTag::Thai => "thai",
            LanguageTag::Arabic => "arabic",
            LanguageTag::Hindi => "hindi",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LanguageTag::English => "English",
            LanguageTag::Burmese => "Burmese (Myanmar language)",
            LanguageTag::French => "French",
            LanguageTag::Spanish => "Spanish",
            LanguageTag::Chinese => "Chinese",
            LanguageTag::Japanese => "Japanese",
            LanguageTag::Korean => "Korean",
            LanguageTag::Thai => "Thai",
            LanguageTag::Arabic => "Arabic",
            LanguageTag::Hindi => "Hindi",
        }
    }

    fn script(self) -> &'static str {
        match self {
            LanguageTag::English | LanguageTag::French | LanguageTag::Spanish => "Latin script",
            LanguageTag::Burmese => "Myanmar script",
            LanguageTag::Chinese => "Chinese characters",
            LanguageTag::Japanese => "Japanese script",
            LanguageTag::Korean => "Hangul script",
            LanguageTag::Thai => "Thai script",
            LanguageTag::Arabic => "Arabic script",
            LanguageTag::Hindi => "Devanagari script",
        }
    }

    fn others(self) -> &'static str {
        match self {
            LanguageTag::English => "French, Spanish or any other language",
            _ => "English or any other language",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for LanguageTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        LanguageTag::ALL
            .into_iter()
            .find(|tag| tag.slug() == wanted)
            .ok_or_else(|| format!("unknown language: {}", s))
    }
}

/// Either let the detector decide or pin every summary to one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguagePreference {
    #[default]
    Auto,
    Forced(LanguageTag),
}

impl FromStr for LanguagePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(LanguagePreference::Auto);
        }
        s.parse().map(LanguagePreference::Forced)
    }
}

impl fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguagePreference::Auto => f.write_str("auto"),
            LanguagePreference::Forced(tag) => tag.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub language: LanguageTag,
    pub directive: String,
}

struct ScriptBlock {
    language: LanguageTag,
    ranges: &'static [RangeInclusive<char>],
}

const SCRIPT_BLOCKS: [ScriptBlock; 7] = [
    ScriptBlock {
        language: LanguageTag::Burmese,
        ranges: &['\u{1000}'..='\u{109F}'],
    },
    ScriptBlock {
        language: LanguageTag::Thai,
        ranges: &['\u{0E00}'..='\u{0E7F}'],
    },
    ScriptBlock {
        language: LanguageTag::Chinese,
        ranges: &['\u{4E00}'..='\u{9FFF}'],
    },
    ScriptBlock {
        language: LanguageTag::Japanese,
        ranges: &['\u{3040}'..='\u{309F}', '\u{30A0}'..='\u{30FF}'],
    },
    ScriptBlock {
        language: LanguageTag::Korean,
        ranges: &['\u{AC00}'..='\u{D7AF}'],
    },
    ScriptBlock {
        language: LanguageTag::Arabic,
        ranges: &['\u{0600}'..='\u{06FF}'],
    },
    ScriptBlock {
        language: LanguageTag::Hindi,
        ranges: &['\u{0900}'..='\u{097F}'],
    },
];

// Markers carry their trailing space so "the " does not match "there".
struct WordMarkers {
    language: LanguageTag,
    specific: &'static [&'static str],
    specific_weight: usize,
    common: &'static [&'static str],
    min_score: usize,
}

const WORD_MARKERS: [WordMarkers; 3] = [
    WordMarkers {
        language: LanguageTag::French,
        specific: &[
            "être ", "avoir ", "avec ", "pour ", "dans ", "sur ", "vous ", "nous ", "mais ",
            "tout ", "plus ", "bien ", "où ", "comment ", "pourquoi ", "ça ", "cette ", "ces ",
        ],
        specific_weight: 3,
        common: &["le ", "la ", "les ", "du ", "des ", "et ", "une ", "un "],
        min_score: 1,
    },
    WordMarkers {
        language: LanguageTag::Spanish,
        specific: &[
            "ser ", "estar ", "pero ", "más ", "muy ", "como ", "también ", "solo ", "porque ",
            "cuando ", "donde ", "este ", "esta ", "estos ", "estas ",
        ],
        specific_weight: 3,
        common: &[
            "el ", "la ", "los ", "las ", "del ", "y ", "con ", "por ", "para ", "en ", "un ",
            "una ",
        ],
        min_score: 1,
    },
    WordMarkers {
        language: LanguageTag::English,
        specific: &[
            "the ", "and ", "are ", "was ", "were ", "been ", "being ", "have ", "has ", "had ",
            "will ", "would ", "could ", "should ", "might ", "must ", "shall ", "this ", "that ",
            "these ", "those ", "with ", "from ", "about ", "which ", "their ", "there ", "they ",
            "them ", "what ", "when ", "where ", "why ", "how ",
        ],
        specific_weight: 2,
        common: &[
            "to ", "of ", "in ", "for ", "on ", "at ", "by ", "as ", "but ", "or ", "if ", "a ",
            "an ",
        ],
        min_score: 5,
    },
];

impl WordMarkers {
    fn score(&self, sample: &str) -> usize {
        let count = |markers: &[&str]| -> usize {
            markers.iter().map(|m| sample.matches(m).count()).sum()
        };
        count(self.specific) * self.specific_weight + count(self.common)
    }
}

/// Pick the summary language for `text` and the prompt directive that
/// enforces it. `text` is already plain text; markup is stripped upstream.
///
/// A forced preference short-circuits: the text is never inspected.
pub fn detect(text: &str, preference: LanguagePreference) -> Detection {
    if let LanguagePreference::Forced(language) = preference {
        return Detection {
            language,
            directive: forced_directive(language),
        };
    }

    let sample = collapse_whitespace(text);
    let language = pick_language(&score_languages(&sample));
    tracing::debug!(language = %language, "Detected content language");

    Detection {
        language,
        directive: detected_directive(language),
    }
}

fn score_languages(sample: &str) -> Vec<(LanguageTag, usize)> {
    let mut scores = Vec::new();

    for block in &SCRIPT_BLOCKS {
        let count = sample
            .chars()
            .filter(|c| block.ranges.iter().any(|r| r.contains(c)))
            .count();
        if count > 0 {
            scores.push((block.language, count));
        }
    }

    let lower = sample.to_lowercase();
    for markers in &WORD_MARKERS {
        let score = markers.score(&lower);
        if score > 0 && score >= markers.min_score {
            scores.push((markers.language, score));
        }
    }

    scores
}

fn pick_language(scores: &[(LanguageTag, usize)]) -> LanguageTag {
    let Some(best) = scores.iter().map(|(_, score)| *score).max() else {
        return LanguageTag::English;
    };

    let mut tied: Vec<LanguageTag> = scores
        .iter()
        .filter(|(_, score)| *score == best)
        .map(|(language, _)| *language)
        .collect();

    if tied.contains(&LanguageTag::English) {
        return LanguageTag::English;
    }
    tied.sort_by_key(|language| language.slug());
    tied.first().copied().unwrap_or(LanguageTag::English)
}

fn forced_directive(language: LanguageTag) -> String {
    format!(
        "CRITICAL INSTRUCTION: This content must be summarized in {name}. You MUST write the \
         entire summary in {name} using {script} ONLY. Do not use {others}, and never switch \
         to another language or script at any point in the summary.",
        name = language.name(),
        script = language.script(),
        others = language.others(),
    )
}

fn detected_directive(language: LanguageTag) -> String {
    format!(
        "CRITICAL INSTRUCTION: This content is written in {name}. You MUST write the entire \
         summary in {name} using {script} ONLY. Even if other languages are mixed into the \
         content, do not use {others}, and never switch to another language or script at any \
         point in the summary.",
        name = language.name(),
        script = language.script(),
        others = language.others(),
    )
}
