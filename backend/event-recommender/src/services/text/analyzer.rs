use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;
use unicode_segmentation::UnicodeSegmentation;

/// Major part-of-speech category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Particle,
    AuxiliaryVerb,
    Symbol,
    Other,
}

impl PosTag {
    /// Content-word categories kept by default
    pub const CONTENT_WORDS: [PosTag; 4] = [
        PosTag::Noun,
        PosTag::Verb,
        PosTag::Adjective,
        PosTag::Adverb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PosTag::Noun => "noun",
            PosTag::Verb => "verb",
            PosTag::Adjective => "adjective",
            PosTag::Adverb => "adverb",
            PosTag::Particle => "particle",
            PosTag::AuxiliaryVerb => "auxiliary_verb",
            PosTag::Symbol => "symbol",
            PosTag::Other => "other",
        }
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PosTag {
    type Err = String;

    /// Accepts the English names and the IPADIC major categories
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "noun" | "名詞" => Ok(PosTag::Noun),
            "verb" | "動詞" => Ok(PosTag::Verb),
            "adjective" | "形容詞" => Ok(PosTag::Adjective),
            "adverb" | "副詞" => Ok(PosTag::Adverb),
            "particle" | "助詞" => Ok(PosTag::Particle),
            "auxiliary_verb" | "助動詞" => Ok(PosTag::AuxiliaryVerb),
            "symbol" | "記号" => Ok(PosTag::Symbol),
            "other" | "その他" => Ok(PosTag::Other),
            other => Err(format!("unknown part of speech: {}", other)),
        }
    }
}

/// One segment of analyzed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    pub surface: String,
    /// Dictionary form (e.g. the infinitive of a conjugated verb)
    pub base_form: String,
    pub pos: PosTag,
}

impl Morpheme {
    fn new(surface: impl Into<String>, pos: PosTag) -> Self {
        let surface = surface.into();
        Self {
            base_form: surface.clone(),
            surface,
            pos,
        }
    }
}

/// Segments text into morphemes. Needed for scripts without whitespace word
/// boundaries; implement this to plug in a dictionary-backed analyzer.
pub trait MorphologicalAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<Morpheme>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Kanji,
    Hiragana,
    Katakana,
    Latin,
    Digit,
    Symbol,
    Space,
}

const PROLONGED_SOUND_MARK: char = 'ー';

/// Single kana that end a godan verb's dictionary form
const VERB_ENDINGS: [&str; 9] = ["う", "く", "ぐ", "す", "つ", "ぬ", "ぶ", "む", "る"];

/// Continuative (i-row) kana paired with the dictionary ending they come from
const CONTINUATIVE_STEMS: [(&str, &str); 9] = [
    ("い", "う"),
    ("き", "く"),
    ("ぎ", "ぐ"),
    ("し", "す"),
    ("ち", "つ"),
    ("に", "ぬ"),
    ("び", "ぶ"),
    ("み", "む"),
    ("り", "る"),
];

/// Auxiliaries attached to the continuative form
const CONTINUATIVE_AUXILIARIES: [&str; 7] =
    ["ます", "ました", "ません", "ましょう", "たい", "たかった", "ながら"];

/// e-row kana ending an ichidan stem (食べる, 見せる) and its dictionary ending
const ICHIDAN_STEMS: [(&str, &str); 12] = [
    ("え", "える"),
    ("け", "ける"),
    ("げ", "げる"),
    ("せ", "せる"),
    ("て", "てる"),
    ("ね", "ねる"),
    ("べ", "べる"),
    ("め", "める"),
    ("れ", "れる"),
    ("へ", "へる"),
    ("ぜ", "ぜる"),
    ("ぺ", "ぺる"),
];

const ICHIDAN_SUFFIXES: [&str; 8] = ["る", "ます", "ました", "ません", "た", "て", "ない", "たい"];

/// Euphonic te/ta forms and the ending they most often come from
const TE_FORMS: [(&str, &str); 10] = [
    ("って", "る"),
    ("った", "る"),
    ("いて", "く"),
    ("いた", "く"),
    ("いで", "ぐ"),
    ("いだ", "ぐ"),
    ("んで", "む"),
    ("んだ", "む"),
    ("して", "す"),
    ("した", "す"),
];

const ADJECTIVE_FORMS: [(&str, &str); 8] = [
    ("しかった", "しい"),
    ("しくて", "しい"),
    ("しく", "しい"),
    ("しい", "しい"),
    ("かった", "い"),
    ("くない", "い"),
    ("くて", "い"),
    ("い", "い"),
];

/// する after a kanji compound: the compound itself is the content word
const SURU_FORMS: [&str; 7] = ["しました", "します", "しない", "する", "した", "して", "すれ"];

/// Stem read as a noun before a copula or adnominal (好きな, 好きです)
const NOMINAL_STEM: &str = "き";

const NOMINAL_MARKERS: [&str; 3] = ["な", "です", "だ"];

/// Okurigana pattern matched against the start of the kana following a
/// kanji stem
#[derive(Debug)]
struct Inflection {
    kana: String,
    /// Appended to the kanji stem to give the dictionary form
    base: &'static str,
    pos: PosTag,
    /// Only applies to stems of two or more kanji
    compound_only: bool,
}

impl Inflection {
    fn new(kana: impl Into<String>, base: &'static str, pos: PosTag) -> Self {
        Self {
            kana: kana.into(),
            base,
            pos,
            compound_only: false,
        }
    }
}

/// Longest patterns first; among equal lengths, compound-only rules win
static INFLECTIONS: Lazy<Vec<Inflection>> = Lazy::new(|| {
    let mut rules: Vec<Inflection> = SURU_FORMS
        .iter()
        .map(|kana| Inflection {
            compound_only: true,
            ..Inflection::new(*kana, "", PosTag::Noun)
        })
        .collect();

    for (kana, base) in ADJECTIVE_FORMS {
        rules.push(Inflection::new(kana, base, PosTag::Adjective));
    }
    for (stem, ending) in CONTINUATIVE_STEMS {
        for aux in CONTINUATIVE_AUXILIARIES {
            rules.push(Inflection::new(format!("{}{}", stem, aux), ending, PosTag::Verb));
        }
    }
    for marker in NOMINAL_MARKERS {
        rules.push(Inflection::new(
            format!("{}{}", NOMINAL_STEM, marker),
            NOMINAL_STEM,
            PosTag::Noun,
        ));
    }
    for (stem, base) in ICHIDAN_STEMS {
        for suffix in ICHIDAN_SUFFIXES {
            rules.push(Inflection::new(format!("{}{}", stem, suffix), base, PosTag::Verb));
        }
    }
    for (kana, ending) in TE_FORMS {
        rules.push(Inflection::new(kana, ending, PosTag::Verb));
    }
    for ending in VERB_ENDINGS {
        rules.push(Inflection::new(ending, ending, PosTag::Verb));
    }

    rules.sort_by(|a, b| {
        b.kana
            .chars()
            .count()
            .cmp(&a.kana.chars().count())
            .then_with(|| b.compound_only.cmp(&a.compound_only))
    });
    rules
});

/// Inflection whose kana starts `kana`, for a kanji stem of `stem_chars`
fn match_inflection(kana: &str, stem_chars: usize) -> Option<&'static Inflection> {
    INFLECTIONS
        .iter()
        .filter(|rule| !rule.compound_only || stem_chars >= 2)
        .find(|rule| kana.starts_with(rule.kana.as_str()))
}

fn classify(c: char) -> Script {
    match c {
        c if c.is_whitespace() => Script::Space,
        '・' => Script::Symbol,
        '\u{3041}'..='\u{309F}' => Script::Hiragana,
        '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' | '\u{FF66}'..='\u{FF9F}' => {
            Script::Katakana
        }
        '\u{3005}'..='\u{3007}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{4E00}'..='\u{9FFF}'
        | '\u{F900}'..='\u{FAFF}' => Script::Kanji,
        c if c.is_numeric() => Script::Digit,
        c if c.is_alphabetic() => Script::Latin,
        _ => Script::Symbol,
    }
}

/// Dictionary-free analyzer that splits text into runs of one script.
///
/// Kanji, katakana, Latin and numeric runs are nouns. A kanji run followed by
/// adjective or verb okurigana becomes an adjective or verb in dictionary
/// form; remaining hiragana runs are particles.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptRunAnalyzer;

impl ScriptRunAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn runs(text: &str) -> Vec<(Script, String)> {
        let mut runs: Vec<(Script, String)> = Vec::new();

        for grapheme in text.graphemes(true) {
            let Some(first) = grapheme.chars().next() else {
                continue;
            };
            let mut script = classify(first);

            if let Some((last_script, last_text)) = runs.last_mut() {
                // ー extends whichever kana run it follows
                if first == PROLONGED_SOUND_MARK
                    && matches!(last_script, Script::Hiragana | Script::Katakana)
                {
                    script = *last_script;
                }

                let joins = *last_script == script
                    || (*last_script == Script::Latin && script == Script::Digit);
                if joins && script != Script::Space && script != Script::Symbol {
                    last_text.push_str(grapheme);
                    continue;
                }
            }

            runs.push((script, grapheme.to_string()));
        }

        runs
    }
}

impl MorphologicalAnalyzer for ScriptRunAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Morpheme> {
        let runs = Self::runs(text);
        let mut morphemes = Vec::with_capacity(runs.len());
        let mut i = 0;

        while i < runs.len() {
            let (script, run) = &runs[i];
            match script {
                Script::Space => {}
                Script::Kanji => {
                    let inflected = runs.get(i + 1).and_then(|(next, kana)| {
                        if *next != Script::Hiragana {
                            return None;
                        }
                        match_inflection(kana, run.chars().count()).map(|rule| (rule, kana))
                    });

                    if let Some((rule, kana)) = inflected {
                        let rest = &kana[rule.kana.len()..];
                        morphemes.push(Morpheme {
                            surface: format!("{}{}", run, rule.kana),
                            base_form: format!("{}{}", run, rule.base),
                            pos: rule.pos,
                        });
                        if !rest.is_empty() {
                            morphemes.push(Morpheme::new(rest, PosTag::Particle));
                        }
                        i += 2;
                        continue;
                    }
                    morphemes.push(Morpheme::new(run.as_str(), PosTag::Noun));
                }
                Script::Katakana | Script::Latin | Script::Digit => {
                    morphemes.push(Morpheme::new(run.as_str(), PosTag::Noun));
                }
                Script::Hiragana => {
                    morphemes.push(Morpheme::new(run.as_str(), PosTag::Particle));
                }
                Script::Symbol => {
                    morphemes.push(Morpheme::new(run.as_str(), PosTag::Symbol));
                }
            }
            i += 1;
        }

        morphemes
    }
}
