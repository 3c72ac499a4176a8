use std::collections::HashSet;

/// Function words, honorific suffixes, time units, laughter and punctuation
/// that carry no topical signal.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "の", "は", "が", "です", "ます", "こと", "もの", "それ", "あれ", "これ", "私", "あなた",
    "する", "いる", "なる", "思う", "いう", "できる", "ない", "ある", "いく", "くる",
    "とても", "すごく", "ちょっと", "たくさん", "いろいろ", "本当に", "あとで",
    "ため", "よう", "そう", "みたい", "みたいに", "なので", "そして", "また", "でも",
    "日", "月", "年", "時", "分", "秒", "さん", "ちゃん", "くん",
    "笑", "w", "ww", "www", "草",
    "!", "?", "。", "、", ".", ",", "(", ")", "「", "」", "『", "』", "【", "】",
    " ", "　",
];

#[derive(Debug, Clone)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Default for Stopwords {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS.iter().copied())
    }
}

impl Stopwords {
    pub fn new<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            words: words.into_iter().map(str::to_string).collect(),
        }
    }

    /// Default list plus caller-supplied words
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> Self {
        let mut stopwords = Self::default();
        stopwords.extend(extra.iter().map(|s| s.as_ref()));
        stopwords
    }

    pub fn extend<'a>(&mut self, words: impl IntoIterator<Item = &'a str>) {
        self.words.extend(
            words
                .into_iter()
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_string),
        );
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
