//! Text analysis: n-gram tokenizer, width folding, analyzer registry.
//!
//! Tantivy's own `NgramTokenizer` emits every gram at position 0, which
//! makes phrase queries over grams meaningless. [`NgramTokenizer`] here
//! gives the gram starting at character `i` position `i`, so a phrase of
//! consecutive bigrams matches exactly the original substring.

use tantivy::tokenizer::{
    LowerCaser, TextAnalyzer, Token, TokenFilter, TokenStream, Tokenizer,
};
use tantivy::Index;
use tracing::debug;

use crate::error::IndexError;
use crate::mapping::{AnalysisSettings, TokenFilterKind, TokenizerSettings};

/// Fixed-width character n-gram tokenizer.
#[derive(Debug, Clone)]
pub struct NgramTokenizer {
    gram: usize,
}

impl NgramTokenizer {
    pub fn new(gram: usize) -> Result<Self, IndexError> {
        if gram == 0 {
            return Err(IndexError::InvalidSettings(
                "n-gram size must be > 0".to_string(),
            ));
        }
        Ok(Self { gram })
    }
}

impl Tokenizer for NgramTokenizer {
    type TokenStream<'a> = NgramTokenStream<'a>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> NgramTokenStream<'a> {
        let mut char_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        char_offsets.push(text.len());

        NgramTokenStream {
            text,
            char_offsets,
            gram: self.gram,
            start: 0,
            token: Token::default(),
        }
    }
}

/// Stream of grams over one text. Texts shorter than the gram size
/// produce no tokens.
pub struct NgramTokenStream<'a> {
    text: &'a str,
    /// Byte offset of every char, plus the text length
    char_offsets: Vec<usize>,
    gram: usize,
    /// Char index of the next gram
    start: usize,
    token: Token,
}

impl TokenStream for NgramTokenStream<'_> {
    fn advance(&mut self) -> bool {
        let end = self.start + self.gram;
        if end >= self.char_offsets.len() {
            return false;
        }

        let from = self.char_offsets[self.start];
        let to = self.char_offsets[end];
        self.token.text.clear();
        self.token.text.push_str(&self.text[from..to]);
        self.token.offset_from = from;
        self.token.offset_to = to;
        self.token.position = self.start;
        self.token.position_length = 1;

        self.start += 1;
        true
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}

/// Fold one character: full-width ASCII variants (U+FF01..U+FF5E) map to
/// U+0021..U+007E and the ideographic space to a plain space.
pub fn fold_width(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        '\u{3000}' => ' ',
        _ => c,
    }
}

fn needs_folding(c: char) -> bool {
    matches!(c, '\u{FF01}'..='\u{FF5E}' | '\u{3000}')
}

/// Token filter applying [`fold_width`] to every token.
#[derive(Debug, Clone, Copy, Default)]
pub struct WidthFolder;

impl TokenFilter for WidthFolder {
    type Tokenizer<T: Tokenizer> = WidthFolderFilter<T>;

    fn transform<T: Tokenizer>(self, tokenizer: T) -> WidthFolderFilter<T> {
        WidthFolderFilter { inner: tokenizer }
    }
}

#[derive(Clone)]
pub struct WidthFolderFilter<T> {
    inner: T,
}

impl<T: Tokenizer> Tokenizer for WidthFolderFilter<T> {
    type TokenStream<'a> = WidthFolderTokenStream<T::TokenStream<'a>>;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        WidthFolderTokenStream {
            tail: self.inner.token_stream(text),
        }
    }
}

pub struct WidthFolderTokenStream<T> {
    tail: T,
}

impl<T: TokenStream> TokenStream for WidthFolderTokenStream<T> {
    fn advance(&mut self) -> bool {
        if !self.tail.advance() {
            return false;
        }
        let token = self.tail.token_mut();
        if token.text.chars().any(needs_folding) {
            token.text = token.text.chars().map(fold_width).collect();
        }
        true
    }

    fn token(&self) -> &Token {
        self.tail.token()
    }

    fn token_mut(&mut self) -> &mut Token {
        self.tail.token_mut()
    }
}

/// Build every analyzer defined in `analysis`.
pub fn build_analyzers(
    analysis: &AnalysisSettings,
) -> Result<Vec<(String, TextAnalyzer)>, IndexError> {
    analysis.validate()?;

    let mut analyzers = Vec::with_capacity(analysis.analyzer.len());
    for (name, settings) in &analysis.analyzer {
        let tokenizer = match analysis.tokenizer.get(&settings.tokenizer) {
            Some(TokenizerSettings::Ngram { min_gram, .. }) => NgramTokenizer::new(*min_gram)?,
            None => {
                return Err(IndexError::InvalidSettings(format!(
                    "analyzer {} references unknown tokenizer {}",
                    name, settings.tokenizer
                )))
            }
        };

        let mut builder = TextAnalyzer::builder(tokenizer).dynamic();
        for filter in &settings.filter {
            builder = match filter {
                TokenFilterKind::CjkWidth => builder.filter_dynamic(WidthFolder),
                TokenFilterKind::Lowercase => builder.filter_dynamic(LowerCaser),
            };
        }
        analyzers.push((name.clone(), builder.build()));
    }
    Ok(analyzers)
}

/// Register the analyzers from `analysis` on a Tantivy index.
///
/// Tantivy does not persist custom tokenizers, so this runs on every open.
pub fn register_analyzers(index: &Index, analysis: &AnalysisSettings) -> Result<(), IndexError> {
    for (name, analyzer) in build_analyzers(analysis)? {
        debug!(analyzer = %name, "Registering analyzer");
        index.tokenizers().register(&name, analyzer);
    }
    Ok(())
}

/// Run `analyzer` over `text`, returning `(position, term text)` pairs.
pub fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<(usize, String)> {
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        let token = stream.token();
        tokens.push((token.position, token.text.clone()));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{book_index_settings, BIGRAM_ANALYZER, UNIGRAM_ANALYZER};

    fn texts(tokens: &[(usize, String)]) -> Vec<&str> {
        tokens.iter().map(|(_, t)| t.as_str()).collect()
    }

    fn analyzer(name: &str) -> TextAnalyzer {
        build_analyzers(&book_index_settings().analysis)
            .unwrap()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a)
            .unwrap()
    }

    #[test]
    fn test_bigrams_have_consecutive_positions() {
        let mut tokenizer = TextAnalyzer::from(NgramTokenizer::new(2).unwrap());
        let tokens = analyze(&mut tokenizer, "abcd");
        assert_eq!(texts(&tokens), vec!["ab", "bc", "cd"]);
        let positions: Vec<usize> = tokens.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_grams_split_on_chars_not_bytes() {
        let mut tokenizer = TextAnalyzer::from(NgramTokenizer::new(2).unwrap());
        let tokens = analyze(&mut tokenizer, "吾輩は猫");
        assert_eq!(texts(&tokens), vec!["吾輩", "輩は", "は猫"]);
    }

    #[test]
    fn test_short_text_yields_nothing() {
        let mut tokenizer = TextAnalyzer::from(NgramTokenizer::new(2).unwrap());
        assert!(analyze(&mut tokenizer, "a").is_empty());
        assert!(analyze(&mut tokenizer, "").is_empty());
    }

    #[test]
    fn test_whitespace_is_part_of_grams() {
        let mut tokenizer = TextAnalyzer::from(NgramTokenizer::new(2).unwrap());
        let tokens = analyze(&mut tokenizer, "a b");
        assert_eq!(texts(&tokens), vec!["a ", " b"]);
    }

    #[test]
    fn test_zero_gram_rejected() {
        assert!(NgramTokenizer::new(0).is_err());
    }

    #[test]
    fn test_fold_width() {
        assert_eq!(fold_width('Ａ'), 'A');
        assert_eq!(fold_width('ｚ'), 'z');
        assert_eq!(fold_width('１'), '1');
        assert_eq!(fold_width('\u{3000}'), ' ');
        assert_eq!(fold_width('猫'), '猫');
    }

    #[test]
    fn test_bigram_analyzer_folds_and_lowercases() {
        let mut bigram = analyzer(BIGRAM_ANALYZER);
        let tokens = analyze(&mut bigram, "ＡＢc");
        assert_eq!(texts(&tokens), vec!["ab", "bc"]);
    }

    #[test]
    fn test_unigram_analyzer() {
        let mut unigram = analyzer(UNIGRAM_ANALYZER);
        let tokens = analyze(&mut unigram, "Ａb");
        assert_eq!(texts(&tokens), vec!["a", "b"]);
    }
}
