//! Biblical language practice: pronunciation coaching and verse drills

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::FailoverChain;
use crate::error::Result;
use crate::failover::FailoverClient;
use crate::request::CanonicalRequest;

use super::require_text;

/// Score used when a reply carries no `SCORE:` line
pub const DEFAULT_SCORE: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language
{   Hebrew
  , Greek
}

impl Language
{   pub fn display_name(&self) -> &'static str
    {   match self
        {   Language::Hebrew => "Biblical Hebrew"
          , Language::Greek => "Koine Greek"
        }
    }

    pub fn short_name(&self) -> &'static str
    {   match self
        {   Language::Hebrew => "Hebrew"
          , Language::Greek => "Greek"
        }
    }

    pub fn testament(&self) -> &'static str
    {   match self
        {   Language::Hebrew => "Old Testament"
          , Language::Greek => "New Testament"
        }
    }
}

/// A vocabulary word being practised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word
{   pub word: String
  , pub transliteration: String
  , pub meaning: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibleSentence
{   pub original: String
  , pub transliteration: String
  , pub english: String
  , pub reference: String
  , pub language: Language
}

#[derive(Debug, Clone, Deserialize)]
struct SentenceReply
{   original: String
  , transliteration: String
  , english: String
  , reference: String
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PronunciationScore
{   /// 0 to 100
    pub score: u8
  , pub feedback: String
}

/// One or two sentences of encouraging feedback on a single word
pub async fn pronunciation_feedback(
  client: &FailoverClient
, chain: &FailoverChain
, word: &Word
, language: Language
) -> Result<String>
{   require_text("word", &word.word)?;

    let prompt = format!(
      "You are a friendly and encouraging biblical language pronunciation \
       coach. The user is trying to pronounce the {} word \"{}\". The word \
       is transliterated as \"{}\" and means \"{}\".\n\n\
       Provide brief, clear, and positive feedback on their pronunciation \
       in 1-2 sentences. If they are correct, praise them. If they are \
       slightly off, gently guide them on the correct sound."
    , language.display_name()
    , word.word
    , word.transliteration
    , word.meaning
    );

    let response = client
      .execute(
        &CanonicalRequest::from_prompt(prompt)
      , chain
      , "Pronunciation Feedback"
      )
      .await?;
    Ok(response.content)
}

/// The verse at `reference` in the original language, for reading practice.
/// A reply for a different verse fails that provider.
pub async fn generate_bible_sentence(
  client: &FailoverClient
, chain: &FailoverChain
, language: Language
, reference: &str
) -> Result<BibleSentence>
{   require_text("reference", reference)?;
    let language_text = language.display_name();

    let prompt = format!(
      "Generate the specific Bible verse \"{reference}\" in {language_text}.\n\n\
       CRITICAL: You MUST provide the verse \"{reference}\" - not any other \
       verse.\n\n\
       Requirements:\n\
       - Provide the COMPLETE original {language_text} text with proper \
       characters and vowel points if applicable\n\
       - Include accurate transliteration for pronunciation practice\n\
       - Provide clear English translation\n\
       - The reference field MUST be exactly: {reference}\n\n\
       Output in JSON format with fields: original, transliteration, \
       english, reference"
    );
    let request = CanonicalRequest::from_prompt(prompt).temperature(0.5);
    let context = format!("Generate Bible Verse [{}]", reference);

    let reply: SentenceReply = client
      .execute_json_with(
        &request
      , chain
      , &context
      , &tokio_util::sync::CancellationToken::new()
      , |reply: &SentenceReply| {
          if same_reference(&reply.reference, reference)
          {   Ok(())
          } else
          {   Err(format!(
                "asked for {} but got {}"
              , reference
              , reply.reference
              ))
          }
        }
      )
      .await?;

    debug!("Generated verse {}", reply.reference);
    Ok(BibleSentence
    {   original: reply.original
      , transliteration: reply.transliteration
      , english: reply.english
      , reference: reply.reference
      , language
    })
}

/// Score a read-aloud attempt of a whole verse
pub async fn sentence_pronunciation_score(
  client: &FailoverClient
, chain: &FailoverChain
, sentence: &BibleSentence
) -> Result<PronunciationScore>
{   let prompt = format!(
      "You are an expert {} pronunciation evaluator. The user is \
       attempting to pronounce this Bible verse:\n\n\
       Original: {}\n\
       Transliteration: {}\n\
       English: {}\n\
       Reference: {}\n\n\
       Provide:\n\
       1. A score from 0-100 (0=unintelligible, 50=understandable with \
       errors, 80=good, 100=excellent/native-like)\n\
       2. Specific feedback on what they did well and what needs \
       improvement\n\n\
       Respond in this EXACT format:\n\
       SCORE: [number]\n\
       FEEDBACK: [Your detailed feedback in 2-3 sentences]"
    , sentence.language.display_name()
    , sentence.original
    , sentence.transliteration
    , sentence.english
    , sentence.reference
    );

    let response = client
      .execute(
        &CanonicalRequest::from_prompt(prompt)
      , chain
      , "Pronunciation Score"
      )
      .await?;
    Ok(parse_score_reply(&response.content))
}

fn score_pattern() -> Option<&'static Regex>
{   static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
      .get_or_init(|| Regex::new(r"SCORE:\s*([0-9]+)").ok())
      .as_ref()
}

fn feedback_pattern() -> Option<&'static Regex>
{   static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
      .get_or_init(|| Regex::new(r"(?s)FEEDBACK:\s*(.+)").ok())
      .as_ref()
}

/// Read `SCORE: n` / `FEEDBACK: ...`. Missing score means 50, scores above
/// 100 are clamped, missing feedback means the whole reply.
pub fn parse_score_reply(text: &str) -> PronunciationScore
{   let score = score_pattern()
      .and_then(|re| re.captures(text))
      .and_then(|caps| caps.get(1))
      .map(|m| clamp_score(m.as_str()))
      .unwrap_or(DEFAULT_SCORE);

    let feedback = feedback_pattern()
      .and_then(|re| re.captures(text))
      .and_then(|caps| caps.get(1))
      .map(|m| m.as_str().trim().to_string())
      .unwrap_or_else(|| text.trim().to_string());

    PronunciationScore { score, feedback }
}

/// `digits` is a non-empty run of ASCII digits; anything past 100,
/// including runs too long for any integer type, reads as 100
fn clamp_score(digits: &str) -> u8
{   digits
      .bytes()
      .try_fold(0u8, |acc, d| {
        let next = u32::from(acc) * 10 + u32::from(d - b'0');
        (next <= 100).then_some(next as u8)
      })
      .unwrap_or(100)
}

fn same_reference(got: &str, wanted: &str) -> bool
{   let squash = |s: &str| {
      s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    };
    squash(got) == squash(wanted)
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn score_and_feedback_are_read()
    {   let parsed = parse_score_reply(
          "SCORE: 82\nFEEDBACK: Good rhythm.\nWatch the final syllable."
        );
        assert_eq!(parsed.score, 82);
        assert_eq!(
          parsed.feedback
        , "Good rhythm.\nWatch the final syllable."
        );
    }

    #[test]
    fn missing_score_defaults_and_whole_text_is_feedback()
    {   let parsed = parse_score_reply("  Nice try, keep practising.  ");
        assert_eq!(parsed.score, DEFAULT_SCORE);
        assert_eq!(parsed.feedback, "Nice try, keep practising.");
    }

    #[test]
    fn oversized_score_is_clamped()
    {   assert_eq!(parse_score_reply("SCORE: 250").score, 100);
        assert_eq!(parse_score_reply("SCORE: 100").score, 100);
        assert_eq!(parse_score_reply("SCORE: 007").score, 7);
    }

    #[test]
    fn score_too_long_for_any_integer_is_clamped()
    {   let reply = format!("SCORE: {}\nFEEDBACK: Loud.", "9".repeat(40));
        let parsed = parse_score_reply(&reply);
        assert_eq!(parsed.score, 100);
        assert_eq!(parsed.feedback, "Loud.");
    }

    #[test]
    fn reference_comparison_ignores_case_and_spacing()
    {   assert!(same_reference("psalm  23:1", "Psalm 23:1"));
        assert!(!same_reference("Psalm 23:2", "Psalm 23:1"));
    }

    #[test]
    fn language_names()
    {   assert_eq!(Language::Hebrew.display_name(), "Biblical Hebrew");
        assert_eq!(Language::Greek.testament(), "New Testament");
    }
}
