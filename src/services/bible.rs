//! Verse lookup, keyword search and word studies

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::FailoverChain;
use crate::error::Result;
use crate::failover::FailoverClient;
use crate::request::CanonicalRequest;

use super::language::Language;
use super::require_text;

const SCHOLAR_SYSTEM_PROMPT: &str
  = "You are a biblical scholar assistant. Always respond with valid JSON \
     only. No markdown, no code blocks, just pure JSON.";

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translations
{   pub english: String
  , pub traditional_chinese: String
  , /// Hebrew or Greek
    pub original: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightedWord
{   pub original: String
  , pub transliteration: String
  , pub meaning: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strongs_number: Option<String>
  , #[serde(default)]
    pub position: u32
}

/// Verse as returned by a provider, before the language is attached
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerseReply
{   reference: String
  , book: String
  , chapter: u32
  , verse: u32
  , translations: Translations
  , #[serde(default)]
    highlighted_words: Vec<HighlightedWord>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BibleVerse
{   pub reference: String
  , pub book: String
  , pub chapter: u32
  , pub verse: u32
  , pub translations: Translations
  , pub highlighted_words: Vec<HighlightedWord>
  , pub language: Language
}

impl VerseReply
{   fn with_language(self, language: Language) -> BibleVerse
    {   BibleVerse
        {   reference: self.reference
          , book: self.book
          , chapter: self.chapter
          , verse: self.verse
          , translations: self.translations
          , highlighted_words: self.highlighted_words
          , language
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordAnalysis
{   pub original: String
  , pub transliteration: String
  , pub meaning: String
  , pub etymology: String
  , #[serde(default)]
    pub usage_examples: Vec<String>
  , #[serde(default)]
    pub related_words: Vec<String>
}

fn scholar_request(prompt: String) -> CanonicalRequest
{   CanonicalRequest::with_system(SCHOLAR_SYSTEM_PROMPT, prompt)
      .temperature(0.3)
      .max_tokens(3000)
}

/// Full verse with translations and key original-language words
pub async fn lookup_verse(
  client: &FailoverClient
, chain: &FailoverChain
, reference: &str
, language: Language
) -> Result<BibleVerse>
{   require_text("reference", reference)?;
    let original = language.short_name();

    let prompt = format!(
      "Provide the Bible verse {reference} with the following:\n\
       1. {original} original text\n\
       2. English translation (ESV or NIV)\n\
       3. Traditional Chinese translation (Chinese Union Version)\n\
       4. The 3-5 most theologically significant {original} words with \
       transliteration, meaning and Strong's number\n\n\
       Return as JSON:\n\
       {{\n\
         \"reference\": \"{reference}\",\n\
         \"book\": \"book name\",\n\
         \"chapter\": number,\n\
         \"verse\": number,\n\
         \"translations\": {{\n\
           \"english\": \"text\",\n\
           \"traditionalChinese\": \"text\",\n\
           \"original\": \"{original} text\"\n\
         }},\n\
         \"highlightedWords\": [\n\
           {{ \"original\": \"word\", \"transliteration\": \"romanization\", \
       \"meaning\": \"English meaning\", \"strongsNumber\": \"H1234\", \
       \"position\": 0 }}\n\
         ]\n\
       }}\n\n\
       Be accurate with the {original} text and ensure the Traditional \
       Chinese uses proper theological terminology."
    );

    let reply: VerseReply = client
      .execute_json(
        &scholar_request(prompt)
      , chain
      , &format!("Fetch Bible Verse: {}", reference)
      )
      .await?;
    Ok(reply.with_language(language))
}

/// A list of verses. JSON-mode chat completions only return objects, so the
/// prompt asks for `{"verses": [...]}`; a bare array is still accepted from
/// providers that ignore the hint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum VerseList
{   Wrapped
    {   verses: Vec<VerseReply>
    }
  , Bare(Vec<VerseReply>)
}

impl VerseList
{   fn check(&self) -> std::result::Result<(), String>
    {   if self.verses().is_empty()
        {   Err("no verses returned".to_string())
        } else
        {   Ok(())
        }
    }

    fn verses(&self) -> &[VerseReply]
    {   match self
        {   VerseList::Wrapped { verses } | VerseList::Bare(verses) => verses
        }
    }

    fn into_verses(self, language: Language) -> Vec<BibleVerse>
    {   let verses = match self
        {   VerseList::Wrapped { verses } | VerseList::Bare(verses) => verses
        };
        verses
          .into_iter()
          .map(|v| v.with_language(language))
          .collect()
    }
}

const VERSE_LIST_FORMAT: &str
  = "Return as a JSON object {\"verses\": [...]} where each verse has \
     fields reference, book, chapter, verse, translations {english, \
     traditionalChinese, original} and highlightedWords [{original, \
     transliteration, meaning, strongsNumber, position}].";

async fn fetch_verse_list(
  client: &FailoverClient
, chain: &FailoverChain
, prompt: String
, context: &str
, language: Language
) -> Result<Vec<BibleVerse>>
{   let list: VerseList = client
      .execute_json_with(
        &scholar_request(prompt)
      , chain
      , context
      , &CancellationToken::new()
      , VerseList::check
      )
      .await?;
    Ok(list.into_verses(language))
}

/// Up to `limit` verses related to `keyword`
pub async fn search_by_keyword(
  client: &FailoverClient
, chain: &FailoverChain
, keyword: &str
, language: Language
, limit: usize
) -> Result<Vec<BibleVerse>>
{   require_text("keyword", keyword)?;
    let original = language.short_name();
    let testament = language.testament();

    let prompt = format!(
      "Find {limit} significant verses from the {testament} that relate \
       to the keyword \"{keyword}\".\n\n\
       For each verse provide:\n\
       1. The reference (e.g., \"Genesis 1:1\")\n\
       2. {original} original text\n\
       3. English translation\n\
       4. Traditional Chinese translation\n\
       5. 2-3 key words from the original {original} with \
       transliterations and meanings\n\n\
       {list_format}"
    , list_format = VERSE_LIST_FORMAT
    );

    let mut verses = fetch_verse_list(
      client
    , chain
    , prompt
    , &format!("Search Bible: {}", keyword)
    , language
    ).await?;
    verses.truncate(limit);
    Ok(verses)
}

/// Verse-by-verse breakdown of the passage from `start` to `end`
pub async fn analyze_passage(
  client: &FailoverClient
, chain: &FailoverChain
, start: &str
, end: &str
, language: Language
) -> Result<Vec<BibleVerse>>
{   require_text("start reference", start)?;
    require_text("end reference", end)?;
    let original = language.short_name();

    let prompt = format!(
      "Provide verse-by-verse analysis from {start} to {end}.\n\n\
       For each verse include:\n\
       - {original} original text\n\
       - English translation\n\
       - Traditional Chinese translation\n\
       - Key theological words with transliterations\n\n\
       {list_format}"
    , list_format = VERSE_LIST_FORMAT
    );

    fetch_verse_list(
      client
    , chain
    , prompt
    , &format!("Passage Analysis: {}-{}", start, end)
    , language
    ).await
}

/// Etymology and usage of a single original-language word
pub async fn analyze_word(
  client: &FailoverClient
, chain: &FailoverChain
, word: &str
, language: Language
) -> Result<WordAnalysis>
{   require_text("word", word)?;

    let prompt = format!(
      "Provide detailed linguistic analysis for the {} word \"{}\":\n\n\
       Return as JSON:\n\
       {{\n\
         \"original\": \"{}\",\n\
         \"transliteration\": \"romanization\",\n\
         \"meaning\": \"primary meaning\",\n\
         \"etymology\": \"word origin and root\",\n\
         \"usageExamples\": [\"example verse reference 1\"],\n\
         \"relatedWords\": [\"related word 1\"]\n\
       }}"
    , language.display_name()
    , word
    , word
    );

    client
      .execute_json(
        &scholar_request(prompt)
      , chain
      , &format!("Analyze Word: {}", word)
      )
      .await
}
