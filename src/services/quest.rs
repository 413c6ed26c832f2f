//! Bible study question generation for the character quest game

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::FailoverChain;
use crate::error::Result;
use crate::failover::FailoverClient;
use crate::request::CanonicalRequest;

use super::require_text;

const BIBLE_GATEWAY_PASSAGE: &str
  = "https://www.biblegateway.com/passage/";

const QUESTION_SYSTEM_PROMPT: &str = r#"You are a professional Bible teacher and theological educator specializing in creating high-quality Bible study questions for Christian education.

Your task is to generate an educational question about a Biblical character or event for a Christian Sunday School learning platform.

REQUIREMENTS:
1. Character Selection: Choose a meaningful Biblical character from Old or New Testament
2. Question Category: "Bible Background" (historical, cultural, geographical context) or "Person in Bible" (a character's actions, personality, experiences or faith journey)
3. Question Design: Write the question in first person from the character's perspective
4. Answer Options: Provide 4 multiple choice options with 3 reasonable but incorrect distractors, with the correct answer placed at a random position
5. Explanation: Detailed answer explanation with specific Bible verse citations
6. Journal Prompt: A reflection prompt applying the story to modern Christian life
7. Deep Dive: Theological depth analysis of themes, historical context and significance
8. Bible Sources: 2-3 relevant Bible passage references

RESPONSE FORMAT - respond with valid JSON containing these fields:
{
  "character": "Biblical character name",
  "category": "Bible Background" or "Person in Bible",
  "question": "Question content (first person perspective)",
  "options": ["Option A", "Option B", "Option C", "Option D"],
  "correctAnswerIndex": 0,
  "explanation": "Detailed explanation with Bible verse citations",
  "journalPromptTitle": "Journal prompt title",
  "journalPromptContent": "Reflection content",
  "deepDiveTitle": "Deep dive title",
  "deepDiveContent": "Theological analysis",
  "bibleSources": [
    { "reference": "Genesis 3:1-6 (NIV)", "englishReference": "Genesis 3:1-6" }
  ]
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionCategory
{   #[serde(rename = "Bible Background")]
    BibleBackground
  , #[serde(rename = "Person in Bible")]
    PersonInBible
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Testament
{   Old
  , New
  , Both
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BibleSourceReply
{   reference: String
  , english_reference: String
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestReply
{   character: String
  , category: QuestionCategory
  , question: String
  , options: Vec<String>
  , correct_answer_index: usize
  , explanation: String
  , journal_prompt_title: String
  , journal_prompt_content: String
  , deep_dive_title: String
  , deep_dive_content: String
  , #[serde(default)]
    bible_sources: Vec<BibleSourceReply>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalPrompt
{   pub title: String
  , pub content: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLink
{   pub text: String
  , pub url: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepDive
{   pub title: String
  , pub content: String
  , pub sources: Vec<SourceLink>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest
{   pub character: String
  , pub category: QuestionCategory
  , pub question: String
  , pub options: Vec<String>
  , pub correct_answer_index: usize
  , pub explanation: String
  , pub journal_prompt: JournalPrompt
  , pub deep_dive: DeepDive
}

impl QuestReply
{   fn check(&self) -> std::result::Result<(), String>
    {   if self.options.len() < 2
        {   return Err(format!(
              "expected answer options, got {}"
            , self.options.len()
            ));
        }
        if self.correct_answer_index >= self.options.len()
        {   return Err(format!(
              "answer index {} out of {} options"
            , self.correct_answer_index
            , self.options.len()
            ));
        }
        Ok(())
    }

    fn into_quest(self) -> Quest
    {   let sources = self.bible_sources
          .into_iter()
          .filter_map(|s| {
            passage_url(&s.english_reference).map(|url| SourceLink
            {   text: s.reference
              , url
            })
          })
          .collect();

        Quest
        {   character: self.character
          , category: self.category
          , question: self.question
          , options: self.options
          , correct_answer_index: self.correct_answer_index
          , explanation: self.explanation
          , journal_prompt: JournalPrompt
            {   title: self.journal_prompt_title
              , content: self.journal_prompt_content
            }
          , deep_dive: DeepDive
            {   title: self.deep_dive_title
              , content: self.deep_dive_content
              , sources
            }
        }
    }
}

/// BibleGateway NIV link for an English passage reference
pub fn passage_url(english_reference: &str) -> Option<String>
{   if english_reference.trim().is_empty()
    {   return None;
    }
    Url::parse_with_params(
      BIBLE_GATEWAY_PASSAGE
    , &[("search", english_reference.trim()), ("version", "NIV")]
    )
    .ok()
    .map(String::from)
}

/// One study question from a free-form prompt
pub async fn generate_question(
  client: &FailoverClient
, chain: &FailoverChain
, user_prompt: &str
) -> Result<Quest>
{   require_text("prompt", user_prompt)?;

    let request = CanonicalRequest::with_system(
      QUESTION_SYSTEM_PROMPT
    , user_prompt
    );

    let reply: QuestReply = client
      .execute_json_with(
        &request
      , chain
      , "Generate Biblical Question"
      , &CancellationToken::new()
      , QuestReply::check
      )
      .await?;
    Ok(reply.into_quest())
}

/// Build the prompt for a character / theme / testament combination
pub fn topic_prompt(
  character: Option<&str>
, topic: Option<&str>
, testament: Testament
) -> String
{   let mut prompt = String::from(
      "Generate an educational Bible study question for a Christian \
       Sunday School platform"
    );
    if let Some(name) = character.filter(|s| !s.trim().is_empty())
    {   prompt.push_str(&format!(
          " about the Biblical character or concept \"{}\""
        , name
        ));
    }
    if let Some(theme) = topic.filter(|s| !s.trim().is_empty())
    {   prompt.push_str(&format!(" with the theme of \"{}\"", theme));
    }
    match testament
    {   Testament::Old => prompt.push_str(" from the Old Testament")
      , Testament::New => prompt.push_str(" from the New Testament")
      , Testament::Both => {}
    }
    prompt.push('.');
    prompt
}

pub async fn generate_question_with_topic(
  client: &FailoverClient
, chain: &FailoverChain
, character: Option<&str>
, topic: Option<&str>
, testament: Testament
) -> Result<Quest>
{   generate_question(
      client
    , chain
    , &topic_prompt(character, topic, testament)
    ).await
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn passage_url_is_encoded()
    {   assert_eq!(
          passage_url("Genesis 3:1-6").as_deref()
        , Some("https://www.biblegateway.com/passage/?search=Genesis+3%3A1-6&version=NIV")
        );
        assert_eq!(passage_url("  "), None);
    }

    #[test]
    fn topic_prompt_composition()
    {   let prompt = topic_prompt(Some("Ruth"), Some("loyalty"), Testament::Old);
        assert_eq!(
          prompt
        , "Generate an educational Bible study question for a Christian \
           Sunday School platform about the Biblical character or concept \
           \"Ruth\" with the theme of \"loyalty\" from the Old Testament."
        );
        assert!(topic_prompt(None, None, Testament::Both)
          .ends_with("platform."));
    }

    #[test]
    fn reply_converts_to_quest()
    {   let reply: QuestReply = serde_json::from_str(r#"{
          "character": "Ruth", "category": "Person in Bible",
          "question": "Where will I go?", "options": ["Moab", "Bethlehem", "Egypt", "Ur"],
          "correctAnswerIndex": 1, "explanation": "Ruth 1:16",
          "journalPromptTitle": "Loyalty", "journalPromptContent": "Reflect",
          "deepDiveTitle": "Hesed", "deepDiveContent": "Covenant love",
          "bibleSources": [{ "reference": "Ruth 1:16 (NIV)", "englishReference": "Ruth 1:16" }]
        }"#).unwrap();
        assert!(reply.check().is_ok());

        let quest = reply.into_quest();
        assert_eq!(quest.category, QuestionCategory::PersonInBible);
        assert_eq!(quest.deep_dive.sources[0].text, "Ruth 1:16 (NIV)");
        assert!(quest.deep_dive.sources[0].url.contains("search=Ruth+1%3A16"));
    }
}
