//! Sermon / teaching video transcript analysis

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::FailoverChain;
use crate::error::Result;
use crate::failover::FailoverClient;
use crate::request::CanonicalRequest;

use super::require_text;

const ANALYST_SYSTEM_PROMPT: &str = r#"You are an expert biblical teacher and theologian. Your goal is to analyze YouTube video transcripts of biblical teachings, sermons, or Christian educational content. Extract the main biblical focus, highlight key teachings, identify scripture references, note theological insights, and provide practical applications. Generate a quiz (mixing True/False and Multiple Choice questions) to test understanding of the biblical content.

IMPORTANT:
- Always cite specific Bible verses when referenced (e.g., "John 3:16", "Romans 8:28-30")
- Focus on theological accuracy and biblical soundness
- Make practical applications relevant to daily Christian living
- Ensure quiz questions test comprehension of key biblical concepts

Return your response as a valid JSON object with this exact structure:
{
  "title": "A concise, engaging title for the biblical teaching content",
  "mainFocus": "A summary of the main biblical focus or theme",
  "keyTeachings": ["teaching 1", "teaching 2"],
  "biblicalReferences": ["John 3:16", "Romans 8:28"],
  "practicalApplications": "How these teachings can be practically applied to daily Christian life",
  "theologicalInsights": ["insight 1", "insight 2"],
  "quiz": [
    {
      "question": "Question text",
      "type": "MULTIPLE_CHOICE" or "TRUE_FALSE",
      "options": ["Option 1", "Option 2"],
      "correctAnswerIndex": 0
    }
  ]
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType
{   MultipleChoice
  , TrueFalse
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion
{   pub question: String
  , #[serde(rename = "type")]
    pub kind: QuestionType
  , pub options: Vec<String>
  , pub correct_answer_index: usize
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeAnalysis
{   pub title: String
  , pub main_focus: String
  , pub key_teachings: Vec<String>
  , pub biblical_references: Vec<String>
  , pub practical_applications: String
  , pub theological_insights: Vec<String>
  , pub quiz: Vec<QuizQuestion>
}

impl YouTubeAnalysis
{   /// Every quiz answer must point at one of its options
    pub fn check_quiz(&self) -> std::result::Result<(), String>
    {   for (i, q) in self.quiz.iter().enumerate()
        {   if q.options.is_empty()
            {   return Err(format!("quiz question {} has no options", i));
            }
            if q.correct_answer_index >= q.options.len()
            {   return Err(format!(
                  "quiz question {} answer index {} out of {} options"
                , i
                , q.correct_answer_index
                , q.options.len()
                ));
            }
        }
        Ok(())
    }
}

/// Summarize a teaching transcript and build a comprehension quiz
pub async fn analyze_transcript(
  client: &FailoverClient
, chain: &FailoverChain
, transcript: &str
) -> Result<YouTubeAnalysis>
{   require_text("transcript", transcript)?;

    let request = CanonicalRequest::with_system(
        ANALYST_SYSTEM_PROMPT
      , format!(
          "Analyze the following biblical teaching video transcript:\n\n{}"
        , transcript
        )
      )
      .max_tokens(4000);

    client
      .execute_json_with(
        &request
      , chain
      , "YouTube Analysis"
      , &CancellationToken::new()
      , YouTubeAnalysis::check_quiz
      )
      .await
}

#[cfg(test)]
mod tests
{   use super::*;

    fn analysis(index: usize) -> YouTubeAnalysis
    {   YouTubeAnalysis
        {   title: "The Sower".to_string()
          , main_focus: "Receptive hearts".to_string()
          , key_teachings: vec![]
          , biblical_references: vec!["Matthew 13".to_string()]
          , practical_applications: String::new()
          , theological_insights: vec![]
          , quiz: vec![QuizQuestion
            {   question: "Is the seed the word of God?".to_string()
              , kind: QuestionType::TrueFalse
              , options: vec!["True".to_string(), "False".to_string()]
              , correct_answer_index: index
            }]
        }
    }

    #[test]
    fn quiz_index_checked()
    {   assert!(analysis(0).check_quiz().is_ok());
        assert!(analysis(2).check_quiz().is_err());
    }

    #[test]
    fn wire_names()
    {   let value = serde_json::to_value(analysis(1)).unwrap();
        assert_eq!(value["quiz"][0]["type"], "TRUE_FALSE");
        assert_eq!(value["quiz"][0]["correctAnswerIndex"], 1);
        assert!(value.get("mainFocus").is_some());
    }
}
