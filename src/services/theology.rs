//! Theology assistant: mode-specific chat and resource search

use serde::{Deserialize, Serialize};

use crate::config::FailoverChain;
use crate::error::{Error, Result};
use crate::failover::FailoverClient;
use crate::request::{CanonicalRequest, ChatMessage, Role};

use super::require_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType
{   Book
  , Article
  , Commentary
  , Encyclopedia
  , Thesis
  , Website
}

impl ResourceType
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   ResourceType::Book => "book"
          , ResourceType::Article => "article"
          , ResourceType::Commentary => "commentary"
          , ResourceType::Encyclopedia => "encyclopedia"
          , ResourceType::Thesis => "thesis"
          , ResourceType::Website => "website"
        }
    }
}

/// How the search should be framed for the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode
{   GoogleSearch
  , /// Restrict to these sites; must not be empty
    UrlContext(Vec<String>)
  , CodeExecution
  , GeneralKnowledge
}

impl SearchMode
{   pub fn label(&self) -> &'static str
    {   match self
        {   SearchMode::GoogleSearch => "Google Search"
          , SearchMode::UrlContext(_) => "URL Context"
          , SearchMode::CodeExecution => "Code Execution Analysis"
          , SearchMode::GeneralKnowledge => "Knowledge Base"
        }
    }

    fn temperature(&self) -> f32
    {   match self
        {   SearchMode::GeneralKnowledge => 0.5
          , _ => 0.3
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSearchResult
{   pub title: String
  , #[serde(default = "unknown_author")]
    pub author: String
  , #[serde(rename = "type", default = "default_type")]
    pub kind: ResourceType
  , #[serde(default)]
    pub description: String
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>
  , #[serde(default)]
    pub tags: Vec<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>
}

fn unknown_author() -> String
{   "Unknown author".to_string()
}

fn default_type() -> ResourceType
{   ResourceType::Article
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse
{   pub results: Vec<ResourceSearchResult>
  , pub summary: String
}

#[derive(Debug, Clone, Deserialize)]
struct SearchReply
{   #[serde(default)]
    results: Vec<ResourceSearchResult>
}

/// Well-known sites per theological tradition, for URL context searches
pub fn resource_urls(category: &str) -> &'static [&'static str]
{   match category
    {   "reformed" => &[
          "https://www.monergism.com"
        , "https://www.ligonier.org"
        , "https://www.thegospelcoalition.org"
        ]
      , "catholic" => &[
          "https://www.vatican.va"
        , "https://www.catholic.com"
        , "https://www.newadvent.org"
        ]
      , "orthodox" => &[
          "https://www.oca.org"
        , "https://www.goarch.org"
        ]
      , "academic" => &[
          "https://www.logos.com"
        , "https://www.biblicalstudies.org.uk"
        , "https://www.jstor.org"
        ]
      , _ => &[]
    }
}

fn search_prompt(
  query: &str
, type_filter: &str
, mode: &SearchMode
) -> String
{   let task = match mode
    {   SearchMode::GoogleSearch => format!(
          "You are a theology research expert. Find theological resources \
           about \"{query}\" as a web search would.\n{type_filter}\
           Look for theological books, academic articles and theses, Bible \
           commentaries, theological encyclopedia entries and reputable \
           theological websites."
        )
      , SearchMode::UrlContext(urls) => format!(
          "Analyze the content of these theological websites and find \
           material about \"{query}\":\n{}\n{type_filter}\
           For each site give the relevant content, the author or \
           organization, the resource type and its theological position."
        , urls.iter()
            .map(|u| format!("- {}", u))
            .collect::<Vec<_>>()
            .join("\n")
        )
      , SearchMode::CodeExecution => format!(
          "Analyze the theological literature on \"{query}\".\n{type_filter}\
           Classify the resource types, summarize their distribution by era, \
           identify the main authors and schools, and rank the resources by \
           recommended priority."
        )
      , SearchMode::GeneralKnowledge => format!(
          "From your theological knowledge, recommend resources about \
           \"{query}\".\n{type_filter}\
           Include classic theological works, important scholars, related \
           Bible commentaries, encyclopedia entries and a suggested reading \
           order."
        )
    };

    format!(
      "{task}\n\n\
       Prefer orthodox Christian theological resources and keep every \
       bibliographic detail accurate.\n\n\
       Respond with JSON only:\n\
       {{\"results\": [{{\"title\": \"...\", \"author\": \"...\", \
       \"type\": \"book|article|commentary|encyclopedia|thesis|website\", \
       \"description\": \"2-3 sentences\", \"url\": \"https://... or null\", \
       \"tags\": [\"...\"]}}]}}"
    )
}

/// Search for theological resources on `query`.
/// `resource_type` narrows the search; `None` means all types.
pub async fn search_resources(
  client: &FailoverClient
, chain: &FailoverChain
, query: &str
, resource_type: Option<ResourceType>
, mode: &SearchMode
) -> Result<SearchResponse>
{   require_text("query", query)?;
    if let SearchMode::UrlContext(urls) = mode
    {   if urls.is_empty()
        {   return Err(Error::InvalidRequest(
              "URL context search needs at least one target URL".to_string()
            ));
        }
    }

    let type_filter = resource_type
      .map(|t| format!("Focus on finding {} resources.\n", t.as_str()))
      .unwrap_or_default();

    let request = CanonicalRequest::from_prompt(
        search_prompt(query, &type_filter, mode)
      )
      .temperature(mode.temperature())
      .max_tokens(3000);

    let reply: SearchReply = client
      .execute_json(
        &request
      , chain
      , &format!("Theology Search ({}): {}", mode.label(), query)
      )
      .await?;

    Ok(label_results(reply.results, query, mode))
}

fn label_results(
  results: Vec<ResourceSearchResult>
, query: &str
, mode: &SearchMode
) -> SearchResponse
{   let source = match mode
    {   SearchMode::UrlContext(_) => "URL Context".to_string()
      , other => format!("AI search: {}", other.label())
    };
    let results: Vec<ResourceSearchResult> = results
      .into_iter()
      .map(|mut r| {
        if r.source.as_deref().map_or(true, |s| s.trim().is_empty())
        {   r.source = Some(source.clone());
        }
        r
      })
      .collect();

    let summary = format!(
      "Found {} theological resources about \"{}\" via {}"
    , results.len()
    , query
    , mode.label()
    );
    SearchResponse { results, summary }
}

// ===== Chat =====

const ASSISTANT_BASE_PROMPT: &str = "你是一位專業的神學研究助手，擁有深厚的聖經知識、教會歷史和系統神學理解。你的回應應該：

1. 基於聖經真理和正統神學傳統
2. 提供準確的經文引用和歷史背景
3. 以學術嚴謹但易於理解的方式表達
4. 尊重不同的神學立場，但明確指出你的觀點基礎
5. 鼓勵深入思考和屬靈成長

請用繁體中文回應。";

/// What the assistant is helping with in a conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMode
{   #[default]
    #[serde(rename = "Theology Chat")]
    TheologyChat
  , #[serde(rename = "Reading Q&A")]
    ReadingQa
  , #[serde(rename = "Assignment Assistant")]
    AssignmentAssistant
  , #[serde(rename = "Resource Search")]
    ResourceSearch
}

impl ChatMode
{   pub fn label(&self) -> &'static str
    {   match self
        {   ChatMode::TheologyChat => "Theology Chat"
          , ChatMode::ReadingQa => "Reading Q&A"
          , ChatMode::AssignmentAssistant => "Assignment Assistant"
          , ChatMode::ResourceSearch => "Resource Search"
        }
    }

    fn instruction(&self) -> &'static str
    {   match self
        {   ChatMode::TheologyChat => {
              "當前模式：神學對話。請針對用戶的神學問題提供深入且平衡的回答。"
            }
          , ChatMode::ReadingQa => {
              "當前模式：文檔問答。請基於已上傳的文檔內容回答問題，並提供相關的引用和分析。"
            }
          , ChatMode::AssignmentAssistant => {
              "當前模式：作業助手。請幫助用戶完成神學作業，提供學術性的指導和建議。"
            }
          , ChatMode::ResourceSearch => {
              "當前模式：資源搜尋。請幫助用戶找到相關的神學資源和參考文獻。"
            }
        }
    }
}

/// System prompt for `mode`: the shared assistant persona plus the mode's
/// instruction
pub fn system_prompt(mode: ChatMode) -> String
{   format!("{}\n\n{}", ASSISTANT_BASE_PROMPT, mode.instruction())
}

/// Continue a conversation. `history` holds the user and assistant turns in
/// order and must end with the user's latest message; the mode's system
/// prompt is put in front of it.
pub async fn chat(
  client: &FailoverClient
, chain: &FailoverChain
, mode: ChatMode
, history: &[ChatMessage]
) -> Result<String>
{   match history.last()
    {   None => {
          return Err(Error::InvalidRequest(
            "conversation has no messages".to_string()
          ));
        }
      , Some(last) if last.role != Role::User => {
          return Err(Error::InvalidRequest(
            "conversation must end with a user message".to_string()
          ));
        }
      , Some(_) => {}
    }
    if history.iter().any(|m| m.role == Role::System)
    {   return Err(Error::InvalidRequest(
          "system messages are set by the chat mode".to_string()
        ));
    }

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(system_prompt(mode)));
    messages.extend(history.iter().cloned());

    let response = client
      .execute(
        &CanonicalRequest::new(messages)
      , chain
      , &format!("Theology Chat ({})", mode.label())
      )
      .await?;
    Ok(response.content)
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn missing_fields_take_defaults()
    {   let reply: SearchReply = serde_json::from_str(
          r#"{"results":[{"title":"Institutes of the Christian Religion"}]}"#
        ).unwrap();
        let r = &reply.results[0];
        assert_eq!(r.author, "Unknown author");
        assert_eq!(r.kind, ResourceType::Article);
        assert!(r.tags.is_empty());
    }

    #[test]
    fn sources_filled_and_summary_counts()
    {   let results = vec![
          ResourceSearchResult
          {   title: "A".to_string()
            , author: "X".to_string()
            , kind: ResourceType::Book
            , description: String::new()
            , url: None
            , tags: vec![]
            , source: None
          }
        , ResourceSearchResult
          {   title: "B".to_string()
            , author: "Y".to_string()
            , kind: ResourceType::Website
            , description: String::new()
            , url: Some("https://www.ligonier.org".to_string())
            , tags: vec![]
            , source: Some("Ligonier".to_string())
          }
        ];
        let response = label_results(
          results
        , "grace"
        , &SearchMode::GeneralKnowledge
        );
        assert_eq!(
          response.results[0].source.as_deref()
        , Some("AI search: Knowledge Base")
        );
        assert_eq!(response.results[1].source.as_deref(), Some("Ligonier"));
        assert!(response.summary.starts_with("Found 2 "));
    }

    #[test]
    fn every_mode_shares_the_persona()
    {   for mode in [
          ChatMode::TheologyChat
        , ChatMode::ReadingQa
        , ChatMode::AssignmentAssistant
        , ChatMode::ResourceSearch
        ]
        {   let prompt = system_prompt(mode);
            assert!(prompt.starts_with(ASSISTANT_BASE_PROMPT));
            assert!(prompt.ends_with(mode.instruction()));
        }
        assert_eq!(ChatMode::default(), ChatMode::TheologyChat);
        assert_eq!(
          serde_json::to_value(ChatMode::ReadingQa).unwrap()
        , "Reading Q&A"
        );
    }

    #[test]
    fn url_prompt_lists_sites()
    {   let mode = SearchMode::UrlContext(
          resource_urls("orthodox").iter().map(|s| s.to_string()).collect()
        );
        let prompt = search_prompt("theosis", "", &mode);
        assert!(prompt.contains("- https://www.oca.org"));
        assert!(prompt.contains("\"theosis\""));
    }
}
