//! In-memory app and function catalog served by the mock.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
pub struct FunctionRecord {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub visibility: String,
    pub active: bool,
    pub protocol: String,
    pub parameters: Value,
}

#[derive(Clone, Debug, Serialize)]
pub struct AppRecord {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub provider: String,
    pub version: String,
    pub description: String,
    pub logo: Option<String>,
    pub categories: Vec<String>,
    pub visibility: String,
    pub active: bool,
    pub security_schemes: Vec<String>,
    pub functions: Vec<FunctionRecord>,
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub apps: Vec<AppRecord>,
    /// Apps the caller's agent may use (`allowed_apps_only`).
    pub allowed_apps: HashSet<String>,
    /// `(app name, linked account owner id)` pairs.
    pub linked_accounts: HashSet<(String, String)>,
}

/// Owner id that has linked accounts in the sample catalog.
pub const SAMPLE_OWNER_ID: &str = "test-owner";

fn function(name: &str, description: &str, tags: &[&str], parameters: Value) -> FunctionRecord {
    FunctionRecord {
        name: name.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        visibility: "public".to_string(),
        active: true,
        protocol: "rest".to_string(),
        parameters,
    }
}

fn app(
    name: &str,
    display_name: &str,
    provider: &str,
    description: &str,
    categories: &[&str],
    functions: Vec<FunctionRecord>,
) -> AppRecord {
    AppRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
        display_name: display_name.to_string(),
        provider: provider.to_string(),
        version: "1.0.0".to_string(),
        description: description.to_string(),
        logo: None,
        categories: categories.iter().map(|c| c.to_string()).collect(),
        visibility: "public".to_string(),
        active: true,
        security_schemes: vec!["api_key".to_string()],
        functions,
    }
}

impl Catalog {
    /// Three apps; `BRAVE_SEARCH` and `GMAIL` are allowed and linked to
    /// `SAMPLE_OWNER_ID`, `GITHUB` is neither.
    pub fn sample() -> Self {
        let apps = vec![
            app(
                "BRAVE_SEARCH",
                "Brave Search",
                "Brave",
                "Search the web privately with Brave Search",
                &["search"],
                vec![function(
                    "BRAVE_SEARCH__WEB_SEARCH",
                    "Search the web and return the top results",
                    &["search", "web"],
                    json!({
                        "type": "object",
                        "properties": {
                            "query": {"type": "string", "description": "The search query"},
                            "count": {"type": "integer", "description": "Number of results"},
                        },
                        "required": ["query"],
                        "additionalProperties": false,
                    }),
                )],
            ),
            app(
                "GMAIL",
                "Gmail",
                "Google",
                "Send emails and read your inbox with Gmail",
                &["email", "communication"],
                vec![
                    function(
                        "GMAIL__SEND_EMAIL",
                        "Send an email to a recipient",
                        &["email"],
                        json!({
                            "type": "object",
                            "properties": {
                                "to": {"type": "string"},
                                "subject": {"type": "string"},
                                "body": {"type": "string"},
                            },
                            "required": ["to", "subject", "body"],
                            "additionalProperties": false,
                        }),
                    ),
                    function(
                        "GMAIL__LIST_MESSAGES",
                        "List recent messages in the inbox",
                        &["email"],
                        json!({"type": "object", "properties": {}, "additionalProperties": false}),
                    ),
                ],
            ),
            app(
                "GITHUB",
                "GitHub",
                "GitHub",
                "Manage repositories, issues and pull requests on GitHub",
                &["developer"],
                vec![
                    function(
                        "GITHUB__CREATE_ISSUE",
                        "Create an issue in a repository",
                        &["issues"],
                        json!({
                            "type": "object",
                            "properties": {
                                "repo": {"type": "string"},
                                "title": {"type": "string"},
                            },
                            "required": ["repo", "title"],
                            "additionalProperties": false,
                        }),
                    ),
                    function(
                        "GITHUB__STAR_REPOSITORY",
                        "Star a repository",
                        &["repositories"],
                        json!({
                            "type": "object",
                            "properties": {"repo": {"type": "string"}},
                            "required": ["repo"],
                            "additionalProperties": false,
                        }),
                    ),
                ],
            ),
        ];
        let allowed_apps = ["BRAVE_SEARCH", "GMAIL"].iter().map(|s| s.to_string()).collect();
        let linked_accounts = ["BRAVE_SEARCH", "GMAIL"]
            .iter()
            .map(|app| (app.to_string(), SAMPLE_OWNER_ID.to_string()))
            .collect();
        Self {
            apps,
            allowed_apps,
            linked_accounts,
        }
    }

    pub fn app(&self, name: &str) -> Option<&AppRecord> {
        self.apps.iter().find(|a| a.name == name)
    }

    pub fn function(&self, name: &str) -> Option<(&AppRecord, &FunctionRecord)> {
        self.apps
            .iter()
            .find_map(|a| a.functions.iter().find(|f| f.name == name).map(|f| (a, f)))
    }

    pub fn is_configured(&self, app: &str) -> bool {
        self.linked_accounts.iter().any(|(a, _)| a == app)
    }

    pub fn is_linked(&self, app: &str, owner_id: &str) -> bool {
        self.linked_accounts
            .contains(&(app.to_string(), owner_id.to_string()))
    }
}

/// Number of intent words found in `text`; `Some(0)` means no match.
/// `None` intent matches everything with equal relevance.
pub fn relevance(intent: Option<&str>, text: &str) -> Option<usize> {
    let intent = intent?;
    let text = text.to_lowercase();
    Some(
        intent
            .to_lowercase()
            .split_whitespace()
            .filter(|word| text.contains(word))
            .count(),
    )
}

/// Keep matching items, most relevant first, then apply offset/limit.
pub fn rank_and_page<T>(
    items: Vec<(T, Option<usize>)>,
    limit: Option<usize>,
    offset: usize,
) -> Vec<T> {
    let mut matched: Vec<(T, usize)> = items
        .into_iter()
        .filter_map(|(item, score)| match score {
            None => Some((item, 0)),
            Some(0) => None,
            Some(n) => Some((item, n)),
        })
        .collect();
    matched.sort_by(|a, b| b.1.cmp(&a.1));
    matched
        .into_iter()
        .map(|(item, _)| item)
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}
