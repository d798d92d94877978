//! End-to-end turn scenarios.
//!
//! Each test wires the real tools (knowledge-base search over a canned
//! backend, branch lookup over an in-memory SQLite store) to a scripted
//! model and runs whole turns through the session manager.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use oleh_chat::{
    ChatError, ChatOracle, OracleFactory, OracleResponse, SessionManager, TurnOrchestrator,
    TurnStatus, NO_FILE_ATTACHED,
};
use oleh_core::config::{ChatConfig, DEFAULT_GREETING};
use oleh_core::{Part, Role, ToolRequest, TurnInput};
use oleh_storage::{import_branches, BranchRecord, Database, SqliteRecordStore};
use oleh_tools::{
    RecordLookupTool, SearchBackend, SearchRequest, SearchResponse, SearchTool, ToolError,
    ToolRegistry,
};

// =============================================================================
// Helpers
// =============================================================================

const BRANCH_FALLBACK: &str = "I could not find a specific branch for your location in my database.\nPlease refer to this official list to find your closest branch: https://www.gov.il/en/government-service-branches";

type SentLog = Arc<Mutex<Vec<Vec<Part>>>>;

struct ScriptedOracle {
    replies: VecDeque<OracleResponse>,
    sent: SentLog,
}

#[async_trait]
impl ChatOracle for ScriptedOracle {
    async fn send(&mut self, parts: Vec<Part>) -> Result<OracleResponse, ChatError> {
        self.sent.lock().unwrap().push(parts);
        self.replies
            .pop_front()
            .ok_or_else(|| ChatError::Llm("script exhausted".to_string()))
    }
}

struct CannedBackend {
    response: Value,
    queries: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SearchBackend for CannedBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ToolError> {
        self.queries.lock().unwrap().push(request.query.clone());
        Ok(serde_json::from_value(self.response.clone())?)
    }
}

fn tool_call(name: &str, query: &str) -> OracleResponse {
    let mut args = serde_json::Map::new();
    args.insert("query".to_string(), json!(query));
    OracleResponse::from_parts(vec![Part::FunctionCall(ToolRequest::new(name, args))])
}

fn registry(search_response: Value, queries: Arc<Mutex<Vec<String>>>) -> Arc<ToolRegistry> {
    let db = Arc::new(Database::in_memory().unwrap());
    import_branches(
        &db,
        &[BranchRecord {
            branch: "Jerusalem Branch".to_string(),
            address: "15 Hillel St".to_string(),
            email: "jerusalem@example.gov.il".to_string(),
            contact: "*2994".to_string(),
            serving: "Jerusalem, Mevaseret Zion".to_string(),
        }],
    )
    .unwrap();

    let search = SearchTool::new(Arc::new(CannedBackend {
        response: search_response,
        queries,
    }));
    let records = RecordLookupTool::new(Arc::new(SqliteRecordStore::new(db)));
    Arc::new(ToolRegistry::standard(search, records))
}

/// Session manager whose single session replays `replies`.
fn manager(replies: Vec<OracleResponse>, sent: SentLog) -> SessionManager {
    let script = Mutex::new(Some(replies));
    let factory: OracleFactory = Box::new(move || {
        let replies = script.lock().unwrap().take().unwrap_or_default();
        Box::new(ScriptedOracle {
            replies: replies.into(),
            sent: sent.clone(),
        }) as Box<dyn ChatOracle>
    });
    SessionManager::new(factory, DEFAULT_GREETING)
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn health_insurance_question_uses_search() {
    let queries = Arc::new(Mutex::new(Vec::new()));
    let registry = registry(
        json!({"results": [{"document": {"derivedStructData": {
            "link": "gov.il/health",
            "extractive_segments": [{"content": "Apply via Clalit..."}]
        }}}]}),
        queries.clone(),
    );
    let sent: SentLog = Arc::new(Mutex::new(Vec::new()));
    let sessions = manager(
        vec![
            tool_call("search_aliyah_information", "How do I get health insurance?"),
            OracleResponse::from_text("📋 Register with a health fund such as Clalit."),
        ],
        sent.clone(),
    );
    let orchestrator = TurnOrchestrator::new(registry, ChatConfig::default());

    let id = Uuid::new_v4();
    let shared = sessions.get_or_create(id).unwrap();
    let mut session = shared.lock().await;
    session.record_user("How do I get health insurance?");
    let reply = orchestrator
        .run_turn(
            &mut session,
            TurnInput::Text("How do I get health insurance?".to_string()),
        )
        .await;

    assert_eq!(reply.status, TurnStatus::Answered);
    assert_eq!(reply.tool_round_trips, 1);
    assert_eq!(
        *queries.lock().unwrap(),
        vec!["How do I get health insurance?".to_string()]
    );
    assert_eq!(
        sent.lock().unwrap()[1],
        vec![Part::FunctionResponse {
            name: "search_aliyah_information".to_string(),
            response: json!({"content": "- Apply via Clalit... (Source: gov.il/health)\n"}),
        }]
    );

    let roles: Vec<Role> = session.transcript().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn upload_without_file_adds_only_a_warning() {
    let sent: SentLog = Arc::new(Mutex::new(Vec::new()));
    let sessions = manager(vec![], sent.clone());
    let orchestrator = TurnOrchestrator::new(
        registry(json!({}), Arc::new(Mutex::new(Vec::new()))),
        ChatConfig::default(),
    );

    let shared = sessions.get_or_create(Uuid::new_v4()).unwrap();
    let mut session = shared.lock().await;
    let before = session.transcript().len();

    let reply = orchestrator
        .run_turn(&mut session, TurnInput::Text("upload".to_string()))
        .await;

    assert_eq!(reply.status, TurnStatus::ShortCircuited);
    assert_eq!(session.transcript().len(), before + 1);
    let last = &session.transcript()[before];
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, NO_FILE_ATTACHED);
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_city_gets_branch_directory_link() {
    let sent: SentLog = Arc::new(Mutex::new(Vec::new()));
    let sessions = manager(
        vec![
            tool_call(
                "find_ministry_of_aliyah_branch",
                "SELECT branch, address, email, contact FROM ministry_of_aliyah_branch_info WHERE LOWER(serving) LIKE '%eilat%'",
            ),
            OracleResponse::from_text(BRANCH_FALLBACK),
        ],
        sent.clone(),
    );
    let orchestrator = TurnOrchestrator::new(
        registry(json!({}), Arc::new(Mutex::new(Vec::new()))),
        ChatConfig::default(),
    );

    let shared = sessions.get_or_create(Uuid::new_v4()).unwrap();
    let mut session = shared.lock().await;
    let reply = orchestrator
        .run_turn(&mut session, TurnInput::Text("I live in Eilat".to_string()))
        .await;

    assert_eq!(
        sent.lock().unwrap()[1],
        vec![Part::FunctionResponse {
            name: "find_ministry_of_aliyah_branch".to_string(),
            response: json!({"content": []}),
        }]
    );
    assert_eq!(reply.text, BRANCH_FALLBACK);
}

#[tokio::test]
async fn known_city_returns_branch_rows() {
    let sent: SentLog = Arc::new(Mutex::new(Vec::new()));
    let sessions = manager(
        vec![
            tool_call(
                "find_ministry_of_aliyah_branch",
                "SELECT branch, contact FROM ministry_of_aliyah_branch_info WHERE LOWER(serving) LIKE '%mevaseret%'",
            ),
            OracleResponse::from_text("📞 Jerusalem Branch: *2994"),
        ],
        sent.clone(),
    );
    let orchestrator = TurnOrchestrator::new(
        registry(json!({}), Arc::new(Mutex::new(Vec::new()))),
        ChatConfig::default(),
    );

    let shared = sessions.get_or_create(Uuid::new_v4()).unwrap();
    let mut session = shared.lock().await;
    orchestrator
        .run_turn(&mut session, TurnInput::Text("Mevaseret".to_string()))
        .await;

    assert_eq!(
        sent.lock().unwrap()[1],
        vec![Part::FunctionResponse {
            name: "find_ministry_of_aliyah_branch".to_string(),
            response: json!({"content": [{"branch": "Jerusalem Branch", "contact": "*2994"}]}),
        }]
    );
}

#[tokio::test]
async fn broken_query_is_reported_to_the_model() {
    let sent: SentLog = Arc::new(Mutex::new(Vec::new()));
    let sessions = manager(
        vec![
            tool_call("find_ministry_of_aliyah_branch", "SELEC nonsense"),
            OracleResponse::from_text("Sorry, let me try that differently."),
        ],
        sent.clone(),
    );
    let orchestrator = TurnOrchestrator::new(
        registry(json!({}), Arc::new(Mutex::new(Vec::new()))),
        ChatConfig::default(),
    );

    let shared = sessions.get_or_create(Uuid::new_v4()).unwrap();
    let mut session = shared.lock().await;
    let reply = orchestrator
        .run_turn(&mut session, TurnInput::Text("Haifa".to_string()))
        .await;
    assert_eq!(reply.status, TurnStatus::Answered);

    let sent = sent.lock().unwrap();
    let Part::FunctionResponse { response, .. } = &sent[1][0] else {
        panic!("expected a function response");
    };
    let content = response["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert!(content[0]["error"].is_string());
}

#[tokio::test]
async fn ending_a_session_discards_it() {
    let sent: SentLog = Arc::new(Mutex::new(Vec::new()));
    let sessions = manager(vec![], sent);
    let id = Uuid::new_v4();

    sessions.get_or_create(id).unwrap();
    assert_eq!(sessions.len(), 1);

    sessions.end(id).await.unwrap();
    assert_eq!(sessions.len(), 0);
    assert!(sessions.get(id).is_none());
}
