//! OlehAssist application binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Open the SQLite record store and describe the branch table
//! 3. Build the tool registry (knowledge-base search + branch lookup)
//! 4. Run an interactive terminal chat, one session per process
//!
//! `olehassist import-branches <file>` loads the branch directory instead.

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use oleh_chat::{
    build_system_instructions, ChatOracle, GeminiChat, OracleFactory, SessionManager,
    TurnOrchestrator, SCHEMA_UNAVAILABLE,
};
use oleh_core::{Attachment, MediaType, OlehConfig, OlehError, TurnInput};
use oleh_storage::{import_branches, load_branch_file, Database, SqliteRecordStore};
use oleh_tools::{DiscoveryEngineBackend, RecordLookupTool, SearchTool, ToolRegistry};

use cli::{CliArgs, Command};

/// Open (or create) the record database under the data directory.
fn open_database(args: &CliArgs, config: &OlehConfig) -> Result<Arc<Database>, OlehError> {
    let data_dir = args.resolve_data_dir(&config.general.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join(&config.records.database_file);
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "Record database opened");
    Ok(Arc::new(db))
}

fn run_import(db: &Database, file: &Path) -> Result<(), OlehError> {
    let branches = load_branch_file(file)?;
    let count = import_branches(db, &branches)?;
    println!("Imported {} branch records from {}", count, file.display());
    Ok(())
}

/// Branch table schema as JSON, or the unavailable marker.
fn describe_branch_table(store: &SqliteRecordStore, table: &str) -> String {
    match store
        .describe_table(table)
        .map_err(OlehError::from)
        .and_then(|columns| serde_json::to_string(&columns).map_err(OlehError::from))
    {
        Ok(schema) => schema,
        Err(e) => {
            tracing::warn!(table, error = %e, "Schema introspection failed");
            SCHEMA_UNAVAILABLE.to_string()
        }
    }
}

fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load a staged attachment from disk.
async fn load_attachment(path: &Path) -> Result<Attachment, String> {
    let media_type = MediaType::from_path(path)
        .ok_or_else(|| "Unsupported file type. Use png, jpg, jpeg, or pdf.".to_string())?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Could not read {}: {}", path.display(), e))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(Attachment {
        file_name,
        media_type,
        bytes,
    })
}

async fn run_chat(config: OlehConfig, db: Arc<Database>) -> Result<(), OlehError> {
    let api_key = env_secret(&config.llm.api_key_env).ok_or_else(|| {
        OlehError::Config(format!(
            "{} is not set; the chat model needs an API key",
            config.llm.api_key_env
        ))
    })?;
    let access_token = env_secret(&config.search.access_token_env).unwrap_or_else(|| {
        tracing::warn!(
            var = %config.search.access_token_env,
            "Search access token not set; knowledge-base searches will fail"
        );
        String::new()
    });

    // Tools.
    let store = Arc::new(SqliteRecordStore::new(db));
    let schema = describe_branch_table(&store, &config.records.branch_table);
    let search = SearchTool::new(Arc::new(DiscoveryEngineBackend::from_config(
        &config.search,
        access_token,
    )))
    .with_limits(config.search.page_size, config.search.max_extractive_segments);
    let registry = Arc::new(ToolRegistry::standard(
        search,
        RecordLookupTool::new(store),
    ));
    tracing::info!(tools = ?registry, "Tool registry ready");

    // Sessions.
    let instructions = build_system_instructions(&schema, &config.records.branch_table);
    let declarations = registry.declarations();
    let client = reqwest::Client::new();
    let llm = config.llm.clone();
    let factory: OracleFactory = Box::new(move || {
        Box::new(GeminiChat::with_client(
            client.clone(),
            &llm,
            api_key.clone(),
            instructions.clone(),
            declarations.clone(),
        )) as Box<dyn ChatOracle>
    });
    let sessions = SessionManager::new(factory, config.chat.greeting.clone());
    let orchestrator = TurnOrchestrator::new(Arc::clone(&registry), config.chat.clone());

    let session_id = Uuid::new_v4();
    let shared = sessions.get_or_create(session_id)?;
    {
        let session = shared.lock().await;
        for message in session.transcript() {
            println!("assistant> {}\n", message.content);
        }
    }
    println!("(Commands: /attach <file>, /detach, /quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut staged: Option<Attachment> = None;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end().to_string();

        if line == "/quit" {
            break;
        }
        if line == "/detach" {
            staged = None;
            println!("(attachment cleared)");
            continue;
        }
        if let Some(path) = line.strip_prefix("/attach ") {
            match load_attachment(Path::new(path.trim())).await {
                Ok(attachment) => {
                    println!(
                        "(attached {} as {}; type 'upload' to send it)",
                        attachment.file_name, attachment.media_type
                    );
                    staged = Some(attachment);
                }
                Err(e) => println!("({})", e),
            }
            continue;
        }

        let input = match staged.clone() {
            Some(attachment) => TurnInput::TextWithAttachment {
                text: line.clone(),
                attachment,
            },
            None => TurnInput::Text(line.clone()),
        };

        let mut session = shared.lock().await;
        session.record_user(line);
        let reply = orchestrator.run_turn(&mut session, input).await;
        if let Some(warning) = reply.warning() {
            println!("{}", warning);
        }
        println!("assistant> {}\n", reply.text);
    }

    sessions.end(session_id).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = OlehConfig::load_or_default(&config_file);

    // Tracing. RUST_LOG takes precedence over flag and config.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting OlehAssist v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    let db = open_database(&args, &config)?;

    match args.command() {
        Command::ImportBranches { file } => run_import(&db, &file)?,
        Command::Chat => run_chat(config, db).await?,
    }

    tracing::info!("OlehAssist stopped");
    Ok(())
}
