use clap::{Args, Subcommand};
use focusflow_core::chat::{ALL_DONE_REPLY, ERROR_REPLY, SUGGESTIONS};
use focusflow_core::{ChatMessage, ChatRelay, Config, Database, TaskRepository, TaskSet};

use super::{open_stores, CliResult, Context};

/// Turns kept between invocations.
const HISTORY_LIMIT: usize = 20;

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct ChatArgs {
    #[command(subcommand)]
    action: Option<ChatAction>,
    /// Message to send
    message: Vec<String>,
}

#[derive(Subcommand)]
pub enum ChatAction {
    /// List suggested questions
    Suggestions,
    /// Forget the conversation so far
    Clear,
}

fn history_key(user_id: &str) -> String {
    format!("chat_history:{user_id}")
}

fn load_history(db: &Database, user_id: &str) -> Vec<ChatMessage> {
    db.kv_get(&history_key(user_id))
        .ok()
        .flatten()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn save_history(db: &Database, user_id: &str, history: &[ChatMessage]) -> CliResult {
    let start = history.len().saturating_sub(HISTORY_LIMIT);
    db.kv_set(&history_key(user_id), &serde_json::to_string(&history[start..])?)?;
    Ok(())
}

pub fn run(ctx: &Context, args: ChatArgs) -> CliResult {
    match args.action {
        Some(ChatAction::Suggestions) => {
            for s in SUGGESTIONS {
                println!("{s}");
            }
            return Ok(());
        }
        Some(ChatAction::Clear) => {
            let config = Config::load()?;
            let (db, _store) = open_stores()?;
            save_history(&db, &ctx.user_id(&config), &[])?;
            println!("Conversation cleared.");
            return Ok(());
        }
        None => {}
    }

    let question = args.message.join(" ");
    if question.trim().is_empty() {
        return Err("nothing to send; pass a message or run `focusflow chat suggestions`".into());
    }

    let config = Config::load()?;
    let user_id = ctx.user_id(&config);
    let (db, store) = open_stores()?;
    let current = store.list_tasks(&user_id, TaskSet::Active)?;
    let completed = store.list_tasks(&user_id, TaskSet::Completed)?;
    let mut history = load_history(&db, &user_id);

    let reply = if current.is_empty() {
        ALL_DONE_REPLY.to_string()
    } else {
        let answer = match ChatRelay::from_config(&config.chat) {
            Ok(relay) => {
                let rt = tokio::runtime::Runtime::new()?;
                rt.block_on(relay.ask(&history, &question, &current, &completed))
            }
            Err(e) => Err(e),
        };
        match answer {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                eprintln!("error: {e}");
                ERROR_REPLY.to_string()
            }
        }
    };

    println!("{reply}");
    history.push(ChatMessage::user(question));
    history.push(ChatMessage::assistant(reply));
    save_history(&db, &user_id, &history)?;
    Ok(())
}
