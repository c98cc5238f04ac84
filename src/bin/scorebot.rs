//! scorebot CLI — operator interface to the scoring bot.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use scorebot_rs::config::Config;
use scorebot_rs::db::Db;
use scorebot_rs::engine::drain::ScoringOrchestrator;
use scorebot_rs::engine::ingest::SubmissionIngester;
use scorebot_rs::engine::notify::NotificationDispatcher;
use scorebot_rs::engine::publish::publish_puzzle;
use scorebot_rs::persist::Gateway;
use scorebot_rs::scoring::{HttpScorer, Scorer};
use scorebot_rs::social::SocialApi;
use scorebot_rs::social::auth::CredentialLifecycleManager;
use scorebot_rs::social::client::HttpSocialClient;
use scorebot_rs::social::pool::CredentialPool;
use scorebot_rs::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;

#[derive(Parser)]
#[command(name = "scorebot", about = "Social puzzle-scoring bot")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the three polling loops: ingestion, queue drain, credential refresh
    Serve,
    /// Interactively authorize pool credentials that have no stored token
    Authorize,
    /// Post a puzzle announcement from the primary identity
    PublishPuzzle {
        /// Puzzle id from the catalog
        puzzle_id: String,
        /// Announcement title
        #[arg(long)]
        title: String,
        /// Announcement description
        #[arg(long)]
        description: String,
    },
    /// Work queue operations
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// List recent work items
    List {
        /// Maximum items to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show a work item
    Show {
        /// Platform post id
        post_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cmd_serve().await,
        Command::Authorize => cmd_authorize().await,
        Command::PublishPuzzle {
            puzzle_id,
            title,
            description,
        } => cmd_publish_puzzle(puzzle_id, title, description).await,
        Command::Queue { action } => {
            let config = Config::from_env()?;
            let db = Db::connect(config.database_url.expose_secret()).await?;
            db.migrate().await?;

            match action {
                QueueAction::List { limit } => cmd_queue_list(&db, limit).await,
                QueueAction::Show { post_id } => cmd_queue_show(&db, post_id).await,
            }
        }
    }
}

async fn cmd_serve() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "scorebot".to_string(),
    })?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.migrate().await?;
    let gateway: Arc<dyn Gateway> = Arc::new(db);

    let pool = Arc::new(CredentialPool::load_from_file(&config.credentials_path)?);
    let social: Arc<dyn SocialApi> = Arc::new(HttpSocialClient::new(
        Arc::clone(&pool),
        Arc::clone(&gateway),
    ));
    let scorer: Arc<dyn Scorer> = Arc::new(HttpScorer::new(config.scoring_service_url.clone()));
    let notifier = Arc::new(NotificationDispatcher::new(
        Arc::clone(&social),
        config.leaderboard_url.clone(),
    ));

    let ingester = Arc::new(SubmissionIngester::new(
        Arc::clone(&gateway),
        Arc::clone(&social),
        config.search_query.clone(),
        pool.owner_ids(),
        config.ingest_interval,
    ));
    let orchestrator = Arc::new(ScoringOrchestrator::new(
        Arc::clone(&gateway),
        scorer,
        notifier,
        config.max_concurrent_scoring,
        config.drain_interval,
    ));
    let refresher = Arc::new(CredentialLifecycleManager::new(
        Arc::clone(&pool),
        Arc::clone(&social),
        Arc::clone(&gateway),
        config.redirect_uri.clone(),
        config.refresh_interval,
    ));

    let mut loops = tokio::task::JoinSet::new();
    {
        let ingester = Arc::clone(&ingester);
        loops.spawn(async move { ingester.run().await });
    }
    {
        let orchestrator = Arc::clone(&orchestrator);
        loops.spawn(async move { orchestrator.run().await });
    }
    {
        let refresher = Arc::clone(&refresher);
        loops.spawn(async move { refresher.run().await });
    }

    tokio::signal::ctrl_c().await.ok();
    ingester.shutdown();
    orchestrator.shutdown();
    refresher.shutdown();
    while loops.join_next().await.is_some() {}

    Ok(())
}

async fn cmd_authorize() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.migrate().await?;
    let gateway: Arc<dyn Gateway> = Arc::new(db);

    let pool = Arc::new(CredentialPool::load_from_file(&config.credentials_path)?);
    let social: Arc<dyn SocialApi> = Arc::new(HttpSocialClient::new(
        Arc::clone(&pool),
        Arc::clone(&gateway),
    ));

    let manager = CredentialLifecycleManager::new(
        pool,
        social,
        gateway,
        config.redirect_uri.clone(),
        config.refresh_interval,
    );
    manager.force_user_authentication().await?;
    println!("All credentials authorized.");
    Ok(())
}

async fn cmd_publish_puzzle(
    puzzle_id: String,
    title: String,
    description: String,
) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    db.migrate().await?;
    let gateway: Arc<dyn Gateway> = Arc::new(db);

    let pool = Arc::new(CredentialPool::load_from_file(&config.credentials_path)?);
    let social = HttpSocialClient::new(Arc::clone(&pool), Arc::clone(&gateway));

    let post_id = publish_puzzle(gateway.as_ref(), &social, &puzzle_id, &title, &description).await?;
    println!("Published {puzzle_id} as post {post_id}");
    Ok(())
}

async fn cmd_queue_list(db: &Db, limit: i64) -> anyhow::Result<()> {
    let items = db.list_work(limit).await?;

    if items.is_empty() {
        println!("No work items found.");
        return Ok(());
    }

    // Header
    println!(
        "{:<20}  {:<16}  {:<12}  {:<9}  {:<8}  CREATED",
        "POST_ID", "HANDLE", "PUZZLE", "COMPLETED", "ATTEMPTS"
    );
    println!("{}", "-".repeat(90));

    for item in &items {
        println!(
            "{:<20}  {:<16}  {:<12}  {:<9}  {:<8}  {}",
            item.post_id,
            item.handle,
            item.puzzle_id,
            item.completed,
            item.attempts,
            item.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\n{} item(s)", items.len());
    Ok(())
}

async fn cmd_queue_show(db: &Db, post_id: String) -> anyhow::Result<()> {
    let Some(item) = db.get_work(&post_id).await? else {
        anyhow::bail!("no work item for post '{post_id}'");
    };

    println!("Post ID:    {}", item.post_id);
    println!("Handle:     {}", item.handle);
    println!("Puzzle:     {}", item.puzzle_id);
    println!("Expression: {}", item.expression);
    println!("Completed:  {}", item.completed);
    println!("Attempts:   {}", item.attempts);
    println!(
        "Claimed:    {}",
        item.claimed_at
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Created:    {}", item.created_at);

    Ok(())
}
