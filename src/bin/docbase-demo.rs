use clap::{Parser, Subcommand};
use docbase_client::{
    DocbaseClient, FieldDefinition, Filter, ListOptions, QueryRequest, SyncOptions,
};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docbase-demo")]
#[command(about = "Walk through the Docbase client against a live endpoint", long_about = None)]
struct Args {
    /// API endpoint
    #[arg(long, env = "DOCBASE_URL", default_value = "http://localhost:8080")]
    url: String,

    /// API key
    #[arg(long, env = "DOCBASE_API_KEY")]
    api_key: String,

    /// Application scope
    #[arg(long, env = "DOCBASE_APP_ID")]
    app_id: Option<String>,

    /// Queue writes that fail for lack of network
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List collections
    Collections,
    /// Insert a JSON document
    Insert {
        collection: String,
        /// Document body, e.g. '{"name": "Sambo"}'
        document: String,
    },
    /// List documents
    List {
        collection: String,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// Find documents where FIELD equals VALUE
    Find {
        collection: String,
        field: String,
        value: String,
    },
    /// Show changes since a timestamp or watermark
    Sync {
        collection: String,
        #[arg(long)]
        since: Option<String>,
    },
    /// Run the end-to-end walkthrough against a `users` collection
    Walkthrough,
}

fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docbase_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut builder = DocbaseClient::builder(&args.url)
        .api_key(&args.api_key)
        .offline(args.offline);
    if let Some(app_id) = &args.app_id {
        builder = builder.app_id(app_id);
    }
    let client = builder.build()?;

    match args.command {
        Command::Collections => {
            for c in client.list_collections().await? {
                println!("{}\t{}\t{}", c.id, c.name, c.updated_at);
            }
        }
        Command::Insert {
            collection,
            document,
        } => {
            let body: Value = serde_json::from_str(&document)?;
            let collection = client.collection(&collection).await?;
            match collection.create(&body).await {
                Ok(doc) => print_json(&Value::Object(doc.data)),
                Err(e) if e.is_queued() => {
                    println!("Queued for replay ({} pending)", client.pending_count().await)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::List { collection, limit } => {
            let collection = client.collection(&collection).await?;
            let page = collection.list(&ListOptions::new().limit(limit)).await?;
            for doc in page.items {
                println!("{}\tv{}\t{}", doc.id, doc.version, Value::Object(doc.data));
            }
        }
        Command::Find {
            collection,
            field,
            value,
        } => {
            let collection = client.collection(&collection).await?;
            let query = QueryRequest::new().filter(Filter::eq(field, value));
            let page = collection.query(&query).await?;
            println!("{} match(es)", page.items.len());
            for doc in page.items {
                print_json(&Value::Object(doc.data));
            }
        }
        Command::Sync { collection, since } => {
            let collection = client.collection(&collection).await?;
            let mut options = SyncOptions::new();
            if let Some(since) = since {
                options = options.since_watermark(since);
            }
            let page = collection.sync(&options).await?;
            for change in &page.items {
                println!("{:?}\t{}", change.change_type, change.document.id);
            }
            if let Some(since) = page.since {
                println!("next since: {}", since);
            }
        }
        Command::Walkthrough => {
            let users = client
                .collection("users")
                .field("name", FieldDefinition::string().required())
                .await?;
            println!("Collection {} ({})", users.name(), users.descriptor().await.id);

            let doc = users.create(&serde_json::json!({"name": "Sambo"})).await?;
            println!("Created {} v{}", doc.id, doc.version);

            let query = QueryRequest::new()
                .filter(Filter::and([Filter::eq("name", "Sambo")]))
                .limit(10);
            let page = users.query(&query).await?;
            println!(
                "Query returned {} item(s), next cursor: {:?}",
                page.items.len(),
                page.pagination.next_cursor
            );

            users.delete(&doc.id).await?;
            println!("Deleted {}", doc.id);
        }
    }

    if client.pending_count().await > 0 {
        match client.flush().await {
            Ok(n) => println!("Replayed {} queued operation(s)", n),
            Err(e) => eprintln!("Queue still pending: {}", e),
        }
    }

    Ok(())
}
