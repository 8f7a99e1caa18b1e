use clap::{Parser, Subcommand};
use serde_json::Value;
use url::Url;

#[derive(Parser)]
#[command(name = "spec-cli")]
#[command(
    about = "Inspect the OpenAPI document served by a running application",
    long_about = None
)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Path the JSON document is served on
    #[arg(short, long, default_value = "/api/openapi.json")]
    json_path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full document
    Spec,
    /// List documented operations
    Routes,
    /// Check that the documentation viewers respond
    Docs {
        #[arg(long, default_value = "/docs")]
        scalar: String,
        #[arg(long, default_value = "/redocly")]
        redocly: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = Url::parse(&cli.url)?;

    match cli.command {
        Commands::Spec => {
            let res = client.get(base.join(&cli.json_path)?).send().await?;
            if let Some(doc) = read_json(res).await? {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            }
        }
        Commands::Routes => {
            let res = client.get(base.join(&cli.json_path)?).send().await?;
            if let Some(doc) = read_json(res).await? {
                for (method, path, operation_id) in operations(&doc) {
                    println!("{:<8} {:<40} {}", method, path, operation_id.unwrap_or("-"));
                }
            }
        }
        Commands::Docs { scalar, redocly } => {
            for (name, path) in [("scalar", scalar), ("redocly", redocly)] {
                let res = client.get(base.join(&path)?).send().await?;
                println!("{:<8} {:<20} {}", name, path, res.status());
            }
        }
    }

    Ok(())
}

async fn read_json(res: reqwest::Response) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: document request returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(None);
    }
    Ok(Some(res.json().await?))
}

/// `(METHOD, path, operationId)` for every operation, sorted by path.
fn operations(doc: &Value) -> Vec<(String, &str, Option<&str>)> {
    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };
    paths
        .iter()
        .flat_map(|(path, item)| {
            item.as_object()
                .into_iter()
                .flatten()
                .map(move |(method, op)| {
                    (
                        method.to_uppercase(),
                        path.as_str(),
                        op.get("operationId").and_then(Value::as_str),
                    )
                })
        })
        .collect()
}
