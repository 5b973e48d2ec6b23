use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use header_policy::config::load_snapshot;
use header_policy::policy::EffectivePolicy;
use header_policy::routing::RequestTarget;

#[derive(Parser)]
#[command(name = "policy-cli")]
#[command(about = "Validate and inspect security header policies", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "HEADER_POLICY_ADMIN_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file offline and print the headers a path would get
    Validate {
        file: PathBuf,
        #[arg(long, default_value = "/")]
        path: String,
        #[arg(long)]
        host: Option<String>,
    },
    /// Check service status
    Status,
    /// Show the active global policy
    Policy,
    /// List routes and their overrides
    Routes,
    /// Show the effective policy for a request path
    Effective {
        #[arg(long, default_value = "/")]
        path: String,
        #[arg(long)]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut query = Vec::new();
    let endpoint = match cli.command {
        Commands::Validate { file, path, host } => return validate(&file, &path, host.as_deref()),
        Commands::Status => "status",
        Commands::Policy => "policy",
        Commands::Routes => "routes",
        Commands::Effective { path, host } => {
            query.push(("path", path));
            if let Some(host) = host {
                query.push(("host", host));
            }
            "effective"
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = reqwest::Client::new()
        .get(format!("{}/admin/{}", cli.url, endpoint))
        .headers(headers)
        .query(&query)
        .send()
        .await?;
    print_response(res).await
}

fn validate(file: &Path, path: &str, host: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let (_, snapshot) = match load_snapshot(file) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}: {}", file.display(), e);
            std::process::exit(1);
        }
    };

    let (route, policy) = snapshot.effective_for(&RequestTarget::new(host, path));
    println!(
        "{}: OK ({} directives, {} routes)",
        file.display(),
        snapshot.store().len(),
        snapshot.routes().len()
    );
    println!("route: {}", route.map(|r| r.name()).unwrap_or("(global policy)"));
    print_policy(&policy);
    Ok(())
}

fn print_policy(policy: &EffectivePolicy) {
    for directive in policy.iter() {
        let marker = if policy.is_protected(directive.name()) { " (protected)" } else { "" };
        println!("{}: {}{}", directive.name(), directive.value(), marker);
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
