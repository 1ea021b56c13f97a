//! Switchboard CLI - call gateway services from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use reqwest::StatusCode;

const DEFAULT_URL: &str = "http://127.0.0.1:9527";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Switchboard gateway CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gateway base URL
    #[arg(long, env = "SWITCHBOARD_URL", default_value = DEFAULT_URL)]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a service method
    Call {
        /// Service segment (e.g. `echo` for EchoService)
        service: String,

        method: String,

        /// Argument as key=value; repeatable
        #[arg(short = 'a', long = "arg", value_parser = parse_pair)]
        args: Vec<(String, String)>,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// `<memberId>:<token>`
        #[arg(short, long, env = "SWITCHBOARD_TOKEN")]
        token: Option<String>,

        /// Request body; `@path` reads a file. Implies POST.
        #[arg(short, long)]
        data: Option<String>,

        /// Send as POST even without a body
        #[arg(long)]
        post: bool,
    },

    /// Check that the gateway is up
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Xml,
}

impl Format {
    fn prefix(self) -> &'static str {
        match self {
            Format::Json => "jsonservice",
            Format::Xml => "xmlservice",
        }
    }
}

fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got `{}`", raw)),
    }
}

/// `<base>/<prefix>/<service>/<method>`, plus percent-encoded `/k/v` pairs when given
fn call_url(base: &str, format: Format, service: &str, method: &str, path_args: &[(String, String)]) -> String {
    let mut url = format!(
        "{}/{}/{}/{}",
        base.trim_end_matches('/'),
        format.prefix(),
        service,
        method
    );
    for (key, value) in path_args {
        url.push('/');
        url.push_str(&urlencoding::encode(key));
        url.push('/');
        url.push_str(&urlencoding::encode(value));
    }
    url
}

fn read_body(data: &str) -> Result<Vec<u8>> {
    match data.strip_prefix('@') {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read {}", path)),
        None => Ok(data.as_bytes().to_vec()),
    }
}

fn print_response(status: StatusCode, body: &str) {
    let label = format!("{}", status);
    if status.is_success() {
        println!("{}", label.green().bold());
    } else {
        println!("{}", label.red().bold());
    }

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => println!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| body.to_string())
        ),
        Err(_) => println!("{}", body),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Call {
            service,
            method,
            args,
            format,
            token,
            data,
            post,
        } => {
            let is_post = post || data.is_some();

            // POST ignores the query string: arguments travel as form fields,
            // or as path pairs when the body is taken by --data
            let request = match (is_post, data) {
                (false, _) => client
                    .get(call_url(&cli.url, format, &service, &method, &[]))
                    .query(&args),
                (true, Some(data)) => client
                    .post(call_url(&cli.url, format, &service, &method, &args))
                    .body(read_body(&data)?),
                (true, None) => client
                    .post(call_url(&cli.url, format, &service, &method, &[]))
                    .form(&args),
            };
            let request = match token {
                Some(token) => request.header(AUTH_TOKEN_HEADER, token),
                None => request,
            };

            let response = request
                .send()
                .await
                .context("Failed to connect to gateway")?;
            let status = response.status();
            let body = response.text().await.context("Failed to read response")?;

            print_response(status, &body);
            if !status.is_success() {
                std::process::exit(1);
            }
        }

        Commands::Health => {
            println!("{}", "Gateway Status".cyan().bold());
            println!();
            println!("  {} {}", "URL:".bold(), cli.url);

            let url = format!("{}/health", cli.url.trim_end_matches('/'));
            match client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                }
                Ok(response) => {
                    println!("  {} {}", "Status:".bold(), response.status().to_string().yellow());
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
