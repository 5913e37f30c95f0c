//! Command-line front end for the research toolkit.

mod output;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::StreamExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use llm_client::{ModelConfig, OpenAiClient};
use research_toolkit::{
    crawl_and_summarize, search_and_format, social_media_search, Platform,
};
use tavily_client::{
    CrawlRequest, PollOptions, ResearchEvent, ResearchRequest, SearchRequest, TavilyClient,
};
use xai_client::XaiClient;

#[derive(Parser)]
#[command(name = "research")]
#[command(about = "Web research from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a deep research task and save the report
    Research {
        /// Topic or question to research
        #[arg(long)]
        topic: String,

        /// Output directory (default: ./research/<topic>-<timestamp>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seconds between status polls
        #[arg(long, default_value_t = 5)]
        poll_interval: u64,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 300)]
        max_wait: u64,

        /// Print the report without writing files
        #[arg(long)]
        no_save: bool,

        /// Stream the report as it is generated instead of polling
        #[arg(long)]
        stream: bool,
    },

    /// Search one or more queries with URL deduplication
    Search {
        /// Query; repeat for parallel deduplicated searches
        #[arg(long, required = true)]
        query: Vec<String>,

        /// Max results per query
        #[arg(short, long, default_value_t = 10)]
        limit: u32,

        /// Restrict to the last N days
        #[arg(long)]
        days: Option<u32>,

        /// Save the formatted results here instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Crawl a site and summarize what was found
    Crawl {
        /// Root URL to crawl
        #[arg(long)]
        url: String,

        /// Link depth from the root
        #[arg(short, long, default_value_t = 2)]
        depth: u32,

        /// Links followed per page
        #[arg(short, long, default_value_t = 20)]
        breadth: u32,

        /// Total page budget
        #[arg(short, long, default_value_t = 30)]
        limit: u32,

        /// Natural-language guidance for which pages matter
        #[arg(short, long)]
        instruction: Option<String>,

        /// Save the summary here instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search social media platforms
    Social {
        /// What to look for
        #[arg(long)]
        query: String,

        /// tiktok, facebook, instagram, reddit, linkedin, x, or combined
        #[arg(long, default_value = "combined")]
        platform: String,

        /// Also pull full post content for each result
        #[arg(long)]
        raw: bool,
    },

    /// Summarize recent X posts via Live Search
    XTrends {
        /// Restrict to these X handles
        #[arg(long)]
        handles: Vec<String>,

        /// Look back this many days
        #[arg(long, default_value_t = 20)]
        days: i64,

        /// Skip posts with fewer favorites
        #[arg(long, default_value_t = 100)]
        min_favorites: u32,

        /// Save the summary here instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,research_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Research {
            topic,
            output,
            poll_interval,
            max_wait,
            no_save,
            stream,
        } => cmd_research(topic, output, poll_interval, max_wait, no_save, stream).await,
        Commands::Search {
            query,
            limit,
            days,
            output,
        } => cmd_search(query, limit, days, output).await,
        Commands::Crawl {
            url,
            depth,
            breadth,
            limit,
            instruction,
            output,
        } => cmd_crawl(url, depth, breadth, limit, instruction, output).await,
        Commands::Social {
            query,
            platform,
            raw,
        } => cmd_social(query, platform, raw).await,
        Commands::XTrends {
            handles,
            days,
            min_favorites,
            output,
        } => cmd_x_trends(handles, days, min_favorites, output).await,
    }
}

fn tavily() -> Result<TavilyClient> {
    TavilyClient::from_env().context("Set TAVILY_API_KEY (or put it in .env)")
}

fn openai() -> Result<OpenAiClient> {
    OpenAiClient::from_env().context("Set OPENAI_API_KEY (or put it in .env)")
}

async fn cmd_research(
    topic: String,
    output: Option<PathBuf>,
    poll_interval: u64,
    max_wait: u64,
    no_save: bool,
    stream: bool,
) -> Result<()> {
    let client = tavily()?;
    let request = ResearchRequest::new(&topic);

    let report = if stream {
        println!("{}", "Streaming research...".bright_cyan());
        let mut events = client.research_stream(&request).await?;
        let mut collected = String::new();
        let mut sources = Vec::new();
        while let Some(event) = events.next().await {
            match event? {
                ResearchEvent::Content(text) => {
                    print!("{text}");
                    std::io::stdout().flush().ok();
                    collected.push_str(&text);
                }
                ResearchEvent::StructuredContent(value) => {
                    collected = serde_json::to_string_pretty(&value)?;
                }
                ResearchEvent::Sources(batch) => sources.extend(batch),
                ResearchEvent::ToolCall { name, queries, .. } => {
                    let detail = if queries.is_empty() {
                        String::new()
                    } else {
                        format!(": {}", queries.join(", "))
                    };
                    eprintln!("{}", format!("[{name}{detail}]").dimmed());
                }
                ResearchEvent::ToolResponse {
                    name, source_count, ..
                } => {
                    eprintln!("{}", format!("[{name} -> {source_count} sources]").dimmed());
                }
                ResearchEvent::Done => break,
            }
        }
        println!();
        tavily_client::ResearchReport {
            request_id: String::new(),
            content: collected,
            sources,
            response_time: None,
        }
    } else {
        let handle = client.research(&request).await?;
        println!(
            "{} {}",
            "Submitted research task".bright_cyan(),
            handle.request_id.dimmed()
        );
        let options = PollOptions {
            poll_interval: Duration::from_secs(poll_interval),
            max_wait: Duration::from_secs(max_wait),
        };
        client.wait_for_research(&handle.request_id, options).await?
    };

    if no_save {
        if !stream {
            println!("{}", report.content);
        }
    } else {
        let dir = output::output_dir(output.as_deref(), &topic);
        output::save_report(&dir, &report.content, &report.sources)?;
        println!(
            "{} {} ({} sources)",
            "Saved to".bright_green(),
            dir.display(),
            report.sources.len()
        );
    }
    Ok(())
}

async fn cmd_search(
    queries: Vec<String>,
    limit: u32,
    days: Option<u32>,
    output: Option<PathBuf>,
) -> Result<()> {
    let client = tavily()?;
    let mut params = SearchRequest::new("").max_results(limit);
    if let Some(days) = days {
        params = params.days(days);
    }

    let result = search_and_format(&client, &queries, &params, None).await?;

    for failure in &result.failures {
        eprintln!(
            "{} {}: {}",
            "Query failed".bright_red(),
            failure.query,
            failure.error
        );
    }

    match output {
        Some(dir) => {
            let path = output::save_text(&dir, "results.md", &result.formatted)?;
            println!(
                "{} {} ({} results)",
                "Saved to".bright_green(),
                path.display(),
                result.results.len()
            );
        }
        None => println!("{}", result.formatted),
    }
    Ok(())
}

async fn cmd_crawl(
    url: String,
    depth: u32,
    breadth: u32,
    limit: u32,
    instruction: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let client = tavily()?;
    let backend = openai()?;
    let model_config = ModelConfig::new("gpt-4o-mini").fallback("gpt-4o");

    let mut request = CrawlRequest::new(&url)
        .max_depth(depth)
        .max_breadth(breadth)
        .limit(limit);
    if let Some(instruction) = instruction {
        request = request.instructions(instruction);
    }

    println!("{} {url}", "Crawling".bright_cyan());
    let summary = crawl_and_summarize(&client, &backend, &request, &model_config).await?;

    match output {
        Some(dir) => {
            let path = output::save_text(&dir, "summary.md", &summary.summary)?;
            println!(
                "{} {} ({} pages, model {})",
                "Saved to".bright_green(),
                path.display(),
                summary.page_urls.len(),
                summary.model
            );
        }
        None => {
            println!("{}", summary.summary);
            eprintln!(
                "{}",
                format!("[{} pages, model {}]", summary.page_urls.len(), summary.model).dimmed()
            );
        }
    }
    Ok(())
}

async fn cmd_social(query: String, platform: String, raw: bool) -> Result<()> {
    let client = tavily()?;
    let platform: Platform = platform.parse()?;
    let params = SearchRequest::new("").max_results(10);

    let result = social_media_search(&client, &client, &query, platform, raw, &params).await?;

    if let Some(error) = &result.extract_error {
        eprintln!("{} {error}", "Content extraction failed:".bright_yellow());
    }
    for item in &result.results {
        println!("{}", item.title.bright_white().bold());
        println!("  {}", item.url.dimmed());
        println!("  {}", item.content);
        if let Some(raw_content) = &item.raw_content {
            let preview: String = raw_content.chars().take(500).collect();
            println!("  {}", preview.dimmed());
        }
        println!();
    }
    println!(
        "{}",
        format!("{} results from {platform}", result.results.len()).bright_green()
    );
    Ok(())
}

async fn cmd_x_trends(
    handles: Vec<String>,
    days: i64,
    min_favorites: u32,
    output: Option<PathBuf>,
) -> Result<()> {
    let client = XaiClient::from_env().context("Set XAI_API_KEY (or put it in .env)")?;

    let prompt = if handles.is_empty() {
        "What topics are trending on X right now? Summarize the notable conversations.".to_string()
    } else {
        format!(
            "Summarize what these accounts have been posting about recently: {}",
            handles.join(", ")
        )
    };

    let response = client
        .search_x_posts(&prompt, &handles, days, Some(min_favorites))
        .await?;

    let mut body = response.content.clone();
    if !response.citations.is_empty() {
        body.push_str("\n\nCited posts:\n");
        for url in &response.citations {
            body.push_str(&format!("- {url}\n"));
        }
    }

    match output {
        Some(dir) => {
            let path = output::save_text(&dir, "x-trends.md", &body)?;
            println!("{} {}", "Saved to".bright_green(), path.display());
        }
        None => println!("{body}"),
    }
    Ok(())
}
