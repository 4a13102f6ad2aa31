use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::Command;

use eyre::{Result, WrapErr, bail};
use log::{debug, info, warn};

use tubetalk::config::Config;
use tubetalk::output::{self, Report, TranscriptStats};
use tubetalk::summarize::{LanguageModelClient, ModelConfig};
use tubetalk::youtube::{HttpCaptionFetcher, TrackSource, VideoMetadata, YtDlp};
use tubetalk::{Transcript, TranscriptAssembler};

mod cli;

use cli::{Cli, OutputFormat};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("tubetalk.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tubetalk")
        .join("logs")
}

fn tool_version(name: &str) -> Option<String> {
    Command::new(name)
        .arg("--version")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| {
            String::from_utf8_lossy(&o.stdout)
                .trim()
                .lines()
                .next()
                .unwrap_or("")
                .to_string()
        })
}

fn build_after_help() -> String {
    let yt_dlp = tool_version("yt-dlp");

    let yt_dlp_line = match &yt_dlp {
        Some(v) => format!("  \x1b[32m✅\x1b[0m yt-dlp     {v}"),
        None => "  \x1b[31m❌\x1b[0m yt-dlp     (not found — needed to list caption tracks)".to_string(),
    };

    let log_path = log_dir().join("tubetalk.log");

    format!(
        "\nREQUIRED TOOLS:\n{yt_dlp_line}\n\nLogs are written to: {}",
        log_path.display()
    )
}

/// Candidate list plus key; summaries were requested, so a missing key is an error
fn model_config(candidate_models: Vec<String>, api_key: Option<String>) -> Result<ModelConfig> {
    let Some(api_key) = api_key else {
        bail!("AI service is unavailable: no API key configured (set api_key in config or the provider's API key env var)");
    };
    Ok(ModelConfig {
        candidate_models,
        api_key,
    })
}

/// Connect once at startup, before any URL is processed
async fn connect_model(cli: &Cli, config: &Config, http: reqwest::Client) -> Result<LanguageModelClient> {
    let candidate_models = if cli.models.is_empty() {
        config.candidate_models()
    } else {
        cli.models.clone()
    };

    let api_key = config.resolve_api_key(&candidate_models);
    let model_config = model_config(candidate_models, api_key)?;
    let client = LanguageModelClient::connect(http, model_config)
        .await
        .wrap_err("AI service is unavailable")?;
    if cli.verbose {
        eprintln!("AI: connected ({})", client.model());
    }
    Ok(client)
}

fn print_transcript_details(transcript: &Transcript, metadata: Option<&VideoMetadata>) {
    if let Some(meta) = metadata {
        eprintln!("Video: {} ({})", meta.title, transcript.video_id);
        eprintln!("Duration: {}", meta.duration_display());
    }
    let stats = TranscriptStats::of(&transcript.text);
    eprintln!(
        "Source: {} {} ({})\nLength: {} chars, {} words, ~{} min read",
        transcript.language,
        transcript.kind,
        transcript.format,
        stats.chars,
        stats.words,
        stats.reading_minutes,
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file: {e}");
        Config::default()
    });

    if cli.verbose {
        let config_path = tubetalk::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    // CLI flags take priority over config
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_config))
        .unwrap_or(OutputFormat::Text);
    let timeout = cli
        .timeout
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.fetch_timeout());
    let download_dir = cli.download_dir.clone().or_else(|| config.download_dir.clone());
    let strict_ids = cli.strict_id || config.strict_video_id.unwrap_or(false);

    let ytdlp = config.ytdlp_path.clone().map(YtDlp::new).unwrap_or_default();
    let assembler = TranscriptAssembler::new(ytdlp, HttpCaptionFetcher::new(timeout)?)
        .with_policy(config.selection_policy(cli.lang.as_deref()))
        .with_strict_ids(strict_ids);

    let model = if cli.summarize {
        Some(connect_model(&cli, &config, reqwest::Client::new()).await?)
    } else {
        None
    };

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };

    if urls.is_empty() {
        bail!("no URL provided\n\nUsage: tubetalk <URL>\n       echo <URL> | tubetalk");
    }

    if let Some(ref path) = cli.output {
        std::fs::File::create(path).wrap_err_with(|| format!("creating {}", path.display()))?;
    }

    let mut failures = 0;
    let mut attempted = 0;

    for url_input in &urls {
        let url_input = url_input.trim();
        if url_input.is_empty() {
            continue;
        }
        attempted += 1;

        if cli.verbose {
            eprintln!("Step 1/3: fetching video transcript...");
        }
        let transcript = match assembler.get_transcript(url_input).await {
            Ok(t) => t,
            Err(e) => {
                eprintln!("❌ {e}");
                failures += 1;
                continue;
            }
        };

        let metadata = if cli.no_metadata {
            None
        } else if let Some(ref meta) = transcript.metadata {
            Some(meta.clone())
        } else {
            match assembler.source().fetch_metadata(url_input).await {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!("Metadata lookup failed for {url_input}: {e:#}");
                    None
                }
            }
        };

        if cli.verbose {
            eprintln!("Step 2/3: transcript fetched successfully");
            print_transcript_details(&transcript, metadata.as_ref());
        }

        let summary = match &model {
            Some(client) => {
                if cli.verbose {
                    eprintln!("Step 3/3: generating AI summary with {}...", client.model());
                }
                match client.summarize(&transcript.text).await {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        eprintln!("❌ Summary generation failed: {e}");
                        failures += 1;
                        None
                    }
                }
            }
            None => None,
        };

        let report = Report::new(&transcript, metadata.as_ref(), summary.as_deref());
        let rendered = match format {
            OutputFormat::Text => output::render_text(&report),
            OutputFormat::Json => output::render_json(&report)?,
        };

        if let Some(ref path) = cli.output {
            output::append_output(path, &rendered)?;
            if cli.verbose {
                eprintln!("Output written to: {}", path.display());
            }
        } else {
            println!("{rendered}");
        }

        if let Some(ref dir) = download_dir {
            let title = metadata
                .as_ref()
                .map(|m| m.title.as_str())
                .unwrap_or(transcript.video_id.as_str());
            let mut downloads = vec![("transcript", transcript.text.as_str())];
            if let Some(ref summary) = summary {
                downloads.push(("summary", summary.as_str()));
            }
            for (prefix, contents) in downloads {
                match output::write_download(dir, prefix, title, contents) {
                    Ok(path) => eprintln!("Saved {prefix}: {}", path.display()),
                    Err(e) => {
                        eprintln!("❌ Could not save {prefix}: {e:#}");
                        failures += 1;
                    }
                }
            }
        }
    }

    debug!("Processed {attempted} URLs with {failures} failures");
    if failures > 0 {
        bail!("{failures} of {attempted} videos could not be fully processed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_model_config_requires_key() {
        let err = model_config(vec!["gemini-2.5-flash".to_string()], None).unwrap_err();
        assert!(err.to_string().contains("no API key configured"));
    }

    #[test]
    fn test_model_config_keeps_candidates() {
        let config = model_config(vec!["gpt-4o".to_string()], Some("key".to_string())).unwrap();
        assert_eq!(config.candidate_models, vec!["gpt-4o"]);
        assert_eq!(config.api_key, "key");
    }

    #[tokio::test]
    async fn test_failed_connection_is_an_error() {
        let cli = Cli::try_parse_from(["tubetalk", "-s", "-m", "gemini-2.5-flash"]).unwrap();
        let config = Config {
            api_key: Some("key".to_string()),
            ..Config::default()
        };
        // Every request goes to a closed local port
        let http = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all("http://127.0.0.1:9").unwrap())
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        let err = connect_model(&cli, &config, http).await.unwrap_err();
        assert!(format!("{err:#}").contains("AI service is unavailable"));
    }
}
