use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_config(name: &str) -> Option<Self> {
        <Self as clap::ValueEnum>::from_str(name, true).ok()
    }
}

#[derive(Parser)]
#[command(
    name = "tubetalk",
    about = "Fetch YouTube captions and summarize them with an LLM",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL (reads one per line from stdin if omitted)
    pub url: Option<String>,

    /// Summarize the transcript via LLM
    #[arg(short, long)]
    pub summarize: bool,

    /// Output format: text (default), json
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Preferred caption language [default: en]
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save transcript and summary as text files named after the video title
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,

    /// Candidate LLM model, tried in order (repeatable)
    #[arg(short, long = "model")]
    pub models: Vec<String>,

    /// Caption fetch timeout in seconds [default: 10]
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Reject video IDs that are not 11 characters of [A-Za-z0-9_-]
    #[arg(long)]
    pub strict_id: bool,

    /// Skip the title/duration lookup
    #[arg(long)]
    pub no_metadata: bool,

    /// Show track selection and metadata
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "tubetalk",
            "https://youtu.be/dQw4w9WgXcQ",
            "-s",
            "-f",
            "json",
            "-m",
            "gemini-2.5-pro",
            "-m",
            "gpt-4o",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://youtu.be/dQw4w9WgXcQ"));
        assert!(cli.summarize);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.models, vec!["gemini-2.5-pro", "gpt-4o"]);
        assert_eq!(cli.timeout, Some(5));
        assert!(!cli.strict_id);
    }

    #[test]
    fn test_output_format_from_config() {
        assert_eq!(OutputFormat::from_config("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_config("srt"), None);
    }
}
