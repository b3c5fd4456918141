mod generate;
mod plan;
mod verify;

pub(crate) use generate::GenerateJsonOutput;
pub(crate) use plan::PlanJsonOutput;
pub(crate) use verify::VerifyJsonOutput;

use crate::config::CorpusConfig;
use crate::request::{GenerationRequest, TierSelector};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "corpus-gen")]
#[command(version)]
#[command(
    about = "Generate large synthetic JSON document corpora for ingestion benchmarks",
    long_about = None
)]
pub struct Cli {
    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// What to generate; shared by `generate` and `plan`
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Content family: generic, logs, ecommerce, news, timeseries
    #[arg(short, long, default_value = "generic")]
    pub family: String,

    /// Tier of the family to generate, or "mixed" for its weighted blend
    #[arg(short = 't', long = "type", default_value = "mixed")]
    pub tier: String,

    /// Number of documents
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub count: u64,

    /// Documents generated per batch [default: 1000]
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Documents between forced flushes [default: batch size]
    #[arg(long)]
    pub flush_interval: Option<usize>,

    /// Seed for reproducible output (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stream tiers in order without materializing the corpus
    #[arg(long)]
    pub streaming: bool,

    /// Counts above this force streaming mode [default: 50000]
    ///
    /// Shuffled mixed corpora at or below the threshold are held in memory in
    /// full before writing, so raising it raises peak memory with the count
    /// (roughly count x average document size). Use --streaming or
    /// --no-shuffle to keep memory bounded by the batch size.
    #[arg(long)]
    pub streaming_threshold: Option<u64>,

    /// Keep mixed corpora in tier order instead of shuffling
    #[arg(long)]
    pub no_shuffle: bool,

    /// YAML config with batch sizes, seed and weight overrides
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl RequestArgs {
    /// Build the request: defaults, then the config file, then flags
    pub fn to_request(&self) -> anyhow::Result<GenerationRequest> {
        let tier: TierSelector = self.tier.parse()?;
        let mut request = GenerationRequest::new(self.family.to_lowercase(), tier, self.count);

        if let Some(path) = &self.config {
            request = CorpusConfig::load(path)?.apply(request);
        }

        if let Some(batch_size) = self.batch_size {
            request.batch_size = batch_size;
        }
        if let Some(flush_interval) = self.flush_interval {
            request.flush_interval = Some(flush_interval);
        }
        if let Some(seed) = self.seed {
            request.seed = Some(seed);
        }
        if let Some(threshold) = self.streaming_threshold {
            request.streaming_threshold = threshold;
        }
        if self.streaming {
            request.streaming = true;
        }
        if self.no_shuffle {
            request.shuffle = false;
        }
        Ok(request)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a corpus
    Generate {
        #[command(flatten)]
        request: RequestArgs,

        /// Output file, or "-" for stdout. Supports .gz, .bz2, .xz, .zst compression
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format: ndjson or json
        #[arg(long, default_value = "ndjson")]
        format: String,

        /// Pretty-print JSON array output
        #[arg(long)]
        pretty: bool,

        /// Stop issuing batches after this many seconds
        #[arg(long)]
        time_limit: Option<f64>,

        /// Show progress during generation
        #[arg(short, long)]
        progress: bool,

        /// Output the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how many documents each tier would get, without generating
    Plan {
        #[command(flatten)]
        request: RequestArgs,

        /// Output the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a generated corpus: every record parses and carries a unique id
    Verify {
        /// Corpus file (supports .gz, .bz2, .xz, .zst compression)
        file: PathBuf,

        /// Input format: ndjson or json (detected from content if omitted)
        #[arg(long)]
        format: Option<String>,

        /// Show progress while reading
        #[arg(short, long)]
        progress: bool,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print JSON Schemas of the --json outputs
    Schema {
        /// One of: generate, plan, verify (all if omitted)
        command: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            request,
            output,
            format,
            pretty,
            time_limit,
            progress,
            json,
        } => generate::run(request, output, format, pretty, time_limit, progress, json),
        Commands::Plan { request, json } => plan::run(request, json),
        Commands::Verify {
            file,
            format,
            progress,
            json,
        } => verify::run(file, format, progress, json),
        Commands::Schema { command } => {
            let output = match command {
                Some(name) => {
                    let schema = crate::json_schema::get_schema(&name).ok_or_else(|| {
                        anyhow::anyhow!(
                            "unknown schema '{}'. Available: {}",
                            name,
                            crate::json_schema::schema_names().join(", ")
                        )
                    })?;
                    serde_json::to_string_pretty(&schema)?
                }
                None => serde_json::to_string_pretty(&crate::json_schema::all_schemas())?,
            };
            println!("{}", output);
            Ok(())
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "corpus-gen", &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "corpus-gen",
            "generate",
            "--family",
            "Logs",
            "--type",
            "access",
            "-n",
            "42",
            "--batch-size",
            "7",
            "--seed",
            "11",
            "--no-shuffle",
        ]);
        let Commands::Generate { request, .. } = cli.command else {
            panic!("expected generate");
        };
        let request = request.to_request().unwrap();
        assert_eq!(request.family, "logs");
        assert_eq!(request.tier, TierSelector::Tier("access".into()));
        assert_eq!(request.total_count, 42);
        assert_eq!(request.batch_size, 7);
        assert_eq!(request.seed, Some(11));
        assert!(!request.shuffle);
    }

    #[test]
    fn test_streaming_threshold_help_states_memory_cost() {
        let mut command = Cli::command();
        let generate = command.find_subcommand_mut("generate").unwrap();
        let arg = generate
            .get_arguments()
            .find(|a| a.get_id() == "streaming_threshold")
            .unwrap();
        let help = arg.get_long_help().unwrap().to_string();
        assert!(help.contains("in memory"));
        assert!(help.contains("--streaming"));
    }

    #[test]
    fn test_flags_override_config() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "batch_size: 300\nseed: 1\nstreaming_threshold: 10").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = parse(&["corpus-gen", "plan", "--config", &path, "--seed", "2"]);
        let Commands::Plan { request, .. } = cli.command else {
            panic!("expected plan");
        };
        let request = request.to_request().unwrap();
        assert_eq!(request.batch_size, 300);
        assert_eq!(request.seed, Some(2));
        assert_eq!(request.streaming_threshold, 10);
    }
}
