use std::path::PathBuf;

use clap::{Parser, Subcommand};
use job_match::{DataSource, InMemorySource, PipelineConfig, Recommender, TrainingPipeline};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Train and query the user/job compatibility scorer
#[derive(Parser, Debug)]
#[command(name = "job-match")]
#[command(about = "TF-IDF job recommendation pipeline", long_about = None)]
struct Args {
    /// Pipeline config (JSON); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record dump (JSON with users, cvs, jobs, applies)
    #[arg(short, long)]
    data: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the term index, train, and overwrite the model artifact
    Train,
    /// Rank jobs for a user with the persisted index and model
    Recommend {
        #[arg(short, long)]
        user: String,
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    let source = InMemorySource::from_json_file(&args.data)?;

    match args.command {
        Command::Train => {
            let pipeline = TrainingPipeline::new(config, source)?;
            let location = pipeline.train()?;
            info!(
                path = %location.path.display(),
                vocab = location.vocab_size,
                positives = location.stats.positives,
                negatives = location.stats.negatives,
                "model written"
            );
            println!("{}", location.path.display());
        }
        Command::Recommend { user, top } => {
            let recommender =
                Recommender::open(&config.index_dir, &config.model_path, config.cv_policy)?;
            let cvs = source.find_cvs_by_user_id(&user)?;
            let jobs = source.list_jobs()?;
            let hits = recommender.recommend(&user, &cvs, &jobs, Some(top))?;
            for (job_id, score) in &hits.list {
                println!("{}\t{:.6}", job_id, score);
            }
        }
    }
    Ok(())
}
