use anyhow::{Context, bail};
use clap::Parser;
use dify_stream::source::DEFAULT_CHUNK_SIZE;
use dify_stream::{
    AnswerAccumulator, ByteSource, ChatStream, EventPayload, ReaderSource, StreamConfig,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Decode a captured Dify chat-message stream
#[derive(Parser, Debug)]
#[command(name = "dify-stream", version, about)]
struct Args {
    /// Captured response body; reads stdin when omitted
    file: Option<PathBuf>,

    /// Print each event's JSON envelope instead of the answer text
    #[arg(long)]
    json: bool,

    /// Maximum bytes per read, to replay the body in small fragments
    #[arg(long)]
    chunk_size: Option<usize>,

    /// TOML file with stream settings
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => StreamConfig::from_file(path)?,
        None => StreamConfig::from_env()?,
    };
    config.validate()?;

    let chunk_size = args.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
    if chunk_size == 0 {
        bail!("--chunk-size must be greater than 0");
    }

    let source: Box<dyn ByteSource> = match &args.file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(ReaderSource::with_chunk_size(file, chunk_size))
        }
        None => Box::new(ReaderSource::with_chunk_size(tokio::io::stdin(), chunk_size)),
    };

    let mut stream = ChatStream::with_config(source, &config);
    let result = replay(&mut stream, args.json).await;
    stream.close();

    let stats = stream.stats();
    info!(
        bytes = stats.bytes_read,
        lines = stats.lines,
        events = stats.events,
        keep_alives = stats.keep_alives,
        "Stream finished"
    );

    let answer = result?;
    if let Some(err) = answer.upstream_error() {
        bail!(
            "Service reported error {} {}: {}",
            err.status,
            err.code,
            err.message
        );
    }

    Ok(())
}

async fn replay<S: ByteSource>(
    stream: &mut ChatStream<S>,
    json: bool,
) -> anyhow::Result<AnswerAccumulator> {
    let mut answer = AnswerAccumulator::new();
    let mut stdout = std::io::stdout();

    while let Some(event) = stream.next().await? {
        answer.push(&event);

        if json {
            writeln!(stdout, "{}", event.raw_str())?;
            continue;
        }

        match &event.payload {
            EventPayload::Message(chunk) | EventPayload::AgentMessage(chunk) => {
                write!(stdout, "{}", chunk.answer)?;
                stdout.flush()?;
            }
            EventPayload::MessageReplace(replace) => {
                writeln!(stdout, "\n[answer replaced]\n{}", replace.answer)?;
            }
            EventPayload::AgentThought(thought) => {
                if !thought.thought.is_empty() {
                    eprintln!("[thought {}] {}", thought.position, thought.thought);
                }
                if !thought.tool.is_empty() {
                    eprintln!("[tool {}] {}", thought.tool, thought.tool_input);
                }
            }
            EventPayload::MessageFile(file) => {
                eprintln!("[file {}] {} ({})", file.file_type, file.url, file.belongs_to);
            }
            EventPayload::MessageEnd(end) => {
                writeln!(stdout)?;
                let usage = &end.metadata.usage;
                eprintln!(
                    "[usage] prompt={} completion={} total={} price={} {} latency={:.3}s",
                    usage.prompt_tokens,
                    usage.completion_tokens,
                    usage.total_tokens,
                    usage.total_price,
                    usage.currency,
                    usage.latency
                );
                for resource in &end.metadata.retriever_resources {
                    eprintln!(
                        "[source {}] {} / {} (score {:.3})",
                        resource.position,
                        resource.dataset_name,
                        resource.document_name,
                        resource.score
                    );
                }
            }
            EventPayload::Error(err) => {
                writeln!(stdout)?;
                eprintln!("[error {}] {}: {}", err.status, err.code, err.message);
                break;
            }
            EventPayload::Unknown => {
                warn!(event = %event.event, "Skipping unrecognized event");
            }
        }
    }

    Ok(answer)
}
