// SPDX-License-Identifier: MIT

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use ragweave::adk::model::openai::OpenAIModel;
use ragweave::adk::model::{GenerationConfig, Model};
use ragweave::config::RagConfig;
use ragweave::ingest::DocumentProcessor;
use ragweave::rag::answerer::ModelAnswerer;
use ragweave::rag::checkpoint::{Checkpointer, FileCheckpointer, MemoryCheckpointer};
use ragweave::rag::reasoning::ReasoningNode;
use ragweave::rag::state::StateValues;
use ragweave::rag::tools::WikipediaTool;
use ragweave::rag::{GraphBuilder, Responder};
use ragweave::vector_store::{OpenAIEmbeddings, VectorStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a single question
    Ask {
        /// URL, .txt file, .pdf file or directory of PDFs (repeatable)
        #[arg(short, long, required = true)]
        source: Vec<String>,

        /// The question to answer
        #[arg(short, long)]
        question: String,

        /// Conversation thread to resume and checkpoint
        #[arg(short, long)]
        thread: Option<String>,

        /// Answer with the tool-using agent instead of a single completion
        #[arg(long)]
        agent: bool,
    },
    /// Read questions from stdin, one per line, on a single thread
    Chat {
        /// URL, .txt file, .pdf file or directory of PDFs (repeatable)
        #[arg(short, long, required = true)]
        source: Vec<String>,

        /// Thread id; a new one is generated when omitted
        #[arg(short, long)]
        thread: Option<String>,

        #[arg(long)]
        agent: bool,
    },
}

struct Session {
    builder: GraphBuilder,
    checkpointer: Arc<dyn Checkpointer>,
}

impl Session {
    async fn ask(&mut self, question: &str, thread: Option<&str>) -> anyhow::Result<String> {
        let values = self
            .builder
            .run(question, Some(self.checkpointer.clone()), thread)
            .await?;
        Ok(answer_of(&values))
    }
}

fn answer_of(values: &StateValues) -> String {
    values
        .get("answer")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

async fn setup(config: &RagConfig, sources: &[String], agent: bool) -> anyhow::Result<Session> {
    let processor = DocumentProcessor::new(config.ingest.chunk_size, config.ingest.chunk_overlap);
    let chunks = processor
        .process(sources)
        .await
        .context("failed to ingest sources")?;

    let embedder = Arc::new(OpenAIEmbeddings::new(config.embedding.model.clone())?);
    let mut store = VectorStore::new(embedder);
    let retriever = Arc::new(
        store
            .create_retriever(chunks, config.retrieval.top_k)
            .await
            .context("failed to build the vector index")?,
    );

    let generation = GenerationConfig {
        temperature: config.model.temperature,
        ..Default::default()
    };
    let model: Arc<dyn Model> = Arc::new(
        OpenAIModel::new(config.model.name.clone())?.with_generation_config(generation),
    );
    log::info!("Using model: {}", config.model.name);

    let responder = if agent {
        let knowledge = Arc::new(WikipediaTool::new(
            &config.knowledge.lang,
            config.knowledge.top_k_results,
        ));
        Responder::Reasoning(Arc::new(
            ReasoningNode::new(retriever.clone(), model, knowledge)
                .with_strategy(config.agent.strategy, config.agent.max_iterations),
        ))
    } else {
        Responder::Plain(Arc::new(ModelAnswerer::new(model)))
    };

    let checkpointer: Arc<dyn Checkpointer> = match &config.checkpoint.dir {
        Some(dir) => {
            log::info!("Persisting checkpoints under {}", dir.display());
            Arc::new(FileCheckpointer::new(dir))
        }
        None => Arc::new(MemoryCheckpointer::new()),
    };

    let mut builder = GraphBuilder::new(retriever, responder);
    builder.build(Some(checkpointer.clone()))?;
    Ok(Session {
        builder,
        checkpointer,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = RagConfig::load(args.config.as_deref()).context("invalid configuration")?;

    match args.command {
        Commands::Ask {
            source,
            question,
            thread,
            agent,
        } => {
            let mut session = setup(&config, &source, agent).await?;
            let answer = session.ask(&question, thread.as_deref()).await?;
            println!("{}", answer);
        }
        Commands::Chat {
            source,
            thread,
            agent,
        } => {
            let mut session = setup(&config, &source, agent).await?;
            let thread = thread.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            eprintln!("Thread: {} (empty line or 'exit' to quit)", thread);

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let question = line.trim();
                if question.is_empty() || question.eq_ignore_ascii_case("exit") {
                    break;
                }
                match session.ask(question, Some(&thread)).await {
                    Ok(answer) => println!("{}\n", answer),
                    Err(e) => {
                        log::error!("Question failed: {:#}", e);
                        eprintln!("Error: {:#}", e);
                    }
                }
            }
        }
    }

    Ok(())
}
