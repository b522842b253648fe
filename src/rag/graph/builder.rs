// SPDX-License-Identifier: MIT

//! RAG workflow engine
//!
//! Builds the `retriever → responder` graph, restores per-thread state from
//! the checkpoint store and runs one question through it.

use crate::adk::error::{RagError, Result, WorkflowError};
use crate::rag::answerer::Answerer;
use crate::rag::checkpoint::Checkpointer;
use crate::rag::graph::executor::{CompiledGraph, Node, StateGraph, END};
use crate::rag::nodes::{GenerateNode, RetrieveNode};
use crate::rag::reasoning::ReasoningNode;
use crate::rag::retriever::Retriever;
use crate::rag::state::{ConversationState, StateValues};
use std::sync::Arc;

pub const RETRIEVER_NODE: &str = "retriever";
pub const RESPONDER_NODE: &str = "responder";

/// Implementation bound to the `responder` node
#[derive(Clone)]
pub enum Responder {
    /// One completion over the retrieved context
    Plain(Arc<dyn Answerer>),
    /// Tool-using agent loop
    Reasoning(Arc<ReasoningNode>),
}

impl Responder {
    fn node(&self) -> Arc<dyn Node> {
        match self {
            Responder::Plain(answerer) => Arc::new(GenerateNode::new(answerer.clone())),
            Responder::Reasoning(node) => node.clone(),
        }
    }
}

/// Builds and runs the RAG workflow graph
///
/// Holds the compiled graph; not meant to be shared between concurrent
/// callers.
pub struct GraphBuilder {
    retriever: Arc<dyn Retriever>,
    responder: Responder,
    graph: Option<CompiledGraph>,
}

impl GraphBuilder {
    pub fn new(retriever: Arc<dyn Retriever>, responder: Responder) -> Self {
        Self {
            retriever,
            responder,
            graph: None,
        }
    }

    /// Compile the graph, replacing any previously compiled one
    pub fn build(&mut self, checkpointer: Option<Arc<dyn Checkpointer>>) -> Result<&CompiledGraph> {
        let mut builder = StateGraph::new();
        builder
            .add_node(
                RETRIEVER_NODE,
                Arc::new(RetrieveNode::new(self.retriever.clone())),
            )?
            .add_node(RESPONDER_NODE, self.responder.node())?;
        builder
            .set_entry_point(RETRIEVER_NODE)
            .add_edge(RETRIEVER_NODE, RESPONDER_NODE)
            .add_edge(RESPONDER_NODE, END);

        if self.graph.is_some() {
            log::warn!("Rebuilding workflow graph; the previous compiled graph is dropped");
        }
        let graph = builder.compile(checkpointer)?;
        log::info!(
            "Built workflow graph: {:?}, checkpointing: {}",
            graph.topology(),
            graph.checkpointer().is_some()
        );
        Ok(self.graph.insert(graph))
    }

    pub fn graph(&self) -> Option<&CompiledGraph> {
        self.graph.as_ref()
    }

    /// Build the graph with `checkpointer` on first use
    ///
    /// A different store than the one already bound is refused rather than
    /// silently ignored.
    fn ensure_graph(&mut self, checkpointer: Option<Arc<dyn Checkpointer>>) -> Result<()> {
        let Some(graph) = &self.graph else {
            self.build(checkpointer)?;
            return Ok(());
        };
        if let Some(requested) = &checkpointer {
            let same = graph
                .checkpointer()
                .is_some_and(|bound| same_store(bound, requested));
            if !same {
                return Err(WorkflowError::CheckpointerMismatch.into());
            }
        }
        Ok(())
    }

    /// State a run on `thread_id` starts from: the new question plus the
    /// documents and answer persisted by the previous turn, if any.
    pub async fn initial_state(
        &self,
        question: &str,
        thread_id: Option<&str>,
    ) -> Result<ConversationState> {
        let prior = match (&self.graph, thread_id) {
            (Some(graph), Some(thread_id)) => graph.get_state(thread_id).await?,
            _ => None,
        };
        if prior.is_some() {
            log::debug!("Resuming thread {:?} from checkpoint", thread_id);
        }
        Ok(ConversationState::resume(question, prior.as_ref())
            .with_thread(thread_id.map(str::to_string)))
    }

    /// Run one question through the workflow
    ///
    /// Collaborator failures propagate unchanged and leave the checkpoint
    /// store untouched.
    pub async fn run(
        &mut self,
        question: &str,
        checkpointer: Option<Arc<dyn Checkpointer>>,
        thread_id: Option<&str>,
    ) -> Result<StateValues> {
        self.ensure_graph(checkpointer)?;
        let initial = self.initial_state(question, thread_id).await?;

        let graph = self
            .graph
            .as_ref()
            .ok_or_else(|| RagError::not_initialized("Workflow graph"))?;
        let final_state = graph.invoke(initial, thread_id).await?;
        Ok(final_state.into_values())
    }
}

fn same_store(a: &Arc<dyn Checkpointer>, b: &Arc<dyn Checkpointer>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::model::Content;
    use crate::rag::checkpoint::MemoryCheckpointer;
    use crate::rag::state::Document;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubRetriever {
        docs: Vec<Document>,
        queries: Mutex<Vec<String>>,
    }

    impl StubRetriever {
        fn new(docs: Vec<Document>) -> Self {
            Self {
                docs,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn invoke(&self, query: &str) -> Result<Vec<Document>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.docs.clone())
        }
    }

    struct EchoAnswerer;

    #[async_trait]
    impl Answerer for EchoAnswerer {
        async fn invoke(&self, messages: &[Content]) -> Result<String> {
            let prompt = messages.last().and_then(Content::text).unwrap_or_default();
            let question = prompt.rsplit("Question: ").next().unwrap_or_default();
            Ok(format!("answer to {}", question.trim()))
        }
    }

    struct FailingAnswerer;

    #[async_trait]
    impl Answerer for FailingAnswerer {
        async fn invoke(&self, _messages: &[Content]) -> Result<String> {
            Err(RagError::Generation("model down".to_string()))
        }
    }

    fn plain(docs: Vec<Document>) -> GraphBuilder {
        GraphBuilder::new(
            Arc::new(StubRetriever::new(docs)),
            Responder::Plain(Arc::new(EchoAnswerer)),
        )
    }

    #[tokio::test]
    async fn test_run_without_history() {
        let mut builder = plain(vec![Document::new("C1")]);

        let values = builder
            .run("What is RAG?", None, None)
            .await
            .unwrap();
        assert_eq!(values["question"], "What is RAG?");
        assert_eq!(values["answer"], "answer to What is RAG?");
        assert_eq!(values["retrieved_docs"][0]["content"], "C1");
    }

    #[tokio::test]
    async fn test_build_is_idempotent() {
        let store: Arc<dyn Checkpointer> = Arc::new(MemoryCheckpointer::new());
        let mut builder = plain(vec![Document::new("C1")]);

        let first = builder.build(Some(store.clone())).unwrap().topology();
        let a = builder.run("q", Some(store.clone()), None).await.unwrap();

        let second = builder.build(Some(store.clone())).unwrap().topology();
        let b = builder.run("q", Some(store.clone()), None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                ("retriever".to_string(), "responder".to_string()),
                ("responder".to_string(), END.to_string()),
            ]
        );
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_multi_turn_initial_state_carries_docs() {
        let store: Arc<dyn Checkpointer> = Arc::new(MemoryCheckpointer::new());
        let mut builder = plain(vec![Document::new("d1"), Document::new("d2")]);

        builder.run("Q1", Some(store.clone()), Some("T")).await.unwrap();

        let initial = builder.initial_state("Q2", Some("T")).await.unwrap();
        assert_eq!(initial.question, "Q2");
        assert_eq!(
            initial.retrieved_docs,
            vec![Document::new("d1"), Document::new("d2")]
        );
        assert_eq!(initial.answer, "answer to Q1");
        assert_eq!(initial.thread_id.as_deref(), Some("T"));

        let values = builder.run("Q2", Some(store.clone()), Some("T")).await.unwrap();
        assert_eq!(values["answer"], "answer to Q2");
        assert_eq!(values["thread_id"], "T");

        let fresh = builder.initial_state("Q3", Some("other")).await.unwrap();
        assert!(fresh.retrieved_docs.is_empty());
        assert_eq!(fresh.answer, "");
    }

    #[tokio::test]
    async fn test_failure_propagates_and_persists_nothing() {
        let store = Arc::new(MemoryCheckpointer::new());
        let mut builder = GraphBuilder::new(
            Arc::new(StubRetriever::new(vec![Document::new("C1")])),
            Responder::Plain(Arc::new(FailingAnswerer)),
        );

        let err = builder
            .run("q", Some(store.clone()), Some("T"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
        assert!(store.get("T").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_switching_checkpointer_is_refused() {
        let mut builder = plain(vec![]);
        let first: Arc<dyn Checkpointer> = Arc::new(MemoryCheckpointer::new());
        let second: Arc<dyn Checkpointer> = Arc::new(MemoryCheckpointer::new());

        builder.run("q", Some(first.clone()), Some("T")).await.unwrap();
        // Omitting the store keeps the bound one
        builder.run("q", None, Some("T")).await.unwrap();

        let err = builder
            .run("q", Some(second), Some("T"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::Workflow(WorkflowError::CheckpointerMismatch)
        ));
        assert_eq!(first.get("T").await.unwrap().unwrap().step, 2);
    }

    #[tokio::test]
    async fn test_retriever_sees_question() {
        let retriever = Arc::new(StubRetriever::new(vec![]));
        let mut builder =
            GraphBuilder::new(retriever.clone(), Responder::Plain(Arc::new(EchoAnswerer)));

        builder.run("where?", None, None).await.unwrap();
        assert_eq!(*retriever.queries.lock().unwrap(), vec!["where?".to_string()]);
    }
}
