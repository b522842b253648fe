// SPDX-License-Identifier: MIT

//! State graph construction and execution
//!
//! A [`StateGraph`] is a set of named nodes plus one outgoing edge per node.
//! Edges are either direct or conditional (a router picks the next node from
//! the state), and [`END`] terminates the run. Nodes execute one at a time;
//! each receives the previous node's output state.

use crate::adk::error::{Result, WorkflowError};
use crate::rag::checkpoint::{Checkpoint, Checkpointer};
use crate::rag::state::ConversationState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Terminal pseudo-node
pub const END: &str = "__end__";

/// Safety limit on node visits per run
const MAX_STEPS: usize = 25;

/// A workflow step: one state in, a new state out
#[async_trait]
pub trait Node: Send + Sync {
    async fn call(&self, state: &ConversationState) -> Result<ConversationState>;
}

/// Picks the next node name (or [`END`]) from a node's output state
pub type Router = Arc<dyn Fn(&ConversationState) -> String + Send + Sync>;

/// Outgoing edge of a node
#[derive(Clone)]
pub enum Edge {
    Direct(String),
    Conditional(Router),
}

impl std::fmt::Debug for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edge::Direct(to) => write!(f, "Direct({})", to),
            Edge::Conditional(_) => write!(f, "Conditional(..)"),
        }
    }
}

/// Mutable graph definition, turned into a [`CompiledGraph`] by `compile`
#[derive(Default)]
pub struct StateGraph {
    nodes: HashMap<String, Arc<dyn Node>>,
    /// Insertion order, for deterministic topology listings
    order: Vec<String>,
    edges: HashMap<String, Edge>,
    entry: Option<String>,
}

impl StateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        node: Arc<dyn Node>,
    ) -> Result<&mut Self, WorkflowError> {
        let name = name.into();
        if name == END || self.nodes.contains_key(&name) {
            return Err(WorkflowError::DuplicateNode(name));
        }
        self.order.push(name.clone());
        self.nodes.insert(name, node);
        Ok(self)
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry = Some(name.into());
        self
    }

    /// Unconditional transition; `to` may be [`END`]
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.insert(from.into(), Edge::Direct(to.into()));
        self
    }

    /// Transition chosen at runtime by `router`
    pub fn add_conditional_edges<F>(&mut self, from: impl Into<String>, router: F) -> &mut Self
    where
        F: Fn(&ConversationState) -> String + Send + Sync + 'static,
    {
        self.edges
            .insert(from.into(), Edge::Conditional(Arc::new(router)));
        self
    }

    /// Validate the definition and bind an optional checkpoint store
    pub fn compile(
        self,
        checkpointer: Option<Arc<dyn Checkpointer>>,
    ) -> Result<CompiledGraph, WorkflowError> {
        let entry = self.entry.ok_or(WorkflowError::MissingEntryPoint)?;
        if !self.nodes.contains_key(&entry) {
            return Err(WorkflowError::UnknownNode(entry));
        }

        for from in self.edges.keys() {
            if !self.nodes.contains_key(from) {
                return Err(WorkflowError::UnknownNode(from.clone()));
            }
        }

        for name in &self.order {
            match self.edges.get(name) {
                None => return Err(WorkflowError::MissingEdge(name.clone())),
                Some(Edge::Direct(to)) if to != END && !self.nodes.contains_key(to) => {
                    return Err(WorkflowError::UnknownNode(to.clone()));
                }
                Some(_) => {}
            }
        }

        log::debug!(
            "Compiled graph with {} nodes, entry '{}', checkpointer: {}",
            self.order.len(),
            entry,
            checkpointer.is_some()
        );

        Ok(CompiledGraph {
            nodes: self.nodes,
            order: self.order,
            edges: self.edges,
            entry,
            checkpointer,
        })
    }
}

/// Executable graph
pub struct CompiledGraph {
    nodes: HashMap<String, Arc<dyn Node>>,
    order: Vec<String>,
    edges: HashMap<String, Edge>,
    entry: String,
    checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl CompiledGraph {
    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer>> {
        self.checkpointer.as_ref()
    }

    pub fn entry_point(&self) -> &str {
        &self.entry
    }

    /// `(from, to)` pairs in node insertion order; conditional edges show `?`
    pub fn topology(&self) -> Vec<(String, String)> {
        self.order
            .iter()
            .filter_map(|from| {
                self.edges.get(from).map(|edge| {
                    let to = match edge {
                        Edge::Direct(to) => to.clone(),
                        Edge::Conditional(_) => "?".to_string(),
                    };
                    (from.clone(), to)
                })
            })
            .collect()
    }

    /// Last persisted state for `thread_id`; `None` without a checkpointer
    pub async fn get_state(&self, thread_id: &str) -> Result<Option<ConversationState>> {
        match &self.checkpointer {
            Some(cp) => cp.get_state(thread_id).await,
            None => Ok(None),
        }
    }

    /// Run from the entry point to [`END`]
    ///
    /// Node failures propagate unchanged. The final state is persisted under
    /// `thread_id` only after the whole path completed.
    pub async fn invoke(
        &self,
        state: ConversationState,
        thread_id: Option<&str>,
    ) -> Result<ConversationState> {
        let mut state = state;
        let mut current = self.entry.clone();

        for step in 1..=MAX_STEPS {
            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| WorkflowError::UnknownNode(current.clone()))?;

            log::info!("Executing node: {} (step {})", current, step);
            state = match node.call(&state).await {
                Ok(next) => next,
                Err(e) => {
                    log::error!("Node {} failed: {}", current, e);
                    return Err(e);
                }
            };

            let next = match self.edges.get(&current) {
                Some(Edge::Direct(to)) => to.clone(),
                Some(Edge::Conditional(router)) => router(&state),
                None => return Err(WorkflowError::MissingEdge(current).into()),
            };
            log::debug!("Node {} completed, next: {}", current, next);

            if next == END {
                self.persist(&state, thread_id).await?;
                return Ok(state);
            }
            current = next;
        }

        log::error!("Graph execution exceeded {} steps", MAX_STEPS);
        Err(WorkflowError::StepLimit(MAX_STEPS).into())
    }

    async fn persist(&self, state: &ConversationState, thread_id: Option<&str>) -> Result<()> {
        let (Some(cp), Some(thread_id)) = (&self.checkpointer, thread_id) else {
            return Ok(());
        };
        let previous = cp.get(thread_id).await?;
        let checkpoint = Checkpoint::next(thread_id, state.clone(), previous.as_ref());
        log::debug!(
            "Persisting thread '{}' at step {}",
            thread_id,
            checkpoint.step
        );
        cp.put(checkpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::RagError;
    use crate::rag::checkpoint::MemoryCheckpointer;
    use std::sync::Mutex;

    /// Appends a marker to the answer so the visit order is observable
    struct MarkNode(&'static str);

    #[async_trait]
    impl Node for MarkNode {
        async fn call(&self, state: &ConversationState) -> Result<ConversationState> {
            Ok(state.with_answer(format!("{}{}", state.answer, self.0)))
        }
    }

    struct FailNode;

    #[async_trait]
    impl Node for FailNode {
        async fn call(&self, _state: &ConversationState) -> Result<ConversationState> {
            Err(RagError::Generation("boom".to_string()))
        }
    }

    /// Records the input state it saw
    struct CaptureNode(Mutex<Vec<ConversationState>>);

    #[async_trait]
    impl Node for CaptureNode {
        async fn call(&self, state: &ConversationState) -> Result<ConversationState> {
            self.0.lock().unwrap().push(state.clone());
            Ok(state.clone())
        }
    }

    fn linear(a: Arc<dyn Node>, b: Arc<dyn Node>) -> StateGraph {
        let mut graph = StateGraph::new();
        graph.add_node("a", a).unwrap();
        graph.add_node("b", b).unwrap();
        graph.set_entry_point("a").add_edge("a", "b").add_edge("b", END);
        graph
    }

    #[tokio::test]
    async fn test_linear_execution_order() {
        let graph = linear(Arc::new(MarkNode("A")), Arc::new(MarkNode("B")))
            .compile(None)
            .unwrap();

        let out = graph
            .invoke(ConversationState::new("q"), None)
            .await
            .unwrap();
        assert_eq!(out.answer, "AB");
        assert_eq!(out.question, "q");
    }

    #[tokio::test]
    async fn test_second_node_sees_first_output() {
        let capture = Arc::new(CaptureNode(Mutex::new(Vec::new())));
        let graph = linear(Arc::new(MarkNode("A")), capture.clone())
            .compile(None)
            .unwrap();

        graph
            .invoke(ConversationState::new("q"), None)
            .await
            .unwrap();
        assert_eq!(capture.0.lock().unwrap()[0].answer, "A");
    }

    #[tokio::test]
    async fn test_conditional_edge() {
        let mut graph = StateGraph::new();
        graph.add_node("start", Arc::new(MarkNode("S"))).unwrap();
        graph.add_node("yes", Arc::new(MarkNode("Y"))).unwrap();
        graph.add_node("no", Arc::new(MarkNode("N"))).unwrap();
        graph
            .set_entry_point("start")
            .add_conditional_edges("start", |s: &ConversationState| {
                if s.question.ends_with('?') {
                    "yes".to_string()
                } else {
                    "no".to_string()
                }
            })
            .add_edge("yes", END)
            .add_edge("no", END);
        let graph = graph.compile(None).unwrap();

        let out = graph
            .invoke(ConversationState::new("why?"), None)
            .await
            .unwrap();
        assert_eq!(out.answer, "SY");

        let out = graph
            .invoke(ConversationState::new("because"), None)
            .await
            .unwrap();
        assert_eq!(out.answer, "SN");
        assert_eq!(graph.topology()[0], ("start".to_string(), "?".to_string()));
    }

    #[tokio::test]
    async fn test_router_to_unknown_node_fails() {
        let mut graph = StateGraph::new();
        graph.add_node("a", Arc::new(MarkNode("A"))).unwrap();
        graph
            .set_entry_point("a")
            .add_conditional_edges("a", |_: &ConversationState| "ghost".to_string());
        let graph = graph.compile(None).unwrap();

        let err = graph
            .invoke(ConversationState::new("q"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::Workflow(WorkflowError::UnknownNode(ref n)) if n == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_cycle_hits_step_limit() {
        let mut graph = StateGraph::new();
        graph.add_node("a", Arc::new(MarkNode(""))).unwrap();
        graph.set_entry_point("a").add_edge("a", "a");
        let graph = graph.compile(None).unwrap();

        let err = graph
            .invoke(ConversationState::new("q"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::Workflow(WorkflowError::StepLimit(MAX_STEPS))
        ));
    }

    #[test]
    fn test_compile_validation() {
        let graph = StateGraph::new();
        assert_eq!(
            graph.compile(None).err(),
            Some(WorkflowError::MissingEntryPoint)
        );

        let mut graph = StateGraph::new();
        graph.add_node("a", Arc::new(MarkNode("A"))).unwrap();
        graph.set_entry_point("a");
        assert_eq!(
            graph.compile(None).err(),
            Some(WorkflowError::MissingEdge("a".to_string()))
        );

        let mut graph = StateGraph::new();
        graph.add_node("a", Arc::new(MarkNode("A"))).unwrap();
        graph.set_entry_point("a").add_edge("a", "b");
        assert_eq!(
            graph.compile(None).err(),
            Some(WorkflowError::UnknownNode("b".to_string()))
        );

        let mut graph = StateGraph::new();
        graph.add_node("a", Arc::new(MarkNode("A"))).unwrap();
        graph.set_entry_point("z").add_edge("a", END);
        assert_eq!(
            graph.compile(None).err(),
            Some(WorkflowError::UnknownNode("z".to_string()))
        );
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut graph = StateGraph::new();
        graph.add_node("a", Arc::new(MarkNode("A"))).unwrap();
        let err = graph.add_node("a", Arc::new(MarkNode("A"))).err();
        assert_eq!(err, Some(WorkflowError::DuplicateNode("a".to_string())));
        let err = graph.add_node(END, Arc::new(MarkNode("A"))).err();
        assert_eq!(err, Some(WorkflowError::DuplicateNode(END.to_string())));
    }

    #[tokio::test]
    async fn test_persists_only_after_success() {
        let store = Arc::new(MemoryCheckpointer::new());

        let failing = linear(Arc::new(MarkNode("A")), Arc::new(FailNode))
            .compile(Some(store.clone()))
            .unwrap();
        let err = failing
            .invoke(ConversationState::new("q"), Some("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
        assert!(store.is_empty().await);

        let ok = linear(Arc::new(MarkNode("A")), Arc::new(MarkNode("B")))
            .compile(Some(store.clone()))
            .unwrap();
        ok.invoke(ConversationState::new("q"), Some("t"))
            .await
            .unwrap();
        ok.invoke(ConversationState::new("q2"), Some("t"))
            .await
            .unwrap();

        let checkpoint = store.get("t").await.unwrap().unwrap();
        assert_eq!(checkpoint.step, 2);
        assert_eq!(checkpoint.values.question, "q2");
        assert_eq!(
            ok.get_state("t").await.unwrap().unwrap().question,
            "q2"
        );
    }

    #[tokio::test]
    async fn test_no_thread_id_no_persistence() {
        let store = Arc::new(MemoryCheckpointer::new());
        let graph = linear(Arc::new(MarkNode("A")), Arc::new(MarkNode("B")))
            .compile(Some(store.clone()))
            .unwrap();

        graph
            .invoke(ConversationState::new("q"), None)
            .await
            .unwrap();
        assert!(store.is_empty().await);
    }
}
