//! Concurrent-safe catalog of agents, tools and agent evaluations.
//!
//! The registry is constructed explicitly and shared by reference (usually
//! behind an `Arc`). Reads take the shared side of a reader/writer lock and
//! writes take the exclusive side. Everything handed out is either an `Arc`
//! to an immutable agent/tool or an owned copy of tracked state.

use maestro_core::IgnoreRwLock as _;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::agent::Agent;
use crate::evaluation::AgentEvaluation;
use crate::result::AgentResult;
use crate::tool::Tool;
use crate::types::{AgentDescriptor, AgentType, Capability};
use crate::{AgentError, Result};

/// State guarded by the registry lock.
#[derive(Default)]
struct RegistryState {
    /// Registered agents
    agents: HashMap<AgentType, Arc<dyn Agent>>,
    /// Registered tools by name
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Tool names associated with each agent, in association order
    tools_by_agent: HashMap<AgentType, Vec<String>>,
    /// Performance records
    evaluations: HashMap<AgentType, AgentEvaluation>,
}

/// Registry of agents and tools.
#[derive(Default)]
pub struct AgentRegistry {
    state: RwLock<RegistryState>,
}

impl AgentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent under its type.
    ///
    /// # Errors
    /// Returns [`AgentError::AlreadyRegistered`] if the type is taken; the
    /// existing agent stays registered.
    pub fn register(&self, agent: Arc<dyn Agent>) -> Result<()> {
        let agent_type = agent.agent_type();
        let mut state = self.state.write_ignore_poison();
        if state.agents.contains_key(&agent_type) {
            return Err(AgentError::AlreadyRegistered(agent_type));
        }
        state.agents.insert(agent_type, agent);
        drop(state);

        info!(agent = %agent_type, "Registered agent");
        Ok(())
    }

    /// Removes an agent and its tool associations.
    ///
    /// # Errors
    /// Returns [`AgentError::NotRegistered`] if the type is absent.
    pub fn unregister(&self, agent_type: AgentType) -> Result<()> {
        let mut state = self.state.write_ignore_poison();
        if state.agents.remove(&agent_type).is_none() {
            return Err(AgentError::NotRegistered(agent_type));
        }
        state.tools_by_agent.remove(&agent_type);
        drop(state);

        info!(agent = %agent_type, "Unregistered agent");
        Ok(())
    }

    /// Looks up an agent.
    ///
    /// # Errors
    /// Returns [`AgentError::NotRegistered`] if the type is absent.
    pub fn get(&self, agent_type: AgentType) -> Result<Arc<dyn Agent>> {
        self.state
            .read_ignore_poison()
            .agents
            .get(&agent_type)
            .cloned()
            .ok_or(AgentError::NotRegistered(agent_type))
    }

    /// Whether an agent of this type is registered.
    #[must_use]
    pub fn is_registered(&self, agent_type: AgentType) -> bool {
        self.state.read_ignore_poison().agents.contains_key(&agent_type)
    }

    /// Registered agent types, sorted.
    #[must_use]
    pub fn list_agents(&self) -> Vec<AgentType> {
        let mut agents: Vec<_> = self.state.read_ignore_poison().agents.keys().copied().collect();
        agents.sort_unstable();
        agents
    }

    /// Descriptors of every registered agent, sorted by type.
    #[must_use]
    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        let state = self.state.read_ignore_poison();
        let mut descriptors: Vec<_> = state.agents.values().map(|agent| agent.descriptor()).collect();
        drop(state);
        descriptors.sort_by_key(|descriptor| descriptor.agent_type);
        descriptors
    }

    /// Capabilities of one agent.
    ///
    /// # Errors
    /// Returns [`AgentError::NotRegistered`] if the type is absent.
    pub fn capabilities(&self, agent_type: AgentType) -> Result<Vec<Capability>> {
        Ok(self.get(agent_type)?.capabilities())
    }

    /// Capabilities of every registered agent.
    #[must_use]
    pub fn all_capabilities(&self) -> BTreeMap<AgentType, Vec<Capability>> {
        self.state
            .read_ignore_poison()
            .agents
            .iter()
            .map(|(agent_type, agent)| (*agent_type, agent.capabilities()))
            .collect()
    }

    /// Registers a tool.
    ///
    /// # Errors
    /// Returns [`AgentError::ToolAlreadyRegistered`] if the name is taken.
    pub fn register_tool(&self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_owned();
        let mut state = self.state.write_ignore_poison();
        if state.tools.contains_key(&name) {
            return Err(AgentError::ToolAlreadyRegistered(name));
        }
        state.tools.insert(name.clone(), tool);
        drop(state);

        debug!(tool = %name, "Registered tool");
        Ok(())
    }

    /// Looks up a tool.
    ///
    /// # Errors
    /// Returns [`AgentError::ToolNotRegistered`] if the name is absent.
    pub fn get_tool(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.state
            .read_ignore_poison()
            .tools
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::ToolNotRegistered(name.to_owned()))
    }

    /// Associates a registered tool with an agent. Repeating the call is a no-op.
    ///
    /// # Errors
    /// Returns [`AgentError::ToolNotRegistered`] if the tool is absent.
    pub fn register_tool_for_agent(&self, agent_type: AgentType, tool_name: &str) -> Result<()> {
        let mut state = self.state.write_ignore_poison();
        if !state.tools.contains_key(tool_name) {
            return Err(AgentError::ToolNotRegistered(tool_name.to_owned()));
        }
        let names = state.tools_by_agent.entry(agent_type).or_default();
        if !names.iter().any(|name| name == tool_name) {
            names.push(tool_name.to_owned());
        }
        Ok(())
    }

    /// Tools associated with an agent, in association order.
    #[must_use]
    pub fn tools_for_agent(&self, agent_type: AgentType) -> Vec<Arc<dyn Tool>> {
        let state = self.state.read_ignore_poison();
        state
            .tools_by_agent
            .get(&agent_type)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| state.tools.get(name).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Folds an execution result into the agent's evaluation.
    pub fn record_execution(&self, agent_type: AgentType, result: &AgentResult) {
        self.state
            .write_ignore_poison()
            .evaluations
            .entry(agent_type)
            .or_default()
            .record(result);
    }

    /// Copy of an agent's evaluation.
    ///
    /// # Errors
    /// Returns [`AgentError::NoEvaluation`] if nothing was recorded.
    pub fn evaluation(&self, agent_type: AgentType) -> Result<AgentEvaluation> {
        self.state
            .read_ignore_poison()
            .evaluations
            .get(&agent_type)
            .cloned()
            .ok_or(AgentError::NoEvaluation(agent_type))
    }

    /// Copies of every evaluation.
    #[must_use]
    pub fn all_evaluations(&self) -> BTreeMap<AgentType, AgentEvaluation> {
        self.state
            .read_ignore_poison()
            .evaluations
            .iter()
            .map(|(agent_type, evaluation)| (*agent_type, evaluation.clone()))
            .collect()
    }

    /// Average confidence of an agent, zero when nothing was recorded.
    #[must_use]
    pub fn agent_confidence(&self, agent_type: AgentType) -> f64 {
        self.evaluation(agent_type)
            .map_or(0.0, |evaluation| evaluation.avg_confidence)
    }

    /// Success rate of an agent, zero when nothing was recorded.
    #[must_use]
    pub fn agent_success_rate(&self, agent_type: AgentType) -> f64 {
        self.evaluation(agent_type)
            .map_or(0.0, |evaluation| evaluation.success_rate())
    }

    /// Clears one agent's evaluation.
    pub fn reset_evaluation(&self, agent_type: AgentType) {
        self.state.write_ignore_poison().evaluations.remove(&agent_type);
    }

    /// Clears every evaluation.
    pub fn reset_all_evaluations(&self) {
        self.state.write_ignore_poison().evaluations.clear();
    }
}
