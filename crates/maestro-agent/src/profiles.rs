//! Built-in agent profiles.
//!
//! A profile is the static part of a [`crate::BackendAgent`]: identity,
//! description, capabilities, the task kind and priority it routes with, a
//! short system prompt and keyword hand-offs to other agents.

use maestro_core::{Priority, TaskKind};

use crate::types::{AgentType, Capability};

/// Static description of a backend-driven agent.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    /// Agent identity
    pub agent_type: AgentType,
    /// Human-readable description
    pub description: &'static str,
    /// `(name, description, required)` triples
    pub capabilities: &'static [(&'static str, &'static str, bool)],
    /// Task kind used when asking the router for a backend
    pub task_kind: TaskKind,
    /// Priority used when asking the router for a backend
    pub priority: Priority,
    /// Framing sent as the system message
    pub system_prompt: &'static str,
    /// Output keywords that suggest a follow-up agent
    pub handoffs: &'static [(&'static str, AgentType)],
}

impl AgentProfile {
    /// Capabilities as owned values.
    #[must_use]
    pub fn capability_list(&self) -> Vec<Capability> {
        self.capabilities
            .iter()
            .map(|(name, description, required)| Capability::new(*name, *description, *required))
            .collect()
    }

    /// First hand-off whose keyword appears in `output`.
    #[must_use]
    pub fn handoff_for(&self, output: &str) -> Option<AgentType> {
        let lowered = output.to_lowercase();
        self.handoffs
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, agent)| *agent)
    }
}

/// Profiles for every standard agent except the orchestrator itself.
#[must_use]
pub fn default_profiles() -> Vec<AgentProfile> {
    vec![
        AgentProfile {
            agent_type: AgentType::Communication,
            description: "Handles user interactions, chat responses, and UI/UX communications",
            capabilities: &[
                ("chat", "Natural conversation with users", true),
                ("consultation", "Business consultation dialogue", true),
                ("support", "User support and help", true),
                ("onboarding", "User onboarding flow", false),
                ("feedback", "Collect user feedback", false),
            ],
            task_kind: TaskKind::Chat,
            priority: Priority::Speed,
            system_prompt: "You are a helpful assistant. Answer clearly and ask clarifying questions when the request is ambiguous.",
            handoffs: &[
                ("analyze", AgentType::Analysis),
                ("investigate", AgentType::Analysis),
                ("implement", AgentType::Development),
            ],
        },
        AgentProfile {
            agent_type: AgentType::Analysis,
            description: "Analyzes requirements, breaks down problems, and provides insights",
            capabilities: &[
                ("requirements_analysis", "Break down and analyze requirements", true),
                ("feasibility_study", "Assess technical feasibility", true),
                ("risk_assessment", "Identify potential risks", false),
                ("dependency_mapping", "Map system dependencies", false),
            ],
            task_kind: TaskKind::Reason,
            priority: Priority::Quality,
            system_prompt: "You analyze requirements. List goals, constraints, risks and open questions.",
            handoffs: &[
                ("architecture", AgentType::Architect),
                ("roadmap", AgentType::Strategy),
            ],
        },
        AgentProfile {
            agent_type: AgentType::Architect,
            description: "Designs system architecture and technical solutions",
            capabilities: &[
                ("system_design", "Design system architecture", true),
                ("tech_stack", "Select technology stack", true),
            ],
            task_kind: TaskKind::Reason,
            priority: Priority::Quality,
            system_prompt: "You design software systems. Describe components, interfaces and data flow.",
            handoffs: &[("implement", AgentType::Development)],
        },
        AgentProfile {
            agent_type: AgentType::Development,
            description: "Generates high-quality code implementations with best practices",
            capabilities: &[
                ("code_generation", "Generate production-ready code", true),
                ("refactoring", "Refactor and optimize code", true),
                ("debugging", "Debug and fix issues", false),
                ("documentation", "Generate code documentation", false),
            ],
            task_kind: TaskKind::Code,
            priority: Priority::Quality,
            system_prompt: "You write production code. Return complete, working code with brief notes.",
            handoffs: &[("test", AgentType::Quality)],
        },
        AgentProfile {
            agent_type: AgentType::Quality,
            description: "Ensures code quality through testing and review",
            capabilities: &[
                ("code_review", "Review code quality", true),
                ("testing", "Generate and run tests", true),
            ],
            task_kind: TaskKind::Code,
            priority: Priority::Balanced,
            system_prompt: "You review code. Report defects, missing tests and concrete fixes.",
            handoffs: &[("deploy", AgentType::Deployment)],
        },
        AgentProfile {
            agent_type: AgentType::Strategy,
            description: "Develops strategic plans and roadmaps",
            capabilities: &[
                ("planning", "Strategic planning", true),
                ("roadmap", "Create roadmaps", true),
            ],
            task_kind: TaskKind::Reason,
            priority: Priority::Quality,
            system_prompt: "You plan. Produce a phased roadmap with milestones.",
            handoffs: &[("design", AgentType::Architect)],
        },
        AgentProfile {
            agent_type: AgentType::Deployment,
            description: "Handles deployment to various cloud platforms",
            capabilities: &[
                ("deploy", "Deploy applications", true),
                ("ci_cd", "Setup CI/CD pipelines", false),
            ],
            task_kind: TaskKind::Chat,
            priority: Priority::Speed,
            system_prompt: "You plan deployments. Give exact steps, configuration and rollback notes.",
            handoffs: &[("monitor", AgentType::Monitoring)],
        },
        AgentProfile {
            agent_type: AgentType::Monitoring,
            description: "Sets up monitoring, logging, and observability",
            capabilities: &[
                ("monitoring", "Setup monitoring", true),
                ("alerts", "Configure alerts", false),
            ],
            task_kind: TaskKind::Chat,
            priority: Priority::Speed,
            system_prompt: "You set up observability. Name metrics, log fields and alert thresholds.",
            handoffs: &[],
        },
        AgentProfile {
            agent_type: AgentType::Integration,
            description: "Handles integrations with external services, APIs, and third-party tools",
            capabilities: &[
                ("api_integration", "Connect external APIs", true),
                ("webhooks", "Configure webhooks", false),
            ],
            task_kind: TaskKind::Code,
            priority: Priority::Balanced,
            system_prompt: "You integrate external services. Describe endpoints, auth and payload mapping.",
            handoffs: &[("test", AgentType::Quality)],
        },
        AgentProfile {
            agent_type: AgentType::Recommender,
            description: "Meta-agent that optimizes tools, patterns, and other agents through iterative testing and refinement",
            capabilities: &[
                ("agent_tuning", "Recommend agent configuration changes", true),
                ("pattern_review", "Review recorded workflow patterns", false),
            ],
            task_kind: TaskKind::Reason,
            priority: Priority::Quality,
            system_prompt: "You improve agent workflows. Recommend concrete configuration changes.",
            handoffs: &[],
        },
        AgentProfile {
            agent_type: AgentType::AiProviders,
            description: "Multi-model gateway with routing across hosted backends",
            capabilities: &[
                ("completion", "Route a prompt to the best backend", true),
                ("summarization", "Condense long input", false),
            ],
            task_kind: TaskKind::Chat,
            priority: Priority::Balanced,
            system_prompt: "You are a general-purpose assistant.",
            handoffs: &[],
        },
    ]
}
