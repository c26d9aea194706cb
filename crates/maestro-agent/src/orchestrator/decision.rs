//! Choosing an agent for a task: static tables, keyword rules and backend
//! decisions.

use maestro_core::{Message, Request, TaskKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::{AgentDescriptor, AgentType, Task};

/// Confidence reported when the decision falls back to the default agent.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// The routing decision a backend is asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Agent name as spelled by the backend
    pub agent: String,
    /// Why the agent was chosen
    #[serde(default)]
    pub reasoning: String,
    /// Confidence in `[0, 1]`
    #[serde(default)]
    pub confidence: f64,
    /// Optional breakdown of the task
    #[serde(default)]
    pub subtasks: Vec<String>,
    /// Set when the decision could not be honoured as produced
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl RoutingDecision {
    /// A decision naming `agent` directly.
    pub fn new(agent: impl Into<String>, reasoning: impl Into<String>, confidence: f64) -> Self {
        Self {
            agent: agent.into(),
            reasoning: reasoning.into(),
            confidence: confidence.clamp(0.0, 1.0),
            subtasks: Vec::new(),
            fallback: false,
        }
    }

    /// The decision used when nothing better is available.
    pub fn fallback(default_agent: &str, reasoning: impl Into<String>) -> Self {
        Self {
            fallback: true,
            ..Self::new(default_agent, reasoning, FALLBACK_CONFIDENCE)
        }
    }
}

/// One step of a backend-produced workflow plan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct PlanStep {
    /// 1-based position, 0 when the backend omitted it
    #[serde(default)]
    pub step_number: u32,
    /// Agent type name
    pub agent: String,
    #[serde(default)]
    pub description: String,
    /// Step numbers this step waits for
    #[serde(default)]
    pub dependencies: Vec<u32>,
    /// Input for the step, the description when empty
    #[serde(default)]
    pub input: String,
}

/// Parses `text` as JSON, falling back to the outermost `open`..`close`
/// span when the backend wrapped the payload in prose or code fences.
pub(crate) fn extract_json<T: DeserializeOwned>(text: &str, open: char, close: char) -> Option<T> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    let start = trimmed.find(open)?;
    let end = trimmed.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

/// Parses a backend routing decision.
#[must_use]
pub fn parse_decision(text: &str) -> Option<RoutingDecision> {
    let mut decision: RoutingDecision = extract_json(text, '{', '}')?;
    if decision.agent.trim().is_empty() {
        return None;
    }
    decision.confidence = decision.confidence.clamp(0.0, 1.0);
    decision.fallback = false;
    Some(decision)
}

/// Keyword classification used in static mode when no route matches.
#[must_use]
pub fn classify_input(input: &str) -> Option<AgentType> {
    const RULES: &[(&[&str], AgentType)] = &[
        (&["deploy", "release", "ship"], AgentType::Deployment),
        (&["monitor", "alert", "metric"], AgentType::Monitoring),
        (&["test", "review", "bug"], AgentType::Quality),
        (&["architecture", "design"], AgentType::Architect),
        (&["roadmap", "strategy", "plan"], AgentType::Strategy),
        (&["integrate", "webhook", "api"], AgentType::Integration),
        (&["analyze", "analyse", "requirement"], AgentType::Analysis),
        (&["code", "implement", "function", "refactor"], AgentType::Development),
    ];

    let lowered = input.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, agent)| *agent)
}

/// Default chain for a task, chosen from keywords in its input.
#[must_use]
pub fn determine_agent_chain(task: &Task) -> Vec<AgentType> {
    let lowered = task.input.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|word| lowered.contains(word));

    if mentions(&["build", "create", "implement"]) {
        vec![
            AgentType::Analysis,
            AgentType::Architect,
            AgentType::Development,
            AgentType::Quality,
        ]
    } else if mentions(&["analyze", "plan", "design"]) {
        vec![AgentType::Analysis, AgentType::Strategy, AgentType::Architect]
    } else if mentions(&["deploy", "release"]) {
        vec![AgentType::Analysis, AgentType::Deployment, AgentType::Monitoring]
    } else if mentions(&["explain", "describe"]) {
        vec![AgentType::Communication]
    } else {
        vec![AgentType::Analysis, AgentType::Architect, AgentType::Development]
    }
}

fn agent_listing(agents: &[AgentDescriptor]) -> String {
    agents
        .iter()
        .map(|descriptor| format!("- {}: {}", descriptor.agent_type, descriptor.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn task_summary(task: &Task) -> String {
    let phase = if task.context.phase.is_empty() {
        "unspecified"
    } else {
        task.context.phase.as_str()
    };
    format!(
        "Task Type: {}\nInput: {}\nContext Phase: {}\nParameters: {}",
        task.kind,
        task.input,
        phase,
        serde_json::Value::Object(task.parameters.clone())
    )
}

/// Request asking a backend which agent should handle `task`.
#[must_use]
pub fn decision_request(task: &Task, agents: &[AgentDescriptor]) -> Request {
    let system = format!(
        "You route tasks to specialized agents.\n\nAvailable agents:\n{}\n\n\
         Reply with JSON only, in this shape:\n\
         {{\"agent\": \"<agent name>\", \"reasoning\": \"<why>\", \"confidence\": <0.0-1.0>, \"subtasks\": [\"<optional>\"]}}",
        agent_listing(agents)
    );

    Request::new(vec![Message::system(system), Message::user(task_summary(task))])
        .with_max_tokens(500)
        .with_sampling(0.3, 0.9)
        .with_task_hint(TaskKind::Orchestration)
}

/// Request asking a backend to break `task` into agent steps.
#[must_use]
pub fn planning_request(task: &Task, agents: &[AgentDescriptor]) -> Request {
    let system = format!(
        "You plan multi-agent workflows.\n\nAvailable agents:\n{}\n\n\
         Break the task into ordered steps. Reply with a JSON array only, each element shaped like:\n\
         {{\"step_number\": 1, \"agent\": \"<agent name>\", \"description\": \"<what the step does>\", \"dependencies\": [<step numbers>], \"input\": \"<input for the agent>\"}}",
        agent_listing(agents)
    );

    Request::new(vec![Message::system(system), Message::user(task_summary(task))])
        .with_max_tokens(1500)
        .with_sampling(0.2, 0.9)
        .with_task_hint(TaskKind::Orchestration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decision_plain_and_wrapped() {
        let plain = r#"{"agent": "development", "reasoning": "code task", "confidence": 0.9}"#;
        let decision = parse_decision(plain).unwrap();
        assert_eq!(decision.agent, "development");
        assert!(decision.subtasks.is_empty());

        let wrapped = "Sure!\n```json\n{\"agent\": \"quality\", \"confidence\": 3.5}\n```";
        let decision = parse_decision(wrapped).unwrap();
        assert_eq!(decision.agent, "quality");
        assert!((decision.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_decision_rejects_garbage() {
        assert!(parse_decision("I think the analysis agent").is_none());
        assert!(parse_decision("} nonsense {").is_none());
        assert!(parse_decision(r#"{"agent": "  "}"#).is_none());
    }

    #[test]
    fn test_fallback_decision() {
        let decision = RoutingDecision::fallback("communication", "no backend");
        assert!(decision.fallback);
        assert!((decision.confidence - FALLBACK_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_determine_agent_chain_rules() {
        let chain = |input: &str| determine_agent_chain(&Task::new(TaskKind::Chat, input));

        assert_eq!(chain("Build a todo app").len(), 4);
        assert_eq!(chain("Build a todo app")[3], AgentType::Quality);
        assert_eq!(
            chain("Please design the schema"),
            vec![AgentType::Analysis, AgentType::Strategy, AgentType::Architect]
        );
        assert_eq!(chain("Release v2")[1], AgentType::Deployment);
        assert_eq!(chain("Explain closures"), vec![AgentType::Communication]);
        assert_eq!(
            chain("hello"),
            vec![AgentType::Analysis, AgentType::Architect, AgentType::Development]
        );
    }

    #[test]
    fn test_classify_input() {
        assert_eq!(classify_input("Deploy to staging"), Some(AgentType::Deployment));
        assert_eq!(classify_input("Write a function"), Some(AgentType::Development));
        assert_eq!(classify_input("good morning"), None);
    }

    #[test]
    fn test_decision_request_shape() {
        let task = Task::new(TaskKind::Code, "sort a list");
        let request = decision_request(&task, &[]);
        assert_eq!(request.messages.len(), 2);
        assert!(request.messages[1].content.contains("Task Type: code"));
        assert!(request.messages[1].content.contains("Context Phase: unspecified"));
        assert_eq!(request.task_hint, Some(TaskKind::Orchestration));
    }
}
