//! Backend descriptors.
//!
//! A [`Model`] is pure data: context limit, capability flags, 1-10 ratings
//! and a per-task fitness map. The [`Catalog`] is built once and never
//! mutated while routing.

use maestro_core::TaskKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A text-generation backend and its routing characteristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier sent to the provider
    pub name: String,
    /// Provider label, matched against `ModelProvider::name`
    pub provider: String,
    /// Largest accepted input in tokens
    pub max_input_tokens: usize,
    /// Supports structured function calls
    pub supports_function_calls: bool,
    /// Can produce embeddings
    pub supports_embedding: bool,
    /// Output quality rating (1-10)
    pub quality: u8,
    /// Speed rating (1-10)
    pub speed: u8,
    /// Cost efficiency rating (1-10, higher is cheaper)
    pub cost: u8,
    /// Fitness per task kind (1-10)
    pub task_fit: BTreeMap<TaskKind, u8>,
}

impl Model {
    /// Creates a model with neutral ratings and no capabilities.
    #[must_use]
    pub fn new(name: impl Into<String>, provider: impl Into<String>, max_input_tokens: usize) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            max_input_tokens,
            supports_function_calls: false,
            supports_embedding: false,
            quality: 5,
            speed: 5,
            cost: 5,
            task_fit: BTreeMap::new(),
        }
    }

    /// Sets the quality, speed and cost ratings, clamped to 1-10.
    #[must_use]
    pub fn with_ratings(mut self, quality: u8, speed: u8, cost: u8) -> Self {
        self.quality = quality.clamp(1, 10);
        self.speed = speed.clamp(1, 10);
        self.cost = cost.clamp(1, 10);
        self
    }

    /// Marks the model as supporting structured function calls.
    #[must_use]
    pub fn with_function_calls(mut self) -> Self {
        self.supports_function_calls = true;
        self
    }

    /// Marks the model as able to produce embeddings.
    #[must_use]
    pub fn with_embedding(mut self) -> Self {
        self.supports_embedding = true;
        self
    }

    /// Sets the fitness for a task kind, clamped to 1-10.
    #[must_use]
    pub fn with_fit(mut self, task: TaskKind, fit: u8) -> Self {
        self.task_fit.insert(task, fit.clamp(1, 10));
        self
    }

    /// Fitness for `task`, or `default_fit` when the kind is unmapped.
    #[must_use]
    pub fn fit_for(&self, task: TaskKind, default_fit: u8) -> u8 {
        self.task_fit.get(&task).copied().unwrap_or(default_fit)
    }
}

/// The set of backends the router chooses from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Models in registration order
    models: Vec<Model>,
}

impl Catalog {
    /// Creates a catalog from the given models.
    ///
    /// A later model replaces an earlier one with the same name.
    #[must_use]
    pub fn new(models: Vec<Model>) -> Self {
        let mut catalog = Self::default();
        for model in models {
            catalog.insert(model);
        }
        catalog
    }

    /// Creates the catalog of hosted backends used by default.
    ///
    /// - `llama-3.1-8b-instant` (Groq): fast and cheap
    /// - `llama-3.3-70b-versatile` (Groq): strong generalist
    /// - `moonshotai/kimi-k2-instruct` (Kimi): best quality, long context
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Model::new("llama-3.1-8b-instant", "groq", 128_000)
                .with_function_calls()
                .with_ratings(7, 9, 9)
                .with_fit(TaskKind::Chat, 8)
                .with_fit(TaskKind::Code, 7)
                .with_fit(TaskKind::Summarize, 8)
                .with_fit(TaskKind::Extract, 8)
                .with_fit(TaskKind::Reason, 6),
            Model::new("llama-3.3-70b-versatile", "groq", 128_000)
                .with_function_calls()
                .with_ratings(9, 6, 6)
                .with_fit(TaskKind::Chat, 9)
                .with_fit(TaskKind::Code, 8)
                .with_fit(TaskKind::Summarize, 9)
                .with_fit(TaskKind::Extract, 8)
                .with_fit(TaskKind::Reason, 8),
            Model::new("moonshotai/kimi-k2-instruct", "kimi", 200_000)
                .with_function_calls()
                .with_ratings(10, 7, 5)
                .with_fit(TaskKind::Orchestration, 10)
                .with_fit(TaskKind::Reason, 9)
                .with_fit(TaskKind::Code, 9)
                .with_fit(TaskKind::Chat, 8)
                .with_fit(TaskKind::Summarize, 8),
        ])
    }

    /// Adds a model, replacing any model with the same name.
    pub fn insert(&mut self, model: Model) {
        if let Some(existing) = self.models.iter_mut().find(|known| known.name == model.name) {
            *existing = model;
        } else {
            self.models.push(model);
        }
    }

    /// Looks a model up by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.name == name)
    }

    /// All models in registration order.
    #[must_use]
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Distinct provider labels, sorted.
    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        let mut providers: Vec<&str> = self
            .models
            .iter()
            .map(|model| model.provider.as_str())
            .collect();
        providers.sort_unstable();
        providers.dedup();
        providers
    }

    /// Number of models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the catalog has no models.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = Catalog::with_defaults();
        assert_eq!(catalog.len(), 3);

        let kimi = catalog.find("moonshotai/kimi-k2-instruct").unwrap();
        assert_eq!(kimi.provider, "kimi");
        assert_eq!(kimi.max_input_tokens, 200_000);
        assert_eq!(kimi.fit_for(TaskKind::Orchestration, 6), 10);
        assert_eq!(kimi.fit_for(TaskKind::Extract, 6), 6);
        assert!(catalog.models().iter().all(|model| model.supports_function_calls));
        assert_eq!(catalog.providers(), vec!["groq", "kimi"]);
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut catalog = Catalog::new(vec![Model::new("a", "p", 10)]);
        catalog.insert(Model::new("a", "p", 20));
        catalog.insert(Model::new("b", "p", 30));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find("a").unwrap().max_input_tokens, 20);
        assert!(catalog.find("missing").is_none());
    }

    #[test]
    fn test_ratings_are_clamped() {
        let model = Model::new("m", "p", 1)
            .with_ratings(0, 11, 5)
            .with_fit(TaskKind::Code, 42);
        assert_eq!((model.quality, model.speed, model.cost), (1, 10, 5));
        assert_eq!(model.fit_for(TaskKind::Code, 6), 10);
    }
}
