//! Model definitions and the registry.
//!
//! Model-to-model references are plain registered names resolved through
//! an explicit [`Registry`] built once at startup. Unknown names fail with
//! a configuration error at lookup time.

use rowmodel_core::error::{ConfigError, Result};
use rowmodel_core::filter::Filter;
use rowmodel_core::record::Record;
use rowmodel_core::validate::ValidatorBinding;
use rowmodel_query::Criteria;
use std::collections::HashMap;
use std::sync::Arc;

/// Direction of a relation between two models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Target rows carry a foreign key pointing at the base record
    HasMany,
    /// The base record carries a foreign key pointing at the target
    BelongsTo,
}

/// One declared relation: target model, the foreign-key attribute, and
/// optional extra criteria merged into every relation query.
#[derive(Debug, Clone)]
pub struct RelationDef {
    pub kind: RelationKind,
    /// Registered name of the target model
    pub model: String,
    /// For `HasMany` the foreign-key attribute on the target; for
    /// `BelongsTo` the foreign-key attribute on the base record
    pub attribute: String,
    pub criteria: Option<Criteria>,
}

impl RelationDef {
    pub fn has_many(model: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::HasMany,
            model: model.into(),
            attribute: attribute.into(),
            criteria: None,
        }
    }

    pub fn belongs_to(model: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::BelongsTo,
            model: model.into(),
            attribute: attribute.into(),
            criteria: None,
        }
    }

    /// Attach extra criteria merged into every query for this relation.
    #[must_use]
    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = Some(criteria);
        self
    }
}

/// Hook run around a save. May mutate the record; an error aborts the
/// operation.
pub type SaveHook = fn(&mut Record) -> Result<()>;

/// Hook run around a delete. An error aborts the operation.
pub type DeleteHook = fn(&Record) -> Result<()>;

/// Static definition of one model: table binding, primary key, relations,
/// filters, validators, and lifecycle hooks.
#[derive(Debug, Clone)]
pub struct ModelDef {
    name: String,
    table: String,
    primary_key: String,
    relations: Vec<(String, RelationDef)>,
    filters: HashMap<String, Filter>,
    validators: Vec<ValidatorBinding>,
    before_save: Option<SaveHook>,
    after_save: Option<SaveHook>,
    before_delete: Option<DeleteHook>,
    after_delete: Option<DeleteHook>,
}

impl ModelDef {
    /// Start a definition. The primary key defaults to `id`.
    pub fn builder(name: impl Into<String>, table: impl Into<String>) -> ModelDefBuilder {
        ModelDefBuilder {
            def: ModelDef {
                name: name.into(),
                table: table.into(),
                primary_key: "id".to_string(),
                relations: Vec::new(),
                filters: HashMap::new(),
                validators: Vec::new(),
                before_save: None,
                after_save: None,
                before_delete: None,
                after_delete: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Look up a declared relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, def)| def)
    }

    /// Declared relations, in declaration order.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &RelationDef)> {
        self.relations.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Filter bindings, cloned for each new record of this model.
    pub fn filters(&self) -> &HashMap<String, Filter> {
        &self.filters
    }

    pub fn validators(&self) -> &[ValidatorBinding] {
        &self.validators
    }

    pub fn before_save(&self) -> Option<SaveHook> {
        self.before_save
    }

    pub fn after_save(&self) -> Option<SaveHook> {
        self.after_save
    }

    pub fn before_delete(&self) -> Option<DeleteHook> {
        self.before_delete
    }

    pub fn after_delete(&self) -> Option<DeleteHook> {
        self.after_delete
    }
}

/// Fluent builder for [`ModelDef`].
#[derive(Debug)]
pub struct ModelDefBuilder {
    def: ModelDef,
}

impl ModelDefBuilder {
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.def.primary_key = name.into();
        self
    }

    /// Declare a relation. Later declarations under the same name win.
    #[must_use]
    pub fn relation(mut self, name: impl Into<String>, relation: RelationDef) -> Self {
        let name = name.into();
        self.def.relations.retain(|(n, _)| *n != name);
        self.def.relations.push((name, relation));
        self
    }

    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.def.filters.insert(field.into(), filter);
        self
    }

    #[must_use]
    pub fn validator(mut self, binding: ValidatorBinding) -> Self {
        self.def.validators.push(binding);
        self
    }

    #[must_use]
    pub fn before_save(mut self, hook: SaveHook) -> Self {
        self.def.before_save = Some(hook);
        self
    }

    #[must_use]
    pub fn after_save(mut self, hook: SaveHook) -> Self {
        self.def.after_save = Some(hook);
        self
    }

    #[must_use]
    pub fn before_delete(mut self, hook: DeleteHook) -> Self {
        self.def.before_delete = Some(hook);
        self
    }

    #[must_use]
    pub fn after_delete(mut self, hook: DeleteHook) -> Self {
        self.def.after_delete = Some(hook);
        self
    }

    pub fn build(self) -> ModelDef {
        self.def
    }
}

/// Name to model-definition map, shared immutably after construction.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    models: HashMap<String, Arc<ModelDef>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            registry: Registry::default(),
        }
    }

    /// Resolve a model name.
    pub fn get(&self, name: &str) -> Result<Arc<ModelDef>> {
        self.models.get(name).cloned().ok_or_else(|| {
            ConfigError::new(format!("model '{name}' is not registered")).into()
        })
    }

    /// Whether a model name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }
}

/// Builder for [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    #[must_use]
    pub fn register(mut self, def: ModelDef) -> Self {
        self.registry
            .models
            .insert(def.name().to_string(), Arc::new(def));
        self
    }

    pub fn build(self) -> Registry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_and_overrides() {
        let def = ModelDef::builder("User", "users").build();
        assert_eq!(def.primary_key(), "id");

        let def = ModelDef::builder("User", "users")
            .primary_key("user_id")
            .relation("orders", RelationDef::has_many("Order", "user_id"))
            .filter("active", Filter::Boolean)
            .build();
        assert_eq!(def.primary_key(), "user_id");
        assert!(def.relation("orders").is_some());
        assert!(def.relation("missing").is_none());
    }

    #[test]
    fn relation_redeclaration_wins() {
        let def = ModelDef::builder("User", "users")
            .relation("orders", RelationDef::has_many("Order", "user_id"))
            .relation("orders", RelationDef::has_many("Order", "owner_id"))
            .build();
        assert_eq!(def.relation("orders").unwrap().attribute, "owner_id");
        assert_eq!(def.relations().count(), 1);
    }

    #[test]
    fn registry_lookup() {
        let registry = Registry::builder()
            .register(ModelDef::builder("User", "users").build())
            .build();
        assert!(registry.get("User").is_ok());
        let err = registry.get("Ghost").unwrap_err();
        assert!(err.to_string().contains("model 'Ghost' is not registered"));
    }
}
