//! The session: fetch and persistence orchestration.
//!
//! A session owns one connection, the model registry, and a per-session
//! table-metadata cache. All query execution funnels through here.

use crate::metadata::MetadataCache;
use crate::relation::{RelationIndex, distribute_belongs_to, distribute_has_many};
use crate::schema::{ModelDef, Registry, RelationKind};
use rowmodel_core::connection::Connection;
use rowmodel_core::error::{ConfigError, Error, QueryError, Result};
use rowmodel_core::fragment::{Fragment, preview};
use rowmodel_core::record::Record;
use rowmodel_core::validate::run_validators;
use rowmodel_core::value::Value;
use rowmodel_query::{Criteria, Operator};
use std::collections::HashMap;

/// Fetch and persistence orchestrator over one connection.
#[derive(Debug)]
pub struct Session<C: Connection> {
    connection: C,
    registry: Registry,
    metadata: MetadataCache,
}

impl<C: Connection> Session<C> {
    pub fn new(connection: C, registry: Registry) -> Self {
        Self {
            connection,
            registry,
            metadata: MetadataCache::new(),
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Fetch every record matching the criteria, then resolve its eager
    /// relation list. Unknown relation names fail the whole fetch before
    /// any query for related data runs.
    pub fn find_all(&self, model: &str, criteria: &Criteria) -> Result<Vec<Record>> {
        let def = self.registry.get(model)?;

        // All requested names must resolve before touching the database
        // for related data; no partial resolution.
        let relation_names = criteria.relation_list();
        for name in &relation_names {
            let relation = def.relation(name).ok_or_else(|| {
                ConfigError::new(format!(
                    "relation '{name}' is not declared on model '{model}'"
                ))
            })?;
            if !self.registry.contains(&relation.model) {
                return Err(ConfigError::new(format!(
                    "relation '{name}' targets unregistered model '{}'",
                    relation.model
                ))
                .into());
            }
        }

        let fragments = criteria.build(def.table());
        tracing::debug!(model, sql = %preview(&fragments), "executing query");
        let rows = self.connection.query(&fragments)?;

        let mut records: Vec<Record> = rows
            .into_iter()
            .map(|row| Record::from_row(&row, def.filters().clone()))
            .collect();

        for name in relation_names {
            self.resolve_relation(&def, name, &mut records)?;
        }
        Ok(records)
    }

    /// Fetch the first record matching the criteria.
    pub fn find_one(&self, model: &str, criteria: &Criteria) -> Result<Option<Record>> {
        let mut limited = criteria.clone();
        limited.limit(1);
        Ok(self.find_all(model, &limited)?.into_iter().next())
    }

    /// Fetch one record by primary-key value.
    pub fn find_by_pk(&self, model: &str, value: impl Into<Value>) -> Result<Option<Record>> {
        let def = self.registry.get(model)?;
        let mut criteria = Criteria::new();
        criteria.compare(
            format!("t.{}", def.primary_key()),
            value,
            false,
            Operator::And,
        );
        self.find_one(model, &criteria)
    }

    /// Load one relation onto an already-fetched record set.
    pub fn load_relation(
        &self,
        model: &str,
        records: &mut Vec<Record>,
        relation: &str,
    ) -> Result<()> {
        let def = self.registry.get(model)?;
        if def.relation(relation).is_none() {
            return Err(ConfigError::new(format!(
                "relation '{relation}' is not declared on model '{model}'"
            ))
            .into());
        }
        self.resolve_relation(&def, relation, records)
    }

    /// Resolve one relation with a single batched query.
    fn resolve_relation(
        &self,
        def: &ModelDef,
        name: &str,
        records: &mut Vec<Record>,
    ) -> Result<()> {
        let relation = def.relation(name).ok_or_else(|| {
            ConfigError::new(format!(
                "relation '{name}' is not declared on model '{}'",
                def.name()
            ))
        })?;

        let key_attribute = match relation.kind {
            RelationKind::HasMany => def.primary_key(),
            RelationKind::BelongsTo => relation.attribute.as_str(),
        };
        let index = RelationIndex::build(records, key_attribute);
        if index.is_empty() {
            return Ok(());
        }

        let target = self.registry.get(&relation.model)?;
        let match_column = match relation.kind {
            RelationKind::HasMany => format!("t.{}", relation.attribute),
            RelationKind::BelongsTo => format!("t.{}", target.primary_key()),
        };

        let mut criteria = Criteria::new();
        criteria.in_list(match_column, index.keys().to_vec(), false, Operator::And);
        if let Some(extra) = &relation.criteria {
            criteria.merge_with(extra);
        }

        tracing::debug!(
            relation = name,
            target = %relation.model,
            batch = index.keys().len(),
            "resolving relation"
        );
        let related = self.find_all(&relation.model, &criteria)?;

        match relation.kind {
            RelationKind::HasMany => {
                distribute_has_many(records, &index, name, &relation.attribute, related);
            }
            RelationKind::BelongsTo => {
                distribute_belongs_to(records, &index, name, target.primary_key(), related);
            }
        }
        Ok(())
    }

    /// Re-fetch a record by primary key, replacing its attributes.
    pub fn refresh(&self, model: &str, record: &mut Record) -> Result<()> {
        let def = self.registry.get(model)?;
        let pk = def.primary_key();
        let id = match record.get_raw(pk) {
            Some(value) if !value.is_null() => value.clone(),
            _ => {
                return Err(QueryError::new(format!(
                    "cannot refresh '{model}' record without a primary key"
                ))
                .into());
            }
        };

        let mut criteria = Criteria::new();
        criteria
            .compare(format!("t.{pk}"), id, false, Operator::And)
            .limit(1);
        let fragments = criteria.build(def.table());
        tracing::debug!(model, sql = %preview(&fragments), "refreshing record");
        let row = self
            .connection
            .query(&fragments)?
            .fetch_one()
            .ok_or_else(|| {
                QueryError::new(format!("refresh found no matching '{model}' row"))
                    .with_sql(preview(&fragments))
            })?;

        let attributes: HashMap<String, Value> = row
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        record.replace_attributes(attributes);
        Ok(())
    }

    /// Create an empty record pre-filled with the table's column defaults.
    pub fn new_record(&self, model: &str) -> Result<Record> {
        let def = self.registry.get(model)?;
        let metadata = self.metadata.describe(&self.connection, def.table())?;

        let mut record = Record::with_filters(def.filters().clone());
        for column in &metadata.columns {
            let value = metadata
                .defaults
                .get(column)
                .cloned()
                .unwrap_or(Value::Null);
            record.set_raw(column, value);
        }
        Ok(record)
    }

    /// Run the model's validators against a record.
    pub fn validate(&self, model: &str, record: &Record) -> Result<()> {
        let def = self.registry.get(model)?;
        run_validators(record, def.validators())
            .into_result()
            .map_err(Error::Validation)
    }

    /// Persist a record: insert when it has no identity, update otherwise.
    /// With `validate` set, a validation failure aborts before any query.
    /// Lifecycle hooks run around the write; a failing before-save hook
    /// aborts it.
    pub fn save(&self, model: &str, record: &mut Record, validate: bool) -> Result<()> {
        if validate {
            self.validate(model, record)?;
        }
        let def = self.registry.get(model)?;
        if let Some(hook) = def.before_save() {
            hook(record)?;
        }
        if record.is_new(def.primary_key()) {
            self.insert(model, record)?;
        } else {
            self.update(model, record)?;
        }
        if let Some(hook) = def.after_save() {
            hook(record)?;
        }
        Ok(())
    }

    /// Insert a record, adopt the generated identity, and refresh it.
    /// A record with no attributes to write is rejected.
    pub fn insert(&self, model: &str, record: &mut Record) -> Result<()> {
        let def = self.registry.get(model)?;
        let pk = def.primary_key();

        let pairs: Vec<(String, Value)> = record
            .sorted_attributes()
            .into_iter()
            .filter(|(name, value)| !(*name == pk && value.is_null()))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        if pairs.is_empty() {
            return Err(QueryError::new(format!(
                "cannot insert '{model}' record without attributes"
            ))
            .into());
        }

        let columns: Vec<&str> = pairs.iter().map(|(name, _)| name.as_str()).collect();
        let placeholders = vec!["%s"; pairs.len()].join(", ");
        let mut fragments = vec![Fragment::Sql(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            def.table(),
            columns.join(", "),
            placeholders
        ))];
        for (_, value) in &pairs {
            fragments.push(Fragment::Param(value.clone()));
        }

        tracing::debug!(model, sql = %preview(&fragments), "inserting record");
        self.connection.execute(&fragments)?;
        let id = self.connection.last_insert_id()?;
        record.set_raw(pk, Value::BigInt(id));
        self.refresh(model, record)
    }

    /// Update a record in place by primary key. A record carrying only its
    /// key has nothing to write and is a no-op.
    pub fn update(&self, model: &str, record: &Record) -> Result<()> {
        let def = self.registry.get(model)?;
        let pk = def.primary_key();
        let id = match record.get_raw(pk) {
            Some(value) if !value.is_null() => value.clone(),
            _ => {
                return Err(QueryError::new(format!(
                    "cannot update '{model}' record without a primary key"
                ))
                .into());
            }
        };

        let pairs: Vec<(&str, &Value)> = record
            .sorted_attributes()
            .into_iter()
            .filter(|(name, _)| *name != pk)
            .collect();
        if pairs.is_empty() {
            tracing::debug!(model, "record carries only its key, nothing to update");
            return Ok(());
        }
        let assignments = pairs
            .iter()
            .map(|(name, _)| format!("{name} = %s"))
            .collect::<Vec<_>>()
            .join(", ");

        let mut fragments = vec![Fragment::Sql(format!(
            "UPDATE {} SET {}",
            def.table(),
            assignments
        ))];
        for (_, value) in &pairs {
            fragments.push(Fragment::Param((*value).clone()));
        }
        fragments.push(Fragment::Sql(format!("WHERE {pk} = %i")));
        fragments.push(Fragment::Param(id));

        tracing::debug!(model, sql = %preview(&fragments), "updating record");
        self.connection.execute(&fragments)?;
        Ok(())
    }

    /// Delete a record by primary key. Records without an identity cannot
    /// be deleted. Lifecycle hooks run around the statement.
    pub fn delete(&self, model: &str, record: &Record) -> Result<()> {
        let def = self.registry.get(model)?;
        let pk = def.primary_key();
        if record.is_new(pk) {
            return Err(Error::EmptyDelete {
                model: model.to_string(),
            });
        }
        let id = match record.get_raw(pk) {
            Some(value) => value.clone(),
            None => {
                return Err(Error::EmptyDelete {
                    model: model.to_string(),
                });
            }
        };
        if let Some(hook) = def.before_delete() {
            hook(record)?;
        }

        let fragments = vec![
            Fragment::Sql(format!("DELETE FROM {} WHERE {pk} = %i", def.table())),
            Fragment::Param(id),
        ];
        tracing::debug!(model, sql = %preview(&fragments), "deleting record");
        self.connection.execute(&fragments)?;
        if let Some(hook) = def.after_delete() {
            hook(record)?;
        }
        Ok(())
    }
}
