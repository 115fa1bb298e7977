use crate::{
    db::{
        Row,
        entity::{DEFAULT_ENTITY_KIND, Entity, EntityRegistry, EntityRow},
        executor::{InsertOutcome, QueryExecutor},
        query::SelectQuery,
        selection::Selection,
    },
    error::InternalError,
    obs::{GlobalMetricsSink, MetricsEvent, MetricsSink, StatementKind},
};
use std::{cell::RefCell, collections::HashMap, rc::Rc};
use tabrel_config::Settings;
use tracing::trace;

///
/// Session
///
/// Shared handle to the executor, settings, entity registry and metrics
/// sink. Cheap to clone; single-threaded by construction.
///

#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

struct SessionInner {
    executor: Rc<dyn QueryExecutor>,
    settings: Settings,
    registry: EntityRegistry,
    sink: Option<Rc<dyn MetricsSink>>,
    primary_keys: RefCell<HashMap<String, String>>,
}

impl Session {
    /// Session with default settings and only the generic entity kind.
    #[must_use]
    pub fn new(executor: Rc<dyn QueryExecutor>) -> Self {
        Self::builder(executor).build()
    }

    #[must_use]
    pub fn builder(executor: Rc<dyn QueryExecutor>) -> SessionBuilder {
        SessionBuilder {
            executor,
            settings: Settings::default(),
            registry: EntityRegistry::new(),
            sink: None,
        }
    }

    /// Root selection over `table`.
    #[must_use]
    pub fn table(&self, table: impl Into<String>) -> Selection {
        Selection::new(self.clone(), table)
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.inner.registry
    }

    /// Primary-key column of `table`, resolved once per session.
    pub fn primary_key(&self, table: &str) -> Result<String, InternalError> {
        if let Some(primary) = self.inner.primary_keys.borrow().get(table) {
            return Ok(primary.clone());
        }

        let primary = self.inner.executor.primary_key(table)?;
        self.inner
            .primary_keys
            .borrow_mut()
            .insert(table.to_string(), primary.clone());

        Ok(primary)
    }

    /// Entity kind for rows of `table`: the explicit kind first, then the
    /// settings mapping, then the generic default.
    #[must_use]
    pub fn resolve_kind<'a>(&'a self, table: &str, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or_else(|| self.inner.settings.entity_kind(table))
            .unwrap_or(DEFAULT_ENTITY_KIND)
    }

    /// Wrap a raw row in the resolved entity kind.
    pub fn instantiate(
        &self,
        row: Row,
        table: &str,
        explicit: Option<&str>,
    ) -> Result<Box<dyn Entity>, InternalError> {
        let kind = self.resolve_kind(table, explicit);
        let factory = self.inner.registry.factory(kind)?;
        let primary = self.primary_key(table)?;

        Ok(factory(EntityRow::new(table, primary, row)))
    }

    pub(crate) fn record(&self, event: MetricsEvent<'_>) {
        match &self.inner.sink {
            Some(sink) => sink.record(event),
            None => GlobalMetricsSink.record(event),
        }
    }

    //
    // Executor passthrough
    //

    pub(crate) fn select(&self, query: &SelectQuery) -> Result<Vec<Row>, InternalError> {
        trace!(table = query.table(), sql = %query.build_select_query(), "select");
        let rows = self.inner.executor.select(query)?;

        self.record(MetricsEvent::Statement {
            kind: StatementKind::Select,
            table: query.table(),
            rows: rows.len() as u64,
        });

        Ok(rows)
    }

    pub(crate) fn insert(&self, table: &str, rows: &[Row]) -> Result<InsertOutcome, InternalError> {
        trace!(table, rows = rows.len(), "insert");
        let outcome = self.inner.executor.insert(table, rows)?;

        self.record(MetricsEvent::Statement {
            kind: StatementKind::Insert,
            table,
            rows: outcome.affected,
        });

        Ok(outcome)
    }

    pub(crate) fn update(&self, filter: &SelectQuery, values: &Row) -> Result<u64, InternalError> {
        // Nothing to assign.
        if values.is_empty() {
            return Ok(0);
        }

        trace!(table = filter.table(), filter = ?filter.build_where_clause(), "update");
        let affected = self.inner.executor.update(filter, values)?;

        self.record(MetricsEvent::Statement {
            kind: StatementKind::Update,
            table: filter.table(),
            rows: affected,
        });

        Ok(affected)
    }

    pub(crate) fn delete(&self, filter: &SelectQuery) -> Result<u64, InternalError> {
        trace!(table = filter.table(), filter = ?filter.build_where_clause(), "delete");
        let affected = self.inner.executor.delete(filter)?;

        self.record(MetricsEvent::Statement {
            kind: StatementKind::Delete,
            table: filter.table(),
            rows: affected,
        });

        Ok(affected)
    }
}

///
/// SessionBuilder
///

pub struct SessionBuilder {
    executor: Rc<dyn QueryExecutor>,
    settings: Settings,
    registry: EntityRegistry,
    sink: Option<Rc<dyn MetricsSink>>,
}

impl SessionBuilder {
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: EntityRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn metrics_sink(mut self, sink: Rc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn build(self) -> Session {
        Session {
            inner: Rc::new(SessionInner {
                executor: self.executor,
                settings: self.settings,
                registry: self.registry,
                sink: self.sink,
                primary_keys: RefCell::new(HashMap::new()),
            }),
        }
    }
}
