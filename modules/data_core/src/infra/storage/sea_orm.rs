//! SeaORM-backed store client
//!
//! Builds dynamic per-table statements with sea_query and executes them on a
//! [`DatabaseConnection`]; rows come back as JSON documents via the
//! `FromQueryResult` impl on `serde_json::Value`. Case-insensitive pattern
//! matching renders as `LOWER(col) LIKE ... ESCAPE '\'` so it behaves the
//! same on Postgres and SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{
    Alias, Asterisk, Condition, Expr, Func, LikeExpr, Order, Query, SimpleExpr,
};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, FromQueryResult, JsonValue, Value as DbValue,
};
use serde_json::Value;
use uuid::Uuid;

use crate::contract::{Document, Error, Filter, FilterOp, FilterSet, Result, StoreQuery};
use crate::domain::store::StoreClient;

/// Store client over a SeaORM database connection
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Wrap an existing connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect to the given database URL
    pub async fn connect(url: &str) -> Result<Self> {
        let db = Database::connect(url).await?;
        Ok(Self { db })
    }

    /// The underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn build<S: sea_orm::StatementBuilder>(&self, stmt: &S) -> sea_orm::Statement {
        self.db.get_database_backend().build(stmt)
    }
}

#[async_trait]
impl StoreClient for SeaOrmStore {
    async fn select(&self, table: &str, query: &StoreQuery) -> Result<Vec<Value>> {
        let mut stmt = Query::select();
        stmt.from(Alias::new(table));
        if query.select.is_empty() {
            stmt.column(Asterisk);
        } else {
            for field in &query.select {
                stmt.column(Alias::new(field));
            }
        }
        stmt.cond_where(condition(&query.filters));
        for sort in &query.order {
            stmt.order_by(
                Alias::new(&sort.column),
                if sort.ascending { Order::Asc } else { Order::Desc },
            );
        }
        if let Some(limit) = query.limit {
            stmt.limit(limit);
        }
        if let Some(offset) = query.offset {
            stmt.offset(offset);
        }

        let rows = JsonValue::find_by_statement(self.build(&stmt))
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn count(&self, table: &str, filters: &FilterSet) -> Result<u64> {
        let mut stmt = Query::select();
        stmt.from(Alias::new(table))
            .expr_as(Expr::col(Asterisk).count(), Alias::new("count"))
            .cond_where(condition(filters));

        let row = self.db.query_one(self.build(&stmt)).await?;
        match row {
            Some(row) => Ok(row.try_get::<i64>("", "count")? as u64),
            None => Ok(0),
        }
    }

    async fn insert(&self, table: &str, rows: Vec<Document>) -> Result<Vec<Value>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // column union across the batch; absent fields insert as NULL
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(table));
        stmt.columns(columns.iter().map(|c| Alias::new(c)));
        for row in &rows {
            let values: Vec<SimpleExpr> = columns
                .iter()
                .map(|column| to_db_value(row.get(column).unwrap_or(&Value::Null)).into())
                .collect();
            stmt.values(values)
                .map_err(|e| Error::Internal(e.to_string()))?;
        }
        stmt.returning_all();

        let inserted = JsonValue::find_by_statement(self.build(&stmt))
            .all(&self.db)
            .await?;
        Ok(inserted)
    }

    async fn update(
        &self,
        table: &str,
        filters: &FilterSet,
        patch: Document,
    ) -> Result<Vec<Value>> {
        let mut stmt = Query::update();
        stmt.table(Alias::new(table));
        for (key, value) in &patch {
            stmt.value(Alias::new(key), to_db_value(value));
        }
        stmt.cond_where(condition(filters));
        stmt.returning_all();

        let updated = JsonValue::find_by_statement(self.build(&stmt))
            .all(&self.db)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &FilterSet) -> Result<u64> {
        let mut stmt = Query::delete();
        stmt.from_table(Alias::new(table));
        stmt.cond_where(condition(filters));

        let result = self.db.execute(self.build(&stmt)).await?;
        Ok(result.rows_affected())
    }
}

fn condition(filters: &FilterSet) -> Condition {
    let mut cond = Condition::all();
    for filter in filters.iter() {
        cond = cond.add(predicate(filter));
    }
    cond
}

fn predicate(filter: &Filter) -> SimpleExpr {
    let col = || Expr::col(Alias::new(&filter.field));
    match filter.op {
        FilterOp::Eq => {
            if filter.value.is_null() {
                col().is_null()
            } else {
                col().eq(to_db_value(&filter.value))
            }
        }
        FilterOp::Neq => {
            if filter.value.is_null() {
                col().is_not_null()
            } else {
                col().ne(to_db_value(&filter.value))
            }
        }
        FilterOp::Gte => col().gte(to_db_value(&filter.value)),
        FilterOp::Lte => col().lte(to_db_value(&filter.value)),
        FilterOp::In => {
            let candidates: Vec<DbValue> = filter
                .value
                .as_array()
                .map(|values| values.iter().map(to_db_value).collect())
                .unwrap_or_else(|| vec![to_db_value(&filter.value)]);
            col().is_in(candidates)
        }
        FilterOp::ILike => {
            let pattern = filter.value.as_str().unwrap_or_default().to_lowercase();
            Expr::expr(Func::lower(col())).like(LikeExpr::new(pattern).escape('\\'))
        }
    }
}

// bind JSON scalars with the closest database type; uuid- and
// timestamp-shaped strings bind as their native types so typed columns
// accept them
fn to_db_value(value: &Value) -> DbValue {
    match value {
        Value::Null => DbValue::String(None),
        Value::Bool(b) => (*b).into(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else {
                n.as_f64().unwrap_or(0.0).into()
            }
        }
        Value::String(s) => {
            if let Ok(uuid) = Uuid::parse_str(s) {
                uuid.into()
            } else if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                ts.with_timezone(&Utc).into()
            } else {
                s.clone().into()
            }
        }
        Value::Array(_) | Value::Object(_) => DbValue::Json(Some(Box::new(value.clone()))),
    }
}
