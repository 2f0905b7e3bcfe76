use crate::{
    Batch, Bind, Bindings, Executor, NamedStatement, QueryResult, Result, RowLabeled,
    RowsAffected, query::prepare_rendered, stream::StreamExt, truncate_long,
};
use anyhow::Context;
use std::pin::pin;

/// Modifying statement (INSERT, UPDATE, DELETE, DDL).
#[derive(Clone, Debug)]
pub struct Update {
    bindings: Bindings,
}

impl Update {
    pub fn new(statement: &NamedStatement) -> Self {
        Self {
            bindings: statement.bindings(),
        }
    }

    pub fn parse(sql: impl Into<String>) -> Result<Self> {
        Ok(Self::new(&NamedStatement::new(sql)?))
    }

    /// Execute once and return the affected rows.
    pub async fn execute<E: Executor>(&self, executor: &mut E) -> Result<RowsAffected> {
        let rendered = self.render()?;
        let mut prepared = prepare_rendered(executor, &rendered, None).await?;
        executor
            .execute(&mut prepared)
            .await
            .with_context(|| {
                format!(
                    "While executing the statement:\n{}",
                    truncate_long!(rendered.sql)
                )
            })
            .inspect_err(|e| log::error!("{:#}", e))
    }

    /// Execute once, convert every generated key row with `mapper`.
    pub async fn execute_returning_keys<E, K, M>(
        &self,
        executor: &mut E,
        columns: impl IntoIterator<Item = impl Into<String>>,
        mut mapper: M,
    ) -> Result<(RowsAffected, Vec<K>)>
    where
        E: Executor,
        M: FnMut(RowLabeled) -> Result<K>,
    {
        let rendered = self.render()?;
        let columns = columns.into_iter().map(Into::into).collect();
        let mut prepared = prepare_rendered(executor, &rendered, Some(columns)).await?;
        let context = || {
            format!(
                "While executing the statement:\n{}",
                truncate_long!(rendered.sql)
            )
        };
        let mut affected = RowsAffected::default();
        let mut keys = Vec::new();
        let mut stream = pin!(executor.run(&mut prepared));
        while let Some(result) = stream.next().await {
            match result
                .with_context(context)
                .inspect_err(|e| log::error!("{:#}", e))?
            {
                QueryResult::Affected(v) => affected.extend([v]),
                QueryResult::Row(row) => keys.push(mapper(row)?),
            }
        }
        Ok((affected, keys))
    }

    /// Start a batch, the bindings set so far become defaults for every item.
    pub fn batch(&self) -> Result<Batch> {
        Batch::new(&self.bindings)
    }
}

impl Bind for Update {
    fn bindings(&self) -> &Bindings {
        &self.bindings
    }
    fn with_bindings(&self, bindings: Bindings) -> Self {
        Self { bindings }
    }
}
