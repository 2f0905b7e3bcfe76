use crate::{
    Executor, NamedStatement, Result, RowsAffected, query::prepare_rendered, split_statements,
    truncate_long,
};
use anyhow::Context;

/// Sequence of statements separated by `;`, executed one after the other.
///
/// Blank statements (only whitespace or comments) are dropped. Scripts take no
/// parameters: a statement declaring one fails with `MissingBindings` before
/// anything runs.
#[derive(Clone, Debug)]
pub struct Script {
    statements: Box<[NamedStatement]>,
}

impl Script {
    pub fn parse(sql: &str) -> Result<Self> {
        let statements = split_statements(sql)
            .with_context(|| format!("While splitting the script:\n{}", truncate_long!(sql)))?
            .into_iter()
            .map(NamedStatement::new)
            .collect::<Result<_>>()?;
        Ok(Self { statements })
    }

    pub fn statements(&self) -> &[NamedStatement] {
        &self.statements
    }

    /// Execute each statement in order, one `RowsAffected` per statement.
    ///
    /// Stops at the first failing statement, the ones before it stay executed.
    pub async fn execute<E: Executor>(&self, executor: &mut E) -> Result<Vec<RowsAffected>> {
        let rendered = self
            .statements
            .iter()
            .map(|statement| {
                let bindings = statement.bindings();
                statement.check_all_bindings_present(&bindings)?;
                statement.render(&bindings)
            })
            .collect::<Result<Vec<_>>>()?;
        let mut result = Vec::with_capacity(rendered.len());
        for (index, statement) in rendered.iter().enumerate() {
            let mut prepared = prepare_rendered(executor, statement, None).await?;
            let affected = executor
                .execute(&mut prepared)
                .await
                .with_context(|| {
                    format!(
                        "While executing statement {} of the script:\n{}",
                        index + 1,
                        truncate_long!(statement.sql)
                    )
                })
                .inspect_err(|e| log::error!("{:#}", e))?;
            result.push(affected);
        }
        Ok(result)
    }
}
