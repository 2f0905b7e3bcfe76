use crate::{
    Bind, Bindings, Error, Executor, NamedStatement, Result, RowLabeled, query::prepare_rendered,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use async_stream::try_stream;
use std::pin::pin;

/// Row-returning statement.
///
/// ```
/// use bindery_core::{Bind, Query};
/// let by_id = Query::parse("SELECT name FROM users WHERE id = :id")?;
/// let rendered = by_id.bind("id", 42)?.render()?;
/// assert_eq!(rendered.sql, "SELECT name FROM users WHERE id = ?");
/// # Ok::<(), bindery_core::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Query {
    bindings: Bindings,
}

impl Query {
    pub fn new(statement: &NamedStatement) -> Self {
        Self {
            bindings: statement.bindings(),
        }
    }

    pub fn parse(sql: impl Into<String>) -> Result<Self> {
        Ok(Self::new(&NamedStatement::new(sql)?))
    }

    /// Stream the resulting rows.
    ///
    /// The prepared handle lives inside the stream and is released when the
    /// stream is dropped, whether it was consumed or not.
    pub fn fetch<'s, E: Executor>(
        &'s self,
        executor: &'s mut E,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        let context = format!(
            "While fetching the query:\n{}",
            truncate_long!(self.statement().sql())
        );
        try_stream! {
            let rendered = self.render()?;
            let mut prepared = prepare_rendered(executor, &rendered, None).await?;
            let mut stream = pin!(executor.fetch(&mut prepared));
            while let Some(row) = stream.next().await.transpose()? {
                yield row;
            }
        }
        .map_err(move |e: Error| {
            let error = e.context(context.clone());
            log::error!("{:#}", error);
            error
        })
    }

    /// Convert every row with `mapper`, stops at the first failure.
    pub async fn map<E, T, M>(&self, executor: &mut E, mut mapper: M) -> Result<Vec<T>>
    where
        E: Executor,
        M: FnMut(RowLabeled) -> Result<T>,
    {
        let mut stream = pin!(self.fetch(executor));
        let mut result = Vec::new();
        while let Some(row) = stream.next().await.transpose()? {
            result.push(mapper(row)?);
        }
        Ok(result)
    }

    /// Every row, unconverted.
    pub async fn list<E: Executor>(&self, executor: &mut E) -> Result<Vec<RowLabeled>> {
        self.fetch(executor).try_collect().await
    }

    /// Zero or one row, more than one is an error.
    pub async fn optional<E, T, M>(&self, executor: &mut E, mapper: M) -> Result<Option<T>>
    where
        E: Executor,
        M: FnOnce(RowLabeled) -> Result<T>,
    {
        let mut stream = pin!(self.fetch(executor));
        let Some(row) = stream.next().await.transpose()? else {
            return Ok(None);
        };
        if stream.next().await.transpose()?.is_some() {
            return Err(Error::msg(format!(
                "Expected at most one row from:\n{}",
                truncate_long!(self.statement().sql())
            )));
        }
        mapper(row).map(Some)
    }

    /// Exactly one row, zero or more than one is an error.
    pub async fn one<E, T, M>(&self, executor: &mut E, mapper: M) -> Result<T>
    where
        E: Executor,
        M: FnOnce(RowLabeled) -> Result<T>,
    {
        self.optional(executor, mapper).await?.ok_or_else(|| {
            Error::msg(format!(
                "Expected exactly one row from:\n{}",
                truncate_long!(self.statement().sql())
            ))
        })
    }
}

impl Bind for Query {
    fn bindings(&self) -> &Bindings {
        &self.bindings
    }
    fn with_bindings(&self, bindings: Bindings) -> Self {
        Self { bindings }
    }
}
