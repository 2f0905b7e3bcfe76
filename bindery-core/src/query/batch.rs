use crate::{
    Bind, BindingError, Bindings, Executor, Prepared, PreparedOf, QueryResult, Rendered, Result,
    RowLabeled, RowsAffected, query::prepare_rendered, stream::StreamExt, truncate_long,
};
use anyhow::Context;
use std::{pin::pin, sync::Arc};

/// Many parameter sets for one modifying statement, submitted together.
///
/// Obtained from [`Update::batch`](crate::Update::batch). The bindings the
/// update had at that point act as defaults that every item can override
/// once. Each `add` validates the current item and starts the next one from
/// the defaults again.
#[derive(Clone, Debug)]
pub struct Batch {
    defaults: Bindings,
    current: Bindings,
    items: Arc<[Rendered]>,
}

impl Batch {
    pub(crate) fn new(bindings: &Bindings) -> Result<Self> {
        let mut defaults = bindings.statement().bindings();
        for (name, binding) in bindings.iter() {
            defaults = defaults.bind_default(name, binding.clone())?;
        }
        Ok(Self {
            current: defaults.clone(),
            defaults,
            items: Arc::new([]),
        })
    }

    /// Number of items added so far.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items added so far, in order.
    pub fn items(&self) -> &[Rendered] {
        &self.items
    }

    /// Validate the current item and append it.
    ///
    /// Fails with `MissingBindings` when the item is incomplete and with
    /// `InconsistentBatch` when its SQL differs from the previous items
    /// (e.g. a list bound with a different number of elements).
    pub fn add(&self) -> Result<Self> {
        let index = self.items.len();
        let rendered = self
            .render()
            .with_context(|| format!("While adding item {index} to the batch"))?;
        if let Some(first) = self.items.first()
            && first.sql != rendered.sql
        {
            return Err(BindingError::InconsistentBatch { index }.into());
        }
        let mut items = self.items.to_vec();
        items.push(rendered);
        Ok(Self {
            defaults: self.defaults.clone(),
            current: self.defaults.clone(),
            items: items.into(),
        })
    }

    async fn prepare<E: Executor>(
        &self,
        executor: &mut E,
        keys: Option<Vec<String>>,
    ) -> Result<Option<PreparedOf<E>>> {
        let Some(first) = self.items.first() else {
            log::debug!("Empty batch, nothing to execute");
            return Ok(None);
        };
        let mut prepared = prepare_rendered(executor, first, keys).await?;
        prepared.add_batch()?;
        for item in &self.items[1..] {
            prepared.clear_bindings()?;
            item.apply(&mut prepared)?;
            prepared.add_batch()?;
        }
        Ok(Some(prepared))
    }

    fn context(&self) -> String {
        format!(
            "While executing a batch of {} items:\n{}",
            self.items.len(),
            truncate_long!(self.statement().sql())
        )
    }

    /// Execute every item, one `RowsAffected` per item in order.
    pub async fn execute<E: Executor>(&self, executor: &mut E) -> Result<Vec<RowsAffected>> {
        Ok(self.execute_returning_keys(executor, None::<String>, Ok).await?.0)
    }

    /// Execute every item, also converting the generated key rows with `mapper`.
    ///
    /// Only the keys of the last item are guaranteed, drivers may return the
    /// keys of every item.
    pub async fn execute_returning_keys<E, K, M>(
        &self,
        executor: &mut E,
        columns: impl IntoIterator<Item = impl Into<String>>,
        mut mapper: M,
    ) -> Result<(Vec<RowsAffected>, Vec<K>)>
    where
        E: Executor,
        M: FnMut(RowLabeled) -> Result<K>,
    {
        let columns = columns.into_iter().map(Into::into).collect::<Vec<_>>();
        let keys = (!columns.is_empty()).then_some(columns);
        let Some(mut prepared) = self.prepare(executor, keys).await? else {
            return Ok(Default::default());
        };
        let mut affected = Vec::with_capacity(self.items.len());
        let mut keys = Vec::new();
        let mut stream = pin!(executor.run_batch(&mut prepared));
        while let Some(result) = stream.next().await {
            match result
                .with_context(|| self.context())
                .inspect_err(|e| log::error!("{:#}", e))?
            {
                QueryResult::Affected(v) => affected.push(v),
                QueryResult::Row(row) => keys.push(mapper(row)?),
            }
        }
        Ok((affected, keys))
    }
}

impl Bind for Batch {
    fn bindings(&self) -> &Bindings {
        &self.current
    }
    fn with_bindings(&self, bindings: Bindings) -> Self {
        Self {
            defaults: self.defaults.clone(),
            current: bindings,
            items: self.items.clone(),
        }
    }
}
