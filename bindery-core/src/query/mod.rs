mod batch;
mod query;
mod script;
mod update;

pub use batch::*;
pub use query::*;
pub use script::*;
pub use update::*;

use crate::{Executor, PreparedOf, Rendered, Result, truncate_long};
use anyhow::Context;

/// Prepare `rendered.sql` on `executor` and bind every operation, in order.
///
/// With `keys` the statement is prepared to return those generated columns.
pub(crate) async fn prepare_rendered<E: Executor>(
    executor: &mut E,
    rendered: &Rendered,
    keys: Option<Vec<String>>,
) -> Result<PreparedOf<E>> {
    log::debug!("Preparing:\n{}", truncate_long!(rendered.sql));
    let sql = rendered.sql.clone();
    let prepared = match keys {
        Some(columns) => executor.prepare_with_keys(sql, columns).await,
        None => executor.prepare(sql).await,
    };
    let mut prepared = prepared
        .with_context(|| {
            format!(
                "While preparing the statement:\n{}",
                truncate_long!(rendered.sql)
            )
        })
        .inspect_err(|e| log::error!("{:#}", e))?;
    rendered.apply(&mut prepared)?;
    Ok(prepared)
}
