use crate::{BindingError, Connection, Error, Isolation, Result};
use anyhow::Context;

/// Run `body` as a single transaction on `connection`.
///
/// Auto-commit is turned off and `isolation` (if any) is applied before
/// `body` runs. The work is committed when `body` succeeds and rolled back
/// when it fails, in which case the error from `body` is returned even if the
/// rollback fails as well. Afterwards auto-commit and the isolation level are
/// put back as they were, failures doing so are logged and ignored.
///
/// Fails with `PreconditionViolated`, without touching the connection, when
/// auto-commit is already disabled.
pub async fn transaction<C, T, F>(
    connection: &mut C,
    isolation: Option<Isolation>,
    body: F,
) -> Result<T>
where
    C: Connection,
    F: AsyncFnOnce(&mut C) -> Result<T>,
{
    if !connection
        .auto_commit()
        .await
        .context("While reading the auto-commit mode")?
    {
        let error = Error::new(BindingError::PreconditionViolated(
            "a transaction cannot start while auto-commit is disabled".into(),
        ));
        log::error!("{:#}", error);
        return Err(error);
    }
    let previous = match isolation {
        Some(..) => Some(
            connection
                .isolation()
                .await
                .context("While reading the isolation level")?,
        ),
        None => None,
    };
    let result = match begin(connection, isolation).await {
        Ok(()) => match body(&mut *connection).await {
            Ok(value) => match connection.commit().await {
                Ok(()) => Ok(value),
                Err(error) => {
                    let error = error.context("While committing the transaction");
                    log::error!("{:#}", error);
                    rollback_quietly(connection).await;
                    Err(error)
                }
            },
            Err(error) => {
                rollback_quietly(connection).await;
                Err(error)
            }
        },
        Err(error) => {
            log::error!("{:#}", error);
            Err(error)
        }
    };
    restore(connection, previous).await;
    result
}

async fn begin<C: Connection>(connection: &mut C, isolation: Option<Isolation>) -> Result<()> {
    connection
        .set_auto_commit(false)
        .await
        .context("While disabling auto-commit")?;
    if let Some(isolation) = isolation {
        connection
            .set_isolation(isolation)
            .await
            .with_context(|| format!("While setting the isolation level to {isolation}"))?;
    }
    Ok(())
}

async fn rollback_quietly<C: Connection>(connection: &mut C) {
    if let Err(error) = connection.rollback().await {
        log::error!(
            "{:#}",
            error.context("While rolling back a failed transaction")
        );
    }
}

async fn restore<C: Connection>(connection: &mut C, isolation: Option<Isolation>) {
    if let Err(error) = connection.set_auto_commit(true).await {
        log::warn!(
            "{:#}",
            error.context("While restoring auto-commit after a transaction")
        );
    }
    if let Some(isolation) = isolation
        && let Err(error) = connection.set_isolation(isolation).await
    {
        log::warn!(
            "{:#}",
            error.context(format!(
                "While restoring the isolation level {isolation} after a transaction"
            ))
        );
    }
}
