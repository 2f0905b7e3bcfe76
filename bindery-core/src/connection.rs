use crate::{Driver, Error, Executor, Result, transaction, truncate_long};
use anyhow::Context;
use std::{
    borrow::Cow,
    fmt::{self, Display},
    future::{self, Future},
    str::FromStr,
};
use url::Url;

/// Transaction isolation level.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Isolation {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl Display for Isolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Isolation::ReadUncommitted => "READ UNCOMMITTED",
            Isolation::ReadCommitted => "READ COMMITTED",
            Isolation::RepeatableRead => "REPEATABLE READ",
            Isolation::Serializable => "SERIALIZABLE",
        })
    }
}

impl FromStr for Isolation {
    type Err = Error;
    /// Accepts the SQL spelling in any case, with spaces, dashes or underscores.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        Ok(match normalized.as_str() {
            "readuncommitted" => Isolation::ReadUncommitted,
            "readcommitted" => Isolation::ReadCommitted,
            "repeatableread" => Isolation::RepeatableRead,
            "serializable" => Isolation::Serializable,
            _ => {
                return Err(Error::msg(format!(
                    "Unknown isolation level `{}`",
                    truncate_long!(s)
                )));
            }
        })
    }
}

/// A live database handle capable of executing statements and running transactions.
///
/// Extends [`Executor`] with session state management.
///
/// # Lifecycle
/// - `connect` creates (or fetches) an underlying connection. It may eagerly
///   establish network I/O; always await it.
/// - With auto-commit disabled, `commit` or `rollback` MUST be awaited to
///   finalize the outstanding work. [`Connection::transaction`] does it for you.
pub trait Connection: Executor {
    fn sanitize_url(mut url: Cow<'static, str>) -> Result<Url>
    where
        Self: Sized,
    {
        let mut in_memory = false;
        if let Some((scheme, host)) = url.split_once("://")
            && host.starts_with(":memory:")
        {
            url = format!("{scheme}://localhost{}", &host[8..]).into();
            in_memory = true;
        }
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let mut result = Url::parse(&url).with_context(context)?;
        if in_memory {
            result.query_pairs_mut().append_pair("mode", "memory");
        }
        let names = <Self::Driver as Driver>::NAME;
        if !names.iter().any(|name| result.scheme() == *name) {
            let error = Error::msg(format!(
                "Connection URL must start with: {}",
                names
                    .iter()
                    .map(|v| format!("{v}://"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(result)
    }

    /// Create a connection (or pool) to the given URL.
    ///
    /// Implementations may perform I/O or validation during `connect`.
    /// Callers should treat this as a potentially expensive operation.
    fn connect(
        url: Cow<'static, str>,
    ) -> impl Future<Output = Result<<Self::Driver as Driver>::Connection>>
    where
        Self: Sized;

    /// Whether every statement is committed as soon as it completes.
    fn auto_commit(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// Enable or disable auto-commit. Disabling it starts a transaction scope.
    fn set_auto_commit(&mut self, auto_commit: bool) -> impl Future<Output = Result<()>> + Send;

    /// Current isolation level.
    fn isolation(&mut self) -> impl Future<Output = Result<Isolation>> + Send;

    fn set_isolation(&mut self, isolation: Isolation) -> impl Future<Output = Result<()>> + Send;

    /// Commit the outstanding changes.
    fn commit(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Rollback any uncommitted changes.
    fn rollback(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Run `body` inside a transaction, see [`transaction`](crate::transaction()).
    fn transaction<T, F>(
        &mut self,
        isolation: Option<Isolation>,
        body: F,
    ) -> impl Future<Output = Result<T>>
    where
        F: AsyncFnOnce(&mut Self) -> Result<T>,
    {
        transaction(self, isolation, body)
    }

    /// Disconnect and release the underlying session(s).
    fn disconnect(self) -> impl Future<Output = Result<()>> {
        future::ready(Ok(()))
    }
}
