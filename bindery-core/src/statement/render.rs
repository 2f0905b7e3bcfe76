use crate::{
    Argument, ArgumentTarget, Binding, BindingError, Bindings, NamedStatement, Result, Token,
    Value, repeat_separated, truncate_long,
};
use anyhow::Context;
use std::{fmt, sync::Arc};

/// One positional bind to replay against a prepared statement.
#[derive(Clone)]
pub struct BindOperation {
    /// 1-based position of the `?` this operation fills.
    pub position: u64,
    /// Named parameter this operation comes from.
    pub name: Arc<str>,
    pub argument: Arc<dyn Argument>,
}

impl fmt::Debug for BindOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (:{}) = {:?}", self.position, self.name, self.argument)
    }
}

/// Positional SQL along with the binds that go with it.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub sql: String,
    /// Sorted by position, one per `?` in `sql`.
    pub operations: Vec<BindOperation>,
}

impl Rendered {
    /// Replay every bind operation on `target`, in order.
    pub fn apply(&self, target: &mut dyn ArgumentTarget) -> Result<()> {
        for operation in &self.operations {
            operation
                .argument
                .apply(target, operation.position)
                .with_context(|| {
                    format!(
                        "While binding parameter :{} at position {}",
                        operation.name, operation.position
                    )
                })?;
        }
        Ok(())
    }

    /// The values the bind operations produce, in position order.
    pub fn values(&self) -> Result<Vec<Value>> {
        struct Collect(Vec<Value>);
        impl ArgumentTarget for Collect {
            fn set(&mut self, position: u64, value: Value) -> Result<()> {
                let index = position.saturating_sub(1) as usize;
                if self.0.len() <= index {
                    self.0.resize(index + 1, Value::Null);
                }
                self.0[index] = value;
                Ok(())
            }
        }
        let mut target = Collect(Vec::with_capacity(self.operations.len()));
        self.apply(&mut target)?;
        Ok(target.0)
    }
}

impl NamedStatement {
    /// Replace each placeholder with positional markers and collect the binds.
    ///
    /// A single value becomes one `?`. A list of k elements becomes k `?`
    /// separated by commas (nothing at all when empty). Positions start at 1
    /// and follow the markers from left to right.
    ///
    /// Does not check for missing bindings beforehand, the first placeholder
    /// without a binding fails with `UnresolvedParameter`.
    pub fn render(&self, bindings: &Bindings) -> Result<Rendered> {
        let mut sql = String::with_capacity(self.sql().len() + 16);
        let mut operations = Vec::with_capacity(self.occurrences().len());
        let mut enclosed = self.enclosed().iter().copied();
        for token in self.tokens() {
            let name = match token {
                Token::Literal(text) => {
                    sql.push_str(text);
                    continue;
                }
                Token::NamedParameter(name) => name,
            };
            let enclosed = enclosed.next().unwrap_or_default();
            let binding = bindings
                .get(name)
                .ok_or_else(|| BindingError::UnresolvedParameter(name.clone()))?;
            let parentheses = match binding {
                Binding::Value(..) => {
                    sql.push('?');
                    false
                }
                // A list expands bare when the placeholder already sits inside
                // `(...)`, `[...]` or after a comma
                Binding::List(arguments) => {
                    let parentheses = !enclosed;
                    if parentheses {
                        sql.push('(');
                    }
                    repeat_separated(&mut sql, "?", ",", arguments.len());
                    parentheses
                }
            };
            if parentheses {
                sql.push(')');
            }
            let name: Arc<str> = Arc::from(name.as_str());
            for argument in binding.arguments() {
                operations.push(BindOperation {
                    position: operations.len() as u64 + 1,
                    name: name.clone(),
                    argument: argument.clone(),
                });
            }
        }
        log::debug!(
            "Rendered {} bind operations for:\n{}",
            operations.len(),
            truncate_long!(sql)
        );
        Ok(Rendered { sql, operations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AsValue;
    use indoc::indoc;

    fn varchar(v: &str) -> Value {
        Value::Varchar(Some(v.into()))
    }

    #[test]
    fn literal_only_is_unchanged() {
        let sql = indoc! {"
            SELECT 'a:b', x::text -- :c
            FROM t
        "};
        let statement = NamedStatement::new(sql).unwrap();
        let rendered = statement.render(&statement.bindings()).unwrap();
        assert_eq!(rendered.sql, sql);
        assert!(rendered.operations.is_empty());
    }

    #[test]
    fn list_expansion() {
        let statement = NamedStatement::new("SELECT * FROM t WHERE status in :statuses").unwrap();
        let bindings = statement
            .bindings()
            .bind_list("statuses", ["ACTIVE".as_value(), "MIA".as_value()])
            .unwrap();
        let rendered = statement.render(&bindings).unwrap();
        assert_eq!(rendered.sql, "SELECT * FROM t WHERE status in (?,?)");
        assert_eq!(rendered.values().unwrap(), [varchar("ACTIVE"), varchar("MIA")]);
        assert_eq!(
            rendered
                .operations
                .iter()
                .map(|v| v.position)
                .collect::<Vec<_>>(),
            [1, 2]
        );
    }

    #[test]
    fn empty_list() {
        let statement = NamedStatement::new("SELECT * FROM t WHERE status in :statuses").unwrap();
        let bindings = statement
            .bindings()
            .bind_list("statuses", Vec::<Value>::new())
            .unwrap();
        let rendered = statement.render(&bindings).unwrap();
        assert_eq!(rendered.sql, "SELECT * FROM t WHERE status in ()");
        assert!(rendered.operations.is_empty());

        let statement = NamedStatement::new("SELECT * FROM t WHERE status in (:statuses)").unwrap();
        let bindings = statement
            .bindings()
            .bind_list("statuses", Vec::<Value>::new())
            .unwrap();
        assert_eq!(
            statement.render(&bindings).unwrap().sql,
            "SELECT * FROM t WHERE status in ()"
        );
    }

    #[test]
    fn positions_follow_markers() {
        let statement =
            NamedStatement::new("SELECT :a, x IN ( :list , :a ), ARRAY[:list], :b").unwrap();
        let bindings = statement
            .bindings()
            .bind_value("a", 1i32.as_value())
            .and_then(|v| v.bind_list("list", [10i32.as_value(), 20i32.as_value()]))
            .and_then(|v| v.bind_value("b", Value::Boolean(None)))
            .unwrap();
        let rendered = statement.render(&bindings).unwrap();
        assert_eq!(rendered.sql, "SELECT ?, x IN ( ?,? , ? ), ARRAY[?,?], ?");
        assert_eq!(
            rendered.values().unwrap(),
            [
                Value::Int32(Some(1)),
                Value::Int32(Some(10)),
                Value::Int32(Some(20)),
                Value::Int32(Some(1)),
                Value::Int32(Some(10)),
                Value::Int32(Some(20)),
                Value::Boolean(None),
            ]
        );
        assert_eq!(
            rendered
                .operations
                .iter()
                .map(|v| (v.position, &*v.name))
                .collect::<Vec<_>>(),
            [
                (1, "a"),
                (2, "list"),
                (3, "list"),
                (4, "a"),
                (5, "list"),
                (6, "list"),
                (7, "b"),
            ]
        );
    }

    #[test]
    fn lists_after_a_comma() {
        let statement = NamedStatement::new("SELECT * FROM t WHERE id IN (:first, :rest)").unwrap();
        let bindings = statement
            .bindings()
            .bind_value("first", 1i64.as_value())
            .and_then(|v| v.bind_list("rest", [2i64.as_value(), 3i64.as_value()]))
            .unwrap();
        assert_eq!(
            statement.render(&bindings).unwrap().sql,
            "SELECT * FROM t WHERE id IN (?, ?,?)"
        );
    }

    #[test]
    fn comments_before_a_list() {
        for (sql, expected) in [
            (
                "SELECT * FROM t WHERE id IN ( /* ids */ :ids)",
                "SELECT * FROM t WHERE id IN ( /* ids */ ?,?)",
            ),
            (
                "SELECT * FROM t WHERE id IN ( -- ids\n :ids)",
                "SELECT * FROM t WHERE id IN ( -- ids\n ?,?)",
            ),
            (
                "SELECT * FROM t WHERE id IN :ids -- (",
                "SELECT * FROM t WHERE id IN (?,?) -- (",
            ),
            (
                "SELECT * FROM t WHERE id IN /* ( */ :ids",
                "SELECT * FROM t WHERE id IN /* ( */ (?,?)",
            ),
        ] {
            let statement = NamedStatement::new(sql).unwrap();
            let bindings = statement
                .bindings()
                .bind_list("ids", [1i32.as_value(), 2i32.as_value()])
                .unwrap();
            let rendered = statement.render(&bindings).unwrap();
            assert_eq!(rendered.sql, expected, "{sql}");
            assert_eq!(
                rendered.values().unwrap(),
                [Value::Int32(Some(1)), Value::Int32(Some(2))]
            );
        }
    }

    #[test]
    fn idempotent() {
        let statement = NamedStatement::new("INSERT INTO t VALUES (:a, :b)").unwrap();
        let bindings = statement
            .bindings()
            .bind_value("a", "x".as_value())
            .and_then(|v| v.bind_value("b", 2.5f64.as_value()))
            .unwrap();
        let first = statement.render(&bindings).unwrap();
        let second = statement.render(&bindings).unwrap();
        assert_eq!(first.sql, second.sql);
        assert_eq!(first.values().unwrap(), second.values().unwrap());
        assert_eq!(format!("{:?}", first.operations), format!("{:?}", second.operations));
    }

    #[test]
    fn unresolved() {
        let statement = NamedStatement::new("SELECT :a, :b").unwrap();
        let bindings = statement.bindings().bind_value("a", Value::Null).unwrap();
        let error = statement.render(&bindings).unwrap_err();
        assert_eq!(
            error.downcast_ref::<BindingError>(),
            Some(&BindingError::UnresolvedParameter("b".into()))
        );
    }
}
