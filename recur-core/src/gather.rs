use std::future::Future;

use futures::future::join_all;

use crate::error::RecurError;

/// Drives every future in `futures` to completion (or its own first
/// `Defer`) concurrently, then merges the outcomes.
///
/// This is the one place in the runtime that must *not* let a single
/// branch's `?` abort the others: if every branch resolved a value,
/// `gather` returns them all in order; if one or more branches deferred,
/// `gather` returns a single `Defer` carrying the union of every
/// branch's missing calls, so the handler reports everything it's
/// waiting on in one pass instead of rediscovering its dependencies one
/// Defer at a time across repeated re-invocations. Any other error
/// propagates immediately, unmerged.
pub async fn gather<T, F>(futures: impl IntoIterator<Item = F>) -> Result<Vec<T>, RecurError>
where
    F: Future<Output = Result<T, RecurError>>,
{
    let futures: Vec<F> = futures.into_iter().collect();
    let results = join_all(futures).await;

    let mut missing = Vec::new();
    let mut values = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(RecurError::Defer { missing: calls }) => missing.extend(calls),
            Err(other) => return Err(other),
        }
    }

    if missing.is_empty() {
        Ok(values)
    } else {
        missing.sort_by(|a, b| a.memo_key.cmp(&b.memo_key));
        missing.dedup_by(|a, b| a.memo_key == b.memo_key);
        Err(RecurError::Defer { missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Call;

    async fn ok(n: i64) -> Result<i64, RecurError> {
        Ok(n)
    }

    async fn deferred(name: &'static str) -> Result<i64, RecurError> {
        Err(RecurError::defer_one(Call::new(name, serde_json::json!({}), name)))
    }

    #[tokio::test]
    async fn all_ok_preserves_order() {
        let result = gather(vec![ok(1), ok(2), ok(3)]).await.unwrap();
        assert_eq!(result, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn merges_multiple_defers_into_one() {
        let err = gather(vec![ok(1), deferred("a"), deferred("b")])
            .await
            .unwrap_err();
        match err {
            RecurError::Defer { missing } => {
                let mut names: Vec<_> = missing.iter().map(|c| c.task_name.as_str()).collect();
                names.sort();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("expected Defer, got {other:?}"),
        }
    }
}
