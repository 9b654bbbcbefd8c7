//! Chunked, concurrent remote fetches with an "omit failures" error policy:
//! a bad id drops that one item rather than failing the whole batch.

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::error::UpdaterResult;

pub fn chunk<T>(items: Vec<T>, chunk_size: usize) -> Vec<Vec<T>> {
  let mut chunks = Vec::new();
  let mut current = Vec::with_capacity(chunk_size);
  for item in items {
    current.push(item);
    if current.len() >= chunk_size {
      chunks.push(std::mem::replace(&mut current, Vec::with_capacity(chunk_size)));
    }
  }
  if !current.is_empty() {
    chunks.push(current);
  }
  chunks
}

/// Issues one fetch per chunk concurrently (bounded by `max_concurrent`),
/// flattens successful chunk results, and logs+drops failed chunks.
pub async fn fetch_chunks_omitting_failures<T, O, F>(
  chunks: Vec<Vec<T>>,
  max_concurrent: usize,
  fetch: F,
) -> Vec<O>
where
  T: Send + 'static,
  O: Send + 'static,
  F: Fn(Vec<T>) -> BoxFuture<'static, UpdaterResult<Vec<O>>> + Send + Sync + 'static,
{
  stream::iter(chunks)
    .map(move |chunk| fetch(chunk))
    .buffer_unordered(max_concurrent.max(1))
    .filter_map(|result| async move {
      match result {
        Ok(items) => Some(items),
        Err(err) => {
          warn!(error = %err, "omitting failed chunk from batch result");
          None
        }
      }
    })
    .collect::<Vec<_>>()
    .await
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::UpdaterError;

  #[test]
  fn chunk_splits_into_fixed_size_groups() {
    let ids: Vec<i64> = (1..=201).collect();
    let chunks = chunk(ids, 200);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].len(), 200);
    assert_eq!(chunks[1].len(), 1);
  }

  #[tokio::test]
  async fn fetch_chunks_omits_failed_chunk_without_failing_whole_batch() {
    let chunks = vec![vec![1, 2], vec![3, 4]];
    let results = fetch_chunks_omitting_failures(chunks, 4, |chunk| {
      Box::pin(async move {
        if chunk.contains(&3) {
          Err(UpdaterError::Remote { status: Some(500), detail: "boom".into() })
        } else {
          Ok(chunk)
        }
      })
    })
    .await;
    assert_eq!(results, vec![1, 2]);
  }
}
