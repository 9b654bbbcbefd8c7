/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

use ado_core::CoreError;
use diesel::result::Error as DieselError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("database unreachable: {0}")]
  Inaccessible(String),

  #[error("connection pool error: {0}")]
  Pool(String),

  #[error("query error: {0}")]
  Query(String),

  #[error("constraint violation: {0}")]
  ConstraintViolation(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("transaction error: {0}")]
  Transaction(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<DieselError> for StoreError {
  fn from(err: DieselError) -> Self {
    match err {
      DieselError::NotFound => StoreError::NotFound("record not found".into()),
      DieselError::DatabaseError(kind, info) => match kind {
        diesel::result::DatabaseErrorKind::UniqueViolation => {
          StoreError::ConstraintViolation(info.message().to_string())
        }
        _ => StoreError::Query(info.message().to_string()),
      },
      other => StoreError::Query(other.to_string()),
    }
  }
}

impl From<diesel::r2d2::PoolError> for StoreError {
  fn from(err: diesel::r2d2::PoolError) -> Self {
    StoreError::Pool(err.to_string())
  }
}

impl From<StoreError> for CoreError {
  fn from(err: StoreError) -> Self {
    match err {
      StoreError::Inaccessible(detail) => CoreError::DataStoreInaccessible(detail),
      StoreError::Pool(detail) => CoreError::DataStoreInaccessible(detail),
      StoreError::NotFound(detail) => CoreError::Validation(detail),
      StoreError::Validation(detail) => CoreError::Validation(detail),
      StoreError::ConstraintViolation(detail) | StoreError::Query(detail) | StoreError::Transaction(detail) => {
        CoreError::InternalInvariant(detail)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn not_found_maps_to_validation() {
    let core: CoreError = StoreError::NotFound("QueryDef#7".into()).into();
    assert!(matches!(core, CoreError::Validation(_)));
  }

  #[test]
  fn inaccessible_maps_to_data_store_inaccessible() {
    let core: CoreError = StoreError::Inaccessible("disk full".into()).into();
    assert!(matches!(core, CoreError::DataStoreInaccessible(_)));
  }
}
