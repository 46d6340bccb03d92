pub mod analytics;
pub mod backup;
pub mod dashboard;
pub mod export;
pub mod extract;
pub mod health;
pub mod login;
pub mod patients;
pub mod schedules;
pub mod staff;
pub mod users;

use crate::error::{Result, ServiceError};

/// Run password hashing, document rendering or file copies off the async
/// worker threads.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServiceError::Internal(format!("blocking task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn work_runs_off_the_runtime_thread() {
        let runtime_thread = std::thread::current().id();
        let worker = blocking(|| Ok(std::thread::current().id())).await.unwrap();
        assert_ne!(worker, runtime_thread);

        let err = blocking::<(), _>(|| Err(ServiceError::BadRequest("nope".into())))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");
    }

    #[tokio::test]
    async fn panicking_work_is_an_internal_error() {
        let err = blocking::<(), _>(|| panic!("render blew up")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
