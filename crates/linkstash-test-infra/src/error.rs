use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestInfraError {
    /// The container failed to start, or its host or mapped port could not
    /// be read back.
    #[error("postgres container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),
}

pub type Result<T, E = TestInfraError> = std::result::Result<T, E>;
