//! Repository traits for database access
//!
//! These traits keep the callers agnostic of the concrete SQL implementation.

use std::error::Error;
use std::fmt::Debug;
use std::future::Future;

/// Basic CRUD operations over a single entity type.
pub trait Repository<T, E>
where
    T: Clone + Debug,
    E: Error + Debug,
{
    /// Key type of the entity
    type Id: Debug + Send + Sync;

    /// Create a new entity in the repository, returning it with its key set
    fn create(&self, entity: T) -> impl Future<Output = Result<T, E>> + Send;

    /// Read an entity by key, `None` if it does not exist
    fn read(&self, id: Self::Id) -> impl Future<Output = Result<Option<T>, E>> + Send;

    /// Replace an entity, `None` if no entity with that key exists
    fn update(&self, entity: T) -> impl Future<Output = Result<Option<T>, E>> + Send;

    /// Delete an entity by key; `true` if something was deleted
    fn delete(&self, id: Self::Id) -> impl Future<Output = Result<bool, E>> + Send;

    /// Every entity in the repository
    fn list(&self) -> impl Future<Output = Result<Vec<T>, E>> + Send;
}

/// A factory for repository instances.
pub trait RepositoryFactory<R, C> {
    /// Create a new repository instance
    fn create_repository(&self, config: C) -> R;
}
