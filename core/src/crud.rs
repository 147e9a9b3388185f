//! Generic async CRUD slice.
//!
//! A CRUD slice mirrors a server-owned collection. It exposes five remote
//! operations (list, get-one, create, update, delete) plus local selection
//! and reset. Each remote operation goes through the request lifecycle:
//!
//! - the request action applies the **pending** phase and returns exactly one
//!   [`Effect::Future`] calling the [`CrudGateway`]
//! - the effect resolves to [`CrudAction::Fulfilled`] or
//!   [`CrudAction::Rejected`], which merges the result or stores the error
//!
//! Mutations wait for the server: nothing is applied optimistically.

use crate::effect::Effect;
use crate::reducer::Reducer;
use crate::request::{RequestState, ServerMessage, rejection_message};
use smallvec::{SmallVec, smallvec};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// A server-owned record identified by a server-issued id.
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// Identifier type
    type Id: Clone + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// The server-issued identifier
    fn id(&self) -> &Self::Id;
}

/// Remote endpoints backing a CRUD slice.
///
/// Implemented by HTTP clients in production and by in-memory mocks in tests.
pub trait CrudGateway<T: Entity>: Send + Sync {
    /// Payload accepted by create and update
    type Draft: Clone + fmt::Debug + Send + Sync + 'static;

    /// Failure type; its server message is surfaced to the user
    type Error: ServerMessage + fmt::Display + Send + 'static;

    /// Fetch the whole collection.
    fn list(&self) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send;

    /// Fetch one entity.
    fn get(&self, id: &T::Id) -> impl Future<Output = Result<T, Self::Error>> + Send;

    /// Create an entity; the server assigns the id.
    fn create(&self, draft: &Self::Draft) -> impl Future<Output = Result<T, Self::Error>> + Send;

    /// Replace an entity.
    fn update(
        &self,
        id: &T::Id,
        draft: &Self::Draft,
    ) -> impl Future<Output = Result<T, Self::Error>> + Send;

    /// Delete an entity.
    fn delete(&self, id: &T::Id) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Remote operation of a CRUD slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudOperation {
    /// Fetch the collection
    List,
    /// Fetch one entity
    Get,
    /// Create an entity
    Create,
    /// Update an entity
    Update,
    /// Delete an entity
    Delete,
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Result of a fulfilled remote operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CrudOutcome<T: Entity> {
    /// Collection fetched
    Listed(Vec<T>),
    /// Single entity fetched
    Fetched(T),
    /// Entity created
    Created(T),
    /// Entity updated
    Updated(T),
    /// Entity deleted
    Deleted(T::Id),
}

impl<T: Entity> CrudOutcome<T> {
    /// The operation that produced this outcome
    #[must_use]
    pub const fn operation(&self) -> CrudOperation {
        match self {
            Self::Listed(_) => CrudOperation::List,
            Self::Fetched(_) => CrudOperation::Get,
            Self::Created(_) => CrudOperation::Create,
            Self::Updated(_) => CrudOperation::Update,
            Self::Deleted(_) => CrudOperation::Delete,
        }
    }
}

/// Actions of a CRUD slice.
///
/// Request actions start a remote operation; `Fulfilled` and `Rejected` are
/// produced by the effect and fed back by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum CrudAction<T: Entity, D> {
    /// Fetch the collection (full replace on success)
    FetchAll,
    /// Fetch one entity and select it
    FetchOne {
        /// Entity to fetch
        id: T::Id,
    },
    /// Create an entity (append on success)
    Create {
        /// Payload
        draft: D,
    },
    /// Update an entity (replace-by-id on success)
    Update {
        /// Entity to update
        id: T::Id,
        /// Payload
        draft: D,
    },
    /// Delete an entity (filter-out-by-id on success)
    Delete {
        /// Entity to delete
        id: T::Id,
    },
    /// Select an already loaded entity, or clear the selection
    Select {
        /// Entity to select
        id: Option<T::Id>,
    },
    /// Reset the slice to its initial state
    ClearState,
    /// A remote operation succeeded
    Fulfilled(CrudOutcome<T>),
    /// A remote operation failed
    Rejected {
        /// Operation that failed
        operation: CrudOperation,
        /// Message to display
        message: String,
    },
}

/// Root state of a CRUD slice.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState<T: Entity> {
    /// Mirrored collection, in server order
    pub entities: Vec<T>,
    /// Currently selected entity
    pub selected: Option<T>,
    /// Lifecycle of the last remote operation
    pub request: RequestState,
}

impl<T: Entity> Default for EntityState<T> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            selected: None,
            request: RequestState::default(),
        }
    }
}

impl<T: Entity> EntityState<T> {
    /// Creates an empty slice state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.request.is_loading()
    }

    /// Error of the last rejected request
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.request.error.as_deref()
    }

    /// Success message of the last fulfilled request
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.request.message.as_deref()
    }

    /// Looks up a loaded entity by id
    #[must_use]
    pub fn find(&self, id: &T::Id) -> Option<&T> {
        self.entities.iter().find(|e| e.id() == id)
    }

    /// Number of loaded entities
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity is loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Applies the pending phase of `operation`.
    pub fn begin(&mut self, slice: &'static str, operation: CrudOperation) {
        self.request.begin();
        tracing::debug!(slice, %operation, "request pending");
    }

    /// Merges a fulfilled outcome and shows `message`.
    pub fn fulfill(&mut self, slice: &'static str, outcome: CrudOutcome<T>, message: &str) {
        tracing::debug!(slice, operation = %outcome.operation(), "request fulfilled");
        self.apply(outcome);
        self.request.succeed(message);
    }

    /// Keeps the collection and shows the rejection `message`.
    pub fn reject(&mut self, slice: &'static str, operation: CrudOperation, message: String) {
        tracing::debug!(slice, %operation, "request rejected");
        self.request.fail(message);
    }

    /// Merges a fulfilled outcome into the collection.
    pub fn apply(&mut self, outcome: CrudOutcome<T>) {
        match outcome {
            CrudOutcome::Listed(entities) => {
                self.entities = entities;
                if let Some(selected) = &self.selected {
                    self.selected = self.find(selected.id()).cloned();
                }
            },
            CrudOutcome::Fetched(entity) => {
                self.upsert(entity.clone());
                self.selected = Some(entity);
            },
            CrudOutcome::Created(entity) => {
                self.upsert(entity);
            },
            CrudOutcome::Updated(entity) => {
                if self
                    .selected
                    .as_ref()
                    .is_some_and(|s| s.id() == entity.id())
                {
                    self.selected = Some(entity.clone());
                }
                if let Some(slot) = self.entities.iter_mut().find(|e| e.id() == entity.id()) {
                    *slot = entity;
                }
            },
            CrudOutcome::Deleted(id) => {
                self.entities.retain(|e| e.id() != &id);
                if self.selected.as_ref().is_some_and(|s| s.id() == &id) {
                    self.selected = None;
                }
            },
        }
    }

    /// Replaces the entity with the same id, or appends it.
    fn upsert(&mut self, entity: T) {
        match self.entities.iter_mut().find(|e| e.id() == entity.id()) {
            Some(slot) => *slot = entity,
            None => self.entities.push(entity),
        }
    }
}

/// Fixed user-facing messages of a CRUD slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrudMessages {
    /// Collection fetched
    pub listed: &'static str,
    /// Single entity fetched
    pub fetched: &'static str,
    /// Entity created
    pub created: &'static str,
    /// Entity updated
    pub updated: &'static str,
    /// Entity deleted
    pub deleted: &'static str,
    /// Shown when a rejection carries no server message
    pub fallback: &'static str,
}

impl CrudMessages {
    /// Success message for a fulfilled operation
    #[must_use]
    pub const fn success(&self, operation: CrudOperation) -> &'static str {
        match operation {
            CrudOperation::List => self.listed,
            CrudOperation::Get => self.fetched,
            CrudOperation::Create => self.created,
            CrudOperation::Update => self.updated,
            CrudOperation::Delete => self.deleted,
        }
    }
}

/// Reducer implementing the CRUD slice lifecycle for one entity type.
///
/// The environment is the gateway itself; it is cloned into each effect.
pub struct CrudReducer<T, G> {
    slice: &'static str,
    messages: CrudMessages,
    _marker: PhantomData<fn() -> (T, G)>,
}

impl<T, G> CrudReducer<T, G> {
    /// Creates a reducer for the named slice
    #[must_use]
    pub const fn new(slice: &'static str, messages: CrudMessages) -> Self {
        Self {
            slice,
            messages,
            _marker: PhantomData,
        }
    }

    /// Name of the slice, used in logs
    #[must_use]
    pub const fn slice(&self) -> &'static str {
        self.slice
    }

    /// Messages of the slice
    #[must_use]
    pub const fn messages(&self) -> &CrudMessages {
        &self.messages
    }
}

impl<T, G> Clone for CrudReducer<T, G> {
    fn clone(&self) -> Self {
        Self {
            slice: self.slice,
            messages: self.messages,
            _marker: PhantomData,
        }
    }
}

impl<T, G> fmt::Debug for CrudReducer<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudReducer")
            .field("slice", &self.slice)
            .finish_non_exhaustive()
    }
}

/// Turns a gateway result into an outcome, or the message to display.
///
/// Shared by every slice mirroring server entities, read-only ones included.
pub fn settle<T, E>(
    slice: &'static str,
    operation: CrudOperation,
    result: Result<CrudOutcome<T>, E>,
    fallback: &'static str,
) -> Result<CrudOutcome<T>, String>
where
    T: Entity,
    E: ServerMessage + fmt::Display,
{
    result.map_err(|error| {
        tracing::warn!(slice, %operation, error = %error, "request rejected");
        rejection_message(&error, fallback)
    })
}

impl<T: Entity, D> CrudAction<T, D> {
    fn settled(operation: CrudOperation, result: Result<CrudOutcome<T>, String>) -> Self {
        match result {
            Ok(outcome) => Self::Fulfilled(outcome),
            Err(message) => Self::Rejected { operation, message },
        }
    }
}

impl<T, G> Reducer for CrudReducer<T, G>
where
    T: Entity,
    G: CrudGateway<T> + Clone + 'static,
{
    type State = EntityState<T>;
    type Action = CrudAction<T, G::Draft>;
    type Environment = G;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let slice = self.slice;
        let fallback = self.messages.fallback;

        match action {
            // ========== Requests (pending) ==========
            CrudAction::FetchAll => {
                state.begin(slice, CrudOperation::List);
                let gateway = env.clone();
                smallvec![crate::async_effect! {
                    let result = gateway.list().await.map(CrudOutcome::Listed);
                    Some(CrudAction::settled(
                        CrudOperation::List,
                        settle(slice, CrudOperation::List, result, fallback),
                    ))
                }]
            },
            CrudAction::FetchOne { id } => {
                state.begin(slice, CrudOperation::Get);
                let gateway = env.clone();
                smallvec![crate::async_effect! {
                    let result = gateway.get(&id).await.map(CrudOutcome::Fetched);
                    Some(CrudAction::settled(
                        CrudOperation::Get,
                        settle(slice, CrudOperation::Get, result, fallback),
                    ))
                }]
            },
            CrudAction::Create { draft } => {
                state.begin(slice, CrudOperation::Create);
                let gateway = env.clone();
                smallvec![crate::async_effect! {
                    let result = gateway.create(&draft).await.map(CrudOutcome::Created);
                    Some(CrudAction::settled(
                        CrudOperation::Create,
                        settle(slice, CrudOperation::Create, result, fallback),
                    ))
                }]
            },
            CrudAction::Update { id, draft } => {
                state.begin(slice, CrudOperation::Update);
                let gateway = env.clone();
                smallvec![crate::async_effect! {
                    let result = gateway.update(&id, &draft).await.map(CrudOutcome::Updated);
                    Some(CrudAction::settled(
                        CrudOperation::Update,
                        settle(slice, CrudOperation::Update, result, fallback),
                    ))
                }]
            },
            CrudAction::Delete { id } => {
                state.begin(slice, CrudOperation::Delete);
                let gateway = env.clone();
                smallvec![crate::async_effect! {
                    let result = gateway.delete(&id).await.map(|()| CrudOutcome::Deleted(id));
                    Some(CrudAction::settled(
                        CrudOperation::Delete,
                        settle(slice, CrudOperation::Delete, result, fallback),
                    ))
                }]
            },

            // ========== Local ==========
            CrudAction::Select { id } => {
                state.selected = id.and_then(|id| state.find(&id).cloned());
                SmallVec::new()
            },
            CrudAction::ClearState => {
                *state = EntityState::default();
                SmallVec::new()
            },

            // ========== Outcomes ==========
            CrudAction::Fulfilled(outcome) => {
                let message = self.messages.success(outcome.operation());
                state.fulfill(slice, outcome, message);
                SmallVec::new()
            },
            CrudAction::Rejected { operation, message } => {
                state.reject(slice, operation, message);
                SmallVec::new()
            },
        }
    }
}
