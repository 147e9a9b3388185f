//! Profile slice and avatar upload.
//!
//! The avatar flow runs in two requests:
//!
//! 1. the picture is uploaded to object storage, retried with backoff
//!    (3 attempts, `1s × attempt` between them, by default)
//! 2. its public URL is saved through the profile update endpoint
//!
//! The local preview only lives while the flow is running: it is dropped on
//! success and on failure, and a failed flow surfaces a single message.
//! Upload results carry their object path; a result whose path is not the
//! upload in flight (the user signed out or picked another picture) is
//! ignored.

use crate::environment::StorefrontEnvironment;
use crate::gateway::{AvatarStorage, ProfileGateway};
use crate::types::{ProfileUpdate, User};
use std::fmt;
use std::marker::PhantomData;
use storefront_core::reducer::Reducer;
use storefront_core::request::{RequestState, ServerMessage, rejection_message};
use storefront_core::{DateTime, SmallVec, Utc, effect::Effect, smallvec};
use storefront_runtime::retry_with_backoff;

/// Shown when a profile rejection carries no server message
pub const PROFILE_FALLBACK: &str = "Something went wrong with your profile request";

/// Shown once all upload attempts failed
pub const AVATAR_UPLOAD_FAILED: &str = "Failed to upload your picture. Please try again.";

/// Shown when the same picture is submitted while it is uploading
pub const AVATAR_ALREADY_UPLOADING: &str = "This picture is already being uploaded";

/// Shown when a picture is submitted before the profile is loaded
pub const PROFILE_NOT_LOADED: &str = "Load your profile before changing your picture";

/// Remote operation of the profile slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOperation {
    /// `GET /user/profile`
    Fetch,
    /// `PUT /user/profile/update`
    Update,
    /// `PUT /user/profile/update` with a new avatar URL
    SaveAvatar,
}

impl ProfileOperation {
    /// Success message
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Fetch => "Profile loaded",
            Self::Update => "Profile updated successfully",
            Self::SaveAvatar => "Profile picture updated",
        }
    }
}

impl fmt::Display for ProfileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Update => "update",
            Self::SaveAvatar => "save_avatar",
        };
        f.write_str(name)
    }
}

/// A picture picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarFile {
    /// File name
    pub name: String,
    /// MIME type
    pub content_type: String,
    /// File content
    pub bytes: Vec<u8>,
}

impl AvatarFile {
    /// A picked file
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Object path of this file for `user_id`, unique per upload time
    #[must_use]
    pub fn storage_path(&self, user_id: &str, at: DateTime<Utc>) -> String {
        format!("avatars/{user_id}/{}-{}", at.timestamp_millis(), self.name)
    }
}

/// Phase of the avatar flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvatarStatus {
    /// No upload started
    #[default]
    Idle,
    /// Sending the picture to object storage
    Uploading,
    /// Saving the picture URL on the profile
    Saving,
    /// The profile shows the new picture
    Uploaded,
    /// The flow failed
    Failed,
}

/// Avatar flow state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvatarUpload {
    /// Current phase
    pub status: AvatarStatus,
    /// Picture shown while the flow runs
    pub preview: Option<AvatarFile>,
    /// Object path of the upload in flight
    pub path: Option<String>,
    /// Error of the last failed or refused flow
    pub error: Option<String>,
}

impl AvatarUpload {
    /// Whether an upload or save is in flight
    #[must_use]
    pub const fn in_flight(&self) -> bool {
        matches!(self.status, AvatarStatus::Uploading | AvatarStatus::Saving)
    }

    /// Whether `path` is the upload this flow is waiting for
    fn awaits_upload(&self, path: &str) -> bool {
        self.status == AvatarStatus::Uploading && self.path.as_deref() == Some(path)
    }

    fn fail(&mut self, message: String) {
        self.status = AvatarStatus::Failed;
        self.preview = None;
        self.path = None;
        self.error = Some(message);
    }
}

/// Profile slice state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileState {
    /// Signed-in user, once fetched
    pub user: Option<User>,
    /// Lifecycle of the last profile request
    pub request: RequestState,
    /// Avatar flow
    pub avatar: AvatarUpload,
}

impl ProfileState {
    /// Whether a profile request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.request.is_loading()
    }

    /// Error of the last rejected profile request
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.request.error.as_deref()
    }

    /// Success message of the last fulfilled profile request
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.request.message.as_deref()
    }
}

/// Profile slice actions
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileAction {
    /// Load the profile
    Fetch,
    /// Update name, email or phone
    Update {
        /// New values
        update: ProfileUpdate,
    },
    /// Start the avatar flow with a picked picture
    UploadAvatar {
        /// Picked picture
        file: AvatarFile,
    },
    /// The picture reached object storage
    AvatarUploaded {
        /// Object path of the upload
        path: String,
        /// Public URL of the picture
        url: String,
    },
    /// Every upload attempt failed
    AvatarUploadFailed {
        /// Object path of the upload
        path: String,
        /// Message to display
        message: String,
    },
    /// Reset the slice
    ClearState,
    /// A profile request succeeded
    Fulfilled {
        /// Operation that succeeded
        operation: ProfileOperation,
        /// Server copy of the profile
        user: User,
    },
    /// A profile request failed
    Rejected {
        /// Operation that failed
        operation: ProfileOperation,
        /// Message to display
        message: String,
    },
}

/// Reducer of the profile slice
pub struct ProfileReducer<G, S> {
    _marker: PhantomData<fn() -> (G, S)>,
}

impl<G, S> ProfileReducer<G, S> {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<G, S> Default for ProfileReducer<G, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G, S> Clone for ProfileReducer<G, S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<G, S> fmt::Debug for ProfileReducer<G, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProfileReducer")
    }
}

fn settle<E>(operation: ProfileOperation, result: Result<User, E>) -> ProfileAction
where
    E: ServerMessage + fmt::Display,
{
    match result {
        Ok(user) => ProfileAction::Fulfilled { operation, user },
        Err(error) => {
            tracing::warn!(slice = "profile", %operation, error = %error, "request rejected");
            ProfileAction::Rejected {
                operation,
                message: rejection_message(&error, PROFILE_FALLBACK),
            }
        },
    }
}

/// Begins a profile update and returns its request effect.
fn save_profile<G>(
    state: &mut ProfileState,
    operation: ProfileOperation,
    gateway: &G,
    update: ProfileUpdate,
) -> SmallVec<[Effect<ProfileAction>; 4]>
where
    G: ProfileGateway + Clone + 'static,
{
    state.request.begin();
    tracing::debug!(slice = "profile", %operation, "request pending");
    let gateway = gateway.clone();
    smallvec![storefront_core::async_effect! {
        let result = gateway.update_profile(&update).await;
        Some(settle(operation, result))
    }]
}

impl<G, S> Reducer for ProfileReducer<G, S>
where
    G: ProfileGateway + Clone + 'static,
    S: AvatarStorage + Clone + 'static,
{
    type State = ProfileState;
    type Action = ProfileAction;
    type Environment = StorefrontEnvironment<G, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ProfileAction::Fetch => {
                state.request.begin();
                tracing::debug!(slice = "profile", "fetch pending");
                let gateway = env.gateway.clone();
                smallvec![storefront_core::async_effect! {
                    let result = gateway.fetch_profile().await;
                    Some(settle(ProfileOperation::Fetch, result))
                }]
            },
            ProfileAction::Update { update } => {
                save_profile(state, ProfileOperation::Update, &env.gateway, update)
            },

            // ========== Avatar flow ==========
            ProfileAction::UploadAvatar { file } => {
                if state.avatar.in_flight() && state.avatar.preview.as_ref() == Some(&file) {
                    tracing::debug!(file = %file.name, "avatar upload already in flight");
                    state.avatar.error = Some(AVATAR_ALREADY_UPLOADING.to_string());
                    return SmallVec::new();
                }
                let Some(user) = &state.user else {
                    state.avatar.error = Some(PROFILE_NOT_LOADED.to_string());
                    return SmallVec::new();
                };

                let path = file.storage_path(&user.id, env.clock.now());
                state.avatar = AvatarUpload {
                    status: AvatarStatus::Uploading,
                    preview: Some(file.clone()),
                    path: Some(path.clone()),
                    error: None,
                };
                tracing::debug!(%path, "avatar upload pending");

                let storage = env.storage.clone();
                let policy = env.avatar_retry;
                smallvec![storefront_core::async_effect! {
                    let uploaded = retry_with_backoff(&policy, "upload_avatar", || {
                        storage.upload(&path, file.bytes.clone(), &file.content_type)
                    })
                    .await;

                    Some(match uploaded {
                        Ok(url) => ProfileAction::AvatarUploaded { path, url },
                        Err(error) => {
                            tracing::warn!(error = %error, "avatar upload failed");
                            ProfileAction::AvatarUploadFailed {
                                path,
                                message: AVATAR_UPLOAD_FAILED.to_string(),
                            }
                        },
                    })
                }]
            },
            ProfileAction::AvatarUploaded { path, .. }
            | ProfileAction::AvatarUploadFailed { path, .. }
                if !state.avatar.awaits_upload(&path) =>
            {
                tracing::debug!(%path, "ignoring result of a superseded avatar upload");
                SmallVec::new()
            },
            ProfileAction::AvatarUploaded { url, .. } => {
                let Some(user) = &state.user else {
                    state.avatar.fail(PROFILE_NOT_LOADED.to_string());
                    return SmallVec::new();
                };
                state.avatar.status = AvatarStatus::Saving;
                let update = ProfileUpdate::from_user(user).with_avatar(url);
                save_profile(state, ProfileOperation::SaveAvatar, &env.gateway, update)
            },
            ProfileAction::AvatarUploadFailed { message, .. } => {
                state.avatar.fail(message);
                SmallVec::new()
            },

            // ========== Local ==========
            ProfileAction::ClearState => {
                *state = ProfileState::default();
                SmallVec::new()
            },

            // ========== Outcomes ==========
            ProfileAction::Fulfilled { operation, user } => {
                state.user = Some(user);
                state.request.succeed(operation.message());
                if operation == ProfileOperation::SaveAvatar
                    && state.avatar.status == AvatarStatus::Saving
                {
                    state.avatar = AvatarUpload {
                        status: AvatarStatus::Uploaded,
                        ..AvatarUpload::default()
                    };
                }
                SmallVec::new()
            },
            ProfileAction::Rejected { operation, message } => {
                if operation == ProfileOperation::SaveAvatar
                    && state.avatar.status == AvatarStatus::Saving
                {
                    state.avatar.fail(message.clone());
                }
                state.request.fail(message);
                SmallVec::new()
            },
        }
    }
}
