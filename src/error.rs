use thiserror::Error;

/// Stable machine-readable deny reasons carried on every authorization
/// failure. The wire string is the serde snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NoLoggedInUser,
    InsufficientPermission,
    AdminRoleImmutable,
    SpaceDoesntExist,
    UserDoesntExist,
    UserNotMemberOfSpace,
    UserAlreadyMember,
    UserAlreadyAdmin,
    UserIsNotAdmin,
    UserIsNotInvitedIntoSpace,
    UserDidntRequestToJoin,
    NoOtherAdminsLeft,
    RoleDoesntExist,
    ReportDoesntExist,
    PostDoesntExist,
    FileDoesntExist,
    FileBelongsToPost,
}

impl DenyReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoLoggedInUser => "no_logged_in_user",
            Self::InsufficientPermission => "insufficient_permission",
            Self::AdminRoleImmutable => "admin_role_immutable",
            Self::SpaceDoesntExist => "space_doesnt_exist",
            Self::UserDoesntExist => "user_doesnt_exist",
            Self::UserNotMemberOfSpace => "user_not_member_of_space",
            Self::UserAlreadyMember => "user_already_member",
            Self::UserAlreadyAdmin => "user_already_admin",
            Self::UserIsNotAdmin => "user_is_not_admin",
            Self::UserIsNotInvitedIntoSpace => "user_is_not_invited_into_space",
            Self::UserDidntRequestToJoin => "user_didnt_request_to_join",
            Self::NoOtherAdminsLeft => "no_other_admins_left",
            Self::RoleDoesntExist => "role_doesnt_exist",
            Self::ReportDoesntExist => "report_doesnt_exist",
            Self::PostDoesntExist => "post_doesnt_exist",
            Self::FileDoesntExist => "file_doesnt_exist",
            Self::FileBelongsToPost => "file_belongs_to_post",
        }
    }

    /// HTTP status carried by this reason: 401 for missing authentication,
    /// 403 for authorization failures, 409 for precondition conflicts.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NoLoggedInUser => 401,
            Self::InsufficientPermission | Self::AdminRoleImmutable => 403,
            _ => 409,
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("identity provider unreachable: {0}")]
    IdpUnreachable(String),

    #[error("denied: {0}")]
    Denied(DenyReason),

    #[error("invalid capability: {0}")]
    InvalidCapability(String),
}

impl From<DenyReason> for Error {
    fn from(reason: DenyReason) -> Self {
        Error::Denied(reason)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
