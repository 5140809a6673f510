use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sea_orm::{DbErr, RuntimeErr, SqlErr};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error families surfaced to the calling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    PermissionDenied,
    AuthenticationRequired,
    TransientStore,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // 400 BAD REQUEST
    ValidationError,
    InvalidVoteType,
    CrossThreadReply,
    ReplyToDeletedComment,
    CommentDeleted,
    HierarchyTooDeep,

    // 401 UNAUTHORIZED
    AuthenticationRequired,
    ExpiredAuthToken,
    InvalidAuthToken,

    // 403 FORBIDDEN
    NotEnoughPermission,
    NotCommentAuthor,

    // 404 NOT FOUND
    IssueNotFound,
    CommentNotFound,
    LocationNotFound,
    CategoryNotFound,

    // 409 CONFLICT
    ActiveChildrenExist,
    InactiveParent,
    InactiveNode,
    CyclicHierarchy,
    DuplicateEntry,

    // 503 SERVICE UNAVAILABLE
    TransientStoreError,

    // 500 SERVER ERRORS
    DatabaseError,
    InternalError,
    TokenGenerationFailed,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Validation failed",
            ErrorCode::InvalidVoteType => "Vote type must be 'up' or 'down'",
            ErrorCode::CrossThreadReply => "Parent comment does not belong to this issue",
            ErrorCode::ReplyToDeletedComment => "Cannot reply to a deleted comment",
            ErrorCode::CommentDeleted => "Comment has been deleted",
            ErrorCode::HierarchyTooDeep => "Hierarchy would exceed the maximum depth",

            ErrorCode::AuthenticationRequired => "Authentication required",
            ErrorCode::ExpiredAuthToken => "Login token has expired",
            ErrorCode::InvalidAuthToken => "Invalid login token",

            ErrorCode::NotEnoughPermission => "Not enough permission",
            ErrorCode::NotCommentAuthor => "Only the author may modify this comment",

            ErrorCode::IssueNotFound => "Issue not found",
            ErrorCode::CommentNotFound => "Comment not found",
            ErrorCode::LocationNotFound => "Location not found",
            ErrorCode::CategoryNotFound => "Category not found",

            ErrorCode::ActiveChildrenExist => "Node still has active children",
            ErrorCode::InactiveParent => "Parent node is inactive",
            ErrorCode::InactiveNode => "Referenced category or location is inactive",
            ErrorCode::CyclicHierarchy => "Move would create a cycle in the hierarchy",
            ErrorCode::DuplicateEntry => "Entry already exists",

            ErrorCode::TransientStoreError => "Storage is busy, please retry",

            ErrorCode::DatabaseError => "A database error occurred",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::TokenGenerationFailed => "Failed to generate token",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::InvalidVoteType
            | ErrorCode::CrossThreadReply
            | ErrorCode::ReplyToDeletedComment
            | ErrorCode::CommentDeleted
            | ErrorCode::HierarchyTooDeep => ErrorKind::InvalidArgument,

            ErrorCode::AuthenticationRequired
            | ErrorCode::ExpiredAuthToken
            | ErrorCode::InvalidAuthToken => ErrorKind::AuthenticationRequired,

            ErrorCode::NotEnoughPermission | ErrorCode::NotCommentAuthor => {
                ErrorKind::PermissionDenied
            }

            ErrorCode::IssueNotFound
            | ErrorCode::CommentNotFound
            | ErrorCode::LocationNotFound
            | ErrorCode::CategoryNotFound => ErrorKind::NotFound,

            ErrorCode::ActiveChildrenExist
            | ErrorCode::InactiveParent
            | ErrorCode::InactiveNode
            | ErrorCode::CyclicHierarchy
            | ErrorCode::DuplicateEntry => ErrorKind::Conflict,

            ErrorCode::TransientStoreError => ErrorKind::TransientStore,

            ErrorCode::DatabaseError
            | ErrorCode::InternalError
            | ErrorCode::TokenGenerationFailed => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::TransientStore => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

impl ValidationFieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ApiError(ErrorCode, Option<String>),

    #[error("validation failed: {0:?}")]
    ValidationError(Vec<ValidationFieldError>),
}

impl AppError {
    pub fn new(code: ErrorCode) -> Self {
        AppError::ApiError(code, None)
    }

    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        AppError::ApiError(code, Some(detail.into()))
    }

    /// Fails with a `ValidationError` when any field error was collected.
    pub fn check(errors: Vec<ValidationFieldError>) -> Result<(), AppError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationError(errors))
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ApiError(code, _) => *code,
            AppError::ValidationError(_) => ErrorCode::ValidationError,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransientStore
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        if is_transient(&err) {
            return AppError::with_detail(ErrorCode::TransientStoreError, err.to_string());
        }
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return AppError::with_detail(ErrorCode::DuplicateEntry, detail);
        }
        AppError::with_detail(ErrorCode::DatabaseError, err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::with_detail(ErrorCode::TokenGenerationFailed, err.to_string())
    }
}

/// Lock contention, deadlocks and pool exhaustion are safe to retry from scratch.
fn is_transient(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::ConnectionAcquire(_) => return true,
        DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime) => runtime,
        _ => return false,
    };

    match runtime {
        RuntimeErr::SqlxError(sqlx::Error::PoolTimedOut) => true,
        RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) => {
            // 40001: serialization failure / InnoDB deadlock, 5 and 6: SQLITE_BUSY / SQLITE_LOCKED
            let code_is_transient = matches!(db_err.code().as_deref(), Some("40001" | "5" | "6"));
            let message = db_err.message().to_ascii_lowercase();
            code_is_transient
                || message.contains("deadlock")
                || message.contains("lock wait timeout")
                || message.contains("database is locked")
        }
        _ => false,
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ValidationFieldError>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.code().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.code();
        let (detail, errors) = match self {
            // store internals stay in the logs, not in the response body
            AppError::ApiError(_, _) if code.kind() == ErrorKind::Internal => (None, Vec::new()),
            AppError::ApiError(_, detail) => (detail.clone(), Vec::new()),
            AppError::ValidationError(errors) => (None, errors.clone()),
        };

        let response = ErrorResponse {
            code: format!("{:?}", code),
            message: code.message().to_string(),
            detail,
            errors,
        };

        HttpResponse::build(code.status_code()).json(response)
    }
}
