use derive_more::Display;

use crate::store::StoreError;

/// Rejection codes produced by the attendance engine. Every failed operation
/// surfaces as one of these; the chat and HTTP layers translate them into
/// user-facing text.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "latitude must be in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinate,

    #[display(
        fmt = "location is {:.0}m from the office, outside the {:.0}m radius",
        distance_m,
        radius_m
    )]
    OutOfRange { distance_m: f64, radius_m: f64 },

    #[display(fmt = "already checked in today")]
    DuplicateCheckIn,

    #[display(fmt = "no open check-in for today")]
    CheckOutWithoutCheckIn,

    #[display(fmt = "check-out time precedes check-in time")]
    InvalidOrder,

    #[display(fmt = "no reason prompt is pending")]
    NoPendingReason,

    #[display(fmt = "a non-empty reason is required")]
    EmptyReason,

    #[display(fmt = "admin privileges required")]
    UnauthorizedAdminAction,

    #[display(fmt = "employee {} is not registered", _0)]
    UnknownEmployee(i64),

    #[display(fmt = "store failure: {}", _0)]
    Store(StoreError),
}

impl std::error::Error for AttendanceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttendanceError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for AttendanceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateKey => AttendanceError::DuplicateCheckIn,
            other => AttendanceError::Store(other),
        }
    }
}

impl AttendanceError {
    /// Stable machine-readable code, used in HTTP responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceError::InvalidCoordinate => "invalid_coordinate",
            AttendanceError::OutOfRange { .. } => "out_of_range",
            AttendanceError::DuplicateCheckIn => "duplicate_check_in",
            AttendanceError::CheckOutWithoutCheckIn => "check_out_without_check_in",
            AttendanceError::InvalidOrder => "invalid_order",
            AttendanceError::NoPendingReason => "no_pending_reason",
            AttendanceError::EmptyReason => "empty_reason",
            AttendanceError::UnauthorizedAdminAction => "unauthorized_admin_action",
            AttendanceError::UnknownEmployee(_) => "unknown_employee",
            AttendanceError::Store(_) => "store_failure",
        }
    }
}
