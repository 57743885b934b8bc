//! Patent ownership checks shared by patent-scoped routes.

use db::{patent, ConnectionTrait, DbErr, EntityTrait};

use crate::auth::AuthenticatedUserId;

/// Reasons for a patent to be inaccessible to the current user.
pub(crate) enum PatentAccessError {
    DatabaseError(DbErr),
    NotFound,
    Forbidden,
}

impl From<DbErr> for PatentAccessError {
    fn from(err: DbErr) -> Self {
        Self::DatabaseError(err)
    }
}

/// Load a patent owned by the current user.
///
/// Patents of other users are reported as forbidden, while missing
/// patents are reported as not found.
pub(crate) async fn owned_patent<C: ConnectionTrait>(
    db: &C,
    patent_id: i64,
    current_user: AuthenticatedUserId,
) -> Result<patent::Model, PatentAccessError> {
    let patent = patent::Entity::find_by_id(patent_id)
        .one(db)
        .await?
        .ok_or(PatentAccessError::NotFound)?;

    if patent.user_id != current_user.id() {
        return Err(PatentAccessError::Forbidden);
    }

    Ok(patent)
}

/// Implement conversion from [`PatentAccessError`] for a route error type.
///
/// The error type must provide `DatabaseError(DbErr)`, `PatentNotFound`
/// and `Forbidden` variants.
macro_rules! patent_access_error {
    ($error:ty) => {
        impl From<$crate::access::PatentAccessError> for $error {
            fn from(err: $crate::access::PatentAccessError) -> Self {
                match err {
                    $crate::access::PatentAccessError::DatabaseError(err) => {
                        Self::DatabaseError(err)
                    }
                    $crate::access::PatentAccessError::NotFound => Self::PatentNotFound,
                    $crate::access::PatentAccessError::Forbidden => Self::Forbidden,
                }
            }
        }
    };
}

pub(crate) use patent_access_error;
