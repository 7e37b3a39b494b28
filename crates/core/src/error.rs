use thiserror::Error;

use crate::model::ProgressValidationError;
use crate::model::UserError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ProgressValidation(#[from] ProgressValidationError),
    #[error(transparent)]
    UserValidation(#[from] UserError),
}
