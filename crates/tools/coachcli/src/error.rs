#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Models(#[from] coach_models::error::Error),

    #[error(transparent)]
    Web(#[from] coach_web::error::Error),
}

pub type Result<T> = core::result::Result<T, Error>;
