//! Errors that stop the server from starting or serving.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Gateway(#[from] coach_sheets::error::GatewayError),

    #[error("Env Variable '{0}' missing")]
    MissingEnv(&'static str),

    #[error("Invalid value for '{name}': {value}")]
    InvalidEnv { name: &'static str, value: String },
}
