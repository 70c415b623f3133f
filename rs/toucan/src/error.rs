use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, Clone)]
pub enum Error {
	#[error("url error: {0}")]
	Url(#[from] url::ParseError),

	#[error("http error: {0}")]
	Http(Arc<reqwest::Error>),

	#[error("unexpected status: {0}")]
	Status(u16),

	#[error("io error: {0}")]
	Io(Arc<std::io::Error>),

	#[error("runtime error: {0}")]
	Runtime(Arc<std::io::Error>),
}

impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		Error::Http(Arc::new(err))
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Error::Io(Arc::new(err))
	}
}
