use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while reading, writing or scanning a tileset.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML: {0}")]
    Xml(#[from] xml::reader::Error),

    #[error("failed to emit XML: {0}")]
    XmlWrite(#[from] xml::writer::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("expected a <tileset> root element, found <{0}>")]
    UnexpectedRoot(String),

    #[error("document ended inside <{0}>")]
    UnexpectedEnd(&'static str),

    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("<{element}> has invalid `{attribute}` value {value:?}")]
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },

    #[error("tile id {0} is defined more than once")]
    DuplicateTileId(u32),

    #[error("tile {0} has no <image>")]
    MissingImage(u32),

    #[error("tile {0} has more than one <image>")]
    MultipleImages(u32),

    #[error("no tile ids left: id 4294967295 is already in use")]
    IdSpaceExhausted,

    #[error("unsupported tileset feature: {0}")]
    Unsupported(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn invalid(element: &'static str, attribute: &'static str, value: &str) -> Self {
        Error::InvalidAttribute { element, attribute, value: value.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
