use std::error::Error;
use std::path::PathBuf;

use pcd_core::pointcloud::point::PointCloud;

pub mod e57;
pub mod xyz;

pub trait ParserProvider {
    fn get_parser(&self) -> Box<dyn Parser>;
}

pub trait Parser {
    fn parse(&self) -> Result<PointCloud, Box<dyn Error>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Xyz,
    Txt,
    Csv,
    E57,
}

pub fn get_extension(extension: &str) -> Result<Extension, ParseError> {
    match extension.to_lowercase().as_str() {
        "xyz" => Ok(Extension::Xyz),
        "txt" => Ok(Extension::Txt),
        "csv" => Ok(Extension::Csv),
        "e57" => Ok(Extension::E57),
        _ => Err(ParseError::UnsupportedExtension(extension.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported file extension '{0}'")]
    UnsupportedExtension(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("failed to read scan archive {}: {source}", .path.display())]
    ScanArchive {
        path: PathBuf,
        #[source]
        source: ::e57::Error,
    },
}
