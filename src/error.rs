use thiserror::Error;

/// Failures while fetching or decoding a static asset.
///
/// None of these are fatal for the page: the presenter logs them and leaves
/// the visual slot empty.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to fetch {path}: {message}")]
    Fetch { path: String, message: String },
    #[error("{path} returned HTTP {status}")]
    Status { path: String, status: u16 },
    #[error("{path} is not valid UTF-8")]
    Encoding { path: String },
    #[error("failed to parse {path}: {source:#}")]
    Parse {
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AssetError {
    /// Path of the asset that failed to load.
    pub fn path(&self) -> &str {
        match self {
            Self::Fetch { path, .. }
            | Self::Status { path, .. }
            | Self::Encoding { path }
            | Self::Parse { path, .. }
            | Self::Io { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_asset() {
        let err = AssetError::Status {
            path: "models/board.obj".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "models/board.obj returned HTTP 404");
        assert_eq!(err.path(), "models/board.obj");
    }

    #[test]
    fn parse_error_keeps_context_chain() {
        let source = anyhow::anyhow!("missing vector component").context("invalid vertex on line 3");
        let err = AssetError::Parse {
            path: "board.obj".to_string(),
            source,
        };
        let message = err.to_string();
        assert!(message.contains("invalid vertex on line 3"));
        assert!(message.contains("missing vector component"));
    }
}
