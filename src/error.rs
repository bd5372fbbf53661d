use std::fmt;

#[derive(Debug)]
pub enum LayerFontError {
    InvalidColor(String),
    Xml(String),
    InvalidMetadata(String),
    InvalidConfiguration(String),
    Tool { program: String, message: String },
    Outline(String),
    Io(std::io::Error),
}

impl fmt::Display for LayerFontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerFontError::InvalidColor(value) => write!(f, "invalid color {}", value),
            LayerFontError::Xml(message) => write!(f, "xml error: {}", message),
            LayerFontError::InvalidMetadata(message) => {
                write!(f, "invalid font metadata: {}", message)
            }
            LayerFontError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            LayerFontError::Tool { program, message } => {
                write!(f, "{} failed: {}", program, message)
            }
            LayerFontError::Outline(message) => write!(f, "outline import error: {}", message),
            LayerFontError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for LayerFontError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayerFontError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LayerFontError {
    fn from(value: std::io::Error) -> Self {
        LayerFontError::Io(value)
    }
}

impl From<roxmltree::Error> for LayerFontError {
    fn from(value: roxmltree::Error) -> Self {
        LayerFontError::Xml(value.to_string())
    }
}
