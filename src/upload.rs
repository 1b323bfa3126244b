use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempPath;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("`{0}` is not a PDF file")]
    NotPdf(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("dropped file `{0}` has neither a path nor contents")]
    Empty(String),
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        ensure_pdf(&name)?;

        let bytes = fs::read(path).map_err(|source| UploadError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { name, bytes })
    }

    pub fn from_dropped(file: &egui::DroppedFile) -> Result<Self, UploadError> {
        if let Some(path) = &file.path {
            return Self::from_path(path);
        }

        let Some(bytes) = &file.bytes else {
            return Err(UploadError::Empty(file.name.clone()));
        };
        ensure_pdf(&file.name)?;
        Ok(Self {
            name: file.name.clone(),
            bytes: bytes.to_vec(),
        })
    }

    pub fn stage(&self) -> io::Result<TempPath> {
        let file = tempfile::Builder::new()
            .prefix("pdf-assistant-")
            .suffix(".pdf")
            .tempfile()?;
        fs::write(file.path(), &self.bytes)?;
        Ok(file.into_temp_path())
    }
}

fn ensure_pdf(name: &str) -> Result<(), UploadError> {
    let is_pdf = Path::new(name)
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Ok(())
    } else {
        Err(UploadError::NotPdf(name.to_string()))
    }
}
