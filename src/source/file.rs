use crate::core::{
    DEFAULT_ENVELOPE, DEFAULT_ID_FIELD, PipelineError, Record, RecordStream, Result, Source,
};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::LinesStream;

/// Reads a file holding a single JSON array of records.
pub struct JsonArraySource {
    file_path: String,
    id_field: String,
    envelope: Option<String>,
}

impl JsonArraySource {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().into_owned(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            envelope: Some(DEFAULT_ENVELOPE.to_string()),
        }
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn with_envelope(mut self, envelope: Option<String>) -> Self {
        self.envelope = envelope;
        self
    }
}

#[async_trait]
impl Source for JsonArraySource {
    async fn read(&self) -> Result<RecordStream> {
        let contents = tokio::fs::read(&self.file_path).await?;
        let items = match serde_json::from_slice::<Value>(&contents)? {
            Value::Array(items) => items,
            _ => {
                return Err(PipelineError::Schema(format!(
                    "{} does not hold a JSON array",
                    self.file_path
                )));
            }
        };

        let id_field = self.id_field.clone();
        let envelope = self.envelope.clone();
        let stream = stream::iter(items)
            .map(move |value| Record::from_value(value, &id_field, envelope.as_deref()));

        Ok(Box::pin(stream))
    }
}

/// Reads one JSON record per line.
pub struct JsonLinesSource {
    file_path: String,
    id_field: String,
    envelope: Option<String>,
}

impl JsonLinesSource {
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().into_owned(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            envelope: Some(DEFAULT_ENVELOPE.to_string()),
        }
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn with_envelope(mut self, envelope: Option<String>) -> Self {
        self.envelope = envelope;
        self
    }
}

#[async_trait]
impl Source for JsonLinesSource {
    async fn read(&self) -> Result<RecordStream> {
        let file = File::open(&self.file_path).await?;
        let reader = BufReader::new(file);
        let lines = LinesStream::new(reader.lines());

        let id_field = self.id_field.clone();
        let envelope = self.envelope.clone();
        let stream = lines.filter_map(move |line_result| {
            let id_field = id_field.clone();
            let envelope = envelope.clone();
            async move {
                match line_result {
                    Ok(line) => {
                        if line.trim().is_empty() {
                            return None;
                        }
                        match serde_json::from_str::<Value>(&line) {
                            Ok(value) => {
                                Some(Record::from_value(value, &id_field, envelope.as_deref()))
                            }
                            Err(e) => Some(Err(PipelineError::Serialization(e))),
                        }
                    }
                    Err(e) => Some(Err(PipelineError::Io(e))),
                }
            }
        });

        Ok(Box::pin(stream))
    }
}
