use super::TransmissionRecord;
use anyhow::Result;
use csv::Writer;
use std::fs::File;
use std::path::Path;

pub struct RecordLogger {
    writer: Writer<File>,
}

impl RecordLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log(&mut self, record: &TransmissionRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn log_batch(&mut self, records: &[TransmissionRecord]) -> Result<()> {
        for record in records {
            self.writer.serialize(record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
