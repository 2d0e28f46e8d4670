//! Artifact naming and persistence.
//!
//! Every file a session produces (evidence clips, snapshots, the class
//! recording and the report) is an [`Artifact`] named by an
//! [`ArtifactNamer`] and handed to an [`ArtifactSink`].

use crate::collector::MediaFormat;
use crate::error::ExportError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// What an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// The last few seconds of media before a high-score verdict
    Clip,
    /// A still of the composited surface
    Snapshot,
    /// The whole class session
    Recording,
    /// The end-of-session report
    Report,
}

impl ArtifactKind {
    /// File name prefix for this kind.
    pub fn prefix(self) -> &'static str {
        match self {
            ArtifactKind::Clip => "cheat-evidence",
            ArtifactKind::Snapshot => "cheat-snapshot",
            ArtifactKind::Recording => "class-recording",
            ArtifactKind::Report => "exam-report",
        }
    }
}

/// A named blob ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Issues unique, timestamped file names with a per-kind sequence number.
#[derive(Debug, Default)]
pub struct ArtifactNamer {
    counters: HashMap<ArtifactKind, u32>,
}

impl ArtifactNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next file name for `kind`, e.g.
    /// `cheat-evidence_20240501-093012-250_001.webm`.
    pub fn next_name(&mut self, kind: ArtifactKind, extension: &str, now: DateTime<Utc>) -> String {
        let seq = self.counters.entry(kind).or_insert(0);
        *seq += 1;
        format!(
            "{}_{}_{:03}.{}",
            kind.prefix(),
            now.format("%Y%m%d-%H%M%S-%3f"),
            seq,
            extension
        )
    }

    /// Wrap `bytes` as a named artifact.
    pub fn artifact(
        &mut self,
        kind: ArtifactKind,
        format: MediaFormat,
        bytes: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Artifact {
        Artifact {
            kind,
            file_name: self.next_name(kind, format.extension, now),
            mime: format.mime.to_string(),
            bytes,
            created_at: now,
        }
    }

    /// Number of artifacts of `kind` named so far.
    pub fn issued(&self, kind: ArtifactKind) -> u32 {
        self.counters.get(&kind).copied().unwrap_or(0)
    }
}

/// Destination for finished artifacts.
pub trait ArtifactSink {
    /// Persist an artifact, returning where it went.
    fn write(&mut self, artifact: &Artifact) -> Result<PathBuf, ExportError>;
}

/// Writes artifacts into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct FsArtifactSink {
    dir: PathBuf,
}

impl FsArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for FsArtifactSink {
    fn write(&mut self, artifact: &Artifact) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ExportError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(&artifact.file_name);
        std::fs::write(&path, &artifact.bytes).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            kind = ?artifact.kind,
            path = %path.display(),
            bytes = artifact.bytes.len(),
            "Artifact saved"
        );
        Ok(path)
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemoryArtifactSink {
    pub artifacts: Vec<Artifact>,
}

impl ArtifactSink for MemoryArtifactSink {
    fn write(&mut self, artifact: &Artifact) -> Result<PathBuf, ExportError> {
        self.artifacts.push(artifact.clone());
        Ok(PathBuf::from(&artifact.file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_names_are_sequenced_per_kind() {
        let now = Utc
            .with_ymd_and_hms(2024, 5, 1, 9, 30, 12)
            .unwrap()
            + chrono::Duration::milliseconds(250);
        let mut namer = ArtifactNamer::new();

        assert_eq!(
            namer.next_name(ArtifactKind::Clip, "webm", now),
            "cheat-evidence_20240501-093012-250_001.webm"
        );
        assert_eq!(
            namer.next_name(ArtifactKind::Clip, "webm", now),
            "cheat-evidence_20240501-093012-250_002.webm"
        );
        assert_eq!(
            namer.next_name(ArtifactKind::Snapshot, "png", now),
            "cheat-snapshot_20240501-093012-250_001.png"
        );
        assert_eq!(namer.issued(ArtifactKind::Clip), 2);
        assert_eq!(namer.issued(ArtifactKind::Report), 0);
    }

    #[test]
    fn test_artifact_uses_format() {
        let mut namer = ArtifactNamer::new();
        let artifact = namer.artifact(
            ArtifactKind::Recording,
            MediaFormat::WEBM,
            vec![1, 2, 3],
            Utc::now(),
        );
        assert!(artifact.file_name.starts_with("class-recording_"));
        assert!(artifact.file_name.ends_with("_001.webm"));
        assert_eq!(artifact.mime, "video/webm");
    }

    #[test]
    fn test_fs_sink_writes_file() {
        let dir = std::env::temp_dir().join(format!("focusai-export-{}", uuid::Uuid::new_v4()));
        let mut sink = FsArtifactSink::new(&dir);
        let mut namer = ArtifactNamer::new();
        let artifact = namer.artifact(
            ArtifactKind::Report,
            MediaFormat::JSON,
            b"{}".to_vec(),
            Utc::now(),
        );

        let path = sink.write(&artifact).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
