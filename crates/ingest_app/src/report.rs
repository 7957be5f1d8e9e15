use ingest_core::Attachment;
use ingest_engine::SkippedFile;
use serde::Serialize;

/// One emitted attachment as printed on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentReport {
    pub id: String,
    pub kind: &'static str,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedReport {
    pub path: String,
    pub reason: String,
}

impl AttachmentReport {
    pub fn new(attachment: &Attachment, skipped: &[SkippedFile]) -> Self {
        let fingerprint = match attachment {
            Attachment::TextBundle(bundle) => Some(bundle.fingerprint()),
            _ => None,
        };
        Self {
            id: attachment.id().to_string(),
            kind: attachment.kind().as_str(),
            title: attachment.title(),
            bytes: attachment.byte_size(),
            fingerprint,
            skipped: skipped
                .iter()
                .map(|file| SkippedReport {
                    path: file.relative_path.clone(),
                    reason: file.error.to_string(),
                })
                .collect(),
        }
    }

    pub fn render(&self, json: bool) -> String {
        if json {
            return serde_json::to_string(self).unwrap_or_else(|err| {
                format!("{{\"id\":\"{}\",\"error\":\"{}\"}}", self.id, err)
            });
        }
        let mut line = format!("{}\t{}\t{}", self.id, self.kind, self.title);
        if let Some(bytes) = self.bytes {
            line.push_str(&format!("\t{bytes} bytes"));
        }
        for skipped in &self.skipped {
            line.push_str(&format!("\n  skipped {}: {}", skipped.path, skipped.reason));
        }
        line
    }
}
