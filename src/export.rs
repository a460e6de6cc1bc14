//! Persistence bridge: flatten a view's annotations, upload the result, and
//! write the outcome back onto the submission.
//!
//! The bridge itself holds no storage. Image bytes go to an [`Uploader`]
//! collaborator; the annotation document and status land on the
//! [`Submission`] the caller owns and persists.

use std::{
    cell::RefCell,
    collections::HashSet,
    io::Cursor,
    path::PathBuf,
};

use crate::{
    core::View,
    error::{OralmarkError, OralmarkResult},
    model::AnnotationRecord,
    render::Frame,
    submission::Submission,
};

/// Folder tag prefix for exported view images; the view name is appended.
pub const ANNOTATED_FOLDER_PREFIX: &str = "annotated";
/// Folder tag for generated report assets.
pub const REPORTS_FOLDER: &str = "reports";

pub fn annotated_folder(view: View) -> String {
    format!("{ANNOTATED_FOLDER_PREFIX}/{view}")
}

/// Upload failures, split by whether retrying the same call can help.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("transient upload failure: {0}")]
    Transient(String),
    #[error("permanent upload failure: {0}")]
    Permanent(String),
}

impl UploadError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<UploadError> for OralmarkError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Transient(msg) => OralmarkError::UploadTransient(msg),
            UploadError::Permanent(msg) => OralmarkError::UploadPermanent(msg),
        }
    }
}

/// Stores opaque bytes under a folder tag and returns a durable reference.
///
/// Implementations decide what the reference looks like (a URL, a path);
/// the bridge only threads it through to the submission.
pub trait Uploader {
    fn upload(&self, bytes: &[u8], folder: &str) -> Result<String, UploadError>;
}

/// What a completed view export produced: the durable reference to the
/// flattened image and the wire-format document that now lives on the
/// submission.
#[derive(Clone, Debug)]
pub struct ExportOutcome {
    pub reference: String,
    pub document: String,
}

/// Runs exports against an upload collaborator.
///
/// At most one export per (submission, view) pair may be under way; a
/// second request for the same pair while the first is still inside the
/// upload is rejected with [`OralmarkError::ExportInFlight`]. Distinct
/// views and distinct submissions are independent.
#[derive(Debug, Default)]
pub struct ExportBridge {
    in_flight: RefCell<HashSet<(String, View)>>,
}

struct Ticket<'a> {
    bridge: &'a ExportBridge,
    key: (String, View),
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        self.bridge.in_flight.borrow_mut().remove(&self.key);
    }
}

impl ExportBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, submission_id: &str, view: View) -> bool {
        self.in_flight
            .borrow()
            .contains(&(submission_id.to_string(), view))
    }

    fn claim(&self, submission_id: &str, view: View) -> OralmarkResult<Ticket<'_>> {
        let key = (submission_id.to_string(), view);
        if !self.in_flight.borrow_mut().insert(key.clone()) {
            return Err(OralmarkError::export_in_flight(format!(
                "{submission_id}/{view}"
            )));
        }
        Ok(Ticket { bridge: self, key })
    }

    /// Export one view: serialize its records, encode the flattened frame
    /// as PNG, upload it under `annotated/{view}`, then write the records
    /// and the returned reference onto the submission and mark it
    /// `annotated`. Any failure before the write-back leaves the
    /// submission exactly as it was.
    #[tracing::instrument(skip(self, uploader, submission, records, frame))]
    pub fn export_view(
        &self,
        uploader: &dyn Uploader,
        submission: &mut Submission,
        view: View,
        records: &[AnnotationRecord],
        frame: &Frame,
    ) -> OralmarkResult<ExportOutcome> {
        let _ticket = self.claim(&submission.id, view)?;

        for record in records {
            record.validate()?;
        }
        let document = serde_json::to_string(records)
            .map_err(|err| OralmarkError::serde(format!("serialize annotation records: {err}")))?;
        let png = encode_png(frame)?;
        let reference = uploader
            .upload(&png, &annotated_folder(view))
            .map_err(OralmarkError::from)?;

        submission.record_export(view, records.to_vec(), reference.clone());
        Ok(ExportOutcome {
            reference,
            document,
        })
    }

    /// Upload report bytes under `reports` and record the reference,
    /// moving the submission to `reported`. Refused while the submission
    /// has no annotated view yet.
    #[tracing::instrument(skip(self, uploader, submission, report_bytes))]
    pub fn export_report(
        &self,
        uploader: &dyn Uploader,
        submission: &mut Submission,
        report_bytes: &[u8],
    ) -> OralmarkResult<String> {
        submission.ensure_reportable()?;
        let reference = uploader
            .upload(report_bytes, REPORTS_FOLDER)
            .map_err(OralmarkError::from)?;
        submission.record_report(reference.clone())?;
        Ok(reference)
    }
}

/// Encode a rendered frame as PNG bytes in memory.
pub fn encode_png(frame: &Frame) -> OralmarkResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| OralmarkError::render("frame buffer does not match its dimensions"))?;
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|err| OralmarkError::render(format!("encode png: {err}")))?;
    Ok(buf)
}

/// Filesystem-backed [`Uploader`] for the CLI and tests. Bytes land under
/// `root/<folder>/<content-hash>.<ext>` and the reference is that path.
#[derive(Clone, Debug)]
pub struct FsUploader {
    root: PathBuf,
}

impl FsUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Uploader for FsUploader {
    fn upload(&self, bytes: &[u8], folder: &str) -> Result<String, UploadError> {
        let dir = self.root.join(folder);
        std::fs::create_dir_all(&dir)
            .map_err(|err| UploadError::Transient(format!("create '{}': {err}", dir.display())))?;

        let ext = if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            "png"
        } else {
            "bin"
        };
        let path = dir.join(format!("{:016x}.{ext}", fnv1a64(bytes)));
        std::fs::write(&path, bytes)
            .map_err(|err| UploadError::Transient(format!("write '{}': {err}", path.display())))?;
        Ok(path.display().to_string())
    }
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut h = 0xcbf29ce484222325u64;
    for &b in bytes {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}
