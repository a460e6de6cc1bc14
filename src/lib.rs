#![forbid(unsafe_code)]

pub mod assets;
pub mod core;
pub mod error;
pub mod export;
pub mod model;
pub mod render;
pub mod session;
pub mod store;
pub mod submission;

pub use assets::{BaseImage, decode_base_image};
pub use core::{CLINICAL_PALETTE, Color, PaletteEntry, Point, Surface, View};
pub use error::{OralmarkError, OralmarkResult};
pub use export::{
    ExportBridge, ExportOutcome, FsUploader, UploadError, Uploader, annotated_folder, encode_png,
};
pub use model::{AnnotationRecord, ArrowRecord, CircleRecord, PenRecord, RectangleRecord, Tool};
pub use render::{Frame, LiveCanvas, render};
pub use session::{DrawingSession, LivePaint, SessionState};
pub use store::ViewAnnotations;
pub use submission::{Status, Submission};
