use crate::{
    core::View,
    error::{OralmarkError, OralmarkResult},
    model::AnnotationRecord,
    store::ViewAnnotations,
};

/// Submission lifecycle. Every submission starts `uploaded`; the first
/// successful view export moves it to `annotated`; recording a report
/// moves it to `reported`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Uploaded,
    Annotated,
    Reported,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Uploaded => "uploaded",
            Status::Annotated => "annotated",
            Status::Reported => "reported",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One patient submission: three base images, the annotation document,
/// and the asset references written back by exports. The core reads the
/// base image references and writes annotations, annotated-image
/// references, and status.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub patient_name: String,
    pub patient_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub upper_image_url: String,
    pub front_image_url: String,
    pub bottom_image_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_annotated_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_annotated_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_annotated_image_url: Option<String>,

    #[serde(default)]
    pub annotation_data: ViewAnnotations,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,

    #[serde(default)]
    pub status: Status,
}

impl Submission {
    pub fn base_image_url(&self, view: View) -> &str {
        match view {
            View::Upper => &self.upper_image_url,
            View::Front => &self.front_image_url,
            View::Bottom => &self.bottom_image_url,
        }
    }

    pub fn annotated_image_url(&self, view: View) -> Option<&str> {
        match view {
            View::Upper => self.upper_annotated_image_url.as_deref(),
            View::Front => self.front_annotated_image_url.as_deref(),
            View::Bottom => self.bottom_annotated_image_url.as_deref(),
        }
    }

    /// Apply a completed view export: write that view's records (other
    /// views untouched), store the uploaded asset reference, and mark the
    /// submission `annotated`. A fresh export supersedes any previously
    /// generated report, so the status lands on `annotated` regardless of
    /// where it was.
    pub fn record_export(
        &mut self,
        view: View,
        records: Vec<AnnotationRecord>,
        reference: impl Into<String>,
    ) {
        self.annotation_data.replace_view(view, records);
        let slot = match view {
            View::Upper => &mut self.upper_annotated_image_url,
            View::Front => &mut self.front_annotated_image_url,
            View::Bottom => &mut self.bottom_annotated_image_url,
        };
        *slot = Some(reference.into());
        self.status = Status::Annotated;
    }

    /// Store a generated report reference and mark the submission
    /// `reported`. Requires at least one prior export.
    pub fn record_report(&mut self, reference: impl Into<String>) -> OralmarkResult<()> {
        self.ensure_reportable()?;
        self.report_url = Some(reference.into());
        self.status = Status::Reported;
        Ok(())
    }

    pub(crate) fn ensure_reportable(&self) -> OralmarkResult<()> {
        if self.status == Status::Uploaded {
            return Err(OralmarkError::validation(
                "cannot record a report before any view has been annotated",
            ));
        }
        Ok(())
    }

    pub fn validate(&self) -> OralmarkResult<()> {
        for (field, value) in [
            ("id", &self.id),
            ("patientName", &self.patient_name),
            ("patientId", &self.patient_id),
            ("email", &self.email),
            ("upperImageUrl", &self.upper_image_url),
            ("frontImageUrl", &self.front_image_url),
            ("bottomImageUrl", &self.bottom_image_url),
        ] {
            if value.trim().is_empty() {
                return Err(OralmarkError::validation(format!(
                    "submission field '{field}' must be non-empty"
                )));
            }
        }
        self.annotation_data.validate()
    }
}
