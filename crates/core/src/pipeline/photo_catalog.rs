use crate::shared::photo::PhotoRecord;

/// Domain interface for looking up the photos of one capture session.
///
/// Returns records in catalog order. Errors are classified by message into
/// transient (retried) and unknown failures.
pub trait PhotoCatalog: Send + Sync {
    fn photos(
        &self,
        session_id: &str,
    ) -> Result<Vec<PhotoRecord>, Box<dyn std::error::Error + Send + Sync>>;
}
