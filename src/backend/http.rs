use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{AnalysisRequest, BackendDiagnosis, BackendError, DiagnosisBackend};

/// HTTP client for a diagnosis service. The same client shape serves
/// the remote primary and a locally-reachable fallback; only base URL
/// and timeout differ.
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a backend client for `base_url` with a per-request
    /// timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl DiagnosisBackend for HttpBackend {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<BackendDiagnosis, BackendError> {
        let url = format!("{}/analyze", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    BackendError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    BackendError::Timeout(self.timeout.as_secs())
                } else {
                    BackendError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<BackendDiagnosis>()
            .await
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))
    }
}

/// Mock backend for testing — returns a configured result and counts
/// calls, so routing tests can assert which backends were attempted.
pub struct MockBackend {
    result: Result<BackendDiagnosis, BackendError>,
    calls: AtomicUsize,
}

impl MockBackend {
    /// A mock that succeeds with `diagnosis`.
    pub fn responding(diagnosis: BackendDiagnosis) -> Self {
        Self {
            result: Ok(diagnosis),
            calls: AtomicUsize::new(0),
        }
    }

    /// A mock that fails with `error`.
    pub fn failing(error: BackendError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `analyze` was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DiagnosisBackend for MockBackend {
    async fn analyze(&self, _request: &AnalysisRequest) -> Result<BackendDiagnosis, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(10));
        assert_eq!(backend.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_connection_error() {
        // Nothing listens on this port; connect should fail fast.
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2));
        let request = AnalysisRequest {
            patient_id: None,
            symptoms: vec!["fever".into()],
            vital_signs: None,
            patient_age: 30,
            patient_gender: crate::models::enums::Gender::Male,
            patient_weight: None,
            language: Default::default(),
        };

        let err = backend.analyze(&request).await.unwrap_err();
        assert!(err.is_transport(), "expected transport error, got: {err}");
    }

    #[tokio::test]
    async fn mock_counts_calls() {
        let mock = MockBackend::responding(BackendDiagnosis {
            primary_diagnosis: "Acute febrile illness (likely viral)".into(),
            ..Default::default()
        });
        let request = AnalysisRequest {
            patient_id: None,
            symptoms: vec!["fever".into()],
            vital_signs: None,
            patient_age: 30,
            patient_gender: crate::models::enums::Gender::Male,
            patient_weight: None,
            language: Default::default(),
        };

        assert_eq!(mock.calls(), 0);
        let result = mock.analyze(&request).await.unwrap();
        assert_eq!(result.primary_diagnosis, "Acute febrile illness (likely viral)");
        mock.analyze(&request).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn failing_mock_returns_configured_error() {
        let mock = MockBackend::failing(BackendError::Http {
            status: 500,
            body: "boom".into(),
        });
        let request = AnalysisRequest {
            patient_id: None,
            symptoms: vec!["fever".into()],
            vital_signs: None,
            patient_age: 30,
            patient_gender: crate::models::enums::Gender::Male,
            patient_weight: None,
            language: Default::default(),
        };

        let err = mock.analyze(&request).await.unwrap_err();
        assert!(matches!(err, BackendError::Http { status: 500, .. }));
    }
}
