use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    image_processing::ImageProcessor,
    models::{DetectionResult, NewDetection, Severity},
    repositories::DetectionStore,
    services::{AdvisoryGenerator, Classifier, FALLBACK_ADVISORY},
    storage::Storage,
};
use tracing::{info, warn};

/// One detection request: the uploaded image plus its metadata
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub image: Vec<u8>,
    pub filename: String,
    /// Language the advisory should be written in
    pub language: String,
}

/// Orchestrates one pest detection cycle end to end: ingest the image, call
/// the classifier, generate the advisory, persist the result.
///
/// All collaborators are injected capabilities, so a test can substitute any
/// boundary without process-wide state.
pub struct DetectionService {
    processor: ImageProcessor,
    storage: Arc<dyn Storage>,
    classifier: Arc<dyn Classifier>,
    advisor: Arc<dyn AdvisoryGenerator>,
    store: Arc<dyn DetectionStore>,
}

impl std::fmt::Debug for DetectionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionService")
            .field("processor", &self.processor)
            .finish()
    }
}

/// Bring a service-defined confidence onto the percent scale.
///
/// Classifier deployments report either a fraction in [0,1] or a percent in
/// [0,100]; values at or below 1.0 are treated as fractions. Stored with
/// centi-percent precision, so a fraction like 0.92 lands on exactly 92.0.
pub fn normalize_confidence(raw: f64) -> f64 {
    let pct = if raw <= 1.0 { raw * 100.0 } else { raw };
    let pct = pct.clamp(0.0, 100.0);
    (pct * 100.0).round() / 100.0
}

impl DetectionService {
    pub fn new(
        processor: ImageProcessor,
        storage: Arc<dyn Storage>,
        classifier: Arc<dyn Classifier>,
        advisor: Arc<dyn AdvisoryGenerator>,
        store: Arc<dyn DetectionStore>,
    ) -> Self {
        Self {
            processor,
            storage,
            classifier,
            advisor,
            store,
        }
    }

    /// Run one full detection cycle.
    ///
    /// Ordering is deliberate: nothing is persisted until classification
    /// succeeds, but a failed advisory never aborts the request, since that
    /// would waste a successful classification.
    pub async fn detect(&self, request: DetectionRequest) -> AppResult<DetectionResult> {
        // 1. Validate and ingest; rejection happens before any external call
        let processed = self
            .processor
            .process_image(&request.image, &request.filename)
            .await?;

        let image_ref = format!("{}.{}", processed.sha256, processed.info.extension);
        self.storage.store(&image_ref, &request.image).await?;

        // 2. Classification, bounded by the client timeout. Nothing
        //    meaningful to store on failure, so the artifact goes too.
        let classification = match self
            .classifier
            .classify(
                &request.image,
                &processed.info.filename,
                &processed.info.mime_type,
            )
            .await
        {
            Ok(classification) => classification,
            Err(e) => {
                self.discard_artifact(&image_ref).await;
                return Err(e);
            }
        };

        if classification.label.trim().is_empty() {
            self.discard_artifact(&image_ref).await;
            return Err(AppError::classification("classifier returned an empty label"));
        }

        let confidence = normalize_confidence(classification.confidence);
        let severity = Severity::from_confidence(confidence);

        // 3. Advisory is best-effort; degrade to the sentinel
        let advisory_text = match self
            .advisor
            .generate_advisory(&classification.label, confidence, &request.language)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("advisory generation failed, using fallback: {}", e);
                FALLBACK_ADVISORY.to_string()
            }
        };

        // 4-5. Assemble and persist; a lost record is a hard error
        let detection = NewDetection {
            image_ref: image_ref.clone(),
            pest_label: classification.label,
            confidence,
            severity,
            advisory_text,
            language: request.language,
        };

        match self.store.save(detection).await {
            Ok(result) => {
                info!(
                    "detection persisted: {} {} ({:.1}%)",
                    result.id, result.pest_label, result.confidence
                );
                Ok(result)
            }
            Err(e) => {
                self.discard_artifact(&image_ref).await;
                Err(e)
            }
        }
    }

    /// Prior detections, newest first
    pub async fn history(&self) -> AppResult<Vec<DetectionResult>> {
        self.store.list_all().await
    }

    /// Remove a stored image once the pipeline has failed; without a
    /// persisted record nothing references it.
    async fn discard_artifact(&self, image_ref: &str) {
        if let Err(e) = self.storage.delete(image_ref).await {
            warn!("failed to remove orphaned image {}: {}", image_ref, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::ImageProcessingConfig;
    use crate::services::Classification;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    // Valid JPEG magic bytes, enough for `infer`
    const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

    struct StubClassifier {
        result: AppResult<Classification>,
        calls: AtomicUsize,
    }

    impl StubClassifier {
        fn ok(label: &str, confidence: f64) -> Self {
            Self {
                result: Ok(Classification {
                    label: label.to_string(),
                    confidence,
                }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err(AppError::classification("connection refused")),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Classifier for StubClassifier {
        async fn classify(
            &self,
            _image: &[u8],
            _filename: &str,
            _mime_type: &str,
        ) -> AppResult<Classification> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(c) => Ok(c.clone()),
                Err(_) => Err(AppError::classification("connection refused")),
            }
        }
    }

    struct StubAdvisor {
        text: Option<String>,
    }

    #[async_trait::async_trait]
    impl AdvisoryGenerator for StubAdvisor {
        async fn generate_advisory(
            &self,
            _label: &str,
            _confidence_pct: f64,
            _language: &str,
        ) -> AppResult<String> {
            match &self.text {
                Some(text) => Ok(text.clone()),
                None => Err(AppError::advisory("simulated network error")),
            }
        }
    }

    /// In-memory store mirroring the repository contract
    struct MemoryStore {
        records: Mutex<Vec<DetectionResult>>,
        fail: bool,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl DetectionStore for MemoryStore {
        async fn save(&self, detection: NewDetection) -> AppResult<DetectionResult> {
            if self.fail {
                return Err(AppError::storage("simulated storage outage"));
            }
            let result = DetectionResult {
                id: Uuid::new_v4(),
                image_ref: detection.image_ref,
                pest_label: detection.pest_label,
                confidence: detection.confidence,
                severity: detection.severity,
                advisory_text: detection.advisory_text,
                language: detection.language,
                created_at: chrono::Utc::now(),
            };
            self.records.lock().unwrap().push(result.clone());
            Ok(result)
        }

        async fn list_all(&self) -> AppResult<Vec<DetectionResult>> {
            let mut records = self.records.lock().unwrap().clone();
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
            Ok(records)
        }
    }

    /// In-memory storage tracking stored keys
    struct MemoryStorage {
        objects: Mutex<Vec<String>>,
    }

    impl MemoryStorage {
        fn new() -> Self {
            Self {
                objects: Mutex::new(Vec::new()),
            }
        }

        fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Storage for MemoryStorage {
        async fn store(&self, key: &str, _data: &[u8]) -> AppResult<()> {
            self.objects.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn load(&self, _key: &str) -> AppResult<Vec<u8>> {
            Ok(Vec::new())
        }

        async fn delete(&self, key: &str) -> AppResult<()> {
            self.objects.lock().unwrap().retain(|k| k != key);
            Ok(())
        }

        async fn exists(&self, key: &str) -> AppResult<bool> {
            Ok(self.objects.lock().unwrap().iter().any(|k| k == key))
        }
    }

    struct Fixture {
        classifier: Arc<StubClassifier>,
        store: Arc<MemoryStore>,
        storage: Arc<MemoryStorage>,
        service: DetectionService,
    }

    fn fixture(
        classifier: StubClassifier,
        advisor: StubAdvisor,
        store: MemoryStore,
    ) -> Fixture {
        let classifier = Arc::new(classifier);
        let store = Arc::new(store);
        let storage = Arc::new(MemoryStorage::new());
        let service = DetectionService::new(
            ImageProcessor::new(ImageProcessingConfig::default()),
            storage.clone(),
            classifier.clone(),
            Arc::new(advisor),
            store.clone(),
        );
        Fixture {
            classifier,
            store,
            storage,
            service,
        }
    }

    fn request() -> DetectionRequest {
        DetectionRequest {
            image: JPEG_BYTES.to_vec(),
            filename: "leaf.jpg".to_string(),
            language: "English".to_string(),
        }
    }

    #[test]
    fn test_normalize_confidence() {
        assert_eq!(normalize_confidence(0.92), 92.0);
        assert_eq!(normalize_confidence(92.0), 92.0);
        assert_eq!(normalize_confidence(1.0), 100.0);
        assert_eq!(normalize_confidence(0.0), 0.0);
        assert_eq!(normalize_confidence(-5.0), 0.0);
        assert_eq!(normalize_confidence(150.0), 100.0);
        assert_eq!(normalize_confidence(0.5), 50.0);
    }

    #[tokio::test]
    async fn test_successful_detection_is_persisted_and_returned() {
        let f = fixture(
            StubClassifier::ok("Aphids", 0.92),
            StubAdvisor {
                text: Some("Spray neem oil weekly.".to_string()),
            },
            MemoryStore::new(),
        );

        let result = f.service.detect(request()).await.unwrap();

        assert_eq!(result.pest_label, "Aphids");
        assert_eq!(result.confidence, 92.0);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.advisory_text, "Spray neem oil weekly.");
        assert!(result.image_ref.ends_with(".jpg"));

        // Read-after-write: the record is retrievable immediately
        let history = f.service.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, result.id);

        // The image artifact is retained and referenced
        assert_eq!(f.storage.keys(), vec![result.image_ref.clone()]);
    }

    #[tokio::test]
    async fn test_advisory_failure_falls_back_and_still_persists() {
        let f = fixture(
            StubClassifier::ok("Aphids", 0.92),
            StubAdvisor { text: None },
            MemoryStore::new(),
        );

        let result = f.service.detect(request()).await.unwrap();

        assert_eq!(result.advisory_text, FALLBACK_ADVISORY);
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn test_classification_failure_persists_nothing() {
        let f = fixture(
            StubClassifier::failing(),
            StubAdvisor {
                text: Some("unused".to_string()),
            },
            MemoryStore::new(),
        );

        let err = f.service.detect(request()).await.unwrap_err();

        assert!(matches!(err, AppError::Classification(_)));
        assert_eq!(f.store.len(), 0);
        // The orphaned artifact was cleaned up
        assert!(f.storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_empty_label_is_a_classification_failure() {
        let f = fixture(
            StubClassifier::ok("   ", 0.92),
            StubAdvisor {
                text: Some("unused".to_string()),
            },
            MemoryStore::new(),
        );

        let err = f.service.detect(request()).await.unwrap_err();
        assert!(matches!(err, AppError::Classification(_)));
        assert_eq!(f.store.len(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_and_removes_artifact() {
        let f = fixture(
            StubClassifier::ok("Aphids", 0.92),
            StubAdvisor {
                text: Some("Spray neem oil weekly.".to_string()),
            },
            MemoryStore::failing(),
        );

        let err = f.service.detect(request()).await.unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert!(f.storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_the_classifier() {
        let f = fixture(
            StubClassifier::ok("Aphids", 0.92),
            StubAdvisor {
                text: Some("unused".to_string()),
            },
            MemoryStore::new(),
        );

        let err = f
            .service
            .detect(DetectionRequest {
                image: Vec::new(),
                filename: "leaf.jpg".to_string(),
                language: "English".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.classifier.call_count(), 0);
        assert_eq!(f.store.len(), 0);
        assert!(f.storage.keys().is_empty());
    }

    #[tokio::test]
    async fn test_percent_scale_confidence_is_not_rescaled() {
        let f = fixture(
            StubClassifier::ok("Leaf Miner", 47.0),
            StubAdvisor {
                text: Some("Remove affected leaves.".to_string()),
            },
            MemoryStore::new(),
        );

        let result = f.service.detect(request()).await.unwrap();
        assert_eq!(result.confidence, 47.0);
        assert_eq!(result.severity, Severity::Medium);
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let store = MemoryStore::new();
        for i in 0..3 {
            store
                .save(NewDetection {
                    image_ref: format!("{}.jpg", i),
                    pest_label: "Aphids".to_string(),
                    confidence: 92.0,
                    severity: Severity::High,
                    advisory_text: "advice".to_string(),
                    language: "English".to_string(),
                })
                .await
                .unwrap();
            // keep created_at strictly increasing across saves
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let history = store.list_all().await.unwrap();
        assert_eq!(history.len(), 3);
        for pair in history.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
        assert_eq!(history[0].image_ref, "2.jpg");
    }
}
