use cinelog::storage::{MockStorageService, S3StorageClient, StorageService};
use uuid::Uuid;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let filename = "trailer.mp4";
        let result = mock.get_presigned_upload_url(filename, "video/mp4").await;
        assert!(result.is_ok());

        let url = result.unwrap();

        assert!(url.contains("signature=fake"));
        assert!(url.contains(filename));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock.get_presigned_upload_url("poster.jpg", "image/jpeg").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        let result = mock
            .get_presigned_upload_url("../../etc/passwd", "text/plain")
            .await;
        assert!(result.is_ok());

        let url = result.unwrap();

        // The sanitized key is embedded in the URL; traversal segments are gone.
        assert!(!url.contains(".."));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_client_creation() {
        let _client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "access_key",
            "secret_key",
            "cinelog-test",
        )
        .await;
        // Construction must not panic.
    }

    #[tokio::test]
    async fn test_s3_presigned_url_format() {
        // Presigning is a local signature computation; no bucket is contacted.
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "access_key",
            "secret_key",
            "cinelog-test",
        )
        .await;

        let key = format!("uploads/poster-{}.jpg", Uuid::new_v4());
        let result = client.get_presigned_upload_url(&key, "image/jpeg").await;

        assert!(result.is_ok());

        let url = result.unwrap();

        assert!(url.contains("localhost:9000"));
        assert!(url.contains(&key));
    }
}
