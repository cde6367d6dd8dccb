//! SpiceDB client for authorization operations.

use crate::error::AuthzError;
use crate::types::{Permission, ResourceType, Subject};
use rootcause::prelude::Report;
use spicedb_client::SpicedbClient;
use spicedb_grpc::authzed::api::v1::{
    Consistency, LookupResourcesRequest, ObjectReference, SubjectReference,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// SpiceDB authorization client wrapper.
///
/// This wrapper handles the lifetime constraints of the underlying SpiceDB client
/// by maintaining a persistent connection that's protected by a mutex.
#[derive(Clone)]
pub struct AuthzClient {
    inner: Arc<Mutex<SpicedbClient>>,
}

impl AuthzClient {
    /// Creates a new authorization client.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - The SpiceDB gRPC endpoint (e.g., "http://localhost:50051")
    /// * `preshared_key` - The preshared key for authentication
    ///
    /// The endpoint and preshared_key are leaked to satisfy the 'static
    /// lifetime requirements of the underlying gRPC client; the client lives
    /// for the duration of the process.
    pub async fn new(endpoint: String, preshared_key: String) -> Result<Self, Report<AuthzError>> {
        let endpoint: &'static str = Box::leak(endpoint.into_boxed_str());
        let preshared_key: &'static str = Box::leak(preshared_key.into_boxed_str());

        let client = SpicedbClient::from_url_and_preshared_key(endpoint, preshared_key)
            .await
            .map_err(|e| AuthzError::ConnectionFailed {
                details: e.to_string(),
            })?;

        Ok(Self {
            inner: Arc::new(Mutex::new(client)),
        })
    }

    /// Looks up resource IDs that a subject has a permission on.
    #[instrument(skip(self), fields(resource_type = %resource_type, permission = %permission))]
    pub async fn lookup_resources(
        &self,
        resource_type: ResourceType,
        permission: Permission,
        subject: &Subject,
    ) -> Result<Vec<String>, Report<AuthzError>> {
        use tokio_stream::StreamExt;

        let request = LookupResourcesRequest {
            resource_object_type: resource_type.as_str().to_string(),
            permission: permission.as_str().to_string(),
            subject: Some(SubjectReference {
                object: Some(ObjectReference {
                    object_type: subject.subject_type.clone(),
                    object_id: subject.id.clone(),
                }),
                optional_relation: String::new(),
            }),
            consistency: Some(Consistency {
                requirement: Some(
                    spicedb_grpc::authzed::api::v1::consistency::Requirement::FullyConsistent(true),
                ),
            }),
            ..Default::default()
        };

        let mut client = self.inner.lock().await;
        let mut response =
            client
                .lookup_resources(request)
                .await
                .map_err(|e| AuthzError::RequestFailed {
                    details: e.to_string(),
                })?;

        // Collect all resource IDs from the streaming response
        let mut ids = Vec::new();
        while let Some(result) = response.next().await {
            match result {
                Ok(r) => ids.push(r.resource_object_id),
                Err(e) => {
                    return Err(AuthzError::RequestFailed {
                        details: e.to_string(),
                    }
                    .into());
                }
            }
        }

        debug!(count = ids.len(), "lookup resources result");
        Ok(ids)
    }
}
