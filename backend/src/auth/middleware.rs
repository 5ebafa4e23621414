use super::credentials::{AdmissionError, Credentials, admit};
use actix_web::{
    Error, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::{Ready, ok};
use shared::ApiResponse;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Admission filter wrapped around every protected resource.
#[derive(Clone)]
pub struct CredentialGate {
    credentials: Arc<Credentials>,
}

impl CredentialGate {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CredentialGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<actix_web::body::EitherBody<B>>;
    type Error = Error;
    type Transform = CredentialGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CredentialGateService {
            service: Arc::new(service),
            credentials: self.credentials.clone(),
        })
    }
}

pub struct CredentialGateService<S> {
    service: Arc<S>,
    credentials: Arc<Credentials>,
}

fn rejection(error: &AdmissionError) -> HttpResponse {
    HttpResponse::build(error.status()).json(ApiResponse::<()>::fail(error.to_string()))
}

impl<S, B> Service<ServiceRequest> for CredentialGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<actix_web::body::EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let credentials = self.credentials.clone();

        Box::pin(async move {
            match admit(req.headers(), &credentials) {
                Ok(()) => {
                    log::debug!("Request admitted for path: {}", req.path());
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(admission_error) => {
                    log::warn!("Rejected request for path {}: {}", req.path(), admission_error);

                    let (http_req, _payload) = req.into_parts();
                    let response = rejection(&admission_error).map_into_right_body();
                    Ok(ServiceResponse::new(http_req, response))
                }
            }
        })
    }
}
