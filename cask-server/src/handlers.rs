//! HTTP request handlers: routing, authentication, and the bucket/object
//! endpoints

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{body::Incoming, header, Method, Request, Response, StatusCode};
use serde_json::json;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::io::Read as _;
use tracing::{debug, error, info};

use cask_core::*;
use cask_engine::Store;

type BoxBody = Full<Bytes>;

/// Caller-supplied headers with this prefix are persisted with the object's
/// metadata and echoed back on read.
pub const CUSTOM_HEADER_PREFIX: &str = "x-cask-";

/// Per-process service state, passed explicitly into every handler.
#[derive(Clone)]
pub struct Context {
    pub store: Store,
    pub api_token: Option<String>,
}

/// Main request handler
pub async fn handle_request(
    req: Request<Incoming>,
    ctx: Context,
) -> std::result::Result<Response<BoxBody>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("Handling {} {}", method, path);

    let response = match route(req, &ctx).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    };

    info!("{} {} -> {}", method, path, response.status());
    Ok(response)
}

async fn route(req: Request<Incoming>, ctx: &Context) -> cask_core::Result<Response<BoxBody>> {
    authenticate(&req, ctx.api_token.as_deref())?;

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let next = query_param(req.uri().query(), "next").map(str::to_string);

    let (bucket_raw, object_raw) = split_path(&path);
    let object_raw = object_raw.map(str::to_string);

    // A first segment that is not a well-formed bucket name routes nowhere,
    // the same as an unmatched URL.
    let Ok(bucket) = BucketName::new(bucket_raw) else {
        return Ok(not_found());
    };

    match (method, object_raw) {
        (Method::GET, None) => list_bucket(ctx, &bucket, next.as_deref()),
        (Method::PUT, None) => {
            ctx.store.create_bucket(&bucket)?;
            Ok(empty_json())
        }
        (Method::DELETE, None) => {
            ctx.store.delete_bucket(&bucket)?;
            Ok(empty_json())
        }
        (Method::GET, Some(object)) => get_object(ctx, &bucket, &object, true),
        (Method::HEAD, Some(object)) => get_object(ctx, &bucket, &object, false),
        (Method::PUT, Some(object)) => put_object(req, ctx, &bucket, &object).await,
        (Method::DELETE, Some(object)) => delete_object(ctx, &bucket, &object),
        _ => Ok(not_found()),
    }
}

/// Split a request path into the bucket segment and the (possibly
/// slash-containing) object remainder.
fn split_path(path: &str) -> (&str, Option<&str>) {
    let trimmed = path.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((bucket, object)) => (bucket, Some(object)),
        None => (trimmed, None),
    }
}

/// Reject the request before any core operation when a token is configured
/// and the request's credential does not match.
fn authenticate<B>(req: &Request<B>, api_token: Option<&str>) -> cask_core::Result<()> {
    let Some(token) = api_token else {
        return Ok(());
    };

    let expected = format!("token {}", token);
    let supplied = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if supplied == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(CaskError::Unauthorized)
    }
}

/// GET /<bucket> — one page of the bucket listing; a Link header carries
/// the continuation iff unread objects remain.
fn list_bucket(
    ctx: &Context,
    bucket: &BucketName,
    next: Option<&str>,
) -> cask_core::Result<Response<BoxBody>> {
    let (records, cursor) = ctx.store.list_bucket(bucket, next)?;
    let body = serde_json::to_vec(&records)?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(cursor) = cursor {
        builder = builder.header(
            header::LINK,
            format!("</{}?next={}>; rel=next", bucket, cursor),
        );
    }

    builder
        .body(Full::new(Bytes::from(body)))
        .map_err(|e| CaskError::Storage(e.to_string()))
}

/// GET/HEAD /<bucket>/<object> — body plus stored headers, or headers only.
fn get_object(
    ctx: &Context,
    bucket: &BucketName,
    object: &str,
    with_body: bool,
) -> cask_core::Result<Response<BoxBody>> {
    let Ok(name) = ObjectName::new(object) else {
        return Ok(not_found());
    };

    if with_body {
        let (mut file, headers) = ctx.store.get_object(bucket, &name)?;
        let mut body = Vec::new();
        file.read_to_end(&mut body)?;
        response_with_headers(&headers, Bytes::from(body))
    } else {
        let headers = ctx.store.head_object(bucket, &name)?;
        response_with_headers(&headers, Bytes::new())
    }
}

/// PUT /<bucket>/<object> — stream the body to the shard path, then record
/// the metadata.
async fn put_object(
    req: Request<Incoming>,
    ctx: &Context,
    bucket: &BucketName,
    object: &str,
) -> cask_core::Result<Response<BoxBody>> {
    let Ok(name) = ObjectName::new(object) else {
        return Ok(not_found());
    };

    let mut supplied = BTreeMap::new();
    if let Some(value) = header_str(&req, header::CONTENT_TYPE.as_str()) {
        supplied.insert("Content-Type".to_string(), value.to_string());
    }
    if let Some(value) = header_str(&req, header::CONTENT_ENCODING.as_str()) {
        supplied.insert("Content-Encoding".to_string(), value.to_string());
    }
    for (header_name, value) in req.headers() {
        if header_name.as_str().starts_with(CUSTOM_HEADER_PREFIX) {
            if let Ok(value) = value.to_str() {
                supplied.insert(canonical_header_name(header_name.as_str()), value.to_string());
            }
        }
    }

    let body = req
        .collect()
        .await
        .map_err(|e| CaskError::Storage(e.to_string()))?
        .to_bytes();

    ctx.store
        .put_object(bucket, &name, &mut body.as_ref(), supplied)?;

    Ok(empty_json())
}

/// DELETE /<bucket>/<object> — remove the metadata rows and the blob.
fn delete_object(
    ctx: &Context,
    bucket: &BucketName,
    object: &str,
) -> cask_core::Result<Response<BoxBody>> {
    let Ok(name) = ObjectName::new(object) else {
        return Ok(not_found());
    };
    ctx.store.delete_object(bucket, &name)?;
    Ok(empty_json())
}

fn header_str<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Restore canonical capitalization for a lowercased wire header name,
/// e.g. `x-cask-owner` -> `X-Cask-Owner`.
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then_some(value)
    })
}

fn response_with_headers(
    headers: &BTreeMap<String, String>,
    body: Bytes,
) -> cask_core::Result<Response<BoxBody>> {
    let mut builder = Response::builder().status(StatusCode::OK);
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(Full::new(body))
        .map_err(|e| CaskError::Storage(e.to_string()))
}

fn empty_json() -> Response<BoxBody> {
    json_response(StatusCode::OK, "{}".to_string())
}

fn not_found() -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        json!({"error": "Not found"}).to_string(),
    )
}

fn json_response(status: StatusCode, body: String) -> Response<BoxBody> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

fn error_response(err: &CaskError) -> Response<BoxBody> {
    let status = match err {
        CaskError::BucketNotFound(_) | CaskError::ObjectNotFound { .. } => StatusCode::NOT_FOUND,
        CaskError::Unauthorized => StatusCode::UNAUTHORIZED,
        CaskError::InvalidCursor
        | CaskError::InvalidBucketName(_)
        | CaskError::InvalidObjectName(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", err);
    }

    json_response(status, json!({"error": err.to_string()}).to_string())
}
