//! HTTP client tests against a loopback server.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use backoffice_lib::BackofficeClient;
use backoffice_lib::api::CollectionApi;
use backoffice_lib::auth::AnonymousTokenProvider;
use backoffice_lib::auth::StaticTokenProvider;
use backoffice_lib::error::ApiError;
use backoffice_lib::error::Error;
use backoffice_lib::manager::CollectionManager;
use backoffice_lib::model::Record;
use backoffice_lib::model::RecordId;
use backoffice_lib::model::catalog;
use backoffice_lib::text::BlogFeed;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::Request;
use hyper::Response;
use hyper::body::Bytes;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use rust_decimal::Decimal;
use tokio::net::TcpListener;

// =============================================================================
// Loopback server
// =============================================================================

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: String,
}

struct Reply {
    status: u16,
    body: String,
    delay: Duration,
}

impl Reply {
    fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Route = Arc<dyn Fn(&str, &str) -> Reply + Send + Sync>;

struct TestServer {
    url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl TestServer {
    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn client(&self) -> BackofficeClient {
        BackofficeClient::builder()
            .url(&self.url)
            .token_provider(StaticTokenProvider::new("secret"))
            .build()
            .unwrap()
    }
}

/// Serves every connection with `route(method, path)` until the test ends.
async fn serve(route: impl Fn(&str, &str) -> Reply + Send + Sync + 'static) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let route: Route = Arc::new(route);

    let log = seen.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let route = route.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let route = route.clone();
                    let log = log.clone();
                    async move {
                        let method = req.method().to_string();
                        let path = req.uri().path().to_string();
                        let header = |name: &str| {
                            req.headers()
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string)
                        };
                        let authorization = header("authorization");
                        let content_type = header("content-type");
                        let bytes = req.into_body().collect().await.unwrap().to_bytes();

                        let reply = route(&method, &path);
                        log.lock().unwrap().push(Seen {
                            method,
                            path,
                            authorization,
                            content_type,
                            body: String::from_utf8_lossy(&bytes).into_owned(),
                        });

                        if !reply.delay.is_zero() {
                            tokio::time::sleep(reply.delay).await;
                        }

                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(reply.status)
                                .header("Content-Type", "application/json")
                                .body(Full::new(Bytes::from(reply.body)))
                                .unwrap(),
                        )
                    }
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    TestServer { url, seen }
}

const PRICES: &str = r#"[
    {"id": 1, "price_name": "A4", "price_description": null, "price_value": 12.5,
     "created_at": "2024-05-01T10:00:00", "updated_at": "2024-05-02T10:00:00Z"},
    {"id": 2, "price_name": "Zarf", "price_description": "Envelope", "price_value": 3,
     "created_at": "2024-04-01T10:00:00", "updated_at": null}
]"#;

// =============================================================================
// Requests
// =============================================================================

#[tokio::test]
async fn test_list_sends_bearer_and_parses_records() {
    let server = serve(|_, _| Reply::json(200, PRICES)).await;

    let records = server.client().list_records("prices").await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id(), Some(RecordId(1)));
    assert_eq!(records[0].get_decimal("price_value").unwrap(), Some(Decimal::new(125, 1)));
    assert!(records[0].get_datetime("created_at").unwrap().is_some());
    assert_eq!(records[1].get_int("price_value").unwrap(), Some(3));

    let seen = server.seen();
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].path, "/prices");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret"));
}

#[tokio::test]
async fn test_anonymous_requests_carry_no_header() {
    let server = serve(|_, _| Reply::json(200, "[]")).await;
    let client = BackofficeClient::builder()
        .url(&server.url)
        .token_provider(AnonymousTokenProvider)
        .build()
        .unwrap();

    client.list_records("sss").await.unwrap();

    assert_eq!(server.seen()[0].authorization, None);
}

#[tokio::test]
async fn test_create_posts_payload_without_id() {
    let server = serve(|_, _| {
        Reply::json(200, r#"{"id": 9, "price_name": "Kraft", "price_value": 4}"#)
    })
    .await;

    let record = Record::with_id(RecordId(5))
        .set("price_name", "Kraft")
        .set("price_value", 4i64);
    let created = server.client().create_record("prices", record).await.unwrap();

    assert_eq!(created.and_then(|r| r.id()), Some(RecordId(9)));
    let seen = server.seen();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/prices");
    assert_eq!(seen[0].content_type.as_deref(), Some("application/json"));

    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body["price_name"], "Kraft");
    assert_eq!(body["price_value"], 4);
    assert!(body.get("id").is_none());
}

#[tokio::test]
async fn test_update_puts_to_record_path() {
    let server = serve(|_, _| Reply::json(200, "")).await;

    let record = Record::new().set("color_name", "Ivory").set("color_code", "#fffff0");
    let echoed = server
        .client()
        .update_record("paper_colors", RecordId(7), record)
        .await
        .unwrap();

    assert_eq!(echoed, None);
    let seen = server.seen();
    assert_eq!(seen[0].method, "PUT");
    assert_eq!(seen[0].path, "/paper_colors/7");
}

#[tokio::test]
async fn test_delete_ignores_body() {
    let server = serve(|_, _| Reply::json(200, r#"{"message": "deleted"}"#)).await;

    server.client().delete_record("sss", RecordId(3)).await.unwrap();

    let seen = server.seen();
    assert_eq!(seen[0].method, "DELETE");
    assert_eq!(seen[0].path, "/sss/3");
    assert_eq!(seen[0].body, "");
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_http_error_uses_detail() {
    let server = serve(|_, _| Reply::json(401, r#"{"detail": "Not authenticated"}"#)).await;

    let err = server.client().list_records("prices").await.unwrap_err();

    match err {
        Error::Api(ApiError::Http { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Not authenticated");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = serve(|_, _| Reply::json(200, "<html>maintenance</html>")).await;

    let err = server.client().list_records("prices").await.unwrap_err();

    assert!(matches!(err, Error::Api(ApiError::Parse { body: Some(_), .. })));
}

#[tokio::test]
async fn test_timeout_is_reported_without_retry() {
    let server =
        serve(|_, _| Reply::json(200, "[]").delayed(Duration::from_millis(500))).await;
    let client = BackofficeClient::builder()
        .url(&server.url)
        .token_provider(StaticTokenProvider::new("secret"))
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let err = client.list_records("prices").await.unwrap_err();

    assert!(matches!(err, Error::Api(ApiError::Timeout(_))));
    assert_eq!(server.seen().len(), 1);
}

// =============================================================================
// Content and blogs
// =============================================================================

#[tokio::test]
async fn test_content_by_slug() {
    let server = serve(|_, path| match path {
        "/content" => Reply::json(
            200,
            r#"[
                {"id": 1, "title": "About", "slug": "about", "text": "<p>Hi</p>"},
                {"id": 2, "title": "Shipping", "slug": "shipping", "text": "",
                 "main_photo": "ship.jpg", "created_at": "2024-01-01T00:00:00"}
            ]"#,
        ),
        _ => Reply::json(404, r#"{"detail": "Not Found"}"#),
    })
    .await;
    let client = server.client();

    let page = client.content_by_slug("shipping").await.unwrap().unwrap();
    assert_eq!(page.id, RecordId(2));
    assert_eq!(page.main_photo.as_deref(), Some("ship.jpg"));
    assert!(client.content_by_slug("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_blog_feed_from_backend() {
    let posts: Vec<String> = (1..=9)
        .map(|i| format!(r#"{{"id": {i}, "title": "Post {i}", "slug": "post-{i}", "text": "<b>Body {i}</b>"}}"#))
        .collect();
    let body = format!("[{}]", posts.join(","));
    let server = serve(move |_, _| Reply::json(200, &body)).await;

    let mut feed = BlogFeed::new(server.client().fetch_blogs().await.unwrap());

    assert_eq!(feed.visible().len(), 7);
    assert_eq!(feed.visible()[0].excerpt(), "Body 1");
    assert_eq!(feed.visible()[0].category_label(), "Blog Post");
    feed.load_more();
    assert_eq!(feed.visible().len(), 9);
    assert_eq!(server.seen()[0].path, "/blogs");
}

// =============================================================================
// Manager over HTTP
// =============================================================================

#[tokio::test]
async fn test_manager_cell_edit_over_http() {
    let server = serve(|method, _| match method {
        "GET" => Reply::json(
            200,
            r##"[{"id": 1, "color_name": "Ivory", "color_code": "#fffff0", "color_price": 2},
                {"id": 2, "color_name": "Kraft", "color_code": "#c4a484", "color_price": 3}]"##,
        ),
        _ => Reply::json(
            200,
            r##"{"id": 1, "color_name": "Ivory", "color_code": "#fffff0", "color_price": 4.5}"##,
        ),
    })
    .await;
    let schema = catalog::paper_colors();
    let endpoint = server.client().collection(&schema);
    assert_eq!(endpoint.path(), "paper_colors");
    let mut manager = CollectionManager::new(endpoint, schema);

    manager.load().await.unwrap();
    manager.begin_cell_edit(RecordId(1), "color_price").unwrap();
    manager.set_cell_draft(RecordId(1), "color_price", "4.5").unwrap();
    manager.commit_cell_edit(RecordId(1), "color_price").await.unwrap();

    let record = manager.record(RecordId(1)).unwrap();
    assert_eq!(record.get_decimal("color_price").unwrap(), Some(Decimal::new(45, 1)));

    let seen = server.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].method, "PUT");
    assert_eq!(seen[1].path, "/paper_colors/1");
    let body: serde_json::Value = serde_json::from_str(&seen[1].body).unwrap();
    assert_eq!(body["color_name"], "Ivory");
    assert_eq!(body["color_code"], "#fffff0");
    assert_eq!(body["color_price"], 4.5);
}

#[tokio::test]
async fn test_endpoint_implements_collection_api() {
    let server = serve(|_, _| Reply::json(200, "[]")).await;
    let endpoint = server.client().collection(&catalog::faqs());

    assert!(endpoint.list().await.unwrap().is_empty());
    assert_eq!(server.seen()[0].path, "/sss");
}

// =============================================================================
// Catalog routes
// =============================================================================

/// Collection routes served by the back-office API: list/create path and,
/// where the backend has them, the single-record path for PUT and DELETE.
const BACKEND_ROUTES: &[(&str, Option<&str>)] = &[
    ("/prices", Some("/prices")),
    ("/envelope_colors", Some("/envelope_colors")),
    ("/paper_colors", Some("/paper_colors")),
    ("/sss", Some("/sss")),
    ("/schemas", Some("/schemas")),
    ("/features", Some("/feature")),
    ("/envelope_smell", None),
    ("/shipment_type", None),
    ("/menu_links", Some("/menu_links")),
    ("/content", Some("/content")),
    ("/jails", Some("/jails")),
    ("/cities", Some("/cities")),
];

/// Answers only the routes above; anything else is a 404 like the real API.
fn backend(method: &str, path: &str) -> Reply {
    for (list, item) in BACKEND_ROUTES {
        match method {
            "GET" if path == *list => return Reply::json(200, "[]"),
            "POST" if path == *list => return Reply::json(200, r#"{"id": 1}"#),
            "PUT" | "DELETE" => {
                let under_item = item
                    .and_then(|item| path.strip_prefix(item))
                    .and_then(|rest| rest.strip_prefix('/'))
                    .is_some_and(|id| id.parse::<i64>().is_ok());
                if under_item {
                    return Reply::json(200, r#"{"id": 7}"#);
                }
            }
            _ => {}
        }
    }
    Reply::json(404, r#"{"detail": "Not Found"}"#)
}

#[tokio::test]
async fn test_every_catalog_collection_hits_backend_routes() {
    let schemas = catalog::all();
    assert_eq!(schemas.len(), BACKEND_ROUTES.len());

    for schema in &schemas {
        let list = format!("/{}", schema.path);
        let (_, item) = BACKEND_ROUTES
            .iter()
            .find(|(route, _)| *route == list)
            .unwrap_or_else(|| panic!("{} is not a backend route", list));
        let server = serve(backend).await;
        let endpoint = server.client().collection(schema);

        endpoint.list().await.unwrap();
        endpoint.create(Record::new()).await.unwrap();
        let update = endpoint.update(RecordId(7), Record::new()).await;
        let delete = endpoint.delete(RecordId(7)).await;

        let mut expected = vec![format!("GET {}", list), format!("POST {}", list)];
        match item {
            Some(item) => {
                update.unwrap();
                delete.unwrap();
                expected.push(format!("PUT {}/7", item));
                expected.push(format!("DELETE {}/7", item));
            }
            None => {
                assert!(matches!(update, Err(Error::InvalidOperation(_))), "{}", schema.path);
                assert!(matches!(delete, Err(Error::InvalidOperation(_))), "{}", schema.path);
            }
        }

        assert_eq!(requests(&server), expected, "{}", schema.path);
    }
}

fn requests(server: &TestServer) -> Vec<String> {
    server
        .seen()
        .iter()
        .map(|s| format!("{} {}", s.method, s.path))
        .collect()
}

#[tokio::test]
async fn test_manager_updates_features_through_singular_route() {
    let server = serve(|method, path| match (method, path) {
        ("GET", "/features") => Reply::json(
            200,
            r#"[{"id": 7, "feature_name": "Tracking", "feature_logo": "t.svg",
                 "feature_description": "Follow your letter"}]"#,
        ),
        _ => backend(method, path),
    })
    .await;
    let schema = catalog::features();
    let endpoint = server.client().collection(&schema);
    assert_eq!(endpoint.record_path(), "feature");
    let mut manager = CollectionManager::new(endpoint, schema);

    manager.load().await.unwrap();
    manager.begin_edit(RecordId(7)).unwrap();
    manager
        .update_from_input([("feature_description", "Follow every letter")])
        .await
        .unwrap();
    manager.request_delete(RecordId(7)).unwrap();
    manager.confirm_delete().await.unwrap();

    assert_eq!(
        requests(&server),
        ["GET /features", "PUT /feature/7", "GET /features", "DELETE /feature/7"]
    );
}

#[tokio::test]
async fn test_cities_are_keyed_by_city_id() {
    let server = serve(|method, _| match method {
        "GET" => Reply::json(
            200,
            r#"[{"city_id": 35, "country_id": 1, "city_name": "Izmir", "plate_no": 35, "phone_code": "232"},
                {"city_id": 6, "country_id": 1, "city_name": "Ankara", "plate_no": 6, "phone_code": "312"}]"#,
        ),
        _ => Reply::json(
            200,
            r#"{"city_id": 6, "country_id": 1, "city_name": "Ankara", "plate_no": 6, "phone_code": "0312"}"#,
        ),
    })
    .await;
    let schema = catalog::cities();
    let mut manager = CollectionManager::new(server.client().collection(&schema), schema);

    manager.load().await.unwrap();
    let view = manager.view().unwrap();
    let order: Vec<Option<RecordId>> = view.iter().map(|r| r.id()).collect();
    assert_eq!(order, [Some(RecordId(6)), Some(RecordId(35))]);
    assert!(!manager.record(RecordId(6)).unwrap().contains("city_id"));

    manager.begin_cell_edit(RecordId(6), "phone_code").unwrap();
    manager.set_cell_draft(RecordId(6), "phone_code", "0312").unwrap();
    manager.commit_cell_edit(RecordId(6), "phone_code").await.unwrap();

    let seen = server.seen();
    assert_eq!(seen[1].method, "PUT");
    assert_eq!(seen[1].path, "/cities/6");
    let body: serde_json::Value = serde_json::from_str(&seen[1].body).unwrap();
    assert_eq!(body["phone_code"], "0312");
    assert_eq!(body["city_name"], "Ankara");
}
